use time::OffsetDateTime;

/// Generates a message id for responses that do not carry one.
///
/// The id has the form `ai-<unix millis>`.
pub fn fallback_message_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("ai-{millis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_prefix_and_timestamp() {
        let id = fallback_message_id();
        let millis = id.strip_prefix("ai-").expect("prefix");
        assert!(millis.parse::<i128>().unwrap() > 0);
    }
}
