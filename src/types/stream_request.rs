use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The body of a single streaming request.
///
/// All three fields are required and non-empty.  Values are fixed at
/// construction; use [`StreamRequest::new`] to validate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    message: String,
    user_id: String,
    session_id: String,
}

impl StreamRequest {
    /// Validates and builds a request.
    ///
    /// The message is trimmed before it is stored; it must not be empty
    /// afterwards.  The identifiers must not be empty.
    pub fn new(
        message: impl AsRef<str>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Result<Self> {
        let message = message.as_ref().trim();
        let user_id = user_id.into();
        let session_id = session_id.into();
        if message.is_empty() {
            return Err(Error::validation(
                "message must not be empty",
                Some("message".to_string()),
            ));
        }
        if user_id.is_empty() {
            return Err(Error::validation(
                "user id must not be empty",
                Some("userId".to_string()),
            ));
        }
        if session_id.is_empty() {
            return Err(Error::validation(
                "session id must not be empty",
                Some("sessionId".to_string()),
            ));
        }
        Ok(Self {
            message: message.to_string(),
            user_id,
            session_id,
        })
    }

    /// The user's message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The user identifier.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The session identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn serializes_camel_case() {
        let request = StreamRequest::new("Hello", "u1", "s1").unwrap();
        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "message": "Hello",
                "userId": "u1",
                "sessionId": "s1"
            })
        );
    }

    #[test]
    fn trims_message() {
        let request = StreamRequest::new("  Hello \n", "u1", "s1").unwrap();
        assert_eq!(request.message(), "Hello");
    }

    #[test]
    fn rejects_blank_message() {
        let err = StreamRequest::new("   ", "u1", "s1").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("message"));
    }

    #[test]
    fn rejects_missing_ids() {
        assert!(StreamRequest::new("hi", "", "s1").unwrap_err().is_validation());
        assert!(StreamRequest::new("hi", "u1", "").unwrap_err().is_validation());
    }
}
