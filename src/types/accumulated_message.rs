use serde::{Deserialize, Serialize};

/// The assistant message assembled from `text-delta` events.
///
/// The id is fixed when the message is created and the text only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatedMessage {
    id: String,
    text: String,
}

impl AccumulatedMessage {
    /// Creates an empty message with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: String::new(),
        }
    }

    /// Appends a fragment and returns the text accumulated so far.
    pub fn append(&mut self, delta: &str) -> &str {
        self.text.push_str(delta);
        &self.text
    }

    /// The message id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns true if no text has been received.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_grows_text() {
        let mut message = AccumulatedMessage::new("ai-1");
        assert!(message.is_empty());
        assert_eq!(message.append("Hi"), "Hi");
        assert_eq!(message.append(" there"), "Hi there");
        assert_eq!(message.id(), "ai-1");
        assert_eq!(message.text(), "Hi there");
    }
}
