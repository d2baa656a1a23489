use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::AccumulatedMessage;

/// A typed update delivered to session subscribers.
///
/// Notifications are sent in frame-arrival order, one per decoded event that
/// has a consumer-visible effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// The text of a message changed.
    MessageUpdate {
        /// Message id.
        id: String,
        /// Full text accumulated so far.
        text: String,
    },

    /// A titled progress event, e.g. an agent switch.
    EventUpdate {
        /// Human-readable title.
        title: String,
        /// Event details.
        metadata: Value,
    },

    /// The website counter changed.
    WebsiteCount {
        /// The new count.
        count: u64,
    },
}

/// How a submission ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The stream was drained.
    Completed(AccumulatedMessage),
    /// The user cancelled the submission.
    Cancelled,
}

impl SessionOutcome {
    /// The completed message, if the stream was drained.
    pub fn message(&self) -> Option<&AccumulatedMessage> {
        match self {
            SessionOutcome::Completed(message) => Some(message),
            SessionOutcome::Cancelled => None,
        }
    }

    /// Returns true if the submission was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionOutcome::Cancelled)
    }
}
