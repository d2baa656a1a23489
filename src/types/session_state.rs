use serde::{Deserialize, Serialize};

/// Consumer-visible state of a streaming session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// True while a submission is in progress.
    pub is_loading: bool,
    /// The agent that produced the most recent output; empty until the first
    /// agent switch.
    pub current_agent: String,
}
