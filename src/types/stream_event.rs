use serde::{Deserialize, Serialize};

/// A decoded server event.
///
/// Each frame of the event stream carries one JSON object whose `type` field
/// selects the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    /// A fragment of assistant text to append to the active message.
    TextDelta {
        /// The text fragment.
        delta: String,
    },

    /// The logical responder producing output changed.
    AgentSwitch {
        /// Name of the agent now responding.
        #[serde(rename = "agentName")]
        agent_name: String,
    },

    /// Number of websites consulted so far.
    WebsiteCount {
        /// The running count.
        count: u64,
    },

    /// Free-form progress information.
    Status {
        /// Short status label.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
        /// Longer human-readable description.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// The server aborted the response.
    Error {
        /// Description of the failure.
        message: String,
    },
}

impl StreamEvent {
    /// The wire name of this event's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::TextDelta { .. } => "text-delta",
            StreamEvent::AgentSwitch { .. } => "agent-switch",
            StreamEvent::WebsiteCount { .. } => "website-count",
            StreamEvent::Status { .. } => "status",
            StreamEvent::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_str, json, to_value};

    #[test]
    fn text_delta_deserialization() {
        let event: StreamEvent = from_str(r#"{"type":"text-delta","delta":"Hi"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::TextDelta {
                delta: "Hi".to_string()
            }
        );
        assert_eq!(event.kind(), "text-delta");
    }

    #[test]
    fn agent_switch_uses_camel_case_field() {
        let event: StreamEvent =
            from_str(r#"{"type":"agent-switch","agentName":"researcher"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::AgentSwitch {
                agent_name: "researcher".to_string()
            }
        );
        assert_eq!(
            to_value(&event).unwrap(),
            json!({"type": "agent-switch", "agentName": "researcher"})
        );
    }

    #[test]
    fn website_count() {
        let event: StreamEvent = from_str(r#"{"type":"website-count","count":7}"#).unwrap();
        assert_eq!(event, StreamEvent::WebsiteCount { count: 7 });
    }

    #[test]
    fn status_fields_are_optional() {
        let event: StreamEvent = from_str(r#"{"type":"status"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Status {
                status: None,
                message: None
            }
        );
        assert_eq!(to_value(&event).unwrap(), json!({"type": "status"}));
    }

    #[test]
    fn error_event() {
        let event: StreamEvent = from_str(r#"{"type":"error","message":"x"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Error {
                message: "x".to_string()
            }
        );
        assert_eq!(event.kind(), "error");
    }

    #[test]
    fn unknown_kind_fails() {
        assert!(from_str::<StreamEvent>(r#"{"type":"mystery"}"#).is_err());
        assert!(from_str::<StreamEvent>(r#"{"delta":"no tag"}"#).is_err());
    }
}
