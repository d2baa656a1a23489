//! Folding of decoded frames into an accumulated, agent-attributed message.

use std::sync::Arc;

use serde_json::json;

use crate::error::{Error, Result};
use crate::logging::LogContext;
use crate::notify::Notifier;
use crate::observability::{STREAM_DROPPED_FRAMES, STREAM_FRAMES};
use crate::titles::TitleLookup;
use crate::types::{AccumulatedMessage, Notification, RawFrame, StreamEvent};

/// Applies the events of one response to the message being assembled.
///
/// A processor lives for exactly one submission.  It owns the accumulated text
/// and the current agent, and emits one notification per event with a
/// consumer-visible effect, synchronously and in arrival order.
pub struct EventProcessor {
    message: AccumulatedMessage,
    current_agent: String,
    titles: Arc<dyn TitleLookup>,
    notifier: Notifier,
    log: LogContext,
}

impl EventProcessor {
    /// Creates a processor for the message `message_id`.
    pub fn new(
        message_id: impl Into<String>,
        titles: Arc<dyn TitleLookup>,
        notifier: Notifier,
        log: LogContext,
    ) -> Self {
        Self {
            message: AccumulatedMessage::new(message_id),
            current_agent: String::new(),
            titles,
            notifier,
            log,
        }
    }

    /// Seeds the agent carried over from an earlier submission.
    pub fn with_current_agent(mut self, agent: impl Into<String>) -> Self {
        self.current_agent = agent.into();
        self
    }

    /// Decodes and applies one frame.
    ///
    /// Returns the decoded event, or `None` when the frame could not be
    /// decoded; such frames are dropped and processing continues.  An `error`
    /// event is returned as [`Error::Streaming`] and must end the stream.
    pub fn process(&mut self, frame: &RawFrame) -> Result<Option<StreamEvent>> {
        STREAM_FRAMES.click();
        let event = match serde_json::from_str::<StreamEvent>(frame.as_str()) {
            Ok(event) => event,
            Err(err) => {
                STREAM_DROPPED_FRAMES.click();
                self.log.debug(
                    "PROCESSOR",
                    &format!("dropping undecodable frame: {err}"),
                    Some(&json!({"frame": frame.as_str()})),
                );
                return Ok(None);
            }
        };
        self.log
            .debug("PROCESSOR", &format!("applying {} event", event.kind()), None);
        self.apply(&event)?;
        Ok(Some(event))
    }

    /// The message assembled so far.
    pub fn message(&self) -> &AccumulatedMessage {
        &self.message
    }

    /// The agent named by the most recent `agent-switch`.
    pub fn current_agent(&self) -> &str {
        &self.current_agent
    }

    /// Consumes the processor, returning the assembled message.
    pub fn into_message(self) -> AccumulatedMessage {
        self.message
    }

    fn apply(&mut self, event: &StreamEvent) -> Result<()> {
        match event {
            StreamEvent::TextDelta { delta } => {
                let text = self.message.append(delta).to_string();
                self.notifier.send(Notification::MessageUpdate {
                    id: self.message.id().to_string(),
                    text,
                });
            }
            StreamEvent::AgentSwitch { agent_name } => {
                self.log.debug(
                    "PROCESSOR",
                    "agent switch",
                    Some(&json!({"from": self.current_agent, "to": agent_name})),
                );
                self.current_agent = agent_name.clone();
                self.notifier.send(Notification::EventUpdate {
                    title: self.titles.title(agent_name),
                    metadata: json!({"agentName": agent_name}),
                });
            }
            StreamEvent::WebsiteCount { count } => {
                self.notifier
                    .send(Notification::WebsiteCount { count: *count });
            }
            StreamEvent::Status { status, message } => {
                let title = status
                    .clone()
                    .or_else(|| message.clone())
                    .unwrap_or_else(|| "Status".to_string());
                self.notifier.send(Notification::EventUpdate {
                    title,
                    metadata: json!({"status": status, "message": message}),
                });
            }
            StreamEvent::Error { message } => {
                self.log.error(
                    "PROCESSOR",
                    "server sent an error event",
                    Some(&json!({"message": message})),
                );
                return Err(Error::streaming(message.clone(), None));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::titles::AgentTitles;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn processor() -> (EventProcessor, UnboundedReceiver<Notification>) {
        let notifier = Notifier::new();
        let rx = notifier.subscribe();
        let processor = EventProcessor::new(
            "msg-1",
            Arc::new(AgentTitles::default()),
            notifier,
            LogContext::disabled(),
        );
        (processor, rx)
    }

    fn frame(data: &str) -> RawFrame {
        RawFrame::new(data)
    }

    fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = rx.try_recv() {
            out.push(n);
        }
        out
    }

    #[test]
    fn text_deltas_accumulate() {
        let (mut processor, mut rx) = processor();
        processor
            .process(&frame(r#"{"type":"text-delta","delta":"Hi"}"#))
            .unwrap();
        processor
            .process(&frame(r#"{"type":"text-delta","delta":" there"}"#))
            .unwrap();
        assert_eq!(processor.message().text(), "Hi there");
        assert_eq!(
            drain(&mut rx),
            vec![
                Notification::MessageUpdate {
                    id: "msg-1".to_string(),
                    text: "Hi".to_string()
                },
                Notification::MessageUpdate {
                    id: "msg-1".to_string(),
                    text: "Hi there".to_string()
                },
            ]
        );
    }

    #[test]
    fn applied_events_are_logged_by_kind() {
        use crate::logging::LogLevel;
        use crate::logging::tests::CaptureLogger;

        let capture = Arc::new(CaptureLogger::default());
        let mut processor = EventProcessor::new(
            "msg-1",
            Arc::new(AgentTitles::default()),
            Notifier::new(),
            LogContext::new(LogLevel::Debug, capture.clone()),
        );
        processor
            .process(&frame(r#"{"type":"website-count","count":2}"#))
            .unwrap();
        processor
            .process(&frame(r#"{"type":"text-delta","delta":"Hi"}"#))
            .unwrap();
        let messages: Vec<String> = capture
            .messages()
            .into_iter()
            .filter(|(_, component, _)| component == "PROCESSOR")
            .map(|(_, _, message)| message)
            .collect();
        assert_eq!(
            messages,
            vec!["applying website-count event", "applying text-delta event"]
        );
    }

    #[test]
    fn malformed_frame_is_dropped() {
        let (mut processor, mut rx) = processor();
        processor
            .process(&frame(r#"{"type":"text-delta","delta":"Hi"}"#))
            .unwrap();
        let dropped = processor.process(&frame("{not json")).unwrap();
        assert!(dropped.is_none());
        processor
            .process(&frame(r#"{"type":"text-delta","delta":" there"}"#))
            .unwrap();
        assert_eq!(processor.message().text(), "Hi there");
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[test]
    fn agent_switch_keeps_text() {
        let (mut processor, mut rx) = processor();
        processor
            .process(&frame(r#"{"type":"text-delta","delta":"A"}"#))
            .unwrap();
        processor
            .process(&frame(r#"{"type":"agent-switch","agentName":"researcher"}"#))
            .unwrap();
        assert_eq!(processor.current_agent(), "researcher");
        processor
            .process(&frame(r#"{"type":"text-delta","delta":"B"}"#))
            .unwrap();
        assert_eq!(processor.message().text(), "AB");
        let notifications = drain(&mut rx);
        assert_eq!(
            notifications[1],
            Notification::EventUpdate {
                title: "Researching".to_string(),
                metadata: json!({"agentName": "researcher"}),
            }
        );
    }

    #[test]
    fn website_count_does_not_touch_text() {
        let (mut processor, mut rx) = processor();
        processor
            .process(&frame(r#"{"type":"website-count","count":4}"#))
            .unwrap();
        assert!(processor.message().is_empty());
        assert_eq!(drain(&mut rx), vec![Notification::WebsiteCount { count: 4 }]);
    }

    #[test]
    fn status_becomes_event_update() {
        let (mut processor, mut rx) = processor();
        processor
            .process(&frame(r#"{"type":"status","status":"thinking"}"#))
            .unwrap();
        let notifications = drain(&mut rx);
        assert!(matches!(
            &notifications[0],
            Notification::EventUpdate { title, .. } if title == "thinking"
        ));
    }

    #[test]
    fn error_event_is_terminal() {
        let (mut processor, mut rx) = processor();
        let err = processor
            .process(&frame(r#"{"type":"error","message":"x"}"#))
            .unwrap_err();
        assert!(err.is_streaming());
        assert_eq!(err.message(), "x");
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn seeded_agent_persists_until_switch() {
        let (processor, _rx) = processor();
        let mut processor = processor.with_current_agent("root_agent");
        processor
            .process(&frame(r#"{"type":"text-delta","delta":"x"}"#))
            .unwrap();
        assert_eq!(processor.current_agent(), "root_agent");
    }
}
