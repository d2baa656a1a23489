// Public modules
pub mod accumulated_message;
pub mod connection_state;
pub mod notification;
pub mod raw_frame;
pub mod session_state;
pub mod stream_event;
pub mod stream_request;

// Re-exports
pub use accumulated_message::AccumulatedMessage;
pub use connection_state::{ConnectionEvent, ConnectionState};
pub use notification::{Notification, SessionOutcome};
pub use raw_frame::RawFrame;
pub use session_state::SessionState;
pub use stream_event::StreamEvent;
pub use stream_request::StreamRequest;
