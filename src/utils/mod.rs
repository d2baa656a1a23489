pub mod message_id;
pub mod utf8;

pub use message_id::fallback_message_id;
pub use utf8::Utf8Decoder;
