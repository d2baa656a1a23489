// Public modules
pub mod chat;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod notify;
pub mod observability;
pub mod processor;
pub mod retry;
pub mod session;
pub mod sse;
pub mod titles;
pub mod types;
pub mod utils;

// Re-exports
pub use client::{ByteStream, HttpTransport, Transport, TransportResponse};
pub use config::StreamConfig;
pub use connection::{ConnectionManager, StreamHandle};
pub use error::{Error, Result};
pub use logging::{LogContext, LogLevel, LogRecord, NullLogger, StreamLogger, TracingLogger};
pub use notify::Notifier;
pub use observability::register_biometrics;
pub use processor::EventProcessor;
pub use retry::{ExponentialBackoff, NoRetry, RetryPolicy};
pub use session::StreamingSession;
pub use sse::{FrameParser, frames};
pub use titles::{AgentTitles, TitleLookup};
pub use types::*;
