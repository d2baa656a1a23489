use biometrics::{Collector, Counter, Moments};

pub(crate) static CONNECTION_REQUESTS: Counter = Counter::new("agentstream.connection.requests");
pub(crate) static CONNECTION_ERRORS: Counter = Counter::new("agentstream.connection.errors");
pub(crate) static CONNECTION_RETRIES: Counter = Counter::new("agentstream.connection.retries");
pub(crate) static CONNECTION_CANCELLATIONS: Counter =
    Counter::new("agentstream.connection.cancellations");
pub(crate) static CONNECTION_DURATION: Moments =
    Moments::new("agentstream.connection.connect_duration_seconds");
pub(crate) static CONNECTION_RETRY_BACKOFF: Moments =
    Moments::new("agentstream.connection.retry_backoff_seconds");

pub(crate) static STREAM_FRAMES: Counter = Counter::new("agentstream.stream.frames");
pub(crate) static STREAM_DROPPED_FRAMES: Counter =
    Counter::new("agentstream.stream.dropped_frames");
pub(crate) static STREAM_BYTES: Counter = Counter::new("agentstream.stream.bytes");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("agentstream.stream.errors");
pub(crate) static STREAM_DURATION: Moments =
    Moments::new("agentstream.stream.duration_seconds");

pub(crate) static SESSION_SUBMISSIONS: Counter = Counter::new("agentstream.session.submissions");
pub(crate) static SESSION_REJECTED: Counter = Counter::new("agentstream.session.rejected");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CONNECTION_REQUESTS);
    collector.register_counter(&CONNECTION_ERRORS);
    collector.register_counter(&CONNECTION_RETRIES);
    collector.register_counter(&CONNECTION_CANCELLATIONS);
    collector.register_moments(&CONNECTION_DURATION);
    collector.register_moments(&CONNECTION_RETRY_BACKOFF);

    collector.register_counter(&STREAM_FRAMES);
    collector.register_counter(&STREAM_DROPPED_FRAMES);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&SESSION_SUBMISSIONS);
    collector.register_counter(&SESSION_REJECTED);
}
