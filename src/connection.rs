//! Lifecycle of one outbound streaming request.
//!
//! The [`ConnectionManager`] issues the request through a [`Transport`], wraps
//! establishment in a [`RetryPolicy`], and tracks progress through the
//! [`ConnectionState`] transition table.  Cancellation is signalled through a
//! [`CancellationToken`] that is shared with whoever reads the response body.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::client::{ByteStream, Transport};
use crate::error::{Error, Result};
use crate::logging::LogContext;
use crate::observability::{
    CONNECTION_CANCELLATIONS, CONNECTION_DURATION, CONNECTION_ERRORS, CONNECTION_REQUESTS,
};
use crate::retry::{RetryPolicy, retry};
use crate::types::{ConnectionEvent, ConnectionState, StreamRequest};

/// An established response stream.
pub struct StreamHandle {
    /// The message id announced by the server, if any.
    pub message_id: Option<String>,
    /// The streamed response body.
    pub body: ByteStream,
    /// Fires when the request is cancelled; body readers must stop reading.
    pub cancellation: CancellationToken,
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("message_id", &self.message_id)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

struct Inner {
    state: ConnectionState,
    cancellation: Option<CancellationToken>,
}

/// Owns the lifecycle of one request at a time.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    retry: Arc<dyn RetryPolicy>,
    inner: Mutex<Inner>,
    log: LogContext,
}

impl ConnectionManager {
    /// Creates a manager in the `idle` state.
    pub fn new(
        transport: Arc<dyn Transport>,
        retry: Arc<dyn RetryPolicy>,
        log: LogContext,
    ) -> Self {
        Self {
            transport,
            retry,
            inner: Mutex::new(Inner {
                state: ConnectionState::Idle,
                cancellation: None,
            }),
            log,
        }
    }

    /// The current connection state.
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Opens a response stream for `request`.
    ///
    /// `cancellation` is owned by the caller and may already be cancelled, in
    /// which case the transport is never called.  Establishment is retried
    /// under the configured policy.  A cancellation that arrives before the
    /// stream is established, including during a backoff delay, fails with
    /// [`Error::Abort`] and leaves the manager `closed`; any other failure
    /// leaves it in `error`.  Submitting while a request is in flight fails
    /// with [`Error::Busy`].
    pub async fn submit_message(
        &self,
        request: StreamRequest,
        cancellation: CancellationToken,
    ) -> Result<StreamHandle> {
        {
            let mut inner = self.lock();
            let Some(next) = inner.state.transition(ConnectionEvent::Submit) else {
                return Err(Error::busy(format!(
                    "cannot submit while {}",
                    inner.state
                )));
            };
            self.log_transition(inner.state, next, ConnectionEvent::Submit);
            inner.state = next;
            inner.cancellation = Some(cancellation.clone());
        }

        if cancellation.is_cancelled() {
            CONNECTION_CANCELLATIONS.click();
            self.apply(ConnectionEvent::Cancelled);
            self.log.debug("CONNECTION", "Request was cancelled before it was sent", None);
            return Err(Error::abort("request was cancelled by the user"));
        }

        CONNECTION_REQUESTS.click();
        let start = Instant::now();
        let attempt = retry(self.retry.as_ref(), &self.log, || {
            self.transport.open(&request)
        });
        let outcome = tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(Error::abort("request was cancelled by the user")),
            response = attempt => response,
        };

        match outcome {
            Ok(response) => {
                CONNECTION_DURATION.add(start.elapsed().as_secs_f64());
                if !self.apply(ConnectionEvent::Connected) || cancellation.is_cancelled() {
                    return Err(Error::abort("request was cancelled by the user"));
                }
                Ok(StreamHandle {
                    message_id: response.message_id,
                    body: response.body,
                    cancellation,
                })
            }
            Err(err) if err.is_abort() => {
                self.apply(ConnectionEvent::Cancelled);
                self.log.debug("CONNECTION", "Request was cancelled by the user", None);
                Err(err)
            }
            Err(err) => {
                CONNECTION_ERRORS.click();
                self.apply(ConnectionEvent::Failed);
                self.log.error(
                    "CONNECTION",
                    "Streaming error",
                    Some(&json!({"error": err.to_string()})),
                );
                Err(err)
            }
        }
    }

    /// Cancels the in-flight request, if any, and moves to `closed`.
    ///
    /// The token passed to [`submit_message`](Self::submit_message) is
    /// cancelled too, so the body reader stops.
    ///
    /// Idempotent: cancelling an idle or already closed manager changes
    /// nothing observable.
    pub fn cancel_request(&self) {
        let mut inner = self.lock();
        if let Some(token) = inner.cancellation.take() {
            if !token.is_cancelled() {
                CONNECTION_CANCELLATIONS.click();
            }
            token.cancel();
        }
        if inner.state != ConnectionState::Idle {
            if let Some(next) = inner.state.transition(ConnectionEvent::Cancelled) {
                if next != inner.state {
                    self.log_transition(inner.state, next, ConnectionEvent::Cancelled);
                }
                inner.state = next;
            }
        }
    }

    /// Records that the response body was fully read.
    pub fn finish(&self) {
        if self.apply(ConnectionEvent::Finished) {
            self.lock().cancellation = None;
        }
    }

    /// Records that reading the response body failed.
    pub fn fail(&self) {
        if self.apply(ConnectionEvent::Failed) {
            self.lock().cancellation = None;
        }
    }

    /// Applies `event`; returns false when the event does not apply in the
    /// current state and was ignored.
    fn apply(&self, event: ConnectionEvent) -> bool {
        let mut inner = self.lock();
        match inner.state.transition(event) {
            Some(next) => {
                self.log_transition(inner.state, next, event);
                inner.state = next;
                true
            }
            None => {
                self.log.debug(
                    "CONNECTION",
                    "ignoring event",
                    Some(&json!({"state": inner.state, "event": format!("{event:?}")})),
                );
                false
            }
        }
    }

    fn log_transition(&self, from: ConnectionState, to: ConnectionState, event: ConnectionEvent) {
        self.log.debug(
            "CONNECTION",
            "state transition",
            Some(&json!({"from": from, "to": to, "event": format!("{event:?}")})),
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
