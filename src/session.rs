//! Orchestration of one submitted message from request to final text.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::{HttpTransport, Transport};
use crate::config::StreamConfig;
use crate::connection::{ConnectionManager, StreamHandle};
use crate::error::{Error, Result};
use crate::logging::LogContext;
use crate::notify::Notifier;
use crate::observability::{SESSION_REJECTED, SESSION_SUBMISSIONS, STREAM_DURATION, STREAM_ERRORS};
use crate::processor::EventProcessor;
use crate::retry::RetryPolicy;
use crate::sse::frames;
use crate::titles::TitleLookup;
use crate::types::{
    ConnectionState, Notification, SessionOutcome, SessionState, StreamEvent, StreamRequest,
};
use crate::utils::fallback_message_id;

/// A chat session that streams one response at a time.
///
/// `submit_message` drives the whole exchange: validation, connection, the
/// frame pump, and cleanup.  Progress is published two ways: typed
/// [`Notification`]s through [`subscribe`](Self::subscribe), and the
/// [`SessionState`] through [`watch`](Self::watch).
///
/// All methods take `&self`, so a session shared through an `Arc` can be
/// cancelled from another task (or a signal handler) while a submission is
/// running.
pub struct StreamingSession {
    connection: ConnectionManager,
    titles: Arc<dyn TitleLookup>,
    notifier: Notifier,
    state: watch::Sender<SessionState>,
    active: AtomicBool,
    // Token of the running submission, or of the next one when idle.
    cancellation: Mutex<CancellationToken>,
    log: LogContext,
}

impl StreamingSession {
    /// Creates a session over `connection`.
    pub fn new(connection: ConnectionManager, titles: Arc<dyn TitleLookup>, log: LogContext) -> Self {
        Self {
            connection,
            titles,
            notifier: Notifier::new(),
            state: watch::Sender::new(SessionState::default()),
            active: AtomicBool::new(false),
            cancellation: Mutex::new(CancellationToken::new()),
            log,
        }
    }

    /// Creates a session from parts: a transport and a retry policy.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        retry: Arc<dyn RetryPolicy>,
        titles: Arc<dyn TitleLookup>,
        log: LogContext,
    ) -> Self {
        let connection = ConnectionManager::new(transport, retry, log.clone());
        Self::new(connection, titles, log)
    }

    /// Creates an HTTP-backed session from a config.
    pub fn from_config(config: &StreamConfig) -> Result<Self> {
        let log = config.log_context();
        let transport = HttpTransport::new(config, log.clone())?;
        Ok(Self::with_transport(
            Arc::new(transport),
            Arc::new(config.retry.clone()),
            Arc::new(config.agent_titles()),
            log,
        ))
    }

    /// Registers a receiver for this session's notifications.
    pub fn subscribe(&self) -> UnboundedReceiver<Notification> {
        self.notifier.subscribe()
    }

    /// Returns a receiver that observes every change to the session state.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// A snapshot of the session state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// True while a submission is streaming.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// The agent named by the most recent `agent-switch`, or empty.
    pub fn current_agent(&self) -> String {
        self.state.borrow().current_agent.clone()
    }

    /// The state of the underlying connection.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Sends `text` and streams the response until it ends.
    ///
    /// Invalid input fails with [`Error::Validation`] before any I/O and
    /// without touching the loading state.  A second call while one is running
    /// fails with [`Error::Busy`].  A cancelled submission is not an error: it
    /// returns [`SessionOutcome::Cancelled`].  On every exit path the loading
    /// flag is reset exactly once.
    pub async fn submit_message(
        &self,
        text: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionOutcome> {
        let request = StreamRequest::new(text, user_id, session_id)?;
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            SESSION_REJECTED.click();
            return Err(Error::busy("a message is already streaming"));
        }
        let cancellation = self.cancellation().clone();
        let _guard = ActiveGuard { session: self };
        SESSION_SUBMISSIONS.click();
        self.state.send_modify(|state| state.is_loading = true);

        let start = Instant::now();
        let outcome = self.stream(request, cancellation).await;
        STREAM_DURATION.add(start.elapsed().as_secs_f64());
        outcome
    }

    /// Cancels the running submission.
    ///
    /// The loading flag is reset immediately; the running
    /// [`submit_message`](Self::submit_message) returns
    /// [`SessionOutcome::Cancelled`].  A cancel that arrives while no
    /// submission is running applies to the next one to start, which then
    /// returns [`SessionOutcome::Cancelled`] without contacting the server.
    /// This covers a submission that was spawned but has not been polled yet.
    /// Repeated cancels are idempotent.
    pub fn cancel_stream(&self) {
        self.connection.cancel_request();
        self.cancellation().cancel();
        self.reset_loading();
    }

    async fn stream(
        &self,
        request: StreamRequest,
        cancellation: CancellationToken,
    ) -> Result<SessionOutcome> {
        let StreamHandle {
            message_id, body, ..
        } = match self.connection.submit_message(request, cancellation.clone()).await {
            Ok(handle) => handle,
            Err(err) if err.is_abort() => return Ok(SessionOutcome::Cancelled),
            Err(err) => return Err(err),
        };

        let message_id = message_id.unwrap_or_else(fallback_message_id);
        self.log.debug(
            "SESSION",
            "response stream opened",
            Some(&json!({"messageId": message_id})),
        );
        let mut processor = EventProcessor::new(
            message_id,
            Arc::clone(&self.titles),
            self.notifier.clone(),
            self.log.clone(),
        )
        .with_current_agent(self.current_agent());

        let frames = frames(body);
        tokio::pin!(frames);
        loop {
            let next = tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    self.log.debug("SESSION", "stream cancelled", None);
                    return Ok(SessionOutcome::Cancelled);
                }
                next = frames.next() => next,
            };
            let frame = match next {
                Some(Ok(frame)) => frame,
                Some(Err(err)) => return Err(self.stream_failed(err)),
                None => break,
            };
            match processor.process(&frame) {
                Ok(Some(StreamEvent::AgentSwitch { agent_name })) => {
                    self.set_current_agent(agent_name);
                }
                Ok(_) => {}
                Err(err) => return Err(self.stream_failed(err)),
            }
        }

        self.connection.finish();
        let message = processor.into_message();
        self.log.debug(
            "SESSION",
            "stream finished",
            Some(&json!({"messageId": message.id(), "length": message.text().len()})),
        );
        Ok(SessionOutcome::Completed(message))
    }

    fn stream_failed(&self, err: Error) -> Error {
        STREAM_ERRORS.click();
        self.connection.fail();
        self.log.error(
            "SESSION",
            "Streaming error",
            Some(&json!({"error": err.to_string()})),
        );
        err
    }

    fn set_current_agent(&self, agent: String) {
        self.state.send_if_modified(|state| {
            if state.current_agent == agent {
                return false;
            }
            state.current_agent = agent;
            true
        });
    }

    fn cancellation(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.cancellation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn reset_loading(&self) {
        self.state.send_if_modified(|state| {
            if !state.is_loading {
                return false;
            }
            state.is_loading = false;
            true
        });
    }
}

impl std::fmt::Debug for StreamingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingSession")
            .field("state", &*self.state.borrow())
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

/// Ends a submission.  The loading flag is cleared and a fresh cancellation
/// token is armed before the session is freed for the next one.
struct ActiveGuard<'a> {
    session: &'a StreamingSession,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.session.reset_loading();
        *self.session.cancellation() = CancellationToken::new();
        self.session.active.store(false, Ordering::Release);
    }
}
