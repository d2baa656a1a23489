use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single outbound streaming request.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No request has been issued yet.
    #[default]
    Idle,

    /// The request is being established (possibly across retries).
    Connecting,

    /// The server accepted the request and the body is streaming.
    Connected,

    /// The request or the stream failed.
    Error,

    /// The stream finished or was cancelled.
    Closed,
}

/// Inputs to the connection state-transition table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConnectionEvent {
    /// A new request is being submitted.
    Submit,

    /// The server answered with a success status.
    Connected,

    /// The request failed after retries, or the stream read failed.
    Failed,

    /// The user cancelled the request.
    Cancelled,

    /// The response body was drained.
    Finished,
}

impl ConnectionState {
    /// Returns the state reached by applying `event`, or `None` when the event
    /// does not apply in this state and must be ignored.
    ///
    /// Cancellation applies from every state.  A submission is only accepted
    /// when no request is in flight.
    pub fn transition(self, event: ConnectionEvent) -> Option<ConnectionState> {
        use ConnectionEvent as E;
        use ConnectionState as S;
        match (self, event) {
            (_, E::Cancelled) => Some(S::Closed),
            (S::Idle | S::Closed | S::Error, E::Submit) => Some(S::Connecting),
            (S::Connecting, E::Connected) => Some(S::Connected),
            (S::Connecting | S::Connected, E::Failed) => Some(S::Error),
            (S::Connected, E::Finished) => Some(S::Closed),
            _ => None,
        }
    }

    /// Returns true while a request occupies the connection.
    pub fn is_in_flight(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Error => write!(f, "error"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [ConnectionState; 5] = [
        ConnectionState::Idle,
        ConnectionState::Connecting,
        ConnectionState::Connected,
        ConnectionState::Error,
        ConnectionState::Closed,
    ];

    #[test]
    fn submit_only_when_not_in_flight() {
        for state in ALL_STATES {
            let next = state.transition(ConnectionEvent::Submit);
            if state.is_in_flight() {
                assert_eq!(next, None, "{state} must reject submit");
            } else {
                assert_eq!(next, Some(ConnectionState::Connecting), "{state}");
            }
        }
    }

    #[test]
    fn cancel_closes_from_any_state() {
        for state in ALL_STATES {
            assert_eq!(
                state.transition(ConnectionEvent::Cancelled),
                Some(ConnectionState::Closed)
            );
        }
    }

    #[test]
    fn happy_path() {
        let state = ConnectionState::Idle;
        let state = state.transition(ConnectionEvent::Submit).unwrap();
        let state = state.transition(ConnectionEvent::Connected).unwrap();
        assert_eq!(state, ConnectionState::Connected);
        let state = state.transition(ConnectionEvent::Finished).unwrap();
        assert_eq!(state, ConnectionState::Closed);
    }

    #[test]
    fn failures() {
        assert_eq!(
            ConnectionState::Connecting.transition(ConnectionEvent::Failed),
            Some(ConnectionState::Error)
        );
        assert_eq!(
            ConnectionState::Connected.transition(ConnectionEvent::Failed),
            Some(ConnectionState::Error)
        );
        assert_eq!(ConnectionState::Idle.transition(ConnectionEvent::Failed), None);
    }

    #[test]
    fn late_connect_after_cancel_is_ignored() {
        assert_eq!(
            ConnectionState::Closed.transition(ConnectionEvent::Connected),
            None
        );
        assert_eq!(
            ConnectionState::Closed.transition(ConnectionEvent::Failed),
            None
        );
        assert_eq!(
            ConnectionState::Closed.transition(ConnectionEvent::Finished),
            None
        );
    }

    #[test]
    fn serialization() {
        assert_eq!(
            serde_json::to_string(&ConnectionState::Connecting).unwrap(),
            "\"connecting\""
        );
        assert_eq!(ConnectionState::default(), ConnectionState::Idle);
    }
}
