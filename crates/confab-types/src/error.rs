use thiserror::Error;

/// Errors from the live connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("transport fault: {0}")]
    Transport(String),

    #[error("not connected")]
    NotConnected,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Errors from the one-shot history fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("history request failed: {0}")]
    Transport(String),

    #[error("history request returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("history response could not be decoded: {0}")]
    Decode(String),
}

/// Why the dispatcher refused a message before touching the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("message is empty")]
    InvalidOutbound,

    #[error("not connected")]
    NotConnected,
}

/// Errors returned by `dispatch`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("rejected: {0}")]
    Rejected(Rejection),

    /// The message was appended locally but the transport refused it.
    #[error("message could not be sent: {0}")]
    SendFailed(String),

    #[error("session has ended")]
    SessionClosed,
}

impl From<Rejection> for DispatchError {
    fn from(rejection: Rejection) -> Self {
        DispatchError::Rejected(rejection)
    }
}

/// Problems with an inbound frame. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InboundError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("unknown frame type '{0}'")]
    UnknownKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SeedError {
    #[error("history has already been seeded")]
    AlreadySeeded,
}

/// Errors from the persisted user store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored user is corrupt: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_display() {
        let err = DispatchError::from(Rejection::InvalidOutbound);
        assert_eq!(err.to_string(), "rejected: message is empty");
        assert_eq!(
            DispatchError::Rejected(Rejection::NotConnected).to_string(),
            "rejected: not connected"
        );
    }

    #[test]
    fn test_history_error_display() {
        let err = HistoryError::Status {
            status: 404,
            body: "Session not found".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("Session not found"));
    }

    #[test]
    fn test_store_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: StoreError = io.into();
        assert!(err.to_string().contains("nope"));
    }
}
