//! Transport trait definition.
//!
//! The transport is the only part of the connection stack that touches the
//! network. Implementations live in confab-infra (e.g. `WebSocketTransport`).

use std::future::Future;

use tokio::sync::mpsc;

use confab_types::error::ConnectionError;

/// What the transport reports about the underlying socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSignal {
    /// A text frame from the server.
    Frame(String),
    /// The peer closed the connection cleanly.
    Closed,
    /// The connection broke.
    Fault(String),
}

/// Channels to an established connection.
///
/// Dropping `outbound` asks the transport to close the socket.
pub struct TransportLink {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<TransportSignal>,
}

/// Opens live connections addressed by `(session_id, user_id)`.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait Transport: Send + Sync + 'static {
    /// Perform the handshake. Resolves once the connection is usable.
    fn connect(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<TransportLink, ConnectionError>> + Send;
}
