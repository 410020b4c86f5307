//! Connection manager and per-connection handles.
//!
//! `ConnectionManager::open` spawns a driver task that performs the
//! handshake and then multiplexes, via `tokio::select!`, outbound payloads
//! from the handle and signals from the transport. The handle observes the
//! driver through a `watch` channel (state) and an mpsc channel (events).
//!
//! A handle moves through `Connecting -> Open -> Closed | Error` or
//! `Connecting -> Error`. Terminal states never change again; reconnecting
//! means opening a new handle.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use confab_types::connection::ConnectionState;
use confab_types::error::ConnectionError;
use confab_types::event::ConnectionEvent;
use confab_types::protocol::InboundFrame;

use super::transport::{Transport, TransportLink, TransportSignal};

/// Opens connection handles over a shared transport.
pub struct ConnectionManager<T> {
    transport: Arc<T>,
}

impl<T> Clone for ConnectionManager<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Start connecting. The returned handle begins in `Connecting`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(&self, session_id: &str, user_id: &str) -> ConnectionHandle {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let state_tx = Arc::new(state_tx);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let driver = Driver {
            state: Arc::clone(&state_tx),
            events: event_tx,
            outbound: outbound_rx,
            cancel: cancel.clone(),
        };
        let transport = Arc::clone(&self.transport);
        let session_id = session_id.to_string();
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            driver.run(transport.as_ref(), &session_id, &user_id).await;
        });

        ConnectionHandle {
            state_tx,
            state: state_rx,
            events: event_rx,
            outbound: outbound_tx,
            cancel,
            closed: false,
        }
    }
}

/// Move to `next` unless already terminal. Returns whether the state changed.
fn transition(state: &watch::Sender<ConnectionState>, next: ConnectionState) -> bool {
    state.send_if_modified(|current| {
        if current.is_terminal() || *current == next {
            false
        } else {
            *current = next;
            true
        }
    })
}

struct Driver {
    state: Arc<watch::Sender<ConnectionState>>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
}

impl Driver {
    async fn run<T: Transport>(mut self, transport: &T, session_id: &str, user_id: &str) {
        let connected = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            result = transport.connect(session_id, user_id) => result,
        };

        let link = match connected {
            Ok(link) => link,
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "Connection handshake failed");
                self.fail(err.to_string());
                return;
            }
        };

        if self.cancel.is_cancelled() {
            return;
        }
        if transition(&self.state, ConnectionState::Open) {
            tracing::info!(%session_id, "Connection open");
            let _ = self.events.send(ConnectionEvent::Connected);
        }

        self.pump(link, session_id).await;
    }

    /// Forward traffic until the connection ends or the handle closes.
    ///
    /// Returning drops `link.outbound`, which closes the socket.
    async fn pump(&mut self, mut link: TransportLink, session_id: &str) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!(%session_id, "Connection closed locally");
                    return;
                }
                payload = self.outbound.recv() => {
                    let Some(payload) = payload else { return };
                    if link.outbound.send(payload).is_err() {
                        self.fail("transport stopped accepting frames".to_string());
                        return;
                    }
                }
                signal = link.inbound.recv() => match signal {
                    Some(TransportSignal::Frame(text)) => self.inbound(&text, session_id),
                    Some(TransportSignal::Closed) | None => {
                        if transition(&self.state, ConnectionState::Closed) {
                            tracing::info!(%session_id, "Connection closed by peer");
                            let _ = self.events.send(ConnectionEvent::Disconnected);
                        }
                        return;
                    }
                    Some(TransportSignal::Fault(detail)) => {
                        tracing::warn!(%session_id, error = %detail, "Connection fault");
                        self.fail(detail);
                        return;
                    }
                }
            }
        }
    }

    fn inbound(&self, text: &str, session_id: &str) {
        match InboundFrame::parse(text) {
            Ok(frame) => {
                let _ = self.events.send(ConnectionEvent::Inbound(frame));
            }
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "Dropping inbound frame");
            }
        }
    }

    fn fail(&self, detail: String) {
        if transition(&self.state, ConnectionState::Error) {
            let _ = self.events.send(ConnectionEvent::Error(detail));
        }
    }
}

/// One live connection.
///
/// Dropping the handle closes the connection.
pub struct ConnectionHandle {
    state_tx: Arc<watch::Sender<ConnectionState>>,
    state: watch::Receiver<ConnectionState>,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    closed: bool,
}

impl ConnectionHandle {
    /// Current state of this connection.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Transmit a payload. Fails with `NotConnected` unless the state is `Open`.
    ///
    /// Success means the payload was handed to the connection, not that the
    /// server received it.
    pub fn send(&self, payload: String) -> Result<(), ConnectionError> {
        if self.closed || !self.state().is_open() {
            return Err(ConnectionError::NotConnected);
        }
        self.outbound
            .send(payload)
            .map_err(|_| ConnectionError::Transport("connection task has stopped".to_string()))
    }

    /// Next lifecycle event, or `None` once the connection has ended and all
    /// events were drained, or after [`close`](Self::close).
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        if self.closed {
            return None;
        }
        self.events.recv().await
    }

    /// Close the connection.
    ///
    /// On return the state is terminal, sends are rejected, and no further
    /// events are delivered.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel.cancel();
        transition(&self.state_tx, ConnectionState::Closed);
        self.events.close();
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::{Handshake, ScriptedTransport};

    #[tokio::test]
    async fn handshake_success_opens_and_emits_connected() {
        let (transport, mut peers) = ScriptedTransport::new(vec![]);
        let manager = ConnectionManager::new(transport);
        let mut handle = manager.open("s-1", "u-1");
        assert_eq!(handle.state(), ConnectionState::Connecting);

        assert_eq!(handle.next_event().await, Some(ConnectionEvent::Connected));
        assert_eq!(handle.state(), ConnectionState::Open);

        let peer = peers.recv().await.unwrap();
        assert_eq!(peer.session_id, "s-1");
        assert_eq!(peer.user_id, "u-1");
    }

    #[tokio::test]
    async fn handshake_failure_moves_to_error() {
        let (transport, _peers) = ScriptedTransport::new(vec![Handshake::Refuse("403".into())]);
        let manager = ConnectionManager::new(transport);
        let mut handle = manager.open("s-1", "u-1");

        match handle.next_event().await {
            Some(ConnectionEvent::Error(detail)) => assert!(detail.contains("403")),
            other => panic!("expected error event, got {other:?}"),
        }
        assert_eq!(handle.state(), ConnectionState::Error);
        assert_eq!(handle.next_event().await, None);
    }

    #[tokio::test]
    async fn send_before_open_is_rejected() {
        let (transport, _peers) = ScriptedTransport::new(vec![]);
        let manager = ConnectionManager::new(transport);
        let handle = manager.open("s-1", "u-1");
        assert_eq!(handle.send("x".into()), Err(ConnectionError::NotConnected));
    }

    #[tokio::test]
    async fn send_when_open_reaches_peer() {
        let (transport, mut peers) = ScriptedTransport::new(vec![]);
        let manager = ConnectionManager::new(transport);
        let mut handle = manager.open("s-1", "u-1");
        handle.next_event().await;
        let mut peer = peers.recv().await.unwrap();

        handle.send("payload".into()).unwrap();
        assert_eq!(peer.from_client.recv().await.as_deref(), Some("payload"));
    }

    #[tokio::test]
    async fn inbound_frames_are_parsed_and_junk_dropped() {
        let (transport, mut peers) = ScriptedTransport::new(vec![]);
        let manager = ConnectionManager::new(transport);
        let mut handle = manager.open("s-1", "u-1");
        handle.next_event().await;
        let peer = peers.recv().await.unwrap();

        peer.push("garbage");
        peer.push(r#"{"type":"typing_started"}"#);
        peer.push(r#"{"type":"moderation_warning","message":"careful"}"#);
        peer.push_reply("hi there");

        assert_eq!(
            handle.next_event().await,
            Some(ConnectionEvent::Inbound(InboundFrame::ModerationWarning {
                message: "careful".into()
            }))
        );
        match handle.next_event().await {
            Some(ConnectionEvent::Inbound(InboundFrame::Message(reply))) => {
                assert_eq!(reply.content, "hi there")
            }
            other => panic!("expected bot reply, got {other:?}"),
        }
        assert_eq!(handle.state(), ConnectionState::Open);
    }

    #[tokio::test]
    async fn orderly_close_by_peer() {
        let (transport, mut peers) = ScriptedTransport::new(vec![]);
        let manager = ConnectionManager::new(transport);
        let mut handle = manager.open("s-1", "u-1");
        handle.next_event().await;
        let peer = peers.recv().await.unwrap();

        let _ = peer.to_client.send(TransportSignal::Closed);
        assert_eq!(handle.next_event().await, Some(ConnectionEvent::Disconnected));
        assert_eq!(handle.state(), ConnectionState::Closed);
        assert_eq!(handle.send("late".into()), Err(ConnectionError::NotConnected));
    }

    #[tokio::test]
    async fn transport_fault_is_terminal_error() {
        let (transport, mut peers) = ScriptedTransport::new(vec![]);
        let manager = ConnectionManager::new(transport);
        let mut handle = manager.open("s-1", "u-1");
        handle.next_event().await;
        let peer = peers.recv().await.unwrap();

        let _ = peer.to_client.send(TransportSignal::Fault("reset by peer".into()));
        assert_eq!(
            handle.next_event().await,
            Some(ConnectionEvent::Error("reset by peer".into()))
        );
        // A later close does not overwrite the terminal state.
        handle.close();
        assert_eq!(handle.state(), ConnectionState::Error);
    }

    #[tokio::test]
    async fn local_close_is_immediate_and_silences_events() {
        let (transport, mut peers) = ScriptedTransport::new(vec![]);
        let manager = ConnectionManager::new(transport);
        let mut handle = manager.open("s-1", "u-1");
        handle.next_event().await;
        let mut peer = peers.recv().await.unwrap();

        handle.close();
        assert_eq!(handle.state(), ConnectionState::Closed);
        assert_eq!(handle.send("x".into()), Err(ConnectionError::NotConnected));

        peer.push_reply("too late");
        assert_eq!(handle.next_event().await, None);
        // The driver drops its side of the link.
        assert_eq!(peer.from_client.recv().await, None);
    }
}
