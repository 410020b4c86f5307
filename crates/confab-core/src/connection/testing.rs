//! Scripted in-memory transport for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use confab_types::error::ConnectionError;

use super::transport::{Transport, TransportLink, TransportSignal};

/// How the next `connect` call should behave.
#[derive(Debug, Clone)]
pub enum Handshake {
    Accept,
    Refuse(String),
}

/// The server side of an accepted connection.
pub struct Peer {
    pub session_id: String,
    pub user_id: String,
    pub to_client: mpsc::UnboundedSender<TransportSignal>,
    pub from_client: mpsc::UnboundedReceiver<String>,
}

impl Peer {
    pub fn push(&self, frame: &str) {
        let _ = self.to_client.send(TransportSignal::Frame(frame.to_string()));
    }

    pub fn push_reply(&self, content: &str) {
        let frame = serde_json::json!({
            "type": "message",
            "content": content,
            "timestamp": "2025-03-01T10:00:00",
            "bot_name": "Luna",
        });
        self.push(&frame.to_string());
    }
}

pub struct ScriptedTransport {
    script: Mutex<VecDeque<Handshake>>,
    peers: mpsc::UnboundedSender<Peer>,
    connects: AtomicUsize,
}

impl ScriptedTransport {
    /// Handshakes follow `script`, then accept once it runs out.
    pub fn new(script: Vec<Handshake>) -> (Arc<Self>, mpsc::UnboundedReceiver<Peer>) {
        let (peers, peer_rx) = mpsc::unbounded_channel();
        let transport = Self {
            script: Mutex::new(script.into()),
            peers,
            connects: AtomicUsize::new(0),
        };
        (Arc::new(transport), peer_rx)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    async fn connect(&self, session_id: &str, user_id: &str) -> Result<TransportLink, ConnectionError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .map(|mut script| script.pop_front())
            .unwrap_or(None)
            .unwrap_or(Handshake::Accept);

        match next {
            Handshake::Refuse(reason) => Err(ConnectionError::Handshake(reason)),
            Handshake::Accept => {
                let (outbound, from_client) = mpsc::unbounded_channel();
                let (to_client, inbound) = mpsc::unbounded_channel();
                let _ = self.peers.send(Peer {
                    session_id: session_id.to_string(),
                    user_id: user_id.to_string(),
                    to_client,
                    from_client,
                });
                Ok(TransportLink { outbound, inbound })
            }
        }
    }
}
