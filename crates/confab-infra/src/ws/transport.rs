//! WebSocketTransport -- concrete [`Transport`] over tokio-tungstenite.
//!
//! Connects to `{ws_base}/ws/{session_id}/{user_id}` where `ws_base` is the
//! backend URL with its scheme swapped (`http` -> `ws`, `https` -> `wss`).
//! Each connection gets one pump task that forwards outbound payloads to the
//! socket and socket frames to the inbound channel.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use confab_core::connection::{Transport, TransportLink, TransportSignal};
use confab_types::error::ConnectionError;

/// Derive the WebSocket base URL from the HTTP backend URL.
pub fn ws_base_url(backend_url: &str) -> Result<String, ConnectionError> {
    let trimmed = backend_url.trim().trim_end_matches('/');
    let base = if trimmed.starts_with("https://") {
        trimmed.replacen("https://", "wss://", 1)
    } else if trimmed.starts_with("http://") {
        trimmed.replacen("http://", "ws://", 1)
    } else if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
        trimmed.to_string()
    } else {
        return Err(ConnectionError::InvalidEndpoint(format!(
            "unsupported backend url '{backend_url}'"
        )));
    };
    Ok(base)
}

/// Ids are interpolated into the path verbatim.
fn check_segment(kind: &str, value: &str) -> Result<(), ConnectionError> {
    if value.is_empty() || value.chars().any(|c| matches!(c, '/' | '?' | '#') || c.is_whitespace()) {
        return Err(ConnectionError::InvalidEndpoint(format!("invalid {kind} '{value}'")));
    }
    Ok(())
}

pub struct WebSocketTransport {
    ws_base: String,
}

impl WebSocketTransport {
    pub fn new(backend_url: &str) -> Result<Self, ConnectionError> {
        Ok(Self {
            ws_base: ws_base_url(backend_url)?,
        })
    }

    /// Full URL of the live endpoint for one session.
    pub fn endpoint(&self, session_id: &str, user_id: &str) -> Result<String, ConnectionError> {
        check_segment("session id", session_id)?;
        check_segment("user id", user_id)?;
        Ok(format!("{}/ws/{session_id}/{user_id}", self.ws_base))
    }
}

impl Transport for WebSocketTransport {
    async fn connect(&self, session_id: &str, user_id: &str) -> Result<TransportLink, ConnectionError> {
        let url = self.endpoint(session_id, user_id)?;
        tracing::debug!(%url, "Opening WebSocket");

        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| ConnectionError::Handshake(e.to_string()))?;
        let (mut sink, mut source) = stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    payload = outbound_rx.recv() => match payload {
                        Some(text) => {
                            if let Err(err) = sink.send(Message::text(text)).await {
                                let _ = inbound_tx.send(TransportSignal::Fault(err.to_string()));
                                return;
                            }
                        }
                        None => {
                            // Link dropped by the owner.
                            let _ = sink.close().await;
                            return;
                        }
                    },
                    message = source.next() => match message {
                        Some(Ok(Message::Text(text))) => {
                            let _ = inbound_tx.send(TransportSignal::Frame(text.to_string()));
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::debug!(?frame, "WebSocket closed by server");
                            let _ = inbound_tx.send(TransportSignal::Closed);
                            return;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            let _ = inbound_tx.send(TransportSignal::Fault(err.to_string()));
                            return;
                        }
                        None => {
                            let _ = inbound_tx.send(TransportSignal::Closed);
                            return;
                        }
                    },
                }
            }
        });

        Ok(TransportLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
