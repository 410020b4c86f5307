//! Live chat transport over WebSocket.

pub mod transport;

pub use transport::{WebSocketTransport, ws_base_url};
