//! Event types emitted by the chat session core.
//!
//! `ConnectionEvent` is the lifecycle sequence produced by one connection
//! handle. `SessionEvent` is the notification stream the host UI subscribes
//! to; all variants are Clone + Send + Sync for use with tokio broadcast
//! channels.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::TimelineEntry;
use crate::connection::ConnectionState;
use crate::protocol::InboundFrame;

/// Lifecycle events of a single connection handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Handshake completed; the handle is `Open`.
    Connected,
    /// The peer closed the connection in an orderly way.
    Disconnected,
    /// Handshake failure or transport fault.
    Error(String),
    /// A recognized frame from the server.
    Inbound(InboundFrame),
}

/// Notifications for the display layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// History was seeded into the visible timeline.
    HistorySeeded { count: usize },

    /// History could not be fetched; the timeline starts empty.
    HistoryUnavailable { reason: String },

    /// A new entry became visible at the end of the timeline.
    EntryAppended { entry: TimelineEntry },

    /// Connectivity changed.
    ConnectionChanged { state: ConnectionState },

    /// The typing indicator turned on or off.
    TypingChanged { typing: bool },

    /// Content-policy signal from the server. The conversation continues.
    ModerationWarning { message: String },

    /// The connection failed or dropped. Shown once per failure.
    ConnectionLost { reason: String },

    /// A new connection will be attempted after `delay_ms`.
    Reconnecting { attempt: u32, delay_ms: u64 },

    /// The reconnect budget is exhausted; sending stays disabled.
    ReconnectAbandoned { attempts: u32 },

    /// A message was appended locally but never reached the transport.
    SendFailed { local_id: Uuid, reason: String },
}

impl SessionEvent {
    /// Whether the host UI should surface this as a user-facing notice
    /// rather than a silent state update.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            SessionEvent::HistoryUnavailable { .. }
                | SessionEvent::ModerationWarning { .. }
                | SessionEvent::ConnectionLost { .. }
                | SessionEvent::Reconnecting { .. }
                | SessionEvent::ReconnectAbandoned { .. }
                | SessionEvent::SendFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_event_tagging() {
        let event = SessionEvent::ModerationWarning {
            message: "be nice".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"moderation_warning\""));
        assert!(json.contains("be nice"));
    }

    #[test]
    fn test_connection_changed_nests_state() {
        let event = SessionEvent::ConnectionChanged {
            state: ConnectionState::Open,
        };
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "connection_changed");
        assert_eq!(value["state"]["state"], "open");
    }

    #[test]
    fn test_user_facing_classification() {
        assert!(SessionEvent::ConnectionLost { reason: "x".into() }.is_user_facing());
        assert!(!SessionEvent::TypingChanged { typing: true }.is_user_facing());
        assert!(!SessionEvent::HistorySeeded { count: 2 }.is_user_facing());
    }
}
