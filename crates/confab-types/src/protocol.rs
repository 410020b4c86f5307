//! Wire formats exchanged with the chat server.
//!
//! Live frames travel as JSON text over the WebSocket; history arrives as a
//! single JSON document from the request/response endpoint. Frames carry
//! ISO-8601 timestamps that may or may not include a UTC offset.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InboundError;

/// Frame sent for every user message.
///
/// Exactly `{"content": ..., "session_id": ...}`. There is no client message
/// id: replies are matched to requests by arrival order only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub content: String,
    pub session_id: String,
}

impl OutboundFrame {
    /// Encode as the JSON text payload of a WebSocket frame.
    pub fn to_json(&self) -> String {
        // A struct of two strings always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A bot reply pushed over the live connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotReply {
    pub content: String,
    /// ISO-8601 as sent by the server. Use [`parse_timestamp`] to read it.
    #[serde(default)]
    pub timestamp: String,
    /// Empty when the server omits it; the session falls back to the bot profile name.
    #[serde(default)]
    pub bot_name: String,
}

/// Frames the server may push, discriminated by their `type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// `{"type":"message","content":..,"timestamp":..,"bot_name":..}`
    Message(BotReply),
    /// `{"type":"moderation_warning","message":..}`
    ModerationWarning { message: String },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct ModerationPayload {
    message: String,
}

impl InboundFrame {
    /// Parse a text frame.
    ///
    /// Unknown discriminants are reported as [`InboundError::UnknownKind`] so
    /// the caller can drop them without tearing down the session.
    pub fn parse(text: &str) -> Result<Self, InboundError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| InboundError::Malformed(e.to_string()))?;

        match envelope.kind.as_deref() {
            Some("message") => serde_json::from_str::<BotReply>(text)
                .map(InboundFrame::Message)
                .map_err(|e| InboundError::Malformed(e.to_string())),
            Some("moderation_warning") => serde_json::from_str::<ModerationPayload>(text)
                .map(|p| InboundFrame::ModerationWarning { message: p.message })
                .map_err(|e| InboundError::Malformed(e.to_string())),
            Some(other) => Err(InboundError::UnknownKind(other.to_string())),
            None => Err(InboundError::Malformed("missing 'type' field".to_string())),
        }
    }
}

/// One persisted exchange: a user utterance and the bot's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub user_message: String,
    pub bot_response: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Body of `GET /api/chat/messages/{session_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryTurn>,
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339 (with offset) and naive ISO-8601, which is read as UTC.
/// Returns `None` for anything else; timestamps are display-only, so callers
/// substitute the local receive time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_outbound_frame_shape() {
        let frame = OutboundFrame {
            content: "hello".to_string(),
            session_id: "s-1".to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&frame.to_json()).unwrap();
        assert_eq!(value, serde_json::json!({"content": "hello", "session_id": "s-1"}));
    }

    #[test]
    fn test_parse_message_frame() {
        let text = r#"{"type":"message","bot_name":"Luna","content":"hey!","timestamp":"2025-03-01T10:00:00.123456"}"#;
        match InboundFrame::parse(text).unwrap() {
            InboundFrame::Message(reply) => {
                assert_eq!(reply.content, "hey!");
                assert_eq!(reply.bot_name, "Luna");
                assert!(parse_timestamp(&reply.timestamp).is_some());
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_moderation_warning() {
        let text = r#"{"type":"moderation_warning","message":"Please keep it respectful"}"#;
        assert_eq!(
            InboundFrame::parse(text).unwrap(),
            InboundFrame::ModerationWarning {
                message: "Please keep it respectful".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_kind_is_reported() {
        let err = InboundFrame::parse(r#"{"type":"presence","online":true}"#).unwrap_err();
        assert!(matches!(err, InboundError::UnknownKind(ref k) if k == "presence"));
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(InboundFrame::parse("not json"), Err(InboundError::Malformed(_))));
        assert!(matches!(InboundFrame::parse(r#"{"content":"x"}"#), Err(InboundError::Malformed(_))));
        // Right discriminant, missing content.
        assert!(matches!(
            InboundFrame::parse(r#"{"type":"message","bot_name":"Luna"}"#),
            Err(InboundError::Malformed(_))
        ));
    }

    #[test]
    fn test_message_without_bot_name() {
        let text = r#"{"type":"message","content":"hey","timestamp":"2025-03-01T10:00:00"}"#;
        match InboundFrame::parse(text).unwrap() {
            InboundFrame::Message(reply) => {
                assert_eq!(reply.content, "hey");
                assert!(reply.bot_name.is_empty());
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let with_offset = parse_timestamp("2025-03-01T10:00:00+02:00").unwrap();
        assert_eq!(with_offset.hour(), 8);

        let naive = parse_timestamp("2025-03-01T10:00:00.5").unwrap();
        assert_eq!(naive.hour(), 10);
        assert_eq!(naive.day(), 1);

        let whole_seconds = parse_timestamp("2025-03-01T10:00:00").unwrap();
        assert_eq!(whole_seconds.minute(), 0);

        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_history_response_defaults() {
        let resp: HistoryResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.messages.is_empty());

        let resp: HistoryResponse = serde_json::from_str(
            r#"{"messages":[{"user_message":"hi","bot_response":"hello!","timestamp":"2025-03-01T10:00:00"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.messages.len(), 1);
        assert_eq!(resp.messages[0].bot_response, "hello!");
    }
}
