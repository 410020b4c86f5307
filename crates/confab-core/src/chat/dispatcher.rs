//! Outbound dispatcher.
//!
//! Validates user text, appends the optimistic user entry, transmits the
//! frame, and arms the typing indicator, in that order. Replies are matched
//! to requests by arrival order only; the frame carries no correlation id.

use chrono::Utc;
use tokio::time::Instant;

use confab_types::chat::{EntryDraft, TimelineEntry};
use confab_types::error::{ConnectionError, DispatchError, Rejection};
use confab_types::protocol::OutboundFrame;

use super::presence::PresenceTracker;
use super::timeline::Timeline;
use crate::connection::ConnectionHandle;

/// Where outbound frames go. Implemented by [`ConnectionHandle`].
pub trait FrameSink {
    fn is_open(&self) -> bool;
    fn transmit(&self, payload: String) -> Result<(), ConnectionError>;
}

impl FrameSink for ConnectionHandle {
    fn is_open(&self) -> bool {
        self.state().is_open()
    }

    fn transmit(&self, payload: String) -> Result<(), ConnectionError> {
        self.send(payload)
    }
}

/// A dispatch that reached the transport.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub entry: TimelineEntry,
    /// `false` while history is still pending.
    pub visible: bool,
    /// Whether the typing indicator was turned on by this dispatch.
    pub typing_started: bool,
}

#[derive(Debug, Clone)]
pub struct OutboundDispatcher {
    session_id: String,
    sender_name: String,
}

impl OutboundDispatcher {
    pub fn new(session_id: impl Into<String>, sender_name: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            sender_name: sender_name.into(),
        }
    }

    /// Trim `text`, rejecting it if nothing is left.
    pub fn validate(text: &str) -> Result<&str, Rejection> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Err(Rejection::InvalidOutbound)
        } else {
            Ok(trimmed)
        }
    }

    /// Send one user message.
    ///
    /// Rejections leave the timeline untouched. A transport failure after the
    /// append keeps the entry, records it as undelivered, skips the typing
    /// indicator, and returns `SendFailed`.
    pub fn dispatch<S: FrameSink>(
        &self,
        text: &str,
        timeline: &mut Timeline,
        presence: &mut PresenceTracker,
        sink: Option<&S>,
        now: Instant,
    ) -> Result<Dispatched, DispatchError> {
        let content = Self::validate(text)?;
        let sink = match sink {
            Some(sink) if sink.is_open() => sink,
            _ => return Err(Rejection::NotConnected.into()),
        };

        let appended = timeline.append_live(EntryDraft::user(content, Utc::now(), &self.sender_name));

        let frame = OutboundFrame {
            content: content.to_string(),
            session_id: self.session_id.clone(),
        };
        if let Err(err) = sink.transmit(frame.to_json()) {
            tracing::warn!(session_id = %self.session_id, error = %err, "Outbound frame not delivered");
            timeline.mark_undelivered(appended.entry.local_id);
            return Err(match err {
                ConnectionError::NotConnected => DispatchError::SendFailed("not connected".to_string()),
                other => DispatchError::SendFailed(other.to_string()),
            });
        }

        let typing_started = presence.on_dispatched(now);
        tracing::debug!(session_id = %self.session_id, local_id = %appended.entry.local_id, "Message dispatched");

        Ok(Dispatched {
            entry: appended.entry,
            visible: appended.visible,
            typing_started,
        })
    }
}
