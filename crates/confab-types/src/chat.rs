//! Session, user, and timeline types for Confab.
//!
//! These types model one conversation between a user and a bot persona:
//! the externally supplied `Session` and `User` records, and the
//! `TimelineEntry` values the display layer renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Which side of the conversation authored an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "bot" => Ok(Role::Bot),
            other => Err(format!("invalid role: '{other}'")),
        }
    }
}

/// Where an entry came from.
///
/// All `Historical` entries precede all `Live` entries in the timeline,
/// regardless of their timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Historical,
    Live,
}

/// Display profile of the bot persona a session talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotProfile {
    pub name: String,
    /// Avatar reference (URL or encoded image); opaque to the core.
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub welcome_message: Option<String>,
}

/// One conversation, created by the surrounding application before the
/// core is started. Immutable for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub bot: BotProfile,
}

/// The person chatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    /// Display name used as the sender name of user entries.
    pub username: String,
}

/// Content of an entry before the timeline assigns it an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub sender_name: String,
}

impl EntryDraft {
    /// A user-authored draft.
    pub fn user(text: impl Into<String>, timestamp: DateTime<Utc>, sender: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp,
            sender_name: sender.into(),
        }
    }

    /// A bot-authored draft.
    pub fn bot(text: impl Into<String>, timestamp: DateTime<Utc>, sender: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            timestamp,
            sender_name: sender.into(),
        }
    }
}

/// One displayed utterance in the reconciled conversation.
///
/// `local_id` exists only for display-list identity. It is never sent to the
/// server and nothing else keys off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub local_id: Uuid,
    pub role: Role,
    pub text: String,
    /// Display timestamp. Not used for ordering.
    pub timestamp: DateTime<Utc>,
    pub sender_name: String,
    pub phase: Phase,
}

impl TimelineEntry {
    /// Give a draft a fresh local identity in the given phase.
    pub fn from_draft(draft: EntryDraft, phase: Phase) -> Self {
        Self {
            local_id: Uuid::now_v7(),
            role: draft.role,
            text: draft.text,
            timestamp: draft.timestamp,
            sender_name: draft.sender_name,
            phase,
        }
    }
}
