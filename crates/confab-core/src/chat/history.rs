//! History loading.
//!
//! `HistorySource` is the port the infrastructure layer implements over the
//! request/response endpoint. `HistoryLoader` fetches once, without retries,
//! and expands each turn into a user entry followed by a bot entry.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use confab_types::chat::EntryDraft;
use confab_types::error::HistoryError;
use confab_types::protocol::{HistoryTurn, parse_timestamp};

/// Fetches the persisted turns of a session, oldest first.
pub trait HistorySource: Send + Sync + 'static {
    fn fetch(&self, session_id: &str) -> impl Future<Output = Result<Vec<HistoryTurn>, HistoryError>> + Send;
}

/// Expand turns into display drafts: two per turn, user then bot, turn order
/// preserved. Both entries of a turn share its timestamp; unparseable
/// timestamps fall back to `now`.
pub fn expand_turns(turns: Vec<HistoryTurn>, user_name: &str, bot_name: &str, now: DateTime<Utc>) -> Vec<EntryDraft> {
    let mut drafts = Vec::with_capacity(turns.len() * 2);
    for turn in turns {
        let timestamp = parse_timestamp(&turn.timestamp).unwrap_or(now);
        drafts.push(EntryDraft::user(turn.user_message, timestamp, user_name));
        drafts.push(EntryDraft::bot(turn.bot_response, timestamp, bot_name));
    }
    drafts
}

pub struct HistoryLoader<H> {
    source: Arc<H>,
    user_name: String,
    bot_name: String,
}

impl<H: HistorySource> HistoryLoader<H> {
    pub fn new(source: Arc<H>, user_name: impl Into<String>, bot_name: impl Into<String>) -> Self {
        Self {
            source,
            user_name: user_name.into(),
            bot_name: bot_name.into(),
        }
    }

    /// Fetch and expand the history of `session_id`.
    pub async fn load(&self, session_id: &str) -> Result<Vec<EntryDraft>, HistoryError> {
        let turns = self.source.fetch(session_id).await?;
        tracing::debug!(%session_id, turns = turns.len(), "History fetched");
        Ok(expand_turns(turns, &self.user_name, &self.bot_name, Utc::now()))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticHistory;
    use super::*;
    use chrono::TimeZone;
    use confab_types::chat::Role;

    #[test]
    fn expands_each_turn_into_user_then_bot() {
        let turns = vec![
            HistoryTurn {
                user_message: "hi".into(),
                bot_response: "hello!".into(),
                timestamp: "2025-01-01T09:00:00".into(),
            },
            HistoryTurn {
                user_message: "how are you".into(),
                bot_response: "good, thanks".into(),
                timestamp: "2025-01-01T09:01:00+00:00".into(),
            },
        ];
        let drafts = expand_turns(turns, "sam", "Luna", Utc::now());

        let shape: Vec<(Role, &str, &str)> = drafts
            .iter()
            .map(|d| (d.role, d.text.as_str(), d.sender_name.as_str()))
            .collect();
        assert_eq!(
            shape,
            [
                (Role::User, "hi", "sam"),
                (Role::Bot, "hello!", "Luna"),
                (Role::User, "how are you", "sam"),
                (Role::Bot, "good, thanks", "Luna"),
            ]
        );
        assert_eq!(drafts[0].timestamp, drafts[1].timestamp);
        assert_eq!(drafts[0].timestamp, Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn bad_timestamp_falls_back_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let turns = vec![HistoryTurn {
            user_message: "a".into(),
            bot_response: "b".into(),
            timestamp: "yesterday".into(),
        }];
        let drafts = expand_turns(turns, "sam", "Luna", now);
        assert!(drafts.iter().all(|d| d.timestamp == now));
    }

    #[tokio::test]
    async fn loader_expands_fetched_turns() {
        let source = StaticHistory::turns(&[("hi", "hello!"), ("how are you", "good, thanks")]);
        let loader = HistoryLoader::new(source, "sam", "Luna");
        let drafts = loader.load("s-1").await.unwrap();
        assert_eq!(drafts.len(), 4);
    }

    #[tokio::test]
    async fn loader_reports_failure() {
        let source = StaticHistory::failing(HistoryError::Status {
            status: 404,
            body: "Session not found".into(),
        });
        let loader = HistoryLoader::new(source, "sam", "Luna");
        let err = loader.load("missing").await.unwrap_err();
        assert!(matches!(err, HistoryError::Status { status: 404, .. }));
    }
}
