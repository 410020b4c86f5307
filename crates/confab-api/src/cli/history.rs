//! One-shot history printing: `confab history <session-id>`.

use anyhow::Context;
use chrono::Utc;
use console::style;

use confab_core::chat::{HistorySource, expand_turns};
use confab_core::repository::UserStore;
use confab_types::chat::{EntryDraft, Phase, TimelineEntry};

use crate::state::AppState;

use super::chat::renderer::ChatRenderer;

/// Fetch and print the stored turns of a session.
pub async fn show_history(state: &AppState, session_id: &str, bot_name: &str, json: bool) -> anyhow::Result<()> {
    let source = state.history_source()?;
    let turns = source
        .fetch(session_id)
        .await
        .with_context(|| format!("Failed to load history for session '{session_id}'"))?;

    let user_name = state
        .user_store
        .load()
        .await
        .ok()
        .flatten()
        .map(|user| user.username)
        .unwrap_or_else(|| "You".to_string());
    let drafts = expand_turns(turns, &user_name, bot_name, Utc::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&drafts_to_json(&drafts))?);
        return Ok(());
    }

    if drafts.is_empty() {
        println!("\n  {}\n", style("No messages in this session yet.").dim());
        return Ok(());
    }

    let renderer = ChatRenderer::new(bot_name);
    println!();
    for draft in drafts {
        let entry = TimelineEntry::from_draft(draft, Phase::Historical);
        println!("{}", renderer.format_entry(&entry, false));
    }
    println!();
    Ok(())
}

fn drafts_to_json(drafts: &[EntryDraft]) -> serde_json::Value {
    serde_json::Value::Array(
        drafts
            .iter()
            .map(|d| {
                serde_json::json!({
                    "role": d.role,
                    "sender_name": d.sender_name,
                    "text": d.text,
                    "timestamp": d.timestamp.to_rfc3339(),
                })
            })
            .collect(),
    )
}
