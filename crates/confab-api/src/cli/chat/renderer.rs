//! Terminal formatting for timeline entries and session notices.
//!
//! Everything here returns strings so the loop can print through the
//! readline `SharedWriter` without corrupting the prompt.

use chrono::Local;
use console::style;

use confab_core::chat::SessionSnapshot;
use confab_types::chat::{Role, TimelineEntry};
use confab_types::connection::ConnectionState;
use confab_types::event::SessionEvent;

/// Indent for wrapped lines, aligned under the message text.
const CONTINUATION: &str = "\n          ";

pub struct ChatRenderer {
    bot_name: String,
}

impl ChatRenderer {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
        }
    }

    /// One timeline entry as a single (possibly multi-line) block.
    pub fn format_entry(&self, entry: &TimelineEntry, undelivered: bool) -> String {
        let time = entry.timestamp.with_timezone(&Local).format("%H:%M").to_string();
        let name = match entry.role {
            Role::User => style(&entry.sender_name).green().bold(),
            Role::Bot => style(&entry.sender_name).cyan().bold(),
        };
        let text = entry.text.replace('\n', CONTINUATION);

        let mut line = format!("  {} {}: {}", style(time).dim(), name, text);
        if undelivered {
            line.push_str(&format!(" {}", style("(not delivered)").red()));
        }
        line
    }

    /// A user-facing notice for `event`, if it warrants one.
    pub fn format_notice(&self, event: &SessionEvent) -> Option<String> {
        if !event.is_user_facing() {
            return None;
        }
        let notice = match event {
            SessionEvent::HistoryUnavailable { reason } => format!(
                "  {} Could not load earlier messages: {}",
                style("!").yellow().bold(),
                style(reason).dim()
            ),
            SessionEvent::ModerationWarning { message } => {
                format!("  {} {}", style("!").yellow().bold(), style(message).yellow())
            }
            SessionEvent::ConnectionLost { reason } => format!(
                "  {} Connection lost: {}",
                style("✗").red().bold(),
                style(reason).dim()
            ),
            SessionEvent::Reconnecting { attempt, delay_ms } => format!(
                "  {}",
                style(format!(
                    "Reconnecting in {:.1}s (attempt {attempt})...",
                    *delay_ms as f64 / 1000.0
                ))
                .dim()
            ),
            SessionEvent::ReconnectAbandoned { attempts } => format!(
                "  {} Could not reconnect after {attempts} attempts. Restart the chat to try again.",
                style("✗").red().bold()
            ),
            SessionEvent::SendFailed { reason, .. } => format!(
                "  {} Message not delivered: {}",
                style("✗").red().bold(),
                style(reason).dim()
            ),
            _ => return None,
        };
        Some(notice)
    }

    /// Header shown above the historical batch.
    pub fn format_history_header(&self, count: usize) -> String {
        let label = if count == 1 {
            "1 earlier message".to_string()
        } else {
            format!("{count} earlier messages")
        };
        format!("  {}", style(format!("--- {label} ---")).dim())
    }

    pub fn format_status(&self, snapshot: &SessionSnapshot, session_id: &str, backend_url: &str) -> String {
        let connection = match snapshot.connection {
            ConnectionState::Open => style("connected".to_string()).green(),
            ConnectionState::Connecting => style("connecting".to_string()).yellow(),
            ConnectionState::Reconnecting { attempt } => style(format!("reconnecting (attempt {attempt})")).yellow(),
            ConnectionState::Closed => style("closed".to_string()).red(),
            ConnectionState::Error => style("error".to_string()).red(),
        };
        let typing = if snapshot.typing {
            format!("{} is typing", self.bot_name)
        } else {
            "idle".to_string()
        };

        [
            format!("  {}  {}", style("Session:").bold(), style(session_id).dim()),
            format!("  {}   {}", style("Server:").bold(), style(backend_url).dim()),
            format!("  {}   {}", style("Status:").bold(), connection),
            format!("  {}      {}", style("Bot:").bold(), typing),
            format!(
                "  {} {} ({} not delivered)",
                style("Messages:").bold(),
                snapshot.entries.len(),
                snapshot.undelivered.len()
            ),
        ]
        .join("\n")
    }

    /// Prompt text; carries the typing indicator.
    pub fn prompt(&self, typing: bool) -> String {
        if typing {
            format!(
                "  {} {} ",
                style(format!("{} is typing...", self.bot_name)).dim().italic(),
                style("You >").green().bold()
            )
        } else {
            format!("  {} ", style("You >").green().bold())
        }
    }
}
