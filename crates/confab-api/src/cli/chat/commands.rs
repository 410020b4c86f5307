//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and provide in-chat controls.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Reprint the whole conversation.
    History,
    /// Show connection and session details.
    Status,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/history" => Some(ChatCommand::History),
        "/status" => Some(ChatCommand::Status),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Help text listing all available commands.
pub fn help_text() -> String {
    [
        String::new(),
        format!("  {}", style("Available commands:").bold()),
        String::new(),
        format!("  {}     Show this help message", style("/help").cyan()),
        format!("  {}  Show the whole conversation", style("/history").cyan()),
        format!("  {}   Show connection status", style("/status").cyan()),
        format!("  {}    Clear the screen", style("/clear").cyan()),
        format!("  {}     End the chat session", style("/exit").cyan()),
        String::new(),
        format!("  {}", style("Ctrl+D to exit").dim()),
        String::new(),
    ]
    .join("\n")
}
