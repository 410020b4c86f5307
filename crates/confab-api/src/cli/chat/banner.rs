//! Welcome banner display for chat sessions.
//!
//! Prints a styled banner when a chat session starts, showing the bot's
//! name, its welcome message, and session information.

use console::style;

use confab_types::chat::{BotProfile, User};

/// Print the welcome banner at the start of a chat session.
pub fn print_welcome_banner(bot: &BotProfile, user: &User, session_id: &str) {
    println!();
    println!("  * {}", style(&bot.name).cyan().bold());
    if let Some(welcome) = bot.welcome_message.as_deref().filter(|w| !w.trim().is_empty()) {
        println!("  {}", style(welcome).dim());
    }
    println!();
    println!("  {}  {}", style("Session:").bold(), style(short_id(session_id)).dim());
    println!("  {}     {}", style("User:").bold(), style(&user.username).dim());
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}

/// First eight characters of an id, for display.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}
