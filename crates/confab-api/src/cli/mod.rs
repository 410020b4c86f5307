//! CLI command definitions and dispatch for the `confab` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod history;
pub mod user;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with a bot persona from the terminal.
#[derive(Parser)]
#[command(name = "confab", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Chat server base URL (overrides config.toml and CONFAB_BACKEND_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remember who you are for later chats.
    Login {
        /// Your user id on the chat server.
        #[arg(long)]
        user_id: String,

        /// Display name shown next to your messages.
        #[arg(long)]
        username: String,
    },

    /// Forget the saved user.
    Logout,

    /// Show the saved user.
    Whoami,

    /// Open an interactive chat in an existing session.
    Chat {
        /// Session id created by the chat server.
        session_id: String,

        /// Name of the bot persona.
        #[arg(long, default_value = "Bot")]
        bot_name: String,

        /// Welcome message shown in the banner.
        #[arg(long)]
        welcome: Option<String>,
    },

    /// Print the stored history of a session.
    History {
        /// Session id created by the chat server.
        session_id: String,

        /// Name shown for bot replies.
        #[arg(long, default_value = "Bot")]
        bot_name: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}
