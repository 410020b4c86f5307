//! Confab CLI entry point.
//!
//! Binary name: `confab`
//!
//! Parses CLI arguments, initializes tracing and application state, then
//! dispatches to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use confab_observe::tracing_setup::{init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,confab=debug",
        _ => "trace",
    };
    init_tracing(filter, cli.otel).map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "confab", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.backend_url.clone()).await?;

    match cli.command {
        Commands::Login { user_id, username } => {
            cli::user::login(&state, &user_id, &username, cli.json).await?;
        }

        Commands::Logout => {
            cli::user::logout(&state, cli.json).await?;
        }

        Commands::Whoami => {
            cli::user::whoami(&state, cli.json).await?;
        }

        Commands::Chat {
            session_id,
            bot_name,
            welcome,
        } => {
            cli::chat::loop_runner::run_chat_loop(&state, &session_id, &bot_name, welcome).await?;
        }

        Commands::History { session_id, bot_name } => {
            cli::history::show_history(&state, &session_id, &bot_name, cli.json).await?;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}
