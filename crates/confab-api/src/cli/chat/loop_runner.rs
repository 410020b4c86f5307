//! Main chat loop orchestration.
//!
//! Starts the session actor, then multiplexes keyboard input and session
//! notifications until the user exits. All output goes through the readline
//! `SharedWriter` so incoming replies never garble the line being typed.

use std::io::Write;
use std::sync::Arc;

use console::style;
use rustyline_async::SharedWriter;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use confab_core::chat::{SessionHandle, SessionOptions, start};
use confab_types::chat::{BotProfile, Phase, Role, Session};
use confab_types::error::{DispatchError, Rejection};
use confab_types::event::SessionEvent;

use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

/// Run the interactive chat loop for one session.
pub async fn run_chat_loop(
    state: &AppState,
    session_id: &str,
    bot_name: &str,
    welcome: Option<String>,
) -> anyhow::Result<()> {
    let user = state.require_user().await?;
    let session = Session {
        session_id: session_id.to_string(),
        user_id: user.user_id.clone(),
        bot: BotProfile {
            name: bot_name.to_string(),
            avatar: None,
            welcome_message: welcome,
        },
    };

    let transport = Arc::new(state.transport()?);
    let history = Arc::new(state.history_source()?);

    print_welcome_banner(&session.bot, &user, &session.session_id);

    let renderer = ChatRenderer::new(bot_name);
    let mut handle = start(
        session,
        user,
        transport,
        history,
        SessionOptions::from_config(&state.config),
    );
    let mut events = handle.take_events();

    let (mut chat_input, mut writer) =
        ChatInput::new(renderer.prompt(false)).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    info!(session_id, "Chat loop started");

    loop {
        tokio::select! {
            input = chat_input.read_line() => match input {
                InputEvent::Eof => break,
                InputEvent::Interrupted => {
                    let _ = writeln!(writer, "  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                }
                InputEvent::Message(text) => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    if let Some(cmd) = commands::parse(&text) {
                        match cmd {
                            ChatCommand::Exit => break,
                            ChatCommand::Clear => chat_input.clear(),
                            other => run_command(other, &handle, &renderer, state, &mut writer),
                        }
                        continue;
                    }
                    send(&handle, text, &mut writer).await;
                }
            },
            event = events.recv() => match event {
                Ok(event) => {
                    on_event(&event, &handle, &renderer, &mut chat_input, &mut writer).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Chat display fell behind; use /history to resync");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown().await;
    chat_input.flush();
    println!("\n  {}", style("Session ended.").dim());
    info!(session_id, "Chat loop ended");
    Ok(())
}

async fn send(handle: &SessionHandle, text: String, writer: &mut SharedWriter) {
    match handle.dispatch(text).await {
        Ok(_) => {}
        Err(DispatchError::Rejected(Rejection::InvalidOutbound)) => {}
        Err(DispatchError::Rejected(Rejection::NotConnected)) => {
            let _ = writeln!(
                writer,
                "  {} Not connected. Your message was not sent; try again once reconnected.",
                style("!").yellow().bold()
            );
        }
        // Reported through the SendFailed notice.
        Err(DispatchError::SendFailed(_)) => {}
        Err(DispatchError::SessionClosed) => {
            let _ = writeln!(writer, "  {} The session has ended.", style("✗").red().bold());
        }
    }
}

async fn on_event(
    event: &SessionEvent,
    handle: &SessionHandle,
    renderer: &ChatRenderer,
    chat_input: &mut ChatInput,
    writer: &mut SharedWriter,
) {
    match event {
        SessionEvent::HistorySeeded { count } if *count > 0 => {
            let mut watch = handle.watch();
            let Ok(snapshot) = watch.wait_for(|s| s.history_loaded).await.map(|s| s.clone()) else {
                return;
            };
            let _ = writeln!(writer, "{}", renderer.format_history_header(*count));
            for entry in snapshot.entries.iter().filter(|e| e.phase == Phase::Historical) {
                let _ = writeln!(writer, "{}", renderer.format_entry(entry, false));
            }
            let _ = writeln!(writer, "  {}", style("---").dim());
        }
        // The user's own lines are already on screen from the prompt.
        SessionEvent::EntryAppended { entry } if entry.role == Role::Bot => {
            let _ = writeln!(writer, "{}", renderer.format_entry(entry, false));
        }
        SessionEvent::TypingChanged { typing } => {
            chat_input.update_prompt(&renderer.prompt(*typing));
        }
        SessionEvent::ConnectionChanged { state } if state.is_open() => {
            let _ = writeln!(writer, "  {}", style("Connected.").dim());
        }
        other => {
            if let Some(notice) = renderer.format_notice(other) {
                let _ = writeln!(writer, "{notice}");
            }
        }
    }
}

fn run_command(cmd: ChatCommand, handle: &SessionHandle, renderer: &ChatRenderer, state: &AppState, writer: &mut SharedWriter) {
    match cmd {
        ChatCommand::Help => {
            let _ = writeln!(writer, "{}", commands::help_text());
        }
        ChatCommand::History => {
            let snapshot = handle.snapshot();
            let _ = writeln!(writer);
            if snapshot.entries.is_empty() {
                let _ = writeln!(writer, "  {}", style("No messages yet.").dim());
            }
            for entry in &snapshot.entries {
                let undelivered = snapshot.undelivered.contains(&entry.local_id);
                let _ = writeln!(writer, "{}", renderer.format_entry(entry, undelivered));
            }
            let _ = writeln!(writer);
        }
        ChatCommand::Status => {
            let status = renderer.format_status(&handle.snapshot(), &handle.session().session_id, &state.config.backend_url);
            let _ = writeln!(writer, "\n{status}\n  {}   {}\n", style("Data:").bold(), style(state.data_dir.display()).dim());
        }
        ChatCommand::Unknown(name) => {
            let _ = writeln!(
                writer,
                "  {} Unknown command: {}. Type /help for available commands.",
                style("?").yellow().bold(),
                style(name).dim()
            );
        }
        ChatCommand::Clear | ChatCommand::Exit => {}
    }
}
