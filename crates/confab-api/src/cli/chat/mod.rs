//! Interactive CLI chat experience for Confab.
//!
//! Runs one chat session in the terminal: welcome banner, history, live
//! replies, typing indicator, notices, and slash commands. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
