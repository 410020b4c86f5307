//! Infrastructure layer for Confab.
//!
//! Contains implementations of the port traits defined in `confab-core`:
//! the WebSocket transport, the HTTP history source, the file-backed user
//! store, and the config loader.

pub mod config;
pub mod filesystem;
pub mod history;
pub mod ws;
