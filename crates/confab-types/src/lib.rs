//! Shared domain types for Confab.
//!
//! This crate contains the types passed between the chat session core, its
//! infrastructure adapters, and the terminal front end: sessions and users,
//! timeline entries, connection state, wire frames, configuration, events,
//! and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod protocol;
