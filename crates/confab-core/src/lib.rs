//! Chat session core and port trait definitions for Confab.
//!
//! This crate defines the "ports" (`Transport`, `HistorySource`,
//! `UserStore`) that the infrastructure layer implements, and the session
//! actor that reconciles history with the live conversation. It depends
//! only on `confab-types`, never on `confab-infra` or any network crate.

pub mod chat;
pub mod connection;
pub mod event;
pub mod repository;
