//! Live connection management.
//!
//! `Transport` is the port the infrastructure layer implements;
//! `ConnectionManager` turns it into per-connection handles with a strict
//! state machine; `ReconnectPolicy` decides when to open the next handle
//! after a drop.

pub mod backoff;
pub mod manager;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use backoff::ReconnectPolicy;
pub use manager::{ConnectionHandle, ConnectionManager};
pub use transport::{Transport, TransportLink, TransportSignal};
