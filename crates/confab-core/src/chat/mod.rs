//! Chat session core.
//!
//! `session` wires the pieces together into one actor per conversation:
//! the `timeline` reconciler, the `presence` tracker, the outbound
//! `dispatcher`, and the `history` loader.

pub mod dispatcher;
pub mod history;
pub mod presence;
pub mod session;
pub mod timeline;

pub use dispatcher::{FrameSink, OutboundDispatcher};
pub use history::{HistoryLoader, HistorySource, expand_turns};
pub use presence::PresenceTracker;
pub use session::{SessionHandle, SessionOptions, SessionSnapshot, start};
pub use timeline::Timeline;
