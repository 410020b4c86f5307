//! Typing indicator and mirrored connectivity.
//!
//! Pure state: the session actor feeds it events and the current instant,
//! and sleeps until [`PresenceTracker::deadline`] to deliver the timeout.

use std::time::Duration;

use tokio::time::Instant;

use confab_types::connection::ConnectionState;

#[derive(Debug, Clone)]
pub struct PresenceTracker {
    timeout: Duration,
    typing: bool,
    deadline: Option<Instant>,
    connection: ConnectionState,
}

impl PresenceTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            typing: false,
            deadline: None,
            connection: ConnectionState::Connecting,
        }
    }

    pub fn typing(&self) -> bool {
        self.typing
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// When the typing indicator expires, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// A message was handed to the transport. Re-arms the timeout if typing
    /// was already on. Returns whether `typing` changed.
    pub fn on_dispatched(&mut self, now: Instant) -> bool {
        self.deadline = Some(now + self.timeout);
        !std::mem::replace(&mut self.typing, true)
    }

    /// A bot reply arrived.
    pub fn on_reply(&mut self) -> bool {
        self.stop()
    }

    /// The timer fired. Ignored unless the armed deadline has passed, so a
    /// stale wake-up after a re-arm does nothing.
    pub fn on_deadline(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => self.stop(),
            _ => false,
        }
    }

    /// Mirror the connection state. Anything but `Open` forces typing off.
    /// Returns whether `typing` changed.
    pub fn on_connection(&mut self, state: ConnectionState) -> bool {
        self.connection = state;
        if state.is_open() { false } else { self.stop() }
    }

    fn stop(&mut self) -> bool {
        self.deadline = None;
        std::mem::replace(&mut self.typing, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn open_tracker() -> PresenceTracker {
        let mut tracker = PresenceTracker::new(TIMEOUT);
        tracker.on_connection(ConnectionState::Open);
        tracker
    }

    #[test]
    fn starts_idle_and_connecting() {
        let tracker = PresenceTracker::new(TIMEOUT);
        assert!(!tracker.typing());
        assert_eq!(tracker.connection(), ConnectionState::Connecting);
        assert!(tracker.deadline().is_none());
    }

    #[test]
    fn dispatch_arms_and_reply_clears() {
        let mut tracker = open_tracker();
        let now = Instant::now();

        assert!(tracker.on_dispatched(now));
        assert!(tracker.typing());
        assert_eq!(tracker.deadline(), Some(now + TIMEOUT));

        assert!(tracker.on_reply());
        assert!(!tracker.typing());
        assert!(tracker.deadline().is_none());
        assert!(!tracker.on_reply());
    }

    #[test]
    fn deadline_clears_only_when_due() {
        let mut tracker = open_tracker();
        let now = Instant::now();
        tracker.on_dispatched(now);

        assert!(!tracker.on_deadline(now + Duration::from_secs(4)));
        assert!(tracker.typing());
        assert!(tracker.on_deadline(now + TIMEOUT));
        assert!(!tracker.typing());
    }

    #[test]
    fn second_dispatch_extends_deadline() {
        let mut tracker = open_tracker();
        let first = Instant::now();
        tracker.on_dispatched(first);
        let second = first + Duration::from_secs(3);
        assert!(!tracker.on_dispatched(second));

        assert!(!tracker.on_deadline(first + TIMEOUT));
        assert!(tracker.typing());
        assert!(tracker.on_deadline(second + TIMEOUT));
    }

    #[test]
    fn losing_the_connection_forces_typing_off() {
        let mut tracker = open_tracker();
        tracker.on_dispatched(Instant::now());

        assert!(tracker.on_connection(ConnectionState::Error));
        assert!(!tracker.typing());
        assert!(tracker.deadline().is_none());
        assert_eq!(tracker.connection(), ConnectionState::Error);
    }

    #[test]
    fn reconnecting_is_not_open() {
        let mut tracker = open_tracker();
        tracker.on_dispatched(Instant::now());
        assert!(tracker.on_connection(ConnectionState::Reconnecting { attempt: 1 }));
        assert!(!tracker.connection().is_open());
    }
}
