//! Chat session actor.
//!
//! One tokio task per session owns the timeline and presence tracker and
//! serializes everything that touches them: dispatch commands, the history
//! result, connection events, the typing deadline, and the reconnect timer.
//! The display layer reads snapshots from a `watch` channel and discrete
//! notifications from the [`EventBus`].

use std::collections::HashSet;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use confab_types::chat::{EntryDraft, Session, TimelineEntry, User};
use confab_types::config::{ClientConfig, ReconnectConfig};
use confab_types::connection::ConnectionState;
use confab_types::error::{DispatchError, HistoryError};
use confab_types::event::{ConnectionEvent, SessionEvent};
use confab_types::protocol::{BotReply, InboundFrame, parse_timestamp};

use super::dispatcher::OutboundDispatcher;
use super::history::{HistoryLoader, HistorySource};
use super::presence::PresenceTracker;
use super::timeline::Timeline;
use crate::connection::{ConnectionHandle, ConnectionManager, ReconnectPolicy, Transport};
use crate::event::EventBus;

const COMMAND_BUFFER: usize = 32;

/// Tunables for one session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub typing_timeout: Duration,
    pub event_capacity: usize,
    pub reconnect: ReconnectConfig,
}

impl SessionOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            typing_timeout: Duration::from_millis(config.typing_timeout_ms),
            event_capacity: config.event_capacity,
            reconnect: config.reconnect.clone(),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// Point-in-time view of a session for rendering.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub connection: ConnectionState,
    pub typing: bool,
    /// The visible timeline in display order.
    pub entries: Vec<TimelineEntry>,
    pub undelivered: HashSet<Uuid>,
    /// Whether the history fetch has finished, successfully or not.
    pub history_loaded: bool,
}

enum Command {
    Dispatch {
        text: String,
        reply: oneshot::Sender<Result<Uuid, DispatchError>>,
    },
}

/// Start a session: begins the history fetch and the connection handshake
/// concurrently and returns immediately.
///
/// Must be called from within a tokio runtime.
pub fn start<T, H>(session: Session, user: User, transport: Arc<T>, history: Arc<H>, options: SessionOptions) -> SessionHandle
where
    T: Transport,
    H: HistorySource,
{
    let cancel = CancellationToken::new();
    let bus = EventBus::new(options.event_capacity);
    // Subscribed before the actor exists so nothing published at startup is missed.
    let events = bus.subscribe();
    let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);

    let (history_tx, history_rx) = oneshot::channel();
    let loader = HistoryLoader::new(history, user.username.clone(), session.bot.name.clone());
    let history_cancel = cancel.child_token();
    let history_session = session.session_id.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = history_cancel.cancelled() => {}
            result = loader.load(&history_session) => {
                let _ = history_tx.send(result);
            }
        }
    });

    let manager = ConnectionManager::new(transport);
    let connection = manager.open(&session.session_id, &session.user_id);
    tracing::info!(session_id = %session.session_id, bot = %session.bot.name, "Session started");

    let actor = SessionActor {
        dispatcher: OutboundDispatcher::new(session.session_id.clone(), user.username.clone()),
        policy: ReconnectPolicy::new(options.reconnect),
        presence: PresenceTracker::new(options.typing_timeout),
        timeline: Timeline::new(),
        connection: Some(connection),
        attempt: 0,
        reconnect_at: None,
        rng: StdRng::from_entropy(),
        bus: bus.clone(),
        snapshot: snapshot_tx,
        cancel: cancel.clone(),
        manager,
        session: session.clone(),
    };
    let task = tokio::spawn(actor.run(command_rx, history_rx));

    SessionHandle {
        session,
        commands: command_tx,
        bus,
        events: Some(events),
        snapshot: snapshot_rx,
        cancel,
        task: Some(task),
    }
}

/// Control surface for a running session. Dropping it stops the session.
pub struct SessionHandle {
    session: Session,
    commands: mpsc::Sender<Command>,
    bus: EventBus,
    events: Option<broadcast::Receiver<SessionEvent>>,
    snapshot: watch::Receiver<SessionSnapshot>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send a user message. Returns the local id of the appended entry.
    pub async fn dispatch(&self, text: impl Into<String>) -> Result<Uuid, DispatchError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Dispatch { text: text.into(), reply })
            .await
            .map_err(|_| DispatchError::SessionClosed)?;
        response.await.map_err(|_| DispatchError::SessionClosed)?
    }

    /// The receiver opened when the session started. It holds every
    /// notification since then, including history and connection failures
    /// that happen before the caller is ready. Later calls fall back to
    /// [`subscribe`](Self::subscribe).
    pub fn take_events(&mut self) -> broadcast::Receiver<SessionEvent> {
        self.events.take().unwrap_or_else(|| self.bus.subscribe())
    }

    /// Subscribe to notifications published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver that tracks the session snapshot.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Stop the session and wait for the actor to finish. The connection is
    /// closed and all timers are disarmed when this returns.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "Session task ended abnormally");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SessionActor<T> {
    session: Session,
    manager: ConnectionManager<T>,
    connection: Option<ConnectionHandle>,
    timeline: Timeline,
    presence: PresenceTracker,
    dispatcher: OutboundDispatcher,
    policy: ReconnectPolicy,
    /// Reconnect attempts since the last successful handshake.
    attempt: u32,
    reconnect_at: Option<Instant>,
    rng: StdRng,
    bus: EventBus,
    snapshot: watch::Sender<SessionSnapshot>,
    cancel: CancellationToken,
}

impl<T: Transport> SessionActor<T> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut history: oneshot::Receiver<Result<Vec<EntryDraft>, HistoryError>>,
    ) {
        let mut history_pending = true;
        loop {
            let typing_deadline = self.presence.deadline();
            let reconnect_at = self.reconnect_at;

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = &mut history, if history_pending => {
                    history_pending = false;
                    let result = result.unwrap_or_else(|_| Err(HistoryError::Transport("history task ended".to_string())));
                    self.on_history(result);
                }
                event = next_event(&mut self.connection) => self.on_connection_event(event),
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
                _ = sleep_until_opt(typing_deadline) => {
                    if self.presence.on_deadline(Instant::now()) {
                        tracing::debug!(session_id = %self.session.session_id, "Typing indicator timed out");
                        self.bus.publish(SessionEvent::TypingChanged { typing: false });
                    }
                }
                _ = sleep_until_opt(reconnect_at) => self.reconnect(),
            }

            self.publish_snapshot();
        }

        self.teardown();
    }

    fn on_history(&mut self, result: Result<Vec<EntryDraft>, HistoryError>) {
        let drafts = match result {
            Ok(drafts) => drafts,
            Err(err) => {
                tracing::warn!(session_id = %self.session.session_id, error = %err, "History unavailable");
                self.bus.publish(SessionEvent::HistoryUnavailable { reason: err.to_string() });
                Vec::new()
            }
        };

        match self.timeline.seed_history(drafts) {
            Ok(seeded) => {
                self.bus.publish(SessionEvent::HistorySeeded { count: seeded.historical });
                for entry in seeded.released {
                    self.bus.publish(SessionEvent::EntryAppended { entry });
                }
            }
            Err(err) => {
                tracing::warn!(session_id = %self.session.session_id, error = %err, "Ignoring second history batch");
            }
        }
    }

    fn on_connection_event(&mut self, event: Option<ConnectionEvent>) {
        match event {
            Some(ConnectionEvent::Connected) => {
                self.attempt = 0;
                self.set_connection(ConnectionState::Open);
            }
            Some(ConnectionEvent::Inbound(InboundFrame::Message(reply))) => self.on_reply(reply),
            Some(ConnectionEvent::Inbound(InboundFrame::ModerationWarning { message })) => {
                tracing::info!(session_id = %self.session.session_id, "Moderation warning received");
                self.bus.publish(SessionEvent::ModerationWarning { message });
            }
            Some(ConnectionEvent::Disconnected) => {
                self.on_connection_lost(ConnectionState::Closed, "connection closed by server".to_string());
            }
            Some(ConnectionEvent::Error(detail)) => self.on_connection_lost(ConnectionState::Error, detail),
            // The handle ended without a final event; it was closed locally.
            None => self.connection = None,
        }
    }

    fn on_reply(&mut self, reply: BotReply) {
        let sender = if reply.bot_name.is_empty() {
            self.session.bot.name.clone()
        } else {
            reply.bot_name
        };
        let timestamp = parse_timestamp(&reply.timestamp).unwrap_or_else(Utc::now);
        let appended = self.timeline.append_live(EntryDraft::bot(reply.content, timestamp, sender));
        if appended.visible {
            self.bus.publish(SessionEvent::EntryAppended { entry: appended.entry });
        }
        if self.presence.on_reply() {
            self.bus.publish(SessionEvent::TypingChanged { typing: false });
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Dispatch { text, reply } => {
                let result = self.dispatch(&text);
                let _ = reply.send(result);
            }
        }
    }

    fn dispatch(&mut self, text: &str) -> Result<Uuid, DispatchError> {
        let result = self.dispatcher.dispatch(
            text,
            &mut self.timeline,
            &mut self.presence,
            self.connection.as_ref(),
            Instant::now(),
        );

        match result {
            Ok(sent) => {
                let local_id = sent.entry.local_id;
                if sent.visible {
                    self.bus.publish(SessionEvent::EntryAppended { entry: sent.entry });
                }
                if sent.typing_started {
                    self.bus.publish(SessionEvent::TypingChanged { typing: true });
                }
                Ok(local_id)
            }
            Err(DispatchError::SendFailed(reason)) => {
                if let Some(entry) = self.timeline.last_live().cloned() {
                    let local_id = entry.local_id;
                    if self.timeline.is_seeded() {
                        self.bus.publish(SessionEvent::EntryAppended { entry });
                    }
                    self.bus.publish(SessionEvent::SendFailed {
                        local_id,
                        reason: reason.clone(),
                    });
                }
                Err(DispatchError::SendFailed(reason))
            }
            Err(err) => Err(err),
        }
    }

    /// Handle a handshake error or a dropped connection: notify once per
    /// outage, then schedule the next attempt or give up.
    fn on_connection_lost(&mut self, state: ConnectionState, reason: String) {
        self.connection = None;
        if self.attempt == 0 {
            tracing::warn!(session_id = %self.session.session_id, %reason, "Connection lost");
            self.bus.publish(SessionEvent::ConnectionLost { reason });
        } else {
            tracing::debug!(session_id = %self.session.session_id, attempt = self.attempt, %reason, "Reconnect attempt failed");
        }
        self.set_connection(state);

        let next = self.attempt + 1;
        match self.policy.delay_for(next, &mut self.rng) {
            Some(delay) => {
                self.attempt = next;
                self.reconnect_at = Some(Instant::now() + delay);
                tracing::info!(
                    session_id = %self.session.session_id,
                    attempt = next,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling reconnect"
                );
                self.set_connection(ConnectionState::Reconnecting { attempt: next });
                self.bus.publish(SessionEvent::Reconnecting {
                    attempt: next,
                    delay_ms: delay.as_millis() as u64,
                });
            }
            None if self.policy.enabled() => {
                tracing::warn!(
                    session_id = %self.session.session_id,
                    attempts = self.attempt,
                    max_attempts = self.policy.max_attempts(),
                    "Giving up on reconnecting"
                );
                self.set_connection(state);
                self.bus.publish(SessionEvent::ReconnectAbandoned { attempts: self.attempt });
            }
            None => {}
        }
    }

    fn reconnect(&mut self) {
        self.reconnect_at = None;
        tracing::debug!(session_id = %self.session.session_id, attempt = self.attempt, "Reconnecting");
        self.connection = Some(self.manager.open(&self.session.session_id, &self.session.user_id));
        self.set_connection(ConnectionState::Connecting);
    }

    fn set_connection(&mut self, state: ConnectionState) {
        if self.presence.connection() == state {
            return;
        }
        if self.presence.on_connection(state) {
            self.bus.publish(SessionEvent::TypingChanged { typing: false });
        }
        self.bus.publish(SessionEvent::ConnectionChanged { state });
    }

    fn publish_snapshot(&self) {
        self.snapshot.send_replace(SessionSnapshot {
            connection: self.presence.connection(),
            typing: self.presence.typing(),
            entries: self.timeline.entries().to_vec(),
            undelivered: self.timeline.undelivered().clone(),
            history_loaded: self.timeline.is_seeded(),
        });
    }

    fn teardown(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.reconnect_at = None;
        self.presence.on_connection(ConnectionState::Closed);
        self.publish_snapshot();
        tracing::info!(session_id = %self.session.session_id, "Session stopped");
    }
}

async fn next_event(connection: &mut Option<ConnectionHandle>) -> Option<ConnectionEvent> {
    match connection {
        Some(handle) => handle.next_event().await,
        None => pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
