//! Connection state machine for one race channel.
//!
//! The channel performs no I/O itself. A [`Connector`] opens transports, the
//! owner feeds back what happens on them as [`TransportEvent`]s tagged with
//! the [`ConnectionId`] they belong to, and drives timers through
//! [`LiveChannel::next_deadline`] and [`LiveChannel::poll_timers`].
//!
//! Every connection attempt gets a fresh id. Tearing a connection down forgets
//! its id before the transport is released, so anything a dying transport
//! still reports is ignored and can never trigger a second reconnect.
use racetrail_core::debug_log_enabled;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

use crate::backoff::{DEFAULT_RECONNECT_DELAYS_MS, ReconnectSchedule};
use crate::error::TransportError;
use crate::protocol::{
    ClientMessage, Inbound, LeaderboardUpdate, PlayerUpdate, RaceSnapshot, ServerMessage,
    SpectatorCount, StatusChange, classify,
};
use crate::target::ChannelTarget;

pub const DEFAULT_STALE_AFTER_MS: u64 = 90_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outbound half of one open (or opening) connection.
pub trait Transport {
    /// Queue a text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection can no longer carry frames.
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Release the connection. Must not report anything back synchronously.
    fn close(&mut self);
}

/// Starts connection attempts.
pub trait Connector {
    type Transport: Transport;

    /// Begin connecting to `url`. Success means the attempt is underway; the
    /// outcome arrives later as a [`TransportEvent`] tagged with `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt could not even be started.
    fn open(&mut self, id: ConnectionId, url: &Url) -> Result<Self::Transport, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Frame(String),
    Closed { code: Option<u16>, reason: String },
    Failed(TransportError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelConfigError {
    #[error("reconnect_delays_ms must list at least one delay")]
    EmptyReconnectDelays,
    #[error("reconnect delays must be positive (entry {index} is 0)")]
    ZeroReconnectDelay { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "ChannelConfig::default_reconnect_delays_ms")]
    pub reconnect_delays_ms: Vec<u64>,
    /// Close an open connection that has been silent this long; 0 disables.
    #[serde(default = "ChannelConfig::default_stale_after_ms")]
    pub stale_after_ms: u64,
}

impl ChannelConfig {
    fn default_reconnect_delays_ms() -> Vec<u64> {
        DEFAULT_RECONNECT_DELAYS_MS.to_vec()
    }

    const fn default_stale_after_ms() -> u64 {
        DEFAULT_STALE_AFTER_MS
    }

    /// # Errors
    ///
    /// Returns an error if the delay list is empty or holds a zero.
    pub fn validate(&self) -> Result<(), ChannelConfigError> {
        if self.reconnect_delays_ms.is_empty() {
            return Err(ChannelConfigError::EmptyReconnectDelays);
        }
        if let Some(index) = self.reconnect_delays_ms.iter().position(|&ms| ms == 0) {
            return Err(ChannelConfigError::ZeroReconnectDelay { index });
        }
        Ok(())
    }

    #[must_use]
    pub fn reconnect_delays(&self) -> Vec<Duration> {
        self.reconnect_delays_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }

    #[must_use]
    pub const fn stale_after(&self) -> Option<Duration> {
        if self.stale_after_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.stale_after_ms))
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reconnect_delays_ms: Self::default_reconnect_delays_ms(),
            stale_after_ms: Self::default_stale_after_ms(),
        }
    }
}

type Handler<T> = Option<Box<dyn FnMut(T) + Send>>;

/// Callbacks registered per message kind. Unset handlers drop their messages.
#[derive(Default)]
pub struct ChannelHandlers {
    race_state: Handler<RaceSnapshot>,
    leaderboard_update: Handler<LeaderboardUpdate>,
    player_update: Handler<PlayerUpdate>,
    race_status_change: Handler<StatusChange>,
    spectator_count: Handler<SpectatorCount>,
    message: Handler<&'static str>,
    connected: Option<Box<dyn FnMut() + Send>>,
    disconnected: Option<Box<dyn FnMut() + Send>>,
    error: Option<Box<dyn FnMut(&TransportError) + Send>>,
}

impl ChannelHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_race_state(mut self, f: impl FnMut(RaceSnapshot) + Send + 'static) -> Self {
        self.race_state = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_leaderboard_update(
        mut self,
        f: impl FnMut(LeaderboardUpdate) + Send + 'static,
    ) -> Self {
        self.leaderboard_update = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_player_update(mut self, f: impl FnMut(PlayerUpdate) + Send + 'static) -> Self {
        self.player_update = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_race_status_change(mut self, f: impl FnMut(StatusChange) + Send + 'static) -> Self {
        self.race_status_change = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_spectator_count(mut self, f: impl FnMut(SpectatorCount) + Send + 'static) -> Self {
        self.spectator_count = Some(Box::new(f));
        self
    }

    /// Called with the kind of every dispatched message, before its handler.
    #[must_use]
    pub fn on_message(mut self, f: impl FnMut(&'static str) + Send + 'static) -> Self {
        self.message = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_connected(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.connected = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_disconnected(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.disconnected = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_error(mut self, f: impl FnMut(&TransportError) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    fn dispatch(&mut self, message: ServerMessage) {
        if let Some(f) = self.message.as_mut() {
            f(message.kind());
        }
        match message {
            ServerMessage::RaceState(m) => call(&mut self.race_state, m),
            ServerMessage::LeaderboardUpdate(m) => call(&mut self.leaderboard_update, m),
            ServerMessage::PlayerUpdate(m) => call(&mut self.player_update, m),
            ServerMessage::RaceStatusChange(m) => call(&mut self.race_status_change, m),
            ServerMessage::SpectatorCount(m) => call(&mut self.spectator_count, m),
        }
    }

    fn connected(&mut self) {
        if let Some(f) = self.connected.as_mut() {
            f();
        }
    }

    fn disconnected(&mut self) {
        if let Some(f) = self.disconnected.as_mut() {
            f();
        }
    }

    fn error(&mut self, error: &TransportError) {
        if let Some(f) = self.error.as_mut() {
            f(error);
        }
    }
}

fn call<T>(handler: &mut Handler<T>, value: T) {
    if let Some(f) = handler.as_mut() {
        f(value);
    }
}

impl fmt::Debug for ChannelHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHandlers")
            .field("race_state", &self.race_state.is_some())
            .field("leaderboard_update", &self.leaderboard_update.is_some())
            .field("player_update", &self.player_update.is_some())
            .field("race_status_change", &self.race_status_change.is_some())
            .field("spectator_count", &self.spectator_count.is_some())
            .finish_non_exhaustive()
    }
}

/// Resilient connection to one race channel.
pub struct LiveChannel<C: Connector> {
    connector: C,
    handlers: ChannelHandlers,
    schedule: ReconnectSchedule,
    stale_after: Option<Duration>,
    target: Option<ChannelTarget>,
    auth_token: Option<String>,
    state: ChannelState,
    active: Option<(ConnectionId, C::Transport)>,
    next_id: u64,
    reconnect_at: Option<Instant>,
    last_frame_at: Option<Instant>,
}

impl<C: Connector> LiveChannel<C> {
    #[must_use]
    pub fn new(connector: C, config: &ChannelConfig, handlers: ChannelHandlers) -> Self {
        Self {
            connector,
            handlers,
            schedule: ReconnectSchedule::new(config.reconnect_delays()),
            stale_after: config.stale_after(),
            target: None,
            auth_token: None,
            state: ChannelState::Idle,
            active: None,
            next_id: 0,
            reconnect_at: None,
            last_frame_at: None,
        }
    }

    /// Open a connection unless one is already open or opening.
    pub fn connect(&mut self, target: ChannelTarget, auth_token: Option<String>, now: Instant) {
        if self.active.is_some() {
            log::debug!("connect ignored: {target} already has an active connection");
            return;
        }
        self.target = Some(target);
        self.auth_token = auth_token.filter(|token| !token.is_empty());
        self.reconnect_at = None;
        self.open(now);
    }

    /// Close for good: cancels any pending reconnect and releases the
    /// transport without firing further callbacks. Idempotent.
    pub fn disconnect(&mut self) {
        self.target = None;
        self.reconnect_at = None;
        self.last_frame_at = None;
        if let Some((id, mut transport)) = self.active.take() {
            log::info!("disconnecting connection {id}");
            transport.close();
        }
        if self.state != ChannelState::Idle {
            self.state = ChannelState::Closed;
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ChannelState::Open
    }

    #[must_use]
    pub const fn state(&self) -> ChannelState {
        self.state
    }

    /// Id of the live connection attempt, if any.
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.active.as_ref().map(|(id, _)| *id)
    }

    #[must_use]
    pub const fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    #[must_use]
    pub const fn failures(&self) -> usize {
        self.schedule.failures()
    }

    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Earliest instant at which [`Self::poll_timers`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        let stale = match (self.state, self.stale_after, self.last_frame_at) {
            (ChannelState::Open, Some(after), Some(last)) => Some(last + after),
            _ => None,
        };
        match (self.reconnect_at, stale) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire due timers: the pending reconnect and the stale-connection watchdog.
    pub fn poll_timers(&mut self, now: Instant) {
        if self.reconnect_at.is_some_and(|at| at <= now) {
            self.reconnect_at = None;
            self.open(now);
            return;
        }
        if let (ChannelState::Open, Some(after), Some(last)) =
            (self.state, self.stale_after, self.last_frame_at)
            && now.duration_since(last) >= after
        {
            log::warn!("no frame for {after:?}; dropping connection");
            self.handlers.error(&TransportError::Stale(after));
            self.fail(now);
        }
    }

    /// Feed one event from connection `id`. Events from anything but the
    /// active connection are ignored.
    pub fn handle_event(&mut self, id: ConnectionId, event: TransportEvent, now: Instant) {
        if self.connection_id() != Some(id) {
            log::debug!("ignoring event from stale connection {id}");
            return;
        }
        match event {
            TransportEvent::Opened => self.opened(now),
            TransportEvent::Frame(text) => {
                self.last_frame_at = Some(now);
                self.frame(&text);
            }
            TransportEvent::Closed { code, reason } => {
                log::info!("connection {id} closed (code {code:?}): {reason}");
                self.fail(now);
            }
            TransportEvent::Failed(error) => {
                log::warn!("connection {id} failed: {error}");
                self.handlers.error(&error);
                self.fail(now);
            }
        }
    }

    fn open(&mut self, now: Instant) {
        let Some(url) = self.target.as_ref().map(|t| t.url().clone()) else {
            return;
        };
        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        self.state = ChannelState::Connecting;
        log::info!("opening connection {id} to {url}");
        match self.connector.open(id, &url) {
            Ok(transport) => self.active = Some((id, transport)),
            Err(error) => {
                log::warn!("connection {id} could not start: {error}");
                self.handlers.error(&error);
                self.state = ChannelState::Closed;
                self.schedule_reconnect(now);
            }
        }
    }

    fn opened(&mut self, now: Instant) {
        // Still Connecting here, so a failed auth never reports a disconnect.
        if let Some(token) = self.auth_token.clone()
            && let Err(error) = self.send(&ClientMessage::Auth { token })
        {
            self.handlers.error(&error);
            self.fail(now);
            return;
        }
        self.state = ChannelState::Open;
        self.schedule.reset();
        self.last_frame_at = Some(now);
        self.handlers.connected();
    }

    fn frame(&mut self, text: &str) {
        match classify(text) {
            Ok(Inbound::Ping) => {
                if let Err(error) = self.send(&ClientMessage::Pong) {
                    log::warn!("failed to answer ping: {error}");
                }
            }
            Ok(Inbound::Message(message)) => self.handlers.dispatch(*message),
            Err(error) if error.is_malformed() => log::warn!("dropping frame: {error}"),
            Err(error) => {
                if debug_log_enabled() {
                    log::debug!("dropping frame: {error}");
                }
            }
        }
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        let text = message
            .to_json()
            .map_err(|err| TransportError::Send(err.to_string()))?;
        match self.active.as_mut() {
            Some((_, transport)) => transport.send_text(text),
            None => Err(TransportError::Send("no active connection".to_string())),
        }
    }

    /// Drop the active connection as a failure and apply the reconnect policy.
    fn fail(&mut self, now: Instant) {
        let was_open = self.state == ChannelState::Open;
        if let Some((_, mut transport)) = self.active.take() {
            transport.close();
        }
        self.state = ChannelState::Closed;
        self.last_frame_at = None;
        if was_open {
            self.handlers.disconnected();
        }
        self.schedule_reconnect(now);
    }

    fn schedule_reconnect(&mut self, now: Instant) {
        if self.target.is_none() {
            return;
        }
        let delay = self.schedule.next_delay();
        log::info!("reconnecting in {delay:?} (attempt {})", self.schedule.failures());
        self.reconnect_at = Some(now + delay);
    }
}

impl<C: Connector> fmt::Debug for LiveChannel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveChannel")
            .field("state", &self.state)
            .field("connection", &self.connection_id())
            .field("target", &self.target)
            .field("reconnect_at", &self.reconnect_at)
            .field("failures", &self.schedule.failures())
            .finish_non_exhaustive()
    }
}
