//! Racetrail Live
//!
//! Live synchronization for racetrail spectators: the per-race wire
//! protocol, a sans-IO connection state machine with reconnect policy, the
//! race state store and a tokio WebSocket driver. Re-exports the core crate
//! so views only need one dependency.

pub mod backoff;
pub mod channel;
pub mod error;
pub mod protocol;
pub mod store;
pub mod target;
pub mod ws;

pub use racetrail_core;

pub use backoff::{DEFAULT_RECONNECT_DELAYS_MS, ReconnectSchedule};
pub use channel::{
    ChannelConfig, ChannelConfigError, ChannelHandlers, ChannelState, ConnectionId, Connector,
    LiveChannel, Transport, TransportEvent,
};
pub use error::TransportError;
pub use protocol::{
    ClientMessage, FrameError, Inbound, LeaderboardUpdate, PlayerUpdate, RaceSnapshot,
    ServerMessage, SpectatorCount, StatusChange, classify,
};
pub use store::{LiveRaceState, LiveRaceStore, StateChange, SubscriptionId};
pub use target::{ChannelTarget, TargetError};
pub use ws::{LiveSession, SessionHandle};
