//! Racetrail Core
//!
//! Platform-agnostic race analytics for racetrail spectators: progression
//! graphs, zone timelines, highlight detection and the replay interpolator.
//! This crate performs no I/O beyond reading config files and has no network
//! or rendering dependencies.

pub mod analysis;
pub mod config;
pub mod constants;
pub mod graph;
pub mod highlights;
pub mod layout;
pub mod numbers;
pub mod participant;
pub mod race;
pub mod replay;
pub mod timeline;

// Re-export commonly used types
pub use analysis::RaceAnalysis;
pub use config::{AnalysisConfig, ConfigError};
pub use constants::debug_log_enabled;
pub use graph::{Edge, GraphError, NodeId, NodeInfo, NodeKind, ProgressionGraph};
pub use highlights::{
    Highlight, HighlightCategory, HighlightConfig, HighlightConfigError, HighlightKind, Segment,
    detect_highlights, format_duration,
};
pub use layout::{NodePositions, Point, layered_positions};
pub use participant::{
    ReplayParticipant, ReplayRoster, build_replay_participant, build_replay_participants,
    color_for,
};
pub use race::{
    ParticipantId, ParticipantStatus, RaceInfo, RaceStatus, SeedInfo, WsParticipant, ZoneLogEntry,
};
pub use replay::{
    PlayerSnapshot, ReplayClock, ReplayConfig, ReplayConfigError, ReplayContext, ReplayFrame,
    TimelineHighlight, leader_of, map_time, map_time_with, map_to_timeline, max_igt_of,
    position_of, replay_frame,
};
pub use timeline::{ZoneVisit, build_zone_visits, death_timestamps};
