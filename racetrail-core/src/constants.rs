//! Centralized tuning constants for racetrail replay and highlight math.
//!
//! Highlight thresholds and replay geometry are exposed through the config
//! structs; the values here are their defaults, kept together so they can
//! only be adjusted through reviewed code changes.

// Logging ------------------------------------------------------------------
pub const DEBUG_ENV_VAR: &str = "RACETRAIL_DEBUG_LOGS";

// Replay clock -------------------------------------------------------------
/// Length of the synthetic replay timeline, in replay milliseconds.
pub const DEFAULT_REPLAY_DURATION_MS: f64 = 60_000.0;
/// Radius of the idle orbit around a node center, in layout units.
pub const DEFAULT_ORBIT_RADIUS: f64 = 12.0;
/// Angular speed of the idle orbit, in radians per replay second.
pub const DEFAULT_ORBIT_SPEED: f64 = 2.4;
/// Replay time spent travelling along an edge between two nodes.
pub const DEFAULT_TRANSIT_REPLAY_MS: f64 = 600.0;
/// Transit never eats more than this share of a zone visit.
pub const DEFAULT_MAX_TRANSIT_SHARE: f64 = 0.5;

// Layout -------------------------------------------------------------------
pub const DEFAULT_LAYER_SPACING: f64 = 120.0;
pub const DEFAULT_ROW_SPACING: f64 = 80.0;

// Highlights ---------------------------------------------------------------
pub const DEFAULT_FAST_RATIO: f64 = 0.5;
pub const DEFAULT_SLOW_RATIO: f64 = 3.0;
pub const DEFAULT_MIN_SPEED_GAP_MS: u64 = 15_000;
pub const DEFAULT_MIN_WALL_GAP_MS: u64 = 60_000;
pub const DEFAULT_MIN_Z_SCORE: f64 = 1.0;
pub const DEFAULT_TIER_WEIGHT: f64 = 0.5;
pub const DEFAULT_PHOTO_FINISH_GAP_MS: u64 = 5_000;
pub const DEFAULT_RIVAL_MIN_SHARED_ZONES: usize = 4;
pub const DEFAULT_RIVAL_TOLERANCE: f64 = 0.12;
pub const DEFAULT_DEATH_MAGNET_MIN: u32 = 5;
pub const DEFAULT_DEATH_MAGNET_RATIO: f64 = 2.0;
pub const DEFAULT_MAX_PER_CATEGORY: usize = 2;

// Participant colors -------------------------------------------------------
pub const PLAYER_PALETTE: [&str; 8] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
];

/// Verbose diagnostics: debug builds with `RACETRAIL_DEBUG_LOGS` set to anything but `0`.
#[cfg(debug_assertions)]
#[must_use]
pub fn debug_log_enabled() -> bool {
    matches!(std::env::var(DEBUG_ENV_VAR), Ok(val) if val != "0")
}

#[cfg(not(debug_assertions))]
#[must_use]
pub const fn debug_log_enabled() -> bool {
    false
}
