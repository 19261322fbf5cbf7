//! Replay engine: rescales race IGT onto a fixed-length replay clock and
//! places every participant on the graph at any instant of it.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_LAYER_SPACING, DEFAULT_MAX_TRANSIT_SHARE, DEFAULT_ORBIT_RADIUS, DEFAULT_ORBIT_SPEED,
    DEFAULT_REPLAY_DURATION_MS, DEFAULT_ROW_SPACING, DEFAULT_TRANSIT_REPLAY_MS,
};
use crate::numbers::{ms_to_f64, round_f64_to_ms};

pub mod clock;
pub mod frame;
pub mod leader;
pub mod overlay;
pub mod position;

pub use clock::ReplayClock;
pub use frame::{ReplayFrame, max_igt_of, replay_frame};
pub use leader::leader_of;
pub use overlay::{TimelineHighlight, map_to_timeline};
pub use position::{PlayerSnapshot, ReplayContext, position_of};

/// Errors raised when replay geometry or timing is unusable.
#[derive(Debug, Error, PartialEq)]
pub enum ReplayConfigError {
    #[error("{field} must be greater than {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default = "ReplayConfig::default_duration_ms")]
    pub duration_ms: f64,
    #[serde(default = "ReplayConfig::default_orbit_radius")]
    pub orbit_radius: f64,
    /// Radians per replay second.
    #[serde(default = "ReplayConfig::default_orbit_speed")]
    pub orbit_speed: f64,
    #[serde(default = "ReplayConfig::default_transit_replay_ms")]
    pub transit_replay_ms: f64,
    #[serde(default = "ReplayConfig::default_max_transit_share")]
    pub max_transit_share: f64,
    #[serde(default = "ReplayConfig::default_layer_spacing")]
    pub layer_spacing: f64,
    #[serde(default = "ReplayConfig::default_row_spacing")]
    pub row_spacing: f64,
}

impl ReplayConfig {
    const fn default_duration_ms() -> f64 {
        DEFAULT_REPLAY_DURATION_MS
    }

    const fn default_orbit_radius() -> f64 {
        DEFAULT_ORBIT_RADIUS
    }

    const fn default_orbit_speed() -> f64 {
        DEFAULT_ORBIT_SPEED
    }

    const fn default_transit_replay_ms() -> f64 {
        DEFAULT_TRANSIT_REPLAY_MS
    }

    const fn default_max_transit_share() -> f64 {
        DEFAULT_MAX_TRANSIT_SHARE
    }

    const fn default_layer_spacing() -> f64 {
        DEFAULT_LAYER_SPACING
    }

    const fn default_row_spacing() -> f64 {
        DEFAULT_ROW_SPACING
    }

    /// # Errors
    ///
    /// Returns the first field found out of range.
    pub fn validate(&self) -> Result<(), ReplayConfigError> {
        for (field, value) in [
            ("replay.duration_ms", self.duration_ms),
            ("replay.orbit_radius", self.orbit_radius),
            ("replay.layer_spacing", self.layer_spacing),
            ("replay.row_spacing", self.row_spacing),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ReplayConfigError::MinViolation {
                    field,
                    min: 0.0,
                    value,
                });
            }
        }
        for (field, value, max) in [
            ("replay.orbit_speed", self.orbit_speed, f64::MAX),
            ("replay.transit_replay_ms", self.transit_replay_ms, self.duration_ms),
            ("replay.max_transit_share", self.max_transit_share, 1.0),
        ] {
            if !value.is_finite() || value < 0.0 || value > max {
                return Err(ReplayConfigError::RangeViolation {
                    field,
                    min: 0.0,
                    max,
                    value,
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn map_time(&self, igt_ms: f64, max_igt_ms: f64) -> f64 {
        map_time_with(igt_ms, max_igt_ms, self.duration_ms)
    }

    #[must_use]
    pub fn replay_to_igt(&self, replay_ms: f64, max_igt_ms: u64) -> u64 {
        replay_to_igt_with(replay_ms, max_igt_ms, self.duration_ms)
    }

    /// IGT milliseconds covered by one replay millisecond.
    #[must_use]
    pub fn igt_per_replay_ms(&self, max_igt_ms: u64) -> f64 {
        ms_to_f64(max_igt_ms) / self.duration_ms
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            duration_ms: Self::default_duration_ms(),
            orbit_radius: Self::default_orbit_radius(),
            orbit_speed: Self::default_orbit_speed(),
            transit_replay_ms: Self::default_transit_replay_ms(),
            max_transit_share: Self::default_max_transit_share(),
            layer_spacing: Self::default_layer_spacing(),
            row_spacing: Self::default_row_spacing(),
        }
    }
}

/// Linear IGT to replay-clock rescale over the default replay duration.
#[must_use]
pub fn map_time(igt_ms: f64, max_igt_ms: f64) -> f64 {
    map_time_with(igt_ms, max_igt_ms, DEFAULT_REPLAY_DURATION_MS)
}

/// Linear rescale clamped to `[0, duration_ms]`: non-positive IGT maps to 0,
/// IGT at or past `max_igt_ms` maps to `duration_ms`.
#[must_use]
pub fn map_time_with(igt_ms: f64, max_igt_ms: f64, duration_ms: f64) -> f64 {
    if igt_ms.is_nan() || igt_ms <= 0.0 {
        return 0.0;
    }
    if igt_ms >= max_igt_ms {
        return duration_ms;
    }
    igt_ms / max_igt_ms * duration_ms
}

/// Inverse of [`map_time_with`], rounded to the nearest IGT millisecond.
#[must_use]
pub fn replay_to_igt_with(replay_ms: f64, max_igt_ms: u64, duration_ms: f64) -> u64 {
    if duration_ms <= 0.0 || replay_ms.is_nan() {
        return 0;
    }
    let progress = (replay_ms / duration_ms).clamp(0.0, 1.0);
    round_f64_to_ms(progress * ms_to_f64(max_igt_ms))
}
