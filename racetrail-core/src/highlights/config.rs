//! Thresholds and weights that decide what counts as a highlight.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_DEATH_MAGNET_MIN, DEFAULT_DEATH_MAGNET_RATIO, DEFAULT_FAST_RATIO,
    DEFAULT_MAX_PER_CATEGORY, DEFAULT_MIN_SPEED_GAP_MS, DEFAULT_MIN_WALL_GAP_MS,
    DEFAULT_MIN_Z_SCORE, DEFAULT_PHOTO_FINISH_GAP_MS, DEFAULT_RIVAL_MIN_SHARED_ZONES,
    DEFAULT_RIVAL_TOLERANCE, DEFAULT_SLOW_RATIO, DEFAULT_TIER_WEIGHT,
};
use crate::numbers::count_to_u64;

/// Errors raised when highlight thresholds are out of range.
#[derive(Debug, Error, PartialEq)]
pub enum HighlightConfigError {
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must be at least {min} (got {value})")]
    CountViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
}

/// Empirical thresholds and weights for highlight detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// A clear at or below this share of the others' mean dwell is fast.
    #[serde(default = "HighlightConfig::default_fast_ratio")]
    pub fast_ratio: f64,
    /// A clear at or above this multiple of the others' mean dwell is a wall.
    #[serde(default = "HighlightConfig::default_slow_ratio")]
    pub slow_ratio: f64,
    #[serde(default = "HighlightConfig::default_min_speed_gap_ms")]
    pub min_speed_gap_ms: u64,
    #[serde(default = "HighlightConfig::default_min_wall_gap_ms")]
    pub min_wall_gap_ms: u64,
    /// Applied only when at least two other samples with non-zero spread exist.
    #[serde(default = "HighlightConfig::default_min_z_score")]
    pub min_z_score: f64,
    /// Score multiplier per tier above 1.
    #[serde(default = "HighlightConfig::default_tier_weight")]
    pub tier_weight: f64,
    #[serde(default = "HighlightConfig::default_photo_finish_gap_ms")]
    pub photo_finish_gap_ms: u64,
    #[serde(default = "HighlightConfig::default_rival_min_shared_zones")]
    pub rival_min_shared_zones: usize,
    /// Mean relative dwell difference under which two runners count as rivals.
    #[serde(default = "HighlightConfig::default_rival_tolerance")]
    pub rival_tolerance: f64,
    #[serde(default = "HighlightConfig::default_death_magnet_min")]
    pub death_magnet_min: u32,
    #[serde(default = "HighlightConfig::default_death_magnet_ratio")]
    pub death_magnet_ratio: f64,
    #[serde(default = "HighlightConfig::default_max_per_category")]
    pub max_per_category: usize,
}

impl HighlightConfig {
    const fn default_fast_ratio() -> f64 {
        DEFAULT_FAST_RATIO
    }

    const fn default_slow_ratio() -> f64 {
        DEFAULT_SLOW_RATIO
    }

    const fn default_min_speed_gap_ms() -> u64 {
        DEFAULT_MIN_SPEED_GAP_MS
    }

    const fn default_min_wall_gap_ms() -> u64 {
        DEFAULT_MIN_WALL_GAP_MS
    }

    const fn default_min_z_score() -> f64 {
        DEFAULT_MIN_Z_SCORE
    }

    const fn default_tier_weight() -> f64 {
        DEFAULT_TIER_WEIGHT
    }

    const fn default_photo_finish_gap_ms() -> u64 {
        DEFAULT_PHOTO_FINISH_GAP_MS
    }

    const fn default_rival_min_shared_zones() -> usize {
        DEFAULT_RIVAL_MIN_SHARED_ZONES
    }

    const fn default_rival_tolerance() -> f64 {
        DEFAULT_RIVAL_TOLERANCE
    }

    const fn default_death_magnet_min() -> u32 {
        DEFAULT_DEATH_MAGNET_MIN
    }

    const fn default_death_magnet_ratio() -> f64 {
        DEFAULT_DEATH_MAGNET_RATIO
    }

    const fn default_max_per_category() -> usize {
        DEFAULT_MAX_PER_CATEGORY
    }

    /// Score multiplier for a node of the given tier.
    #[must_use]
    pub fn tier_factor(&self, tier: u32) -> f64 {
        1.0 + self.tier_weight * f64::from(tier.saturating_sub(1))
    }

    /// Check every threshold is usable.
    ///
    /// # Errors
    ///
    /// Returns the first threshold found out of range.
    pub fn validate(&self) -> Result<(), HighlightConfigError> {
        check_range("highlights.fast_ratio", self.fast_ratio, 0.0, 1.0)?;
        check_range("highlights.slow_ratio", self.slow_ratio, 1.0, f64::MAX)?;
        check_range("highlights.min_z_score", self.min_z_score, 0.0, f64::MAX)?;
        check_range("highlights.tier_weight", self.tier_weight, 0.0, f64::MAX)?;
        check_range("highlights.rival_tolerance", self.rival_tolerance, 0.0, 1.0)?;
        check_range(
            "highlights.death_magnet_ratio",
            self.death_magnet_ratio,
            1.0,
            f64::MAX,
        )?;
        check_count(
            "highlights.rival_min_shared_zones",
            count_to_u64(self.rival_min_shared_zones),
        )?;
        check_count(
            "highlights.death_magnet_min",
            u64::from(self.death_magnet_min),
        )?;
        check_count(
            "highlights.max_per_category",
            count_to_u64(self.max_per_category),
        )?;
        Ok(())
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), HighlightConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(HighlightConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

fn check_count(field: &'static str, value: u64) -> Result<(), HighlightConfigError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(HighlightConfigError::CountViolation {
            field,
            min: 1,
            value,
        })
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            fast_ratio: Self::default_fast_ratio(),
            slow_ratio: Self::default_slow_ratio(),
            min_speed_gap_ms: Self::default_min_speed_gap_ms(),
            min_wall_gap_ms: Self::default_min_wall_gap_ms(),
            min_z_score: Self::default_min_z_score(),
            tier_weight: Self::default_tier_weight(),
            photo_finish_gap_ms: Self::default_photo_finish_gap_ms(),
            rival_min_shared_zones: Self::default_rival_min_shared_zones(),
            rival_tolerance: Self::default_rival_tolerance(),
            death_magnet_min: Self::default_death_magnet_min(),
            death_magnet_ratio: Self::default_death_magnet_ratio(),
            max_per_category: Self::default_max_per_category(),
        }
    }
}
