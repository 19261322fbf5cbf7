use serde::{Deserialize, Serialize};

/// Playback cursor over a replay of fixed length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayClock {
    duration_ms: f64,
    position_ms: f64,
    speed: f64,
    playing: bool,
}

impl ReplayClock {
    #[must_use]
    pub const fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            position_ms: 0.0,
            speed: 1.0,
            playing: false,
        }
    }

    #[must_use]
    pub const fn position_ms(&self) -> f64 {
        self.position_ms
    }

    #[must_use]
    pub const fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.position_ms >= self.duration_ms
    }

    /// Fraction of the replay already played, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.position_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Start playing; a finished replay restarts from the beginning.
    pub fn play(&mut self) {
        if self.is_finished() {
            self.position_ms = 0.0;
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek(&mut self, position_ms: f64) {
        self.position_ms = if position_ms.is_nan() {
            0.0
        } else {
            position_ms.clamp(0.0, self.duration_ms)
        };
    }

    /// Non-positive or non-finite speeds are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        }
    }

    /// Advance by `elapsed_ms` of wall time and return the new position.
    /// Playback stops on its own at the end.
    pub fn tick(&mut self, elapsed_ms: f64) -> f64 {
        if self.playing && elapsed_ms > 0.0 {
            self.seek(self.position_ms + elapsed_ms * self.speed);
            if self.is_finished() {
                self.playing = false;
            }
        }
        self.position_ms
    }
}
