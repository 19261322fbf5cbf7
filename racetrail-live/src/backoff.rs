use std::time::Duration;

/// Delays between reconnect attempts, indexed by consecutive failures. The
/// last entry repeats forever.
pub const DEFAULT_RECONNECT_DELAYS_MS: [u64; 5] = [1_000, 2_000, 5_000, 10_000, 30_000];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectSchedule {
    delays: Vec<Duration>,
    failures: usize,
}

impl ReconnectSchedule {
    /// An empty list falls back to the default delays.
    #[must_use]
    pub fn new(delays: Vec<Duration>) -> Self {
        let delays = if delays.is_empty() {
            DEFAULT_RECONNECT_DELAYS_MS
                .iter()
                .copied()
                .map(Duration::from_millis)
                .collect()
        } else {
            delays
        };
        Self { delays, failures: 0 }
    }

    /// Delay before the next attempt; counts one more failure.
    pub fn next_delay(&mut self) -> Duration {
        let index = self.failures.min(self.delays.len() - 1);
        self.failures = self.failures.saturating_add(1);
        self.delays[index]
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    #[must_use]
    pub const fn failures(&self) -> usize {
        self.failures
    }
}

impl Default for ReconnectSchedule {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
