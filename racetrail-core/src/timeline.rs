//! Zone timeline builder: turns a sparse zone-entry log into dwell intervals.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::graph::NodeId;
use crate::numbers::interior_point;
use crate::race::ZoneLogEntry;

/// Death instants stored inline for the common case of a handful per zone.
pub type DeathTimestamps = SmallVec<[u64; 4]>;

/// One stay in one zone, in the participant's own IGT clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneVisit {
    pub node_id: NodeId,
    pub enter_igt_ms: u64,
    pub exit_igt_ms: u64,
    pub deaths: u32,
    pub death_timestamps_ms: DeathTimestamps,
    pub is_last: bool,
}

impl ZoneVisit {
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.exit_igt_ms.saturating_sub(self.enter_igt_ms)
    }

    /// Half-open containment `[enter, exit)`.
    #[must_use]
    pub const fn contains(&self, igt_ms: u64) -> bool {
        igt_ms >= self.enter_igt_ms && igt_ms < self.exit_igt_ms
    }
}

/// Spread `deaths` evenly inside `(enter, exit]`: the j-th of k lands at
/// `enter + (exit - enter) * j / (k + 1)`.
///
/// Stamps are pushed forward to stay strictly after `enter` and after each
/// other. When the visit is shorter than `k` milliseconds there is no room
/// for that, and the surplus deaths all land on `exit`.
#[must_use]
pub fn death_timestamps(enter_igt_ms: u64, exit_igt_ms: u64, deaths: u32) -> DeathTimestamps {
    let mut previous = enter_igt_ms;
    (1..=deaths)
        .map(|j| {
            let stamp = interior_point(enter_igt_ms, exit_igt_ms, j, deaths)
                .max(previous.saturating_add(1))
                .min(exit_igt_ms.max(enter_igt_ms));
            previous = stamp;
            stamp
        })
        .collect()
}

/// Build the ordered visit list for one participant.
///
/// An absent or empty log means the participant has not started and yields
/// no visits. Entries are treated as monotonic: an entry whose time is
/// earlier than its predecessor is clamped up to it, and a `total_igt_ms`
/// smaller than the last entry is clamped to that entry, so every visit
/// satisfies `enter <= exit`.
#[must_use]
pub fn build_zone_visits(raw_log: Option<&[ZoneLogEntry]>, total_igt_ms: u64) -> Vec<ZoneVisit> {
    let Some(entries) = raw_log.filter(|entries| !entries.is_empty()) else {
        return Vec::new();
    };

    let mut enters = Vec::with_capacity(entries.len());
    let mut floor = 0u64;
    for entry in entries {
        if entry.igt_ms < floor {
            log::warn!(
                "zone log entry {} at {}ms precedes previous entry at {}ms; clamping",
                entry.node_id,
                entry.igt_ms,
                floor
            );
        }
        floor = floor.max(entry.igt_ms);
        enters.push(floor);
    }

    let last_enter = floor;
    if total_igt_ms < last_enter {
        log::warn!(
            "total igt {total_igt_ms}ms is before the last zone entry at {last_enter}ms; clamping"
        );
    }
    let final_exit = total_igt_ms.max(last_enter);

    let count = entries.len();
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let enter = enters[i];
            let is_last = i + 1 == count;
            let exit = if is_last { final_exit } else { enters[i + 1] };
            let deaths = entry.deaths.unwrap_or(0);
            ZoneVisit {
                node_id: entry.node_id.clone(),
                enter_igt_ms: enter,
                exit_igt_ms: exit,
                deaths,
                death_timestamps_ms: death_timestamps(enter, exit, deaths),
                is_last,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> Vec<ZoneLogEntry> {
        vec![
            ZoneLogEntry::new("start", 0),
            ZoneLogEntry::new("cave", 10_000).with_deaths(4),
            ZoneLogEntry::new("castle", 50_000),
        ]
    }

    #[test]
    fn empty_or_missing_logs_produce_nothing() {
        assert!(build_zone_visits(None, 5_000).is_empty());
        assert!(build_zone_visits(Some(&[][..]), 5_000).is_empty());
    }

    #[test]
    fn visits_chain_and_end_at_total() {
        let visits = build_zone_visits(Some(log().as_slice()), 90_000);
        assert_eq!(visits.len(), 3);
        assert_eq!(visits[0].exit_igt_ms, visits[1].enter_igt_ms);
        assert_eq!(visits[1].exit_igt_ms, visits[2].enter_igt_ms);
        assert_eq!(visits[2].exit_igt_ms, 90_000);
        assert!(visits[2].is_last);
        assert!(!visits[0].is_last && !visits[1].is_last);
    }

    #[test]
    fn deaths_belong_to_the_zone_they_happened_in() {
        let visits = build_zone_visits(Some(log().as_slice()), 90_000);
        assert_eq!(visits[1].deaths, 4);
        assert_eq!(
            visits[1].death_timestamps_ms.as_slice(),
            &[18_000, 26_000, 34_000, 42_000]
        );
        assert_eq!(visits[2].deaths, 0);
        assert!(visits[2].death_timestamps_ms.is_empty());
    }

    #[test]
    fn short_visits_push_colliding_deaths_forward() {
        assert_eq!(death_timestamps(0, 3, 4).as_slice(), &[1, 2, 3, 3]);
        assert_eq!(death_timestamps(10, 13, 2).as_slice(), &[11, 12]);
        assert_eq!(death_timestamps(7, 7, 2).as_slice(), &[7, 7]);
    }

    #[test]
    fn total_before_last_entry_is_clamped() {
        let visits = build_zone_visits(Some(log().as_slice()), 20_000);
        let last = visits.last().unwrap();
        assert_eq!(last.enter_igt_ms, 50_000);
        assert_eq!(last.exit_igt_ms, 50_000);
        assert!(visits.iter().all(|v| v.enter_igt_ms <= v.exit_igt_ms));
    }

    #[test]
    fn out_of_order_entries_are_clamped_forward() {
        let entries = vec![
            ZoneLogEntry::new("start", 0),
            ZoneLogEntry::new("a", 9_000),
            ZoneLogEntry::new("b", 7_000),
        ];
        let visits = build_zone_visits(Some(entries.as_slice()), 12_000);
        assert_eq!(visits[2].enter_igt_ms, 9_000);
        assert_eq!(visits[1].duration_ms(), 0);
    }

    #[test]
    fn contains_is_half_open() {
        let visits = build_zone_visits(Some(log().as_slice()), 90_000);
        assert!(visits[1].contains(10_000));
        assert!(!visits[1].contains(50_000));
    }
}
