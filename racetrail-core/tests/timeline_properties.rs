use racetrail_core::{ZoneLogEntry, build_zone_visits, death_timestamps};

fn log(times: &[u64]) -> Vec<ZoneLogEntry> {
    times
        .iter()
        .enumerate()
        .map(|(i, t)| ZoneLogEntry::new(&format!("n{i}"), *t))
        .collect()
}

#[test]
fn visits_chain_and_end_at_total() {
    for (times, total) in [
        (vec![0], 0),
        (vec![0], 5_000),
        (vec![0, 10, 10, 400], 9_999),
        (vec![500, 1_000, 60_000, 61_000, 3_600_000], 3_700_000),
    ] {
        let entries = log(&times);
        let visits = build_zone_visits(Some(entries.as_slice()), total);
        assert_eq!(visits.len(), times.len());
        for (i, visit) in visits.iter().enumerate() {
            assert_eq!(visit.enter_igt_ms, times[i]);
            assert!(visit.enter_igt_ms <= visit.exit_igt_ms);
            assert_eq!(visit.is_last, i + 1 == visits.len());
        }
        for pair in visits.windows(2) {
            assert_eq!(pair[0].exit_igt_ms, pair[1].enter_igt_ms);
        }
        assert_eq!(visits.last().unwrap().exit_igt_ms, total);
    }
}

#[test]
fn death_timestamps_are_strictly_interior_and_ordered() {
    for (enter, exit, deaths) in [
        (0, 100, 1),
        (1_000, 9_000, 7),
        (5, 5_000_000, 30),
        (0, 5, 4),
        (200, 204, 3),
    ] {
        let stamps = death_timestamps(enter, exit, deaths);
        assert_eq!(stamps.len(), deaths as usize);
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
        assert!(stamps.iter().all(|&t| t > enter && t <= exit));
    }
}

#[test]
fn death_timestamps_in_a_too_short_visit_stay_inside_it() {
    let stamps = death_timestamps(0, 3, 4);
    assert_eq!(stamps.len(), 4);
    assert!(stamps.iter().all(|&t| t > 0 && t <= 3));
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}
