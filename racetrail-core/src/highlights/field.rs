//! Field-wide patterns: close finishes and runners pacing each other.
use super::dwell::DwellTable;
use super::{Highlight, HighlightConfig, HighlightKind, Segment};
use crate::numbers::{count_to_f64, ms_to_f64};
use crate::participant::ReplayParticipant;

pub(super) fn photo_finish(
    participants: &[ReplayParticipant],
    config: &HighlightConfig,
) -> Option<Highlight> {
    let mut finishers: Vec<(u64, usize)> = participants
        .iter()
        .enumerate()
        .filter(|(_, p)| p.finished)
        .map(|(i, p)| (p.total_igt_ms, i))
        .collect();
    finishers.sort_unstable();

    let (gap, ahead, behind) = finishers
        .windows(2)
        .map(|pair| (pair[1].0 - pair[0].0, pair[0].1, pair[1].1))
        .min_by_key(|(gap, ahead, _)| (*gap, *ahead))?;
    if gap > config.photo_finish_gap_ms {
        return None;
    }

    let ahead = participants[ahead].id.clone();
    let behind = participants[behind].id.clone();
    let threshold = ms_to_f64(config.photo_finish_gap_ms).max(1.0);
    Some(Highlight::new(
        HighlightKind::PhotoFinish,
        vec![
            Segment::Player(ahead.clone()),
            Segment::text(" edged out "),
            Segment::Player(behind.clone()),
            Segment::text(" by "),
            Segment::Duration(gap),
        ],
        [ahead, behind],
        None,
        1.0 + (threshold - ms_to_f64(gap)) / threshold,
    ))
}

/// Pairs whose per-zone dwell vectors stay within tolerance of each other.
pub(super) fn rivals(
    participants: &[ReplayParticipant],
    table: &DwellTable,
    config: &HighlightConfig,
) -> Vec<Highlight> {
    let mut found = Vec::new();
    for (i, left) in table.by_participant.iter().enumerate() {
        for (j, right) in table.by_participant.iter().enumerate().skip(i + 1) {
            let diffs: Vec<f64> = left
                .iter()
                .filter_map(|(node, &a)| right.get(node).map(|&b| relative_diff(a, b)))
                .collect();
            if diffs.len() < config.rival_min_shared_zones {
                continue;
            }
            let shared = count_to_f64(diffs.len());
            let mean_diff = diffs.iter().sum::<f64>() / shared;
            if mean_diff > config.rival_tolerance {
                continue;
            }
            let first = participants[i].id.clone();
            let second = participants[j].id.clone();
            let shared_zones = u32::try_from(diffs.len()).unwrap_or(u32::MAX);
            found.push(Highlight::new(
                HighlightKind::Rivals,
                vec![
                    Segment::Player(first.clone()),
                    Segment::text(" and "),
                    Segment::Player(second.clone()),
                    Segment::text(" matched pace across "),
                    Segment::Count(shared_zones),
                    Segment::text(" zones"),
                ],
                [first, second],
                None,
                shared * (1.0 - mean_diff / config.rival_tolerance.max(f64::EPSILON)),
            ));
        }
    }
    found
}

fn relative_diff(a: u64, b: u64) -> f64 {
    let larger = a.max(b);
    if larger == 0 {
        return 0.0;
    }
    ms_to_f64(a.abs_diff(b)) / ms_to_f64(larger)
}
