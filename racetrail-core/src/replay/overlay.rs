//! Anchors highlights on the race timeline so a replay can surface each one
//! when its moment comes up.
use serde::{Deserialize, Serialize};

use super::ReplayConfig;
use crate::highlights::Highlight;
use crate::numbers::ms_to_f64;
use crate::participant::ReplayParticipant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineHighlight {
    pub highlight: Highlight,
    pub igt_ms: u64,
}

impl TimelineHighlight {
    #[must_use]
    pub fn replay_ms(&self, max_igt_ms: u64, config: &ReplayConfig) -> f64 {
        config.map_time(ms_to_f64(self.igt_ms), ms_to_f64(max_igt_ms))
    }
}

/// Attach an IGT instant to every highlight, keeping input order.
///
/// Finish highlights land on the latest total among the players involved.
/// Zone highlights land on the latest exit of the involved players from that
/// zone. Anything else sits at half of the longest involved total, or half of
/// the longest total in the field when no participant is named.
#[must_use]
pub fn map_to_timeline(
    highlights: &[Highlight],
    participants: &[ReplayParticipant],
) -> Vec<TimelineHighlight> {
    let field_longest = participants.iter().map(|p| p.total_igt_ms).max().unwrap_or(0);

    highlights
        .iter()
        .map(|highlight| {
            let involved = || {
                participants
                    .iter()
                    .filter(|p| highlight.player_ids.contains(&p.id))
            };
            let anchor = if highlight.kind.is_finish() {
                involved().map(|p| p.total_igt_ms).max()
            } else if let Some(node) = &highlight.node_id {
                involved()
                    .flat_map(|p| p.zone_visits.iter())
                    .filter(|visit| &visit.node_id == node)
                    .map(|visit| visit.exit_igt_ms)
                    .max()
            } else {
                None
            };
            let midpoint = || involved().map(|p| p.total_igt_ms).max().unwrap_or(field_longest) / 2;
            TimelineHighlight {
                highlight: highlight.clone(),
                igt_ms: anchor.unwrap_or_else(midpoint),
            }
        })
        .collect()
}
