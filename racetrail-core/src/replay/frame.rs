//! One rendered instant of the replay: every participant placed plus the leader.
use serde::{Deserialize, Serialize};

use super::position::locate;
use super::{PlayerSnapshot, ReplayContext, leader_of};
use crate::participant::ReplayParticipant;
use crate::race::ParticipantId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub replay_ms: f64,
    pub igt_ms: u64,
    /// Ordered by arrival at the current node, earliest first.
    pub snapshots: Vec<PlayerSnapshot>,
    pub leader: Option<ParticipantId>,
}

/// Longest total IGT among `participants`; the span the replay clock covers.
#[must_use]
pub fn max_igt_of(participants: &[ReplayParticipant]) -> u64 {
    participants
        .iter()
        .map(|p| p.total_igt_ms)
        .max()
        .unwrap_or(0)
}

#[must_use]
pub fn replay_frame(
    participants: &[ReplayParticipant],
    replay_clock_ms: f64,
    ctx: &ReplayContext<'_>,
) -> ReplayFrame {
    let mut placed: Vec<(PlayerSnapshot, u64)> = participants
        .iter()
        .filter_map(|p| locate(p, replay_clock_ms, ctx))
        .collect();
    // Leader ties go to the earliest arrival.
    placed.sort_by_key(|(_, arrived)| *arrived);
    let snapshots: Vec<PlayerSnapshot> = placed.into_iter().map(|(s, _)| s).collect();
    let leader = leader_of(&snapshots);
    ReplayFrame {
        replay_ms: replay_clock_ms,
        igt_ms: ctx.config.replay_to_igt(replay_clock_ms, ctx.max_igt_ms),
        snapshots,
        leader,
    }
}
