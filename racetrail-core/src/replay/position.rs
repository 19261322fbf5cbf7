//! Where a participant is drawn at a given replay instant.
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use twox_hash::XxHash64;

use super::ReplayConfig;
use crate::graph::{NodeId, ProgressionGraph};
use crate::layout::{NodePositions, Point};
use crate::numbers::{ms_to_f64, round_f64_to_ms};
use crate::participant::ReplayParticipant;
use crate::race::ParticipantId;
use crate::timeline::ZoneVisit;

const PHASE_BUCKETS: u64 = 3_600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub participant_id: ParticipantId,
    pub x: f64,
    pub y: f64,
    pub current_node_id: NodeId,
    pub in_transit: bool,
    pub layer: u32,
    /// Abandoned and past their last recorded instant.
    pub frozen: bool,
}

impl PlayerSnapshot {
    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Shared inputs for placing every participant of one race.
#[derive(Debug, Clone, Copy)]
pub struct ReplayContext<'a> {
    /// Longest total IGT in the field; the replay clock spans exactly this.
    pub max_igt_ms: u64,
    pub positions: &'a NodePositions,
    pub graph: &'a ProgressionGraph,
    /// Layer reported for nodes the graph does not know.
    pub origin_layer: u32,
    pub config: &'a ReplayConfig,
}

impl ReplayContext<'_> {
    fn igt_at(&self, replay_clock_ms: f64) -> u64 {
        self.config.replay_to_igt(replay_clock_ms, self.max_igt_ms)
    }

    fn layer_of(&self, node: &str) -> u32 {
        self.graph.layer_of(node).unwrap_or(self.origin_layer)
    }

    fn center_of(&self, node: &str) -> Option<Point> {
        let center = self.positions.get(node).copied();
        if center.is_none() {
            log::debug!("no layout position for node {node}");
        }
        center
    }

    /// IGT length of the travel animation at the end of a visit.
    fn transit_igt_ms(&self, visit: &ZoneVisit) -> u64 {
        let from_clock = self.config.transit_replay_ms * self.config.igt_per_replay_ms(self.max_igt_ms);
        let from_share = ms_to_f64(visit.duration_ms()) * self.config.max_transit_share;
        round_f64_to_ms(from_clock.min(from_share))
    }
}

/// Stable orbit phase in `[0, TAU)` derived from the participant id.
#[must_use]
pub fn orbit_phase(participant_id: &str) -> f64 {
    let bucket = XxHash64::oneshot(0, participant_id.as_bytes()) % PHASE_BUCKETS;
    ms_to_f64(bucket) / ms_to_f64(PHASE_BUCKETS) * TAU
}

/// Place `participant` at `replay_clock_ms`.
///
/// Returns `None` when the participant has no visits or a node they occupy
/// has no layout position.
#[must_use]
pub fn position_of(
    participant: &ReplayParticipant,
    replay_clock_ms: f64,
    ctx: &ReplayContext<'_>,
) -> Option<PlayerSnapshot> {
    locate(participant, replay_clock_ms, ctx).map(|(snapshot, _)| snapshot)
}

/// Snapshot plus the IGT at which the participant arrived at its current node.
pub(super) fn locate(
    participant: &ReplayParticipant,
    replay_clock_ms: f64,
    ctx: &ReplayContext<'_>,
) -> Option<(PlayerSnapshot, u64)> {
    let last = participant.last_visit()?;
    let igt = ctx.igt_at(replay_clock_ms);

    if igt >= participant.total_igt_ms && (participant.abandoned || participant.finished) {
        let center = ctx.center_of(&last.node_id)?;
        let snapshot = snapshot_at(participant, last, center, false, participant.abandoned, ctx);
        return Some((snapshot, last.enter_igt_ms));
    }

    let (index, visit) = participant.visit_at(igt)?;
    let center = ctx.center_of(&visit.node_id)?;

    if let Some(next) = participant.zone_visits.get(index + 1)
        && igt >= visit.enter_igt_ms
        && ctx.graph.has_edge(&visit.node_id, &next.node_id)
    {
        let transit = ctx.transit_igt_ms(visit);
        let departs = visit.exit_igt_ms.saturating_sub(transit);
        if transit > 0 && igt >= departs {
            let target = ctx.center_of(&next.node_id)?;
            let t = ms_to_f64(igt - departs) / ms_to_f64(transit);
            let snapshot = snapshot_at(participant, visit, center.lerp(target, t), true, false, ctx);
            return Some((snapshot, visit.enter_igt_ms));
        }
    }

    let angle = orbit_phase(&participant.id) + ctx.config.orbit_speed * replay_clock_ms / 1_000.0;
    let point = Point::new(
        center.x + ctx.config.orbit_radius * angle.cos(),
        center.y + ctx.config.orbit_radius * angle.sin(),
    );
    Some((snapshot_at(participant, visit, point, false, false, ctx), visit.enter_igt_ms))
}

fn snapshot_at(
    participant: &ReplayParticipant,
    visit: &ZoneVisit,
    point: Point,
    in_transit: bool,
    frozen: bool,
    ctx: &ReplayContext<'_>,
) -> PlayerSnapshot {
    PlayerSnapshot {
        participant_id: participant.id.clone(),
        x: point.x,
        y: point.y,
        current_node_id: visit.node_id.clone(),
        in_transit,
        layer: ctx.layer_of(&visit.node_id),
        frozen,
    }
}
