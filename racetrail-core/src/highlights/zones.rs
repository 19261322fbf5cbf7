//! Single-zone outliers: fast clears, walls and death pits.
use super::dwell::{DwellSample, DwellTable, RunningStats, death_value, dwell_value};
use super::{Highlight, HighlightConfig, HighlightKind, Segment};
use crate::graph::{NodeId, ProgressionGraph};
use crate::numbers::{floor_f64_to_ms, ms_to_f64};
use crate::participant::ReplayParticipant;

fn tier_of(graph: &ProgressionGraph, node: &str) -> u32 {
    graph.node(node).map_or(1, |info| info.tier)
}

/// Best candidate per zone, in zone order.
fn best_per_zone<F>(table: &DwellTable, mut evaluate: F) -> Vec<Highlight>
where
    F: FnMut(&NodeId, &[DwellSample], usize) -> Option<Highlight>,
{
    let mut found = Vec::new();
    for (node, samples) in table.contested() {
        let best = (0..samples.len())
            .filter_map(|i| evaluate(node, samples, i))
            .reduce(|best, next| if next.score > best.score { next } else { best });
        found.extend(best);
    }
    found
}

pub(super) fn speed_demons(
    participants: &[ReplayParticipant],
    graph: &ProgressionGraph,
    table: &DwellTable,
    config: &HighlightConfig,
) -> Vec<Highlight> {
    best_per_zone(table, |node, samples, i| {
        let sample = samples[i];
        let others = RunningStats::excluding(samples, i, dwell_value);
        let others_mean = others.mean();
        let dwell = dwell_value(&sample);
        if others_mean <= 0.0 || dwell > config.fast_ratio * others_mean {
            return None;
        }
        let saved = others_mean - dwell;
        if saved < ms_to_f64(config.min_speed_gap_ms) {
            return None;
        }
        if others
            .z_score(dwell)
            .is_some_and(|z| z > -config.min_z_score)
        {
            return None;
        }
        let score = saved / others_mean * config.tier_factor(tier_of(graph, node));
        let player = participants[sample.participant].id.clone();
        Some(Highlight::new(
            HighlightKind::SpeedDemon,
            vec![
                Segment::Player(player.clone()),
                Segment::text(" tore through "),
                Segment::Zone(node.clone()),
                Segment::text(" in "),
                Segment::Duration(sample.dwell_ms),
                Segment::text(", "),
                Segment::Duration(floor_f64_to_ms(saved)),
                Segment::text(" faster than the field"),
            ],
            [player],
            Some(node.clone()),
            score,
        ))
    })
}

pub(super) fn zone_walls(
    participants: &[ReplayParticipant],
    graph: &ProgressionGraph,
    table: &DwellTable,
    config: &HighlightConfig,
) -> Vec<Highlight> {
    best_per_zone(table, |node, samples, i| {
        let sample = samples[i];
        let others = RunningStats::excluding(samples, i, dwell_value);
        let others_mean = others.mean();
        let dwell = dwell_value(&sample);
        if others_mean <= 0.0 || dwell < config.slow_ratio * others_mean {
            return None;
        }
        let extra = dwell - others_mean;
        if extra < ms_to_f64(config.min_wall_gap_ms) {
            return None;
        }
        if others.z_score(dwell).is_some_and(|z| z < config.min_z_score) {
            return None;
        }
        let score = extra / others_mean * config.tier_factor(tier_of(graph, node));
        let player = participants[sample.participant].id.clone();
        Some(Highlight::new(
            HighlightKind::ZoneWall,
            vec![
                Segment::Player(player.clone()),
                Segment::text(" hit a wall in "),
                Segment::Zone(node.clone()),
                Segment::text(": "),
                Segment::Duration(sample.dwell_ms),
                Segment::text(" against a field average of "),
                Segment::Duration(floor_f64_to_ms(others_mean)),
            ],
            [player],
            Some(node.clone()),
            score,
        ))
    })
}

pub(super) fn death_magnets(
    participants: &[ReplayParticipant],
    graph: &ProgressionGraph,
    table: &DwellTable,
    config: &HighlightConfig,
) -> Vec<Highlight> {
    best_per_zone(table, |node, samples, i| {
        let sample = samples[i];
        if sample.deaths < config.death_magnet_min {
            return None;
        }
        let others = RunningStats::excluding(samples, i, death_value);
        if others.count() == 0 || death_value(&sample) < config.death_magnet_ratio * others.mean() {
            return None;
        }
        let score = death_value(&sample) * config.tier_factor(tier_of(graph, node));
        let player = participants[sample.participant].id.clone();
        Some(Highlight::new(
            HighlightKind::DeathMagnet,
            vec![
                Segment::Player(player.clone()),
                Segment::text(" died "),
                Segment::Count(sample.deaths),
                Segment::text(" times in "),
                Segment::Zone(node.clone()),
            ],
            [player],
            Some(node.clone()),
            score,
        ))
    })
}
