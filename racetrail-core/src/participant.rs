//! Replay participants derived from wire participant records.
use serde::{Deserialize, Serialize};

use crate::constants::PLAYER_PALETTE;
use crate::graph::{NodeId, NodeKind, ProgressionGraph};
use crate::race::{ParticipantId, ParticipantStatus, WsParticipant};
use crate::timeline::{ZoneVisit, build_zone_visits};

/// Everything the replay and highlight engines need about one runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayParticipant {
    pub id: ParticipantId,
    pub display_name: String,
    pub color: String,
    pub zone_visits: Vec<ZoneVisit>,
    pub total_igt_ms: u64,
    pub finished: bool,
    pub abandoned: bool,
    pub final_boss_node_id: Option<NodeId>,
}

impl ReplayParticipant {
    #[must_use]
    pub fn last_visit(&self) -> Option<&ZoneVisit> {
        self.zone_visits.last()
    }

    /// Index and visit covering `igt_ms`; instants past the log map to the last visit.
    #[must_use]
    pub fn visit_at(&self, igt_ms: u64) -> Option<(usize, &ZoneVisit)> {
        let last = self.zone_visits.len().checked_sub(1)?;
        let index = self
            .zone_visits
            .iter()
            .position(|visit| visit.contains(igt_ms))
            .unwrap_or_else(|| {
                if igt_ms < self.zone_visits[0].enter_igt_ms {
                    0
                } else {
                    last
                }
            });
        Some((index, &self.zone_visits[index]))
    }

    #[must_use]
    pub fn total_deaths(&self) -> u32 {
        self.zone_visits.iter().map(|visit| visit.deaths).sum()
    }
}

/// Palette color for a participant; wraps around when the field is large.
#[must_use]
pub fn color_for(index: usize) -> &'static str {
    PLAYER_PALETTE[index % PLAYER_PALETTE.len()]
}

/// Rebuild one participant from its wire record.
///
/// Returns `None` for participants without zone history: they have not
/// started moving and are left out of replay and highlights entirely.
#[must_use]
pub fn build_replay_participant(
    participant: &WsParticipant,
    graph: &ProgressionGraph,
    position: usize,
) -> Option<ReplayParticipant> {
    let zone_visits = build_zone_visits(participant.zone_history.as_deref(), participant.igt_ms);
    if zone_visits.is_empty() {
        return None;
    }
    let final_boss_node_id = zone_visits
        .iter()
        .find(|visit| graph.kind_of(&visit.node_id) == Some(&NodeKind::FinalBoss))
        .map(|visit| visit.node_id.clone());
    let total_igt_ms = zone_visits
        .last()
        .map_or(participant.igt_ms, |visit| visit.exit_igt_ms);

    Some(ReplayParticipant {
        id: participant.id.clone(),
        display_name: participant.name().to_string(),
        color: color_for(participant.color_index.unwrap_or(position)).to_string(),
        zone_visits,
        total_igt_ms,
        finished: participant.status == ParticipantStatus::Finished,
        abandoned: participant.status == ParticipantStatus::Abandoned,
        final_boss_node_id,
    })
}

/// Full rebuild of every participant, in input order, skipping those not started.
#[must_use]
pub fn build_replay_participants(
    participants: &[WsParticipant],
    graph: &ProgressionGraph,
) -> Vec<ReplayParticipant> {
    participants
        .iter()
        .enumerate()
        .filter_map(|(position, participant)| build_replay_participant(participant, graph, position))
        .collect()
}

#[derive(Debug, Clone)]
struct RosterEntry {
    source: WsParticipant,
    built: Option<ReplayParticipant>,
}

/// Incremental roster: only slots whose wire record changed are rebuilt.
/// Entries are kept by position, so a field that repeats an id still matches
/// [`build_replay_participants`] on the same input.
#[derive(Debug, Clone, Default)]
pub struct ReplayRoster {
    entries: Vec<RosterEntry>,
}

impl ReplayRoster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole field, returning how many participants were rebuilt.
    pub fn sync(&mut self, participants: &[WsParticipant], graph: &ProgressionGraph) -> usize {
        let mut previous = std::mem::take(&mut self.entries).into_iter();
        let mut rebuilt = 0;
        for (position, participant) in participants.iter().enumerate() {
            let entry = match previous.next() {
                Some(entry) if entry.source == *participant => entry,
                _ => {
                    rebuilt += 1;
                    RosterEntry {
                        source: participant.clone(),
                        built: build_replay_participant(participant, graph, position),
                    }
                }
            };
            self.entries.push(entry);
        }
        rebuilt
    }

    /// Apply a single participant update to the first slot holding its id;
    /// unknown participants are appended.
    pub fn update(&mut self, participant: &WsParticipant, graph: &ProgressionGraph) {
        let slot = self
            .entries
            .iter()
            .position(|entry| entry.source.id == participant.id);
        let position = match slot {
            Some(position) if self.entries[position].source == *participant => return,
            Some(position) => position,
            None => self.entries.len(),
        };
        let entry = RosterEntry {
            source: participant.clone(),
            built: build_replay_participant(participant, graph, position),
        };
        if position == self.entries.len() {
            self.entries.push(entry);
        } else {
            self.entries[position] = entry;
        }
    }

    /// Built participants in roster order.
    #[must_use]
    pub fn participants(&self) -> Vec<ReplayParticipant> {
        self.entries
            .iter()
            .filter_map(|entry| entry.built.clone())
            .collect()
    }

    /// Wire records in roster order, as a full rebuild would see them.
    #[must_use]
    pub fn sources(&self) -> Vec<WsParticipant> {
        self.entries.iter().map(|entry| entry.source.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::ZoneLogEntry;

    fn graph() -> ProgressionGraph {
        ProgressionGraph::from_json(
            r#"{"nodes": {
                "start": {"type": "start", "layer": 0},
                "keep": {"type": "legacy_dungeon", "layer": 1, "tier": 2},
                "end": {"type": "final_boss", "layer": 2, "tier": 5}
            }, "edges": [{"from": "start", "to": "keep"}, {"from": "keep", "to": "end"}]}"#,
        )
        .unwrap()
    }

    fn runner(id: &str, status: ParticipantStatus, log: Vec<ZoneLogEntry>, igt: u64) -> WsParticipant {
        WsParticipant {
            id: id.into(),
            twitch_username: format!("{id}_tv"),
            status,
            igt_ms: igt,
            zone_history: Some(log),
            ..WsParticipant::default()
        }
    }

    #[test]
    fn derives_flags_and_final_boss() {
        let ws = runner(
            "a",
            ParticipantStatus::Finished,
            vec![
                ZoneLogEntry::new("start", 0),
                ZoneLogEntry::new("keep", 1_000),
                ZoneLogEntry::new("end", 5_000),
            ],
            9_000,
        );
        let built = build_replay_participant(&ws, &graph(), 3).unwrap();
        assert!(built.finished);
        assert!(!built.abandoned);
        assert_eq!(built.final_boss_node_id.as_deref(), Some("end"));
        assert_eq!(built.total_igt_ms, 9_000);
        assert_eq!(built.color, color_for(3));
        assert_eq!(built.display_name, "a_tv");
    }

    #[test]
    fn participants_without_history_are_skipped() {
        let idle = WsParticipant {
            id: "idle".into(),
            ..WsParticipant::default()
        };
        let moving = runner("m", ParticipantStatus::Playing, vec![ZoneLogEntry::new("start", 0)], 10);
        let built = build_replay_participants(&[idle, moving], &graph());
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].id, "m");
        assert_eq!(built[0].color, color_for(1));
    }

    #[test]
    fn visit_at_maps_past_end_to_last_visit() {
        let ws = runner(
            "a",
            ParticipantStatus::Playing,
            vec![ZoneLogEntry::new("start", 0), ZoneLogEntry::new("keep", 1_000)],
            2_000,
        );
        let built = build_replay_participant(&ws, &graph(), 0).unwrap();
        assert_eq!(built.visit_at(500).map(|(i, _)| i), Some(0));
        assert_eq!(built.visit_at(1_000).map(|(i, _)| i), Some(1));
        assert_eq!(built.visit_at(50_000).map(|(i, _)| i), Some(1));
    }

    #[test]
    fn roster_matches_full_rebuild_across_updates() {
        let graph = graph();
        let mut field = vec![
            runner("a", ParticipantStatus::Playing, vec![ZoneLogEntry::new("start", 0)], 500),
            runner("b", ParticipantStatus::Playing, vec![ZoneLogEntry::new("start", 0)], 700),
            WsParticipant {
                id: "c".into(),
                ..WsParticipant::default()
            },
        ];
        let mut roster = ReplayRoster::new();
        assert_eq!(roster.sync(&field, &graph), 3);
        assert_eq!(roster.participants(), build_replay_participants(&field, &graph));

        field[1].igt_ms = 4_000;
        field[1]
            .zone_history
            .as_mut()
            .unwrap()
            .push(ZoneLogEntry::new("keep", 3_000).with_deaths(2));
        assert_eq!(roster.sync(&field, &graph), 1);
        assert_eq!(roster.participants(), build_replay_participants(&field, &graph));

        field[2] = runner("c", ParticipantStatus::Abandoned, vec![ZoneLogEntry::new("start", 0)], 90);
        roster.update(&field[2], &graph);
        assert_eq!(roster.sources(), field);
        assert_eq!(roster.participants(), build_replay_participants(&field, &graph));

        let newcomer = runner("d", ParticipantStatus::Ready, vec![ZoneLogEntry::new("start", 0)], 0);
        roster.update(&newcomer, &graph);
        field.push(newcomer);
        assert_eq!(roster.len(), 4);
        assert_eq!(roster.participants(), build_replay_participants(&field, &graph));
    }

    #[test]
    fn roster_with_repeated_ids_matches_full_rebuild() {
        let graph = graph();
        let dup = |igt| {
            runner("dup", ParticipantStatus::Playing, vec![ZoneLogEntry::new("start", 0)], igt)
        };
        let mut field = vec![dup(1_000), dup(9_000)];
        let mut roster = ReplayRoster::new();
        assert_eq!(roster.sync(&field, &graph), 2);
        let full = build_replay_participants(&field, &graph);
        assert_eq!(roster.participants(), full);
        let totals: Vec<u64> = full.iter().map(|p| p.total_igt_ms).collect();
        assert_eq!(totals, vec![1_000, 9_000]);

        assert_eq!(roster.sync(&field, &graph), 0);
        field[0].igt_ms = 2_000;
        roster.update(&field[0], &graph);
        assert_eq!(roster.sources(), field);
        assert_eq!(roster.participants(), build_replay_participants(&field, &graph));
    }
}
