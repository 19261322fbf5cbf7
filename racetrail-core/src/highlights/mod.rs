//! Highlight detection: short narrative events derived from every
//! participant's zone timeline.
//!
//! Detection is a pure function of the participants and the graph. Each
//! detector proposes candidates with a score; selection keeps the best
//! `max_per_category` of each category and emits categories in a fixed order
//! so the strongest speed clear always leads.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::graph::{NodeId, ProgressionGraph};
use crate::participant::ReplayParticipant;
use crate::race::ParticipantId;

mod config;
mod dwell;
mod field;
mod zones;

pub use config::{HighlightConfig, HighlightConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    SpeedDemon,
    ZoneWall,
    DeathMagnet,
    Rivals,
    PhotoFinish,
}

impl HighlightKind {
    #[must_use]
    pub const fn category(self) -> HighlightCategory {
        match self {
            Self::SpeedDemon => HighlightCategory::Speed,
            Self::ZoneWall | Self::DeathMagnet => HighlightCategory::Struggle,
            Self::Rivals => HighlightCategory::Rivalry,
            Self::PhotoFinish => HighlightCategory::Finish,
        }
    }

    /// Highlights that describe how a race ended.
    #[must_use]
    pub const fn is_finish(self) -> bool {
        matches!(self, Self::PhotoFinish)
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::SpeedDemon => "Speed Demon",
            Self::ZoneWall => "Zone Wall",
            Self::DeathMagnet => "Death Magnet",
            Self::Rivals => "Rivals",
            Self::PhotoFinish => "Photo Finish",
        }
    }
}

impl std::fmt::Display for HighlightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SpeedDemon => write!(f, "speed_demon"),
            Self::ZoneWall => write!(f, "zone_wall"),
            Self::DeathMagnet => write!(f, "death_magnet"),
            Self::Rivals => write!(f, "rivals"),
            Self::PhotoFinish => write!(f, "photo_finish"),
        }
    }
}

/// Output order of categories follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightCategory {
    Speed,
    Struggle,
    Rivalry,
    Finish,
}

impl HighlightCategory {
    pub const ALL: [Self; 4] = [Self::Speed, Self::Struggle, Self::Rivalry, Self::Finish];
}

/// A piece of highlight text; renderers style players, zones and times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Player(ParticipantId),
    Zone(NodeId),
    Duration(u64),
    Count(u32),
}

impl Segment {
    pub(crate) fn text(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub kind: HighlightKind,
    pub category: HighlightCategory,
    pub title: String,
    pub segments: Vec<Segment>,
    pub player_ids: BTreeSet<ParticipantId>,
    /// Zone the highlight happened in, when it is tied to one.
    pub node_id: Option<NodeId>,
    pub score: f64,
}

impl Highlight {
    pub(crate) fn new(
        kind: HighlightKind,
        segments: Vec<Segment>,
        players: impl IntoIterator<Item = ParticipantId>,
        node_id: Option<NodeId>,
        score: f64,
    ) -> Self {
        Self {
            kind,
            category: kind.category(),
            title: kind.title().to_string(),
            segments,
            player_ids: players.into_iter().collect(),
            node_id,
            score,
        }
    }

    /// Flatten the segments into plain text.
    #[must_use]
    pub fn render(&self, names: &HashMap<ParticipantId, String>, graph: &ProgressionGraph) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => text.clone(),
                Segment::Player(id) => names.get(id).cloned().unwrap_or_else(|| id.clone()),
                Segment::Zone(node) => graph.display_name(node).to_string(),
                Segment::Duration(ms) => format_duration(*ms),
                Segment::Count(n) => n.to_string(),
            })
            .collect()
    }
}

/// `m:ss` below an hour, `h:mm:ss` above.
#[must_use]
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1_000;
    let (hours, minutes, seconds) = (total_secs / 3_600, (total_secs / 60) % 60, total_secs % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Detect highlights for a finished or in-progress race.
///
/// Participants without zone history are ignored; with fewer than two
/// remaining there is nothing to compare and the result is empty.
#[must_use]
pub fn detect_highlights(
    participants: &[ReplayParticipant],
    graph: &ProgressionGraph,
    config: &HighlightConfig,
) -> Vec<Highlight> {
    let active: Vec<ReplayParticipant> = participants
        .iter()
        .filter(|p| !p.zone_visits.is_empty())
        .cloned()
        .collect();
    if active.len() < 2 {
        return Vec::new();
    }

    let table = dwell::DwellTable::build(&active, graph);
    let mut candidates = Vec::new();
    candidates.extend(zones::speed_demons(&active, graph, &table, config));
    candidates.extend(zones::zone_walls(&active, graph, &table, config));
    candidates.extend(zones::death_magnets(&active, graph, &table, config));
    candidates.extend(field::rivals(&active, &table, config));
    candidates.extend(field::photo_finish(&active, config));
    log::debug!("highlight candidates: {}", candidates.len());

    select(candidates, config.max_per_category)
}

fn select(candidates: Vec<Highlight>, max_per_category: usize) -> Vec<Highlight> {
    let mut selected = Vec::new();
    for category in HighlightCategory::ALL {
        let mut group: Vec<&Highlight> = candidates
            .iter()
            .filter(|h| h.category == category)
            .collect();
        group.sort_by(|a, b| b.score.total_cmp(&a.score));
        selected.extend(group.into_iter().take(max_per_category).cloned());
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(kind: HighlightKind, player: &str, score: f64) -> Highlight {
        Highlight::new(kind, vec![Segment::Player(player.into())], [player.to_string()], None, score)
    }

    #[test]
    fn selection_keeps_best_per_category_in_fixed_order() {
        let picked = select(
            vec![
                candidate(HighlightKind::PhotoFinish, "f", 1.0),
                candidate(HighlightKind::ZoneWall, "w1", 2.0),
                candidate(HighlightKind::DeathMagnet, "w2", 5.0),
                candidate(HighlightKind::SpeedDemon, "s1", 1.0),
                candidate(HighlightKind::SpeedDemon, "s2", 3.0),
                candidate(HighlightKind::SpeedDemon, "s3", 3.0),
            ],
            2,
        );
        let order: Vec<&str> = picked
            .iter()
            .map(|h| h.player_ids.iter().next().unwrap().as_str())
            .collect();
        assert_eq!(order, vec!["s2", "s3", "w2", "w1", "f"]);
    }

    #[test]
    fn durations_render_compactly() {
        assert_eq!(format_duration(75_000), "1:15");
        assert_eq!(format_duration(3_725_000), "1:02:05");
        assert_eq!(format_duration(999), "0:00");
    }

    #[test]
    fn render_substitutes_names_and_zones() {
        let graph = ProgressionGraph::from_json(
            r#"{"nodes": {"s": {"type": "start"}, "z": {"type": "boss", "display_name": "Bridge"}}}"#,
        )
        .unwrap();
        let highlight = Highlight::new(
            HighlightKind::ZoneWall,
            vec![
                Segment::Player("p".into()),
                Segment::text(" spent "),
                Segment::Duration(290_000),
                Segment::text(" in "),
                Segment::Zone("z".into()),
            ],
            ["p".to_string()],
            Some("z".into()),
            1.0,
        );
        let names = HashMap::from([("p".to_string(), "Ana".to_string())]);
        assert_eq!(highlight.render(&names, &graph), "Ana spent 4:50 in Bridge");
    }
}
