//! Race, seed and participant records as the race server reports them.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::{GraphError, NodeId, ProgressionGraph};

pub type ParticipantId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceStatus {
    #[default]
    Draft,
    Open,
    Running,
    Finished,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Open => write!(f, "open"),
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RaceInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: RaceStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seeds_released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeedInfo {
    #[serde(default)]
    pub total_layers: u32,
    #[serde(default)]
    pub graph_json: serde_json::Value,
    #[serde(default)]
    pub total_nodes: u32,
    #[serde(default)]
    pub total_paths: u32,
}

impl SeedInfo {
    /// Decode the embedded progression graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph JSON is missing, malformed or not a DAG.
    pub fn graph(&self) -> Result<ProgressionGraph, GraphError> {
        ProgressionGraph::from_value(&self.graph_json)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    #[default]
    Registered,
    Ready,
    Playing,
    Finished,
    Abandoned,
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registered => write!(f, "registered"),
            Self::Ready => write!(f, "ready"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// One zone entry from a participant's log; `igt_ms` is cumulative race IGT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneLogEntry {
    #[serde(alias = "nodeId")]
    pub node_id: NodeId,
    #[serde(alias = "cumulative_igt_ms", alias = "cumulativeIgtMs")]
    pub igt_ms: u64,
    #[serde(default, alias = "deaths_at_entry", alias = "deathsAtEntry")]
    pub deaths: Option<u32>,
}

impl ZoneLogEntry {
    #[must_use]
    pub fn new(node_id: &str, igt_ms: u64) -> Self {
        Self {
            node_id: node_id.to_string(),
            igt_ms,
            deaths: None,
        }
    }

    #[must_use]
    pub const fn with_deaths(mut self, deaths: u32) -> Self {
        self.deaths = Some(deaths);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WsParticipant {
    pub id: ParticipantId,
    #[serde(default)]
    pub twitch_username: String,
    #[serde(default, alias = "twitch_display_name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub status: ParticipantStatus,
    #[serde(default)]
    pub current_zone: Option<NodeId>,
    #[serde(default)]
    pub current_layer: u32,
    #[serde(default)]
    pub igt_ms: u64,
    #[serde(default)]
    pub death_count: u32,
    #[serde(default)]
    pub color_index: Option<usize>,
    #[serde(default)]
    pub zone_history: Option<Vec<ZoneLogEntry>>,
}

impl WsParticipant {
    /// Preferred display name, falling back to the account name and then the id.
    #[must_use]
    pub fn name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ if !self.twitch_username.is_empty() => &self.twitch_username,
            _ => &self.id,
        }
    }

    #[must_use]
    pub fn has_history(&self) -> bool {
        self.zone_history.as_ref().is_some_and(|log| !log.is_empty())
    }
}
