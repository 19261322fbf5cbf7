//! Progression graph: the immutable DAG of zones a race seed offers.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

pub type NodeId = String;

/// Zone classification as reported by the seed generator.
///
/// Unknown kinds are kept verbatim so newer seeds still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Start,
    MiniDungeon,
    LegacyDungeon,
    Boss,
    MajorBoss,
    FinalBoss,
    Other(String),
}

impl NodeKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::MiniDungeon => "mini_dungeon",
            Self::LegacyDungeon => "legacy_dungeon",
            Self::Boss => "boss",
            Self::MajorBoss => "major_boss",
            Self::FinalBoss => "final_boss",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "start" => Self::Start,
            "mini_dungeon" => Self::MiniDungeon,
            "legacy_dungeon" => Self::LegacyDungeon,
            "boss" => Self::Boss,
            "major_boss" => Self::MajorBoss,
            "final_boss" => Self::FinalBoss,
            _ => Self::Other(value),
        }
    }
}

impl From<NodeKind> for String {
    fn from(value: NodeKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(rename = "type", alias = "kind")]
    pub kind: NodeKind,
    #[serde(default, alias = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub layer: u32,
    #[serde(default = "NodeInfo::default_tier")]
    pub tier: u32,
    #[serde(default = "NodeInfo::default_weight")]
    pub weight: f64,
}

impl NodeInfo {
    const fn default_tier() -> u32 {
        1
    }

    const fn default_weight() -> f64 {
        1.0
    }

    #[must_use]
    pub fn new(kind: NodeKind, display_name: &str, layer: u32, tier: u32) -> Self {
        Self {
            kind,
            display_name: display_name.to_string(),
            layer,
            tier,
            weight: Self::default_weight(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(alias = "source")]
    pub from: NodeId,
    #[serde(alias = "target")]
    pub to: NodeId,
}

/// Errors raised when a seed graph cannot be loaded or violates DAG invariants.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("edge {from} -> {to} references unknown node {missing}")]
    UnknownEndpoint {
        from: NodeId,
        to: NodeId,
        missing: NodeId,
    },
    #[error("graph must contain exactly one start node (found {count})")]
    StartCount { count: usize },
    #[error("node {node} has tier 0 (tiers start at 1)")]
    InvalidTier { node: NodeId },
    #[error("graph contains a cycle through {node}")]
    Cycle { node: NodeId },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNodes {
    Keyed(BTreeMap<NodeId, NodeInfo>),
    Listed(Vec<ListedNode>),
}

#[derive(Deserialize)]
struct ListedNode {
    id: NodeId,
    #[serde(flatten)]
    info: NodeInfo,
}

#[derive(Deserialize)]
struct RawGraph {
    nodes: RawNodes,
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default, alias = "totalLayers")]
    total_layers: Option<u32>,
}

/// Directed acyclic graph of zones, read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressionGraph {
    nodes: BTreeMap<NodeId, NodeInfo>,
    edges: Vec<Edge>,
    total_layers: u32,
}

impl ProgressionGraph {
    /// Build and validate a graph from parts.
    ///
    /// # Errors
    ///
    /// Returns an error if any DAG invariant is violated.
    pub fn new(
        nodes: BTreeMap<NodeId, NodeInfo>,
        edges: Vec<Edge>,
        total_layers: Option<u32>,
    ) -> Result<Self, GraphError> {
        let total_layers = total_layers
            .unwrap_or_else(|| nodes.values().map(|n| n.layer + 1).max().unwrap_or(0));
        let graph = Self {
            nodes,
            edges,
            total_layers,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Parse the seed's graph JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the graph is not a valid DAG.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let raw: RawGraph = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Parse a graph that arrived embedded in a larger JSON document.
    ///
    /// Servers sometimes ship the graph as a JSON-encoded string, so both an
    /// object and a string holding an object are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the graph is not a valid DAG.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, GraphError> {
        if let serde_json::Value::String(encoded) = value {
            return Self::from_json(encoded);
        }
        let raw = RawGraph::deserialize(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawGraph) -> Result<Self, GraphError> {
        let nodes = match raw.nodes {
            RawNodes::Keyed(nodes) => nodes,
            RawNodes::Listed(list) => list.into_iter().map(|n| (n.id, n.info)).collect(),
        };
        Self::new(nodes, raw.edges, raw.total_layers)
    }

    fn validate(&self) -> Result<(), GraphError> {
        for edge in &self.edges {
            for endpoint in [&edge.from, &edge.to] {
                if !self.nodes.contains_key(endpoint) {
                    return Err(GraphError::UnknownEndpoint {
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }
        if let Some((id, _)) = self.nodes.iter().find(|(_, info)| info.tier == 0) {
            return Err(GraphError::InvalidTier { node: id.clone() });
        }
        let starts = self
            .nodes
            .values()
            .filter(|info| info.kind == NodeKind::Start)
            .count();
        if starts != 1 {
            return Err(GraphError::StartCount { count: starts });
        }
        self.check_acyclic()
    }

    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut indegree: BTreeMap<&str, usize> =
            self.nodes.keys().map(|id| (id.as_str(), 0)).collect();
        for edge in &self.edges {
            *indegree.entry(edge.to.as_str()).or_default() += 1;
        }
        let mut ready: VecDeque<&str> = indegree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut visited = 0usize;
        while let Some(id) = ready.pop_front() {
            visited += 1;
            for next in self.successors(id) {
                if let Some(deg) = indegree.get_mut(next) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push_back(next);
                    }
                }
            }
        }
        if visited == self.nodes.len() {
            return Ok(());
        }
        let stuck = indegree
            .into_iter()
            .find(|(_, deg)| *deg > 0)
            .map(|(id, _)| id.to_string())
            .unwrap_or_default();
        Err(GraphError::Cycle { node: stuck })
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeInfo> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn nodes(&self) -> &BTreeMap<NodeId, NodeInfo> {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub const fn total_layers(&self) -> u32 {
        self.total_layers
    }

    #[must_use]
    pub fn layer_of(&self, id: &str) -> Option<u32> {
        self.nodes.get(id).map(|n| n.layer)
    }

    #[must_use]
    pub fn kind_of(&self, id: &str) -> Option<&NodeKind> {
        self.nodes.get(id).map(|n| &n.kind)
    }

    /// The unique start node.
    #[must_use]
    pub fn start_node(&self) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(_, info)| info.kind == NodeKind::Start)
            .map(|(id, _)| id.as_str())
    }

    #[must_use]
    pub fn final_boss_node(&self) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(_, info)| info.kind == NodeKind::FinalBoss)
            .map(|(id, _)| id.as_str())
    }

    /// Direct successors of `id` in edge order.
    pub fn successors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.from == id)
            .map(|edge| edge.to.as_str())
    }

    #[must_use]
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges.iter().any(|edge| edge.from == from && edge.to == to)
    }

    #[must_use]
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        match self.nodes.get(id) {
            Some(info) if !info.display_name.is_empty() => &info.display_name,
            _ => id,
        }
    }
}
