//! Node coordinates. Rendering layers normally supply these; the layered
//! placement here only exists so headless consumers can put a point on a node.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::graph::{NodeId, ProgressionGraph};
use crate::numbers::count_to_f64;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

pub type NodePositions = BTreeMap<NodeId, Point>;

/// Column per layer, nodes of a layer stacked and centered on y = 0.
#[must_use]
pub fn layered_positions(
    graph: &ProgressionGraph,
    layer_spacing: f64,
    row_spacing: f64,
) -> NodePositions {
    let mut by_layer: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
    for (id, info) in graph.nodes() {
        by_layer.entry(info.layer).or_default().push(id);
    }
    let mut positions = NodePositions::new();
    for (layer, ids) in by_layer {
        let center = (count_to_f64(ids.len()) - 1.0) / 2.0;
        for (row, id) in ids.into_iter().enumerate() {
            let x = f64::from(layer) * layer_spacing;
            let y = (count_to_f64(row) - center) * row_spacing;
            positions.insert(id.to_string(), Point::new(x, y));
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_become_columns_centered_vertically() {
        let graph = ProgressionGraph::from_json(
            r#"{"nodes": {
                "s": {"type": "start", "layer": 0},
                "a": {"type": "boss", "layer": 1},
                "b": {"type": "boss", "layer": 1}
            }}"#,
        )
        .unwrap();
        let positions = layered_positions(&graph, 100.0, 50.0);
        assert_eq!(positions["s"], Point::new(0.0, 0.0));
        assert_eq!(positions["a"], Point::new(100.0, -25.0));
        assert_eq!(positions["b"], Point::new(100.0, 25.0));
    }

    #[test]
    fn lerp_clamps_progress() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 20.0);
        assert_eq!(a.lerp(b, 0.5), Point::new(5.0, 10.0));
        assert_eq!(a.lerp(b, 2.0), b);
    }
}
