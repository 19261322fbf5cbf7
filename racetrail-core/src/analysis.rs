//! One-shot analysis of a race snapshot: roster, highlights, timeline
//! anchors and replay frames computed from the same inputs.
use std::collections::HashMap;

use crate::config::AnalysisConfig;
use crate::graph::ProgressionGraph;
use crate::highlights::{Highlight, detect_highlights};
use crate::layout::{NodePositions, layered_positions};
use crate::numbers::count_to_f64;
use crate::participant::{ReplayParticipant, build_replay_participants};
use crate::race::{ParticipantId, WsParticipant};
use crate::replay::{
    ReplayContext, ReplayFrame, TimelineHighlight, map_to_timeline, max_igt_of, replay_frame,
};

#[derive(Debug, Clone)]
pub struct RaceAnalysis {
    pub graph: ProgressionGraph,
    pub config: AnalysisConfig,
    pub participants: Vec<ReplayParticipant>,
    pub highlights: Vec<Highlight>,
    pub timeline: Vec<TimelineHighlight>,
    pub positions: NodePositions,
    pub max_igt_ms: u64,
}

impl RaceAnalysis {
    /// Analyse `participants` on `graph`, placing nodes with the layered layout.
    #[must_use]
    pub fn new(graph: ProgressionGraph, participants: &[WsParticipant], config: AnalysisConfig) -> Self {
        let positions =
            layered_positions(&graph, config.replay.layer_spacing, config.replay.row_spacing);
        Self::with_positions(graph, participants, config, positions)
    }

    /// Analyse with renderer-supplied node positions.
    #[must_use]
    pub fn with_positions(
        graph: ProgressionGraph,
        participants: &[WsParticipant],
        config: AnalysisConfig,
        positions: NodePositions,
    ) -> Self {
        let participants = build_replay_participants(participants, &graph);
        let highlights = detect_highlights(&participants, &graph, &config.highlights);
        let timeline = map_to_timeline(&highlights, &participants);
        let max_igt_ms = max_igt_of(&participants);
        log::info!(
            "analysed {} participants: {} highlights over {}ms",
            participants.len(),
            highlights.len(),
            max_igt_ms
        );
        Self {
            graph,
            config,
            participants,
            highlights,
            timeline,
            positions,
            max_igt_ms,
        }
    }

    #[must_use]
    pub fn context(&self) -> ReplayContext<'_> {
        let origin_layer = self
            .graph
            .start_node()
            .and_then(|start| self.graph.layer_of(start))
            .unwrap_or(0);
        ReplayContext {
            max_igt_ms: self.max_igt_ms,
            positions: &self.positions,
            graph: &self.graph,
            origin_layer,
            config: &self.config.replay,
        }
    }

    #[must_use]
    pub fn frame(&self, replay_ms: f64) -> ReplayFrame {
        replay_frame(&self.participants, replay_ms, &self.context())
    }

    /// `count` frames evenly spaced from the start to the end of the replay.
    #[must_use]
    pub fn sample_frames(&self, count: usize) -> Vec<ReplayFrame> {
        let duration = self.config.replay.duration_ms;
        match count {
            0 => Vec::new(),
            1 => vec![self.frame(duration)],
            _ => {
                let step = duration / count_to_f64(count - 1);
                (0..count)
                    .map(|i| self.frame(step * count_to_f64(i)))
                    .collect()
            }
        }
    }

    /// Display names keyed by participant id, for rendering highlight text.
    #[must_use]
    pub fn names(&self) -> HashMap<ParticipantId, String> {
        self.participants
            .iter()
            .map(|p| (p.id.clone(), p.display_name.clone()))
            .collect()
    }

    #[must_use]
    pub fn render(&self, highlight: &Highlight) -> String {
        highlight.render(&self.names(), &self.graph)
    }
}
