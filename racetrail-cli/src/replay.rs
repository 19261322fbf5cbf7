//! Offline analysis of a saved race snapshot.
use anyhow::{Context, Result, bail};
use log::{debug, info};
use racetrail_core::{
    AnalysisConfig, HighlightCategory, HighlightKind, RaceAnalysis, RaceStatus, ReplayFrame,
};
use racetrail_live::{RaceSnapshot, ServerMessage};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Accepts either a full `race_state` frame or its bare payload.
pub fn parse_snapshot(json: &str) -> Result<RaceSnapshot> {
    let value: Value = serde_json::from_str(json)?;
    if value.get("type").is_none() {
        return Ok(serde_json::from_value(value)?);
    }
    match serde_json::from_value::<ServerMessage>(value)? {
        ServerMessage::RaceState(snapshot) => Ok(snapshot),
        other => bail!("expected a race_state payload, found {}", other.kind()),
    }
}

pub fn load_snapshot(path: &Path) -> Result<RaceSnapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let snapshot =
        parse_snapshot(&json).with_context(|| format!("failed to parse {}", path.display()))?;
    info!(
        "loaded race {} with {} participants from {}",
        snapshot.race.id,
        snapshot.participants.len(),
        path.display()
    );
    Ok(snapshot)
}

#[derive(Debug, Clone, Serialize)]
pub struct RunnerSummary {
    pub id: String,
    pub name: String,
    pub color: String,
    pub total_igt_ms: u64,
    pub deaths: u32,
    pub zones: usize,
    pub finished: bool,
    pub abandoned: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HighlightSummary {
    pub kind: HighlightKind,
    pub category: HighlightCategory,
    pub title: String,
    pub text: String,
    pub igt_ms: u64,
    pub replay_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunnerPosition {
    pub name: String,
    pub zone: String,
    pub in_transit: bool,
    pub frozen: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameSummary {
    pub replay_ms: f64,
    pub igt_ms: u64,
    pub leader: Option<String>,
    pub positions: Vec<RunnerPosition>,
}

/// Everything the report writers print for one race.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub race_id: String,
    pub race_name: String,
    pub status: RaceStatus,
    pub max_igt_ms: u64,
    pub runners: Vec<RunnerSummary>,
    pub highlights: Vec<HighlightSummary>,
    pub frames: Vec<FrameSummary>,
}

impl ReplayReport {
    pub fn build(snapshot: &RaceSnapshot, config: AnalysisConfig, frames: usize) -> Result<Self> {
        let graph = snapshot
            .seed
            .graph()
            .context("race snapshot carries an invalid progression graph")?;
        let analysis = RaceAnalysis::new(graph, &snapshot.participants, config);
        let names = analysis.names();
        let name_of = |id: &str| names.get(id).cloned().unwrap_or_else(|| id.to_string());

        let runners = analysis
            .participants
            .iter()
            .map(|p| RunnerSummary {
                id: p.id.clone(),
                name: p.display_name.clone(),
                color: p.color.clone(),
                total_igt_ms: p.total_igt_ms,
                deaths: p.total_deaths(),
                zones: p.zone_visits.len(),
                finished: p.finished,
                abandoned: p.abandoned,
            })
            .collect();

        let highlights: Vec<HighlightSummary> = analysis
            .timeline
            .iter()
            .map(|entry| HighlightSummary {
                kind: entry.highlight.kind,
                category: entry.highlight.category,
                title: entry.highlight.title.clone(),
                text: analysis.render(&entry.highlight),
                igt_ms: entry.igt_ms,
                replay_ms: entry.replay_ms(analysis.max_igt_ms, &analysis.config.replay),
            })
            .collect();

        let frames = analysis
            .sample_frames(frames)
            .iter()
            .map(|frame| summarize_frame(frame, &analysis, &name_of))
            .collect();

        debug!(
            "race {}: {} highlights over {} ms of IGT",
            snapshot.race.id,
            highlights.len(),
            analysis.max_igt_ms
        );

        Ok(Self {
            race_id: snapshot.race.id.clone(),
            race_name: snapshot.race.name.clone(),
            status: snapshot.race.status,
            max_igt_ms: analysis.max_igt_ms,
            runners,
            highlights,
            frames,
        })
    }
}

fn summarize_frame(
    frame: &ReplayFrame,
    analysis: &RaceAnalysis,
    name_of: &impl Fn(&str) -> String,
) -> FrameSummary {
    FrameSummary {
        replay_ms: frame.replay_ms,
        igt_ms: frame.igt_ms,
        leader: frame.leader.as_deref().map(name_of),
        positions: frame
            .snapshots
            .iter()
            .map(|s| RunnerPosition {
                name: name_of(s.participant_id.as_str()),
                zone: analysis.graph.display_name(&s.current_node_id).to_string(),
                in_transit: s.in_transit,
                frozen: s.frozen,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_frames_and_bare_payloads() {
        let frame = r#"{"type":"race_state","race":{"id":"r1","status":"open"}}"#;
        assert_eq!(parse_snapshot(frame).unwrap().race.id, "r1");
        let bare = r#"{"race":{"id":"r2"},"participants":[]}"#;
        assert_eq!(parse_snapshot(bare).unwrap().race.id, "r2");
    }

    #[test]
    fn rejects_other_message_kinds() {
        let err = parse_snapshot(r#"{"type":"spectator_count","count":4}"#).unwrap_err();
        assert!(err.to_string().contains("spectator_count"));
        assert!(parse_snapshot("not json").is_err());
    }
}
