use racetrail_core::{
    HighlightConfig, HighlightKind, ParticipantStatus, ProgressionGraph, ReplayParticipant,
    WsParticipant, ZoneLogEntry, build_replay_participants, detect_highlights,
};

fn graph() -> ProgressionGraph {
    ProgressionGraph::from_json(
        r#"{"nodes": {
            "start": {"type": "start", "layer": 0},
            "keep": {"type": "legacy_dungeon", "layer": 1, "tier": 3},
            "end": {"type": "final_boss", "layer": 2, "tier": 5}
        }, "edges": [{"from": "start", "to": "keep"}, {"from": "keep", "to": "end"}]}"#,
    )
    .unwrap()
}

/// A finished runner who spends `keep_ms` in the keep and `end_ms` on the final boss.
fn runner(id: &str, keep_ms: u64, end_ms: u64) -> WsParticipant {
    let keep_at = 10_000;
    let end_at = keep_at + keep_ms;
    WsParticipant {
        id: id.into(),
        twitch_username: id.into(),
        status: ParticipantStatus::Finished,
        igt_ms: end_at + end_ms,
        zone_history: Some(vec![
            ZoneLogEntry::new("start", 0),
            ZoneLogEntry::new("keep", keep_at),
            ZoneLogEntry::new("end", end_at),
        ]),
        ..WsParticipant::default()
    }
}

fn detect(field: &[WsParticipant]) -> Vec<racetrail_core::Highlight> {
    let graph = graph();
    let participants: Vec<ReplayParticipant> = build_replay_participants(field, &graph);
    detect_highlights(&participants, &graph, &HighlightConfig::default())
}

fn named(highlights: &[racetrail_core::Highlight], kind: HighlightKind) -> Vec<Vec<String>> {
    highlights
        .iter()
        .filter(|h| h.kind == kind)
        .map(|h| h.player_ids.iter().cloned().collect())
        .collect()
}

#[test]
fn fewer_than_two_logged_participants_yield_nothing() {
    assert!(detect(&[]).is_empty());
    assert!(detect(&[runner("solo", 20_000, 60_000)]).is_empty());
    let idle = WsParticipant {
        id: "idle".into(),
        ..WsParticipant::default()
    };
    assert!(detect(&[runner("solo", 20_000, 60_000), idle]).is_empty());
}

#[test]
fn fast_clear_is_a_speed_demon() {
    let highlights = detect(&[runner("fast", 20_000, 60_000), runner("slow", 75_000, 60_000)]);
    assert_eq!(named(&highlights, HighlightKind::SpeedDemon), vec![vec!["fast".to_string()]]);
    let demon = &highlights[0];
    assert_eq!(demon.kind, HighlightKind::SpeedDemon);
    assert_eq!(demon.node_id.as_deref(), Some("keep"));
}

#[test]
fn slow_clear_in_a_high_tier_zone_is_a_wall() {
    let highlights = detect(&[runner("stuck", 290_000, 60_000), runner("smooth", 30_000, 60_000)]);
    assert_eq!(named(&highlights, HighlightKind::ZoneWall), vec![vec!["stuck".to_string()]]);
}

#[test]
fn close_finish_is_a_photo_finish() {
    let highlights = detect(&[runner("a", 100_000, 60_000), runner("b", 100_000, 62_000)]);
    assert_eq!(
        named(&highlights, HighlightKind::PhotoFinish),
        vec![vec!["a".to_string(), "b".to_string()]]
    );
    assert!(named(&highlights, HighlightKind::SpeedDemon).is_empty());
    assert!(named(&highlights, HighlightKind::ZoneWall).is_empty());
}

#[test]
fn detection_is_deterministic() {
    let field = [
        runner("a", 20_000, 60_000),
        runner("b", 75_000, 61_000),
        runner("c", 290_000, 60_500),
    ];
    assert_eq!(detect(&field), detect(&field));
}
