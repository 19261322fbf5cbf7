use racetrail_core::{
    AnalysisConfig, HighlightKind, RaceAnalysis, RaceInfo, RaceStatus, SeedInfo, WsParticipant,
};
use serde_json::Value;

fn load() -> (RaceInfo, RaceAnalysis) {
    let doc: Value = serde_json::from_str(include_str!("fixtures/race_state.json")).unwrap();
    let race: RaceInfo = serde_json::from_value(doc["race"].clone()).unwrap();
    let seed: SeedInfo = serde_json::from_value(doc["seed"].clone()).unwrap();
    let participants: Vec<WsParticipant> =
        serde_json::from_value(doc["participants"].clone()).unwrap();
    let analysis = RaceAnalysis::new(seed.graph().unwrap(), &participants, AnalysisConfig::default());
    (race, analysis)
}

#[test]
fn saved_race_yields_expected_highlights() {
    let (race, analysis) = load();
    assert_eq!(race.status, RaceStatus::Finished);
    assert_eq!(analysis.participants.len(), 3, "registered runner has no history");
    assert_eq!(analysis.max_igt_ms, 602_000);

    let kinds: Vec<HighlightKind> = analysis.highlights.iter().map(|h| h.kind).collect();
    assert_eq!(kinds, vec![HighlightKind::DeathMagnet, HighlightKind::PhotoFinish]);

    let texts: Vec<String> = analysis
        .highlights
        .iter()
        .map(|h| analysis.render(h))
        .collect();
    assert_eq!(texts[0], "cyclops died 7 times in Sunken Crypt");
    assert_eq!(texts[1], "Ana edged out benji by 0:02");
}

#[test]
fn highlights_land_on_the_timeline() {
    let (_, analysis) = load();
    let anchors: Vec<u64> = analysis.timeline.iter().map(|t| t.igt_ms).collect();
    assert_eq!(anchors, vec![170_000, 602_000]);
    let last = analysis.timeline[1].replay_ms(analysis.max_igt_ms, &analysis.config.replay);
    assert!((last - analysis.config.replay.duration_ms).abs() < f64::EPSILON);
}

#[test]
fn sampled_frames_track_the_leader() {
    let (_, analysis) = load();
    let frames = analysis.sample_frames(5);
    assert_eq!(frames.len(), 5);
    assert_eq!(frames[0].igt_ms, 0);
    assert_eq!(frames[0].leader.as_deref(), Some("p-ana"));

    let end = frames.last().unwrap();
    assert_eq!(end.igt_ms, 602_000);
    let cy = end
        .snapshots
        .iter()
        .find(|s| s.participant_id == "p-cy")
        .unwrap();
    assert!(cy.frozen);
    assert_eq!(cy.current_node_id, "keep");
    assert_eq!(end.leader.as_deref(), Some("p-ana"));
    assert!(analysis.sample_frames(0).is_empty());
}
