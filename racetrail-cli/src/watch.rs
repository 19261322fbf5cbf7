//! Follow one race live until interrupted.
use anyhow::{Context, Result};
use colored::Colorize;
use log::{debug, info, warn};
use racetrail_core::format_duration;
use racetrail_live::{
    ChannelConfig, ChannelHandlers, ChannelTarget, LiveRaceState, LiveRaceStore, LiveSession,
    ServerMessage, StateChange,
};
use tokio::sync::mpsc;

#[derive(Debug)]
enum Event {
    Connected,
    Disconnected,
    Error(String),
    Message(ServerMessage),
}

fn forwarding_handlers(tx: &mpsc::UnboundedSender<Event>) -> ChannelHandlers {
    let forward = |tx: &mpsc::UnboundedSender<Event>| {
        let tx = tx.clone();
        move |event: Event| {
            // The receiver only goes away once we are shutting down.
            let _ = tx.send(event);
        }
    };
    let (race, board, player, status, count) =
        (forward(tx), forward(tx), forward(tx), forward(tx), forward(tx));
    let (connected, disconnected, error) = (forward(tx), forward(tx), forward(tx));
    ChannelHandlers::new()
        .on_race_state(move |m| race(Event::Message(ServerMessage::RaceState(m))))
        .on_leaderboard_update(move |m| board(Event::Message(ServerMessage::LeaderboardUpdate(m))))
        .on_player_update(move |m| player(Event::Message(ServerMessage::PlayerUpdate(m))))
        .on_race_status_change(move |m| {
            status(Event::Message(ServerMessage::RaceStatusChange(m)));
        })
        .on_spectator_count(move |m| count(Event::Message(ServerMessage::SpectatorCount(m))))
        .on_connected(move || connected(Event::Connected))
        .on_disconnected(move || disconnected(Event::Disconnected))
        .on_error(move |err| error(Event::Error(err.to_string())))
}

/// Lines to print for one applied change.
pub fn describe_change(state: &LiveRaceState, change: &StateChange) -> Vec<String> {
    match change {
        StateChange::Snapshot => {
            let race = state.race.as_ref();
            let mut lines = vec![format!(
                "📡 {} ({}) with {} runners",
                race.map_or("race", |r| r.id.as_str()),
                state.status(),
                state.participants.len()
            )];
            lines.extend(leaderboard(state));
            lines
        }
        StateChange::Leaderboard => leaderboard(state),
        StateChange::Player(id) => state
            .participant(id)
            .map(|p| {
                vec![format!(
                    "• {} [{}] {} · {} · {} deaths",
                    p.name(),
                    p.status,
                    p.current_zone.as_deref().unwrap_or("-"),
                    format_duration(p.igt_ms),
                    p.death_count
                )]
            })
            .unwrap_or_default(),
        StateChange::Status(status) => vec![format!("🏁 race is now {status}")],
        StateChange::Spectators(count) => vec![format!("👀 {count} watching")],
    }
}

fn leaderboard(state: &LiveRaceState) -> Vec<String> {
    state
        .participants
        .iter()
        .enumerate()
        .map(|(rank, p)| {
            format!(
                "  {:>2}. {:<20} layer {:>2}  {}",
                rank + 1,
                p.name(),
                p.current_layer,
                format_duration(p.igt_ms)
            )
        })
        .collect()
}

pub async fn run(
    server: &str,
    race_id: &str,
    token: Option<String>,
    locale: Option<&str>,
) -> Result<()> {
    let mut target = ChannelTarget::new(server, race_id).context("invalid --server or --race")?;
    if let Some(locale) = locale {
        target = target.with_locale(locale);
    }
    println!("{} {}", "🔌 Connecting to".bright_cyan(), target);
    info!("watching race {race_id} via {target}");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = LiveSession::start(
        target,
        token,
        &ChannelConfig::default(),
        forwarding_handlers(&tx),
    )?;

    let mut store = LiveRaceStore::new();
    store.subscribe(|state, change| {
        for line in describe_change(state, change) {
            println!("{line}");
        }
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(Event::Message(message)) => {
                    debug!("applying {} message", message.kind());
                    store.apply(message);
                }
                Some(Event::Connected) => println!("{}", "✅ connected".green()),
                Some(Event::Disconnected) => println!("{}", "⚠️  disconnected, retrying".yellow()),
                Some(Event::Error(err)) => {
                    warn!("live channel error: {err}");
                    eprintln!("{} {err}", "❌".red());
                }
                None => break,
            },
            result = &mut ctrl_c => {
                result.context("failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    info!("shutting down live session for race {race_id}");
    handle.disconnect().await;
    println!("{}", "👋 disconnected".cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use racetrail_core::{RaceInfo, RaceStatus, WsParticipant};
    use racetrail_live::{PlayerUpdate, RaceSnapshot};

    fn runner(id: &str, name: &str, layer: u32, igt_ms: u64) -> WsParticipant {
        WsParticipant {
            id: id.into(),
            display_name: Some(name.into()),
            current_layer: layer,
            igt_ms,
            ..WsParticipant::default()
        }
    }

    #[test]
    fn snapshot_prints_header_and_leaderboard() {
        let mut state = LiveRaceState::default();
        let change = state.apply(ServerMessage::RaceState(RaceSnapshot {
            race: RaceInfo {
                id: "r-1".into(),
                status: RaceStatus::Running,
                ..RaceInfo::default()
            },
            seed: racetrail_core::SeedInfo::default(),
            participants: vec![runner("a", "Ana", 3, 61_000), runner("b", "Ben", 2, 5_000)],
        }));
        let lines = describe_change(&state, &change);
        assert_eq!(lines[0], "📡 r-1 (running) with 2 runners");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("1. Ana"));
        assert!(lines[1].ends_with("1:01"));
    }

    #[test]
    fn player_and_counter_changes_are_one_line() {
        let mut state = LiveRaceState::default();
        let change = state.apply(ServerMessage::PlayerUpdate(PlayerUpdate {
            player: runner("c", "Cy", 1, 1_000),
        }));
        let lines = describe_change(&state, &change);
        assert_eq!(lines, vec!["• Cy [registered] - · 0:01 · 0 deaths".to_string()]);
        assert_eq!(
            describe_change(&state, &StateChange::Spectators(4)),
            vec!["👀 4 watching".to_string()]
        );
        assert!(describe_change(&state, &StateChange::Player("zz".into())).is_empty());
    }
}
