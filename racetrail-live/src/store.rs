//! Race snapshot assembled from channel messages, with change notification.
use racetrail_core::{
    GraphError, ParticipantId, ProgressionGraph, RaceInfo, RaceStatus, SeedInfo, WsParticipant,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::protocol::ServerMessage;

/// Everything a spectator view knows about one race.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveRaceState {
    pub race: Option<RaceInfo>,
    pub seed: Option<SeedInfo>,
    /// Server order, unique by id.
    pub participants: Vec<WsParticipant>,
    pub spectator_count: Option<u32>,
}

/// What a single message changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    Snapshot,
    Leaderboard,
    Player(ParticipantId),
    Status(RaceStatus),
    Spectators(u32),
}

impl LiveRaceState {
    /// Fold one message into the state.
    pub fn apply(&mut self, message: ServerMessage) -> StateChange {
        match message {
            ServerMessage::RaceState(snapshot) => {
                self.race = Some(snapshot.race);
                self.seed = Some(snapshot.seed);
                self.participants = dedup_by_id(snapshot.participants);
                StateChange::Snapshot
            }
            ServerMessage::LeaderboardUpdate(update) => {
                self.participants = dedup_by_id(update.participants);
                StateChange::Leaderboard
            }
            ServerMessage::PlayerUpdate(update) => {
                let id = update.player.id.clone();
                match self.participants.iter_mut().find(|p| p.id == id) {
                    Some(existing) => *existing = update.player,
                    None => self.participants.push(update.player),
                }
                StateChange::Player(id)
            }
            ServerMessage::RaceStatusChange(change) => {
                match self.race.as_mut() {
                    Some(race) => {
                        race.status = change.status;
                        if change.started_at.is_some() {
                            race.started_at = change.started_at;
                        }
                    }
                    None => log::debug!("status change to {} before race state", change.status),
                }
                StateChange::Status(change.status)
            }
            ServerMessage::SpectatorCount(count) => {
                self.spectator_count = Some(count.count);
                StateChange::Spectators(count.count)
            }
        }
    }

    #[must_use]
    pub fn participant(&self, id: &str) -> Option<&WsParticipant> {
        self.participants.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn status(&self) -> RaceStatus {
        self.race.as_ref().map_or(RaceStatus::Draft, |race| race.status)
    }

    /// Decode the seed's progression graph, once a snapshot has arrived.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph JSON is invalid.
    pub fn graph(&self) -> Result<Option<ProgressionGraph>, GraphError> {
        self.seed.as_ref().map(SeedInfo::graph).transpose()
    }
}

fn dedup_by_id(participants: Vec<WsParticipant>) -> Vec<WsParticipant> {
    let mut unique: Vec<WsParticipant> = Vec::with_capacity(participants.len());
    for participant in participants {
        match unique.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => *existing = participant,
            None => unique.push(participant),
        }
    }
    unique
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&LiveRaceState, &StateChange) + Send>;

/// Owned race state plus subscribers notified after every applied message.
#[derive(Default)]
pub struct LiveRaceStore {
    state: LiveRaceState,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl LiveRaceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &LiveRaceState {
        &self.state
    }

    pub fn subscribe(
        &mut self,
        f: impl FnMut(&LiveRaceState, &StateChange) + Send + 'static,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(f)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub fn apply(&mut self, message: ServerMessage) -> StateChange {
        let change = self.state.apply(message);
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&self.state, &change);
        }
        change
    }

    /// Forget everything received; subscribers stay registered.
    pub fn reset(&mut self) {
        self.state = LiveRaceState::default();
    }
}

impl fmt::Debug for LiveRaceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveRaceStore")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        LeaderboardUpdate, PlayerUpdate, RaceSnapshot, SpectatorCount, StatusChange,
    };
    use racetrail_core::ParticipantStatus;
    use std::sync::{Arc, Mutex};

    fn runner(id: &str, igt_ms: u64) -> WsParticipant {
        WsParticipant {
            id: id.into(),
            igt_ms,
            ..WsParticipant::default()
        }
    }

    fn snapshot() -> ServerMessage {
        ServerMessage::RaceState(RaceSnapshot {
            race: RaceInfo {
                id: "r".into(),
                status: RaceStatus::Open,
                ..RaceInfo::default()
            },
            seed: SeedInfo::default(),
            participants: vec![runner("a", 0), runner("b", 0)],
        })
    }

    #[test]
    fn messages_fold_into_state() {
        let mut state = LiveRaceState::default();
        assert_eq!(state.apply(snapshot()), StateChange::Snapshot);
        assert_eq!(state.status(), RaceStatus::Open);

        let mut b = runner("b", 5_000);
        b.status = ParticipantStatus::Playing;
        let change = state.apply(ServerMessage::PlayerUpdate(PlayerUpdate { player: b.clone() }));
        assert_eq!(change, StateChange::Player("b".into()));
        assert_eq!(state.participant("b"), Some(&b));
        assert_eq!(state.participants.len(), 2);

        state.apply(ServerMessage::PlayerUpdate(PlayerUpdate {
            player: runner("c", 10),
        }));
        assert_eq!(state.participants.len(), 3);

        state.apply(ServerMessage::RaceStatusChange(StatusChange {
            status: RaceStatus::Running,
            started_at: None,
        }));
        assert_eq!(state.status(), RaceStatus::Running);

        state.apply(ServerMessage::LeaderboardUpdate(LeaderboardUpdate {
            participants: vec![runner("b", 9), runner("a", 8), runner("b", 10)],
        }));
        let ids: Vec<&str> = state.participants.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(state.participant("b").map(|p| p.igt_ms), Some(10));

        assert_eq!(
            state.apply(ServerMessage::SpectatorCount(SpectatorCount { count: 7 })),
            StateChange::Spectators(7)
        );
        assert_eq!(state.spectator_count, Some(7));
    }

    #[test]
    fn status_before_snapshot_is_harmless() {
        let mut state = LiveRaceState::default();
        state.apply(ServerMessage::RaceStatusChange(StatusChange {
            status: RaceStatus::Finished,
            started_at: None,
        }));
        assert!(state.race.is_none());
        assert!(state.graph().unwrap().is_none());
    }

    #[test]
    fn subscribers_see_every_change_until_unsubscribed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = LiveRaceStore::new();
        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |state, change| {
            sink.lock()
                .unwrap()
                .push((change.clone(), state.participants.len()));
        });
        store.apply(snapshot());
        store.apply(ServerMessage::SpectatorCount(SpectatorCount { count: 3 }));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.apply(ServerMessage::SpectatorCount(SpectatorCount { count: 4 }));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(StateChange::Snapshot, 2), (StateChange::Spectators(3), 2)]
        );
        store.reset();
        assert_eq!(store.state(), &LiveRaceState::default());
    }
}
