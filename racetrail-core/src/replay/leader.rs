use super::PlayerSnapshot;
use crate::race::ParticipantId;

/// The furthest-progressed participant still in the race.
///
/// Frozen snapshots never lead. Ties on layer keep the earlier snapshot, so
/// callers decide tie order through the order they pass snapshots in.
#[must_use]
pub fn leader_of(snapshots: &[PlayerSnapshot]) -> Option<ParticipantId> {
    let mut leader: Option<&PlayerSnapshot> = None;
    for snapshot in snapshots.iter().filter(|s| !s.frozen) {
        if leader.is_none_or(|best| snapshot.layer > best.layer) {
            leader = Some(snapshot);
        }
    }
    leader.map(|s| s.participant_id.clone())
}
