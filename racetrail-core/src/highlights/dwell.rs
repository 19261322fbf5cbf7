//! Per-zone dwell samples and running statistics.
use std::collections::BTreeMap;

use crate::graph::{NodeId, NodeKind, ProgressionGraph};
use crate::numbers::ms_to_f64;
use crate::participant::ReplayParticipant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DwellSample {
    /// Index into the participant slice the table was built from.
    pub participant: usize,
    pub dwell_ms: u64,
    pub deaths: u32,
}

/// Completed dwell per participant per zone. Start zones are left out and a
/// still-running participant's current zone does not count until they leave.
#[derive(Debug, Clone, Default)]
pub(crate) struct DwellTable {
    pub by_node: BTreeMap<NodeId, Vec<DwellSample>>,
    pub by_participant: Vec<BTreeMap<NodeId, u64>>,
}

impl DwellTable {
    pub fn build(participants: &[ReplayParticipant], graph: &ProgressionGraph) -> Self {
        let mut table = Self::default();
        for (index, participant) in participants.iter().enumerate() {
            let mut totals: BTreeMap<NodeId, (u64, u32)> = BTreeMap::new();
            for visit in &participant.zone_visits {
                if visit.is_last && !participant.finished {
                    continue;
                }
                if graph.kind_of(&visit.node_id) == Some(&NodeKind::Start) {
                    continue;
                }
                let slot = totals.entry(visit.node_id.clone()).or_default();
                slot.0 += visit.duration_ms();
                slot.1 += visit.deaths;
            }
            let mut dwell_only = BTreeMap::new();
            for (node, (dwell_ms, deaths)) in totals {
                table.by_node.entry(node.clone()).or_default().push(DwellSample {
                    participant: index,
                    dwell_ms,
                    deaths,
                });
                dwell_only.insert(node, dwell_ms);
            }
            table.by_participant.push(dwell_only);
        }
        table
    }

    /// Zones with enough samples to compare against the field.
    pub fn contested(&self) -> impl Iterator<Item = (&NodeId, &[DwellSample])> {
        self.by_node
            .iter()
            .filter(|(_, samples)| samples.len() >= 2)
            .map(|(node, samples)| (node, samples.as_slice()))
    }
}

/// Welford accumulator for mean and sample variance.
#[derive(Debug, Default, Clone)]
pub(crate) struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    pub const fn count(&self) -> u32 {
        self.count
    }

    pub const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / f64::from(self.count - 1)
        } else {
            0.0
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Stats over every sample except the one at `skip`.
    pub fn excluding(samples: &[DwellSample], skip: usize, value: impl Fn(&DwellSample) -> f64) -> Self {
        let mut stats = Self::default();
        for (i, sample) in samples.iter().enumerate() {
            if i != skip {
                stats.add(value(sample));
            }
        }
        stats
    }

    /// Standard score of `value` against these stats, when the spread allows one.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        let std_dev = self.std_dev();
        (self.count >= 2 && std_dev > 0.0).then(|| (value - self.mean()) / std_dev)
    }
}

pub(crate) fn dwell_value(sample: &DwellSample) -> f64 {
    ms_to_f64(sample.dwell_ms)
}

pub(crate) fn death_value(sample: &DwellSample) -> f64 {
    f64::from(sample.deaths)
}
