use crate::config::DecoderConfig;
use crate::cost::CostModel;
use crate::{Commit, DecodeError};
use alloc::vec::Vec;
use q3de_common::{DetectionEvent, MatchDecision};
use tracing::trace;

/// Commits of one batch run, in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub commits: Vec<Commit>,
    /// Largest commit latency; the horizon window a streaming decoder needs.
    pub max_latency: u64,
}

impl BatchOutcome {
    pub fn decisions(&self) -> Vec<MatchDecision> {
        self.commits.iter().map(|c| c.decision).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// Time-windowed greedy matcher over a complete trial.
///
/// The horizon starts at the earliest event and advances one cycle at a
/// time. At each horizon the cheapest admissible candidate among the events
/// detected so far is committed, repeatedly, until none is left.
pub struct BatchGreedyMatcher {
    model: CostModel,
}

impl BatchGreedyMatcher {
    pub fn new(config: &DecoderConfig) -> Result<Self, DecodeError> {
        Ok(Self::with_model(config.cost_model()?))
    }

    pub fn with_model(model: CostModel) -> Self {
        Self { model }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.model
    }

    /// Matches every event of `events`, given in any order.
    pub fn run(&self, events: &[DetectionEvent]) -> BatchOutcome {
        let mut pool: Vec<DetectionEvent> = events
            .iter()
            .map(|&e| match (self.model.region(), e.anomaly) {
                (Some(region), None) => region.annotate(e),
                _ => e,
            })
            .collect();
        pool.sort_by_key(DetectionEvent::time);

        let mut outcome = BatchOutcome {
            commits: Vec::with_capacity(pool.len()),
            max_latency: 0,
        };
        let Some(mut horizon) = pool.first().map(DetectionEvent::time) else {
            return outcome;
        };

        while !pool.is_empty() {
            let mut ready = pool.partition_point(|e| e.time() <= horizon);
            while let Some(candidate) = self.model.best_admissible(horizon, &pool[..ready]) {
                let oldest = candidate.oldest_time(&pool);
                // Remove the higher slot first so the lower index stays valid.
                if let Some(j) = candidate.second {
                    pool.remove(j);
                    ready -= 1;
                }
                pool.remove(candidate.first);
                ready -= 1;

                let commit = Commit {
                    decision: candidate.decision,
                    cost: candidate.cost,
                    latency: horizon.abs_diff(oldest),
                };
                trace!(decision = %commit.decision, cost = commit.cost, horizon, "batch commit");
                outcome.max_latency = outcome.max_latency.max(commit.latency);
                outcome.commits.push(commit);
            }
            horizon += 1;
        }
        outcome
    }
}
