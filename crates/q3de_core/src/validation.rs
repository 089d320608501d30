use crate::batch::{BatchGreedyMatcher, BatchOutcome};
use crate::config::DecoderConfig;
use crate::cost::CostModel;
use crate::streaming::{StepOutcome, StreamStats, StreamingMatcher};
use crate::{Commit, DecodeError};
use alloc::vec::Vec;
use q3de_common::{DetectionEvent, MatchDecision};
use tracing::{debug, warn};

/// Supplier of trials, standing in for the syndrome extraction pipeline.
pub trait EventSource {
    /// Events of the next trial in non-decreasing time order, ids unique.
    fn next_trial(&mut self) -> Vec<DetectionEvent>;
}

/// Exact minimum-weight matcher used as a quality ceiling.
pub trait ExactMatcher {
    fn exact_match(&mut self, events: &[DetectionEvent], model: &CostModel) -> Vec<MatchDecision>;
}

/// Normalizes orientation and order of a decision list for comparison.
pub fn canonicalize<I>(decisions: I) -> Vec<MatchDecision>
where
    I: IntoIterator<Item = MatchDecision>,
{
    let mut out: Vec<MatchDecision> = decisions.into_iter().map(MatchDecision::canonical).collect();
    out.sort_unstable();
    out
}

/// Both decision lists of a failing trial, with the events that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchDump {
    pub trial: u64,
    pub events: Vec<DetectionEvent>,
    pub streaming: Vec<MatchDecision>,
    pub batch: Vec<MatchDecision>,
}

/// One trial decoded by both matchers.
#[derive(Debug, Clone)]
pub struct TrialRun {
    /// Streaming commits in the order they were finalized.
    pub streaming: Vec<Commit>,
    pub stats: StreamStats,
    pub batch: BatchOutcome,
}

impl TrialRun {
    pub fn streaming_decisions(&self) -> Vec<MatchDecision> {
        canonicalize(self.streaming.iter().map(|c| c.decision))
    }

    pub fn batch_decisions(&self) -> Vec<MatchDecision> {
        canonicalize(self.batch.decisions())
    }

    pub fn agrees(&self) -> bool {
        self.streaming_decisions() == self.batch_decisions()
    }
}

/// Aggregate result of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub trials: u64,
    pub events: u64,
    /// Trials whose streaming and batch decisions differ.
    pub mismatches: u64,
    /// Trials checked against the exact matcher.
    pub exact_trials: u64,
    /// Trials whose greedy decisions differ from the exact matching.
    pub exact_disagreements: u64,
    pub peak_occupancy: usize,
    pub max_streaming_latency: u64,
    pub max_batch_latency: u64,
    /// Retained only when dumps are enabled.
    pub dumps: Vec<MismatchDump>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.mismatches == 0
    }

    /// Fraction of trials on which both matchers agree.
    pub fn agreement(&self) -> f64 {
        if self.trials == 0 {
            return 1.0;
        }
        (self.trials - self.mismatches) as f64 / self.trials as f64
    }
}

/// Cross-checks the streaming matcher against the batch matcher.
pub struct ValidationHarness {
    model: CostModel,
    capacity: usize,
    keep_dumps: bool,
}

impl ValidationHarness {
    pub fn new(config: &DecoderConfig) -> Result<Self, DecodeError> {
        Ok(Self {
            model: config.cost_model()?,
            capacity: config.capacity,
            keep_dumps: false,
        })
    }

    /// Retains a [`MismatchDump`] for every failing trial.
    pub fn keep_dumps(mut self, keep: bool) -> Self {
        self.keep_dumps = keep;
        self
    }

    /// Decodes one trial with a fresh streaming matcher and the batch matcher.
    pub fn run_trial(&self, events: &[DetectionEvent]) -> Result<TrialRun, DecodeError> {
        let mut matcher = StreamingMatcher::with_model(self.model, self.capacity);
        for &event in events {
            matcher.push_event(event)?;
        }
        matcher.close_stream();

        let mut streaming = Vec::with_capacity(events.len());
        loop {
            match matcher.step()? {
                StepOutcome::Decided(commit) => streaming.push(commit),
                StepOutcome::Idle => {}
                StepOutcome::Starved | StepOutcome::Finished => break,
            }
        }

        Ok(TrialRun {
            streaming,
            stats: matcher.stats(),
            batch: BatchGreedyMatcher::with_model(self.model).run(events),
        })
    }

    /// Runs `trials` trials drawn from `source`.
    ///
    /// A buffer overflow or a malformed trial aborts the whole run.
    pub fn run<S: EventSource + ?Sized>(
        &self,
        source: &mut S,
        trials: u64,
    ) -> Result<ValidationReport, DecodeError> {
        self.run_inner(source, trials, None)
    }

    /// Like [`run`](Self::run), also comparing every trial to `exact`.
    pub fn run_with_exact<S: EventSource + ?Sized>(
        &self,
        source: &mut S,
        trials: u64,
        exact: &mut dyn ExactMatcher,
    ) -> Result<ValidationReport, DecodeError> {
        self.run_inner(source, trials, Some(exact))
    }

    fn run_inner<S: EventSource + ?Sized>(
        &self,
        source: &mut S,
        trials: u64,
        mut exact: Option<&mut dyn ExactMatcher>,
    ) -> Result<ValidationReport, DecodeError> {
        let mut report = ValidationReport::default();

        for trial in 0..trials {
            let events = source.next_trial();
            let run = self.run_trial(&events)?;

            report.trials += 1;
            report.events += events.len() as u64;
            report.peak_occupancy = report.peak_occupancy.max(run.stats.peak_occupancy);
            report.max_streaming_latency = report.max_streaming_latency.max(run.stats.max_latency);
            report.max_batch_latency = report.max_batch_latency.max(run.batch.max_latency);

            let streaming = run.streaming_decisions();
            let batch = run.batch_decisions();

            if let Some(exact) = exact.as_deref_mut() {
                report.exact_trials += 1;
                if canonicalize(exact.exact_match(&events, &self.model)) != batch {
                    report.exact_disagreements += 1;
                }
            }

            if streaming != batch {
                report.mismatches += 1;
                warn!(trial, events = events.len(), "streaming and batch decisions differ");
                if self.keep_dumps {
                    report.dumps.push(MismatchDump {
                        trial,
                        events,
                        streaming,
                        batch,
                    });
                }
            } else {
                debug!(trial, decisions = batch.len(), "trial agrees");
            }
        }
        Ok(report)
    }
}
