use crate::config::DecoderConfig;
use crate::cost::CostModel;
use crate::event_buffer::EventBuffer;
use crate::{Commit, DecodeError, StreamViolation};
use alloc::collections::VecDeque;
use core::iter::FusedIterator;
use q3de_common::{DetectionEvent, MatchDecision};
use tracing::{debug, trace};

/// Result of a single [`StreamingMatcher::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A decision was finalized in this step.
    Decided(Commit),
    /// A slot was consumed but nothing was admissible.
    Idle,
    /// The stream is open and no event is pending; nothing changed.
    Starved,
    /// The stream is closed and every event has been matched.
    Finished,
}

/// Snapshot of the three time cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursors {
    pub arrival: i64,
    pub floor: i64,
    pub horizon: i64,
}

/// Per-trial counters of a streaming run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamStats {
    /// Slots consumed.
    pub steps: u64,
    /// Decisions finalized.
    pub decisions: u64,
    /// Most events resident at once.
    pub peak_occupancy: usize,
    /// Widest gap between the arrival cursor and the oldest resident.
    pub max_span: u64,
    /// Largest commit latency.
    pub max_latency: u64,
}

/// Greedy matcher under a fixed buffer capacity, one input slot per step.
///
/// Models the pipelined hardware decoder: every step admits one slot of the
/// input stream, may advance the decode horizon, and finalizes at most one
/// decision. A fresh matcher is built for every trial.
pub struct StreamingMatcher {
    model: CostModel,
    buffer: EventBuffer,
    pending: VecDeque<DetectionEvent>,
    arrival_time: i64,
    last_pushed: Option<i64>,
    closed: bool,
    decided_last_step: bool,
    stats: StreamStats,
}

impl StreamingMatcher {
    pub fn new(config: &DecoderConfig) -> Result<Self, DecodeError> {
        let model = config.cost_model()?;
        Ok(Self::with_model(model, config.capacity))
    }

    /// Builds a matcher from an already validated cost model.
    pub fn with_model(model: CostModel, capacity: usize) -> Self {
        Self {
            model,
            buffer: EventBuffer::new(capacity),
            pending: VecDeque::new(),
            arrival_time: 0,
            last_pushed: None,
            closed: false,
            decided_last_step: false,
            stats: StreamStats::default(),
        }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.model
    }

    /// Enqueues `event` behind every event pushed before it.
    ///
    /// Events must arrive in non-decreasing time order, at or after cycle
    /// zero, and before [`close_stream`](Self::close_stream).
    pub fn push_event(&mut self, event: DetectionEvent) -> Result<(), DecodeError> {
        let time = event.time();
        if self.closed {
            return Err(violation(StreamViolation::Closed { event: event.id }));
        }
        if time < 0 {
            return Err(violation(StreamViolation::BeforeOrigin {
                event: event.id,
                time,
            }));
        }
        if let Some(last) = self.last_pushed.filter(|&last| time < last) {
            return Err(violation(StreamViolation::OutOfOrder {
                event: event.id,
                time,
                last,
            }));
        }
        self.last_pushed = Some(time);

        let event = match (self.model.region(), event.anomaly) {
            (Some(region), None) => region.annotate(event),
            _ => event,
        };
        self.pending.push_back(event);
        Ok(())
    }

    /// Marks the end of input. Remaining events drain through idle slots.
    pub fn close_stream(&mut self) {
        self.closed = true;
    }

    pub fn is_finished(&self) -> bool {
        self.closed && self.pending.is_empty() && self.buffer.is_empty()
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn cursors(&self) -> Cursors {
        Cursors {
            arrival: self.arrival_time,
            floor: self.buffer.floor_time(),
            horizon: self.buffer.horizon_time(),
        }
    }

    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    /// Performs one admit, advance, decide cycle.
    pub fn step(&mut self) -> Result<StepOutcome, DecodeError> {
        if self.is_finished() {
            return Ok(StepOutcome::Finished);
        }

        // Admit.
        let next_fits = self
            .pending
            .front()
            .is_some_and(|e| e.time() <= self.arrival_time + 1);
        if next_fits {
            if let Some(event) = self.pending.pop_front() {
                self.arrival_time = self.arrival_time.max(event.time());
                self.buffer.admit(event)?;
                trace!(event = event.id.0, time = event.time(), "admitted");
            }
        } else if !self.pending.is_empty() || self.closed {
            self.arrival_time += 1;
        } else {
            return Ok(StepOutcome::Starved);
        }
        self.stats.steps += 1;
        self.stats.peak_occupancy = self.stats.peak_occupancy.max(self.buffer.len());
        self.stats.max_span = self.stats.max_span.max(self.buffer.span(self.arrival_time));

        // Advance horizon.
        if !self.decided_last_step && self.arrival_time - self.buffer.horizon_time() > 1 {
            self.buffer.advance_horizon();
        }

        // Decide, once every event detected up to the horizon is resident.
        let horizon = self.buffer.horizon_time();
        let horizon_complete =
            self.arrival_time > horizon || (self.closed && self.pending.is_empty());
        if !horizon_complete {
            self.decided_last_step = false;
            return Ok(StepOutcome::Idle);
        }
        let Some(candidate) = self.model.best_admissible(horizon, &self.buffer) else {
            self.decided_last_step = false;
            return Ok(StepOutcome::Idle);
        };
        let oldest = candidate.oldest_time(&self.buffer);
        match candidate.second {
            Some(j) => {
                self.buffer.evict_pair(candidate.first, j);
            }
            None => {
                self.buffer.evict(candidate.first);
            }
        }
        self.decided_last_step = true;

        let commit = Commit {
            decision: candidate.decision,
            cost: candidate.cost,
            latency: horizon.abs_diff(oldest),
        };
        self.stats.decisions += 1;
        self.stats.max_latency = self.stats.max_latency.max(commit.latency);
        debug!(
            decision = %commit.decision,
            cost = commit.cost,
            horizon,
            latency = commit.latency,
            "commit"
        );
        Ok(StepOutcome::Decided(commit))
    }

    /// Lazily steps the matcher and yields every finalized decision.
    ///
    /// The iterator ends once the matcher is finished, starves for input, or
    /// reports an error. An error is yielded once and ends the iteration.
    pub fn decisions(&mut self) -> Decisions<'_> {
        Decisions {
            matcher: self,
            done: false,
        }
    }
}

fn violation(v: StreamViolation) -> DecodeError {
    DecodeError::StreamViolation(v)
}

/// Iterator returned by [`StreamingMatcher::decisions`].
pub struct Decisions<'a> {
    matcher: &'a mut StreamingMatcher,
    done: bool,
}

impl Iterator for Decisions<'_> {
    type Item = Result<MatchDecision, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.matcher.step() {
                Ok(StepOutcome::Decided(commit)) => return Some(Ok(commit.decision)),
                Ok(StepOutcome::Idle) => {}
                Ok(StepOutcome::Starved | StepOutcome::Finished) => self.done = true,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

impl FusedIterator for Decisions<'_> {}
