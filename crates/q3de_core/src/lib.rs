//! Real-time greedy matching decoders for surface codes with anomalous regions.
//!
//! This crate provides the path cost model, the bounded event buffer, the
//! streaming matcher that models the pipelined hardware decoder, the batch
//! reference matcher it is validated against, and the validation harness
//! that cross-checks the two. All modules are `no_std` so the decoder can be
//! embedded next to firmware as well as driven from host-side simulations.

#![no_std]

extern crate alloc;

use core::fmt;
use q3de_common::{Cost, EventId, MatchDecision};

/// Time-windowed greedy matcher over a complete event list.
///
/// Reference implementation of the decision policy without buffer or latency
/// limits. Used as the oracle the streaming matcher is compared against and
/// to size buffer capacity and horizon windows.
pub mod batch;

/// Construction-time decoder configuration.
///
/// Collects code distance, buffer capacity, anomaly region and cost mode,
/// and validates them into a cost model before any decoder is built.
pub mod config;

/// Path costs between events and from events to the code boundary.
///
/// Implements direct, boundary-routed and anomaly-routed costs with a fixed
/// evaluation order, so that every matcher resolves cost ties identically.
pub mod cost;

/// Bounded buffer of admitted, unmatched events.
///
/// Holds resident events in arrival order together with the floor and
/// horizon cursors that gate which decisions may be finalized.
pub mod event_buffer;

/// Streaming matcher modelling the pipelined hardware decoder.
///
/// Admits one input slot per step, advances the decode horizon and
/// finalizes at most one decision per step under a fixed buffer capacity.
pub mod streaming;

/// Cross-validation of the streaming matcher against the batch matcher.
///
/// Runs trials drawn from an external event source through both matchers
/// and reports decision-set mismatches.
pub mod validation;

/// A finalized decision with the cost it was committed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    /// The canonical decision.
    pub decision: MatchDecision,

    /// Cost of the chosen route; twice the boundary cost for boundary matches.
    pub cost: Cost,

    /// Cycles between the older participant's detection and the horizon at
    /// which the decision was finalized.
    pub latency: u64,
}

/// Invalid construction-time configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The code distance is zero.
    ZeroCodeDistance,

    /// The event buffer capacity is zero.
    ZeroCapacity,

    /// The anomaly box has a lower corner above its upper corner.
    ///
    /// Carries the axis name ('x', 'y' or 'z') that is inverted.
    InvertedRegion(char),

    /// The anomaly box extends outside the code patch.
    ///
    /// Spatial axes must lie within `[0, code_distance]` and the time axis
    /// must not start before cycle zero.
    RegionOutOfBounds(char),

    /// The normal weight is zero or the anomaly weight exceeds it.
    InvalidWeights,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCodeDistance => f.write_str("code distance must be positive"),
            ConfigError::ZeroCapacity => f.write_str("event buffer capacity must be positive"),
            ConfigError::InvertedRegion(axis) => {
                write!(f, "anomaly region is inverted along {}", axis)
            }
            ConfigError::RegionOutOfBounds(axis) => {
                write!(f, "anomaly region leaves the code patch along {}", axis)
            }
            ConfigError::InvalidWeights => {
                f.write_str("weights need normal >= 1 and anomaly <= normal")
            }
        }
    }
}

impl core::error::Error for ConfigError {}

/// Input handed to a streaming matcher that breaks its input contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamViolation {
    /// An event arrived with an earlier time than the event before it.
    OutOfOrder { event: EventId, time: i64, last: i64 },

    /// An event was detected before cycle zero.
    BeforeOrigin { event: EventId, time: i64 },

    /// An event was pushed after the stream was closed.
    Closed { event: EventId },
}

/// Error types returned by the matching decoders.
///
/// Every failure of a decoder run is one of these kinds. None of them is
/// recoverable by retrying: the matchers are deterministic, so the same input
/// and configuration fail the same way again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The configuration was rejected at construction.
    ///
    /// Raised before any event is processed, typically for an anomaly
    /// region that is inverted or lies outside the code patch.
    Configuration(ConfigError),

    /// An event was admitted while the event buffer was full.
    ///
    /// Fatal for the trial. Signals a buffer capacity that is too small for
    /// the event rate; events are never dropped silently.
    BufferOverflow {
        capacity: usize,
        event: EventId,
        time: i64,
    },

    /// The event stream broke the arrival-order contract.
    StreamViolation(StreamViolation),
}

impl From<ConfigError> for DecodeError {
    fn from(err: ConfigError) -> Self {
        DecodeError::Configuration(err)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Configuration(err) => write!(f, "invalid configuration: {}", err),
            DecodeError::BufferOverflow {
                capacity,
                event,
                time,
            } => write!(
                f,
                "event buffer overflow: {} at cycle {} with all {} entries resident",
                event, time, capacity
            ),
            DecodeError::StreamViolation(StreamViolation::OutOfOrder { event, time, last }) => {
                write!(
                    f,
                    "{} at cycle {} arrived after an event at cycle {}",
                    event, time, last
                )
            }
            DecodeError::StreamViolation(StreamViolation::BeforeOrigin { event, time }) => {
                write!(f, "{} at cycle {} precedes cycle 0", event, time)
            }
            DecodeError::StreamViolation(StreamViolation::Closed { event }) => {
                write!(f, "{} pushed after the stream was closed", event)
            }
        }
    }
}

impl core::error::Error for DecodeError {}

pub use batch::{BatchGreedyMatcher, BatchOutcome};
pub use config::{CostMode, DecoderConfig};
pub use cost::{
    AnomalyRegion, BoundaryAxis, BoundaryRoute, Candidate, CostModel, CostWeights, PairRoute,
};
pub use event_buffer::EventBuffer;
pub use streaming::{Cursors, Decisions, StepOutcome, StreamStats, StreamingMatcher};
pub use validation::{
    EventSource, ExactMatcher, MismatchDump, TrialRun, ValidationHarness, ValidationReport,
    canonicalize,
};
