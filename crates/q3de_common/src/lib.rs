//! Common definitions shared by the matching decoder, its I/O layer and the
//! experiment drivers.
//!
//! This crate provides the lattice position type, the detection events that
//! flow into the decoders, the match decisions that flow out of them, the
//! integer cost domain, and the reference constants of the pipelined hardware
//! decoder that the streaming model mirrors.

#![no_std]

use core::fmt;

/// Integer path costs shared by every cost computation.
///
/// Costs are unsigned and all additions saturate, so an unreachable route
/// stays at [`INFINITE_COST`](cost::INFINITE_COST) no matter what is added to it.
pub mod cost {
    /// Path cost between lattice positions, in weighted Manhattan units.
    pub type Cost = u64;

    /// Cost of a route that does not exist.
    ///
    /// Returned for anomaly-routed paths when no anomaly region is configured
    /// or the cost model runs in direct mode. Never admissible.
    pub const INFINITE_COST: Cost = Cost::MAX;
}

/// Reference parameters of the pipelined hardware decoder.
///
/// The streaming matcher is a software model of an FPGA pipeline. These
/// constants record the configuration that pipeline was synthesized with, and
/// serve as defaults for the experiment drivers.
pub mod hw {
    /// Node buffer entries of the synthesized decoder.
    ///
    /// Seventy entries cover a distance-11 code at the error rates studied.
    /// Drivers use this as the default event buffer capacity.
    pub const DEFAULT_BUFFER_ENTRIES: usize = 70;

    /// Code distance the reference decoder was synthesized for.
    pub const DEFAULT_CODE_DISTANCE: u32 = 7;

    /// Measurement cycles per trial in the reference testbench.
    pub const DEFAULT_CYCLES: u32 = 9;
}

/// Detection events: the decoder input.
pub mod event {
    use super::fmt;

    /// Identifier of a detection event within one trial.
    ///
    /// Ids are unique per trial. They are the tie-break order of both
    /// matchers, so two matchers fed the same events with the same ids make
    /// the same decisions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct EventId(pub u32);

    impl fmt::Display for EventId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "e{}", self.0)
        }
    }

    /// Point on the three-dimensional decoding lattice.
    ///
    /// `x` and `y` are spatial coordinates and `z` is the measurement cycle.
    /// The decoder only ever measures Manhattan distances between positions
    /// and clamps them into boxes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Position {
        pub x: i32,
        pub y: i32,
        pub z: i32,
    }

    impl Position {
        pub const fn new(x: i32, y: i32, z: i32) -> Self {
            Self { x, y, z }
        }

        /// Manhattan distance to `other`.
        pub fn manhattan(&self, other: &Position) -> u64 {
            u64::from(self.x.abs_diff(other.x))
                + u64::from(self.y.abs_diff(other.y))
                + u64::from(self.z.abs_diff(other.z))
        }

        /// Clamps every coordinate into the box spanned by `lo` and `hi`.
        ///
        /// The box must not be inverted on any axis.
        pub fn clamp_into(&self, lo: &Position, hi: &Position) -> Position {
            Position {
                x: self.x.clamp(lo.x, hi.x),
                y: self.y.clamp(lo.y, hi.y),
                z: self.z.clamp(lo.z, hi.z),
            }
        }

        /// Sort key ordering positions by cycle first, then row, then column.
        ///
        /// This is the order in which a syndrome extraction pipeline emits
        /// events, and the order event ids are assigned in.
        pub fn time_major(&self) -> (i32, i32, i32) {
            (self.z, self.y, self.x)
        }
    }

    impl fmt::Display for Position {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "({},{},{})", self.x, self.y, self.z)
        }
    }

    /// Precomputed relation between an event and the anomaly region.
    ///
    /// The hardware input stream carries these two values alongside each
    /// event so the decoder never clamps positions itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AnomalyAnnotation {
        /// Point of the anomaly region closest to the event.
        pub nearest: Position,
        /// Manhattan distance from the event to `nearest`.
        pub distance: u64,
    }

    /// A detected parity violation, the unit of decoder input.
    ///
    /// Produced by the syndrome extraction pipeline and consumed exactly once
    /// by a matcher.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DetectionEvent {
        /// Identifier, unique within a trial.
        pub id: EventId,

        /// Lattice position; `position.z` is the cycle the event was detected in.
        pub position: Position,

        /// Shortest path length from the event to the code boundary.
        pub distance_to_boundary: u32,

        /// Optional precomputed nearest anomaly point and distance.
        ///
        /// When absent and the decoder is anomaly aware, the decoder derives
        /// both from its configured region.
        pub anomaly: Option<AnomalyAnnotation>,
    }

    impl DetectionEvent {
        pub fn new(id: u32, position: Position, distance_to_boundary: u32) -> Self {
            Self {
                id: EventId(id),
                position,
                distance_to_boundary,
                anomaly: None,
            }
        }

        /// Attaches a precomputed anomaly annotation.
        pub fn with_anomaly(mut self, nearest: Position, distance: u64) -> Self {
            self.anomaly = Some(AnomalyAnnotation { nearest, distance });
            self
        }

        /// Detection cycle of the event.
        #[inline(always)]
        pub fn time(&self) -> i64 {
            i64::from(self.position.z)
        }
    }
}

/// Match decisions: the decoder output.
pub mod decision {
    use super::event::EventId;
    use super::fmt;

    /// The other endpoint of a match.
    ///
    /// Variants are ordered so that every event sorts before the boundary,
    /// which makes a pairing win a cost tie against a boundary match of the
    /// same event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum Partner {
        /// Matched with another detection event.
        Event(EventId),
        /// Matched to the virtual code boundary.
        Boundary,
    }

    impl fmt::Display for Partner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Partner::Event(id) => write!(f, "{}", id),
                Partner::Boundary => f.write_str("BOUNDARY"),
            }
        }
    }

    /// A single correction decision.
    ///
    /// Every event of a trial appears in exactly one decision, either as
    /// `event` or as the partner of another event. Decisions built through
    /// [`MatchDecision::pair`] and [`MatchDecision::boundary`] are canonical:
    /// the lower id is always in `event`. The derived ordering on canonical
    /// decisions is the tie-break order shared by every matcher.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct MatchDecision {
        pub event: EventId,
        pub partner: Partner,
    }

    impl MatchDecision {
        /// Decision pairing two distinct events, lower id first.
        pub fn pair(a: EventId, b: EventId) -> Self {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            Self {
                event: lo,
                partner: Partner::Event(hi),
            }
        }

        /// Decision matching an event to the boundary.
        pub fn boundary(id: EventId) -> Self {
            Self {
                event: id,
                partner: Partner::Boundary,
            }
        }

        /// Returns the same decision with the lower id first.
        pub fn canonical(self) -> Self {
            match self.partner {
                Partner::Event(other) => Self::pair(self.event, other),
                Partner::Boundary => self,
            }
        }

        /// Event ids taking part in this decision.
        pub fn participants(&self) -> (EventId, Option<EventId>) {
            match self.partner {
                Partner::Event(other) => (self.event, Some(other)),
                Partner::Boundary => (self.event, None),
            }
        }

        pub fn is_boundary(&self) -> bool {
            self.partner == Partner::Boundary
        }
    }

    impl fmt::Display for MatchDecision {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{} - {}", self.event, self.partner)
        }
    }
}

pub use cost::{Cost, INFINITE_COST};
pub use decision::{MatchDecision, Partner};
pub use event::{AnomalyAnnotation, DetectionEvent, EventId, Position};
