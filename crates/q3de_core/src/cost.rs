//! Path cost model for greedy matching.
//!
//! Computes the cost of pairing two detection events and of matching an
//! event to the code boundary. Paths may run directly through the lattice,
//! via the boundary, or through an anomaly region whose interior is charged
//! at a discounted rate. Every minimum is taken in a fixed evaluation order
//! so that independently written matchers agree on which route wins a tie.

use crate::ConfigError;
use q3de_common::{Cost, DetectionEvent, INFINITE_COST, MatchDecision, Position};

/// Spatial axis whose faces form the code boundary being matched against.
///
/// X-type and Z-type stabilizer lattices see the boundary along different
/// axes; the axis is plain data rather than a separate cost model per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryAxis {
    #[default]
    X,
    Y,
}

impl BoundaryAxis {
    #[inline(always)]
    pub fn coord(self, p: &Position) -> i32 {
        match self {
            BoundaryAxis::X => p.x,
            BoundaryAxis::Y => p.y,
        }
    }

    pub fn name(self) -> char {
        match self {
            BoundaryAxis::X => 'x',
            BoundaryAxis::Y => 'y',
        }
    }
}

/// Per-unit path weights inside and outside the anomaly region.
///
/// The discount ratio of the anomaly region is `anomaly / normal`. The
/// synthesized hardware uses `normal = 1, anomaly = 0`: crossing the anomaly
/// is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostWeights {
    /// Weight of one lattice step outside the anomaly. Also converts elapsed
    /// cycles into cost when checking the decode horizon.
    pub normal: u16,

    /// Weight of one lattice step between points of the anomaly region.
    pub anomaly: u16,
}

impl CostWeights {
    /// Weights of the synthesized hardware decoder.
    pub const HARDWARE: Self = Self {
        normal: 1,
        anomaly: 0,
    };

    pub fn new(normal: u16, anomaly: u16) -> Result<Self, ConfigError> {
        if normal == 0 || anomaly > normal {
            return Err(ConfigError::InvalidWeights);
        }
        Ok(Self { normal, anomaly })
    }

    #[inline(always)]
    fn normal(&self, units: u64) -> Cost {
        units.saturating_mul(u64::from(self.normal))
    }

    #[inline(always)]
    fn anomaly(&self, units: u64) -> Cost {
        units.saturating_mul(u64::from(self.anomaly))
    }
}

impl Default for CostWeights {
    fn default() -> Self {
        Self::HARDWARE
    }
}

/// Axis-aligned box of elevated error probability.
///
/// Spans `[lo.x, hi.x] × [lo.y, hi.y] × [lo.z, hi.z]` inclusive inside a code
/// patch of distance `code_distance`. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyRegion {
    lo: Position,
    hi: Position,
    code_distance: u32,
}

impl AnomalyRegion {
    /// Validates and builds a region.
    ///
    /// Rejects boxes inverted on any axis, spatial extents outside
    /// `[0, code_distance]`, and boxes that start before cycle zero.
    pub fn new(lo: Position, hi: Position, code_distance: u32) -> Result<Self, ConfigError> {
        let d = i64::from(code_distance);
        let axes = [('x', lo.x, hi.x), ('y', lo.y, hi.y), ('z', lo.z, hi.z)];
        for (name, l, r) in axes {
            if l > r {
                return Err(ConfigError::InvertedRegion(name));
            }
            if l < 0 {
                return Err(ConfigError::RegionOutOfBounds(name));
            }
            if name != 'z' && i64::from(r) > d {
                return Err(ConfigError::RegionOutOfBounds(name));
            }
        }
        Ok(Self {
            lo,
            hi,
            code_distance,
        })
    }

    /// Builds a region from per-axis bounds in `(lx, rx, ly, ry, lz, rz)` order.
    pub fn from_bounds(bounds: [i32; 6], code_distance: u32) -> Result<Self, ConfigError> {
        let [lx, rx, ly, ry, lz, rz] = bounds;
        Self::new(
            Position::new(lx, ly, lz),
            Position::new(rx, ry, rz),
            code_distance,
        )
    }

    pub fn lo(&self) -> Position {
        self.lo
    }

    pub fn hi(&self) -> Position {
        self.hi
    }

    pub fn code_distance(&self) -> u32 {
        self.code_distance
    }

    pub fn contains(&self, p: &Position) -> bool {
        self.nearest(p) == *p
    }

    /// Point of the region closest to `p`.
    pub fn nearest(&self, p: &Position) -> Position {
        p.clamp_into(&self.lo, &self.hi)
    }

    /// Manhattan distance from `p` to the region; zero inside it.
    pub fn distance_to(&self, p: &Position) -> u64 {
        p.manhattan(&self.nearest(p))
    }

    /// Shortest distance from the region to the code boundary along `axis`:
    /// `min(lo, d - hi)` on that axis.
    pub fn boundary_reach(&self, axis: BoundaryAxis) -> u64 {
        let low = u64::from(axis.coord(&self.lo).unsigned_abs());
        let high = (i64::from(self.code_distance) - i64::from(axis.coord(&self.hi))).unsigned_abs();
        low.min(high)
    }

    /// Returns `event` with its nearest anomaly point and distance attached.
    pub fn annotate(&self, event: DetectionEvent) -> DetectionEvent {
        let nearest = self.nearest(&event.position);
        event.with_anomaly(nearest, event.position.manhattan(&nearest))
    }
}

/// Route realizing a boundary cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryRoute {
    /// Straight to the nearest code boundary.
    Direct,
    /// Into the anomaly, across it, and out to the boundary.
    Anomaly,
}

/// Route realizing a pair cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRoute {
    /// Straight between the two events.
    Direct,
    /// Each event to the boundary independently.
    Boundary,
    /// Each event into the anomaly, joined through it.
    Anomaly,
}

/// Path cost model shared by every matcher.
///
/// Without a region every anomaly-routed term is [`INFINITE_COST`], which
/// reduces the model to direct and boundary routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostModel {
    weights: CostWeights,
    region: Option<AnomalyRegion>,
    axis: BoundaryAxis,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::direct()
    }
}

impl CostModel {
    /// Direct-mode model with the hardware weights.
    pub fn direct() -> Self {
        Self {
            weights: CostWeights::HARDWARE,
            region: None,
            axis: BoundaryAxis::X,
        }
    }

    /// Model that may route paths through `region`.
    pub fn anomaly_aware(region: AnomalyRegion, weights: CostWeights, axis: BoundaryAxis) -> Self {
        Self {
            weights,
            region: Some(region),
            axis,
        }
    }

    /// Direct-mode model with custom weights.
    pub fn with_weights(weights: CostWeights) -> Self {
        Self {
            weights,
            ..Self::direct()
        }
    }

    pub fn weights(&self) -> CostWeights {
        self.weights
    }

    pub fn region(&self) -> Option<&AnomalyRegion> {
        self.region.as_ref()
    }

    pub fn axis(&self) -> BoundaryAxis {
        self.axis
    }

    pub fn is_anomaly_aware(&self) -> bool {
        self.region.is_some()
    }

    /// Nearest anomaly point and distance for `event`, preferring the
    /// event's own annotation.
    fn anchor(&self, event: &DetectionEvent) -> Option<(Position, u64)> {
        let region = self.region.as_ref()?;
        Some(match event.anomaly {
            Some(a) => (a.nearest, a.distance),
            None => {
                let nearest = region.nearest(&event.position);
                (nearest, event.position.manhattan(&nearest))
            }
        })
    }

    /// Cheapest path from `event` to the code boundary and its route.
    pub fn boundary_cost_routed(&self, event: &DetectionEvent) -> (Cost, BoundaryRoute) {
        let direct = self.weights.normal(u64::from(event.distance_to_boundary));
        let routed = self.anomaly_boundary_cost(event);
        if routed < direct {
            (routed, BoundaryRoute::Anomaly)
        } else {
            (direct, BoundaryRoute::Direct)
        }
    }

    pub fn boundary_cost(&self, event: &DetectionEvent) -> Cost {
        self.boundary_cost_routed(event).0
    }

    /// Cost a boundary decision for `event` is charged and compared at.
    ///
    /// A boundary match is encoded as the event paired with itself, so both
    /// endpoints of the self-pair pay the boundary cost.
    pub fn boundary_match_cost(&self, event: &DetectionEvent) -> Cost {
        self.boundary_cost(event).saturating_mul(2)
    }

    fn anomaly_boundary_cost(&self, event: &DetectionEvent) -> Cost {
        let (Some(region), Some((_, d_a))) = (self.region.as_ref(), self.anchor(event)) else {
            return INFINITE_COST;
        };
        // The discounted leg spans the event's own coordinate to the face.
        let at = i64::from(self.axis.coord(&event.position));
        let lo = i64::from(self.axis.coord(&region.lo));
        let hi = i64::from(self.axis.coord(&region.hi));
        let d = i64::from(region.code_distance);

        let via_low = self
            .weights
            .normal(d_a.saturating_add(lo.unsigned_abs()))
            .saturating_add(self.weights.anomaly(at.abs_diff(lo)));
        let via_high = self
            .weights
            .normal(d_a.saturating_add((d - hi).unsigned_abs()))
            .saturating_add(self.weights.anomaly(hi.abs_diff(at)));
        via_low.min(via_high)
    }

    /// Cheapest path joining `a` and `b` and its route.
    ///
    /// Candidates are evaluated direct, boundary, anomaly; a later candidate
    /// replaces an earlier one only when strictly cheaper.
    pub fn pair_cost_routed(&self, a: &DetectionEvent, b: &DetectionEvent) -> (Cost, PairRoute) {
        let mut best = (
            self.weights.normal(a.position.manhattan(&b.position)),
            PairRoute::Direct,
        );

        let via_boundary = self.boundary_cost(a).saturating_add(self.boundary_cost(b));
        if via_boundary < best.0 {
            best = (via_boundary, PairRoute::Boundary);
        }

        let via_anomaly = self.anomaly_pair_cost(a, b);
        if via_anomaly < best.0 {
            best = (via_anomaly, PairRoute::Anomaly);
        }
        best
    }

    pub fn pair_cost(&self, a: &DetectionEvent, b: &DetectionEvent) -> Cost {
        self.pair_cost_routed(a, b).0
    }

    fn anomaly_pair_cost(&self, a: &DetectionEvent, b: &DetectionEvent) -> Cost {
        let (Some((qa, da)), Some((qb, db))) = (self.anchor(a), self.anchor(b)) else {
            return INFINITE_COST;
        };
        self.weights
            .normal(da.saturating_add(db))
            .saturating_add(self.weights.anomaly(qa.manhattan(&qb)))
    }

    /// Largest cost `event` may be committed at once the decode horizon has
    /// reached `horizon`, or `None` while the event lies beyond the horizon.
    #[inline(always)]
    pub fn slack(&self, horizon: i64, event: &DetectionEvent) -> Option<Cost> {
        let elapsed = horizon.checked_sub(event.time())?;
        u64::try_from(elapsed).ok().map(|e| self.weights.normal(e))
    }

    /// Whether `cost` fits the slack of `event` at `horizon`.
    #[inline(always)]
    pub fn admits(&self, horizon: i64, event: &DetectionEvent, cost: Cost) -> bool {
        cost != INFINITE_COST && self.slack(horizon, event).is_some_and(|s| cost <= s)
    }

    /// Minimum-key candidate among `events` that is admissible at `horizon`
    /// for all of its participants.
    ///
    /// Every pair and every self-pair (boundary match) is considered. Keys
    /// compare by cost, then by canonical decision.
    pub fn best_admissible(&self, horizon: i64, events: &[DetectionEvent]) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for (i, a) in events.iter().enumerate() {
            if self.slack(horizon, a).is_none() {
                continue;
            }
            for (j, b) in events.iter().enumerate().skip(i) {
                let (cost, decision, second) = if i == j {
                    (self.boundary_match_cost(a), MatchDecision::boundary(a.id), None)
                } else {
                    (self.pair_cost(a, b), MatchDecision::pair(a.id, b.id), Some(j))
                };
                if !self.admits(horizon, a, cost) || !self.admits(horizon, b, cost) {
                    continue;
                }
                let candidate = Candidate {
                    first: i,
                    second,
                    decision,
                    cost,
                };
                if best.is_none_or(|cur| candidate.key() < cur.key()) {
                    best = Some(candidate);
                }
            }
        }
        best
    }
}

/// An admissible decision found by [`CostModel::best_admissible`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Index of the first participant in the scanned slice.
    pub first: usize,
    /// Index of the second participant; `None` for a boundary match.
    pub second: Option<usize>,
    pub decision: MatchDecision,
    pub cost: Cost,
}

impl Candidate {
    #[inline(always)]
    fn key(&self) -> (Cost, MatchDecision) {
        (self.cost, self.decision)
    }

    /// Time of the older participant.
    pub fn oldest_time(&self, events: &[DetectionEvent]) -> i64 {
        let first = events[self.first].time();
        self.second.map_or(first, |j| first.min(events[j].time()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_reach_takes_nearer_face() {
        let r = AnomalyRegion::from_bounds([1, 2, 2, 4, 1, 3], 7).unwrap();
        assert_eq!(r.boundary_reach(BoundaryAxis::X), 1);
        assert_eq!(r.boundary_reach(BoundaryAxis::Y), 2);
    }

    #[test]
    fn slack_is_none_beyond_horizon() {
        let m = CostModel::direct();
        let e = DetectionEvent::new(0, Position::new(0, 0, 5), 1);
        assert_eq!(m.slack(4, &e), None);
        assert_eq!(m.slack(5, &e), Some(0));
        assert!(!m.admits(9, &e, INFINITE_COST));
    }
}
