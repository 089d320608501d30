//! Shared test utilities for q3de_core tests.
//!
//! Event builders, random trial sources and a brute-force exact matcher.

#![allow(dead_code)] // Not all test files use all helpers

use q3de_common::{Cost, DetectionEvent, EventId, MatchDecision, Position};
use q3de_core::{CostModel, DecodeError, DecoderConfig, EventSource, ExactMatcher, StreamingMatcher};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashSet;

/// Builds an event at `(x, y, z)` with the given boundary distance.
pub fn event(id: u32, x: i32, y: i32, z: i32, d_b: u32) -> DetectionEvent {
    DetectionEvent::new(id, Position::new(x, y, z), d_b)
}

/// Streams `events` through a fresh matcher and collects its decisions.
pub fn stream_decisions(
    config: &DecoderConfig,
    events: &[DetectionEvent],
) -> Result<Vec<MatchDecision>, DecodeError> {
    let mut matcher = StreamingMatcher::new(config)?;
    for &e in events {
        matcher.push_event(e)?;
    }
    matcher.close_stream();
    matcher.decisions().collect()
}

/// Checks that every event id appears in exactly one decision and nothing else does.
pub fn covers_each_once(events: &[DetectionEvent], decisions: &[MatchDecision]) -> bool {
    let expected: HashSet<EventId> = events.iter().map(|e| e.id).collect();
    let mut seen = HashSet::new();
    for d in decisions {
        let (a, b) = d.participants();
        for id in core::iter::once(a).chain(b) {
            if !seen.insert(id) {
                return false;
            }
        }
    }
    seen == expected
}

/// Sorts positions time-major and turns them into events with ids in that order.
///
/// The boundary distance is the distance to the nearer x face of a
/// distance-`distance` patch.
pub fn events_from_positions(mut positions: Vec<Position>, distance: i32) -> Vec<DetectionEvent> {
    positions.sort_by_key(Position::time_major);
    positions
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let d_b = p.x.min(distance - p.x).max(0) as u32;
            DetectionEvent::new(i as u32, p, d_b)
        })
        .collect()
}

/// Uniformly scattered events on a `distance × distance × cycles` block.
pub struct RandomSource {
    rng: Xoshiro256PlusPlus,
    distance: i32,
    cycles: i32,
    max_events: usize,
}

impl RandomSource {
    pub fn new(seed: u64, distance: i32, cycles: i32, max_events: usize) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            distance,
            cycles,
            max_events,
        }
    }
}

impl EventSource for RandomSource {
    fn next_trial(&mut self) -> Vec<DetectionEvent> {
        let count = self.rng.gen_range(0..=self.max_events);
        let positions = (0..count)
            .map(|_| {
                Position::new(
                    self.rng.gen_range(0..self.distance),
                    self.rng.gen_range(0..self.distance),
                    self.rng.gen_range(0..self.cycles),
                )
            })
            .collect();
        events_from_positions(positions, self.distance)
    }
}

/// Replays a fixed list of trials, cycling when exhausted.
pub struct VecSource {
    trials: Vec<Vec<DetectionEvent>>,
    next: usize,
}

impl VecSource {
    pub fn new(trials: Vec<Vec<DetectionEvent>>) -> Self {
        Self { trials, next: 0 }
    }
}

impl EventSource for VecSource {
    fn next_trial(&mut self) -> Vec<DetectionEvent> {
        if self.trials.is_empty() {
            return Vec::new();
        }
        let trial = self.trials[self.next % self.trials.len()].clone();
        self.next += 1;
        trial
    }
}

/// Exhaustive minimum-weight matching with boundary, for small trials only.
pub struct BruteForceExact;

impl BruteForceExact {
    fn solve(
        events: &[DetectionEvent],
        model: &CostModel,
        used: &mut [bool],
    ) -> (Cost, Vec<MatchDecision>) {
        let Some(i) = used.iter().position(|u| !u) else {
            return (0, Vec::new());
        };
        used[i] = true;

        let (rest, mut decisions) = Self::solve(events, model, used);
        let mut best_cost = rest.saturating_add(model.boundary_cost(&events[i]));
        decisions.push(MatchDecision::boundary(events[i].id));
        let mut best = decisions;

        for j in (i + 1)..events.len() {
            if used[j] {
                continue;
            }
            used[j] = true;
            let (rest, mut decisions) = Self::solve(events, model, used);
            let cost = rest.saturating_add(model.pair_cost(&events[i], &events[j]));
            if cost < best_cost {
                decisions.push(MatchDecision::pair(events[i].id, events[j].id));
                best_cost = cost;
                best = decisions;
            }
            used[j] = false;
        }

        used[i] = false;
        (best_cost, best)
    }
}

impl ExactMatcher for BruteForceExact {
    fn exact_match(&mut self, events: &[DetectionEvent], model: &CostModel) -> Vec<MatchDecision> {
        let mut used = vec![false; events.len()];
        Self::solve(events, model, &mut used).1
    }
}
