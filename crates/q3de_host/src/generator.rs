//! Synthetic detection events for decoder experiments.
//!
//! Samples phenomenological noise on a distance-d planar surface code over a
//! number of measurement rounds. Data errors flip the two detectors beside
//! the faulty qubit, or a single detector next to the x boundary;
//! measurement errors flip the same detector in consecutive rounds. Edges
//! inside an anomaly region fail with an elevated probability.
//!
//! Detectors sit at `x in 1..d`, `y in 0..d`, `z in 0..cycles`, with the code
//! boundary at `x = 0` and `x = d`.

use anyhow::{Result, ensure};
use bitvec::prelude::*;
use q3de_common::{DetectionEvent, Position};
use q3de_core::{AnomalyRegion, EventSource};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Noise model parameters of one experiment.
#[derive(Debug, Clone, Copy)]
pub struct NoiseParams {
    pub distance: u32,
    pub cycles: u32,
    /// Error probability of every edge outside the anomaly.
    pub p: f64,
    /// Elevated region and the error probability inside it.
    pub anomaly: Option<(AnomalyRegion, f64)>,
}

impl NoiseParams {
    fn validate(&self) -> Result<()> {
        ensure!(self.distance >= 2, "code distance must be at least 2");
        ensure!(self.cycles >= 1, "at least one measurement round is needed");
        ensure!((0.0..=1.0).contains(&self.p), "p must lie in [0, 1]");
        if let Some((region, p)) = self.anomaly {
            ensure!((0.0..=1.0).contains(&p), "anomaly p must lie in [0, 1]");
            ensure!(
                region.code_distance() == self.distance,
                "anomaly region was built for distance {}",
                region.code_distance()
            );
        }
        Ok(())
    }
}

/// Phenomenological noise sampler, one trial per call.
pub struct PhenomenologicalSource {
    params: NoiseParams,
    rng: Xoshiro256PlusPlus,
    detectors: BitVec,
}

impl PhenomenologicalSource {
    pub fn new(params: NoiseParams, seed: u64) -> Result<Self> {
        params.validate()?;
        let cells = (params.distance as usize - 1) * params.distance as usize;
        Ok(Self {
            params,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            detectors: bitvec![0; cells * params.cycles as usize],
        })
    }

    fn index(&self, x: i32, y: i32, z: i32) -> usize {
        let d = self.params.distance as usize;
        (z as usize * d + y as usize) * (d - 1) + (x as usize - 1)
    }

    fn position(&self, index: usize) -> Position {
        let d = self.params.distance as usize;
        let x = index % (d - 1) + 1;
        let y = (index / (d - 1)) % d;
        let z = index / ((d - 1) * d);
        Position::new(x as i32, y as i32, z as i32)
    }

    fn fails(&mut self, at: Position) -> bool {
        let p = match self.params.anomaly {
            Some((region, p_anomaly)) if region.contains(&at) => p_anomaly,
            _ => self.params.p,
        };
        self.rng.gen_bool(p)
    }

    fn flip(&mut self, x: i32, y: i32, z: i32) {
        let i = self.index(x, y, z);
        let bit = !self.detectors[i];
        self.detectors.set(i, bit);
    }

    /// Draws one trial, sorted by `(z, y, x)` with ids in that order.
    pub fn sample(&mut self) -> Vec<DetectionEvent> {
        self.detectors.fill(false);
        let d = self.params.distance as i32;
        let cycles = self.params.cycles as i32;

        for z in 0..cycles {
            for y in 0..d {
                // Data qubits along a row: x = 0 and x = d - 1 touch the boundary.
                for x in 0..d {
                    if !self.fails(Position::new(x, y, z)) {
                        continue;
                    }
                    if x > 0 {
                        self.flip(x, y, z);
                    }
                    if x + 1 < d {
                        self.flip(x + 1, y, z);
                    }
                }
                // Data qubits between rows.
                if y + 1 < d {
                    for x in 1..d {
                        if self.fails(Position::new(x, y, z)) {
                            self.flip(x, y, z);
                            self.flip(x, y + 1, z);
                        }
                    }
                }
                // Measurement errors.
                if z + 1 < cycles {
                    for x in 1..d {
                        if self.fails(Position::new(x, y, z)) {
                            self.flip(x, y, z);
                            self.flip(x, y, z + 1);
                        }
                    }
                }
            }
        }

        let ones: Vec<usize> = self.detectors.iter_ones().collect();
        ones.into_iter()
            .enumerate()
            .map(|(id, index)| {
                let p = self.position(index);
                let d_b = p.x.min(d - p.x) as u32;
                DetectionEvent::new(id as u32, p, d_b)
            })
            .collect()
    }
}

impl EventSource for PhenomenologicalSource {
    fn next_trial(&mut self) -> Vec<DetectionEvent> {
        self.sample()
    }
}
