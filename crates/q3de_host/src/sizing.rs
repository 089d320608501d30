//! Buffer capacity and horizon sizing.
//!
//! Runs independent trials in parallel with an unbounded event buffer and
//! records how many entries and how much latency the streaming decoder
//! actually used.

use crate::generator::{NoiseParams, PhenomenologicalSource};
use crate::stats::LatencyStats;
use anyhow::{Context, Result};
use q3de_common::DetectionEvent;
use q3de_core::{BatchGreedyMatcher, CostModel, DecoderConfig, StepOutcome, StreamingMatcher};
use rayon::prelude::*;
use std::time::Instant;
use tracing::info;

/// Per-trial resource usage.
#[derive(Debug, Clone)]
struct TrialUsage {
    events: usize,
    peak_occupancy: usize,
    max_span: u64,
    batch_latency: u64,
    latency: LatencyStats,
}

/// Aggregated resource usage over all trials.
#[derive(Debug, Clone)]
pub struct SizingReport {
    pub trials: u64,
    pub events: u64,
    pub peak_occupancy: usize,
    pub max_span: u64,
    pub max_batch_latency: u64,
    /// Trials whose peak occupancy exceeds the configured capacity.
    pub overflowing_trials: u64,
    pub latency: LatencyStats,
}

fn measure(model: CostModel, events: Vec<DetectionEvent>) -> Result<TrialUsage> {
    let mut matcher = StreamingMatcher::with_model(model, events.len().max(1));
    for &e in &events {
        matcher.push_event(e)?;
    }
    matcher.close_stream();

    let mut latency = LatencyStats::new();
    loop {
        match matcher.step()? {
            StepOutcome::Decided(commit) => latency.update(commit.latency),
            StepOutcome::Idle => {}
            StepOutcome::Starved | StepOutcome::Finished => break,
        }
    }
    let stats = matcher.stats();
    Ok(TrialUsage {
        events: events.len(),
        peak_occupancy: stats.peak_occupancy,
        max_span: stats.max_span,
        batch_latency: BatchGreedyMatcher::with_model(model).run(&events).max_latency,
        latency,
    })
}

pub fn run_sizing(
    config: &DecoderConfig,
    noise: NoiseParams,
    trials: u64,
    seed: u64,
) -> Result<SizingReport> {
    let model = config.cost_model().context("Invalid decoder configuration")?;
    info!(trials, distance = noise.distance, p = noise.p, "sizing");

    let start = Instant::now();
    let usages: Vec<TrialUsage> = (0..trials)
        .into_par_iter()
        .map(|trial| {
            let mut source = PhenomenologicalSource::new(noise, seed.wrapping_add(trial))?;
            measure(model, source.sample())
        })
        .collect::<Result<_>>()?;
    info!(elapsed = ?start.elapsed(), "sizing trials done");

    let mut report = SizingReport {
        trials,
        events: 0,
        peak_occupancy: 0,
        max_span: 0,
        max_batch_latency: 0,
        overflowing_trials: 0,
        latency: LatencyStats::new(),
    };
    for usage in &usages {
        report.events += usage.events as u64;
        report.peak_occupancy = report.peak_occupancy.max(usage.peak_occupancy);
        report.max_span = report.max_span.max(usage.max_span);
        report.max_batch_latency = report.max_batch_latency.max(usage.batch_latency);
        if usage.peak_occupancy > config.capacity {
            report.overflowing_trials += 1;
        }
        report.latency = report.latency.merge(&usage.latency);
    }
    Ok(report)
}

impl SizingReport {
    pub fn print_report(&self, capacity: usize) {
        println!("Sizing Results");
        println!("Trials: {}", self.trials);
        println!("Events: {}", self.events);
        println!("Peak occupancy: {} entries", self.peak_occupancy);
        println!("Widest resident span: {} cycles", self.max_span);
        println!("Batch horizon window: {} cycles", self.max_batch_latency);
        println!(
            "Trials overflowing {} entries: {}/{}",
            capacity, self.overflowing_trials, self.trials
        );
        self.latency.print_report();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_capacity_reports_overflowing_trials() {
        let noise = NoiseParams {
            distance: 5,
            cycles: 5,
            p: 0.05,
            anomaly: None,
        };
        let report = run_sizing(&DecoderConfig::new(5, 1), noise, 64, 11).unwrap();
        assert_eq!(report.trials, 64);
        assert!(report.events > 0);
        assert!(report.peak_occupancy >= 2);
        assert!(report.overflowing_trials > 0);
        assert_eq!(report.latency.max, report.max_batch_latency);
    }
}
