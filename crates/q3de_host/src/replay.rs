use anyhow::{Context, Result};
use q3de_core::{DecoderConfig, ValidationHarness};
use q3de_io::dump::format_decisions;
use q3de_io::trace;
use tracing::info;

/// Replays a recorded trace through both matchers and prints every commit.
///
/// Returns whether the two decision sets agree.
pub fn run_replay(path: &str, config: &DecoderConfig) -> Result<bool> {
    let events = trace::load_trace(path)?;
    info!(path, events = events.len(), "replaying trace");

    let harness = ValidationHarness::new(config).context("Invalid decoder configuration")?;
    let run = harness
        .run_trial(&events)
        .with_context(|| format!("Streaming decode of {} failed", path))?;

    println!("Streaming commits");
    for commit in &run.streaming {
        println!(
            "  {:<20} cost {:>4}  latency {:>3}",
            commit.decision.to_string(),
            commit.cost,
            commit.latency
        );
    }
    println!("Batch commits");
    for commit in &run.batch.commits {
        println!(
            "  {:<20} cost {:>4}  latency {:>3}",
            commit.decision.to_string(),
            commit.cost,
            commit.latency
        );
    }

    let stats = run.stats;
    let boundary = run.streaming.iter().filter(|c| c.decision.is_boundary()).count();
    println!(
        "Steps: {}  Peak occupancy: {}  Widest span: {}  Max latency: {}",
        stats.steps, stats.peak_occupancy, stats.max_span, stats.max_latency
    );
    println!(
        "Pairs: {}  Boundary matches: {}",
        run.streaming.len() - boundary,
        boundary
    );

    let agrees = run.agrees();
    if agrees {
        println!("Decisions agree.");
    } else {
        println!("MISMATCH");
        println!("  streaming: {}", format_decisions(&run.streaming_decisions()));
        println!("  batch:     {}", format_decisions(&run.batch_decisions()));
    }
    Ok(agrees)
}
