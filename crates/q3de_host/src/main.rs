mod generator;
mod replay;
mod sizing;
mod stats;

use anyhow::{Context, Result, ensure};
use clap::{Args, Parser, Subcommand, ValueEnum};
use generator::{NoiseParams, PhenomenologicalSource};
use q3de_core::{
    AnomalyRegion, BoundaryAxis, CostMode, CostWeights, DecoderConfig, ValidationHarness,
};
use q3de_io::{dump, trace};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Axis {
    X,
    Y,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Direct,
    AnomalyAware,
}

#[derive(Args)]
struct DecoderArgs {
    #[arg(long, default_value_t = 5)]
    distance: u32,
    #[arg(long, default_value_t = 70)]
    capacity: usize,
    /// Anomaly box as lx,rx,ly,ry,lz,rz.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    anomaly: Option<Vec<i32>>,
    #[arg(long, default_value_t = 1)]
    normal_weight: u16,
    #[arg(long, default_value_t = 0)]
    anomaly_weight: u16,
    #[arg(long, value_enum, default_value_t = Axis::X)]
    axis: Axis,
    /// Defaults to anomaly-aware whenever --anomaly is given.
    #[arg(long, value_enum)]
    mode: Option<Mode>,
}

impl DecoderArgs {
    fn bounds(&self) -> Result<Option<[i32; 6]>> {
        self.anomaly
            .as_deref()
            .map(|b| <[i32; 6]>::try_from(b).context("--anomaly takes six bounds"))
            .transpose()
    }

    fn config(&self) -> Result<DecoderConfig> {
        let weights = CostWeights::new(self.normal_weight, self.anomaly_weight)
            .context("Invalid path weights")?;
        let axis = match self.axis {
            Axis::X => BoundaryAxis::X,
            Axis::Y => BoundaryAxis::Y,
        };
        let mut config = DecoderConfig::new(self.distance, self.capacity).with_axis(axis);
        config.weights = weights;
        if let Some(bounds) = self.bounds()? {
            config = config.with_anomaly(bounds, weights);
        }
        if let Some(Mode::Direct) = self.mode {
            config.mode = CostMode::Direct;
        } else if let Some(Mode::AnomalyAware) = self.mode {
            ensure!(config.anomaly.is_some(), "--mode anomaly-aware needs --anomaly");
        }
        config.cost_model().context("Invalid decoder configuration")?;
        Ok(config)
    }
}

#[derive(Args)]
struct NoiseArgs {
    #[arg(long, default_value_t = 9)]
    cycles: u32,
    #[arg(long, default_value_t = 0.01)]
    p: f64,
    /// Error probability inside the anomaly box.
    #[arg(long, default_value_t = 0.5)]
    p_anomaly: f64,
    #[arg(long, default_value_t = 12345)]
    seed: u64,
}

impl NoiseArgs {
    fn params(&self, decoder: &DecoderArgs) -> Result<NoiseParams> {
        let anomaly = match decoder.bounds()? {
            Some(bounds) => Some((
                AnomalyRegion::from_bounds(bounds, decoder.distance)
                    .context("Invalid anomaly region")?,
                self.p_anomaly,
            )),
            None => None,
        };
        Ok(NoiseParams {
            distance: decoder.distance,
            cycles: self.cycles,
            p: self.p,
            anomaly,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Cross-check streaming and batch decisions on synthetic trials.
    Validate {
        #[command(flatten)]
        decoder: DecoderArgs,
        #[command(flatten)]
        noise: NoiseArgs,
        #[arg(long, default_value_t = 1000)]
        trials: u64,
        /// Write a replayable dump of every mismatching trial here.
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },
    /// Measure buffer occupancy and commit latency without a capacity limit.
    Size {
        #[command(flatten)]
        decoder: DecoderArgs,
        #[command(flatten)]
        noise: NoiseArgs,
        #[arg(long, default_value_t = 10_000)]
        trials: u64,
    },
    /// Decode a recorded trace with both matchers.
    Replay {
        #[command(flatten)]
        decoder: DecoderArgs,
        trace: String,
    },
    /// Write synthetic trials as trace files.
    Gen {
        #[command(flatten)]
        decoder: DecoderArgs,
        #[command(flatten)]
        noise: NoiseArgs,
        #[arg(long, default_value_t = 10)]
        trials: u64,
        #[arg(long, default_value = "traces")]
        out: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::level_filters::LevelFilter::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate {
            decoder,
            noise,
            trials,
            dump_dir,
        } => {
            let config = decoder.config()?;
            let mut source = PhenomenologicalSource::new(noise.params(&decoder)?, noise.seed)?;
            let harness = ValidationHarness::new(&config)?.keep_dumps(dump_dir.is_some());

            info!(trials, distance = config.code_distance, "validating");
            let start = Instant::now();
            let report = harness.run(&mut source, trials)?;

            println!("Validation Results");
            println!("Time: {:.4} s", start.elapsed().as_secs_f64());
            println!("Trials: {}  Events: {}", report.trials, report.events);
            println!("Mismatches: {}/{}", report.mismatches, report.trials);
            println!("Agreement: {:.4}", report.agreement());
            println!("Peak occupancy: {}/{}", report.peak_occupancy, config.capacity);
            println!(
                "Max latency: streaming {} / batch {} cycles",
                report.max_streaming_latency, report.max_batch_latency
            );

            if let Some(dir) = dump_dir {
                for path in dump::save_dumps(&dir, &report.dumps)? {
                    println!("Wrote {}", path.display());
                }
            }
            if !report.passed() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Size {
            decoder,
            noise,
            trials,
        } => {
            let config = decoder.config()?;
            let report = sizing::run_sizing(&config, noise.params(&decoder)?, trials, noise.seed)?;
            report.print_report(config.capacity);
        }
        Commands::Replay { decoder, trace } => {
            if !replay::run_replay(&trace, &decoder.config()?)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Gen {
            decoder,
            noise,
            trials,
            out,
        } => {
            let params = noise.params(&decoder)?;
            let mut source = PhenomenologicalSource::new(params, noise.seed)?;
            std::fs::create_dir_all(&out)
                .with_context(|| format!("Failed to create {}", out.display()))?;

            println!(
                "Generating {} trials, distance {} over {} cycles (p={})...",
                trials, params.distance, params.cycles, params.p
            );
            let region = match params.anomaly {
                Some((region, p)) => {
                    format!("\nanomaly {} .. {} p {}", region.lo(), region.hi(), p)
                }
                None => String::new(),
            };
            for trial in 0..trials {
                let header = format!(
                    "trial {}\ndistance {} cycles {} p {} seed {}{}",
                    trial, params.distance, params.cycles, params.p, noise.seed, region
                );
                let path = out.join(format!("trial_{}.trace", trial));
                trace::save_trace(&path, &header, &source.sample())?;
            }
            println!("Done.");
        }
    }
    Ok(ExitCode::SUCCESS)
}
