//! kompas-sim: run the rhythm engine offline
//!
//! Drives `SequencerEngine` with a synthetic clock and prints what the three
//! outputs do on every step:
//!
//! - `run`: step-by-step gate outputs for a number of clock steps
//! - `patterns`: the patterns held by each channel after a number of steps
//! - `schema`: JSON schema of the engine configuration

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use kompas_core::{
    Channel, CvMode, CvRange, EngineConfig, EngineInputs, EngineOutputs, FULL_SCALE,
    SequencerEngine,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Offline runner for the kompas rhythm engine
#[derive(Parser)]
#[command(name = "kompas-sim")]
#[command(about = "Run the kompas rhythm engine against a synthetic clock")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum CvModeArg {
    Density,
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum CvRangeArg {
    /// 0-10V
    Legacy,
    /// 0-5V
    Revised,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the gate outputs step by step
    Run(SimArgs),

    /// Print the patterns each channel holds after the run
    Patterns(SimArgs),

    /// Print the JSON schema of the engine configuration
    Schema,
}

#[derive(Args, Clone)]
struct SimArgs {
    /// Engine configuration as JSON; dial and mode flags override it
    #[arg(long)]
    config: Option<String>,

    /// Primary density dial (0-1023)
    #[arg(short, long)]
    primary: Option<f32>,

    /// Secondary density dial (0-1023)
    #[arg(short, long)]
    secondary: Option<f32>,

    /// Derived density dial (0-1023)
    #[arg(short, long)]
    derived: Option<f32>,

    /// Constant control voltages, comma separated: primary,secondary,derived
    #[arg(long, value_delimiter = ',', num_args = 1..=3)]
    cv: Vec<f32>,

    #[arg(long)]
    cv_mode: Option<CvModeArg>,

    #[arg(long)]
    cv_range: Option<CvRangeArg>,

    /// Number of clock steps to run
    #[arg(short = 'n', long, default_value_t = 32)]
    steps: u32,

    /// Clock tempo in BPM (four steps per beat)
    #[arg(long, default_value_t = 120.0)]
    bpm: f32,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 48_000.0)]
    sample_rate: f32,

    /// Send a reset pulse before every Nth step
    #[arg(long)]
    reset_every: Option<u32>,

    /// Seed for the random thresholds
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct StepRecord {
    step: u32,
    cursor: usize,
    outputs: [f32; 3],
    densities: [i32; 3],
}

#[derive(Serialize)]
struct PatternRecord {
    channel: Channel,
    density: i32,
    active: usize,
    pattern: String,
}

impl SimArgs {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(json) => EngineConfig::from_json(json)?,
            None => EngineConfig::default(),
        };
        for (channel, value) in [
            (Channel::Primary, self.primary),
            (Channel::Secondary, self.secondary),
            (Channel::Derived, self.derived),
        ] {
            if let Some(value) = value {
                config.set_param(channel, value);
            }
        }
        if let Some(mode) = self.cv_mode {
            config.cv_mode = match mode {
                CvModeArg::Density => CvMode::Density,
                CvModeArg::Reset => CvMode::Reset,
            };
        }
        if let Some(range) = self.cv_range {
            config.cv_range = match range {
                CvRangeArg::Legacy => CvRange::Legacy,
                CvRangeArg::Revised => CvRange::Revised,
            };
        }
        Ok(config)
    }

    fn cv(&self) -> [f32; 3] {
        let mut cv = [0.0; 3];
        for (slot, value) in cv.iter_mut().zip(self.cv.iter()) {
            *slot = *value;
        }
        cv
    }

    fn samples_per_step(&self) -> Result<u64> {
        if self.bpm <= 0.0 || self.sample_rate <= 0.0 {
            bail!("bpm and sample rate must be positive");
        }
        let steps_per_second = self.bpm / 60.0 * 4.0;
        let samples = (self.sample_rate / steps_per_second) as u64;
        if samples < 2 {
            bail!("clock too fast for a {} Hz sample rate", self.sample_rate);
        }
        Ok(samples)
    }
}

/// Runs the engine for `args.steps` clock periods, calling `on_step` with the
/// outputs sampled halfway through each high phase. An error from `on_step`
/// stops the run.
fn simulate(
    args: &SimArgs,
    mut on_step: impl FnMut(u32, &SequencerEngine, &EngineOutputs) -> Result<()>,
) -> Result<SequencerEngine> {
    let config = args.engine_config().context("invalid engine configuration")?;
    let mut engine = match args.seed {
        Some(seed) => SequencerEngine::with_seed(config, seed),
        None => SequencerEngine::new(config),
    };

    let samples_per_step = args.samples_per_step()?;
    let high_samples = samples_per_step / 2;
    let sample_time = 1.0 / args.sample_rate;
    let cv = args.cv();

    tracing::info!(
        steps = args.steps,
        samples_per_step,
        config = ?engine.config(),
        "starting simulation"
    );

    for step in 0..args.steps {
        let reset = match args.reset_every {
            Some(n) if n > 0 && step % n == 0 => 10.0,
            _ => 0.0,
        };

        // Reset rises during the low phase, ahead of the clock edge.
        for i in 0..samples_per_step - high_samples {
            let inputs = EngineInputs {
                cv,
                reset: if i == 0 { 0.0 } else { reset },
                clock: 0.0,
            };
            engine.process(&inputs, sample_time);
        }
        for i in 0..high_samples {
            let inputs = EngineInputs {
                cv,
                reset: 0.0,
                clock: 10.0,
            };
            let outputs = *engine.process(&inputs, sample_time);
            if i == high_samples / 2 {
                on_step(step, &engine, &outputs)?;
            }
        }
    }

    Ok(engine)
}

fn gate_cell(value: f32) -> colored::ColoredString {
    if value >= FULL_SCALE {
        "■".yellow().bold()
    } else {
        "·".dimmed()
    }
}

fn run(args: &SimArgs, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Table {
        println!(
            "{:>5} {:>6}  {:^3} {:^3} {:^3}  {}",
            "step", "cursor", "pri", "sec", "der", "density"
        );
    }

    simulate(args, |step, engine, outputs| {
        let cursor = engine.cursor(Channel::Primary);
        let densities = Channel::ALL.map(|c| engine.density(c));
        match format {
            OutputFormat::Table => println!(
                "{:>5} {:>6}  {:^3} {:^3} {:^3}  {}",
                step,
                cursor,
                gate_cell(outputs.step(Channel::Primary)),
                gate_cell(outputs.step(Channel::Secondary)),
                gate_cell(outputs.step(Channel::Derived)),
                format!("{:?}", densities).dimmed(),
            ),
            OutputFormat::Json => {
                let record = StepRecord {
                    step,
                    cursor,
                    outputs: outputs.steps,
                    densities,
                };
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Ok(())
    })?;
    Ok(())
}

fn patterns(args: &SimArgs, format: OutputFormat) -> Result<()> {
    let engine = simulate(args, |_, _, _| Ok(()))?;

    for channel in Channel::ALL {
        let pattern = engine.pattern(channel);
        match format {
            OutputFormat::Table => {
                let cells: String = pattern
                    .iter()
                    .map(|on| if on { "■".yellow().to_string() } else { "·".dimmed().to_string() })
                    .collect();
                println!(
                    "{:>10} {:>5}  {}  {}",
                    channel.name().cyan(),
                    engine.density(channel),
                    cells,
                    format!("({} on)", pattern.active_count()).dimmed(),
                );
            }
            OutputFormat::Json => {
                let record = PatternRecord {
                    channel,
                    density: engine.density(channel),
                    active: pattern.active_count(),
                    pattern: pattern.to_string(),
                };
                println!("{}", serde_json::to_string(&record)?);
            }
        }
    }

    if format == OutputFormat::Table {
        println!("{:>10} {:>5}", "spread".cyan(), engine.spread());
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(&args, cli.format),
        Commands::Patterns(args) => patterns(&args, cli.format),
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&kompas_core::config_schema())?);
            Ok(())
        }
    }
}
