//! kompas-bench: Benchmark harness for engine profiling
//!
//! Runs `SequencerEngine::process` in a tight loop without any audio
//! backend, so native profilers can be attached and the per-sample cost
//! checked against the real-time budget.
//!
//! Usage:
//!   kompas-bench run --frames 4800000 --clock-period 240
//!   samply record ./target/profiling/kompas-bench run

use clap::{Parser, Subcommand};
use colored::Colorize;
use kompas_core::{Channel, EngineConfig, EngineInputs, PATTERN_LENGTH, SequencerEngine};
use std::hint::black_box;
use std::time::Instant;

const DEFAULT_SAMPLE_RATE: f32 = 48000.0;
const DEFAULT_FRAMES: u64 = 48000 * 10; // 10 seconds at 48kHz

/// Benchmark harness for the kompas engine
#[derive(Parser)]
#[command(name = "kompas-bench")]
#[command(about = "Profile and benchmark the kompas rhythm engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a benchmark
    Run {
        /// Number of audio frames to process
        #[arg(short, long, default_value_t = DEFAULT_FRAMES)]
        frames: u64,

        /// Sample rate in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f32,

        /// Clock period in samples
        #[arg(short, long, default_value_t = 240)]
        clock_period: u64,

        /// Sweep the control voltages so every channel regenerates each step
        #[arg(long)]
        sweep: bool,

        /// Warmup frames before measurement
        #[arg(short, long, default_value_t = 48000)]
        warmup: u64,
    },

    /// Run a quick smoke test across clock rates
    Smoke {
        /// Frames per configuration
        #[arg(short, long, default_value_t = 4800)]
        frames: u64,
    },
}

fn main() {
    #[cfg(feature = "profile")]
    {
        use tracing_subscriber::prelude::*;
        let tracy_layer = tracing_tracy::TracyLayer::default();
        tracing_subscriber::registry().with(tracy_layer).init();
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            frames,
            sample_rate,
            clock_period,
            sweep,
            warmup,
        } => {
            run_benchmark(frames, sample_rate, clock_period.max(2), sweep, warmup);
        }
        Commands::Smoke { frames } => {
            run_smoke(frames);
        }
    }
}

fn build_engine() -> SequencerEngine {
    let config = EngineConfig {
        params: [400.0, 600.0, 500.0],
        ..Default::default()
    };
    SequencerEngine::with_seed(config, 0)
}

/// Inputs for a given frame: square clock, optional stepped control voltage.
#[inline(always)]
fn inputs_at(frame: u64, clock_period: u64, sweep: bool) -> EngineInputs {
    let clock = if frame % clock_period < clock_period / 2 { 10.0 } else { 0.0 };
    let mut inputs = EngineInputs::clock(clock);
    if sweep {
        let cv = if (frame / clock_period) % 2 == 0 { 1.0 } else { 3.0 };
        for channel in Channel::ALL {
            inputs = inputs.with_cv(channel, cv);
        }
    }
    inputs
}

#[inline(always)]
fn process_frames(
    engine: &mut SequencerEngine,
    start: u64,
    n: u64,
    sample_time: f32,
    clock_period: u64,
    sweep: bool,
) {
    for frame in start..start + n {
        #[cfg(feature = "profile")]
        let _span = tracing::info_span!("process_frame").entered();

        let inputs = inputs_at(frame, clock_period, sweep);
        black_box(engine.process(&inputs, sample_time));
    }
}

fn run_benchmark(frames: u64, sample_rate: f32, clock_period: u64, sweep: bool, warmup: u64) {
    let sample_time = 1.0 / sample_rate;
    let mut engine = build_engine();

    println!(
        "Clock period: {} samples, sweep: {}",
        clock_period,
        if sweep { "on" } else { "off" }
    );

    if warmup > 0 {
        println!("Warming up ({} frames)...", warmup);
        process_frames(&mut engine, 0, warmup, sample_time, clock_period, sweep);
    }

    println!("Running benchmark ({} frames)...", frames);
    let start = Instant::now();
    process_frames(&mut engine, warmup, frames, sample_time, clock_period, sweep);
    let elapsed = start.elapsed();

    let ns_per_frame = elapsed.as_nanos() as f64 / frames.max(1) as f64;
    let budget_ns = 1e9 / sample_rate as f64;
    let realtime = (frames as f64 / sample_rate as f64) / elapsed.as_secs_f64();

    println!();
    println!("{}", "Results".bold());
    println!("  total:      {:.2?}", elapsed);
    println!("  per frame:  {:.1}ns", ns_per_frame);
    println!(
        "  budget:     {:.1}% of {:.0}ns",
        ns_per_frame / budget_ns * 100.0,
        budget_ns
    );
    println!("  realtime:   {}", format!("{:.0}x", realtime).green());

    for channel in Channel::ALL {
        println!(
            "  {:>10}: {}",
            channel.name().cyan(),
            engine.pattern(channel)
        );
    }
}

fn run_smoke(frames: u64) {
    let sample_time = 1.0 / DEFAULT_SAMPLE_RATE;
    let mut failed = false;

    for clock_period in [2u64, 48, 480, 4800] {
        for sweep in [false, true] {
            let mut engine = build_engine();
            let start = Instant::now();
            process_frames(&mut engine, 0, frames, sample_time, clock_period, sweep);
            let elapsed = start.elapsed();

            let expected_cursor = (frames.div_ceil(clock_period) as usize).saturating_sub(1) % PATTERN_LENGTH;
            let cursor = engine.cursor(Channel::Primary);
            let ok = cursor == expected_cursor;
            failed |= !ok;

            println!(
                "{} period={:<5} sweep={:<5} {:>10.2?} cursor={}",
                if ok { "ok  ".green() } else { "FAIL".red() },
                clock_period,
                sweep,
                elapsed,
                cursor
            );
        }
    }

    if failed {
        std::process::exit(1);
    }
}
