//! # Gamepad Pipeline
//!
//! Runs the input resolution pipeline for a board configuration.
//!
//! The host loop ticks at the configured cycle rate, feeds the pipeline from a
//! replay script (or an idle source with nothing pressed), publishes every
//! committed state on a watch channel and optionally traces state changes to
//! a JSONL file.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use gamepad_pipeline::config::Config;
use gamepad_pipeline::input::source::{IdleSource, ReplaySource};
use gamepad_pipeline::input::state::ControllerState;
use gamepad_pipeline::pipeline::{CycleBudget, Pipeline};
use gamepad_pipeline::trace::StateTrace;

/// Board configuration used when none is given
const DEFAULT_CONFIG_PATH: &str = "config/flatbox-rev5-southpaw.toml";

/// Number of cycles between status log messages
const LOG_INTERVAL_CYCLES: u64 = 5000;

/// Gamepad Pipeline
///
/// Resolves raw button and stick samples into controller states at a fixed
/// cycle rate.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Board configuration file
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Replay script of raw samples (JSON lines)
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Write state changes to this file (JSON lines)
    #[arg(long)]
    trace: Option<PathBuf>,
}

/// Logs hat and button changes seen by a downstream consumer.
async fn watch_states(mut states: watch::Receiver<ControllerState>) {
    let mut last = *states.borrow_and_update();
    while states.changed().await.is_ok() {
        let state = *states.borrow_and_update();
        if state.hat != last.hat || state.buttons != last.buttons {
            debug!(
                "Cycle {}: hat {:?}, buttons {:#06x}, left {:?}, right {:?}",
                state.cycle,
                state.hat,
                state.buttons.bits(),
                state.left_stick,
                state.right_stick
            );
        }
        last = state;
    }
}

/// Main entry point
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load and validate the board configuration
///    - Open the replay script and trace file, if given
///
/// 2. **Main Loop**
///    - Run one pipeline cycle per tick at `cycle_hz`
///    - Publish the committed state on the watch channel
///    - Report cycles that overrun their budget
///    - Log status every `LOG_INTERVAL_CYCLES`
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration is invalid or a file cannot be opened.
/// Configuration errors are reported before any cycle runs.
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/flatbox-rev5-southpaw.toml --replay demos/socd-sweep.jsonl
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("Gamepad Pipeline v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    info!("Loaded configuration from {}", args.config.display());

    let cycle_hz = config.pipeline.cycle_hz;
    let mut pipeline = Pipeline::new(config)?;
    let budget = CycleBudget::new(cycle_hz);

    let mut replay = match &args.replay {
        Some(path) => {
            let source = ReplaySource::load(path)
                .with_context(|| format!("failed to load replay {}", path.display()))?;
            info!("Replaying {} frames from {}", source.frame_count(), path.display());
            Some(source)
        }
        None => {
            info!("No replay given, running with an idle source");
            None
        }
    };
    let mut idle = IdleSource;

    let mut trace = match &args.trace {
        Some(path) => Some(
            StateTrace::create(path)
                .with_context(|| format!("failed to create trace {}", path.display()))?,
        ),
        None => None,
    };

    let (state_tx, state_rx) = watch::channel(pipeline.snapshot());
    let consumer = tokio::spawn(watch_states(state_rx));

    let mut cycle_interval = interval(budget.budget());
    cycle_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Starting input pipeline at {}Hz", cycle_hz);
    info!("Press Ctrl+C to exit");

    let mut overruns: u64 = 0;
    let mut last_log_cycle: u64 = 0;

    loop {
        tokio::select! {
            _ = cycle_interval.tick() => {
                let started = Instant::now();

                let state = match replay.as_mut() {
                    Some(source) => {
                        let state = pipeline.run_cycle(source);
                        source.advance();
                        state
                    }
                    None => pipeline.run_cycle(&mut idle),
                };
                state_tx.send_replace(state);

                let trace_error = trace.as_mut().and_then(|t| t.record(&state).err());
                if let Some(e) = trace_error {
                    warn!("Trace write failed, disabling trace: {}", e);
                    trace = None;
                }

                if let Err(e) = budget.check(started.elapsed()) {
                    overruns += 1;
                    warn!("{}", e);
                }

                let cycles = pipeline.cycle();
                if cycles - last_log_cycle >= LOG_INTERVAL_CYCLES {
                    info!(
                        "Ran {} cycles ({}Hz, {} overruns, {} degraded inputs)",
                        cycles,
                        cycle_hz,
                        overruns,
                        state.modifiers.degraded.count()
                    );
                    last_log_cycle = cycles;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total cycles: {} ({} overruns)", pipeline.cycle(), overruns);
                break;
            }
        }
    }

    if let Some(mut trace) = trace {
        trace.flush()?;
        info!("Trace recorded {} state changes", trace.written());
    }

    drop(state_tx);
    consumer.await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("gamepad-pipeline").chain(list.iter().copied()))
    }

    #[test]
    fn test_log_interval_constant() {
        assert_eq!(LOG_INTERVAL_CYCLES, 5000);

        // At the default 1000Hz, 5000 cycles = 5 seconds
        let seconds = LOG_INTERVAL_CYCLES as f64 / 1000.0;
        assert_eq!(seconds, 5.0);
    }

    #[test]
    fn test_default_config_path() {
        let parsed = args(&[]).unwrap();
        assert_eq!(parsed.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(parsed.replay, None);
        assert_eq!(parsed.trace, None);
    }

    #[test]
    fn test_parse_all_arguments() {
        let parsed = args(&["board.toml", "--replay", "in.jsonl", "--trace", "out.jsonl"]).unwrap();
        assert_eq!(parsed.config, PathBuf::from("board.toml"));
        assert_eq!(parsed.replay, Some(PathBuf::from("in.jsonl")));
        assert_eq!(parsed.trace, Some(PathBuf::from("out.jsonl")));
    }

    #[test]
    fn test_options_before_config() {
        let parsed = args(&["--trace", "out.jsonl", "board.toml"]).unwrap();
        assert_eq!(parsed.config, PathBuf::from("board.toml"));
    }

    #[test]
    fn test_missing_option_value() {
        assert!(args(&["--replay"]).is_err());
    }

    #[test]
    fn test_unknown_option() {
        assert!(args(&["--fast"]).is_err());
    }

    #[test]
    fn test_two_config_files() {
        assert!(args(&["a.toml", "b.toml"]).is_err());
    }

    #[test]
    fn test_help_and_version_flags() {
        let help = args(&["--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(help.to_string().contains("--replay"));

        let version = args(&["--version"]).unwrap_err();
        assert_eq!(version.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_shipped_preset_loads() {
        let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/", "config/flatbox-rev5-southpaw.toml"));
        assert!(config.is_ok(), "{:?}", config.err());
    }
}
