#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

mod synthetic;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tracing::{info, info_span, Instrument};

use admm_core::config::RunConfig;
use admm_driver::controller::{IterationDriver, RunOutcome, RunReport};
use admm_split::fs::{FsSignalStore, DEFAULT_BLOCK_SIZE};

use crate::synthetic::SyntheticRoundRunner;

#[derive(Debug, Parser)]
#[command(name = "admm-train")]
struct Args {
    /// Signal dataset location (directory or single file).
    #[arg(long, env = "ADMM_SIGNAL_DATA")]
    signal_data: PathBuf,

    /// Output base location; exclusively owned by this run.
    #[arg(long, env = "ADMM_OUTPUT")]
    output: PathBuf,

    #[arg(long, env = "ADMM_REGULARIZATION_FACTOR", default_value_t = 1e-6)]
    regularization_factor: f64,

    #[arg(
        long,
        env = "ADMM_ADD_INTERCEPT",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    add_intercept: bool,

    #[arg(
        long,
        env = "ADMM_REGULARIZE_INTERCEPT",
        default_value_t = false,
        action = clap::ArgAction::Set
    )]
    regularize_intercept: bool,

    /// Hard cap on the number of rounds per run.
    #[arg(long, env = "ADMM_ITERATIONS_MAXIMUM", default_value_t = 2)]
    iterations_maximum: u32,

    /// Target number of splits per round; 0 uses the substrate's own
    /// default splitting policy.
    #[arg(long, env = "ADMM_TARGET_SPLIT_COUNT", default_value_t = 0)]
    target_split_count: u64,

    /// Block size used to synthesize block maps for local signal data.
    #[arg(long, env = "ADMM_BLOCK_SIZE", default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: u64,

    /// When > 0, retrain on this interval instead of running once. A failed
    /// run is logged and the schedule continues.
    #[arg(long, env = "ADMM_RETRAIN_INTERVAL_MS", default_value_t = 0)]
    retrain_interval_ms: u64,

    /// Emit the run report as JSON on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ReportView {
    outcome: &'static str,
    rounds_run: u32,
    final_status: i64,
    promoted_path: PathBuf,
}

impl From<&RunReport> for ReportView {
    fn from(report: &RunReport) -> Self {
        Self {
            outcome: match report.outcome {
                RunOutcome::Converged => "converged",
                RunOutcome::MaxedOut => "maxed_out",
            },
            rounds_run: report.rounds_run,
            final_status: report.final_status,
            promoted_path: report.promoted_path.clone(),
        }
    }
}

fn run_config(args: &Args) -> RunConfig {
    RunConfig {
        signal_data: args.signal_data.clone(),
        output_base: args.output.clone(),
        regularization_factor: args.regularization_factor,
        add_intercept: args.add_intercept,
        regularize_intercept: args.regularize_intercept,
        iterations_maximum: args.iterations_maximum,
        target_split_count: args.target_split_count,
    }
}

async fn run_once(
    driver: Arc<IterationDriver<SyntheticRoundRunner>>,
    config: RunConfig,
) -> Result<RunReport> {
    // The driver loop blocks on each round by design; keep it off the
    // async runtime's workers.
    let report = tokio::task::spawn_blocking(move || driver.run(&config)).await??;
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    admm_observe::logging::init_tracing();

    let args = Args::parse();
    let span = info_span!(
        "admm-train",
        signal_data = %args.signal_data.display(),
        output_base = %args.output.display(),
        iterations_maximum = args.iterations_maximum,
        target_split_count = args.target_split_count
    );

    async move {
        let config = run_config(&args);
        let store = FsSignalStore::new(args.block_size);
        let driver = Arc::new(IterationDriver::new(SyntheticRoundRunner::new(store)));
        let metrics = driver.metrics();

        if args.retrain_interval_ms > 0 {
            info!(
                interval_ms = args.retrain_interval_ms,
                "starting periodic retraining"
            );
            let mut ticker = tokio::time::interval(std::time::Duration::from_millis(
                args.retrain_interval_ms,
            ));
            loop {
                ticker.tick().await;
                // The schedule, not the driver, decides to survive a failed
                // run.
                match run_once(driver.clone(), config.clone()).await {
                    Ok(report) => info!(
                        outcome = ?report.outcome,
                        rounds_run = report.rounds_run,
                        final_status = report.final_status,
                        promoted_path = %report.promoted_path.display(),
                        avg_round_ms = metrics.round_duration.snapshot().avg_ns() / 1_000_000,
                        "retraining run finished"
                    ),
                    Err(err) => tracing::error!(
                        error = format!("{err:#}"),
                        "retraining run failed; keeping schedule"
                    ),
                }
            }
        }

        let report = run_once(driver, config).await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&ReportView::from(&report))?);
        } else {
            info!(
                outcome = ?report.outcome,
                rounds_run = report.rounds_run,
                final_status = report.final_status,
                promoted_path = %report.promoted_path.display(),
                "run finished"
            );
        }
        Ok(())
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_map_onto_run_config_defaults() {
        let args = Args::parse_from(["admm-train", "--signal-data", "/d/sig", "--output", "/d/out"]);
        let config = run_config(&args);
        assert_eq!(config, RunConfig {
            signal_data: PathBuf::from("/d/sig"),
            output_base: PathBuf::from("/d/out"),
            ..RunConfig::default()
        });
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn intercept_flags_are_explicit_booleans() {
        let args = Args::parse_from([
            "admm-train",
            "--signal-data",
            "/d/sig",
            "--output",
            "/d/out",
            "--add-intercept",
            "false",
            "--regularize-intercept",
            "true",
        ]);
        assert!(!args.add_intercept);
        assert!(args.regularize_intercept);
    }
}
