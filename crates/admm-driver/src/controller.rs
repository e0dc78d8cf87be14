use std::path::PathBuf;
use std::sync::Arc;

use admm_core::config::RunConfig;
use admm_observe::metrics::{Counter, DurationAgg, Gauge, ScopedTimer};

use crate::rotation;
use crate::{DriverError, RoundRunner, RoundSpec};

/// Why the loop stopped. Both terminal states resolve identically: the
/// just-completed round's output is promoted, even when it did not improve,
/// because the round already ran and must not be silently discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The latest round's status failed to improve on the previous one.
    Converged,
    /// The iteration cap was hit.
    MaxedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Number of rounds actually executed.
    pub rounds_run: u32,
    /// Convergence status of the promoted round.
    pub final_status: i64,
    pub promoted_path: PathBuf,
}

#[derive(Debug, Default)]
pub struct DriverMetrics {
    pub rounds_total: Counter,
    pub round_failures_total: Counter,
    pub runs_converged_total: Counter,
    pub runs_maxed_total: Counter,
    pub round_duration: DurationAgg,
    /// Status of the most recent round, clamped at zero.
    pub last_status: Gauge,
}

/// Drives the convergence loop: one blocking round per pass, a stopping
/// decision after each, and promotion of the final round's output.
///
/// The loop is strictly sequential (round k+1 reads round k's output) and
/// the driver owns `output_base` exclusively for the run's lifetime; the
/// caller must serialize runs that share a base.
pub struct IterationDriver<R: RoundRunner> {
    runner: R,
    metrics: Arc<DriverMetrics>,
}

impl<R: RoundRunner> IterationDriver<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            metrics: Arc::new(DriverMetrics::default()),
        }
    }

    pub fn metrics(&self) -> Arc<DriverMetrics> {
        self.metrics.clone()
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    pub fn run(&self, config: &RunConfig) -> Result<RunReport, DriverError> {
        config.validate()?;

        let base = config.output_base.as_path();
        reset_dir(&config.output_base)?;
        let tmp = rotation::intermediate_base(base);
        std::fs::create_dir_all(&tmp).map_err(|source| DriverError::Workspace {
            path: tmp.clone(),
            source,
        })?;

        let mut iteration: u32 = 0;
        let mut previous_status: i64 = 0;
        loop {
            let previous_output = rotation::previous_path(base, iteration);
            let current_output = rotation::current_path(base, iteration);

            // A stale directory from an aborted earlier run must not leak
            // into this round's output.
            if current_output.exists() {
                std::fs::remove_dir_all(&current_output).map_err(|source| {
                    DriverError::Workspace {
                        path: current_output.clone(),
                        source,
                    }
                })?;
            }

            let spec = RoundSpec {
                signal_data: config.signal_data.as_path(),
                previous_output: previous_output.as_path(),
                current_output: current_output.as_path(),
                iteration,
                regularization_factor: config.regularization_factor,
                add_intercept: config.add_intercept,
                regularize_intercept: config.regularize_intercept,
                target_split_count: config.target_split_count,
            };

            tracing::info!(
                target: "admm_trace",
                event = "round_start",
                iteration = iteration,
                previous_status = previous_status,
                "starting round"
            );

            let status = {
                let _timer = ScopedTimer::new(&self.metrics.round_duration);
                self.runner.run_round(&spec)
            };
            let status = match status {
                Ok(status) => status,
                Err(source) => {
                    self.metrics.round_failures_total.inc();
                    return Err(DriverError::RoundFailed { iteration, source });
                }
            };
            self.metrics.rounds_total.inc();
            self.metrics.last_status.set(status.max(0) as u64);

            tracing::info!(
                target: "admm_trace",
                event = "round_complete",
                iteration = iteration,
                status = status,
                previous_status = previous_status,
                "round complete"
            );

            let converged = status <= previous_status;
            let maxed = iteration + 1 >= config.iterations_maximum;
            if converged || maxed {
                let outcome = if converged {
                    self.metrics.runs_converged_total.inc();
                    RunOutcome::Converged
                } else {
                    self.metrics.runs_maxed_total.inc();
                    RunOutcome::MaxedOut
                };
                let promoted_path = self.promote(base, &current_output, iteration)?;

                tracing::info!(
                    target: "admm_trace",
                    event = "promoted",
                    iteration = iteration,
                    status = status,
                    outcome = ?outcome,
                    promoted_path = %promoted_path.display(),
                    "run finished"
                );

                return Ok(RunReport {
                    outcome,
                    rounds_run: iteration + 1,
                    final_status: status,
                    promoted_path,
                });
            }

            previous_status = status;
            iteration += 1;
        }
    }

    /// Moves the final round's output to the stable result location and
    /// discards the intermediate subtree. A pre-existing final directory is
    /// deleted first, so the rename lands on a fresh name.
    fn promote(
        &self,
        base: &std::path::Path,
        current_output: &std::path::Path,
        iteration: u32,
    ) -> Result<PathBuf, DriverError> {
        let final_path = rotation::final_path(base);
        let wrap = |source: std::io::Error| DriverError::Promotion {
            iteration,
            final_path: final_path.clone(),
            source,
        };

        if final_path.exists() {
            std::fs::remove_dir_all(&final_path).map_err(wrap)?;
        }
        std::fs::rename(current_output, &final_path).map_err(wrap)?;
        std::fs::remove_dir_all(rotation::intermediate_base(base)).map_err(wrap)?;
        Ok(final_path)
    }
}

fn reset_dir(path: &std::path::Path) -> Result<(), DriverError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|source| DriverError::Workspace {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::create_dir_all(path).map_err(|source| DriverError::Workspace {
        path: path.to_path_buf(),
        source,
    })
}
