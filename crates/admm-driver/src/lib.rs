#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

pub mod controller;
pub mod rotation;

use std::path::{Path, PathBuf};

use admm_core::config::ConfigError;
use thiserror::Error;

/// Everything one parallel round needs from the driver.
///
/// Only paths and numeric parameters cross this boundary; the driver's own
/// loop state never leaves the loop.
#[derive(Debug, Clone, Copy)]
pub struct RoundSpec<'a> {
    /// Signal dataset location, fixed for the whole run.
    pub signal_data: &'a Path,
    /// Output of the previous round. For iteration 0 this names a location
    /// that does not exist by construction; the round must treat that as a
    /// cold start, not an error.
    pub previous_output: &'a Path,
    /// Where this round writes its output.
    pub current_output: &'a Path,
    pub iteration: u32,
    pub regularization_factor: f64,
    pub add_intercept: bool,
    pub regularize_intercept: bool,
    /// Target split count for the round's fan-out; 0 means the substrate's
    /// own default splitting policy applies.
    pub target_split_count: u64,
}

/// Execution substrate seam: runs one full parallel round and returns its
/// convergence status.
///
/// This is intentionally synchronous: round k+1 consumes round k's output,
/// so the driver has nothing to do until the round fully completes. Smaller
/// status is better; the exact semantic (e.g. a count of changed records)
/// is owned by the round, not by the driver. The fan-out across splits and
/// the aggregation both live behind this call.
pub trait RoundRunner: Send + Sync {
    fn run_round(&self, spec: &RoundSpec<'_>) -> anyhow::Result<i64>;
}

/// Failure taxonomy of a run. Nothing is swallowed: a failed round and a
/// failed promotion are distinct conditions (the latter means the
/// computation succeeded but delivery did not).
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("invalid run configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to prepare output workspace at {path}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("round {iteration} failed")]
    RoundFailed {
        iteration: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to promote round {iteration} output to {final_path}")]
    Promotion {
        iteration: u32,
        final_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
