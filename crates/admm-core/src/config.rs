use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_REGULARIZATION_FACTOR: f64 = 1e-6;
pub const DEFAULT_ITERATIONS_MAXIMUM: u32 = 2;

/// Construction-time parameters for one optimization run.
///
/// This is an explicit value handed to the driver; nothing in the core reads
/// ambient global configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Location of the signal dataset, fixed for the whole run.
    pub signal_data: PathBuf,
    /// Base location owning the per-iteration subtree and the promoted
    /// final result. Exclusively owned by one run at a time.
    pub output_base: PathBuf,
    pub regularization_factor: f64,
    pub add_intercept: bool,
    pub regularize_intercept: bool,
    /// Hard cap on the number of rounds a run may execute.
    pub iterations_maximum: u32,
    /// Target number of splits per round; 0 means "use the substrate's own
    /// default splitting policy" (the balancer is bypassed).
    pub target_split_count: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            signal_data: PathBuf::new(),
            output_base: PathBuf::new(),
            regularization_factor: DEFAULT_REGULARIZATION_FACTOR,
            add_intercept: true,
            regularize_intercept: false,
            iterations_maximum: DEFAULT_ITERATIONS_MAXIMUM,
            target_split_count: 0,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("signal_data must be non-empty")]
    EmptySignalData,
    #[error("output_base must be non-empty")]
    EmptyOutputBase,
    #[error("output_base must differ from signal_data")]
    OutputIsSignalData,
    #[error("iterations_maximum must be >= 1")]
    ZeroIterations,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signal_data.as_os_str().is_empty() {
            return Err(ConfigError::EmptySignalData);
        }
        if self.output_base.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputBase);
        }
        if self.output_base == self.signal_data {
            return Err(ConfigError::OutputIsSignalData);
        }
        if self.iterations_maximum == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(())
    }
}
