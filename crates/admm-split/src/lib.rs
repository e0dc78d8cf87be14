#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

pub mod fs;

use std::num::NonZeroU64;

use admm_core::types::{InputFile, Split, SplitPlan};
use thiserror::Error;

/// Tolerance for the trailing remainder of a file: a final fragment smaller
/// than ~9% of a normal split is absorbed into the previous chunk instead of
/// becoming its own sliver.
pub const SPLIT_SLOP: f64 = 1.1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata interface to the signal-data store.
///
/// Only reads file metadata (length, block map); split planning never writes.
pub trait SignalStore: Send + Sync {
    fn list_files(&self, dataset: &str) -> Result<Vec<InputFile>, StoreError>;

    /// Whether a file may be cut mid-stream. Callers deny this for formats
    /// that cannot be read from an arbitrary offset (e.g. block-compressed).
    fn is_splittable(&self, file: &InputFile) -> bool;
}

/// How a round's work units are computed.
///
/// A single conditional algorithm choice, selected by the target split
/// count: 0 is the documented sentinel for "let the execution substrate use
/// its own native splitting".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPolicy {
    SubstrateDefault,
    Balanced(NonZeroU64),
}

impl SplitPolicy {
    pub fn from_target(target_split_count: u64) -> Self {
        match NonZeroU64::new(target_split_count) {
            None => SplitPolicy::SubstrateDefault,
            Some(n) => SplitPolicy::Balanced(n),
        }
    }
}

/// Lists the dataset and computes a balanced plan over it.
///
/// Only fallible through the store; the balancing itself cannot fail.
pub fn plan<S: SignalStore + ?Sized>(
    store: &S,
    dataset: &str,
    target_split_count: NonZeroU64,
) -> Result<SplitPlan, StoreError> {
    let files = store.list_files(dataset)?;
    Ok(balance(&files, |f| store.is_splittable(f), target_split_count))
}

/// Cuts a file set into roughly equal-sized, locality-aware work units.
///
/// The split size is global: total dataset bytes divided by the target
/// count (floored to 1 so a target larger than the dataset stays sane).
/// Per file:
/// - zero length: one degenerate split of length 0 with no host hints, so a
///   placeholder file flows through downstream readers without a crash;
/// - splittable: `split_size` chunks from offset 0 while the remainder
///   exceeds the slop threshold, then one final split for what is left,
///   with hints from the file's last block;
/// - not splittable: the whole file as one split, hints from its first
///   block.
pub fn balance<F>(files: &[InputFile], is_splittable: F, target_split_count: NonZeroU64) -> SplitPlan
where
    F: Fn(&InputFile) -> bool,
{
    let goal_size: u64 = files.iter().map(|f| f.len).sum();
    let split_size = (goal_size / target_split_count.get()).max(1);

    let mut splits = Vec::new();
    for file in files {
        if file.len == 0 {
            splits.push(Split {
                path: file.path.clone(),
                offset: 0,
                len: 0,
                hosts: Vec::new(),
            });
        } else if is_splittable(file) {
            let mut remaining = file.len;
            while remaining as f64 / split_size as f64 > SPLIT_SLOP {
                let offset = file.len - remaining;
                splits.push(Split {
                    path: file.path.clone(),
                    offset,
                    len: split_size,
                    hosts: file.hosts_at(offset),
                });
                remaining -= split_size;
            }
            if remaining > 0 {
                splits.push(Split {
                    path: file.path.clone(),
                    offset: file.len - remaining,
                    len: remaining,
                    hosts: file.last_block_hosts(),
                });
            }
        } else {
            splits.push(Split {
                path: file.path.clone(),
                offset: 0,
                len: file.len,
                hosts: file.first_block_hosts(),
            });
        }
    }

    SplitPlan { splits }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_zero_bypasses_the_balancer() {
        assert_eq!(SplitPolicy::from_target(0), SplitPolicy::SubstrateDefault);
    }

    #[test]
    fn policy_nonzero_balances() {
        match SplitPolicy::from_target(4) {
            SplitPolicy::Balanced(n) => assert_eq!(n.get(), 4),
            other => panic!("expected Balanced, got {other:?}"),
        }
    }

    #[test]
    fn split_size_floors_at_one() {
        // Target far beyond the dataset size must not divide to zero.
        let files = vec![InputFile {
            path: "tiny".to_string(),
            len: 3,
            blocks: Vec::new(),
        }];
        let target = NonZeroU64::new(1000).expect("non-zero");
        let plan = balance(&files, |_| true, target);
        assert!(plan.validate(&files).is_ok());
        assert!(plan.splits.iter().all(|s| s.len >= 1));
    }
}
