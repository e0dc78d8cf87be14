use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One storage block of an input file.
///
/// `hosts` lists the nodes holding a replica of this block and may be empty
/// for stores without locality information (e.g. a local filesystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLocation {
    pub offset: u64,
    pub len: u64,
    pub hosts: Vec<String>,
}

impl BlockLocation {
    pub fn contains(&self, offset: u64) -> bool {
        self.offset <= offset && offset < self.offset.saturating_add(self.len)
    }
}

/// Metadata snapshot of one signal-data file, immutable for the duration of
/// split planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    pub path: String,
    pub len: u64,
    pub blocks: Vec<BlockLocation>,
}

impl InputFile {
    /// Host hints of the block covering `offset`, empty when no block does.
    pub fn hosts_at(&self, offset: u64) -> Vec<String> {
        self.blocks
            .iter()
            .find(|b| b.contains(offset))
            .map(|b| b.hosts.clone())
            .unwrap_or_default()
    }

    pub fn last_block_hosts(&self) -> Vec<String> {
        self.blocks.last().map(|b| b.hosts.clone()).unwrap_or_default()
    }

    pub fn first_block_hosts(&self) -> Vec<String> {
        self.blocks.first().map(|b| b.hosts.clone()).unwrap_or_default()
    }
}

/// A work unit: a contiguous byte range `[offset, end)` of one input file,
/// assigned to one parallel compute task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub path: String,
    pub offset: u64,
    pub len: u64,
    /// Locality hint; may be empty.
    pub hosts: Vec<String>,
}

impl Split {
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.len)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Ordered sequence of splits covering an input file set exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPlan {
    pub splits: Vec<Split>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SplitPlanError {
    #[error("split references unknown file {path}")]
    UnknownFile { path: String },
    #[error("splits for {path} are not contiguous: expected offset {expected}, found {found}")]
    NotContiguous {
        path: String,
        expected: u64,
        found: u64,
    },
    #[error("splits for {path} cover {covered} bytes, file has {len}")]
    LengthMismatch { path: String, covered: u64, len: u64 },
    #[error("zero-length split for non-empty file {path}")]
    EmptySplit { path: String },
    #[error("zero-length split for {path} carries host hints")]
    DegenerateSplitWithHosts { path: String },
    #[error("file {path} has no splits")]
    Uncovered { path: String },
}

impl SplitPlan {
    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// Checks the core planning invariant against the file set the plan was
    /// built from: per file, splits are contiguous from offset 0,
    /// non-overlapping, and their lengths sum exactly to the file length.
    /// A zero-length split is legal only for a zero-length file and must
    /// carry no host hints.
    pub fn validate(&self, files: &[InputFile]) -> Result<(), SplitPlanError> {
        let lens: BTreeMap<&str, u64> = files.iter().map(|f| (f.path.as_str(), f.len)).collect();

        // Next expected offset per file; splits must arrive in file order.
        let mut cursor: BTreeMap<&str, u64> = BTreeMap::new();
        for split in &self.splits {
            let Some(&len) = lens.get(split.path.as_str()) else {
                return Err(SplitPlanError::UnknownFile {
                    path: split.path.clone(),
                });
            };
            if split.is_empty() {
                if len != 0 {
                    return Err(SplitPlanError::EmptySplit {
                        path: split.path.clone(),
                    });
                }
                if !split.hosts.is_empty() {
                    return Err(SplitPlanError::DegenerateSplitWithHosts {
                        path: split.path.clone(),
                    });
                }
            }
            let expected = cursor.get(split.path.as_str()).copied().unwrap_or(0);
            if split.offset != expected {
                return Err(SplitPlanError::NotContiguous {
                    path: split.path.clone(),
                    expected,
                    found: split.offset,
                });
            }
            cursor.insert(split.path.as_str(), split.end());
        }

        for file in files {
            match cursor.get(file.path.as_str()) {
                None => {
                    return Err(SplitPlanError::Uncovered {
                        path: file.path.clone(),
                    })
                }
                Some(&covered) if covered != file.len => {
                    return Err(SplitPlanError::LengthMismatch {
                        path: file.path.clone(),
                        covered,
                        len: file.len,
                    })
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}
