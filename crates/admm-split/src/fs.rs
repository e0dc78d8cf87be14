use std::path::{Path, PathBuf};

use admm_core::types::{BlockLocation, InputFile};

use crate::{SignalStore, StoreError};

pub const DEFAULT_BLOCK_SIZE: u64 = 64 * 1024 * 1024;

/// Extensions that cannot be read from an arbitrary byte offset.
const NON_SPLITTABLE_EXTENSIONS: &[&str] = &["gz", "zst", "snappy"];

/// Local-filesystem signal store.
///
/// Block maps are synthesized from `block_size` with empty host lists, since
/// a local filesystem has no replica placement to hint with.
#[derive(Debug, Clone)]
pub struct FsSignalStore {
    block_size: u64,
}

impl Default for FsSignalStore {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

impl FsSignalStore {
    pub fn new(block_size: u64) -> Self {
        Self {
            block_size: block_size.max(1),
        }
    }

    fn synth_blocks(&self, len: u64) -> Vec<BlockLocation> {
        let mut blocks = Vec::new();
        let mut offset = 0u64;
        while offset < len {
            let block_len = self.block_size.min(len - offset);
            blocks.push(BlockLocation {
                offset,
                len: block_len,
                hosts: Vec::new(),
            });
            offset += block_len;
        }
        blocks
    }

    fn walk(&self, dir: &Path, out: &mut Vec<InputFile>) -> Result<(), StoreError> {
        // Stable order: directory iteration order is not portable.
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .map(|e| e.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        entries.sort();

        for path in entries {
            let meta = std::fs::metadata(&path)?;
            if meta.is_dir() {
                self.walk(&path, out)?;
            } else {
                out.push(InputFile {
                    path: path.to_string_lossy().into_owned(),
                    len: meta.len(),
                    blocks: self.synth_blocks(meta.len()),
                });
            }
        }
        Ok(())
    }
}

impl SignalStore for FsSignalStore {
    fn list_files(&self, dataset: &str) -> Result<Vec<InputFile>, StoreError> {
        let root = Path::new(dataset);
        if !root.exists() {
            return Err(StoreError::DatasetNotFound(dataset.to_string()));
        }

        let mut files = Vec::new();
        if root.is_dir() {
            self.walk(root, &mut files)?;
        } else {
            let meta = std::fs::metadata(root)?;
            files.push(InputFile {
                path: dataset.to_string(),
                len: meta.len(),
                blocks: self.synth_blocks(meta.len()),
            });
        }
        Ok(files)
    }

    fn is_splittable(&self, file: &InputFile) -> bool {
        let ext = Path::new(&file.path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext {
            Some(ext) => !NON_SPLITTABLE_EXTENSIONS.contains(&ext.as_str()),
            None => true,
        }
    }
}
