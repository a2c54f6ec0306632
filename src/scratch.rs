//! Scratch file management
//!
//! The applier stages every poster through two fixed-name scratch files (one
//! raw download, one recompressed). The guard here deletes its file on drop,
//! so every exit path of an apply cleans up, including failures. The names
//! are deliberately fixed: a crashed run leaves files that the next run
//! simply overwrites.

use std::fs;
use std::path::{Path, PathBuf};

/// Fixed name of the raw downloaded poster.
pub(crate) const RAW_SCRATCH_NAME: &str = "temp_poster_raw.jpg";

/// Fixed name of the recompressed poster.
pub(crate) const COMPRESSED_SCRATCH_NAME: &str = "temp_poster_compressed.jpg";

/// Guard for a scratch file that removes it when dropped.
///
/// The file does not have to exist; creating the guard before the file is
/// written still guarantees cleanup on early returns.
#[derive(Debug)]
pub(crate) struct ScratchFile(PathBuf);

impl ScratchFile {
    pub(crate) fn new(dir: &Path, name: &str) -> Self {
        ScratchFile(dir.join(name))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        // Silently ignore errors during cleanup; the file may already have
        // been moved into place.
        let _ = fs::remove_file(&self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("poster_sync_{}_{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_scratch_file_cleanup_on_drop() {
        let dir = unique_dir("scratch_drop");
        let path = {
            let scratch = ScratchFile::new(&dir, RAW_SCRATCH_NAME);
            fs::write(scratch.path(), b"poster bytes").unwrap();
            assert!(scratch.path().exists());
            scratch.path().to_path_buf()
            // scratch is dropped here
        };
        assert!(!path.exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_drop_without_file_is_silent() {
        let dir = unique_dir("scratch_missing");
        let scratch = ScratchFile::new(&dir, COMPRESSED_SCRATCH_NAME);
        assert!(!scratch.path().exists());
        drop(scratch);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_fixed_names_are_stable() {
        let dir = unique_dir("scratch_names");
        let first = ScratchFile::new(&dir, RAW_SCRATCH_NAME);
        let second = ScratchFile::new(&dir, RAW_SCRATCH_NAME);
        // Same directory and name resolve to the same path across runs.
        assert_eq!(first.path(), second.path());
        fs::remove_dir_all(&dir).ok();
    }
}
