use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use tracing::debug;

use crate::error::{AgentcutError, Result};

pub const LOCK_FILE: &str = ".agentcut.lock";

/// Exclusive lock on an output root, held until dropped.
///
/// Serializes concurrent runs against the same output directory so the
/// existence check and the write of each document cannot interleave.
pub struct OutputLock {
    file: File,
    path: PathBuf,
}

impl OutputLock {
    /// Block until the lock is acquired. Creates the output root if needed.
    pub fn acquire(output_root: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_root).map_err(|e| AgentcutError::Io {
            context: format!("creating output directory {}", output_root.display()),
            source: e,
        })?;

        let path = output_root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| AgentcutError::Io {
                context: format!("opening lock file {}", path.display()),
                source: e,
            })?;

        FileExt::lock_exclusive(&file).map_err(|e| AgentcutError::Io {
            context: format!("locking {}", path.display()),
            source: e,
        })?;
        debug!(path = %path.display(), "output lock acquired");

        Ok(Self { file, path })
    }
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!(path = %self.path.display(), "output lock released");
    }
}
