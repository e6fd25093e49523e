//! Advisory run lock
//!
//! The pinned map is process-wide shared state with no kernel-side locking,
//! so the whole discover -> update sequence runs under an exclusive `flock`.
//! A second concurrent invocation fails fast with a distinct error instead of
//! racing the first on the map's single slot.

use std::fs::File;
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};
use thiserror::Error;

/// Default lock file guarding the pipeline.
pub const LOCK_PATH: &str = "/tmp/blockpath.lock";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another blockpath run holds the lock at {0}")]
    AlreadyRunning(PathBuf),

    #[error("failed to open lock file: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive advisory lock held for the duration of a run. Released on drop.
pub struct RunLock {
    _guard: Flock<File>,
}

impl RunLock {
    /// Acquire the lock non-blocking. A held lock is reported as
    /// [`LockError::AlreadyRunning`] rather than waited on.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let file = File::create(path)?;
        let guard = Flock::lock(file, FlockArg::LockExclusiveNonblock)
            .map_err(|(_, _errno)| LockError::AlreadyRunning(path.to_path_buf()))?;
        Ok(Self { _guard: guard })
    }
}
