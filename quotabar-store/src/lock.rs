//! Advisory file locks.
//!
//! A lock is a marker file holding the acquisition time in epoch
//! milliseconds. Acquisition is an atomic create-if-absent; a marker older
//! than the staleness threshold is taken over. Waiting is poll-based.
//! Losing a race is always safe: callers fall back to fetching anyway.

use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::ensure_dir;

/// Manages lock markers inside one directory.
#[derive(Debug, Clone)]
pub struct LockManager {
    dir: PathBuf,
}

impl LockManager {
    /// Creates a manager rooted at `dir`. Performs no I/O.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the marker path for a lock id.
    pub fn lock_path(&self, lock_id: &str) -> PathBuf {
        self.dir.join(format!("{lock_id}.lock"))
    }

    /// Tries to take the lock.
    ///
    /// Returns `Ok(false)` while a live holder owns it. A marker more than
    /// `stale_after` away from now (past or future), or one whose timestamp
    /// cannot be read, is overwritten and the lock is acquired.
    pub async fn try_acquire(&self, lock_id: &str, stale_after: Duration) -> Result<bool, StoreError> {
        ensure_dir(&self.dir).await?;
        let path = self.lock_path(lock_id);
        let now = Utc::now().timestamp_millis();

        if create_marker(&path, now).await? {
            debug!(lock = %lock_id, "Lock acquired");
            return Ok(true);
        }

        let held_since = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content.trim().parse::<i64>().ok(),
            // Released between our create attempt and the read.
            Err(e) if e.kind() == ErrorKind::NotFound => return create_marker(&path, now).await,
            Err(e) => return Err(e.into()),
        };

        // A marker dated in the future counts by its distance from now.
        let stale_ms = u64::try_from(stale_after.as_millis()).unwrap_or(u64::MAX);
        match held_since {
            Some(ts) if now.abs_diff(ts) <= stale_ms => {
                debug!(lock = %lock_id, age_ms = now - ts, "Lock held elsewhere");
                Ok(false)
            }
            _ => {
                info!(lock = %lock_id, held_since = ?held_since, "Overriding stale lock");
                tokio::fs::write(&path, now.to_string()).await?;
                Ok(true)
            }
        }
    }

    /// Deletes the marker. A missing marker is not an error.
    pub async fn release(&self, lock_id: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.lock_path(lock_id)).await {
            Ok(()) => {
                debug!(lock = %lock_id, "Lock released");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns true if a marker currently exists.
    pub async fn is_locked(&self, lock_id: &str) -> bool {
        tokio::fs::try_exists(self.lock_path(lock_id))
            .await
            .unwrap_or(false)
    }

    /// Polls until the marker disappears or `max_wait` elapses.
    ///
    /// Returns whether the release was observed.
    pub async fn wait_for_release(&self, lock_id: &str, max_wait: Duration, poll: Duration) -> bool {
        let deadline = Instant::now() + max_wait;
        loop {
            if !self.is_locked(lock_id).await {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                debug!(lock = %lock_id, waited = ?max_wait, "Gave up waiting for lock");
                return false;
            }
            tokio::time::sleep(poll.min(deadline - now)).await;
        }
    }
}

/// Atomically creates the marker. `Ok(false)` if it already exists.
async fn create_marker(path: &Path, now_ms: i64) -> Result<bool, StoreError> {
    let open = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await;
    match open {
        Ok(mut file) => {
            file.write_all(now_ms.to_string().as_bytes()).await?;
            file.flush().await?;
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Tests
// ============================================================================
