//! Store configuration.
//!
//! Paths and lock timings are passed explicitly into the cache store at
//! startup rather than read from globals.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::persistence::{default_cache_path, default_lock_dir};

/// Lock marker age after which a holder is presumed crashed.
pub const DEFAULT_LOCK_STALE_AFTER: Duration = Duration::from_millis(5000);

/// How long a caller waits for another fetcher before fetching anyway.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_millis(3000);

/// Poll interval while waiting for a lock.
pub const DEFAULT_LOCK_POLL: Duration = Duration::from_millis(100);

/// Locations and timings for the cache store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Usage cache file.
    pub cache_path: PathBuf,
    /// Directory holding per-provider lock markers.
    pub lock_dir: PathBuf,
    /// Lock marker age after which it may be overwritten.
    pub lock_stale_after: Duration,
    /// Maximum wait for another process's fetch.
    pub lock_wait: Duration,
    /// Poll interval while waiting.
    pub lock_poll: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            lock_dir: default_lock_dir(),
            lock_stale_after: DEFAULT_LOCK_STALE_AFTER,
            lock_wait: DEFAULT_LOCK_WAIT,
            lock_poll: DEFAULT_LOCK_POLL,
        }
    }
}

impl StoreConfig {
    /// Places the cache file and lock directory inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::with_cache_path(dir.join("usage_cache.json"))
    }

    /// Uses `path` as the cache file with locks in a sibling `locks` dir.
    pub fn with_cache_path(path: impl Into<PathBuf>) -> Self {
        let cache_path = path.into();
        let lock_dir = cache_path
            .parent()
            .map_or_else(|| PathBuf::from("locks"), |p| p.join("locks"));
        Self {
            cache_path,
            lock_dir,
            ..Self::default()
        }
    }

    /// Overrides the lock wait budget and poll interval.
    #[must_use]
    pub fn with_lock_wait(mut self, wait: Duration, poll: Duration) -> Self {
        self.lock_wait = wait;
        self.lock_poll = poll;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir() {
        let config = StoreConfig::in_dir(Path::new("/tmp/qb"));
        assert_eq!(config.cache_path, PathBuf::from("/tmp/qb/usage_cache.json"));
        assert_eq!(config.lock_dir, PathBuf::from("/tmp/qb/locks"));
        assert_eq!(config.lock_stale_after, Duration::from_millis(5000));
    }
}
