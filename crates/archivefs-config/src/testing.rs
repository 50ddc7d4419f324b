//! Test environment abstraction for isolated testing.
//!
//! Provides `TestEnvironment` to manage a throwaway store root whose
//! layout matches what [`crate::StorageConfig`] derives for production.
//!
//! # Usage
//!
//! ```ignore
//! use archivefs_config::testing::TestEnvironment;
//!
//! let env = TestEnvironment::new()?;
//! let config = env.config();
//! // config.storage.root points into a fresh temp dir
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

use crate::Config;

/// Atomic counter for unique test IDs
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Isolated store root, removed when dropped.
pub struct TestEnvironment {
    /// Temporary directory (dropped on cleanup)
    _temp_dir: TempDir,
    /// Store root handed to the config
    pub root: PathBuf,
    /// Unique test ID
    pub test_id: u32,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> anyhow::Result<Self> {
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join(format!("store-{}", test_id));
        std::fs::create_dir_all(&root)?;

        Ok(Self {
            _temp_dir: temp_dir,
            root,
            test_id,
        })
    }

    /// Default config with the storage root pointed at this environment.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.storage.root = self.root.clone();
        // Tests do not need a 1 GiB map.
        config.storage.map_size = 64 * 1024 * 1024;
        config
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.config().storage.meta_dir()
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.config().storage.archive_dir()
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.config().storage.staging_dir()
    }

    /// Files currently sitting in staging (empty when no session is open).
    pub fn staging_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.staging_dir()) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_creates_root() {
        let env = TestEnvironment::new().unwrap();
        assert!(env.root.exists());
        assert_eq!(env.config().storage.root_dir(), env.root);
    }

    #[test]
    fn test_environment_roots_are_unique() {
        let env1 = TestEnvironment::new().unwrap();
        let env2 = TestEnvironment::new().unwrap();
        assert_ne!(env1.root, env2.root);
        assert_ne!(env1.test_id, env2.test_id);
    }

    #[test]
    fn test_layout_under_root() {
        let env = TestEnvironment::new().unwrap();
        assert_eq!(env.meta_dir(), env.root.join("meta.lmdb"));
        assert_eq!(env.archive_dir(), env.root.join("archive"));
        assert_eq!(env.staging_dir(), env.root.join("staging"));
        assert!(env.staging_files().is_empty());
    }
}
