//! Shared store handle.

use std::path::{Path, PathBuf};

use archivefs_cas::{CasStats, ContentStore};
use archivefs_config::{log_store_debug, log_store_info, log_store_warn, StorageConfig};
use archivefs_manifest::{ManifestStats, MetadataStore};

use crate::Result;

/// Metadata and content stores opened together under one root.
///
/// Sessions hold it through an `Arc`; there is no process-wide instance.
pub struct Store {
    root: PathBuf,
    meta: MetadataStore,
    cas: ContentStore,
}

/// Combined counters for `archivefs stats`.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub manifest: ManifestStats,
    pub cas: CasStats,
    pub orphaned_staging: usize,
}

impl Store {
    /// Open (or initialize) the store layout described by `config`.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let root = config.root_dir();
        std::fs::create_dir_all(&root)?;

        let meta = MetadataStore::open_with_map_size(config.meta_dir(), config.map_size)?;
        let cas = ContentStore::with_dirs(config.archive_dir(), config.staging_dir())?;

        let orphans = cas.orphaned_staging()?;
        if !orphans.is_empty() {
            log_store_warn!(
                "Orphaned staging files from an earlier run",
                count = orphans.len()
            );
        }

        log_store_info!(
            "Store opened",
            root = tracing::field::display(root.display())
        );
        Ok(Self { root, meta, cas })
    }

    /// Open a store at `root` with default storage settings.
    pub fn open_at<P: AsRef<Path>>(root: P) -> Result<Self> {
        let config = StorageConfig {
            root: root.as_ref().to_path_buf(),
            ..StorageConfig::default()
        };
        Self::open(&config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> &MetadataStore {
        &self.meta
    }

    pub fn cas(&self) -> &ContentStore {
        &self.cas
    }

    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            manifest: self.meta.stats()?,
            cas: self.cas.stats()?,
            orphaned_staging: self.cas.orphaned_staging()?.len(),
        })
    }

    /// Flush the metadata environment to disk.
    pub fn sync(&self) -> Result<()> {
        self.meta.sync()?;
        log_store_debug!(
            "Metadata synced",
            root = tracing::field::display(self.root.display())
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivefs_config::testing::TestEnvironment;

    #[test]
    fn test_open_creates_layout() {
        let env = TestEnvironment::new().unwrap();
        let store = Store::open(&env.config().storage).unwrap();

        assert!(env.meta_dir().is_dir());
        assert!(env.archive_dir().is_dir());
        assert!(env.staging_dir().is_dir());
        assert!(store.meta().is_directory("/").unwrap());
        assert_eq!(store.root(), env.root.as_path());
    }

    #[test]
    fn test_stats_on_fresh_store() {
        let env = TestEnvironment::new().unwrap();
        let store = Store::open(&env.config().storage).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.manifest.dir_count, 1);
        assert_eq!(stats.cas.blob_count, 0);
        assert_eq!(stats.orphaned_staging, 0);
    }

    #[test]
    fn test_reopen_counts_orphans() {
        let env = TestEnvironment::new().unwrap();
        {
            let _store = Store::open(&env.config().storage).unwrap();
        }
        std::fs::write(env.staging_dir().join("leftover.tmp"), b"x").unwrap();

        let store = Store::open(&env.config().storage).unwrap();
        assert_eq!(store.stats().unwrap().orphaned_staging, 1);
    }
}
