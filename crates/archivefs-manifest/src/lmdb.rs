//! LMDB-backed metadata store.
//!
//! Two named databases share one environment:
//! - `entries`: normalized path → [`PathEntry`]
//! - `by_content`: `id ++ blake3(path)` → path, secondary index on content id
//!
//! Path keys are bounded by the LMDB key limit; longer paths are refused
//! with [`ManifestError::NameTooLong`] before anything is written.
//!
//! Every public mutation runs in its own write transaction and commits
//! before returning. Sequences of calls are not atomic as a whole.

use std::path::Path;

use heed::types::{Bytes, DecodeIgnore, SerdeBincode, Str};
use heed::{Database, Env, EnvOpenOptions, RwTxn};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    child_prefix, normalize_path, now, ContentId, EntryKind, PathEntry, Timestamp, PERM_MASK,
    S_IFDIR, S_IFLNK, S_IFMT, S_IFREG,
};

/// Metadata store errors
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Directory not empty: {0}")]
    NotEmpty(String),

    #[error("Path too long ({len} bytes, limit {max})")]
    NameTooLong { len: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, ManifestError>;

/// Durable namespace of [`PathEntry`] records.
pub struct MetadataStore {
    /// LMDB environment
    env: Env,

    /// Path → PathEntry database
    entries: Database<Str, SerdeBincode<PathEntry>>,

    /// Content id index, fixed-size keys
    by_content: Database<Bytes, Str>,
}

impl MetadataStore {
    /// Default LMDB map size: 1GB
    pub const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;

    /// Maximum readers
    const MAX_READERS: u32 = 128;

    /// Open or create a metadata store in the directory `path`.
    ///
    /// Guarantees that the root directory entry exists afterwards.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_map_size(path, Self::DEFAULT_MAP_SIZE)
    }

    pub fn open_with_map_size<P: AsRef<Path>>(path: P, map_size: usize) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path
        // and never concurrently with a different map size.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_readers(Self::MAX_READERS)
                .max_dbs(2)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let entries = env.create_database(&mut wtxn, Some("entries"))?;
        let by_content = env.create_database(&mut wtxn, Some("by_content"))?;
        wtxn.commit()?;

        let store = Self {
            env,
            entries,
            by_content,
        };
        store.create_entry("/", S_IFDIR | 0o777, None, None, now())?;

        debug!("Opened metadata store at {:?}", path);
        Ok(store)
    }

    /// Longest path, in bytes, that can be stored.
    pub fn max_path_len(&self) -> usize {
        self.env.max_key_size()
    }

    /// Fail with [`ManifestError::NameTooLong`] if `path` cannot be stored.
    pub fn check_path(&self, path: &str) -> Result<()> {
        let max = self.max_path_len();
        if path.len() > max {
            return Err(ManifestError::NameTooLong {
                len: path.len(),
                max,
            });
        }
        Ok(())
    }

    fn fits(&self, path: &str) -> bool {
        path.len() <= self.max_path_len()
    }

    /// Look up the entry for `path`.
    pub fn get_entry(&self, path: &str) -> Result<PathEntry> {
        let path = normalize_path(path);
        if !self.fits(&path) {
            return Err(ManifestError::NotFound(path));
        }
        let rtxn = self.env.read_txn()?;
        self.entries
            .get(&rtxn, &path)?
            .ok_or(ManifestError::NotFound(path))
    }

    pub fn exists(&self, path: &str) -> Result<bool> {
        let path = normalize_path(path);
        if !self.fits(&path) {
            return Ok(false);
        }
        let rtxn = self.env.read_txn()?;
        Ok(self
            .entries
            .remap_data_type::<DecodeIgnore>()
            .get(&rtxn, &path)?
            .is_some())
    }

    pub fn mode(&self, path: &str) -> Result<u32> {
        Ok(self.get_entry(path)?.mode)
    }

    /// False when the path is missing; use [`exists`](Self::exists) to tell
    /// the two apart.
    pub fn is_directory(&self, path: &str) -> Result<bool> {
        match self.get_entry(path) {
            Ok(entry) => Ok(entry.is_dir()),
            Err(ManifestError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Insert or replace the entry for `path`, stamping all three times
    /// with `when`.
    #[instrument(skip(self), level = "debug")]
    pub fn create_entry(
        &self,
        path: &str,
        mode: u32,
        content_id: Option<ContentId>,
        symlink_target: Option<&str>,
        when: Timestamp,
    ) -> Result<()> {
        let entry = PathEntry {
            path: normalize_path(path),
            mode,
            content_id,
            symlink_target: symlink_target.map(str::to_string),
            atime: when,
            mtime: when,
            ctime: when,
        };
        self.check_path(&entry.path)?;
        let mut wtxn = self.env.write_txn()?;
        let previous = self.entries.get(&wtxn, &entry.path)?;
        self.put_entry(&mut wtxn, &entry, previous.as_ref())?;
        wtxn.commit()?;
        Ok(())
    }

    /// Empty regular file with the given permission bits.
    pub fn create_file(&self, path: &str, perm: u32) -> Result<()> {
        self.create_entry(path, S_IFREG | (perm & PERM_MASK), None, None, now())
    }

    pub fn create_directory(&self, path: &str, perm: u32) -> Result<()> {
        self.create_entry(path, S_IFDIR | (perm & PERM_MASK), None, None, now())
    }

    pub fn create_symlink(&self, path: &str, target: &str) -> Result<()> {
        self.create_entry(path, S_IFLNK | 0o777, None, Some(target), now())
    }

    pub fn set_content_id(&self, path: &str, id: Option<ContentId>) -> Result<()> {
        self.update(path, |entry| entry.content_id = id)
    }

    /// Point a regular file at `id` and stamp atime/mtime with `when`.
    ///
    /// Returns `false`, leaving the entry alone, when `path` now holds a
    /// directory or symlink.
    pub fn set_file_content(&self, path: &str, id: ContentId, when: Timestamp) -> Result<bool> {
        self.update_if(path, PathEntry::is_file, |entry| {
            entry.content_id = Some(id);
            entry.atime = when;
            entry.mtime = when;
        })
    }

    /// Replace the permission bits, keeping the type bits.
    pub fn set_mode(&self, path: &str, mode: u32) -> Result<()> {
        self.update(path, |entry| {
            entry.mode = (entry.mode & !PERM_MASK) | (mode & PERM_MASK);
        })
    }

    pub fn set_times(&self, path: &str, atime: Timestamp, mtime: Timestamp) -> Result<()> {
        self.update(path, |entry| {
            entry.atime = atime;
            entry.mtime = mtime;
        })
    }

    /// Remove the entry for `path` if present. No cascade.
    #[instrument(skip(self), level = "debug")]
    pub fn delete_entry(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        let mut wtxn = self.env.write_txn()?;
        self.remove_entry(&mut wtxn, &path)?;
        wtxn.commit()?;
        Ok(())
    }

    /// Remove a directory entry that has no descendants.
    #[instrument(skip(self), level = "debug")]
    pub fn remove_directory(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        if !self.fits(&path) {
            return Err(ManifestError::NotFound(path));
        }
        let mut wtxn = self.env.write_txn()?;

        if self.entries.get(&wtxn, &path)?.is_none() {
            return Err(ManifestError::NotFound(path));
        }

        let prefix = child_prefix(&path);
        let has_children = {
            let mut found = false;
            let keys = self.entries.remap_data_type::<DecodeIgnore>();
            for item in keys.prefix_iter(&wtxn, &prefix)? {
                let (key, ()) = item?;
                if key != path {
                    found = true;
                    break;
                }
            }
            found
        };
        if has_children {
            return Err(ManifestError::NotEmpty(path));
        }

        self.remove_entry(&mut wtxn, &path)?;
        wtxn.commit()?;
        Ok(())
    }

    /// Names directly under `path`, preceded by `.` and `..`.
    ///
    /// Names come back in key order, from a snapshot taken in a single
    /// read transaction.
    pub fn list_children(&self, path: &str) -> Result<impl Iterator<Item = String>> {
        let prefix = child_prefix(&normalize_path(path));
        let rtxn = self.env.read_txn()?;

        let mut names = Vec::new();
        let keys = self.entries.remap_data_type::<DecodeIgnore>();
        for item in keys.prefix_iter(&rtxn, &prefix)? {
            let (key, ()) = item?;
            let name = &key[prefix.len()..];
            if name.is_empty() || name.contains('/') {
                continue;
            }
            names.push(name.to_string());
        }

        Ok([".".to_string(), "..".to_string()].into_iter().chain(names))
    }

    /// Move the single entry at `from` to `to`.
    ///
    /// Entries below `from` keep their paths. An entry already at `to` is
    /// replaced.
    #[instrument(skip(self), level = "debug")]
    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = normalize_path(from);
        let to = normalize_path(to);
        self.check_path(&to)?;
        if from == to {
            return self.get_entry(&from).map(|_| ());
        }

        let mut wtxn = self.env.write_txn()?;
        let mut entry = self
            .remove_entry(&mut wtxn, &from)?
            .ok_or_else(|| ManifestError::NotFound(from.clone()))?;
        let replaced = self.entries.get(&wtxn, &to)?;
        entry.path = to;
        self.put_entry(&mut wtxn, &entry, replaced.as_ref())?;
        wtxn.commit()?;
        Ok(())
    }

    /// Paths whose entry references `id`.
    pub fn paths_with_content(&self, id: &ContentId) -> Result<Vec<String>> {
        let rtxn = self.env.read_txn()?;
        let mut paths = Vec::new();
        for item in self.by_content.prefix_iter(&rtxn, &id.as_bytes()[..])? {
            let (_, path) = item?;
            paths.push(path.to_string());
        }
        paths.sort_unstable();
        Ok(paths)
    }

    /// Number of entries, root included.
    pub fn len(&self) -> Result<usize> {
        let rtxn = self.env.read_txn()?;
        Ok(self.entries.len(&rtxn)? as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// All entries in key order.
    ///
    /// Note: This is an expensive operation for large namespaces
    pub fn iter(&self) -> Result<Vec<PathEntry>> {
        let rtxn = self.env.read_txn()?;
        let mut result = Vec::new();
        for item in self.entries.iter(&rtxn)? {
            let (_, entry) = item?;
            result.push(entry);
        }
        Ok(result)
    }

    /// Sync/flush LMDB to disk
    pub fn sync(&self) -> Result<()> {
        self.env.force_sync()?;
        Ok(())
    }

    pub fn stats(&self) -> Result<ManifestStats> {
        let mut stats = ManifestStats::default();
        for entry in self.iter()? {
            match entry.kind() {
                EntryKind::File => {
                    stats.file_count += 1;
                    if entry.content_id.is_none() {
                        stats.empty_file_count += 1;
                    }
                }
                EntryKind::Directory => stats.dir_count += 1,
                EntryKind::Symlink => stats.symlink_count += 1,
            }
        }
        Ok(stats)
    }

    /// Read-modify-write of one entry in a single transaction.
    fn update<F: FnOnce(&mut PathEntry)>(&self, path: &str, f: F) -> Result<()> {
        self.update_if(path, |_| true, f).map(|_| ())
    }

    /// As [`update`](Self::update), but only when `pred` holds for the
    /// current entry. Returns whether the entry was changed.
    fn update_if<P, F>(&self, path: &str, pred: P, f: F) -> Result<bool>
    where
        P: FnOnce(&PathEntry) -> bool,
        F: FnOnce(&mut PathEntry),
    {
        let path = normalize_path(path);
        if !self.fits(&path) {
            return Err(ManifestError::NotFound(path));
        }
        let mut wtxn = self.env.write_txn()?;
        let previous = self
            .entries
            .get(&wtxn, &path)?
            .ok_or_else(|| ManifestError::NotFound(path.clone()))?;
        if !pred(&previous) {
            return Ok(false);
        }
        let mut entry = previous.clone();
        f(&mut entry);
        debug_assert_eq!(entry.mode & S_IFMT, previous.mode & S_IFMT);
        self.put_entry(&mut wtxn, &entry, Some(&previous))?;
        wtxn.commit()?;
        Ok(true)
    }

    fn put_entry(
        &self,
        wtxn: &mut RwTxn,
        entry: &PathEntry,
        previous: Option<&PathEntry>,
    ) -> heed::Result<()> {
        if let Some(PathEntry {
            path,
            content_id: Some(id),
            ..
        }) = previous
        {
            self.by_content.delete(wtxn, &index_key(id, path)[..])?;
        }
        self.entries.put(wtxn, &entry.path, entry)?;
        if let Some(id) = &entry.content_id {
            self.by_content
                .put(wtxn, &index_key(id, &entry.path)[..], &entry.path)?;
        }
        Ok(())
    }

    fn remove_entry(&self, wtxn: &mut RwTxn, path: &str) -> heed::Result<Option<PathEntry>> {
        if !self.fits(path) {
            return Ok(None);
        }
        let previous = self.entries.get(wtxn, path)?;
        if let Some(entry) = &previous {
            if let Some(id) = &entry.content_id {
                self.by_content.delete(wtxn, &index_key(id, path)[..])?;
            }
            self.entries.delete(wtxn, path)?;
        }
        Ok(previous)
    }
}

/// Content id followed by the path hash.
fn index_key(id: &ContentId, path: &str) -> [u8; 64] {
    let mut key = [0u8; 64];
    key[..32].copy_from_slice(id.as_bytes());
    key[32..].copy_from_slice(blake3::hash(path.as_bytes()).as_bytes());
    key
}

/// Statistics about the namespace
#[derive(Debug, Clone, Default)]
pub struct ManifestStats {
    pub file_count: u64,
    /// Regular files still holding the empty placeholder
    pub empty_file_count: u64,
    pub dir_count: u64,
    pub symlink_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivefs_cas::ContentStore;
    use tempfile::TempDir;

    fn open_store(temp: &TempDir) -> MetadataStore {
        MetadataStore::open(temp.path().join("meta.lmdb")).unwrap()
    }

    #[test]
    fn test_root_exists_after_open() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let root = store.get_entry("/").unwrap();
        assert!(root.is_dir());
        assert_eq!(root.permissions(), 0o777);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_create_and_get() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store
            .create_entry("/a.txt", S_IFREG | 0o644, None, None, 42)
            .unwrap();

        let entry = store.get_entry("/a.txt").unwrap();
        assert!(entry.is_file());
        assert_eq!(entry.content_id, None);
        assert_eq!((entry.atime, entry.mtime, entry.ctime), (42, 42, 42));
        assert!(store.exists("a.txt").unwrap());
        assert_eq!(store.mode("/a.txt").unwrap(), S_IFREG | 0o644);
    }

    #[test]
    fn test_missing_entry() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(matches!(
            store.get_entry("/nope"),
            Err(ManifestError::NotFound(_))
        ));
        assert!(!store.exists("/nope").unwrap());
        assert!(!store.is_directory("/nope").unwrap());
        assert!(matches!(
            store.set_mode("/nope", 0o600),
            Err(ManifestError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_mode_keeps_type_bits() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.create_directory("/d", 0o755).unwrap();
        store.set_mode("/d", S_IFREG | 0o700).unwrap();

        let entry = store.get_entry("/d").unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.permissions(), 0o700);
    }

    #[test]
    fn test_set_times() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.create_entry("/f", S_IFREG | 0o644, None, None, 1).unwrap();
        store.set_times("/f", 10, 20).unwrap();

        let entry = store.get_entry("/f").unwrap();
        assert_eq!((entry.atime, entry.mtime, entry.ctime), (10, 20, 1));
    }

    #[test]
    fn test_persistence_across_reopen() {
        let temp = TempDir::new().unwrap();
        let id = ContentStore::compute_id(b"persist");
        {
            let store = open_store(&temp);
            store.create_file("/p", 0o644).unwrap();
            store.set_content_id("/p", Some(id)).unwrap();
            store.sync().unwrap();
        }

        let store = open_store(&temp);
        assert_eq!(store.get_entry("/p").unwrap().content_id, Some(id));
    }

    #[test]
    fn test_content_index_follows_updates() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let x = ContentStore::compute_id(b"x");
        let y = ContentStore::compute_id(b"y");

        store.create_file("/b", 0o644).unwrap();
        store.create_file("/c", 0o644).unwrap();
        store.set_content_id("/b", Some(x)).unwrap();
        store.set_content_id("/c", Some(x)).unwrap();
        assert_eq!(store.paths_with_content(&x).unwrap(), vec!["/b", "/c"]);

        store.set_content_id("/b", Some(y)).unwrap();
        assert_eq!(store.paths_with_content(&x).unwrap(), vec!["/c"]);
        assert_eq!(store.paths_with_content(&y).unwrap(), vec!["/b"]);

        store.delete_entry("/c").unwrap();
        assert!(store.paths_with_content(&x).unwrap().is_empty());

        store.rename("/b", "/moved").unwrap();
        assert_eq!(store.paths_with_content(&y).unwrap(), vec!["/moved"]);
    }

    #[test]
    fn test_delete_is_unconditional() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.delete_entry("/never-existed").unwrap();
        store.create_directory("/d", 0o755).unwrap();
        store.create_file("/d/e", 0o644).unwrap();
        store.delete_entry("/d").unwrap();

        assert!(!store.exists("/d").unwrap());
        assert!(store.exists("/d/e").unwrap());
    }

    #[test]
    fn test_remove_directory() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(matches!(
            store.remove_directory("/d"),
            Err(ManifestError::NotFound(_))
        ));

        store.create_directory("/d", 0o755).unwrap();
        store.create_file("/d/e", 0o644).unwrap();
        assert!(matches!(
            store.remove_directory("/d"),
            Err(ManifestError::NotEmpty(_))
        ));

        // A sibling sharing the name prefix is not a child.
        store.create_directory("/dd", 0o755).unwrap();
        store.delete_entry("/d/e").unwrap();
        store.remove_directory("/d").unwrap();
        assert!(!store.exists("/d").unwrap());
        assert!(store.exists("/dd").unwrap());
    }

    #[test]
    fn test_list_children() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.create_directory("/d", 0o755).unwrap();
        store.create_file("/d/a", 0o644).unwrap();
        store.create_directory("/d/sub", 0o755).unwrap();
        store.create_file("/d/sub/deep", 0o644).unwrap();
        store.create_file("/top", 0o644).unwrap();

        let names: Vec<_> = store.list_children("/d").unwrap().collect();
        assert_eq!(names, vec![".", "..", "a", "sub"]);

        let root: Vec<_> = store.list_children("/").unwrap().collect();
        assert_eq!(root, vec![".", "..", "d", "top"]);

        let empty: Vec<_> = store.list_children("/d/sub/deep").unwrap().collect();
        assert_eq!(empty, vec![".", ".."]);
    }

    #[test]
    fn test_rename_does_not_cascade() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.create_directory("/old", 0o755).unwrap();
        store.create_file("/old/child", 0o644).unwrap();
        store.rename("/old", "/new").unwrap();

        assert!(store.is_directory("/new").unwrap());
        assert!(!store.exists("/old").unwrap());
        assert!(store.exists("/old/child").unwrap());
        assert!(!store.exists("/new/child").unwrap());
        assert_eq!(store.get_entry("/new").unwrap().path, "/new");
    }

    #[test]
    fn test_rename_replaces_target_and_requires_source() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.create_file("/src", 0o600).unwrap();
        store.create_file("/dst", 0o644).unwrap();
        store.rename("/src", "/dst").unwrap();
        assert_eq!(store.get_entry("/dst").unwrap().permissions(), 0o600);
        assert_eq!(store.len().unwrap(), 2);

        assert!(matches!(
            store.rename("/src", "/elsewhere"),
            Err(ManifestError::NotFound(_))
        ));
    }

    #[test]
    fn test_long_path_content_is_indexed() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let dir = format!("/{}", "d".repeat(250));
        let file = format!("{}/{}", dir, "g".repeat(208));
        assert_eq!(file.len(), 460);
        let id = ContentStore::compute_id(b"long");

        store.create_directory(&dir, 0o755).unwrap();
        store.create_file(&file, 0o644).unwrap();
        assert!(store.set_file_content(&file, id, 7).unwrap());

        let entry = store.get_entry(&file).unwrap();
        assert_eq!(entry.content_id, Some(id));
        assert_eq!(store.paths_with_content(&id).unwrap(), vec![file.clone()]);

        store.delete_entry(&file).unwrap();
        assert!(store.paths_with_content(&id).unwrap().is_empty());
    }

    #[test]
    fn test_path_over_key_limit_is_refused() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let max = store.max_path_len();
        let long = format!("/{}", "x".repeat(max));

        assert!(matches!(
            store.create_file(&long, 0o644),
            Err(ManifestError::NameTooLong { .. })
        ));
        assert!(!store.exists(&long).unwrap());

        store.create_file("/short", 0o644).unwrap();
        assert!(matches!(
            store.rename("/short", &long),
            Err(ManifestError::NameTooLong { .. })
        ));
        assert!(store.exists("/short").unwrap());
    }

    #[test]
    fn test_set_file_content_skips_non_files() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let id = ContentStore::compute_id(b"stray");

        store.create_directory("/d", 0o755).unwrap();
        store.create_symlink("/l", "d").unwrap();
        assert!(!store.set_file_content("/d", id, 5).unwrap());
        assert!(!store.set_file_content("/l", id, 5).unwrap());
        assert_eq!(store.get_entry("/d").unwrap().content_id, None);
        assert_eq!(store.get_entry("/l").unwrap().content_id, None);
        assert!(store.paths_with_content(&id).unwrap().is_empty());

        assert!(matches!(
            store.set_file_content("/missing", id, 5),
            Err(ManifestError::NotFound(_))
        ));
    }

    #[test]
    fn test_symlink_entry_and_stats() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.create_symlink("/link", "target").unwrap();
        store.create_file("/f", 0o644).unwrap();

        let link = store.get_entry("/link").unwrap();
        assert!(link.is_symlink());
        assert_eq!(link.symlink_target.as_deref(), Some("target"));
        assert_eq!(link.content_id, None);

        let stats = store.stats().unwrap();
        assert_eq!(stats.dir_count, 1);
        assert_eq!(stats.file_count, 1);
        assert_eq!(stats.empty_file_count, 1);
        assert_eq!(stats.symlink_count, 1);
    }
}
