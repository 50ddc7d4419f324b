//! Path-oriented call surface driven by the VFS adapter.

use std::collections::HashMap;
use std::sync::Arc;

use archivefs_cas::ContentId;
use archivefs_config::{log_session_debug, log_session_warn};
use archivefs_manifest::{normalize_path, now, EntryKind, Timestamp, PERM_MASK};

use crate::session::{FileSession, OpenFlags};
use crate::{FsError, Result, Store};

/// Permission bits for files created through `open(O_CREAT)`.
const DEFAULT_FILE_PERM: u32 = 0o644;

/// Attributes reported by [`ArchiveFs::getattr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttributes {
    pub kind: EntryKind,
    /// Permission bits plus type bits
    pub mode: u32,
    pub size: u64,
    pub atime: Timestamp,
    pub mtime: Timestamp,
    pub ctime: Timestamp,
    pub content_id: Option<ContentId>,
}

impl FileAttributes {
    pub fn permissions(&self) -> u32 {
        self.mode & PERM_MASK
    }
}

/// The ArchiveFS operations, plus the table of open sessions.
pub struct ArchiveFs {
    store: Arc<Store>,
    sessions: HashMap<u64, FileSession>,
    next_fh: u64,
}

impl ArchiveFs {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            sessions: HashMap::new(),
            next_fh: 1,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Number of open file handles.
    pub fn open_handles(&self) -> usize {
        self.sessions.len()
    }

    // === Path operations ===

    /// Attributes of `path`. While a session holds a staged copy, size
    /// and atime/mtime come from that copy.
    pub fn getattr(&self, path: &str) -> Result<FileAttributes> {
        let path = normalize_path(path);
        let entry = self.store.meta().get_entry(&path)?;

        let staged = match self.latest_session(&path, |s| s.is_staged()) {
            Some(session) if entry.is_file() => session.staged_attrs()?,
            _ => None,
        };
        let (size, atime, mtime) = match staged {
            Some(attrs) => attrs,
            None => {
                let size = match entry.kind() {
                    EntryKind::Directory => 0,
                    EntryKind::Symlink => {
                        entry.symlink_target.as_ref().map_or(0, |t| t.len() as u64)
                    }
                    EntryKind::File => self.store.cas().blob_len(entry.content_id.as_ref())?,
                };
                (size, entry.atime, entry.mtime)
            }
        };

        Ok(FileAttributes {
            kind: entry.kind(),
            mode: entry.mode,
            size,
            atime,
            mtime,
            ctime: entry.ctime,
            content_id: entry.content_id,
        })
    }

    /// Names in a directory, `.` and `..` first.
    pub fn readdir(&self, path: &str) -> Result<Vec<String>> {
        let path = normalize_path(path);
        let entry = self.store.meta().get_entry(&path)?;
        if !entry.is_dir() {
            return Err(FsError::InvalidOperation(format!(
                "{} is not a directory",
                path
            )));
        }
        Ok(self.store.meta().list_children(&path)?.collect())
    }

    pub fn mkdir(&self, path: &str, mode: u32) -> Result<()> {
        let path = normalize_path(path);
        if self.store.meta().exists(&path)? {
            return Err(FsError::AlreadyExists(path));
        }
        self.store.meta().create_directory(&path, mode)?;
        Ok(())
    }

    pub fn rmdir(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        if path == "/" {
            return Err(FsError::InvalidOperation("cannot remove /".to_string()));
        }
        let entry = self.store.meta().get_entry(&path)?;
        if !entry.is_dir() {
            return Err(FsError::InvalidOperation(format!(
                "{} is not a directory",
                path
            )));
        }
        self.store.meta().remove_directory(&path)?;
        Ok(())
    }

    /// Remove a file or symlink entry. The blob stays in the archive.
    pub fn unlink(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        let entry = self.store.meta().get_entry(&path)?;
        if entry.is_dir() {
            return Err(FsError::InvalidOperation(format!(
                "{} is a directory",
                path
            )));
        }
        self.store.meta().delete_entry(&path)?;
        Ok(())
    }

    /// Move one entry. Descendants of a renamed directory stay where they
    /// are, and open sessions keep their original path.
    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = normalize_path(from);
        let to = normalize_path(to);
        if from == "/" || to == "/" {
            return Err(FsError::InvalidOperation("cannot rename /".to_string()));
        }
        self.store.meta().rename(&from, &to)?;
        Ok(())
    }

    /// Path-level truncate.
    ///
    /// Routed to the most recently opened writable session on `path` if
    /// there is one. Otherwise only truncation to zero is supported, by
    /// replacing the entry with an empty one that keeps its permissions.
    pub fn truncate(&mut self, path: &str, len: u64) -> Result<()> {
        let path = normalize_path(path);
        if let Some(fh) = self.latest_handle(&path, |s| s.is_writable()) {
            return self.ftruncate(fh, len);
        }

        let entry = self.store.meta().get_entry(&path)?;
        if !entry.is_file() {
            return Err(FsError::InvalidOperation(format!(
                "{} is not a regular file",
                path
            )));
        }
        if len != 0 {
            return Err(FsError::Unsupported(format!(
                "truncate {} to {} bytes without an open handle",
                path, len
            )));
        }

        self.store.meta().delete_entry(&path)?;
        self.store.meta().create_file(&path, entry.permissions())?;
        Ok(())
    }

    pub fn chmod(&self, path: &str, mode: u32) -> Result<()> {
        self.store.meta().set_mode(&normalize_path(path), mode)?;
        Ok(())
    }

    /// Accepted for existing paths; ownership is not persisted.
    pub fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        let path = normalize_path(path);
        if !self.store.meta().exists(&path)? {
            return Err(FsError::NotFound(path));
        }
        log_session_debug!(
            "chown ignored",
            path = path.as_str(),
            uid = tracing::field::debug(uid),
            gid = tracing::field::debug(gid)
        );
        Ok(())
    }

    /// Set atime and mtime; `None` stamps both with the current time.
    pub fn utime(&self, path: &str, times: Option<(Timestamp, Timestamp)>) -> Result<()> {
        let (atime, mtime) = times.unwrap_or_else(|| {
            let when = now();
            (when, when)
        });
        self.store
            .meta()
            .set_times(&normalize_path(path), atime, mtime)?;
        Ok(())
    }

    pub fn readlink(&self, path: &str) -> Result<String> {
        let path = normalize_path(path);
        let entry = self.store.meta().get_entry(&path)?;
        if !entry.is_symlink() {
            return Err(FsError::InvalidOperation(format!("{} is not a symlink", path)));
        }
        entry
            .symlink_target
            .ok_or_else(|| FsError::InvalidOperation(format!("{} has no target", path)))
    }

    /// Create `link` pointing at `target`. The target is stored verbatim.
    pub fn symlink(&self, target: &str, link: &str) -> Result<()> {
        let link = normalize_path(link);
        if self.store.meta().exists(&link)? {
            return Err(FsError::AlreadyExists(link));
        }
        self.store.meta().create_symlink(&link, target)?;
        Ok(())
    }

    /// Existence check only; no permission enforcement.
    pub fn access(&self, path: &str, _mask: i32) -> Result<()> {
        let path = normalize_path(path);
        if self.store.meta().exists(&path)? {
            Ok(())
        } else {
            Err(FsError::NotFound(path))
        }
    }

    // === Handle operations ===

    /// Open an existing file; with `O_CREAT` a missing file is created.
    pub fn open(&mut self, path: &str, flags: OpenFlags) -> Result<u64> {
        let path = normalize_path(path);
        if flags.is_create() && !self.store.meta().exists(&path)? {
            return self.create(&path, DEFAULT_FILE_PERM, flags);
        }
        let session = FileSession::open(self.store.clone(), &path, flags)?;
        Ok(self.insert(session))
    }

    /// Create (or replace) an empty file and open it for writing.
    pub fn create(&mut self, path: &str, mode: u32, flags: OpenFlags) -> Result<u64> {
        let session = FileSession::create(self.store.clone(), path, mode, flags)?;
        Ok(self.insert(session))
    }

    pub fn read(&self, fh: u64, offset: u64, size: usize) -> Result<Vec<u8>> {
        self.session(fh)?.read(offset, size)
    }

    pub fn write(&mut self, fh: u64, offset: u64, data: &[u8]) -> Result<usize> {
        self.session_mut(fh)?.write(data, offset)
    }

    pub fn ftruncate(&mut self, fh: u64, len: u64) -> Result<()> {
        self.session_mut(fh)?.truncate(len)
    }

    pub fn flush(&self, fh: u64) -> Result<()> {
        self.session(fh)?.flush()
    }

    pub fn fsync(&self, fh: u64, _datasync: bool) -> Result<()> {
        self.session(fh)?.sync()
    }

    /// Close a handle, publishing its content if it was modified.
    pub fn release(&mut self, fh: u64) -> Result<Option<ContentId>> {
        let session = self.sessions.remove(&fh).ok_or(FsError::BadHandle(fh))?;
        session.release()
    }

    /// Release every open handle, e.g. on unmount. Errors are logged.
    pub fn release_all(&mut self) {
        let mut handles: Vec<u64> = self.sessions.keys().copied().collect();
        handles.sort_unstable();
        for fh in handles {
            if let Err(e) = self.release(fh) {
                log_session_warn!(
                    "Release on shutdown failed",
                    fh = fh,
                    error = tracing::field::display(&e)
                );
            }
        }
    }

    fn insert(&mut self, session: FileSession) -> u64 {
        let fh = self.next_fh;
        self.next_fh += 1;
        self.sessions.insert(fh, session);
        fh
    }

    fn session(&self, fh: u64) -> Result<&FileSession> {
        self.sessions.get(&fh).ok_or(FsError::BadHandle(fh))
    }

    fn session_mut(&mut self, fh: u64) -> Result<&mut FileSession> {
        self.sessions.get_mut(&fh).ok_or(FsError::BadHandle(fh))
    }

    /// Highest (most recently opened) handle on `path` matching `pred`.
    fn latest_handle<F>(&self, path: &str, pred: F) -> Option<u64>
    where
        F: Fn(&FileSession) -> bool,
    {
        self.sessions
            .iter()
            .filter(|(_, s)| s.path() == path && pred(s))
            .map(|(fh, _)| *fh)
            .max()
    }

    fn latest_session<F>(&self, path: &str, pred: F) -> Option<&FileSession>
    where
        F: Fn(&FileSession) -> bool,
    {
        self.latest_handle(path, pred)
            .and_then(|fh| self.sessions.get(&fh))
    }
}

impl Drop for ArchiveFs {
    fn drop(&mut self) {
        if !self.sessions.is_empty() {
            self.release_all();
        }
    }
}
