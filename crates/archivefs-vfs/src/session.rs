//! Copy-on-write file sessions.
//!
//! A [`FileSession`] is bound to one path for the lifetime of one open
//! descriptor. Until something mutates it, it reads straight from the
//! archived blob. The first write or truncate copies that blob into a
//! private staged file; closing publishes the staged bytes and points the
//! path at the resulting content id.

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use archivefs_cas::{BlobReader, ContentId, StagedFile};
use archivefs_config::{log_session_debug, log_session_warn};
use archivefs_manifest::{normalize_path, now, to_timestamp, ManifestError, Timestamp};

use crate::{FsError, Result, Store};

/// Open flags in the host `O_*` encoding.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags(i32);

impl OpenFlags {
    pub const RDONLY: Self = Self(libc::O_RDONLY);
    pub const WRONLY: Self = Self(libc::O_WRONLY);
    pub const RDWR: Self = Self(libc::O_RDWR);
    pub const APPEND: Self = Self(libc::O_APPEND);
    pub const CREAT: Self = Self(libc::O_CREAT);
    pub const TRUNC: Self = Self(libc::O_TRUNC);

    pub fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> i32 {
        self.0
    }

    fn has(self, flag: i32) -> bool {
        self.0 & flag != 0
    }

    /// Write-only or read-write.
    pub fn is_writable(self) -> bool {
        matches!(self.0 & libc::O_ACCMODE, libc::O_WRONLY | libc::O_RDWR)
    }

    pub fn is_append(self) -> bool {
        self.has(libc::O_APPEND)
    }

    pub fn is_create(self) -> bool {
        self.has(libc::O_CREAT)
    }

    pub fn is_truncate(self) -> bool {
        self.has(libc::O_TRUNC)
    }
}

impl BitOr for OpenFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for OpenFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenFlags")
            .field("writable", &self.is_writable())
            .field("append", &self.is_append())
            .field("create", &self.is_create())
            .field("truncate", &self.is_truncate())
            .finish()
    }
}

/// Where a session's bytes currently come from.
enum Source {
    /// Read-only view of the archived blob (or the empty placeholder).
    Direct(BlobReader),
    /// Private writable copy, published on release.
    Staged(StagedFile),
}

/// Per-descriptor copy-on-write state.
pub struct FileSession {
    store: Arc<Store>,
    path: String,
    flags: OpenFlags,
    writable: bool,
    source: Source,
}

impl FileSession {
    /// Open an existing regular file.
    ///
    /// Read-only and plain writable opens start `Direct`. A writable open
    /// with `O_TRUNC` starts `Staged` on an empty file and skips the copy.
    pub fn open(store: Arc<Store>, path: &str, flags: OpenFlags) -> Result<Self> {
        let path = normalize_path(path);
        let entry = store.meta().get_entry(&path)?;
        if entry.is_dir() {
            return Err(FsError::IsDirectory(path));
        }
        if !entry.is_file() {
            return Err(FsError::InvalidOperation(format!(
                "{} is not a regular file",
                path
            )));
        }

        let writable = flags.is_writable();
        let source = if writable && flags.is_truncate() {
            Source::Staged(store.cas().stage_for(&path)?)
        } else {
            Source::Direct(store.cas().open_for_read(entry.content_id.as_ref())?)
        };

        log_session_debug!(
            "Session opened",
            path = path.as_str(),
            writable = writable,
            staged = matches!(source, Source::Staged(_))
        );
        Ok(Self {
            store,
            path,
            flags,
            writable,
            source,
        })
    }

    /// Create (or replace) `path` as an empty file and open it for writing.
    ///
    /// The path is checked and the staged file allocated before the
    /// placeholder entry is written, so a failure leaves the namespace
    /// untouched.
    pub fn create(store: Arc<Store>, path: &str, perm: u32, flags: OpenFlags) -> Result<Self> {
        let path = normalize_path(path);
        store.meta().check_path(&path)?;
        if store.meta().is_directory(&path)? {
            return Err(FsError::IsDirectory(path));
        }

        let staged = store.cas().stage_for(&path)?;
        store.meta().create_file(&path, perm)?;

        log_session_debug!("Session created", path = path.as_str(), perm = perm);
        Ok(Self {
            store,
            path,
            flags,
            writable: true,
            source: Source::Staged(staged),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// True once the session owns a private staged copy.
    pub fn is_staged(&self) -> bool {
        matches!(self.source, Source::Staged(_))
    }

    /// Current length of whatever backs the session.
    pub fn len(&self) -> Result<u64> {
        match &self.source {
            Source::Direct(reader) => Ok(reader.len()),
            Source::Staged(staged) => Ok(staged.len()?),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Length, atime and mtime of the staged copy; `None` while `Direct`.
    pub fn staged_attrs(&self) -> Result<Option<(u64, Timestamp, Timestamp)>> {
        let Source::Staged(staged) = &self.source else {
            return Ok(None);
        };
        let meta = staged.metadata()?;
        Ok(Some((
            meta.len(),
            to_timestamp(meta.accessed()?),
            to_timestamp(meta.modified()?),
        )))
    }

    /// Move to `Staged`, copying the current blob on the first call.
    pub fn ensure_staged(&mut self) -> Result<&mut StagedFile> {
        if let Source::Direct(reader) = &mut self.source {
            let mut staged = self.store.cas().stage_for(&self.path)?;
            let copied = reader.copy_into(&mut staged)?;
            log_session_debug!(
                "Copy-on-write",
                path = self.path.as_str(),
                bytes = copied
            );
            self.source = Source::Staged(staged);
        }

        match &mut self.source {
            Source::Staged(staged) => Ok(staged),
            Source::Direct(_) => Err(FsError::InvalidOperation(format!(
                "session for {} is not staged",
                self.path
            ))),
        }
    }

    /// Up to `len` bytes at `offset`; fewer at end of data.
    pub fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let data = match &self.source {
            Source::Direct(reader) => reader.read_at(offset, len)?,
            Source::Staged(staged) => staged.read_at(offset, len)?,
        };
        Ok(data)
    }

    /// Write `data` at `offset` (or at the end in append mode).
    pub fn write(&mut self, data: &[u8], offset: u64) -> Result<usize> {
        self.require_writable("write")?;
        let append = self.flags.is_append();
        let staged = self.ensure_staged()?;
        let written = if append {
            staged.append(data)?
        } else {
            staged.write_at(data, offset)?
        };
        Ok(written)
    }

    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.require_writable("truncate")?;
        self.ensure_staged()?.set_len(len)?;
        Ok(())
    }

    /// Push staged bytes to stable storage. Never publishes.
    pub fn flush(&self) -> Result<()> {
        if let Source::Staged(staged) = &self.source {
            staged.sync()?;
        }
        Ok(())
    }

    pub fn sync(&self) -> Result<()> {
        self.flush()
    }

    /// Close the session.
    ///
    /// A session that never staged leaves the entry untouched and returns
    /// `None`. Otherwise the staged bytes are published and, if the path
    /// still names a regular file, the entry is pointed at the new content
    /// id with fresh atime/mtime.
    pub fn release(self) -> Result<Option<ContentId>> {
        let staged = match self.source {
            Source::Direct(_) => return Ok(None),
            Source::Staged(staged) => staged,
        };

        let id = self.store.cas().publish(staged)?;
        match self.store.meta().set_file_content(&self.path, id, now()) {
            Ok(true) => {
                log_session_debug!(
                    "Session published",
                    path = self.path.as_str(),
                    content_id = tracing::field::display(id)
                );
            }
            Ok(false) => {
                log_session_warn!(
                    "Path no longer a regular file; content published but not linked",
                    path = self.path.as_str(),
                    content_id = tracing::field::display(id)
                );
            }
            Err(ManifestError::NotFound(_)) => {
                log_session_warn!(
                    "Entry vanished before close; content published but not linked",
                    path = self.path.as_str(),
                    content_id = tracing::field::display(id)
                );
            }
            Err(e) => return Err(e.into()),
        }
        Ok(Some(id))
    }

    fn require_writable(&self, op: &str) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(FsError::InvalidOperation(format!(
                "{} on read-only handle for {}",
                op, self.path
            )))
        }
    }
}

impl fmt::Debug for FileSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSession")
            .field("path", &self.path)
            .field("flags", &self.flags)
            .field("staged", &self.is_staged())
            .finish()
    }
}
