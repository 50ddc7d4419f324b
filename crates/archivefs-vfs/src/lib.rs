//! # archivefs-vfs
//!
//! The ArchiveFS call surface.
//!
//! [`Store`] bundles the namespace ([`MetadataStore`]) and the content
//! store ([`ContentStore`]). [`FileSession`] gives one open descriptor
//! copy-on-write semantics over them, and [`ArchiveFs`] exposes the
//! path-oriented operations a VFS adapter drives, owning the table of open
//! sessions keyed by file handle.
//!
//! Every failure is a typed [`FsError`]; mapping to errno values is left to
//! the adapter.

pub mod fs;
pub mod session;
pub mod store;

pub use fs::{ArchiveFs, FileAttributes};
pub use session::{FileSession, OpenFlags};
pub use store::{Store, StoreStats};

pub use archivefs_cas::{CasError, ContentId, ContentStore};
pub use archivefs_manifest::{
    normalize_path, EntryKind, ManifestError, MetadataStore, PathEntry, Timestamp,
};

use std::io;

use thiserror::Error;

/// Errors surfaced by [`ArchiveFs`] and [`FileSession`].
#[derive(Error, Debug)]
pub enum FsError {
    #[error("No such entry: {0}")]
    NotFound(String),

    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    #[error("Directory not empty: {0}")]
    NotEmpty(String),

    #[error("Is a directory: {0}")]
    IsDirectory(String),

    #[error("Path too long ({len} bytes, limit {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Metadata references a blob the content store does not have.
    #[error("Storage fault: {0}")]
    StorageFault(String),

    #[error("Bad file handle: {0}")]
    BadHandle(u64),

    #[error("Metadata error: {0}")]
    Metadata(ManifestError),

    #[error("Content store error: {0}")]
    Content(CasError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, FsError>;

impl From<ManifestError> for FsError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::NotFound(path) => FsError::NotFound(path),
            ManifestError::NotEmpty(path) => FsError::NotEmpty(path),
            ManifestError::NameTooLong { len, max } => FsError::NameTooLong { len, max },
            other => FsError::Metadata(other),
        }
    }
}

impl From<CasError> for FsError {
    fn from(err: CasError) -> Self {
        match err {
            CasError::NotFound { id } => {
                FsError::StorageFault(format!("blob {} missing from archive", id))
            }
            other => FsError::Content(other),
        }
    }
}

impl FsError {
    /// Underlying OS error, when the failure came from the host filesystem.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            FsError::Io(e) => e.raw_os_error(),
            FsError::Content(CasError::Io(e)) => e.raw_os_error(),
            FsError::Metadata(ManifestError::Io(e)) => e.raw_os_error(),
            _ => None,
        }
    }
}
