//! # archivefs-manifest
//!
//! The ArchiveFS namespace: one [`PathEntry`] per normalized path, holding
//! attributes and a reference into the content store (or a symlink target).
//!
//! There is no separate directory structure. Parent/child relations are
//! derived from path prefixes over the flat keyspace, which is why
//! deleting or renaming a directory never touches its descendants.
//!
//! ## Storage Backend
//!
//! - [`MetadataStore`]: LMDB-backed, one ACID write transaction per operation

pub mod lmdb;

pub use lmdb::{ManifestError, ManifestStats, MetadataStore, Result};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub use archivefs_cas::ContentId;

/// File type mask and type bits, host encoding.
pub const S_IFMT: u32 = libc::S_IFMT as u32;
pub const S_IFREG: u32 = libc::S_IFREG as u32;
pub const S_IFDIR: u32 = libc::S_IFDIR as u32;
pub const S_IFLNK: u32 = libc::S_IFLNK as u32;

/// Permission bits (including setuid/setgid/sticky).
pub const PERM_MASK: u32 = 0o7777;

/// Nanoseconds since the Unix epoch.
pub type Timestamp = u64;

/// Current time as a [`Timestamp`].
pub fn now() -> Timestamp {
    to_timestamp(SystemTime::now())
}

pub fn to_timestamp(time: SystemTime) -> Timestamp {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

pub fn to_system_time(ts: Timestamp) -> SystemTime {
    UNIX_EPOCH + Duration::from_nanos(ts)
}

/// Entry type, decoded from the mode's type bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

impl EntryKind {
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            m if m == S_IFDIR => Self::Directory,
            m if m == S_IFLNK => Self::Symlink,
            _ => Self::File,
        }
    }

    pub fn type_bits(self) -> u32 {
        match self {
            Self::File => S_IFREG,
            Self::Directory => S_IFDIR,
            Self::Symlink => S_IFLNK,
        }
    }
}

/// One namespace record.
///
/// - directories never carry a `content_id`
/// - symlinks carry `symlink_target` and no `content_id`
/// - regular files carry `None` (empty, nothing published yet) or the id
///   of an archived blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub path: String,
    /// Permission bits plus type bits
    pub mode: u32,
    pub content_id: Option<ContentId>,
    pub symlink_target: Option<String>,
    pub atime: Timestamp,
    pub mtime: Timestamp,
    pub ctime: Timestamp,
}

impl PathEntry {
    pub fn kind(&self) -> EntryKind {
        EntryKind::from_mode(self.mode)
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind() == EntryKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind() == EntryKind::Symlink
    }

    pub fn permissions(&self) -> u32 {
        self.mode & PERM_MASK
    }
}

/// Normalize a namespace path.
///
/// Collapses repeated slashes, drops `.`, resolves `..` lexically (never
/// above the root), strips any trailing slash and forces a leading one.
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return "/".to_string();
    }
    let mut normalized = String::with_capacity(path.len() + 1);
    for part in parts {
        normalized.push('/');
        normalized.push_str(part);
    }
    normalized
}

/// Prefix shared by every descendant of `dir` (`dir` must be normalized).
pub fn child_prefix(dir: &str) -> String {
    if dir == "/" {
        "/".to_string()
    } else {
        format!("{}/", dir)
    }
}

/// Split a normalized path into its parent and final component.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("/", path),
    }
}
