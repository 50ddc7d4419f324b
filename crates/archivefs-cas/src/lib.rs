//! # archivefs-cas
//!
//! Content-Addressable Storage (CAS) for ArchiveFS.
//!
//! Blobs are keyed by their BLAKE3 digest and laid out with a 2-level
//! fan-out so no single directory grows unbounded. Writers never touch the
//! archive directly: they fill a [`StagedFile`] in the staging area and hand
//! it to [`ContentStore::publish`], which is the only place deduplication
//! happens.
//!
//! ## Directory Layout
//!
//! ```text
//! <root>/
//! ├── archive/
//! │   └── ab/
//! │       └── cd/
//! │           └── abcd1234...ef   # full 64-char hex digest, mode 0444
//! └── staging/
//!     └── 3f9a0c...e1.<uuid>      # one per open write session
//! ```

pub mod protection;
mod reader;
mod staging;

pub use reader::BlobReader;
pub use staging::StagedFile;

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// BLAKE3 hash type (32 bytes)
pub type Blake3Hash = [u8; 32];

/// Hex characters consumed by each fan-out directory level.
const SHARD_WIDTH: usize = 2;

/// Name of the blob directory under the store root.
pub const ARCHIVE_DIR: &str = "archive";

/// Name of the staging directory under the store root.
pub const STAGING_DIR: &str = "staging";

/// Errors that can occur during CAS operations
#[derive(Error, Debug)]
pub enum CasError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Blob not found: {id}")]
    NotFound { id: ContentId },

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        expected: ContentId,
        actual: ContentId,
    },

    #[error("Invalid content id: {0}")]
    InvalidId(String),
}

pub type Result<T> = std::result::Result<T, CasError>;

/// Identity of an archived blob: the BLAKE3 digest of its bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(Blake3Hash);

impl ContentId {
    pub fn from_bytes(bytes: Blake3Hash) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &Blake3Hash {
        &self.0
    }

    /// Lowercase 64-character hex form used for paths and index keys.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.to_hex())
    }
}

impl FromStr for ContentId {
    type Err = CasError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s).ok_or_else(|| CasError::InvalidId(s.to_string()))
    }
}

/// Content-addressable blob store with a private staging area.
#[derive(Debug, Clone)]
pub struct ContentStore {
    archive: PathBuf,
    staging: PathBuf,
}

impl ContentStore {
    /// Open (or create) a store rooted at `root`, using the default
    /// `archive/` and `staging/` subdirectories.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        Self::with_dirs(root.join(ARCHIVE_DIR), root.join(STAGING_DIR))
    }

    /// Open a store with explicit archive and staging directories.
    ///
    /// Both should live on the same filesystem: publishing is a rename.
    pub fn with_dirs<A: AsRef<Path>, S: AsRef<Path>>(archive: A, staging: S) -> Result<Self> {
        let archive = archive.as_ref().to_path_buf();
        let staging = staging.as_ref().to_path_buf();
        fs::create_dir_all(&archive)?;
        fs::create_dir_all(&staging)?;
        Ok(Self { archive, staging })
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    /// Compute the content id of the given bytes.
    #[inline]
    pub fn compute_id(data: &[u8]) -> ContentId {
        ContentId(*blake3::hash(data).as_bytes())
    }

    /// Deterministic location of a staging file for `token`.
    pub fn staging_path(&self, token: &str) -> PathBuf {
        self.staging.join(token)
    }

    /// Allocate a new, empty staged file for `token`.
    ///
    /// Fails if a file already exists for that token.
    pub fn stage(&self, token: &str) -> Result<StagedFile> {
        Ok(StagedFile::create(self.staging_path(token))?)
    }

    /// Allocate a staged file for a write session on `path`.
    ///
    /// The token is a path-derived prefix plus a random suffix, so
    /// concurrent sessions on one path never share a staging file.
    pub fn stage_for(&self, path: &str) -> Result<StagedFile> {
        let path_hash = blake3::hash(path.as_bytes()).to_hex();
        let token = format!("{}.{}", &path_hash[..16], uuid::Uuid::new_v4().simple());
        self.stage(&token)
    }

    /// Where a blob with this id lives, without touching the filesystem.
    pub fn blob_path(&self, id: &ContentId) -> PathBuf {
        let hex = id.to_hex();
        let l1 = &hex[..SHARD_WIDTH];
        let l2 = &hex[SHARD_WIDTH..2 * SHARD_WIDTH];
        self.archive.join(l1).join(l2).join(&hex)
    }

    /// Where a blob with this id lives, creating the shard directories.
    pub fn sharded_path(&self, id: &ContentId) -> Result<PathBuf> {
        let path = self.blob_path(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Move a staged file into the archive, returning its content id.
    ///
    /// When a blob with the same fingerprint already exists, it is assumed
    /// to be identical and the staged copy is discarded without comparing
    /// bytes. Either way the staged file no longer exists afterwards.
    #[instrument(skip(self, staged), fields(staged = %staged.path().display()), level = "debug")]
    pub fn publish(&self, mut staged: StagedFile) -> Result<ContentId> {
        staged.sync()?;
        let id = staged.fingerprint()?;
        let dest = self.sharded_path(&id)?;

        if dest.exists() {
            debug!(%id, "blob already archived, discarding staged copy");
            return Ok(id);
        }

        protection::enforce_blob_invariant(staged.path())?;

        if let Err(e) = fs::rename(staged.path(), &dest) {
            // Another publisher won the race with identical content.
            if dest.exists() {
                debug!(%id, "lost publish race, blob already archived");
                return Ok(id);
            }
            return Err(CasError::Io(e));
        }
        staged.disarm();

        debug!(%id, dest = %dest.display(), "published blob");
        Ok(id)
    }

    /// Stage and publish an in-memory buffer.
    pub fn store(&self, data: &[u8]) -> Result<ContentId> {
        let mut staged = self.stage_for("")?;
        staged.write_at(data, 0)?;
        self.publish(staged)
    }

    /// Open content for reading. `None` is the empty-content placeholder.
    pub fn open_for_read(&self, id: Option<&ContentId>) -> Result<BlobReader> {
        match id {
            None => Ok(BlobReader::Empty),
            Some(id) => {
                let path = self.blob_path(id);
                match File::open(&path) {
                    Ok(file) => Ok(BlobReader::open(file)?),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        Err(CasError::NotFound { id: *id })
                    }
                    Err(e) => Err(CasError::Io(e)),
                }
            }
        }
    }

    /// Byte length of the referenced content (0 for the placeholder).
    pub fn blob_len(&self, id: Option<&ContentId>) -> Result<u64> {
        match id {
            None => Ok(0),
            Some(id) => match fs::metadata(self.blob_path(id)) {
                Ok(meta) => Ok(meta.len()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    Err(CasError::NotFound { id: *id })
                }
                Err(e) => Err(CasError::Io(e)),
            },
        }
    }

    /// Check if a blob exists in the archive.
    pub fn exists(&self, id: &ContentId) -> bool {
        self.blob_path(id).exists()
    }

    /// Re-hash an archived blob and compare it with its id.
    ///
    /// Never called on the publish path.
    pub fn verify(&self, id: &ContentId) -> Result<()> {
        let path = self.blob_path(id);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CasError::NotFound { id: *id })
            }
            Err(e) => return Err(CasError::Io(e)),
        };
        let actual = hash_reader(&mut file)?;
        if actual != *id {
            return Err(CasError::HashMismatch {
                expected: *id,
                actual,
            });
        }
        Ok(())
    }

    /// Iterate over every archived blob id.
    pub fn iter(&self) -> impl Iterator<Item = Result<ContentId>> {
        walkdir::WalkDir::new(&self.archive)
            .min_depth(3)
            .max_depth(3)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_file() => entry
                    .file_name()
                    .to_str()
                    .and_then(ContentId::from_hex)
                    .map(Ok),
                Ok(_) => None,
                Err(e) => Some(Err(CasError::Io(e.into()))),
            })
    }

    /// Get statistics about the archive.
    pub fn stats(&self) -> Result<CasStats> {
        let mut stats = CasStats::default();
        for id in self.iter() {
            let id = id?;
            stats.blob_count += 1;
            stats.total_bytes += fs::metadata(self.blob_path(&id))?.len();
        }
        Ok(stats)
    }

    /// Staging files present on disk.
    ///
    /// Called at startup, before any session exists, every entry is a
    /// leftover from a process that died mid-write.
    pub fn orphaned_staging(&self) -> Result<Vec<PathBuf>> {
        let mut orphans = Vec::new();
        for entry in fs::read_dir(&self.staging)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                orphans.push(entry.path());
            }
        }
        Ok(orphans)
    }
}

/// Stream a reader through BLAKE3.
pub(crate) fn hash_reader<R: io::Read>(reader: &mut R) -> io::Result<ContentId> {
    let mut hasher = blake3::Hasher::new();
    io::copy(reader, &mut hasher)?;
    Ok(ContentId(*hasher.finalize().as_bytes()))
}

/// Statistics about the archive
#[derive(Debug, Clone, Default)]
pub struct CasStats {
    /// Number of unique blobs stored
    pub blob_count: u64,
    /// Total bytes stored (deduplicated)
    pub total_bytes: u64,
}

impl CasStats {
    /// Calculate average blob size
    pub fn avg_blob_size(&self) -> u64 {
        if self.blob_count == 0 {
            0
        } else {
            self.total_bytes / self.blob_count
        }
    }
}
