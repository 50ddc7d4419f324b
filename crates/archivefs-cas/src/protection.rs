//! Permission invariant for archived blobs.
//!
//! The archive is write-once: every published blob is read-only for all
//! users and never executable.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Permissions applied to every blob before it enters the archive (0444).
pub const BLOB_READ_ONLY_PERM: u32 = (libc::S_IRUSR | libc::S_IRGRP | libc::S_IROTH) as u32;

/// Make `path` read-only and non-executable.
pub fn enforce_blob_invariant(path: &Path) -> io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(BLOB_READ_ONLY_PERM))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_enforce_strips_write_and_exec() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob");
        fs::write(&path, b"content").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        enforce_blob_invariant(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o444);
    }
}
