//! Private, writable scratch files for in-progress write sessions.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use crate::{hash_reader, ContentId};

/// A file in the staging area, owned by exactly one writer.
///
/// The file is removed when the value is dropped unless it was moved into
/// the archive by [`ContentStore::publish`](crate::ContentStore::publish).
/// This holds on every exit path, including errors and unwinding.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file: File,
    published: bool,
}

impl StagedFile {
    pub(crate) fn create(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;
        Ok(Self {
            path,
            file,
            published: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length in bytes.
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn metadata(&self) -> io::Result<fs::Metadata> {
        self.file.metadata()
    }

    /// Read up to `len` bytes at `offset`; short only at end of data.
    pub fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        read_full_at(&self.file, offset, len)
    }

    /// Write all of `data` at `offset`, extending the file if needed.
    pub fn write_at(&mut self, data: &[u8], offset: u64) -> io::Result<usize> {
        self.file.write_all_at(data, offset)?;
        Ok(data.len())
    }

    /// Write all of `data` at the current end of the file.
    pub fn append(&mut self, data: &[u8]) -> io::Result<usize> {
        let end = self.len()?;
        self.write_at(data, end)
    }

    pub fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.file.set_len(len)
    }

    /// Fill this file with everything `reader` yields, from offset 0.
    pub fn fill_from<R: io::Read>(&mut self, reader: &mut R) -> io::Result<u64> {
        self.file.seek(SeekFrom::Start(0))?;
        io::copy(reader, &mut self.file)
    }

    /// Push written bytes to durable storage.
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_all()
    }

    pub(crate) fn fingerprint(&mut self) -> io::Result<ContentId> {
        self.file.seek(SeekFrom::Start(0))?;
        hash_reader(&mut self.file)
    }

    /// The file has been renamed away; nothing left to clean up.
    pub(crate) fn disarm(&mut self) {
        self.published = true;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.published {
            if let Err(e) = fs::remove_file(&self.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "failed to remove staged file");
                }
            }
        }
    }
}

/// `pread` until `len` bytes are collected or the file ends.
pub(crate) fn read_full_at(file: &File, offset: u64, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match file.read_at(&mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_out_of_order_writes() {
        let temp = TempDir::new().unwrap();
        let mut staged = StagedFile::create(temp.path().join("s")).unwrap();

        staged.write_at(&[b' '; 30], 0).unwrap();
        for (offset, text) in [(5, "05"), (15, "15"), (25, "25"), (2, "02"), (19, "19")] {
            staged.write_at(text.as_bytes(), offset).unwrap();
        }

        let all = staged.read_at(0, 10_000).unwrap();
        assert_eq!(all, b"  02 05        15  19    25   ");
    }

    #[test]
    fn test_write_past_end_zero_fills() {
        let temp = TempDir::new().unwrap();
        let mut staged = StagedFile::create(temp.path().join("s")).unwrap();

        staged.write_at(b"end", 4).unwrap();
        assert_eq!(staged.len().unwrap(), 7);
        assert_eq!(staged.read_at(0, 7).unwrap(), b"\0\0\0\0end");
    }

    #[test]
    fn test_append_and_truncate() {
        let temp = TempDir::new().unwrap();
        let mut staged = StagedFile::create(temp.path().join("s")).unwrap();

        staged.write_at(b"abc", 0).unwrap();
        staged.append(b"def").unwrap();
        assert_eq!(staged.read_at(0, 6).unwrap(), b"abcdef");

        staged.set_len(2).unwrap();
        assert_eq!(staged.read_at(0, 6).unwrap(), b"ab");
        assert!(!staged.is_empty().unwrap());
        assert_eq!(staged.metadata().unwrap().len(), 2);
    }

    #[test]
    fn test_fill_from_reader() {
        let temp = TempDir::new().unwrap();
        let mut staged = StagedFile::create(temp.path().join("s")).unwrap();

        let copied = staged.fill_from(&mut &b"prior bytes"[..]).unwrap();
        assert_eq!(copied, 11);
        assert_eq!(staged.read_at(6, 5).unwrap(), b"bytes");
    }
}
