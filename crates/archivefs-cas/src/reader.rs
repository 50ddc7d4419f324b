//! Read-only view of archived content.

use std::fs::File;
use std::io::{self, Seek, SeekFrom};

use crate::staging::read_full_at;
use crate::StagedFile;

/// Source bound to an archived blob, or the always-empty placeholder.
#[derive(Debug)]
pub enum BlobReader {
    Empty,
    Blob { file: File, len: u64 },
}

impl BlobReader {
    pub(crate) fn open(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self::Blob { file, len })
    }

    pub fn len(&self) -> u64 {
        match self {
            Self::Empty => 0,
            Self::Blob { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `len` bytes at `offset`; fewer at end of data.
    pub fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        match self {
            Self::Empty => Ok(Vec::new()),
            Self::Blob { file, .. } => read_full_at(file, offset, len),
        }
    }

    /// Copy the whole blob into `staged`, replacing its contents.
    pub fn copy_into(&mut self, staged: &mut StagedFile) -> io::Result<u64> {
        match self {
            Self::Empty => {
                staged.set_len(0)?;
                Ok(0)
            }
            Self::Blob { file, .. } => {
                file.seek(SeekFrom::Start(0))?;
                let copied = staged.fill_from(file)?;
                staged.set_len(copied)?;
                Ok(copied)
            }
        }
    }
}
