//! Inode <-> path table.
//!
//! The namespace is path keyed; the kernel speaks inodes. Numbers are
//! handed out on first sight of a path and never reused within a mount.

use std::collections::HashMap;

/// Inode of `/`.
pub const ROOT_INO: u64 = 1;

#[derive(Debug)]
pub struct InodeTable {
    by_ino: HashMap<u64, String>,
    by_path: HashMap<String, u64>,
    next_ino: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    pub fn new() -> Self {
        let mut table = Self {
            by_ino: HashMap::new(),
            by_path: HashMap::new(),
            next_ino: ROOT_INO + 1,
        };
        table.by_ino.insert(ROOT_INO, "/".to_string());
        table.by_path.insert("/".to_string(), ROOT_INO);
        table
    }

    pub fn path(&self, ino: u64) -> Option<&str> {
        self.by_ino.get(&ino).map(String::as_str)
    }

    /// Inode for `path`, assigning a fresh one if needed.
    pub fn assign(&mut self, path: &str) -> u64 {
        if let Some(ino) = self.by_path.get(path) {
            return *ino;
        }
        let ino = self.next_ino;
        self.next_ino += 1;
        self.by_ino.insert(ino, path.to_string());
        self.by_path.insert(path.to_string(), ino);
        ino
    }

    /// Move the mapping for `from` (only) to `to`, dropping any inode that
    /// `to` had.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(old) = self.by_path.remove(to) {
            self.by_ino.remove(&old);
        }
        if let Some(ino) = self.by_path.remove(from) {
            self.by_ino.insert(ino, to.to_string());
            self.by_path.insert(to.to_string(), ino);
        }
    }

    pub fn forget(&mut self, path: &str) {
        if path == "/" {
            return;
        }
        if let Some(ino) = self.by_path.remove(path) {
            self.by_ino.remove(&ino);
        }
    }

    pub fn len(&self) -> usize {
        self.by_ino.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ino.is_empty()
    }
}

/// Path of `name` inside directory `parent`.
pub fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}
