//! # archivefs-fuse
//!
//! FUSE adapter for ArchiveFS.
//!
//! Translates inode-based kernel callbacks into the path-oriented
//! [`ArchiveFs`] surface.
//! - Inodes are assigned on first lookup and tracked in an [`InodeTable`].
//! - Byte I/O goes through copy-on-write sessions keyed by the kernel's
//!   file handle.
//! - Typed errors are mapped to errno values by [`errno`].

mod inode;

pub use inode::{child_path, InodeTable, ROOT_INO};

use archivefs_vfs::FsError;
use libc::c_int;

/// errno for a failed operation.
pub fn errno(err: &FsError) -> c_int {
    if let Some(code) = err.raw_os_error() {
        return code;
    }
    match err {
        FsError::NotFound(_) => libc::ENOENT,
        FsError::AlreadyExists(_) => libc::EEXIST,
        FsError::NotEmpty(_) => libc::ENOTEMPTY,
        FsError::IsDirectory(_) => libc::EISDIR,
        FsError::NameTooLong { .. } => libc::ENAMETOOLONG,
        FsError::InvalidOperation(_) => libc::EINVAL,
        FsError::Unsupported(_) => libc::ENOSYS,
        FsError::BadHandle(_) => libc::EBADF,
        FsError::StorageFault(_) | FsError::Metadata(_) | FsError::Content(_) | FsError::Io(_) => {
            libc::EIO
        }
    }
}

#[cfg(all(feature = "fuse", target_os = "linux"))]
mod imp {
    use std::ffi::OsStr;
    use std::path::Path;
    use std::time::{Duration, SystemTime};

    use fuser::{
        FileAttr, FileType, Filesystem, KernelConfig, MountOption, ReplyAttr, ReplyCreate,
        ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request,
        TimeOrNow,
    };
    use libc::c_int;

    use archivefs_config::{log_fuse_debug, log_fuse_error, log_fuse_info, MountConfig};
    use archivefs_manifest::{to_system_time, to_timestamp};
    use archivefs_vfs::{ArchiveFs, EntryKind, FileAttributes, FsError, OpenFlags};

    use crate::{child_path, errno, InodeTable, ROOT_INO};

    // Short: other writers can change the namespace under us.
    const TTL: Duration = Duration::from_secs(1);
    const BLOCK_SIZE: u64 = 4096;

    pub struct ArchiveFuse {
        fs: ArchiveFs,
        inodes: InodeTable,
        mount: MountConfig,
        uid: u32,
        gid: u32,
    }

    impl ArchiveFuse {
        pub fn new(fs: ArchiveFs, mount: MountConfig) -> Self {
            // SAFETY: getuid/getgid cannot fail and touch no memory.
            let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
            Self {
                fs,
                inodes: InodeTable::new(),
                mount,
                uid,
                gid,
            }
        }

        /// Mount the filesystem at the given path and block until unmounted.
        pub fn mount(self, mountpoint: &Path) -> anyhow::Result<()> {
            let opts = mount_options(&self.mount);
            log_fuse_info!(
                "Mounting",
                mountpoint = tracing::field::display(mountpoint.display())
            );
            fuser::mount2(self, mountpoint, &opts)?;
            Ok(())
        }

        fn path_of(&self, ino: u64) -> Result<String, c_int> {
            self.inodes
                .path(ino)
                .map(str::to_string)
                .ok_or(libc::ENOENT)
        }

        fn child_of(&self, parent: u64, name: &OsStr) -> Result<String, c_int> {
            let parent = self.path_of(parent)?;
            let name = name.to_str().ok_or(libc::EINVAL)?;
            Ok(child_path(&parent, name))
        }

        fn attr_for(&mut self, path: &str) -> Result<FileAttr, c_int> {
            let attrs = self.fs.getattr(path).map_err(|e| fail("getattr", path, &e))?;
            let ino = self.inodes.assign(path);
            Ok(file_attr(ino, &attrs, self.uid, self.gid))
        }
    }

    pub(crate) fn mount_options(config: &MountConfig) -> Vec<MountOption> {
        let mut opts = vec![MountOption::FSName(config.fsname.clone())];
        if config.auto_unmount {
            opts.push(MountOption::AutoUnmount);
        }
        if config.allow_other {
            opts.push(MountOption::AllowOther);
        }
        opts
    }

    fn fail(op: &str, path: &str, err: &FsError) -> c_int {
        let code = errno(err);
        if code == libc::EIO {
            log_fuse_error!(
                "Operation failed",
                op = op,
                path = path,
                error = tracing::field::display(err)
            );
        } else {
            log_fuse_debug!(
                "Operation refused",
                op = op,
                path = path,
                error = tracing::field::display(err)
            );
        }
        code
    }

    fn file_type(kind: EntryKind) -> FileType {
        match kind {
            EntryKind::File => FileType::RegularFile,
            EntryKind::Directory => FileType::Directory,
            EntryKind::Symlink => FileType::Symlink,
        }
    }

    fn file_attr(ino: u64, attrs: &FileAttributes, uid: u32, gid: u32) -> FileAttr {
        let ctime = to_system_time(attrs.ctime);
        FileAttr {
            ino,
            size: attrs.size,
            blocks: attrs.size.div_ceil(BLOCK_SIZE),
            atime: to_system_time(attrs.atime),
            mtime: to_system_time(attrs.mtime),
            ctime,
            crtime: ctime,
            kind: file_type(attrs.kind),
            perm: attrs.permissions() as u16,
            nlink: if attrs.kind == EntryKind::Directory { 2 } else { 1 },
            uid,
            gid,
            rdev: 0,
            flags: 0,
            blksize: BLOCK_SIZE as u32,
        }
    }

    fn resolve_time(time: TimeOrNow) -> SystemTime {
        match time {
            TimeOrNow::SpecificTime(t) => t,
            TimeOrNow::Now => SystemTime::now(),
        }
    }

    macro_rules! try_reply {
        ($reply:ident, $expr:expr) => {
            match $expr {
                Ok(value) => value,
                Err(code) => {
                    $reply.error(code);
                    return;
                }
            }
        };
    }

    impl Filesystem for ArchiveFuse {
        fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), c_int> {
            log_fuse_info!("Filesystem initialized");
            Ok(())
        }

        fn destroy(&mut self) {
            self.fs.release_all();
            if let Err(e) = self.fs.store().sync() {
                log_fuse_error!("Final sync failed", error = tracing::field::display(&e));
            }
        }

        fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
            let path = try_reply!(reply, self.child_of(parent, name));
            let attr = try_reply!(reply, self.attr_for(&path));
            reply.entry(&TTL, &attr, 0);
        }

        fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
            let path = try_reply!(reply, self.path_of(ino));
            let attr = try_reply!(reply, self.attr_for(&path));
            reply.attr(&TTL, &attr);
        }

        fn setattr(
            &mut self,
            _req: &Request<'_>,
            ino: u64,
            mode: Option<u32>,
            uid: Option<u32>,
            gid: Option<u32>,
            size: Option<u64>,
            atime: Option<TimeOrNow>,
            mtime: Option<TimeOrNow>,
            _ctime: Option<SystemTime>,
            fh: Option<u64>,
            _crtime: Option<SystemTime>,
            _chgtime: Option<SystemTime>,
            _bkuptime: Option<SystemTime>,
            _flags: Option<u32>,
            reply: ReplyAttr,
        ) {
            let path = try_reply!(reply, self.path_of(ino));

            if let Some(mode) = mode {
                try_reply!(reply, self.fs.chmod(&path, mode).map_err(|e| fail("chmod", &path, &e)));
            }
            if uid.is_some() || gid.is_some() {
                try_reply!(reply, self.fs.chown(&path, uid, gid).map_err(|e| fail("chown", &path, &e)));
            }
            if let Some(size) = size {
                let result = match fh {
                    Some(fh) => self.fs.ftruncate(fh, size),
                    None => self.fs.truncate(&path, size),
                };
                try_reply!(reply, result.map_err(|e| fail("truncate", &path, &e)));
            }
            if atime.is_some() || mtime.is_some() {
                let current = try_reply!(
                    reply,
                    self.fs.getattr(&path).map_err(|e| fail("getattr", &path, &e))
                );
                let atime = atime.map_or(current.atime, |t| to_timestamp(resolve_time(t)));
                let mtime = mtime.map_or(current.mtime, |t| to_timestamp(resolve_time(t)));
                try_reply!(
                    reply,
                    self.fs.utime(&path, Some((atime, mtime))).map_err(|e| fail("utime", &path, &e))
                );
            }

            let attr = try_reply!(reply, self.attr_for(&path));
            reply.attr(&TTL, &attr);
        }

        fn readlink(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyData) {
            let path = try_reply!(reply, self.path_of(ino));
            let target = try_reply!(
                reply,
                self.fs.readlink(&path).map_err(|e| fail("readlink", &path, &e))
            );
            reply.data(target.as_bytes());
        }

        fn mknod(
            &mut self,
            _req: &Request<'_>,
            parent: u64,
            name: &OsStr,
            mode: u32,
            umask: u32,
            _rdev: u32,
            reply: ReplyEntry,
        ) {
            if mode & libc::S_IFMT != libc::S_IFREG {
                reply.error(libc::ENOSYS);
                return;
            }
            let path = try_reply!(reply, self.child_of(parent, name));
            let fh = try_reply!(
                reply,
                self.fs
                    .create(&path, mode & !umask, OpenFlags::WRONLY)
                    .map_err(|e| fail("mknod", &path, &e))
            );
            try_reply!(reply, self.fs.release(fh).map(|_| ()).map_err(|e| fail("mknod", &path, &e)));
            let attr = try_reply!(reply, self.attr_for(&path));
            reply.entry(&TTL, &attr, 0);
        }

        fn mkdir(
            &mut self,
            _req: &Request<'_>,
            parent: u64,
            name: &OsStr,
            mode: u32,
            umask: u32,
            reply: ReplyEntry,
        ) {
            let path = try_reply!(reply, self.child_of(parent, name));
            try_reply!(
                reply,
                self.fs.mkdir(&path, mode & !umask).map_err(|e| fail("mkdir", &path, &e))
            );
            let attr = try_reply!(reply, self.attr_for(&path));
            reply.entry(&TTL, &attr, 0);
        }

        fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
            let path = try_reply!(reply, self.child_of(parent, name));
            try_reply!(reply, self.fs.unlink(&path).map_err(|e| fail("unlink", &path, &e)));
            self.inodes.forget(&path);
            reply.ok();
        }

        fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
            let path = try_reply!(reply, self.child_of(parent, name));
            try_reply!(reply, self.fs.rmdir(&path).map_err(|e| fail("rmdir", &path, &e)));
            self.inodes.forget(&path);
            reply.ok();
        }

        fn symlink(
            &mut self,
            _req: &Request<'_>,
            parent: u64,
            link_name: &OsStr,
            target: &Path,
            reply: ReplyEntry,
        ) {
            let path = try_reply!(reply, self.child_of(parent, link_name));
            let target = try_reply!(reply, target.to_str().ok_or(libc::EINVAL));
            try_reply!(
                reply,
                self.fs.symlink(target, &path).map_err(|e| fail("symlink", &path, &e))
            );
            let attr = try_reply!(reply, self.attr_for(&path));
            reply.entry(&TTL, &attr, 0);
        }

        fn rename(
            &mut self,
            _req: &Request<'_>,
            parent: u64,
            name: &OsStr,
            newparent: u64,
            newname: &OsStr,
            _flags: u32,
            reply: ReplyEmpty,
        ) {
            let from = try_reply!(reply, self.child_of(parent, name));
            let to = try_reply!(reply, self.child_of(newparent, newname));
            try_reply!(reply, self.fs.rename(&from, &to).map_err(|e| fail("rename", &from, &e)));
            self.inodes.rename(&from, &to);
            reply.ok();
        }

        fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
            let path = try_reply!(reply, self.path_of(ino));
            let fh = try_reply!(
                reply,
                self.fs
                    .open(&path, OpenFlags::from_bits(flags))
                    .map_err(|e| fail("open", &path, &e))
            );
            reply.opened(fh, 0);
        }

        fn read(
            &mut self,
            _req: &Request<'_>,
            _ino: u64,
            fh: u64,
            offset: i64,
            size: u32,
            _flags: i32,
            _lock_owner: Option<u64>,
            reply: ReplyData,
        ) {
            let offset = try_reply!(reply, u64::try_from(offset).map_err(|_| libc::EINVAL));
            let data = try_reply!(
                reply,
                self.fs.read(fh, offset, size as usize).map_err(|e| fail("read", "", &e))
            );
            reply.data(&data);
        }

        fn write(
            &mut self,
            _req: &Request<'_>,
            _ino: u64,
            fh: u64,
            offset: i64,
            data: &[u8],
            _write_flags: u32,
            _flags: i32,
            _lock_owner: Option<u64>,
            reply: ReplyWrite,
        ) {
            let offset = try_reply!(reply, u64::try_from(offset).map_err(|_| libc::EINVAL));
            let written = try_reply!(
                reply,
                self.fs.write(fh, offset, data).map_err(|e| fail("write", "", &e))
            );
            reply.written(written as u32);
        }

        fn flush(&mut self, _req: &Request<'_>, _ino: u64, fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
            try_reply!(reply, self.fs.flush(fh).map_err(|e| fail("flush", "", &e)));
            reply.ok();
        }

        fn release(
            &mut self,
            _req: &Request<'_>,
            _ino: u64,
            fh: u64,
            _flags: i32,
            _lock_owner: Option<u64>,
            _flush: bool,
            reply: ReplyEmpty,
        ) {
            try_reply!(reply, self.fs.release(fh).map_err(|e| fail("release", "", &e)));
            reply.ok();
        }

        fn fsync(&mut self, _req: &Request<'_>, _ino: u64, fh: u64, datasync: bool, reply: ReplyEmpty) {
            try_reply!(reply, self.fs.fsync(fh, datasync).map_err(|e| fail("fsync", "", &e)));
            reply.ok();
        }

        fn readdir(
            &mut self,
            _req: &Request<'_>,
            ino: u64,
            _fh: u64,
            offset: i64,
            mut reply: ReplyDirectory,
        ) {
            let path = try_reply!(reply, self.path_of(ino));
            let names = try_reply!(
                reply,
                self.fs.readdir(&path).map_err(|e| fail("readdir", &path, &e))
            );

            // Offsets are 1-based positions in `names`.
            for (i, name) in names.iter().enumerate().skip(offset.max(0) as usize) {
                let (child_ino, kind) = match name.as_str() {
                    "." => (ino, FileType::Directory),
                    // Parents are not tracked; the kernel resolves `..` itself.
                    ".." => (ROOT_INO, FileType::Directory),
                    _ => {
                        let child = child_path(&path, name);
                        match self.fs.getattr(&child) {
                            Ok(attrs) => (self.inodes.assign(&child), file_type(attrs.kind)),
                            Err(_) => continue,
                        }
                    }
                };
                if reply.add(child_ino, (i + 1) as i64, kind, name) {
                    break;
                }
            }
            reply.ok();
        }

        fn access(&mut self, _req: &Request<'_>, ino: u64, mask: i32, reply: ReplyEmpty) {
            let path = try_reply!(reply, self.path_of(ino));
            try_reply!(reply, self.fs.access(&path, mask).map_err(|e| fail("access", &path, &e)));
            reply.ok();
        }

        fn create(
            &mut self,
            _req: &Request<'_>,
            parent: u64,
            name: &OsStr,
            mode: u32,
            umask: u32,
            flags: i32,
            reply: ReplyCreate,
        ) {
            let path = try_reply!(reply, self.child_of(parent, name));
            let fh = try_reply!(
                reply,
                self.fs
                    .create(&path, mode & !umask, OpenFlags::from_bits(flags))
                    .map_err(|e| fail("create", &path, &e))
            );
            let attr = try_reply!(reply, self.attr_for(&path));
            reply.created(&TTL, &attr, 0, fh, 0);
        }
    }

}

#[cfg(not(all(feature = "fuse", target_os = "linux")))]
mod imp {
    use archivefs_config::MountConfig;
    use archivefs_vfs::ArchiveFs;

    /// Placeholder adapter for non-Linux or non-feature builds
    pub struct ArchiveFuse;

    impl ArchiveFuse {
        pub fn new(_fs: ArchiveFs, _mount: MountConfig) -> Self {
            #[cfg(not(target_os = "linux"))]
            tracing::warn!(
                "FUSE support is only available on Linux (current: {}).",
                std::env::consts::OS
            );
            #[cfg(all(target_os = "linux", not(feature = "fuse")))]
            tracing::warn!("ArchiveFuse is disabled. Compile with --features fuse to enable.");
            Self
        }

        pub fn mount(self, _mountpoint: &std::path::Path) -> anyhow::Result<()> {
            anyhow::bail!("FUSE not supported in this build");
        }
    }
}

pub use imp::ArchiveFuse;

/// True when this build can actually mount.
pub const fn fuse_enabled() -> bool {
    cfg!(all(feature = "fuse", target_os = "linux"))
}
