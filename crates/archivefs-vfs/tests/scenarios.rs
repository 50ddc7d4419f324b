//! End-to-end scenarios over the ArchiveFS call surface.

use std::sync::Arc;

use archivefs_config::testing::TestEnvironment;
use archivefs_vfs::{ArchiveFs, ContentStore, EntryKind, FsError, OpenFlags, Store};

fn mount() -> (TestEnvironment, ArchiveFs) {
    let env = TestEnvironment::new().unwrap();
    let store = Arc::new(Store::open(&env.config().storage).unwrap());
    (env, ArchiveFs::new(store))
}

fn write_file(fs: &mut ArchiveFs, path: &str, data: &[u8]) {
    let fh = fs.create(path, 0o644, OpenFlags::WRONLY).unwrap();
    fs.write(fh, 0, data).unwrap();
    fs.release(fh).unwrap();
}

fn read_file(fs: &mut ArchiveFs, path: &str) -> Vec<u8> {
    let fh = fs.open(path, OpenFlags::RDONLY).unwrap();
    let data = fs.read(fh, 0, 1 << 20).unwrap();
    fs.release(fh).unwrap();
    data
}

#[test]
fn scenario_create_write_release() {
    let (_env, mut fs) = mount();
    write_file(&mut fs, "/a", b"hello");

    let attr = fs.getattr("/a").unwrap();
    assert_eq!(attr.size, 5);

    let expected = ContentStore::compute_id(b"hello");
    assert_eq!(attr.content_id, Some(expected));
    let stats = fs.store().cas().stats().unwrap();
    assert_eq!(stats.blob_count, 1);
    assert!(fs.store().cas().exists(&expected));
}

#[test]
fn scenario_identical_content_dedups() {
    let (_env, mut fs) = mount();
    write_file(&mut fs, "/b", b"x");
    write_file(&mut fs, "/c", b"x");

    let b = fs.getattr("/b").unwrap().content_id.unwrap();
    let c = fs.getattr("/c").unwrap().content_id.unwrap();
    assert_eq!(b, c);
    assert_eq!(fs.store().cas().stats().unwrap().blob_count, 1);

    let mut paths = fs.store().meta().paths_with_content(&b).unwrap();
    paths.sort();
    assert_eq!(paths, vec!["/b", "/c"]);
}

#[test]
fn scenario_rmdir_non_empty() {
    let (_env, mut fs) = mount();
    fs.mkdir("/d", 0o755).unwrap();
    let fh = fs.create("/d/e", 0o644, OpenFlags::WRONLY).unwrap();
    fs.release(fh).unwrap();

    assert!(matches!(fs.rmdir("/d"), Err(FsError::NotEmpty(_))));
    assert!(fs.getattr("/d").is_ok());
}

#[test]
fn scenario_symlink() {
    let (_env, fs) = mount();
    fs.symlink("target", "/link").unwrap();

    assert_eq!(fs.readlink("/link").unwrap(), "target");
    let attr = fs.getattr("/link").unwrap();
    assert_eq!(attr.kind, EntryKind::Symlink);
    assert_eq!(attr.mode & libc::S_IFMT as u32, libc::S_IFLNK as u32);
    assert_eq!(attr.content_id, None);
}

#[test]
fn scenario_copy_on_write_extends_file() {
    let (env, mut fs) = mount();
    write_file(&mut fs, "/a", b"hello");
    let original = fs.getattr("/a").unwrap().content_id.unwrap();

    let fh = fs.open("/a", OpenFlags::RDWR).unwrap();
    assert!(env.staging_files().is_empty());
    fs.write(fh, 5, b"abc").unwrap();
    assert_eq!(env.staging_files().len(), 1);
    fs.release(fh).unwrap();
    assert!(env.staging_files().is_empty());

    let attr = fs.getattr("/a").unwrap();
    assert_eq!(attr.size, 8);
    assert_ne!(attr.content_id, Some(original));
    assert_eq!(read_file(&mut fs, "/a"), b"helloabc");
    // The old version is still archived
    assert!(fs.store().cas().exists(&original));
}

#[test]
fn property_out_of_order_writes_round_trip() {
    let (_env, mut fs) = mount();
    write_file(&mut fs, "/seek", &[b' '; 30]);

    let fh = fs.open("/seek", OpenFlags::RDWR).unwrap();
    for (offset, text) in [
        (5u64, &b"five"[..]),
        (15, b"fifteen"),
        (25, b"25"),
        (2, b"2"),
        (19, b"19"),
    ] {
        fs.write(fh, offset, text).unwrap();
        assert_eq!(fs.read(fh, offset, text.len()).unwrap(), text);
    }
    fs.release(fh).unwrap();

    assert_eq!(
        read_file(&mut fs, "/seek"),
        b"  2  five      fift19n   25   "
    );
}

#[test]
fn property_sparse_write_zero_fills() {
    let (_env, mut fs) = mount();
    let fh = fs.create("/sparse", 0o644, OpenFlags::WRONLY).unwrap();
    fs.write(fh, 4, b"end").unwrap();
    fs.release(fh).unwrap();

    assert_eq!(read_file(&mut fs, "/sparse"), b"\0\0\0\0end");
}

#[test]
fn property_read_is_pure() {
    let (env, mut fs) = mount();
    write_file(&mut fs, "/r", b"read me");
    let before = fs.getattr("/r").unwrap();

    let fh = fs.open("/r", OpenFlags::RDONLY).unwrap();
    assert_eq!(fs.read(fh, 0, 4).unwrap(), b"read");
    assert_eq!(fs.read(fh, 5, 100).unwrap(), b"me");
    assert!(env.staging_files().is_empty());
    fs.release(fh).unwrap();

    let after = fs.getattr("/r").unwrap();
    assert_eq!(after.content_id, before.content_id);
    assert_eq!(after.mtime, before.mtime);
}

#[test]
fn property_rename_does_not_cascade() {
    let (_env, mut fs) = mount();
    fs.mkdir("/src", 0o755).unwrap();
    write_file(&mut fs, "/src/inner", b"nested");

    fs.rename("/src", "/dst").unwrap();

    assert!(fs.getattr("/dst").unwrap().kind == EntryKind::Directory);
    assert!(matches!(fs.getattr("/src"), Err(FsError::NotFound(_))));
    assert!(fs.getattr("/src/inner").is_ok());
    assert!(matches!(fs.getattr("/dst/inner"), Err(FsError::NotFound(_))));
    assert_eq!(fs.readdir("/dst").unwrap(), vec![".", ".."]);
}

#[test]
fn property_unlink_keeps_blob() {
    let (_env, mut fs) = mount();
    write_file(&mut fs, "/doomed", b"still archived");
    let id = fs.getattr("/doomed").unwrap().content_id.unwrap();

    fs.unlink("/doomed").unwrap();

    assert!(matches!(fs.getattr("/doomed"), Err(FsError::NotFound(_))));
    assert!(fs.store().cas().exists(&id));
    assert!(fs.store().meta().paths_with_content(&id).unwrap().is_empty());
}

#[test]
fn property_last_close_wins() {
    let (_env, mut fs) = mount();
    write_file(&mut fs, "/race", b"base");

    let first = fs.open("/race", OpenFlags::RDWR).unwrap();
    let second = fs.open("/race", OpenFlags::RDWR).unwrap();
    fs.write(first, 0, b"AAAA").unwrap();
    fs.write(second, 0, b"BBBB").unwrap();

    fs.release(second).unwrap();
    fs.release(first).unwrap();

    let attr = fs.getattr("/race").unwrap();
    assert_eq!(attr.content_id, Some(ContentStore::compute_id(b"AAAA")));
    // Both versions were published
    assert!(fs
        .store()
        .cas()
        .exists(&ContentStore::compute_id(b"BBBB")));
}

#[test]
fn namespace_survives_reopen() {
    let env = TestEnvironment::new().unwrap();
    {
        let store = Arc::new(Store::open(&env.config().storage).unwrap());
        let mut fs = ArchiveFs::new(store);
        fs.mkdir("/keep", 0o700).unwrap();
        write_file(&mut fs, "/keep/file", b"durable");
    }

    let store = Arc::new(Store::open(&env.config().storage).unwrap());
    let mut fs = ArchiveFs::new(store);
    assert_eq!(fs.getattr("/keep").unwrap().permissions(), 0o700);
    assert_eq!(read_file(&mut fs, "/keep/file"), b"durable");
}
