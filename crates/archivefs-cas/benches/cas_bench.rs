use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;
use archivefs_cas::ContentStore;

fn bench_publish_dedup(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let cas = ContentStore::new(temp.path()).unwrap();
    let data = vec![0u8; 1024 * 10]; // 10KB

    // After the first iteration every publish is a dedup hit.
    c.bench_function("publish_10kb_dedup", |b| {
        b.iter(|| cas.store(black_box(&data)).unwrap())
    });
}

fn bench_publish_unique(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let cas = ContentStore::new(temp.path()).unwrap();
    let mut counter = 0u64;

    c.bench_function("publish_10kb_unique", |b| {
        b.iter(|| {
            counter += 1;
            let mut data = vec![0u8; 1024 * 10];
            data[..8].copy_from_slice(&counter.to_le_bytes());
            cas.store(black_box(&data)).unwrap()
        })
    });
}

fn bench_read_blob(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let cas = ContentStore::new(temp.path()).unwrap();
    let data = vec![0u8; 1024 * 1024]; // 1MB
    let id = cas.store(&data).unwrap();

    c.bench_function("read_1mb", |b| {
        b.iter(|| {
            let reader = cas.open_for_read(Some(black_box(&id))).unwrap();
            reader.read_at(0, 1024 * 1024).unwrap()
        })
    });
}

criterion_group!(benches, bench_publish_dedup, bench_publish_unique, bench_read_blob);
criterion_main!(benches);
