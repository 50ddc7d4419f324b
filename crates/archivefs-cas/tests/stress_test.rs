use std::time::Instant;

use archivefs_cas::ContentStore;
use tempfile::TempDir;

#[test]
fn stress_test_mass_publish() {
    // Quick stress test for CI (100 files ~1 sec)
    const FILE_COUNT: usize = 100;

    let temp = TempDir::new().unwrap();
    let cas = ContentStore::new(temp.path()).unwrap();

    println!("Publishing {} staged files...", FILE_COUNT);
    let start = Instant::now();

    let mut published_bytes = 0u64;
    for i in 0..FILE_COUNT {
        // Alternating content to test dedup (50% unique)
        let content = if i % 2 == 0 {
            format!("content unique {}\n", i)
        } else {
            "shared content\n".to_string()
        };
        let mut staged = cas.stage_for(&format!("/file_{}.txt", i)).unwrap();
        staged.write_at(content.as_bytes(), 0).unwrap();
        cas.publish(staged).unwrap();
        published_bytes += content.len() as u64;
    }

    let duration = start.elapsed();
    println!("Publishing took: {:?}", duration);
    println!(
        "Throughput: {:.2} files/sec",
        FILE_COUNT as f64 / duration.as_secs_f64()
    );
    println!("Staged bytes: {}", published_bytes);

    let stats = cas.stats().unwrap();
    println!("CAS Stats: {:?}", stats);

    // 50 unique files + 1 shared file = 51 blobs
    assert_eq!(stats.blob_count, 51);
    assert!(cas.orphaned_staging().unwrap().is_empty());
}
