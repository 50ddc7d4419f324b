use anyhow::{Context, Result};

use archivefs_config::Config;
use archivefs_vfs::Store;

/// Execute the stats command
pub fn run(config: &Config) -> Result<()> {
    let store = Store::open(&config.storage).with_context(|| {
        format!(
            "Failed to open store at {}",
            config.storage.root_dir().display()
        )
    })?;
    let stats = store.stats().context("Failed to collect statistics")?;

    println!("ArchiveFS store: {}", store.root().display());
    println!();
    println!("Namespace:");
    println!("  Files:        {}", stats.manifest.file_count);
    println!("    (empty):    {}", stats.manifest.empty_file_count);
    println!("  Directories:  {}", stats.manifest.dir_count);
    println!("  Symlinks:     {}", stats.manifest.symlink_count);
    println!();
    println!("Archive:");
    println!("  Blobs:        {}", stats.cas.blob_count);
    println!("  Total bytes:  {}", format_bytes(stats.cas.total_bytes));
    println!("  Avg blob:     {}", format_bytes(stats.cas.avg_blob_size()));
    println!();
    println!("Orphaned staging files: {}", stats.orphaned_staging);
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MiB");
    }
}
