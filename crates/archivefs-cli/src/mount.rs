use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use archivefs_config::{log_cli_info, Config};
use archivefs_fuse::ArchiveFuse;
use archivefs_vfs::{ArchiveFs, Store};

#[derive(Args, Debug)]
pub struct MountArgs {
    /// Mount point directory
    #[arg(value_name = "MOUNTPOINT")]
    mountpoint: PathBuf,

    /// Allow other users to access the mount
    #[arg(long)]
    allow_other: bool,
}

/// Execute the mount command
pub fn run(config: &Config, args: MountArgs) -> Result<()> {
    let mountpoint = &args.mountpoint;

    if !archivefs_fuse::fuse_enabled() {
        tracing::warn!("FUSE support disabled. Recompile with --features fuse to enable.");
        tracing::warn!("    cargo build -p archivefs-cli --features fuse");
    }

    // Ensure mountpoint exists
    if !mountpoint.exists() {
        fs::create_dir_all(mountpoint)
            .with_context(|| format!("Failed to create mountpoint: {}", mountpoint.display()))?;
    }

    let store = Store::open(&config.storage).with_context(|| {
        format!(
            "Failed to open store at {}",
            config.storage.root_dir().display()
        )
    })?;

    let mut mount_config = config.mount.clone();
    mount_config.allow_other |= args.allow_other;

    log_cli_info!(
        "Mounting ArchiveFS",
        store = tracing::field::display(store.root().display()),
        mountpoint = tracing::field::display(mountpoint.display())
    );

    let adapter = ArchiveFuse::new(ArchiveFs::new(Arc::new(store)), mount_config);
    // This will block until unmounted
    adapter.mount(mountpoint)
}
