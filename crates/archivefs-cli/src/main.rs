//! # archivefs CLI
//!
//! Command-line interface for the ArchiveFS copy-on-write archive.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use archivefs_config::logging::init_logging;
use archivefs_config::{log_cli_debug, Config};
use archivefs_vfs::Store;

mod mount;
mod stats;

/// ArchiveFS - deduplicating copy-on-write filesystem over a content-addressed archive
#[derive(Parser)]
#[command(name = "archivefs")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Store root (overrides config and ARCHIVEFS_ROOT)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store layout (metadata, archive, staging)
    Init,

    /// Mount the store at a directory (blocks until unmounted)
    Mount(mount::MountArgs),

    /// Show namespace and archive statistics
    Stats,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print config file locations
    Path,
}

fn main() -> Result<()> {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(root) = &cli.root {
        config.storage.root = root.clone();
    }
    init_logging(config.logging.level);
    log_cli_debug!(
        "Configuration loaded",
        root = tracing::field::display(config.storage.root_dir().display())
    );

    match cli.command {
        Commands::Init => cmd_init(&config),
        Commands::Mount(args) => mount::run(&config, args),
        Commands::Stats => stats::run(&config),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd_config_show(&config),
            ConfigCommands::Path => cmd_config_path(),
        },
    }
}

fn cmd_init(config: &Config) -> Result<()> {
    let storage = &config.storage;
    Store::open(storage).with_context(|| {
        format!(
            "Failed to initialize store at {}",
            storage.root_dir().display()
        )
    })?;

    println!("Initialized ArchiveFS store");
    println!("  Metadata: {}", storage.meta_dir().display());
    println!("  Archive:  {}", storage.archive_dir().display());
    println!("  Staging:  {}", storage.staging_dir().display());
    Ok(())
}

fn cmd_config_show(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}

fn cmd_config_path() -> Result<()> {
    match Config::global_config_path() {
        Some(path) => println!("Global:  {}", path.display()),
        None => println!("Global:  (no home directory)"),
    }
    println!("Project: .archivefs/config.toml");
    Ok(())
}
