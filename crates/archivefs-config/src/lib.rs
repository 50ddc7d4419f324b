//! # archivefs-config
//!
//! Configuration management for ArchiveFS.
//!
//! Loads configuration from:
//! 1. `~/.archivefs/config.toml` (global)
//! 2. `.archivefs/config.toml` (project-local, overrides global)
//! 3. Environment variables (highest priority)

pub mod logging;
pub mod testing;

pub use logging::LogLevel;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides `storage.root`.
pub const ENV_ROOT: &str = "ARCHIVEFS_ROOT";
/// Overrides `logging.level`.
pub const ENV_LOG: &str = "ARCHIVEFS_LOG";
/// When set, forces `debug` logging.
pub const ENV_DEBUG: &str = "ARCHIVEFS_DEBUG";
/// When set, raises logging to at least `info`.
pub const ENV_VERBOSE: &str = "ARCHIVEFS_VERBOSE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub mount: MountConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from standard locations
    pub fn load() -> Result<Self, ConfigError> {
        let project_path = Path::new(".archivefs/config.toml");
        let mut config = Self::load_from(
            Self::global_config_path().as_deref(),
            Some(project_path),
        )?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Layer the global and project files (either may be absent) over the
    /// defaults, without consulting the environment.
    pub fn load_from(global: Option<&Path>, project: Option<&Path>) -> Result<Self, ConfigError> {
        let mut table = match toml::Value::try_from(Config::default())? {
            toml::Value::Table(table) => table,
            _ => toml::Table::new(),
        };

        for path in [global, project].into_iter().flatten() {
            if path.exists() {
                debug!("Loading config from {:?}", path);
                let contents = std::fs::read_to_string(path)?;
                let overlay: toml::Table = toml::from_str(&contents)?;
                merge_tables(&mut table, overlay);
            }
        }

        let config: Config = toml::Value::Table(table).try_into()?;
        Ok(config)
    }

    /// Parse a single config file, filling unspecified fields with defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Global config path: ~/.archivefs/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".archivefs/config.toml"))
    }

    /// Apply environment variable overrides through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_ROOT) {
            self.storage.root = PathBuf::from(root);
        }
        if let Some(level) = lookup(ENV_LOG).and_then(|l| l.parse().ok()) {
            self.logging.level = level;
        }
        if lookup(ENV_VERBOSE).is_some() && self.logging.level < LogLevel::Info {
            self.logging.level = LogLevel::Info;
        }
        if lookup(ENV_DEBUG).is_some() {
            self.logging.level = LogLevel::Debug;
        }
    }

    /// Generate default config TOML string
    pub fn default_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&Config::default())?)
    }
}

/// Recursively overlay `overlay` onto `base`; overlay values win.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Expand a leading `~/` against the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store root holding metadata, archive and staging
    pub root: PathBuf,
    /// LMDB map size in bytes
    pub map_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("~/.archivefs/store"),
            map_size: 1024 * 1024 * 1024,
        }
    }
}

impl StorageConfig {
    /// Root with `~` expanded.
    pub fn root_dir(&self) -> PathBuf {
        expand_tilde(&self.root)
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.root_dir().join("meta.lmdb")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root_dir().join("archive")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root_dir().join("staging")
    }
}

/// Mount configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    pub fsname: String,
    pub allow_other: bool,
    pub auto_unmount: bool,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            fsname: "archivefs".to_string(),
            allow_other: false,
            auto_unmount: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
