//! Configuration file support for imgtag
//!
//! Config files are loaded in order (later overrides earlier):
//! 1. `~/.config/imgtag/config.toml` (user defaults)
//! 2. `imgtag.toml` in the working directory (project overrides)
//!
//! CLI flags override all config file values. [`Config::settings`] turns the
//! merged, optional values into validated [`Settings`]; any problem there is
//! fatal at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::cache::DEFAULT_TTL;

/// Project config file name, looked up in the working directory
pub const PROJECT_CONFIG: &str = "imgtag.toml";
const DEFAULT_DB_FILENAME: &str = "imgtag.db";
const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No root directory configured. Set [filesystem] root_dir in imgtag.toml or pass --root.")]
    MissingRootDir,
    #[error("Root directory {} does not exist or is not a directory", .0.display())]
    RootNotDirectory(PathBuf),
    #[error("Database path {} does not name a file", .0.display())]
    MissingDatabase(PathBuf),
    #[error("Database directory {} does not exist", .0.display())]
    DatabaseDirMissing(PathBuf),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file; relative paths resolve against the working directory
    pub filename: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilesystemConfig {
    /// Directory scanned when a file's path has to be re-resolved
    pub root_dir: Option<PathBuf>,
    /// Extensions (without dot) the UI treats as taggable images
    pub image_extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing level used when RUST_LOG is unset
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: Option<u64>,
}

/// Configuration options loaded from config files
///
/// # Example
///
/// ```toml
/// # ~/.config/imgtag/config.toml or ./imgtag.toml
/// [database]
/// filename = "imgtag.db"
///
/// [filesystem]
/// root_dir = "/home/me/Pictures"
/// image_extensions = ["jpg", "png"]
///
/// [logging]
/// level = "debug"
///
/// [cache]
/// ttl_secs = 3600
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub filesystem: FilesystemConfig,
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
}

/// Validated settings the core runs with
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub root_dir: PathBuf,
    pub image_extensions: Vec<String>,
    pub log_level: String,
    pub cache_ttl: Duration,
}

impl Config {
    /// Load configuration from user and project config files
    pub fn load(project_dir: &Path) -> Self {
        let user_config = dirs::config_dir()
            .map(|d| d.join("imgtag/config.toml"))
            .and_then(|p| Self::load_file(&p))
            .unwrap_or_default();

        let project_config =
            Self::load_file(&project_dir.join(PROJECT_CONFIG)).unwrap_or_default();

        let merged = user_config.override_with(project_config);
        tracing::debug!(
            database = ?merged.database.filename,
            root_dir = ?merged.filesystem.root_dir,
            level = ?merged.logging.level,
            ttl_secs = ?merged.cache.ttl_secs,
            "Effective config after merge"
        );
        merged
    }

    /// Load configuration from a specific file
    fn load_file(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                return None;
            }
        };

        match toml::from_str::<Self>(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Layer another config on top (other overrides self where present)
    fn override_with(self, other: Self) -> Self {
        Config {
            database: DatabaseConfig {
                filename: other.database.filename.or(self.database.filename),
            },
            filesystem: FilesystemConfig {
                root_dir: other.filesystem.root_dir.or(self.filesystem.root_dir),
                image_extensions: other
                    .filesystem
                    .image_extensions
                    .or(self.filesystem.image_extensions),
            },
            logging: LoggingConfig {
                level: other.logging.level.or(self.logging.level),
            },
            cache: CacheConfig {
                ttl_secs: other.cache.ttl_secs.or(self.cache.ttl_secs),
            },
        }
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, db: Option<PathBuf>, root: Option<PathBuf>) -> Self {
        if db.is_some() {
            self.database.filename = db;
        }
        if root.is_some() {
            self.filesystem.root_dir = root;
        }
        self
    }

    /// Log level from the config, or the default
    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Validate and fill in defaults; relative paths resolve against `base`
    pub fn settings(&self, base: &Path) -> Result<Settings, ConfigError> {
        let root_dir = self
            .filesystem
            .root_dir
            .as_ref()
            .ok_or(ConfigError::MissingRootDir)?;
        let root_dir = base.join(root_dir);
        if !root_dir.is_dir() {
            return Err(ConfigError::RootNotDirectory(root_dir));
        }

        let db_path = base.join(
            self.database
                .filename
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILENAME)),
        );
        if db_path.file_name().is_none() || db_path.is_dir() {
            return Err(ConfigError::MissingDatabase(db_path));
        }
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(ConfigError::DatabaseDirMissing(parent.to_path_buf()));
            }
        }

        let image_extensions = self
            .filesystem
            .image_extensions
            .clone()
            .unwrap_or_else(|| {
                DEFAULT_IMAGE_EXTENSIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();

        Ok(Settings {
            db_path,
            root_dir,
            image_extensions,
            log_level: self.log_level().to_string(),
            cache_ttl: self
                .cache
                .ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TTL),
        })
    }
}

impl Settings {
    /// Whether `path` has one of the configured image extensions (case-insensitive)
    pub fn is_image_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.image_extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}
