//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`, else `./mdsync.toml`, else the platform
//!    config directory)
//! 3. `MDSYNC_` environment variables, `__` separating sections
//!    (`MDSYNC_BATCH__SIZE=100`)
//! 4. Command-line flags
//!
//! ```toml
//! [scan]
//! dir = "articles"
//! workers = 0
//!
//! [database]
//! path = "mdsync.db"
//!
//! [batch]
//! size = 50
//! interval_ms = 1000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::SyncArgs;
use crate::scanner::WalkerConfig;
use crate::sync::{BatchConfig, SyncConfig, DEFAULT_QUEUE_CAPACITY};

/// File name looked up in the working directory and the config directory.
pub const CONFIG_FILE_NAME: &str = "mdsync.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "MDSYNC_";

/// Errors loading or writing configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] figment::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("{0} already exists (use --force to overwrite)")]
    Exists(PathBuf),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `[scan]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Root of the article tree
    pub dir: PathBuf,
    /// Worker threads; 0 means one per logical CPU
    pub workers: usize,
    /// Descend into symlinked directories
    pub follow_symlinks: bool,
    pub skip_hidden: bool,
    /// Leave out whatever the root `.gitignore` ignores
    pub respect_gitignore: bool,
    /// Gitignore-style patterns to leave out
    pub exclude: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("articles"),
            workers: 0,
            follow_symlinks: false,
            skip_hidden: false,
            respect_gitignore: false,
            exclude: Vec::new(),
        }
    }
}

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite database file
    pub path: PathBuf,
    /// How long a write waits on a locked database
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("mdsync.db"),
            busy_timeout_ms: 5_000,
        }
    }
}

/// `[batch]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub size: usize,
    /// 0 disables time-triggered flushes
    pub interval_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        let batch = BatchConfig::default();
        Self {
            size: batch.size,
            interval_ms: u64::try_from(batch.interval.as_millis()).unwrap_or(1_000),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanSettings,
    pub database: DatabaseSettings,
    pub batch: BatchSettings,
}

impl Config {
    /// Load configuration from every layer except the command line.
    ///
    /// # Errors
    ///
    /// Fails if `explicit` is given but missing, or if any layer holds a
    /// value of the wrong type.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        match &path {
            Some(path) => log::debug!("Loading configuration from {}", path.display()),
            None => log::debug!("No configuration file; using defaults and environment"),
        }

        let config: Self = Self::figment(path.as_deref()).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The layered figment without command-line overrides.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// `./mdsync.toml` if present, otherwise the platform config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("", "", "mdsync").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Apply `sync` flags on top of the loaded layers.
    pub fn apply_sync_args(&mut self, args: &SyncArgs) {
        if let Some(dir) = &args.dir {
            self.scan.dir.clone_from(dir);
        }
        if let Some(workers) = args.workers {
            self.scan.workers = workers;
        }
        if let Some(db) = &args.db {
            self.database.path.clone_from(db);
        }
        if let Some(size) = args.batch_size {
            self.batch.size = usize::try_from(size).unwrap_or(usize::MAX);
        }
        if let Some(interval) = args.batch_interval_ms {
            self.batch.interval_ms = interval;
        }
        self.scan.exclude.extend(args.exclude.iter().cloned());
    }

    /// Reject values no run could use.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("scan.dir must not be empty".into()));
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "database.path must not be empty".into(),
            ));
        }
        if self.batch.size == 0 {
            return Err(ConfigError::Validation(
                "batch.size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.database.busy_timeout_ms)
    }

    /// Pipeline settings for one run.
    #[must_use]
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            root: self.scan.dir.clone(),
            workers: self.scan.workers,
            batch: BatchConfig {
                size: self.batch.size,
                interval: Duration::from_millis(self.batch.interval_ms),
            },
            walker: WalkerConfig {
                follow_symlinks: self.scan.follow_symlinks,
                skip_hidden: self.scan.skip_hidden,
                respect_gitignore: self.scan.respect_gitignore,
                exclude_patterns: self.scan.exclude.clone(),
            },
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_stack_size: None,
        }
    }

    /// The default configuration as commented TOML.
    ///
    /// # Errors
    ///
    /// Only fails if serialization fails, which the default never does.
    pub fn default_toml() -> Result<String, ConfigError> {
        let body = toml::to_string_pretty(&Self::default())?;
        Ok(format!(
            "# mdsync configuration\n\
             # Every key can be overridden with MDSYNC_<SECTION>__<KEY>.\n\
             # scan.workers = 0 uses one worker per logical CPU.\n\n{body}"
        ))
    }

    /// Write [`Config::default_toml`] to `path`.
    ///
    /// # Errors
    ///
    /// Refuses to replace an existing file unless `force` is set.
    pub fn write_default(path: &Path, force: bool) -> Result<(), ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::Exists(path.to_path_buf()));
        }
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, Self::default_toml()?).map_err(write_err)
    }
}
