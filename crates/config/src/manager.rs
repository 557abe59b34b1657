//! Locating, loading and updating the user's config file

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Overrides `store.max_devices_per_identity`
pub const ENV_MAX_DEVICES: &str = "SYNCLEDGER_STORE_MAX_DEVICES";
/// Overrides `store.max_history_entries`
pub const ENV_MAX_HISTORY: &str = "SYNCLEDGER_STORE_MAX_HISTORY";
/// Overrides `database.path`
pub const ENV_DATABASE_PATH: &str = "SYNCLEDGER_DATABASE_PATH";
/// Overrides `database.max_connections`
pub const ENV_MAX_CONNECTIONS: &str = "SYNCLEDGER_DATABASE_MAX_CONNECTIONS";
/// Overrides `app.log_level`
pub const ENV_LOG_LEVEL: &str = "SYNCLEDGER_APP_LOG_LEVEL";

const FILE_NAME: &str = "config.toml";

/// Entry point for config operations
pub struct ConfigManager {
    dir: PathBuf,
    file: ConfigPersistence,
}

impl ConfigManager {
    /// Uses the platform config directory
    ///
    /// - Linux: `~/.config/syncledger/`
    /// - macOS: `~/Library/Application Support/syncledger/`
    /// - Windows: `%APPDATA%\syncledger\config\`
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", "syncledger").ok_or(ConfigError::NoConfigDir)?;
        Self::with_directory(dirs.config_dir())
    }

    /// Uses `config.toml` inside `dir`
    pub fn with_directory(dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let file = ConfigPersistence::new(dir.join(FILE_NAME));
        Ok(Self { dir, file })
    }

    pub fn config_dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the file; a missing file gives the defaults
    pub fn load(&self) -> ConfigResult<Config> {
        self.file.load()
    }

    /// Reads the file, falling back to the last backup and then to defaults
    pub fn load_or_default(&self) -> Config {
        let err = match self.load() {
            Ok(config) => return config,
            Err(err) => err,
        };

        if err.is_corrupt() {
            match self.file.load_backup() {
                Ok(Some(config)) => {
                    log::warn!("{}; using {}", err, self.file.backup_path().display());
                    return config;
                }
                Ok(None) => {}
                Err(backup_err) => log::warn!("Backup unusable: {}", backup_err),
            }
        }

        log::warn!("{}; using defaults", err);
        Config::default()
    }

    /// Validates and writes `config`
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.save(config)
    }

    /// Applies `change` to the stored config and writes the result
    ///
    /// Nothing is written if the changed config does not validate.
    ///
    /// ```rust,no_run
    /// # use syncledger_config::ConfigManager;
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.store.max_history_entries = 50;
    /// }).expect("Failed to update config");
    /// ```
    pub fn update<F>(&self, change: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        change(&mut config);
        self.save(&config)
    }

    /// Writes the defaults unless a file is already present
    ///
    /// Returns true if a file was written.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::debug!("Keeping existing {}", self.config_path().display());
            return Ok(false);
        }
        self.file.generate_default()?;
        Ok(true)
    }

    /// Replaces the file with the defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.file.generate_default()
    }

    /// Problems in the stored file, one message per field
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        Ok(match self.load()?.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        })
    }

    /// Reads the file, then applies `SYNCLEDGER_*` environment variables
    ///
    /// A variable that does not parse is an error, and so is a result that
    /// does not validate: an override can never lift the device limit above
    /// its ceiling.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
        config.ensure_valid()?;
        Ok(config)
    }
}

fn parse_var<T, F>(var: &'static str, lookup: &F) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    match value.trim().parse() {
        Ok(parsed) => {
            log::debug!("{} overrides config with {:?}", var, value);
            Ok(Some(parsed))
        }
        Err(e) => Err(ConfigError::Env {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = parse_var(ENV_MAX_DEVICES, &lookup)? {
        config.store.max_devices_per_identity = v;
    }
    if let Some(v) = parse_var(ENV_MAX_HISTORY, &lookup)? {
        config.store.max_history_entries = v;
    }
    if let Some(v) = lookup(ENV_DATABASE_PATH) {
        config.database.path = v;
    }
    if let Some(v) = parse_var(ENV_MAX_CONNECTIONS, &lookup)? {
        config.database.max_connections = v;
    }
    if let Some(v) = parse_var::<LogLevel, _>(ENV_LOG_LEVEL, &lookup)? {
        config.app.log_level = v;
    }
    Ok(())
}
