//! Reading and writing the config file

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const HEADER: &str = "# syncledger configuration\n\n";

/// One config file on disk and its `.backup` sibling
#[derive(Debug, Clone)]
pub struct ConfigPersistence {
    path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the previous file is kept on save
    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("toml.backup")
    }

    /// Reads the file
    ///
    /// A missing file gives the defaults. An empty or unparsable file is an
    /// error. Out-of-range values are logged and returned as read.
    pub fn load(&self) -> ConfigResult<Config> {
        if !self.path.exists() {
            log::info!("No config at {}, using defaults", self.path.display());
            return Ok(Config::default());
        }

        let config = read_config(&self.path)?;
        if let Err(errors) = config.validate() {
            log::warn!(
                "{} has invalid values: {}",
                self.path.display(),
                ConfigError::Invalid(errors)
            );
        }
        Ok(config)
    }

    /// Reads the copy left by the last save, if there is one
    pub fn load_backup(&self) -> ConfigResult<Option<Config>> {
        let backup = self.backup_path();
        if !backup.exists() {
            return Ok(None);
        }
        read_config(&backup).map(Some)
    }

    /// Validates `config` and replaces the file with it
    ///
    /// The new text goes to a temporary file in the same directory which is
    /// then renamed over the old one, so readers see either file in full.
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.ensure_valid()?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| ConfigError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            log::info!("Created config directory {}", dir.display());
        }

        if self.path.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup)
                .map_err(|source| ConfigError::Backup { path: backup, source })?;
        }

        let mut text = String::from(HEADER);
        text.push_str(&toml::to_string_pretty(config)?);

        let write_err = |source: std::io::Error| ConfigError::Write {
            path: self.path.clone(),
            source,
        };
        let mut staged = NamedTempFile::new_in(&dir).map_err(write_err)?;
        staged.write_all(text.as_bytes()).map_err(write_err)?;
        staged.as_file().sync_all().map_err(write_err)?;
        staged
            .persist(&self.path)
            .map_err(|e| write_err(e.error))?;

        log::info!("Saved config to {}", self.path.display());
        Ok(())
    }

    /// Writes the defaults
    pub fn generate_default(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }
}

fn read_config(path: &Path) -> ConfigResult<Config> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Err(ConfigError::Empty {
            path: path.to_path_buf(),
        });
    }

    let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if config.is_newer_format() {
        log::warn!(
            "{} uses format {}, newer than {}; unknown keys are ignored",
            path.display(),
            config.version,
            CONFIG_VERSION
        );
    }
    Ok(config)
}
