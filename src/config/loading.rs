use super::types::{ConfigSetting, Configuration};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".eredmel.toml";

/// Represents configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file at {path}: {source}")]
    IoError { source: io::Error, path: String },

    /// Failed to parse the configuration content
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// A value parsed but is not acceptable for its key
    #[error("Invalid value '{value}' for '{key}' in {path}")]
    InvalidValue { key: String, value: String, path: String },
}

/// How the final document is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    #[default]
    Tabs,
    Spaces,
}

/// The `[global]` table of `.eredmel.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct GlobalConfig {
    pub prefix: Option<String>,
    pub lib_dirs: Vec<PathBuf>,
    pub indent: IndentStyle,
    pub output_tabwidth: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            lib_dirs: Vec::new(),
            indent: IndentStyle::Tabs,
            output_tabwidth: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub global: GlobalConfig,
    /// File this configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load the configuration at `config_path`, or discover `.eredmel.toml` upward from
    /// the working directory. No file at all yields the defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => match Self::discover_config_upward() {
                Some(path) => path,
                None => {
                    log::debug!("[eredmel-config] No {CONFIG_FILE_NAME} found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::IoError {
            source,
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&content, &path)
    }

    /// Parse `content` as if it had been read from `path`.
    ///
    /// Relative `lib-dirs` are resolved against the directory of `path`.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: ProjectConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

        if let Some(prefix) = &config.global.prefix
            && !ConfigSetting::Prefix.is_valid(prefix)
        {
            return Err(ConfigError::InvalidValue {
                key: "prefix".to_string(),
                value: prefix.clone(),
                path: path.display().to_string(),
            });
        }
        if config.global.output_tabwidth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "output-tabwidth".to_string(),
                value: "0".to_string(),
                path: path.display().to_string(),
            });
        }

        let base = path.parent().unwrap_or(Path::new(""));
        config.global.lib_dirs = config
            .global
            .lib_dirs
            .iter()
            .map(|dir| if dir.is_relative() { base.join(dir) } else { dir.clone() })
            .collect();
        config.source = Some(path.to_path_buf());
        log::debug!("[eredmel-config] Loaded {}", path.display());
        Ok(config)
    }

    /// The configuration every root file starts from.
    pub fn base_configuration(&self) -> Configuration {
        let mut config = Configuration::new();
        if let Some(prefix) = &self.global.prefix {
            // Validated in from_toml_str
            config.set(ConfigSetting::Prefix, prefix.as_str());
        }
        config
    }

    /// Walk up from the working directory looking for `.eredmel.toml`, stopping at a
    /// directory that contains `.git`.
    fn discover_config_upward() -> Option<PathBuf> {
        const MAX_DEPTH: usize = 100;

        let mut current_dir = match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                log::debug!("[eredmel-config] Failed to get current directory: {e}");
                return None;
            }
        };

        for _ in 0..MAX_DEPTH {
            let candidate = current_dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                log::debug!("[eredmel-config] Found config file: {}", candidate.display());
                return Some(candidate);
            }
            if current_dir.join(".git").exists() {
                log::debug!("[eredmel-config] Stopping at .git directory");
                return None;
            }
            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => {
                    log::debug!("[eredmel-config] Reached filesystem root");
                    return None;
                }
            }
        }
        log::debug!("[eredmel-config] Maximum traversal depth reached");
        None
    }
}
