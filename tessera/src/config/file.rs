//! Configuration file handling for `<config dir>/tessera/config.ini`.
//!
//! Missing files and missing keys fall back to defaults. Parsing lives in
//! [`super::parser`], serialization in [`super::writer`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use serde::Serialize;
use thiserror::Error;

use crate::cluster::{ClusterConfig, ClusterError};
use crate::layer::{LayerConfig, LayerError};
use crate::logging::{default_log_dir, DEFAULT_LOG_FILE};
use crate::tile::{UrlTemplateSource, DEFAULT_FETCH_TIMEOUT_SECS};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Config text is not valid INI
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ini::ParseError),

    /// Failed to write the config file
    #[error("Failed to write config file: {0}")]
    WriteError(#[from] std::io::Error),

    /// A value could not be interpreted
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Layer settings parsed but are inconsistent
    #[error(transparent)]
    Layer(#[from] LayerError),

    /// Cluster settings parsed but are inconsistent
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// `[source]` settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSettings {
    /// URL template with `{z}`, `{x}`, `{y}` and optional `{s}`
    pub url: Option<String>,
    /// Values substituted for `{s}`
    pub subdomains: Vec<String>,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: None,
            subdomains: Vec::new(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl SourceSettings {
    /// Build a URL template source if a URL is configured.
    pub fn url_source(&self) -> Option<UrlTemplateSource> {
        self.url.as_ref().map(|url| {
            UrlTemplateSource::new(url.clone()).with_subdomains(self.subdomains.iter().cloned())
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[logging]` settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

/// Everything a config file can set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConfigFile {
    pub layer: LayerConfig,
    pub cluster: ClusterConfig,
    pub source: SourceSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load configuration from [`config_file_path`].
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        super::parser::parse_ini(&ini)
    }

    /// Render the configuration as INI text.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_ini_string())?;
        Ok(())
    }
}

/// Directory holding the config file (`<config dir>/tessera`).
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tessera")
}

/// Path of the default config file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
