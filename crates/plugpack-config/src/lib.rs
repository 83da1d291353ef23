//! Configuration management for plugpack
//!
//! The configuration is a small TOML file holding user defaults for the
//! packaging pipeline: the default artifact name, the content archive
//! compression and extra manifest fields to scan for bundled files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "PLUGPACK_CONFIG";

/// Artifact file name used when neither the config nor the caller provides one
pub const DEFAULT_OUTPUT_NAME: &str = "plugin.zip";

const POINTER_FILE_NAME: &str = ".plugpack_config_path";

/// Keys accepted by `plugpack config set`
pub const SUPPORTED_KEYS: &[&str] = &["output-name", "compression", "source-fields"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown config key: {0}. Currently supported keys: output-name, compression, source-fields")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Compression used for entries of the content archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Deflate,
    Store,
}

impl FromStr for Compression {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deflate" | "deflated" => Ok(Compression::Deflate),
            "store" | "stored" | "none" => Ok(Compression::Store),
            _ => Err(ConfigError::InvalidValue {
                key: "compression".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Deflate => write!(f, "deflate"),
            Compression::Store => write!(f, "store"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_fields: Vec<String>,
}

impl Config {
    /// Resolve the config file path.
    ///
    /// `PLUGPACK_CONFIG` wins when set and non-empty; otherwise a pointer file
    /// next to the default location may redirect to another file.
    pub fn path() -> PathBuf {
        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        let default = Self::default_path();

        if let Some(pointer) = Self::pointer_path() {
            if let Ok(contents) = fs::read_to_string(&pointer) {
                let trimmed = contents.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
        }

        default
    }

    /// Default config file path (platform-appropriate)
    pub fn default_path() -> PathBuf {
        #[cfg(not(target_os = "windows"))]
        {
            dirs::home_dir().map_or_else(
                || PathBuf::from(".config/plugpack/plugpack.toml"),
                |h| h.join(".config").join("plugpack").join("plugpack.toml"),
            )
        }

        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map_or_else(
                || PathBuf::from("plugpack\\plugpack.toml"),
                |c| c.join("plugpack").join("plugpack.toml"),
            )
        }
    }

    /// Path of the pointer file that redirects the config location
    pub fn pointer_path() -> Option<PathBuf> {
        Self::default_path()
            .parent()
            .map(|parent| parent.join(POINTER_FILE_NAME))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::path())
    }

    /// Load from a specific path, returning defaults if the file doesn't exist
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(&Self::path())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "output-name" => self.output_name.clone(),
            "compression" => self.compression.clone(),
            "source-fields" if !self.source_fields.is_empty() => {
                Some(self.source_fields.join(","))
            }
            _ => None,
        }
    }

    /// Set a key from its textual form. `source-fields` takes a comma separated list.
    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "output-name" => {
                if value.trim().is_empty() || value.contains(['/', '\\']) {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value,
                    });
                }
                self.output_name = Some(value);
            }
            "compression" => {
                let compression: Compression = value.parse()?;
                self.compression = Some(compression.to_string());
            }
            "source-fields" => {
                self.source_fields = value
                    .split(',')
                    .map(str::trim)
                    .filter(|field| !field.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.output_name.is_none() && self.compression.is_none() && self.source_fields.is_empty()
    }

    pub fn values_iter(&self) -> Vec<(&str, String)> {
        SUPPORTED_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    /// Artifact file name to use when no explicit output path is given
    pub fn output_name(&self) -> &str {
        self.output_name.as_deref().unwrap_or(DEFAULT_OUTPUT_NAME)
    }

    /// Compression for the content archive; an unparseable stored value is an error
    pub fn compression(&self) -> Result<Compression, ConfigError> {
        self.compression
            .as_deref()
            .map_or(Ok(Compression::default()), str::parse)
    }
}
