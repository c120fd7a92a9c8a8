//! Configuration loading from strings and disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::resolved::Configuration;
use crate::config::schema::ConfigSource;
use crate::config::validation::{validate, ConfigError};

/// Serialized forms a config file may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Some(Format::Toml),
            Some("json") => Some(Format::Json),
            _ => None,
        }
    }
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Validate an already-deserialized source.
pub fn load(source: &ConfigSource) -> Result<Configuration, ConfigError> {
    validate(source)
}

/// Deserialize a raw source without validating it.
pub fn parse_str(text: &str, format: Format) -> Result<ConfigSource, LoadError> {
    let source: ConfigSource = match format {
        Format::Toml => toml::from_str(text)?,
        Format::Json => serde_json::from_str(text)?,
    };
    Ok(source)
}

/// Read a raw source from disk without validating it.
pub fn read_file(path: &Path) -> Result<ConfigSource, LoadError> {
    let format =
        Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&content, format)
}

/// Parse and validate configuration text.
pub fn load_str(text: &str, format: Format) -> Result<Configuration, LoadError> {
    Ok(load(&parse_str(text, format)?)?)
}

/// Load and validate configuration from a `.toml` or `.json` file.
pub fn load_file(path: &Path) -> Result<Configuration, LoadError> {
    let config = load(&read_file(path)?)?;

    tracing::debug!(
        path = %path.display(),
        site = %config.site_origin(),
        integrations = config.integrations().len(),
        "Configuration loaded"
    );

    Ok(config)
}
