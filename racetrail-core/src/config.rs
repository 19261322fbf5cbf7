//! Analysis configuration: highlight thresholds plus replay geometry, loaded
//! from one JSON document where every field is optional.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::highlights::{HighlightConfig, HighlightConfigError};
use crate::replay::{ReplayConfig, ReplayConfigError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Highlights(#[from] HighlightConfigError),
    #[error(transparent)]
    Replay(#[from] ReplayConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub highlights: HighlightConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl AnalysisConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails [`Self::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::debug!("loaded analysis config from {}", path.display());
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first invalid highlight or replay field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.highlights.validate()?;
        self.replay.validate()?;
        Ok(())
    }
}
