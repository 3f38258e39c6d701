//! Configuration for scanwedge.

use crate::detector::types::Key;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Detection constants for one scanner model.
///
/// The defaults match a common wedge configuration: a `{BAR}` prefix
/// programmed into the scanner, Enter as the payload terminator, and bursts
/// well under 35 ms per character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Literal sequence the scanner types before every payload.
    pub marker_prefix: String,

    /// Maximum accepted average input speed, in milliseconds per character.
    /// Runs slower than this are classified as human typing.
    pub speed_threshold_ms: f64,

    /// Key that ends every capture attempt.
    pub terminator: Key,

    /// Maximum captured characters before an armed run is abandoned.
    /// Bounds the buffer when a terminator never arrives.
    pub max_capture_len: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            marker_prefix: "{BAR}".to_string(),
            speed_threshold_ms: 35.0,
            terminator: Key::Enter,
            max_capture_len: 512,
        }
    }
}

impl DetectorConfig {
    /// Check the constants are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker_prefix.is_empty() {
            return Err(ConfigError::Invalid("marker_prefix must not be empty".into()));
        }
        if !(self.speed_threshold_ms.is_finite() && self.speed_threshold_ms > 0.0) {
            return Err(ConfigError::Invalid(
                "speed_threshold_ms must be a positive number".into(),
            ));
        }
        if self.max_capture_len == 0 {
            return Err(ConfigError::Invalid("max_capture_len must be nonzero".into()));
        }
        Ok(())
    }
}

/// Application configuration for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Detection constants.
    pub detector: DetectorConfig,

    /// Path for stats persistence and recorded traces.
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scanwedge");

        Self {
            detector: DetectorConfig::default(),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.detector.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scanwedge")
            .join("config.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
