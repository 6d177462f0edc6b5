//! Error types for device configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or bootstrapping a device.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The loadout file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The loadout is not valid JSON.
    #[error("invalid JSON loadout: {0}")]
    Json(#[from] serde_json::Error),

    /// The loadout is not valid YAML.
    #[error("invalid YAML loadout: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A card field is not of the form `key=value`.
    #[error("invalid field '{0}', expected key=value")]
    InvalidField(String),

    /// No bootstrapper exists for this card model.
    #[error("unsupported card model: {0}")]
    UnsupportedModel(String),

    /// Two cards were placed in the same slot.
    #[error("bad config, slot {slot} is already populated in chassis {chassis}")]
    SlotOccupied {
        /// Chassis name.
        chassis: String,
        /// Slot name.
        slot: String,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
