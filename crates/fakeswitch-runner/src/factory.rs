//! Switch model factory.
//!
//! Maps model names given on the command line to device cores.

use std::path::Path;
use std::sync::Arc;

use fakeswitch_engine::SwitchCore;
use fakeswitch_model::{ConfigError, SwitchConfiguration};
use fakeswitch_tl1::{Ciena6500Core, Tl1Options};
use thiserror::Error;
use tracing::info;

/// Errors raised while building a device core.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The model name is not known.
    #[error("invalid switch model '{0}', allowed values are: {}", SwitchFactory::MODELS.join(", "))]
    InvalidModel(String),

    /// The device configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builds device cores by model name.
#[derive(Debug, Clone, Default)]
pub struct SwitchFactory {
    options: Tl1Options,
}

impl SwitchFactory {
    /// Supported model names.
    pub const MODELS: [&'static str; 1] = ["ciena_6500"];

    pub fn new(options: Tl1Options) -> Self {
        SwitchFactory { options }
    }

    /// Build the core for `model`, loading the loadout from `config_file`
    /// when given.
    pub fn get(
        &self,
        model: &str,
        hostname: &str,
        config_file: Option<&Path>,
    ) -> Result<Arc<dyn SwitchCore>, FactoryError> {
        match model {
            "ciena_6500" => {
                let config = match config_file {
                    Some(path) => {
                        info!("Configuring node {}, config={}", hostname, path.display());
                        SwitchConfiguration::from_file(hostname, path)?
                    }
                    None => {
                        info!("Configuring node {} without equipment", hostname);
                        SwitchConfiguration::empty(hostname)
                    }
                };
                Ok(Arc::new(Ciena6500Core::new(Arc::new(config), self.options)))
            }
            other => Err(FactoryError::InvalidModel(other.to_string())),
        }
    }
}
