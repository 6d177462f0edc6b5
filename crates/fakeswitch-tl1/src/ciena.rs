//! Ciena 6500 device core.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fakeswitch_engine::{
    EngineError, EngineResult, LineShell, Shell, ShellSession, ShellVariant, SwitchCore, Terminal,
};
use fakeswitch_model::{ProtocolMode, SwitchConfiguration};
use tracing::{debug, info, Span};

use crate::processor::{new_processor, Tl1Options};
use crate::shell::Tl1Shell;

/// Emulated Ciena 6500 node.
///
/// Every launched session gets its own processor and protocol state; only
/// the configuration is shared.
#[derive(Debug)]
pub struct Ciena6500Core {
    config: Arc<SwitchConfiguration>,
    options: Tl1Options,
    last_connection_id: AtomicU64,
}

impl Ciena6500Core {
    pub fn new(config: Arc<SwitchConfiguration>, options: Tl1Options) -> Self {
        info!(
            "Ciena 6500 node {} with {} cards",
            config.node_name,
            config.cards().count()
        );
        Ciena6500Core {
            config,
            options,
            last_connection_id: AtomicU64::new(0),
        }
    }

    pub fn configuration(&self) -> &SwitchConfiguration {
        &self.config
    }

    /// Number of sessions launched so far.
    pub fn connection_count(&self) -> u64 {
        self.last_connection_id.load(Ordering::Relaxed)
    }
}

impl SwitchCore for Ciena6500Core {
    fn node_name(&self) -> &str {
        &self.config.node_name
    }

    fn launch(&self, variant: ShellVariant) -> EngineResult<Box<dyn Shell>> {
        if self.config.mode != ProtocolMode::Tl1 {
            return Err(EngineError::UnsupportedMode(self.config.mode.to_string()));
        }

        let connection_id = self.last_connection_id.fetch_add(1, Ordering::Relaxed) + 1;
        // Filled in when the caller's span declares the field
        Span::current().record("connection", connection_id);
        debug!("Starting new '{}' session #{}", variant, connection_id);

        let processor = new_processor(Arc::clone(&self.config), &self.options, connection_id);
        let session = ShellSession::new(Box::new(processor), Terminal::default());

        Ok(match variant {
            ShellVariant::Cli => Box::new(LineShell::new(session)),
            ShellVariant::Tl1 => Box::new(Tl1Shell::new(session, &self.config.node_name)),
        })
    }
}
