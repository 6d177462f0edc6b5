//! Launcher for emulated switches.
//!
//! - [`SwitchFactory`] builds a device core from a model name and loadout
//! - [`SwitchServer`] serves the core's sessions over raw TCP
//!
//! # Example
//!
//! ```rust,no_run
//! use fakeswitch_engine::ShellVariant;
//! use fakeswitch_runner::{SwitchFactory, SwitchServer};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let core = SwitchFactory::default().get("ciena_6500", "NODE", None)?;
//! let server = SwitchServer::bind("127.0.0.1", 2222, core, ShellVariant::Tl1).await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

mod factory;
mod server;

pub use factory::*;
pub use server::*;
