//! Device data model for emulated nodes.
//!
//! - [`Loadout`]: the on-disk description of installed cards (JSON or YAML)
//! - [`SwitchConfiguration`]: chassis, cards and ports built from a loadout
//! - [`CardBootstrapper`]: per-model installation rules
//!
//! # Example
//!
//! ```rust,no_run
//! use fakeswitch_model::SwitchConfiguration;
//!
//! let configuration = SwitchConfiguration::from_file("eu-uk-not1-1", "loadout.json")?;
//! for card in configuration.cards() {
//!     println!("{}", card.full_aid());
//! }
//! # Ok::<(), fakeswitch_model::ConfigError>(())
//! ```

mod bootstrap;
mod configuration;
mod error;
mod loadout;

pub use bootstrap::*;
pub use configuration::*;
pub use error::*;
pub use loadout::*;
