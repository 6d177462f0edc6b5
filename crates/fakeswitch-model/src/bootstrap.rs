//! Card bootstrapping.
//!
//! Each supported card model knows which chassis it goes into and which
//! ports it brings along. Models are matched case-insensitively.

use tracing::{debug, info};

use crate::configuration::{Card, Port, SwitchConfiguration};
use crate::error::{ConfigError, ConfigResult};
use crate::loadout::LoadoutCard;

/// Speed of the shelf processor's LAN port, in Mb/s.
pub const MGMT_PORT_SPEED: u32 = 1000;

type Installer = fn(&mut SwitchConfiguration, &LoadoutCard) -> ConfigResult<()>;

/// Installs loadout cards into a configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct CardBootstrapper;

impl CardBootstrapper {
    pub fn new() -> Self {
        CardBootstrapper
    }

    /// Whether `model` has an installer.
    pub fn supports(&self, model: &str) -> bool {
        installer_for(model).is_some()
    }

    /// Install one card.
    pub fn bootstrap(
        &self,
        configuration: &mut SwitchConfiguration,
        entry: &LoadoutCard,
    ) -> ConfigResult<()> {
        let installer = installer_for(&entry.model)
            .ok_or_else(|| ConfigError::UnsupportedModel(entry.model.clone()))?;
        installer(configuration, entry)?;
        debug!(
            "installed {} in chassis {} slot {}",
            entry.model, entry.chassis, entry.slot
        );
        Ok(())
    }
}

fn installer_for(model: &str) -> Option<Installer> {
    match model.to_ascii_lowercase().as_str() {
        "sp2_ntk555fa" => Some(sp2_ntk555fa),
        _ => None,
    }
}

/// SP-2 shelf processor (NTK555FA), carries the shelf's LAN port.
fn sp2_ntk555fa(configuration: &mut SwitchConfiguration, entry: &LoadoutCard) -> ConfigResult<()> {
    let mut card = Card::from_loadout(entry)?;
    let chassis = configuration.add_or_get_chassis(&entry.chassis);
    if chassis.card_in_slot(&entry.slot).is_some() {
        return Err(ConfigError::SlotOccupied {
            chassis: entry.chassis.clone(),
            slot: entry.slot.clone(),
        });
    }

    let port = Port {
        name: format!("LAN-{}-{}", chassis.name, card.slot),
        speed: MGMT_PORT_SPEED,
    };
    info!("Adding {} with port {}", card.full_aid(), port.name);
    card.ports.push(port);
    chassis.cards.push(card);
    Ok(())
}
