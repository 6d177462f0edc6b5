//! In-memory device configuration.
//!
//! The configuration is built once at startup from a [`Loadout`] and then
//! shared read-only between all sessions of a node.

use std::path::Path;

use serde::Serialize;

use crate::bootstrap::CardBootstrapper;
use crate::error::{ConfigError, ConfigResult};
use crate::loadout::{Loadout, LoadoutCard, ProtocolMode};

/// Management port attached to a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    /// Port name, e.g. `LAN-1-15`.
    pub name: String,
    /// Link speed in Mb/s.
    pub speed: u32,
}

/// A card installed in a chassis slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub model: String,
    pub aid: String,
    pub chassis: String,
    pub slot: String,
    /// Reported fields in loadout order.
    pub fields: Vec<(String, String)>,
    /// Status tokens, primary state first.
    pub statuses: Vec<String>,
    pub ports: Vec<Port>,
}

impl Card {
    /// Build a card from its loadout entry. Fields must be `key=value`,
    /// split at the first `=`. A repeated key keeps its first position and
    /// takes the last value.
    pub fn from_loadout(entry: &LoadoutCard) -> ConfigResult<Card> {
        let mut fields: Vec<(String, String)> = Vec::with_capacity(entry.fields.len());
        for field in &entry.fields {
            let (key, value) = field
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidField(field.clone()))?;
            match fields.iter_mut().find(|(k, _)| k == key) {
                Some(existing) => existing.1 = value.to_string(),
                None => fields.push((key.to_string(), value.to_string())),
            }
        }

        Ok(Card {
            model: entry.model.clone(),
            aid: entry.aid.clone(),
            chassis: entry.chassis.clone(),
            slot: entry.slot.clone(),
            fields,
            statuses: entry.statuses.clone(),
            ports: Vec::new(),
        })
    }

    /// `<aid>-<chassis>-<slot>`, e.g. `SP-1-15`.
    pub fn full_aid(&self) -> String {
        format!("{}-{}-{}", self.aid, self.chassis, self.slot)
    }

    /// Look up a field value.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A shelf holding cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chassis {
    pub name: String,
    pub cards: Vec<Card>,
}

impl Chassis {
    /// Create an empty chassis.
    pub fn new(name: &str) -> Self {
        Chassis {
            name: name.to_string(),
            cards: Vec::new(),
        }
    }

    /// Card in `slot`, if populated.
    pub fn card_in_slot(&self, slot: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.slot == slot)
    }
}

/// Complete configuration of one emulated node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchConfiguration {
    /// Node name, used as TID and in response headers.
    pub node_name: String,
    /// Management protocol.
    pub mode: ProtocolMode,
    /// Chassis in loadout order.
    pub chassis: Vec<Chassis>,
}

impl SwitchConfiguration {
    /// A node with no equipment.
    pub fn empty(node_name: &str) -> Self {
        SwitchConfiguration {
            node_name: node_name.to_string(),
            mode: ProtocolMode::default(),
            chassis: Vec::new(),
        }
    }

    /// Build a node from a loadout, bootstrapping every card in order.
    pub fn new(node_name: &str, loadout: &Loadout) -> ConfigResult<Self> {
        let mut configuration = SwitchConfiguration::empty(node_name);
        if let Some(mode) = loadout.mode {
            configuration.mode = mode;
        }

        let bootstrapper = CardBootstrapper::new();
        for entry in &loadout.loadout {
            bootstrapper.bootstrap(&mut configuration, entry)?;
        }
        Ok(configuration)
    }

    /// Build a node from a loadout file.
    pub fn from_file(node_name: &str, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let loadout = Loadout::from_file(path)?;
        SwitchConfiguration::new(node_name, &loadout)
    }

    /// Chassis by name.
    pub fn get_chassis(&self, name: &str) -> Option<&Chassis> {
        self.chassis.iter().find(|c| c.name == name)
    }

    /// Chassis by name, created at the end of the list when missing.
    pub fn add_or_get_chassis(&mut self, name: &str) -> &mut Chassis {
        let index = match self.chassis.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.chassis.push(Chassis::new(name));
                self.chassis.len() - 1
            }
        };
        &mut self.chassis[index]
    }

    /// All cards, chassis by chassis, in loadout order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.chassis.iter().flat_map(|c| c.cards.iter())
    }
}
