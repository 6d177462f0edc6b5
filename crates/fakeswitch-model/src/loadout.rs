//! Loadout files describing which cards populate a node.
//!
//! A loadout is read once at startup, before any session is accepted. Both
//! JSON and YAML are accepted; the format is picked from the file extension.
//!
//! ```yaml
//! mode: tl1
//! loadout:
//!   - model: SP2_NTK555FA
//!     aid: SP
//!     chassis: 1
//!     slot: 15
//!     fields: ["CTYPE=\"Shelf Processor\"", "PEC=NTK555FA"]
//!     statuses: ["IS"]
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Management protocol spoken by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolMode {
    /// Transaction Language 1.
    #[default]
    Tl1,
    /// Vendor command line.
    Cli,
}

impl fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolMode::Tl1 => f.write_str("tl1"),
            ProtocolMode::Cli => f.write_str("cli"),
        }
    }
}

/// Top-level loadout document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Loadout {
    /// Protocol mode; the node default applies when absent.
    #[serde(default)]
    pub mode: Option<ProtocolMode>,
    /// Cards to install.
    #[serde(default)]
    pub loadout: Vec<LoadoutCard>,
}

/// One card entry of a loadout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutCard {
    /// Card model, selects the bootstrapper (e.g. `SP2_NTK555FA`).
    pub model: String,
    /// AID prefix of the card (e.g. `SP`).
    pub aid: String,
    /// Chassis (shelf) the card sits in.
    #[serde(deserialize_with = "string_or_number")]
    pub chassis: String,
    /// Slot within the chassis.
    #[serde(deserialize_with = "string_or_number")]
    pub slot: String,
    /// Reported fields, each `key=value`.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Reported status tokens (primary state first).
    #[serde(default)]
    pub statuses: Vec<String>,
}

impl Loadout {
    /// Parse a JSON loadout.
    pub fn from_json(text: &str) -> ConfigResult<Loadout> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a YAML loadout.
    pub fn from_yaml(text: &str) -> ConfigResult<Loadout> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a loadout file. `.yaml`/`.yml` files are parsed as YAML,
    /// anything else as JSON.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Loadout> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Loadout::from_yaml(&text),
            _ => Loadout::from_json(&text),
        }
    }
}

/// Accept `slot: 15` as well as `slot: "15"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Integer(i64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Integer(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "mode": "tl1",
        "loadout": [
            {
                "model": "SP2_NTK555FA",
                "aid": "SP",
                "chassis": 1,
                "slot": "15",
                "fields": ["CTYPE=\"Shelf Processor\"", "PEC=NTK555FA"],
                "statuses": ["IS"]
            }
        ]
    }"#;

    #[test]
    fn test_parse_json() {
        let loadout = Loadout::from_json(JSON).unwrap();
        assert_eq!(loadout.mode, Some(ProtocolMode::Tl1));
        assert_eq!(loadout.loadout.len(), 1);

        let card = &loadout.loadout[0];
        assert_eq!(card.chassis, "1");
        assert_eq!(card.slot, "15");
        assert_eq!(card.fields[0], "CTYPE=\"Shelf Processor\"");
        assert_eq!(card.statuses, vec!["IS".to_string()]);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "
loadout:
  - model: SP2_NTK555FA
    aid: SP
    chassis: 2
    slot: 1
";
        let loadout = Loadout::from_yaml(yaml).unwrap();
        assert_eq!(loadout.mode, None);
        assert_eq!(loadout.loadout[0].chassis, "2");
        assert!(loadout.loadout[0].fields.is_empty());
        assert!(loadout.loadout[0].statuses.is_empty());
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result = Loadout::from_json(r#"{"mode": "netconf", "loadout": []}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Loadout::from_file("/nonexistent/loadout.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
