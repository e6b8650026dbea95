//! Armor definition files

use super::ConfigError;
use crate::types::{ObjectStatus, WeaponBonusCondition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Contents of an armor data file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmorFile {
    #[serde(default)]
    pub armor: Vec<ArmorDefinition>,
    #[serde(default)]
    pub custom_damage_type: Vec<CustomDamageTypeDefinition>,
}

/// One named armor
///
/// Coefficient keys are damage type names; the key `default` sets every
/// built-in type before the specific entries apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmorDefinition {
    pub name: String,
    /// Armor to copy before applying this definition's fields
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub custom_coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub custom_multipliers: BTreeMap<String, f64>,
    #[serde(default)]
    pub status_coefficients: BTreeMap<ObjectStatus, f64>,
    #[serde(default)]
    pub weapon_bonus_coefficients: BTreeMap<WeaponBonusCondition, f64>,
    #[serde(default)]
    pub custom_status_coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub custom_bonus_coefficients: BTreeMap<String, f64>,
}

/// A global custom damage type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomDamageTypeDefinition {
    pub name: String,
    #[serde(default = "default_coefficient")]
    pub default_coefficient: f64,
    /// Built-in damage type name whose coefficient is borrowed
    #[serde(default)]
    pub link_damage_type: Option<String>,
    #[serde(default)]
    pub linked_custom_types: Vec<String>,
}

fn default_coefficient() -> f64 {
    1.0
}

/// Load an armor file from disk
pub fn load_armor_file(path: &Path) -> Result<ArmorFile, ConfigError> {
    super::load_toml(path)
}

/// Parse an armor file from a TOML string
pub fn parse_armor_file(content: &str) -> Result<ArmorFile, ConfigError> {
    super::parse_toml(content)
}
