//! Object template files

use super::ConfigError;
use crate::body::ActiveBodyData;
use crate::object::ContainDefinition;
use crate::types::{
    ArmorSetFlag, BodyDamageType, FlagSet, KindOf, MaxHealthChangeType, ObjectStatus,
};
use crate::upgrade::UpgradeMuxData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Contents of an object data file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectFile {
    #[serde(default)]
    pub object: Vec<ObjectDefinition>,
}

/// One object template as written in the data file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDefinition {
    pub name: String,
    #[serde(default)]
    pub kinds: FlagSet<KindOf>,
    /// Positive values produce power, negative values consume it
    #[serde(default)]
    pub energy_production: i32,
    /// Extra production granted once a power plant upgrade completes
    #[serde(default)]
    pub energy_bonus: i32,
    /// Experience awarded to whoever kills this object
    #[serde(default)]
    pub experience_value: u32,
    /// Experience needed for each veterancy level, starting at regular
    #[serde(default = "default_experience_required")]
    pub experience_required: Vec<u32>,
    /// Multiplier from the object's current weapon applied to incoming damage
    #[serde(default = "default_weapon_armor_bonus")]
    pub weapon_armor_bonus: f64,
    pub body: ActiveBodyData,
    #[serde(default)]
    pub contain: Option<ContainDefinition>,
    #[serde(default)]
    pub damage_modules: Vec<DamageModuleDefinition>,
    #[serde(default)]
    pub upgrade_modules: Vec<UpgradeModuleDefinition>,
}

fn default_experience_required() -> Vec<u32> {
    vec![0, 100, 200, 400]
}

fn default_weapon_armor_bonus() -> f64 {
    1.0
}

/// Damage-capable behavior modules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DamageModuleDefinition {
    /// Keeps running totals of damage and healing received
    History,
    /// Fires a named effect when a damage state is entered
    TransitionFx {
        #[serde(default)]
        fx: BTreeMap<BodyDamageType, String>,
    },
}

/// An upgrade module: activation rules plus what it does
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeModuleDefinition {
    #[serde(flatten)]
    pub mux: UpgradeMuxData,
    #[serde(flatten)]
    pub kind: UpgradeModuleKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpgradeModuleKind {
    /// Sets an armor set flag so a better armor is selected
    Armor {
        #[serde(default = "default_armor_upgrade_flag")]
        flag: ArmorSetFlag,
    },
    MaxHealth {
        add_max_health: f64,
        #[serde(default)]
        change_type: MaxHealthChangeType,
    },
    /// Switches on the template's energy bonus
    PowerPlant,
    StatusBits {
        #[serde(default)]
        status_to_set: Vec<ObjectStatus>,
        #[serde(default)]
        status_to_clear: Vec<ObjectStatus>,
    },
}

fn default_armor_upgrade_flag() -> ArmorSetFlag {
    ArmorSetFlag::PlayerUpgrade
}

pub fn load_object_file(path: &Path) -> Result<ObjectFile, ConfigError> {
    super::load_toml(path)
}

pub fn parse_object_file(content: &str) -> Result<ObjectFile, ConfigError> {
    super::parse_toml(content)
}
