//! Configuration loading from TOML files
//!
//! Every error here is a load-time error: data files are expected to be
//! internally consistent, so callers abort start-up on `Err`.

mod armor;
mod objects;
mod rules;
mod upgrades;

pub use armor::{
    load_armor_file, parse_armor_file, ArmorDefinition, ArmorFile, CustomDamageTypeDefinition,
};
pub use objects::{
    load_object_file, parse_object_file, DamageModuleDefinition, ObjectDefinition, ObjectFile,
    UpgradeModuleDefinition, UpgradeModuleKind,
};
pub use rules::{BodyRules, RetaliationRules, RulesConfig};
pub use upgrades::{load_upgrade_file, parse_upgrade_file, UpgradeDefinition, UpgradeFile};

use crate::armor::ArmorStore;
use crate::object::ObjectTemplate;
use crate::upgrade::UpgradeCenter;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
    #[error("Unknown armor: {0}")]
    UnknownArmor(String),
    #[error("Unknown damage type: {0}")]
    UnknownDamageType(String),
    #[error("Unknown upgrade: {0}")]
    UnknownUpgrade(String),
    #[error("Unknown object template: {0}")]
    UnknownTemplate(String),
    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),
}

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load a TOML string and deserialize it
pub fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    let config: T = toml::from_str(content)?;
    Ok(config)
}

/// Everything loaded from the data files, validated and cross-linked
#[derive(Debug, Clone)]
pub struct GameData {
    pub rules: RulesConfig,
    pub armor: ArmorStore,
    pub upgrades: UpgradeCenter,
    pub templates: BTreeMap<String, Arc<ObjectTemplate>>,
}

impl GameData {
    /// Build from the contents of the four data files
    pub fn from_strs(
        rules: &str,
        armor: &str,
        upgrades: &str,
        objects: &str,
    ) -> Result<Self, ConfigError> {
        let rules: RulesConfig = parse_toml(rules)?;
        let armor = ArmorStore::from_file(&parse_armor_file(armor)?)?;
        let upgrades = UpgradeCenter::from_file(&parse_upgrade_file(upgrades)?)?;
        let objects = parse_object_file(objects)?;
        Self::assemble(rules, armor, upgrades, objects)
    }

    /// Load `rules.toml`, `armor.toml`, `upgrades.toml` and `objects.toml` from a directory
    pub fn load_dir(dir: &Path) -> Result<Self, ConfigError> {
        let rules: RulesConfig = load_toml(&dir.join("rules.toml"))?;
        let armor = ArmorStore::from_file(&load_armor_file(&dir.join("armor.toml"))?)?;
        let upgrades = UpgradeCenter::from_file(&load_upgrade_file(&dir.join("upgrades.toml"))?)?;
        let objects = load_object_file(&dir.join("objects.toml"))?;
        Self::assemble(rules, armor, upgrades, objects)
    }

    fn assemble(
        rules: RulesConfig,
        armor: ArmorStore,
        upgrades: UpgradeCenter,
        objects: ObjectFile,
    ) -> Result<Self, ConfigError> {
        rules.validate()?;

        let mut templates = BTreeMap::new();
        for def in objects.object {
            if templates.contains_key(&def.name) {
                return Err(ConfigError::DuplicateDefinition(def.name));
            }
            let template = ObjectTemplate::from_definition(def, &armor, &upgrades)?;
            templates.insert(template.name.clone(), Arc::new(template));
        }

        tracing::debug!(templates = templates.len(), "game data assembled");
        Ok(GameData {
            rules,
            armor,
            upgrades,
            templates,
        })
    }

    pub fn template(&self, name: &str) -> Option<Arc<ObjectTemplate>> {
        self.templates.get(name).cloned()
    }

    /// Like [`GameData::template`], for callers that treat a missing name as a data error
    pub fn require_template(&self, name: &str) -> Result<Arc<ObjectTemplate>, ConfigError> {
        self.template(name).ok_or_else(|| ConfigError::UnknownTemplate(name.to_string()))
    }
}

/// The data set shipped with the crate
pub fn default_game_data() -> Result<GameData, ConfigError> {
    GameData::from_strs(
        include_str!("../../config/rules.toml"),
        include_str!("../../config/armor.toml"),
        include_str!("../../config/upgrades.toml"),
        include_str!("../../config/objects.toml"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_game_data_loads() {
        let data = default_game_data().unwrap();
        assert!(data.template("Tank").is_some());
        assert!(data.template("PowerPlant").is_some());
        assert!(data.armor.find_template("TankArmor").is_some());
        assert!(data.upgrades.find("Upgrade_CompositeArmor").is_some());
    }

    #[test]
    fn test_require_template() {
        let data = default_game_data().unwrap();
        assert_eq!(data.require_template("Tank").unwrap().name, "Tank");
        let err = data.require_template("Mammoth").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTemplate(name) if name == "Mammoth"));
    }

    #[test]
    fn test_unknown_armor_in_template_is_fatal() {
        let objects = r#"
[[object]]
name = "Broken"
[object.body]
max_health = 100.0
[[object.body.armor_sets]]
armor = "NoSuchArmor"
"#;
        let err = GameData::from_strs("", "", "", objects).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownArmor(name) if name == "NoSuchArmor"));
    }

    #[test]
    fn test_duplicate_template_is_fatal() {
        let objects = r#"
[[object]]
name = "Twin"
[object.body]
max_health = 100.0

[[object]]
name = "Twin"
[object.body]
max_health = 100.0
"#;
        let err = GameData::from_strs("", "", "", objects).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDefinition(_)));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = GameData::from_strs("[body", "", "", "").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
