//! Upgrade definition files

use super::ConfigError;
use crate::upgrade::UpgradeKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of an upgrade data file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpgradeFile {
    #[serde(default)]
    pub upgrade: Vec<UpgradeDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeDefinition {
    pub name: String,
    #[serde(default)]
    pub kind: UpgradeKind,
}

pub fn load_upgrade_file(path: &Path) -> Result<UpgradeFile, ConfigError> {
    super::load_toml(path)
}

pub fn parse_upgrade_file(content: &str) -> Result<UpgradeFile, ConfigError> {
    super::parse_toml(content)
}
