//! Upgrades - Registry, bit masks and activation state
//!
//! Each upgrade name owns one bit. Objects and players carry a mask of the
//! upgrades they have; modules carry the masks that trigger them.

mod modules;
mod mux;

pub use modules::{
    build_upgrade_module, ArmorUpgrade, MaxHealthUpgrade, PowerPlantUpgrade, StatusBitsUpgrade,
    UpgradeEffect, UpgradeModule,
};
pub use mux::{UpgradeActivation, UpgradeMuxData, UpgradeMuxMasks};

use crate::config::{ConfigError, UpgradeFile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Whether an upgrade is bought once for the player or per object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    Player,
    #[default]
    Object,
}

/// Set of upgrades, one bit per registered upgrade
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UpgradeMask(u128);

impl UpgradeMask {
    pub const EMPTY: UpgradeMask = UpgradeMask(0);
    pub const CAPACITY: usize = 128;

    pub fn bit(index: usize) -> Self {
        UpgradeMask(1u128 << index)
    }

    pub fn any(&self) -> bool {
        self.0 != 0
    }

    pub fn test_for_any(&self, other: UpgradeMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn test_for_all(&self, other: UpgradeMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn set(&mut self, other: UpgradeMask) {
        self.0 |= other.0;
    }

    pub fn clear(&mut self, other: UpgradeMask) {
        self.0 &= !other.0;
    }

    pub fn union(self, other: UpgradeMask) -> UpgradeMask {
        UpgradeMask(self.0 | other.0)
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }
}

impl fmt::Debug for UpgradeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UpgradeMask({:#x})", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct UpgradeTemplate {
    pub name: String,
    pub kind: UpgradeKind,
    pub mask: UpgradeMask,
}

/// Registry of every upgrade, filled at load time
#[derive(Debug, Clone, Default)]
pub struct UpgradeCenter {
    templates: Vec<UpgradeTemplate>,
    by_name: HashMap<String, usize>,
}

impl UpgradeCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(file: &UpgradeFile) -> Result<Self, ConfigError> {
        let mut center = UpgradeCenter::new();
        for def in &file.upgrade {
            center.register(&def.name, def.kind)?;
        }
        tracing::debug!(upgrades = center.len(), "upgrade center loaded");
        Ok(center)
    }

    pub fn register(&mut self, name: &str, kind: UpgradeKind) -> Result<UpgradeMask, ConfigError> {
        if self.by_name.contains_key(name) {
            return Err(ConfigError::DuplicateDefinition(name.to_string()));
        }
        if self.templates.len() >= UpgradeMask::CAPACITY {
            return Err(ConfigError::ValidationError(format!(
                "too many upgrades, at most {} are supported",
                UpgradeMask::CAPACITY
            )));
        }
        let mask = UpgradeMask::bit(self.templates.len());
        self.by_name.insert(name.to_string(), self.templates.len());
        self.templates.push(UpgradeTemplate {
            name: name.to_string(),
            kind,
            mask,
        });
        Ok(mask)
    }

    pub fn find(&self, name: &str) -> Option<&UpgradeTemplate> {
        self.by_name.get(name).map(|i| &self.templates[*i])
    }

    /// Combined mask of `names`; any unknown name is an error
    pub fn mask_of<S: AsRef<str>>(&self, names: &[S]) -> Result<UpgradeMask, ConfigError> {
        let mut mask = UpgradeMask::EMPTY;
        for name in names {
            let name = name.as_ref();
            let template = self
                .find(name)
                .ok_or_else(|| ConfigError::UnknownUpgrade(name.to_string()))?;
            mask.set(template.mask);
        }
        Ok(mask)
    }

    /// Names of the upgrades in `mask`, in registration order
    pub fn names_in(&self, mask: UpgradeMask) -> Vec<&str> {
        self.templates
            .iter()
            .filter(|t| mask.test_for_any(t.mask))
            .map(|t| t.name.as_str())
            .collect()
    }

    pub fn templates(&self) -> impl Iterator<Item = &UpgradeTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
