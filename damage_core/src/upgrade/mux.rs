//! Upgrade activation - Trigger and conflict masks plus the executed flag
//!
//! Every upgrade module embeds one [`UpgradeActivation`] and asks it whether a
//! given set of owned upgrades should fire the module.

use super::{UpgradeCenter, UpgradeMask};
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Activation rules as written in the data file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpgradeMuxData {
    #[serde(default)]
    pub triggered_by: Vec<String>,
    #[serde(default)]
    pub conflicts_with: Vec<String>,
    /// Upgrades taken away from the object once this module fires
    #[serde(default)]
    pub removes_upgrades: Vec<String>,
    #[serde(default)]
    pub requires_all_triggers: bool,
    /// Fire as soon as the object is created
    #[serde(default)]
    pub starts_active: bool,
    #[serde(default)]
    pub fx_on_upgrade: Option<String>,
}

/// Activation rules resolved to upgrade bits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpgradeMuxMasks {
    pub activation: UpgradeMask,
    pub conflicting: UpgradeMask,
    pub removes: UpgradeMask,
    pub requires_all_triggers: bool,
    pub starts_active: bool,
    pub fx_on_upgrade: Option<String>,
}

impl UpgradeMuxMasks {
    pub fn resolve(data: &UpgradeMuxData, center: &UpgradeCenter) -> Result<Self, ConfigError> {
        Ok(UpgradeMuxMasks {
            activation: center.mask_of(&data.triggered_by)?,
            conflicting: center.mask_of(&data.conflicts_with)?,
            removes: center.mask_of(&data.removes_upgrades)?,
            requires_all_triggers: data.requires_all_triggers,
            starts_active: data.starts_active,
            fx_on_upgrade: data.fx_on_upgrade.clone(),
        })
    }
}

/// Per-module activation state
#[derive(Debug, Clone, Default)]
pub struct UpgradeActivation {
    masks: UpgradeMuxMasks,
    executed: bool,
}

impl UpgradeActivation {
    pub fn new(masks: UpgradeMuxMasks) -> Self {
        UpgradeActivation { masks, executed: false }
    }

    pub fn masks(&self) -> &UpgradeMuxMasks {
        &self.masks
    }

    pub fn is_already_upgraded(&self) -> bool {
        self.executed
    }

    pub fn set_executed(&mut self, executed: bool) {
        self.executed = executed;
    }

    fn triggers_met(&self, key: UpgradeMask) -> bool {
        if self.masks.conflicting.any() && key.test_for_any(self.masks.conflicting) {
            return false;
        }
        if self.masks.requires_all_triggers {
            key.test_for_all(self.masks.activation)
        } else {
            key.test_for_any(self.masks.activation)
        }
    }

    /// True when `key` would fire a module that has not fired yet
    pub fn would_upgrade(&self, key: UpgradeMask) -> bool {
        self.masks.activation.any() && key.any() && !self.executed && self.triggers_met(key)
    }

    /// Conditions check ignoring the executed flag
    ///
    /// A module with neither triggers nor conflicts always passes.
    pub fn test_upgrade_conditions(&self, key: UpgradeMask) -> bool {
        if !self.masks.activation.any() && !self.masks.conflicting.any() {
            return true;
        }
        self.triggers_met(key)
    }

    /// Mark the module executed if `key` fires it; returns whether it did
    pub fn attempt_upgrade(&mut self, key: UpgradeMask) -> bool {
        if !self.would_upgrade(key) {
            return false;
        }
        self.executed = true;
        true
    }

    /// Re-arm the module when one of its triggers is `removed`
    pub fn reset_upgrade(&mut self, removed: UpgradeMask) -> bool {
        if self.executed && self.masks.activation.test_for_any(removed) {
            self.executed = false;
            return true;
        }
        false
    }

    /// Whether the module should re-apply its effect after a state change
    pub fn force_refresh_upgrade(&self) -> bool {
        self.executed
    }

    pub fn is_triggered_by(&self, upgrade: UpgradeMask) -> bool {
        self.masks.activation.test_for_any(upgrade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masks(activation: &[usize], conflicting: &[usize], all: bool) -> UpgradeMuxMasks {
        let fold = |bits: &[usize]| {
            bits.iter()
                .fold(UpgradeMask::EMPTY, |m, b| m.union(UpgradeMask::bit(*b)))
        };
        UpgradeMuxMasks {
            activation: fold(activation),
            conflicting: fold(conflicting),
            requires_all_triggers: all,
            ..Default::default()
        }
    }

    #[test]
    fn test_fires_once() {
        let mut activation = UpgradeActivation::new(masks(&[0], &[], false));
        let key = UpgradeMask::bit(0);
        assert!(activation.attempt_upgrade(key));
        assert!(activation.is_already_upgraded());
        assert!(!activation.attempt_upgrade(key));
        assert!(!activation.would_upgrade(key));
    }

    #[test]
    fn test_any_versus_all_triggers() {
        let any = UpgradeActivation::new(masks(&[0, 1], &[], false));
        let all = UpgradeActivation::new(masks(&[0, 1], &[], true));
        let partial = UpgradeMask::bit(1);
        let full = UpgradeMask::bit(0).union(UpgradeMask::bit(1));

        assert!(any.would_upgrade(partial));
        assert!(!all.would_upgrade(partial));
        assert!(all.would_upgrade(full));
    }

    #[test]
    fn test_conflict_blocks() {
        let activation = UpgradeActivation::new(masks(&[0], &[2], false));
        let key = UpgradeMask::bit(0).union(UpgradeMask::bit(2));
        assert!(!activation.would_upgrade(key));
        assert!(!activation.test_upgrade_conditions(key));
        assert!(activation.would_upgrade(UpgradeMask::bit(0)));
    }

    #[test]
    fn test_no_conditions() {
        let activation = UpgradeActivation::new(UpgradeMuxMasks::default());
        assert!(activation.test_upgrade_conditions(UpgradeMask::EMPTY));
        assert!(!activation.would_upgrade(UpgradeMask::bit(3)));
    }

    #[test]
    fn test_reset_rearms_only_for_own_trigger() {
        let mut activation = UpgradeActivation::new(masks(&[0], &[], false));
        assert!(activation.attempt_upgrade(UpgradeMask::bit(0)));
        assert!(!activation.reset_upgrade(UpgradeMask::bit(4)));
        assert!(activation.force_refresh_upgrade());
        assert!(activation.reset_upgrade(UpgradeMask::bit(0)));
        assert!(!activation.is_already_upgraded());
        assert!(activation.attempt_upgrade(UpgradeMask::bit(0)));
    }
}
