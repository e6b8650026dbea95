//! Upgrade modules - What an object gains when an upgrade fires
//!
//! Modules never touch the object directly. They hand back a list of
//! [`UpgradeEffect`]s and the world applies them in order.

use super::mux::UpgradeActivation;
use super::UpgradeMask;
use crate::config::UpgradeModuleKind;
use crate::object::ResolvedUpgradeModule;
use crate::types::{ArmorSetFlag, MaxHealthChangeType, ObjectStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpgradeEffect {
    SetArmorSetFlag(ArmorSetFlag),
    ClearArmorSetFlag(ArmorSetFlag),
    AddMaxHealth {
        amount: f64,
        change: MaxHealthChangeType,
    },
    SetPowerBonus(bool),
    SetStatus(ObjectStatus),
    ClearStatus(ObjectStatus),
    /// Take these upgrades away from the object
    RemoveUpgrades(UpgradeMask),
    Fx(String),
}

pub trait UpgradeModule: fmt::Debug {
    fn name(&self) -> &str;

    fn activation(&self) -> &UpgradeActivation;

    fn activation_mut(&mut self) -> &mut UpgradeActivation;

    fn upgrade_implementation(&self) -> Vec<UpgradeEffect>;

    /// Effects that undo the upgrade once its trigger is removed
    fn downgrade_implementation(&self) -> Vec<UpgradeEffect> {
        Vec::new()
    }

    /// Everything that happens when the module fires
    fn fired_effects(&self) -> Vec<UpgradeEffect> {
        let mut effects = self.upgrade_implementation();
        let masks = self.activation().masks();
        if let Some(fx) = &masks.fx_on_upgrade {
            effects.push(UpgradeEffect::Fx(fx.clone()));
        }
        if masks.removes.any() {
            effects.push(UpgradeEffect::RemoveUpgrades(masks.removes));
        }
        effects
    }

    /// Fire if `key` triggers this module and it has not fired yet
    fn attempt_upgrade(&mut self, key: UpgradeMask) -> Option<Vec<UpgradeEffect>> {
        if !self.activation_mut().attempt_upgrade(key) {
            return None;
        }
        Some(self.fired_effects())
    }

    /// Fire unconditionally, for modules that start active
    fn force_activate(&mut self) -> Vec<UpgradeEffect> {
        self.activation_mut().set_executed(true);
        self.fired_effects()
    }

    fn reset_upgrade(&mut self, removed: UpgradeMask) -> Option<Vec<UpgradeEffect>> {
        if !self.activation_mut().reset_upgrade(removed) {
            return None;
        }
        Some(self.downgrade_implementation())
    }

    fn summary(&self) -> String {
        let state = if self.activation().is_already_upgraded() {
            "active"
        } else {
            "waiting"
        };
        format!("{} ({})", self.name(), state)
    }
}

#[derive(Debug, Clone)]
pub struct ArmorUpgrade {
    activation: UpgradeActivation,
    flag: ArmorSetFlag,
}

impl ArmorUpgrade {
    pub fn new(activation: UpgradeActivation, flag: ArmorSetFlag) -> Self {
        ArmorUpgrade { activation, flag }
    }
}

impl UpgradeModule for ArmorUpgrade {
    fn name(&self) -> &str {
        "ArmorUpgrade"
    }

    fn activation(&self) -> &UpgradeActivation {
        &self.activation
    }

    fn activation_mut(&mut self) -> &mut UpgradeActivation {
        &mut self.activation
    }

    fn upgrade_implementation(&self) -> Vec<UpgradeEffect> {
        vec![UpgradeEffect::SetArmorSetFlag(self.flag)]
    }

    fn downgrade_implementation(&self) -> Vec<UpgradeEffect> {
        vec![UpgradeEffect::ClearArmorSetFlag(self.flag)]
    }
}

#[derive(Debug, Clone)]
pub struct MaxHealthUpgrade {
    activation: UpgradeActivation,
    add_max_health: f64,
    change: MaxHealthChangeType,
}

impl MaxHealthUpgrade {
    pub fn new(
        activation: UpgradeActivation,
        add_max_health: f64,
        change: MaxHealthChangeType,
    ) -> Self {
        MaxHealthUpgrade {
            activation,
            add_max_health,
            change,
        }
    }
}

impl UpgradeModule for MaxHealthUpgrade {
    fn name(&self) -> &str {
        "MaxHealthUpgrade"
    }

    fn activation(&self) -> &UpgradeActivation {
        &self.activation
    }

    fn activation_mut(&mut self) -> &mut UpgradeActivation {
        &mut self.activation
    }

    fn upgrade_implementation(&self) -> Vec<UpgradeEffect> {
        vec![UpgradeEffect::AddMaxHealth {
            amount: self.add_max_health,
            change: self.change,
        }]
    }
}

/// Turns on the owner's extra energy production
#[derive(Debug, Clone)]
pub struct PowerPlantUpgrade {
    activation: UpgradeActivation,
}

impl PowerPlantUpgrade {
    pub fn new(activation: UpgradeActivation) -> Self {
        PowerPlantUpgrade { activation }
    }
}

impl UpgradeModule for PowerPlantUpgrade {
    fn name(&self) -> &str {
        "PowerPlantUpgrade"
    }

    fn activation(&self) -> &UpgradeActivation {
        &self.activation
    }

    fn activation_mut(&mut self) -> &mut UpgradeActivation {
        &mut self.activation
    }

    fn upgrade_implementation(&self) -> Vec<UpgradeEffect> {
        vec![UpgradeEffect::SetPowerBonus(true)]
    }

    fn downgrade_implementation(&self) -> Vec<UpgradeEffect> {
        vec![UpgradeEffect::SetPowerBonus(false)]
    }
}

#[derive(Debug, Clone)]
pub struct StatusBitsUpgrade {
    activation: UpgradeActivation,
    status_to_set: Vec<ObjectStatus>,
    status_to_clear: Vec<ObjectStatus>,
}

impl StatusBitsUpgrade {
    pub fn new(
        activation: UpgradeActivation,
        status_to_set: Vec<ObjectStatus>,
        status_to_clear: Vec<ObjectStatus>,
    ) -> Self {
        StatusBitsUpgrade {
            activation,
            status_to_set,
            status_to_clear,
        }
    }
}

impl UpgradeModule for StatusBitsUpgrade {
    fn name(&self) -> &str {
        "StatusBitsUpgrade"
    }

    fn activation(&self) -> &UpgradeActivation {
        &self.activation
    }

    fn activation_mut(&mut self) -> &mut UpgradeActivation {
        &mut self.activation
    }

    fn upgrade_implementation(&self) -> Vec<UpgradeEffect> {
        let set = self.status_to_set.iter().map(|s| UpgradeEffect::SetStatus(*s));
        let clear = self.status_to_clear.iter().map(|s| UpgradeEffect::ClearStatus(*s));
        set.chain(clear).collect()
    }

    fn downgrade_implementation(&self) -> Vec<UpgradeEffect> {
        let clear = self.status_to_set.iter().map(|s| UpgradeEffect::ClearStatus(*s));
        let set = self.status_to_clear.iter().map(|s| UpgradeEffect::SetStatus(*s));
        clear.chain(set).collect()
    }
}

pub fn build_upgrade_module(module: &ResolvedUpgradeModule) -> Box<dyn UpgradeModule> {
    let activation = UpgradeActivation::new(module.masks.clone());
    match &module.kind {
        UpgradeModuleKind::Armor { flag } => Box::new(ArmorUpgrade::new(activation, *flag)),
        UpgradeModuleKind::MaxHealth {
            add_max_health,
            change_type,
        } => Box::new(MaxHealthUpgrade::new(activation, *add_max_health, *change_type)),
        UpgradeModuleKind::PowerPlant => Box::new(PowerPlantUpgrade::new(activation)),
        UpgradeModuleKind::StatusBits {
            status_to_set,
            status_to_clear,
        } => Box::new(StatusBitsUpgrade::new(
            activation,
            status_to_set.clone(),
            status_to_clear.clone(),
        )),
    }
}
