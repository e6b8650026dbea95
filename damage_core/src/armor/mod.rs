//! Armor system - Templates, the global store and per-object armor handles

mod set;
mod store;
mod template;

pub use set::{find_best_armor_set, ArmorSetEntry};
pub use store::{ArmorStore, CustomDamageTypeInfo, CustomTypeId};
pub use template::ArmorTemplate;

use crate::types::{DamageType, FlagSet, ObjectStatus, WeaponBonusCondition};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Handle binding an object to a shared armor template
///
/// With no template every call is neutral.
#[derive(Debug, Clone, Default)]
pub struct Armor {
    template: Option<Arc<ArmorTemplate>>,
}

impl Armor {
    pub fn new(template: Option<Arc<ArmorTemplate>>) -> Self {
        Armor { template }
    }

    pub fn clear(&mut self) {
        self.template = None;
    }

    pub fn template(&self) -> Option<&ArmorTemplate> {
        self.template.as_deref()
    }

    pub fn adjust_damage(
        &self,
        store: &ArmorStore,
        damage_type: DamageType,
        amount: f64,
        custom_type: &str,
    ) -> f64 {
        match &self.template {
            Some(template) => template.adjust_damage(store, damage_type, amount, custom_type),
            None => amount,
        }
    }

    pub fn scale_armor_bonus(
        &self,
        status: &FlagSet<ObjectStatus>,
        weapon_bonus: &FlagSet<WeaponBonusCondition>,
        custom_status: &BTreeSet<String>,
        custom_bonus: &BTreeSet<String>,
    ) -> f64 {
        match &self.template {
            Some(template) => {
                template.scale_armor_bonus(status, weapon_bonus, custom_status, custom_bonus)
            }
            None => 1.0,
        }
    }
}
