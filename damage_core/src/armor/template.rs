//! ArmorTemplate - Per-armor damage coefficient tables

use super::store::ArmorStore;
use crate::types::{DamageType, Flag, FlagSet, ObjectStatus, WeaponBonusCondition};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A named table of multiplicative damage coefficients
///
/// Built once at load time (optionally by copying another template) and never
/// mutated afterwards. Every coefficient starts at 1.0, which leaves damage
/// unchanged.
#[derive(Debug, Clone)]
pub struct ArmorTemplate {
    damage_coefficients: Vec<f64>,
    status_coefficients: Vec<f64>,
    weapon_bonus_coefficients: Vec<f64>,
    custom_coefficients: HashMap<String, f64>,
    custom_multipliers: HashMap<String, f64>,
    custom_status_coefficients: HashMap<String, f64>,
    custom_bonus_coefficients: HashMap<String, f64>,
}

impl Default for ArmorTemplate {
    fn default() -> Self {
        ArmorTemplate {
            damage_coefficients: vec![1.0; DamageType::COUNT],
            status_coefficients: vec![1.0; ObjectStatus::COUNT],
            weapon_bonus_coefficients: vec![1.0; WeaponBonusCondition::COUNT],
            custom_coefficients: HashMap::new(),
            custom_multipliers: HashMap::new(),
            custom_status_coefficients: HashMap::new(),
            custom_bonus_coefficients: HashMap::new(),
        }
    }
}

impl ArmorTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every coefficient to 1.0 and drop all custom entries
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set_coefficient(&mut self, damage_type: DamageType, coefficient: f64) {
        self.damage_coefficients[damage_type.index()] = coefficient;
    }

    /// Set the coefficient of every built-in damage type at once
    pub fn set_all_coefficients(&mut self, coefficient: f64) {
        self.damage_coefficients.fill(coefficient);
    }

    pub fn coefficient(&self, damage_type: DamageType) -> f64 {
        self.damage_coefficients[damage_type.index()]
    }

    pub fn set_custom_coefficient(&mut self, name: &str, coefficient: f64) {
        self.custom_coefficients.insert(name.to_string(), coefficient);
    }

    pub fn custom_coefficient(&self, name: &str) -> Option<f64> {
        self.custom_coefficients.get(name).copied()
    }

    pub fn set_custom_multiplier(&mut self, name: &str, multiplier: f64) {
        self.custom_multipliers.insert(name.to_string(), multiplier);
    }

    pub fn set_status_coefficient(&mut self, status: ObjectStatus, coefficient: f64) {
        self.status_coefficients[status.index() as usize] = coefficient;
    }

    pub fn set_weapon_bonus_coefficient(
        &mut self,
        condition: WeaponBonusCondition,
        coefficient: f64,
    ) {
        self.weapon_bonus_coefficients[condition.index() as usize] = coefficient;
    }

    pub fn set_custom_status_coefficient(&mut self, name: &str, coefficient: f64) {
        self.custom_status_coefficients.insert(name.to_string(), coefficient);
    }

    pub fn set_custom_bonus_coefficient(&mut self, name: &str, coefficient: f64) {
        self.custom_bonus_coefficients.insert(name.to_string(), coefficient);
    }

    /// Scale incoming damage by this armor
    ///
    /// Resolution order:
    /// 1. A custom multiplier for `custom_type` scales the amount; an exact
    ///    custom coefficient then applies and ends resolution.
    /// 2. If `custom_type` is a registered custom damage type, its linked
    ///    custom types are searched breadth-first for a coefficient this armor
    ///    declares. Failing that, the type's built-in link or its default
    ///    coefficient applies.
    /// 3. Unresistable types pass through untouched.
    /// 4. Otherwise the built-in coefficient applies, clamped at zero.
    pub fn adjust_damage(
        &self,
        store: &ArmorStore,
        damage_type: DamageType,
        amount: f64,
        custom_type: &str,
    ) -> f64 {
        let mut amount = amount;

        if !custom_type.is_empty() {
            if let Some(multiplier) = self.custom_multipliers.get(custom_type) {
                amount *= multiplier;
            }
            if let Some(coefficient) = self.custom_coefficients.get(custom_type) {
                return (amount * coefficient).max(0.0);
            }
            if let Some(coefficient) = self.resolve_custom_coefficient(store, custom_type) {
                return (amount * coefficient).max(0.0);
            }
        }

        if damage_type.is_unresistable() {
            return amount;
        }

        (amount * self.coefficient(damage_type)).max(0.0)
    }

    /// Breadth-first walk over the custom damage type link graph
    ///
    /// Returns `None` when `name` is not a registered custom damage type.
    fn resolve_custom_coefficient(&self, store: &ArmorStore, name: &str) -> Option<f64> {
        let root = store.custom_type_id(name)?;
        let info = store.custom_type(root)?;

        let mut visited = vec![false; store.custom_type_count()];
        visited[root.index()] = true;

        let mut frontier: VecDeque<_> = info.linked_custom_types.iter().copied().collect();
        while let Some(id) = frontier.pop_front() {
            if visited[id.index()] {
                continue;
            }
            visited[id.index()] = true;

            let linked_name = store.custom_type_name(id);
            if let Some(coefficient) = self.custom_coefficients.get(linked_name) {
                tracing::trace!(
                    from = name,
                    via = linked_name,
                    coefficient = *coefficient,
                    "custom damage type resolved through link"
                );
                return Some(*coefficient);
            }

            if let Some(linked) = store.custom_type(id) {
                frontier.extend(
                    linked
                        .linked_custom_types
                        .iter()
                        .copied()
                        .filter(|next| !visited[next.index()]),
                );
            }
        }

        match info.link_damage_type {
            Some(link) => Some(self.coefficient(link)),
            None => Some(info.default_coefficient),
        }
    }

    /// Multiply together every armor bonus whose condition is present
    ///
    /// Returns 1.0 when nothing matches.
    pub fn scale_armor_bonus(
        &self,
        status: &FlagSet<ObjectStatus>,
        weapon_bonus: &FlagSet<WeaponBonusCondition>,
        custom_status: &BTreeSet<String>,
        custom_bonus: &BTreeSet<String>,
    ) -> f64 {
        let mut scale = 1.0;

        if status.any() {
            scale *= status
                .iter()
                .map(|s| self.status_coefficients[s.index() as usize])
                .product::<f64>();
        }

        if weapon_bonus.any() {
            scale *= weapon_bonus
                .iter()
                .map(|c| self.weapon_bonus_coefficients[c.index() as usize])
                .product::<f64>();
        }

        if !custom_status.is_empty() && !self.custom_status_coefficients.is_empty() {
            for name in custom_status {
                if let Some(coefficient) = self.custom_status_coefficients.get(name) {
                    scale *= coefficient;
                }
            }
        }

        if !custom_bonus.is_empty() && !self.custom_bonus_coefficients.is_empty() {
            for name in custom_bonus {
                if let Some(coefficient) = self.custom_bonus_coefficients.get(name) {
                    scale *= coefficient;
                }
            }
        }

        scale
    }
}
