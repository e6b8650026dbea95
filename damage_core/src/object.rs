//! Game objects - Templates, per-object state and the object wrapper

use crate::armor::ArmorStore;
use crate::behavior::ModuleRegistry;
use crate::body::{ActiveBody, ActiveBodyData};
use crate::config::{ConfigError, DamageModuleDefinition, ObjectDefinition, UpgradeModuleKind};
use crate::types::{
    ArmorSetFlag, DisabledType, FlagSet, Frame, KindOf, ObjectId, ObjectStatus, PlayerIndex,
    VeterancyLevel, WeaponBonusCondition, FOREVER,
};
use crate::upgrade::{UpgradeCenter, UpgradeMask, UpgradeMuxMasks};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Location in the world; `height` is above terrain
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub height: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y, height: 0.0 }
    }

    pub fn at_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    pub fn distance_2d(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainKind {
    #[default]
    Transport,
    /// Buildings infantry can occupy
    Garrison,
    /// Bikes and similar where the passenger is the crew
    RiderChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainDefinition {
    #[serde(default)]
    pub kind: ContainKind,
    #[serde(default = "default_max_passengers")]
    pub max_passengers: usize,
    #[serde(default)]
    pub immune_to_kill_garrisoned: bool,
}

fn default_max_passengers() -> usize {
    10
}

/// Runtime passenger list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contain {
    pub kind: ContainKind,
    pub max_passengers: usize,
    pub immune_to_kill_garrisoned: bool,
    pub passengers: Vec<ObjectId>,
}

impl Contain {
    pub fn new(def: &ContainDefinition) -> Self {
        Contain {
            kind: def.kind,
            max_passengers: def.max_passengers,
            immune_to_kill_garrisoned: def.immune_to_kill_garrisoned,
            passengers: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.passengers.len() >= self.max_passengers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiState {
    #[default]
    Idle,
    Attacking(ObjectId),
}

/// Mutable per-object state read and written by the body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectState {
    pub id: ObjectId,
    pub owner: Option<PlayerIndex>,
    pub kinds: FlagSet<KindOf>,
    pub position: Position,

    // === Status ===
    pub status: FlagSet<ObjectStatus>,
    /// Expiry frames of timed statuses
    pub status_until: BTreeMap<ObjectStatus, Frame>,
    pub custom_status: BTreeSet<String>,
    pub weapon_bonus: FlagSet<WeaponBonusCondition>,
    pub custom_bonus: BTreeSet<String>,
    /// Disabled reasons and the frame each one lapses
    pub disabled: BTreeMap<DisabledType, Frame>,
    pub armor_set_flags: FlagSet<ArmorSetFlag>,

    // === Combat ===
    pub weapon_armor_bonus: f64,
    pub contain: Option<Contain>,
    pub ai: AiState,
    pub effectively_dead: bool,
    pub power_bonus_active: bool,
}

impl ObjectState {
    pub fn new(
        id: ObjectId,
        owner: Option<PlayerIndex>,
        kinds: FlagSet<KindOf>,
        position: Position,
    ) -> Self {
        ObjectState {
            id,
            owner,
            kinds,
            position,
            status: FlagSet::new(),
            status_until: BTreeMap::new(),
            custom_status: BTreeSet::new(),
            weapon_bonus: FlagSet::new(),
            custom_bonus: BTreeSet::new(),
            disabled: BTreeMap::new(),
            armor_set_flags: FlagSet::new(),
            weapon_armor_bonus: 1.0,
            contain: None,
            ai: AiState::Idle,
            effectively_dead: false,
            power_bonus_active: false,
        }
    }

    pub fn is_effectively_dead(&self) -> bool {
        self.effectively_dead
    }

    pub fn is_kind_of(&self, kind: KindOf) -> bool {
        self.kinds.test(kind)
    }

    /// Set a status until `until`, keeping a later expiry already in place
    pub fn set_status_until(&mut self, status: ObjectStatus, until: Frame) {
        self.status.set(status);
        let entry = self.status_until.entry(status).or_insert(until);
        *entry = (*entry).max(until);
    }

    pub fn clear_status(&mut self, status: ObjectStatus) {
        self.status.clear(status);
        self.status_until.remove(&status);
    }

    pub fn set_disabled_until(&mut self, disabled: DisabledType, until: Frame) {
        let entry = self.disabled.entry(disabled).or_insert(until);
        *entry = (*entry).max(until);
    }

    pub fn clear_disabled(&mut self, disabled: DisabledType) {
        self.disabled.remove(&disabled);
    }

    pub fn is_disabled(&self) -> bool {
        !self.disabled.is_empty()
    }

    pub fn is_disabled_by(&self, disabled: DisabledType) -> bool {
        self.disabled.contains_key(&disabled)
    }

    /// Drop timed statuses and disables that lapsed by `frame`
    pub fn expire(&mut self, frame: Frame) {
        let expired: Vec<ObjectStatus> = self
            .status_until
            .iter()
            .filter(|(_, until)| **until <= frame)
            .map(|(status, _)| *status)
            .collect();
        for status in expired {
            self.clear_status(status);
        }
        self.disabled.retain(|_, until| *until == FOREVER || *until > frame);
    }
}

/// Upgrade module as resolved against the upgrade registry
#[derive(Debug, Clone)]
pub struct ResolvedUpgradeModule {
    pub masks: UpgradeMuxMasks,
    pub kind: UpgradeModuleKind,
}

/// Immutable per-type data shared by every instance
#[derive(Debug, Clone)]
pub struct ObjectTemplate {
    pub name: String,
    pub kinds: FlagSet<KindOf>,
    pub energy_production: i32,
    pub energy_bonus: i32,
    pub experience_value: u32,
    pub experience_required: Vec<u32>,
    pub weapon_armor_bonus: f64,
    pub body: Arc<ActiveBodyData>,
    pub contain: Option<ContainDefinition>,
    pub damage_modules: Vec<DamageModuleDefinition>,
    pub upgrade_modules: Vec<ResolvedUpgradeModule>,
}

impl ObjectTemplate {
    /// Validate a definition and resolve every name it references
    pub fn from_definition(
        def: ObjectDefinition,
        armor: &ArmorStore,
        upgrades: &UpgradeCenter,
    ) -> Result<Self, ConfigError> {
        def.body.validate(&def.name)?;
        for entry in &def.body.armor_sets {
            if let Some(name) = &entry.armor {
                if armor.find_template(name).is_none() {
                    return Err(ConfigError::UnknownArmor(name.clone()));
                }
            }
        }
        if def.experience_required.len() != VeterancyLevel::ALL.len()
            || def.experience_required.windows(2).any(|w| w[0] > w[1])
        {
            return Err(ConfigError::ValidationError(format!(
                "{}: experience_required needs {} ascending entries",
                def.name,
                VeterancyLevel::ALL.len()
            )));
        }

        let upgrade_modules = def
            .upgrade_modules
            .into_iter()
            .map(|module| {
                Ok(ResolvedUpgradeModule {
                    masks: UpgradeMuxMasks::resolve(&module.mux, upgrades)?,
                    kind: module.kind,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(ObjectTemplate {
            name: def.name,
            kinds: def.kinds,
            energy_production: def.energy_production,
            energy_bonus: def.energy_bonus,
            experience_value: def.experience_value,
            experience_required: def.experience_required,
            weapon_armor_bonus: def.weapon_armor_bonus,
            body: Arc::new(def.body),
            contain: def.contain,
            damage_modules: def.damage_modules,
            upgrade_modules,
        })
    }

    /// Highest level whose experience requirement is met
    pub fn level_for_experience(&self, experience: u32) -> VeterancyLevel {
        let mut level = VeterancyLevel::Regular;
        for (required, candidate) in self.experience_required.iter().zip(VeterancyLevel::ALL) {
            if experience >= *required {
                level = *candidate;
            }
        }
        level
    }
}

/// A live object: shared template plus its own state, body and modules
#[derive(Debug)]
pub struct GameObject {
    pub template: Arc<ObjectTemplate>,
    pub state: ObjectState,
    pub body: ActiveBody,
    pub modules: ModuleRegistry,
    pub upgrades: UpgradeMask,
    pub experience: u32,
    pub veterancy: VeterancyLevel,
}

impl GameObject {
    pub fn new(
        id: ObjectId,
        template: Arc<ObjectTemplate>,
        owner: Option<PlayerIndex>,
        position: Position,
    ) -> Self {
        let mut state = ObjectState::new(id, owner, template.kinds, position);
        state.weapon_armor_bonus = template.weapon_armor_bonus;
        state.contain = template.contain.as_ref().map(Contain::new);
        GameObject {
            body: ActiveBody::new(Arc::clone(&template.body)),
            modules: ModuleRegistry::from_template(&template),
            state,
            template,
            upgrades: UpgradeMask::EMPTY,
            experience: 0,
            veterancy: VeterancyLevel::Regular,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.state.id
    }

    pub fn is_alive(&self) -> bool {
        !self.state.effectively_dead
    }

    /// Energy this object currently contributes to its owner
    pub fn energy_contribution(&self) -> i32 {
        let bonus = if self.state.power_bonus_active {
            self.template.energy_bonus
        } else {
            0
        };
        self.template.energy_production + bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_status_expires() {
        let mut state = ObjectState::new(ObjectId(1), None, FlagSet::new(), Position::default());
        state.set_status_until(ObjectStatus::Poisoned, 10);
        state.set_status_until(ObjectStatus::Poisoned, 5);
        state.expire(9);
        assert!(state.status.test(ObjectStatus::Poisoned));
        state.expire(10);
        assert!(!state.status.test(ObjectStatus::Poisoned));
    }

    #[test]
    fn test_forever_disable_survives_expiry() {
        let mut state = ObjectState::new(ObjectId(1), None, FlagSet::new(), Position::default());
        state.set_disabled_until(DisabledType::Unmanned, FOREVER);
        state.set_disabled_until(DisabledType::Emp, 20);
        state.expire(FOREVER - 1);
        assert!(state.is_disabled_by(DisabledType::Unmanned));
        assert!(!state.is_disabled_by(DisabledType::Emp));
    }

    #[test]
    fn test_distance_ignores_height() {
        let a = Position::new(0.0, 0.0).at_height(50.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance_2d(&b) - 5.0).abs() < f64::EPSILON);
    }
}
