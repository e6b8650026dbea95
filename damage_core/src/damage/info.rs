//! DamageInfo - What the attacker asks for and what the body reports back

use crate::types::{DamageType, DeathType, FlagSet, KindOf, ObjectId, ObjectStatus, PlayerIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Coarse classification of an attacker used for kill attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttackerClass {
    Vehicle,
    Infantry,
    FactionStructure,
    #[default]
    Other,
}

impl AttackerClass {
    pub fn from_kinds(kinds: &FlagSet<KindOf>) -> Self {
        if kinds.test(KindOf::Vehicle) {
            AttackerClass::Vehicle
        } else if kinds.test(KindOf::Infantry) {
            AttackerClass::Infantry
        } else if kinds.test(KindOf::FsFactionStructure) {
            AttackerClass::FactionStructure
        } else {
            AttackerClass::Other
        }
    }

    /// Attackers that identify a meaningful killer
    pub fn is_significant(self) -> bool {
        self != AttackerClass::Other
    }
}

/// Request side of a damage event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageInfoInput {
    // === Source ===
    pub source_id: Option<ObjectId>,
    pub source_player: Option<PlayerIndex>,
    /// Kinds of the source object, filled in by the world when empty
    pub source_kinds: FlagSet<KindOf>,
    /// Custom statuses carried by the source
    pub source_custom_status: BTreeSet<String>,

    // === Damage ===
    pub damage_type: DamageType,
    /// Custom damage type name, empty for none
    pub custom_damage_type: String,
    pub death_type: DeathType,
    pub amount: f64,
    /// Remove exactly the remaining health
    pub kill: bool,

    // === Special types ===
    /// Status applied by `DamageType::Status`; the amount is its duration in msec
    pub status_type: Option<ObjectStatus>,
    /// Route the damage into this custom subdual pool
    pub custom_subdual_type: Option<String>,

    // === Height gate ===
    pub min_damage_height: Option<f64>,
    pub max_damage_height: Option<f64>,
}

impl Default for DamageInfoInput {
    fn default() -> Self {
        DamageInfoInput {
            source_id: None,
            source_player: None,
            source_kinds: FlagSet::new(),
            source_custom_status: BTreeSet::new(),
            damage_type: DamageType::Unresistable,
            custom_damage_type: String::new(),
            death_type: DeathType::Normal,
            amount: 0.0,
            kill: false,
            status_type: None,
            custom_subdual_type: None,
            min_damage_height: None,
            max_damage_height: None,
        }
    }
}

impl DamageInfoInput {
    pub fn attacker_class(&self) -> AttackerClass {
        AttackerClass::from_kinds(&self.source_kinds)
    }

    /// True when `height` lies inside the optional height window
    pub fn height_allowed(&self, height: f64) -> bool {
        if let Some(min) = self.min_damage_height {
            if height < min {
                return false;
            }
        }
        if let Some(max) = self.max_damage_height {
            if height > max {
                return false;
            }
        }
        true
    }
}

/// Result side of a damage event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageInfoOutput {
    /// Amount requested after every modifier
    pub actual_damage_dealt: f64,
    /// Amount that actually changed the target
    pub actual_damage_clipped: f64,
    /// The target ignored the request
    pub no_effect: bool,
}

/// A damage event travelling from attacker to body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DamageInfo {
    pub input: DamageInfoInput,
    pub output: DamageInfoOutput,
}

impl DamageInfo {
    pub fn new(damage_type: DamageType, amount: f64) -> Self {
        DamageInfo {
            input: DamageInfoInput {
                damage_type,
                amount,
                ..Default::default()
            },
            output: DamageInfoOutput::default(),
        }
    }

    /// Unresistable request for whatever health is left
    pub fn kill(source: Option<ObjectId>) -> Self {
        let mut info = DamageInfo::new(DamageType::Unresistable, 0.0);
        info.input.source_id = source;
        info.input.kill = true;
        info
    }

    pub fn from_source(mut self, source: ObjectId, player: Option<PlayerIndex>) -> Self {
        self.input.source_id = Some(source);
        self.input.source_player = player;
        self
    }

    pub fn with_custom_type(mut self, name: &str) -> Self {
        self.input.custom_damage_type = name.to_string();
        self
    }

    pub fn with_death_type(mut self, death_type: DeathType) -> Self {
        self.input.death_type = death_type;
        self
    }

    /// Status applied by status damage; the amount is its duration in msec
    pub fn with_status(mut self, status: ObjectStatus) -> Self {
        self.input.status_type = Some(status);
        self
    }

    pub fn with_custom_subdual(mut self, name: &str) -> Self {
        self.input.custom_subdual_type = Some(name.to_string());
        self
    }

    pub fn with_height_window(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.input.min_damage_height = min;
        self.input.max_damage_height = max;
        self
    }
}
