//! Damage attribution - Who gets credit for the last hit

use crate::damage::{AttackerClass, DamageInfoInput};
use crate::types::{DamageType, DeathType, Frame, ObjectId, PlayerIndex};
use serde::{Deserialize, Serialize};

/// Snapshot of the most recent damage worth crediting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageSnapshot {
    pub source_id: Option<ObjectId>,
    pub source_player: Option<PlayerIndex>,
    pub attacker_class: AttackerClass,
    pub damage_type: DamageType,
    pub death_type: DeathType,
    pub amount: f64,
    pub frame: Frame,
}

impl DamageSnapshot {
    pub fn from_input(input: &DamageInfoInput, amount: f64, frame: Frame) -> Self {
        DamageSnapshot {
            source_id: input.source_id,
            source_player: input.source_player,
            attacker_class: input.attacker_class(),
            damage_type: input.damage_type,
            death_type: input.death_type,
            amount,
            frame,
        }
    }
}

/// Decide whether `incoming` replaces the stored snapshot
///
/// Hits landing within `window` frames of a snapshot naming a vehicle,
/// infantry or faction structure do not overwrite it unless they name one too.
pub fn should_replace(
    existing: Option<&DamageSnapshot>,
    incoming: &DamageSnapshot,
    window: Frame,
) -> bool {
    let Some(old) = existing else {
        return true;
    };
    let recent = incoming.frame.saturating_sub(old.frame) <= window;
    !(recent && old.attacker_class.is_significant() && !incoming.attacker_class.is_significant())
}
