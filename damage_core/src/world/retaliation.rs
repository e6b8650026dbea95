//! Retaliation - Idle friends of a victim turn on its attacker

use crate::object::{AiState, GameObject};
use crate::player::Players;
use crate::types::{KindOf, ObjectId, ObjectStatus, Relationship};
use std::collections::BTreeMap;

/// Whether `object` may drop what it is doing to answer an attack
fn can_retaliate(object: &GameObject) -> bool {
    let state = &object.state;
    object.is_alive()
        && state.ai == AiState::Idle
        && state.is_kind_of(KindOf::CanAttack)
        && !state.is_kind_of(KindOf::Aircraft)
        && !state.is_kind_of(KindOf::Drone)
        && !state.status.test(ObjectStatus::Stealthed)
        && !state.status.test(ObjectStatus::IsUsingAbility)
        && !state.is_disabled()
}

/// Friends of `victim` that should attack `attacker`
///
/// Only attacks by an enemy of the victim's owner are answered. The victim
/// itself is left to its own AI.
pub fn retaliators(
    objects: &BTreeMap<ObjectId, GameObject>,
    players: &Players,
    victim: ObjectId,
    attacker: ObjectId,
    radius: f64,
) -> Vec<ObjectId> {
    let (Some(victim), Some(attacker)) = (objects.get(&victim), objects.get(&attacker)) else {
        return Vec::new();
    };
    if victim.state.owner.is_none() || !attacker.is_alive() {
        return Vec::new();
    }
    if players.relationship(victim.state.owner, attacker.state.owner) != Relationship::Enemies {
        return Vec::new();
    }

    objects
        .values()
        .filter(|o| o.id() != victim.id() && o.id() != attacker.id())
        .filter(|o| players.relationship(o.state.owner, victim.state.owner) == Relationship::Allies)
        .filter(|o| o.state.position.distance_2d(&victim.state.position) <= radius)
        .filter(|o| can_retaliate(o))
        .map(GameObject::id)
        .collect()
}
