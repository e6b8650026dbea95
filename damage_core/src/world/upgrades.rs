//! Upgrade grants and application of upgrade effects

use super::World;
use crate::events::GameEvent;
use crate::types::{ObjectId, PlayerIndex};
use crate::upgrade::{UpgradeEffect, UpgradeKind, UpgradeMask};

impl World {
    /// Object upgrades plus whatever its owner has bought
    fn upgrade_key(&self, id: ObjectId) -> UpgradeMask {
        let Some(object) = self.objects.get(&id) else {
            return UpgradeMask::EMPTY;
        };
        let player = object
            .state
            .owner
            .and_then(|p| self.players.get(p))
            .map_or(UpgradeMask::EMPTY, |p| p.upgrades);
        object.upgrades.union(player)
    }

    /// Grant an upgrade to one object; player upgrades go to its owner
    pub fn give_object_upgrade(&mut self, id: ObjectId, name: &str) -> bool {
        let Some(template) = self.data.upgrades.find(name) else {
            tracing::warn!(upgrade = name, "unknown upgrade");
            return false;
        };
        let (mask, kind) = (template.mask, template.kind);
        let Some(object) = self.objects.get_mut(&id) else {
            tracing::warn!(object = %id, "upgrade for unknown object");
            return false;
        };
        if kind == UpgradeKind::Player {
            let owner = object.state.owner;
            return match owner {
                Some(owner) => self.give_player_upgrade(owner, name),
                None => false,
            };
        }
        object.upgrades.set(mask);
        self.update_upgrade_modules(id);
        true
    }

    pub fn give_player_upgrade(&mut self, player: PlayerIndex, name: &str) -> bool {
        let Some(mask) = self.data.upgrades.find(name).map(|t| t.mask) else {
            tracing::warn!(upgrade = name, "unknown upgrade");
            return false;
        };
        let Some(entry) = self.players.get_mut(player) else {
            tracing::warn!(player = player.0, "upgrade for unknown player");
            return false;
        };
        entry.upgrades.set(mask);

        let owned: Vec<ObjectId> = self
            .objects
            .values()
            .filter(|o| o.state.owner == Some(player))
            .map(|o| o.id())
            .collect();
        for id in owned {
            self.update_upgrade_modules(id);
        }
        true
    }

    /// Take an object upgrade away, re-arming the modules it triggered
    pub fn remove_upgrade(&mut self, id: ObjectId, name: &str) -> bool {
        let Some(mask) = self.data.upgrades.find(name).map(|t| t.mask) else {
            return false;
        };
        match self.objects.get_mut(&id) {
            Some(object) if object.upgrades.test_for_any(mask) => {
                object.upgrades.clear(mask);
            }
            _ => return false,
        }
        self.reset_upgrade_modules(id, mask);
        true
    }

    /// Fire every module the current upgrade key triggers
    pub(super) fn update_upgrade_modules(&mut self, id: ObjectId) {
        let key = self.upgrade_key(id);
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        if !object.is_alive() {
            return;
        }
        let fired: Vec<(String, Vec<UpgradeEffect>)> = object
            .modules
            .upgrade_modules_mut()
            .filter_map(|m| m.attempt_upgrade(key).map(|effects| (m.name().to_string(), effects)))
            .collect();
        for (module, effects) in fired {
            tracing::debug!(object = %id, module = module.as_str(), "upgrade applied");
            self.services.events.push(GameEvent::UpgradeApplied { object: id, module });
            self.apply_upgrade_effects(id, effects);
        }
    }

    fn reset_upgrade_modules(&mut self, id: ObjectId, removed: UpgradeMask) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        let undone: Vec<UpgradeEffect> = object
            .modules
            .upgrade_modules_mut()
            .filter_map(|m| m.reset_upgrade(removed))
            .flatten()
            .collect();
        self.apply_upgrade_effects(id, undone);
    }

    pub(super) fn apply_upgrade_effects(&mut self, id: ObjectId, effects: Vec<UpgradeEffect>) {
        for effect in effects {
            let Some(object) = self.objects.get_mut(&id) else {
                return;
            };
            match effect {
                UpgradeEffect::SetArmorSetFlag(flag) => object.state.armor_set_flags.set(flag),
                UpgradeEffect::ClearArmorSetFlag(flag) => object.state.armor_set_flags.clear(flag),
                UpgradeEffect::AddMaxHealth { amount, change } => {
                    let max_health = object.body.max_health() + amount;
                    let mut ctx = self.services.damage_context(&self.data);
                    object.body.set_max_health(
                        &object.state,
                        &mut object.modules,
                        &mut ctx,
                        max_health,
                        change,
                    );
                }
                UpgradeEffect::SetPowerBonus(active) => {
                    if object.state.power_bonus_active == active {
                        continue;
                    }
                    object.state.power_bonus_active = active;
                    let bonus = object.template.energy_bonus;
                    if let Some(player) = object.state.owner.and_then(|p| self.players.get_mut(p)) {
                        if active {
                            player.energy.add_power_bonus(bonus);
                        } else {
                            player.energy.remove_power_bonus(bonus);
                        }
                    }
                }
                UpgradeEffect::SetStatus(status) => object.state.status.set(status),
                UpgradeEffect::ClearStatus(status) => object.state.clear_status(status),
                UpgradeEffect::RemoveUpgrades(mask) => {
                    object.upgrades.clear(mask);
                    self.reset_upgrade_modules(id, mask);
                }
                UpgradeEffect::Fx(name) => {
                    self.services.events.push(GameEvent::Fx { object: id, name })
                }
            }
        }
    }
}
