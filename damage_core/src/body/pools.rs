//! Subdual and chrono pools
//!
//! Both pools disable rather than hurt. Transitions are edge-triggered: the
//! disabled state is applied when a pool crosses its threshold and undone
//! when it drains back below, never re-fired while it stays on one side.

use super::{ActiveBody, CustomSubdualData, DamageContext, DamageOutcome, DamagePool};
use crate::behavior::ModuleRegistry;
use crate::damage::{DamageInfo, DamageInfoInput};
use crate::events::GameEvent;
use crate::object::ObjectState;
use crate::types::{msecs_to_frames, DeathType, DisabledType, KindOf, FOREVER};
use std::sync::Arc;

fn heal_frames(msecs: u32) -> u32 {
    msecs_to_frames(msecs as f64).ceil() as u32
}

/// Advance a pool's heal countdown; true when it healed this frame
fn heal_step(pool: &mut DamagePool, rate_frames: u32, amount: f64) -> bool {
    if pool.damage <= 0.0 {
        return false;
    }
    if pool.heal_countdown > 1 {
        pool.heal_countdown -= 1;
        return false;
    }
    pool.heal_countdown = rate_frames;
    pool.damage = (pool.damage - amount).max(0.0);
    true
}

impl ActiveBody {
    pub fn can_be_subdued(&self) -> bool {
        self.data.subdual_damage_cap > 0.0
    }

    pub fn is_subdued(&self) -> bool {
        self.can_be_subdued() && self.subdual.damage >= self.max_health
    }

    pub fn is_custom_subdued(&self, name: &str) -> bool {
        self.custom_subdual
            .get(name)
            .map_or(false, |pool| pool.damage > 0.0 && pool.damage >= self.max_health)
    }

    pub fn subdual_damage(&self) -> f64 {
        self.subdual.damage
    }

    pub fn custom_subdual_damage(&self, name: &str) -> f64 {
        self.custom_subdual.get(name).map_or(0.0, |pool| pool.damage)
    }

    pub fn chrono_damage(&self) -> f64 {
        self.chrono.damage
    }

    pub fn is_chrono_disabled(&self) -> bool {
        self.chrono.damage > 0.0
            && self.chrono.damage > self.max_health * self.data.chrono_disable_ratio
    }

    /// Whether the input may fill a subdual pool of this object at all
    pub(super) fn can_take_subdual(&self, obj: &ObjectState, input: &DamageInfoInput) -> bool {
        match &input.custom_subdual_type {
            Some(name) => self.data.custom_subdual.get(name).map_or(false, |c| c.cap > 0.0),
            None => {
                self.can_be_subdued()
                    && input
                        .damage_type
                        .subdual_target_kind()
                        .map_or(true, |kind| obj.is_kind_of(kind))
            }
        }
    }

    /// Some subdued pool still holds `disable`
    fn pool_holds(&self, disable: DisabledType) -> bool {
        if disable == DisabledType::Subdued && self.is_subdued() {
            return true;
        }
        self.data
            .custom_subdual
            .iter()
            .any(|(name, custom)| custom.disable_type == disable && self.is_custom_subdued(name))
    }

    pub(super) fn subdual_damage_strategy(
        &mut self,
        obj: &mut ObjectState,
        modules: &mut ModuleRegistry,
        ctx: &mut DamageContext<'_>,
        info: &mut DamageInfo,
    ) {
        if !self.can_take_subdual(obj, &info.input) {
            info.output.no_effect = true;
            return;
        }
        let amount = self.armor_adjusted(obj, ctx.store, &info.input);
        if amount <= 0.0 {
            return;
        }

        let data = Arc::clone(&self.data);
        let clipped = match info.input.custom_subdual_type.clone() {
            Some(name) => {
                let Some(custom) = data.custom_subdual.get(&name) else {
                    return;
                };
                let was = self.is_custom_subdued(&name);
                let pool = self.custom_subdual.entry(name.clone()).or_default();
                let before = pool.damage;
                pool.damage = (pool.damage + amount).min(custom.cap);
                pool.heal_countdown = heal_frames(custom.heal_rate);
                let clipped = pool.damage - before;

                let now = self.is_custom_subdued(&name);
                if was != now {
                    self.dispatch_custom_subdual_change(obj, ctx, &name, custom, now);
                }
                clipped
            }
            None => {
                let was = self.is_subdued();
                let before = self.subdual.damage;
                self.subdual.damage = (self.subdual.damage + amount).min(data.subdual_damage_cap);
                self.subdual.heal_countdown = heal_frames(data.subdual_damage_heal_rate);
                let clipped = self.subdual.damage - before;

                let now = self.is_subdued();
                if was != now {
                    self.on_subdual_change(obj, ctx, None, now);
                }
                clipped
            }
        };

        info.output.actual_damage_dealt = amount;
        info.output.actual_damage_clipped = clipped;
        self.record_damage(&info.input, amount, ctx);
        modules.on_damage(&mut ctx.module_context(obj.id), info);
    }

    fn dispatch_custom_subdual_change(
        &mut self,
        obj: &mut ObjectState,
        ctx: &mut DamageContext<'_>,
        name: &str,
        custom: &CustomSubdualData,
        subdued: bool,
    ) {
        if custom.attractor {
            self.on_subdual_change_attractor(obj, ctx, name, custom, subdued);
        } else {
            self.on_subdual_change(obj, ctx, Some((name, custom)), subdued);
        }
    }

    /// Default subdual edge handler
    ///
    /// Projectiles jam. Anything else is disabled; on recovery the disable is
    /// only lifted once no other subdued pool holds the same disable type.
    fn on_subdual_change(
        &mut self,
        obj: &mut ObjectState,
        ctx: &mut DamageContext<'_>,
        custom: Option<(&str, &CustomSubdualData)>,
        subdued: bool,
    ) {
        let disable = custom.map_or(DisabledType::Subdued, |(_, data)| data.disable_type);
        if obj.is_kind_of(KindOf::Projectile) {
            if subdued {
                ctx.events.push(GameEvent::ProjectileJammed { object: obj.id });
            }
        } else if subdued {
            obj.set_disabled_until(disable, FOREVER);
            if obj.contain.as_ref().map_or(false, |c| !c.passengers.is_empty()) {
                ctx.events.push(GameEvent::PassengersIdled { object: obj.id });
            }
        } else if !self.pool_holds(disable) {
            obj.clear_disabled(disable);
        }

        let custom_type = custom.map(|(name, _)| name.to_string());
        tracing::debug!(object = %obj.id, ?custom_type, subdued, "subdual changed");
        ctx.events.push(GameEvent::SubdualChanged {
            object: obj.id,
            custom_type,
            subdued,
        });
    }

    /// Attractor subdual edge handler
    ///
    /// Projectiles are drawn off course instead of jamming, and recovery
    /// lifts this pool's disable type unconditionally.
    fn on_subdual_change_attractor(
        &mut self,
        obj: &mut ObjectState,
        ctx: &mut DamageContext<'_>,
        name: &str,
        custom: &CustomSubdualData,
        subdued: bool,
    ) {
        if obj.is_kind_of(KindOf::Projectile) {
            if subdued {
                ctx.events.push(GameEvent::ProjectileDrawn { object: obj.id });
            }
        } else if subdued {
            obj.set_disabled_until(custom.disable_type, FOREVER);
        } else {
            obj.clear_disabled(custom.disable_type);
        }

        tracing::debug!(object = %obj.id, custom_type = name, subdued, "attractor subdual changed");
        ctx.events.push(GameEvent::SubdualChanged {
            object: obj.id,
            custom_type: Some(name.to_string()),
            subdued,
        });
    }

    pub(super) fn chrono_damage_strategy(
        &mut self,
        obj: &mut ObjectState,
        modules: &mut ModuleRegistry,
        ctx: &mut DamageContext<'_>,
        info: &mut DamageInfo,
        outcome: &mut DamageOutcome,
    ) {
        let amount = self.armor_adjusted(obj, ctx.store, &info.input);
        if amount <= 0.0 {
            return;
        }
        let was_disabled = self.is_chrono_disabled();
        self.chrono.damage += amount;
        self.chrono.heal_countdown = heal_frames(self.data.chrono_heal_rate);
        info.output.actual_damage_dealt = amount;
        info.output.actual_damage_clipped = amount;
        self.record_damage(&info.input, amount, ctx);
        modules.on_damage(&mut ctx.module_context(obj.id), info);

        if self.chrono.damage > self.max_health {
            let prev = self.current_health;
            self.internal_change_health(-prev);
            if let Some(snapshot) = self.last_damage.as_mut() {
                snapshot.death_type = DeathType::Chrono;
            }
            self.update_damage_state(obj, modules, ctx, Some(&*info));
            if prev > 0.0 {
                self.die(obj, outcome);
            }
        } else if !was_disabled && self.is_chrono_disabled() {
            obj.set_disabled_until(DisabledType::Chrono, FOREVER);
            tracing::debug!(object = %obj.id, chrono = self.chrono.damage, "chrono disabled");
            ctx.events.push(GameEvent::ChronoDisabled {
                object: obj.id,
                disabled: true,
            });
        }
    }

    /// Per-frame pool recovery
    pub fn update(&mut self, obj: &mut ObjectState, ctx: &mut DamageContext<'_>) {
        if obj.is_effectively_dead() {
            return;
        }
        let data = Arc::clone(&self.data);

        if data.subdual_damage_heal_rate > 0 {
            let was = self.is_subdued();
            let rate = heal_frames(data.subdual_damage_heal_rate);
            let healed = heal_step(&mut self.subdual, rate, data.subdual_damage_heal_amount);
            if healed && was && !self.is_subdued() {
                self.on_subdual_change(obj, ctx, None, false);
            }
        }

        let names: Vec<String> = self.custom_subdual.keys().cloned().collect();
        for name in names {
            let Some(custom) = data.custom_subdual.get(&name) else {
                continue;
            };
            if custom.heal_rate == 0 {
                continue;
            }
            let was = self.is_custom_subdued(&name);
            let healed = match self.custom_subdual.get_mut(&name) {
                Some(pool) => heal_step(pool, heal_frames(custom.heal_rate), custom.heal_amount),
                None => false,
            };
            if healed && was && !self.is_custom_subdued(&name) {
                self.dispatch_custom_subdual_change(obj, ctx, &name, custom, false);
            }
        }

        if data.chrono_heal_rate > 0 {
            let was = self.is_chrono_disabled();
            let rate = heal_frames(data.chrono_heal_rate);
            let healed = heal_step(&mut self.chrono, rate, data.chrono_heal_amount);
            if healed && was && !self.is_chrono_disabled() {
                obj.clear_disabled(DisabledType::Chrono);
                ctx.events.push(GameEvent::ChronoDisabled {
                    object: obj.id,
                    disabled: false,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::ActiveBodyData;
    use super::*;
    use crate::damage::DamageInfo;
    use crate::object::{Contain, ContainKind};
    use crate::types::{BodyDamageType, DamageType, ObjectId};

    fn subduable(max: f64, cap: f64) -> ActiveBody {
        let mut data = ActiveBodyData::new(max);
        data.subdual_damage_cap = cap;
        data.subdual_damage_heal_rate = 1000;
        data.subdual_damage_heal_amount = 200.0;
        ActiveBody::new(Arc::new(data))
    }

    fn subdual_events(fx: &Fixture) -> usize {
        fx.events
            .iter()
            .filter(|e| matches!(e, GameEvent::SubdualChanged { subdued: true, .. }))
            .count()
    }

    #[test]
    fn test_subdual_edge_fires_once() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        let mut modules = ModuleRegistry::new();
        let mut body = subduable(100.0, 150.0);

        let mut info = DamageInfo::new(DamageType::SubdualUnresistable, 99.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(!body.is_subdued());
        assert_eq!(subdual_events(&fx), 0);

        let mut info = DamageInfo::new(DamageType::SubdualUnresistable, 1.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(body.is_subdued());
        assert!(obj.is_disabled_by(DisabledType::Subdued));
        assert_eq!(subdual_events(&fx), 1);

        for _ in 0..5 {
            let mut info = DamageInfo::new(DamageType::SubdualUnresistable, 40.0);
            body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        }
        assert_eq!(subdual_events(&fx), 1);
        assert!((body.subdual_damage() - 150.0).abs() < f64::EPSILON);
        // health untouched
        assert!((body.health() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_subdual_heals_and_recovers() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        let mut modules = ModuleRegistry::new();
        let mut body = subduable(100.0, 150.0);

        let mut info = DamageInfo::new(DamageType::SubdualUnresistable, 150.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(obj.is_disabled_by(DisabledType::Subdued));

        // 1000 msec heal rate is 30 frames
        for _ in 0..29 {
            body.update(&mut obj, &mut fx.ctx());
        }
        assert!(body.is_subdued());
        body.update(&mut obj, &mut fx.ctx());
        assert!(!body.is_subdued());
        assert!(!obj.is_disabled_by(DisabledType::Subdued));
    }

    #[test]
    fn test_unsubduable_and_wrong_kind_rejected() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Infantry]);
        let mut modules = ModuleRegistry::new();

        let mut plain = body(100.0);
        let mut info = DamageInfo::new(DamageType::SubdualUnresistable, 500.0);
        plain.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(info.output.no_effect);

        let mut subdue = subduable(100.0, 150.0);
        let mut info = DamageInfo::new(DamageType::SubdualVehicle, 500.0);
        subdue.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(info.output.no_effect);
        assert!(!subdue.is_subdued());
    }

    #[test]
    fn test_projectile_jammed_or_drawn() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Projectile]);
        let mut modules = ModuleRegistry::new();

        let mut data = ActiveBodyData::new(10.0);
        data.subdual_damage_cap = 20.0;
        data.custom_subdual.insert(
            "Magnet".to_string(),
            CustomSubdualData {
                cap: 20.0,
                heal_rate: 0,
                heal_amount: 0.0,
                tint: None,
                disable_type: DisabledType::Held,
                attractor: true,
            },
        );
        let mut body = ActiveBody::new(Arc::new(data));

        let mut info = DamageInfo::new(DamageType::SubdualMissile, 15.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        let mut info =
            DamageInfo::new(DamageType::Unresistable, 15.0).with_custom_subdual("Magnet");
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);

        assert!(fx.events.iter().any(|e| matches!(e, GameEvent::ProjectileJammed { .. })));
        assert!(fx.events.iter().any(|e| matches!(e, GameEvent::ProjectileDrawn { .. })));
        // projectiles are never disabled
        assert!(!obj.is_disabled());
    }

    #[test]
    fn test_default_handler_keeps_shared_disable() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        obj.contain = Some(Contain {
            kind: ContainKind::Transport,
            max_passengers: 4,
            immune_to_kill_garrisoned: false,
            passengers: vec![ObjectId(5)],
        });
        let mut modules = ModuleRegistry::new();

        let mut data = ActiveBodyData::new(100.0);
        data.subdual_damage_cap = 100.0;
        data.subdual_damage_heal_rate = 100;
        data.subdual_damage_heal_amount = 100.0;
        data.custom_subdual.insert(
            "Emp".to_string(),
            CustomSubdualData {
                cap: 100.0,
                heal_rate: 0,
                heal_amount: 0.0,
                tint: Some("Blue".to_string()),
                disable_type: DisabledType::Subdued,
                attractor: false,
            },
        );
        let mut body = ActiveBody::new(Arc::new(data));

        let mut info = DamageInfo::new(DamageType::SubdualUnresistable, 100.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        let mut info = DamageInfo::new(DamageType::Unresistable, 100.0).with_custom_subdual("Emp");
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(fx.events.iter().any(|e| matches!(e, GameEvent::PassengersIdled { .. })));

        // default pool drains, the custom pool still holds the disable
        for _ in 0..3 {
            body.update(&mut obj, &mut fx.ctx());
        }
        assert!(!body.is_subdued());
        assert!(body.is_custom_subdued("Emp"));
        assert!(obj.is_disabled_by(DisabledType::Subdued));
    }

    #[test]
    fn test_attractor_clears_own_disable_unconditionally() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        let mut modules = ModuleRegistry::new();

        let mut data = ActiveBodyData::new(100.0);
        data.subdual_damage_cap = 100.0;
        data.custom_subdual.insert(
            "Pull".to_string(),
            CustomSubdualData {
                cap: 100.0,
                heal_rate: 100,
                heal_amount: 100.0,
                tint: None,
                disable_type: DisabledType::Subdued,
                attractor: true,
            },
        );
        let mut body = ActiveBody::new(Arc::new(data));

        let mut info = DamageInfo::new(DamageType::SubdualUnresistable, 100.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        let mut info = DamageInfo::new(DamageType::Unresistable, 100.0).with_custom_subdual("Pull");
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);

        for _ in 0..3 {
            body.update(&mut obj, &mut fx.ctx());
        }
        assert!(body.is_subdued());
        assert!(!body.is_custom_subdued("Pull"));
        assert!(!obj.is_disabled_by(DisabledType::Subdued));
    }

    #[test]
    fn test_chrono_disables_then_kills() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        let mut modules = ModuleRegistry::new();
        let mut body = body(100.0);

        let mut info = DamageInfo::new(DamageType::ChronoGun, 40.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(!body.is_chrono_disabled());

        let mut info = DamageInfo::new(DamageType::ChronoGun, 20.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(body.is_chrono_disabled());
        assert!(obj.is_disabled_by(DisabledType::Chrono));
        assert!((body.health() - 100.0).abs() < f64::EPSILON);

        // healing does not drain the chrono pool
        let mut info = DamageInfo::new(DamageType::Healing, 50.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!((body.chrono_damage() - 60.0).abs() < f64::EPSILON);

        let mut info = DamageInfo::new(DamageType::ChronoUnresistable, 50.0);
        let outcome = body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(outcome.died);
        assert!(body.health() <= 0.0);
        assert_eq!(body.damage_state(), BodyDamageType::Rubble);
        assert_eq!(body.last_damage().map(|s| s.death_type), Some(DeathType::Chrono));
    }

    #[test]
    fn test_chrono_decay_lifts_disable() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        let mut modules = ModuleRegistry::new();
        let mut data = ActiveBodyData::new(100.0);
        data.chrono_heal_rate = 100;
        data.chrono_heal_amount = 30.0;
        let mut body = ActiveBody::new(Arc::new(data));

        let mut info = DamageInfo::new(DamageType::ChronoGun, 60.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(obj.is_disabled_by(DisabledType::Chrono));

        for _ in 0..3 {
            body.update(&mut obj, &mut fx.ctx());
        }
        assert!(!body.is_chrono_disabled());
        assert!(!obj.is_disabled_by(DisabledType::Chrono));
    }
}
