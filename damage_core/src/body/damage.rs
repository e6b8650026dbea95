//! Damage and healing entry points
//!
//! `attempt_damage` rejects what the body ignores, then routes the request to
//! one strategy per damage family. Each strategy fills the output amounts and
//! the outcome; nothing here touches other objects directly.

use super::attribution::{should_replace, DamageSnapshot};
use super::{ActiveBody, DamageContext, DamageOutcome};
use crate::armor::ArmorStore;
use crate::behavior::ModuleRegistry;
use crate::damage::{DamageInfo, DamageInfoInput, DamageInfoOutput, DamageStrategy};
use crate::events::GameEvent;
use crate::object::{AiState, ContainKind, ObjectState};
use crate::types::{msecs_to_frames, DamageType, DisabledType, KindOf, FOREVER};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Indestructible,
    AlreadyDead,
    SourceCannotDamage,
    OutOfHeightRange,
    ChronoDisabled,
}

impl ActiveBody {
    fn rejection(
        &self,
        obj: &ObjectState,
        ctx: &DamageContext<'_>,
        input: &DamageInfoInput,
    ) -> Option<Rejection> {
        if self.indestructible {
            return Some(Rejection::Indestructible);
        }
        if obj.is_effectively_dead() {
            return Some(Rejection::AlreadyDead);
        }
        if let Some(status) = &ctx.rules.body.no_damage_custom_status {
            if input.source_custom_status.contains(status) {
                return Some(Rejection::SourceCannotDamage);
            }
        }
        if !input.height_allowed(obj.position.height) {
            return Some(Rejection::OutOfHeightRange);
        }
        if self.is_chrono_disabled()
            && !input.kill
            && !input.damage_type.is_chrono()
            && input.damage_type != DamageType::Healing
        {
            return Some(Rejection::ChronoDisabled);
        }
        None
    }

    /// Armor and bonus scaled amount, before the damage scalar
    pub(super) fn armor_adjusted(
        &self,
        obj: &ObjectState,
        store: &ArmorStore,
        input: &DamageInfoInput,
    ) -> f64 {
        let mut amount = self
            .armor
            .adjust_damage(store, input.damage_type, input.amount, &input.custom_damage_type);
        if !input.damage_type.is_unresistable() {
            amount *= obj.weapon_armor_bonus;
            amount *= self.armor.scale_armor_bonus(
                &obj.status,
                &obj.weapon_bonus,
                &obj.custom_status,
                &obj.custom_bonus,
            );
        }
        amount.max(0.0)
    }

    pub(super) fn record_damage(
        &mut self,
        input: &DamageInfoInput,
        amount: f64,
        ctx: &DamageContext<'_>,
    ) {
        let snapshot = DamageSnapshot::from_input(input, amount, ctx.frame);
        let window = ctx.rules.body.attribution_window_frames;
        if should_replace(self.last_damage.as_ref(), &snapshot, window) {
            self.last_damage = Some(snapshot);
        }
        self.last_damage_frame = Some(ctx.frame);
    }

    pub(super) fn die(&mut self, obj: &mut ObjectState, outcome: &mut DamageOutcome) {
        obj.effectively_dead = true;
        outcome.died = true;
        tracing::debug!(object = %obj.id, "body destroyed");
    }

    /// Apply a damage request
    ///
    /// Returns what the world still has to do; `info.output` holds the
    /// amounts dealt and clipped.
    pub fn attempt_damage(
        &mut self,
        obj: &mut ObjectState,
        modules: &mut ModuleRegistry,
        ctx: &mut DamageContext<'_>,
        info: &mut DamageInfo,
    ) -> DamageOutcome {
        info.output = DamageInfoOutput::default();
        self.validate_armor(ctx.store, &obj.armor_set_flags);

        if let Some(reason) = self.rejection(obj, ctx, &info.input) {
            tracing::trace!(object = %obj.id, ?reason, "damage rejected");
            info.output.no_effect = true;
            return DamageOutcome::default();
        }

        let mut outcome = DamageOutcome::default();
        match DamageStrategy::for_input(&info.input) {
            DamageStrategy::Heal => self.heal(obj, modules, ctx, info),
            DamageStrategy::KillPilot => self.kill_pilot(obj, ctx, info, &mut outcome),
            DamageStrategy::KillGarrisoned => self.kill_garrisoned(obj, ctx, info, &mut outcome),
            DamageStrategy::StatusOnly => self.status_damage(obj, ctx, info),
            DamageStrategy::Chrono => {
                self.chrono_damage_strategy(obj, modules, ctx, info, &mut outcome)
            }
            DamageStrategy::Subdual => self.subdual_damage_strategy(obj, modules, ctx, info),
            DamageStrategy::Generic => self.generic_damage(obj, modules, ctx, info, &mut outcome),
        }

        if info.output.actual_damage_dealt > 0.0 && info.input.damage_type != DamageType::Healing {
            outcome.retaliate_against = info.input.source_id;
        }
        outcome
    }

    /// Apply healing; anything but healing damage goes through `attempt_damage`
    pub fn attempt_healing(
        &mut self,
        obj: &mut ObjectState,
        modules: &mut ModuleRegistry,
        ctx: &mut DamageContext<'_>,
        info: &mut DamageInfo,
    ) -> DamageOutcome {
        if info.input.damage_type != DamageType::Healing {
            return self.attempt_damage(obj, modules, ctx, info);
        }
        info.output = DamageInfoOutput::default();
        self.validate_armor(ctx.store, &obj.armor_set_flags);
        if obj.is_effectively_dead() {
            info.output.no_effect = true;
            return DamageOutcome::default();
        }
        self.heal(obj, modules, ctx, info);
        DamageOutcome::default()
    }

    /// Amount a request would remove without applying it
    pub fn estimate_damage(
        &self,
        obj: &ObjectState,
        store: &ArmorStore,
        input: &DamageInfoInput,
    ) -> f64 {
        if self.indestructible || obj.is_effectively_dead() {
            return 0.0;
        }
        if input.kill {
            return self.current_health;
        }
        match DamageStrategy::for_input(input) {
            DamageStrategy::Heal | DamageStrategy::KillPilot | DamageStrategy::StatusOnly => 0.0,
            DamageStrategy::KillGarrisoned => obj
                .contain
                .as_ref()
                .filter(|c| c.kind == ContainKind::Garrison && !c.immune_to_kill_garrisoned)
                .map_or(0.0, |c| input.amount.max(0.0).floor().min(c.passengers.len() as f64)),
            DamageStrategy::Subdual => {
                if self.can_take_subdual(obj, input) {
                    self.armor_adjusted(obj, store, input)
                } else {
                    0.0
                }
            }
            DamageStrategy::Chrono => self.armor_adjusted(obj, store, input),
            DamageStrategy::Generic => {
                let amount = self.armor_adjusted(obj, store, input);
                if input.damage_type.is_unresistable() {
                    amount
                } else {
                    amount * self.damage_scalar
                }
            }
        }
    }

    fn generic_damage(
        &mut self,
        obj: &mut ObjectState,
        modules: &mut ModuleRegistry,
        ctx: &mut DamageContext<'_>,
        info: &mut DamageInfo,
        outcome: &mut DamageOutcome,
    ) {
        let amount = if info.input.kill {
            self.current_health
        } else {
            let amount = self.armor_adjusted(obj, ctx.store, &info.input);
            if info.input.damage_type.is_unresistable() {
                amount
            } else {
                amount * self.damage_scalar
            }
        };

        let prev = self.current_health;
        if amount > 0.0 {
            self.internal_change_health(-amount);
        }
        info.output.actual_damage_dealt = amount;
        info.output.actual_damage_clipped = prev - self.current_health;
        if amount <= 0.0 {
            return;
        }

        self.record_damage(&info.input, amount, ctx);
        ctx.events.push(GameEvent::Damaged {
            object: obj.id,
            source: info.input.source_id,
            damage_type: info.input.damage_type,
            dealt: amount,
            health: self.current_health,
        });
        if info.output.actual_damage_clipped > 0.0 {
            modules.on_damage(&mut ctx.module_context(obj.id), info);
        }
        self.update_damage_state(obj, modules, ctx, Some(&*info));
        self.roll_fear(obj, ctx, prev);

        if self.current_health <= 0.0 && prev > 0.0 {
            self.die(obj, outcome);
        }
    }

    /// Chance of a fear voice when health first drops through the fear ratio
    fn roll_fear(&mut self, obj: &ObjectState, ctx: &mut DamageContext<'_>, prev: f64) {
        if obj.is_kind_of(KindOf::Structure)
            || self.max_health <= 0.0
            || self.current_health <= 0.0
        {
            return;
        }
        let ratio = ctx.rules.body.low_health_fear_ratio;
        let before = prev / self.max_health;
        let after = self.current_health / self.max_health;
        let chance = ctx.rules.body.low_health_fear_chance;
        if before > ratio && after <= ratio && ctx.rng.gen::<f64>() < chance {
            ctx.events.push(GameEvent::LowHealthFear { object: obj.id });
        }
    }

    fn heal(
        &mut self,
        obj: &ObjectState,
        modules: &mut ModuleRegistry,
        ctx: &mut DamageContext<'_>,
        info: &mut DamageInfo,
    ) {
        let amount = self.armor.adjust_damage(
            ctx.store,
            DamageType::Healing,
            info.input.amount,
            &info.input.custom_damage_type,
        );
        let prev = self.current_health;
        if amount > 0.0 {
            self.internal_change_health(amount);
        }
        info.output.actual_damage_dealt = amount;
        info.output.actual_damage_clipped = self.current_health - prev;
        self.last_healing_frame = Some(ctx.frame);

        if info.output.actual_damage_clipped > 0.0 {
            ctx.events.push(GameEvent::Healed {
                object: obj.id,
                amount: info.output.actual_damage_clipped,
                health: self.current_health,
            });
            modules.on_healing(&mut ctx.module_context(obj.id), info);
        }
        self.update_damage_state(obj, modules, ctx, Some(&*info));
    }

    fn kill_pilot(
        &mut self,
        obj: &mut ObjectState,
        ctx: &mut DamageContext<'_>,
        info: &mut DamageInfo,
        outcome: &mut DamageOutcome,
    ) {
        if !obj.is_kind_of(KindOf::Vehicle) || obj.is_disabled_by(DisabledType::Unmanned) {
            info.output.no_effect = true;
            return;
        }

        let rider = obj
            .contain
            .as_ref()
            .filter(|c| c.kind == ContainKind::RiderChange)
            .map(|c| c.passengers.first().copied());
        match rider {
            Some(rider) => {
                outcome.rider_to_kill = rider;
                outcome.scuttle = true;
            }
            None => {
                obj.set_disabled_until(DisabledType::Unmanned, FOREVER);
                obj.ai = AiState::Idle;
                outcome.became_unmanned = true;
                tracing::debug!(object = %obj.id, "pilot killed");
                ctx.events.push(GameEvent::PilotKilled { object: obj.id });
            }
        }
        info.output.actual_damage_dealt = info.input.amount.max(0.0);
        self.record_damage(&info.input, info.input.amount, ctx);
    }

    fn kill_garrisoned(
        &mut self,
        obj: &ObjectState,
        ctx: &mut DamageContext<'_>,
        info: &mut DamageInfo,
        outcome: &mut DamageOutcome,
    ) {
        let Some(contain) = obj
            .contain
            .as_ref()
            .filter(|c| c.kind == ContainKind::Garrison && !c.immune_to_kill_garrisoned)
        else {
            info.output.no_effect = true;
            return;
        };
        let kills = (info.input.amount.max(0.0).floor() as usize).min(contain.passengers.len());
        if kills == 0 {
            info.output.no_effect = true;
            return;
        }
        outcome.passengers_to_kill = contain.passengers[..kills].to_vec();
        info.output.actual_damage_dealt = kills as f64;
        self.record_damage(&info.input, kills as f64, ctx);
    }

    fn status_damage(
        &mut self,
        obj: &mut ObjectState,
        ctx: &mut DamageContext<'_>,
        info: &mut DamageInfo,
    ) {
        let Some(status) = info.input.status_type else {
            info.output.no_effect = true;
            return;
        };
        let frames = msecs_to_frames(info.input.amount).ceil();
        if frames <= 0.0 {
            info.output.no_effect = true;
            return;
        }
        let until = ctx.frame.saturating_add(frames as u32);
        obj.set_status_until(status, until);
        ctx.events.push(GameEvent::StatusApplied {
            object: obj.id,
            status,
            until,
        });
        info.output.actual_damage_dealt = info.input.amount;
        self.record_damage(&info.input, info.input.amount, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::ActiveBodyData;
    use super::*;
    use crate::armor::{ArmorSetEntry, ArmorTemplate};
    use crate::object::Contain;
    use crate::types::{BodyDamageType, FlagSet, ObjectId, ObjectStatus};
    use std::sync::Arc;

    fn armored(fx: &mut Fixture, max: f64, explosion: f64) -> ActiveBody {
        let mut template = ArmorTemplate::new();
        template.set_coefficient(DamageType::Explosion, explosion);
        fx.store.register_template("Plate", template);
        let mut data = ActiveBodyData::new(max);
        data.armor_sets = vec![ArmorSetEntry {
            conditions: FlagSet::new(),
            armor: Some("Plate".to_string()),
        }];
        ActiveBody::new(Arc::new(data))
    }

    #[test]
    fn test_end_to_end_armor_scaling() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        let mut modules = ModuleRegistry::new();
        let mut body = armored(&mut fx, 500.0, 0.5);

        let mut info = DamageInfo::new(DamageType::Explosion, 200.0);
        let outcome = body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);

        assert!((info.output.actual_damage_dealt - 100.0).abs() < f64::EPSILON);
        assert!((info.output.actual_damage_clipped - 100.0).abs() < f64::EPSILON);
        assert!((body.health() - 400.0).abs() < f64::EPSILON);
        assert_eq!(body.damage_state(), BodyDamageType::Pristine);
        assert!(!outcome.died);
    }

    #[test]
    fn test_rejections_leave_output_zero() {
        let mut fx = Fixture::new();
        fx.rules.body.no_damage_custom_status = Some("Phased".to_string());
        let mut modules = ModuleRegistry::new();

        let mut body = body(100.0);
        body.set_indestructible(true);
        let mut obj = object(&[KindOf::Vehicle]);
        let mut info = DamageInfo::new(DamageType::Explosion, 50.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(info.output.no_effect);
        assert!((body.health() - 100.0).abs() < f64::EPSILON);
        body.set_indestructible(false);

        let mut info = DamageInfo::new(DamageType::Explosion, 50.0);
        info.input.source_custom_status.insert("Phased".to_string());
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(info.output.no_effect);

        obj.position.height = 100.0;
        let mut info =
            DamageInfo::new(DamageType::Explosion, 50.0).with_height_window(None, Some(10.0));
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(info.output.no_effect);
        assert!((info.output.actual_damage_dealt).abs() < f64::EPSILON);

        obj.effectively_dead = true;
        let mut info = DamageInfo::new(DamageType::Explosion, 50.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(info.output.no_effect);
        assert!((body.health() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_kill_request_takes_exact_health() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Infantry]);
        let mut modules = ModuleRegistry::new();
        let mut body = armored(&mut fx, 80.0, 0.0);

        let mut info = DamageInfo::kill(Some(ObjectId(2)));
        let outcome = body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(outcome.died);
        assert!((info.output.actual_damage_dealt - 80.0).abs() < f64::EPSILON);
        assert_eq!(body.damage_state(), BodyDamageType::Rubble);
        assert!(obj.is_effectively_dead());
        assert_eq!(outcome.retaliate_against, Some(ObjectId(2)));
    }

    #[test]
    fn test_damage_scalar_skips_unresistable() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        let mut modules = ModuleRegistry::new();
        let mut body = body(1000.0);
        body.set_damage_scalar(0.5);

        let mut info = DamageInfo::new(DamageType::Explosion, 100.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!((info.output.actual_damage_dealt - 50.0).abs() < f64::EPSILON);

        let mut info = DamageInfo::new(DamageType::Unresistable, 100.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!((info.output.actual_damage_dealt - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weapon_and_status_bonus_scale_damage() {
        let mut fx = Fixture::new();
        let mut template = ArmorTemplate::new();
        template.set_status_coefficient(ObjectStatus::Deployed, 0.5);
        fx.store.register_template("Bunker", template);
        let mut data = ActiveBodyData::new(1000.0);
        data.armor_sets = vec![ArmorSetEntry {
            conditions: FlagSet::new(),
            armor: Some("Bunker".to_string()),
        }];
        let mut body = ActiveBody::new(Arc::new(data));
        let mut modules = ModuleRegistry::new();
        let mut obj = object(&[KindOf::Vehicle]);
        obj.weapon_armor_bonus = 0.8;
        obj.status.set(ObjectStatus::Deployed);

        let mut info = DamageInfo::new(DamageType::SmallArms, 100.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!((info.output.actual_damage_dealt - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_healing_clamps_at_max() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        let mut modules = ModuleRegistry::new();
        let mut body = body(100.0);

        let mut info = DamageInfo::new(DamageType::Explosion, 70.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert_eq!(body.damage_state(), BodyDamageType::Damaged);

        let mut info = DamageInfo::new(DamageType::Healing, 500.0);
        let outcome = body.attempt_healing(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!((body.health() - 100.0).abs() < f64::EPSILON);
        assert!((info.output.actual_damage_clipped - 70.0).abs() < f64::EPSILON);
        assert_eq!(body.damage_state(), BodyDamageType::Pristine);
        assert_eq!(outcome, DamageOutcome::default());
        assert_eq!(body.last_healing_frame(), Some(fx.frame));
    }

    #[test]
    fn test_attempt_healing_defers_other_types() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        let mut modules = ModuleRegistry::new();
        let mut body = body(100.0);

        let mut info = DamageInfo::new(DamageType::Flame, 30.0);
        body.attempt_healing(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!((body.health() - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_status_damage_sets_timed_status() {
        let mut fx = Fixture::new();
        fx.frame = 100;
        let mut obj = object(&[KindOf::Infantry]);
        let mut modules = ModuleRegistry::new();
        let mut body = body(100.0);

        let mut info =
            DamageInfo::new(DamageType::Status, 1000.0).with_status(ObjectStatus::FaerieFire);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(obj.status.test(ObjectStatus::FaerieFire));
        assert_eq!(obj.status_until.get(&ObjectStatus::FaerieFire), Some(&130));
        assert!((body.health() - 100.0).abs() < f64::EPSILON);

        let mut info = DamageInfo::new(DamageType::Status, 1000.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(info.output.no_effect);
    }

    #[test]
    fn test_kill_pilot_unmans_vehicle() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        let mut modules = ModuleRegistry::new();
        let mut body = body(300.0);

        let mut info = DamageInfo::new(DamageType::KillPilot, 100.0);
        let outcome = body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(outcome.became_unmanned);
        assert!(obj.is_disabled_by(DisabledType::Unmanned));
        assert!((body.health() - 300.0).abs() < f64::EPSILON);

        // already unmanned
        let mut info = DamageInfo::new(DamageType::KillPilot, 100.0);
        let outcome = body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(info.output.no_effect);
        assert!(!outcome.became_unmanned);

        // infantry have no pilot
        let mut soldier = object(&[KindOf::Infantry]);
        let mut info = DamageInfo::new(DamageType::KillPilot, 100.0);
        body.attempt_damage(&mut soldier, &mut modules, &mut fx.ctx(), &mut info);
        assert!(info.output.no_effect);
    }

    #[test]
    fn test_kill_pilot_on_rider_change_kills_rider() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        obj.contain = Some(Contain {
            kind: ContainKind::RiderChange,
            max_passengers: 1,
            immune_to_kill_garrisoned: false,
            passengers: vec![ObjectId(9)],
        });
        let mut modules = ModuleRegistry::new();
        let mut body = body(100.0);

        let mut info = DamageInfo::new(DamageType::KillPilot, 1.0);
        let outcome = body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert_eq!(outcome.rider_to_kill, Some(ObjectId(9)));
        assert!(outcome.scuttle);
        assert!(!outcome.became_unmanned);
    }

    #[test]
    fn test_kill_garrisoned_limits_to_amount() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Structure]);
        obj.contain = Some(Contain {
            kind: ContainKind::Garrison,
            max_passengers: 10,
            immune_to_kill_garrisoned: false,
            passengers: vec![ObjectId(2), ObjectId(3), ObjectId(4)],
        });
        let mut modules = ModuleRegistry::new();
        let mut body = body(1000.0);

        let mut info = DamageInfo::new(DamageType::KillGarrisoned, 2.0);
        let estimate = body.estimate_damage(&obj, &fx.store, &info.input);
        assert!((estimate - 2.0).abs() < f64::EPSILON);
        let outcome = body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert_eq!(outcome.passengers_to_kill, vec![ObjectId(2), ObjectId(3)]);
        assert!((body.health() - 1000.0).abs() < f64::EPSILON);

        if let Some(contain) = obj.contain.as_mut() {
            contain.immune_to_kill_garrisoned = true;
        }
        let mut info = DamageInfo::new(DamageType::KillGarrisoned, 2.0);
        let outcome = body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(outcome.passengers_to_kill.is_empty());
        assert!(info.output.no_effect);
    }

    #[test]
    fn test_chrono_disabled_rejects_normal_damage() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Vehicle]);
        let mut modules = ModuleRegistry::new();
        let mut body = body(100.0);

        let mut info = DamageInfo::new(DamageType::ChronoGun, 60.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        let mut info = DamageInfo::new(DamageType::Explosion, 60.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert!(info.output.no_effect);
        assert!((body.health() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fear_roll_on_crossing() {
        let mut fx = Fixture::new();
        fx.rules.body.low_health_fear_chance = 1.0;
        let mut obj = object(&[KindOf::Infantry]);
        let mut modules = ModuleRegistry::new();
        let mut body = body(100.0);

        let mut info = DamageInfo::new(DamageType::SmallArms, 70.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        let mut info = DamageInfo::new(DamageType::SmallArms, 10.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        // only the crossing from 30 to 20 rolls
        let mut info = DamageInfo::new(DamageType::SmallArms, 5.0);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        let fears = fx
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::LowHealthFear { .. }))
            .count();
        assert_eq!(fears, 1);
    }

    #[test]
    fn test_attribution_keeps_vehicle_killer() {
        let mut fx = Fixture::new();
        let mut obj = object(&[KindOf::Infantry]);
        let mut modules = ModuleRegistry::new();
        let mut body = body(100.0);

        let mut info = DamageInfo::new(DamageType::Explosion, 10.0).from_source(ObjectId(20), None);
        info.input.source_kinds = FlagSet::of(&[KindOf::Vehicle]);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);

        let mut info = DamageInfo::new(DamageType::Flame, 10.0).from_source(ObjectId(21), None);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert_eq!(body.last_damage().and_then(|s| s.source_id), Some(ObjectId(20)));

        fx.frame += 5;
        let mut info = DamageInfo::new(DamageType::Flame, 10.0).from_source(ObjectId(21), None);
        body.attempt_damage(&mut obj, &mut modules, &mut fx.ctx(), &mut info);
        assert_eq!(body.last_damage().and_then(|s| s.source_id), Some(ObjectId(21)));
    }

    #[test]
    fn test_estimate_does_not_mutate() {
        let mut fx = Fixture::new();
        let obj = object(&[KindOf::Vehicle]);
        let mut body = armored(&mut fx, 500.0, 0.5);
        body.validate_armor(&fx.store, &FlagSet::new());

        let info = DamageInfo::new(DamageType::Explosion, 200.0);
        let estimate = body.estimate_damage(&obj, &fx.store, &info.input);
        assert!((estimate - 100.0).abs() < f64::EPSILON);
        assert!((body.health() - 500.0).abs() < f64::EPSILON);

        let info = DamageInfo::new(DamageType::SubdualVehicle, 200.0);
        assert!(body.estimate_damage(&obj, &fx.store, &info.input).abs() < f64::EPSILON);
    }
}
