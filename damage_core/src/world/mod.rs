//! World - Owns every service and object of one simulation
//!
//! Bodies only change their own object. Whatever reaches further (killing
//! passengers, changing owners, ordering retaliation, awarding experience)
//! comes back as a [`DamageOutcome`] and is applied here.

mod retaliation;
mod upgrades;

pub use retaliation::retaliators;

use crate::body::{DamageContext, DamageOutcome};
use crate::config::{default_game_data, ConfigError, GameData};
use crate::damage::{DamageInfo, DamageInfoInput};
use crate::energy::GrantSource;
use crate::events::{EventLog, GameEvent, ParticleSystems};
use crate::object::{AiState, GameObject, Position};
use crate::player::Players;
use crate::types::{
    DeathType, DisabledType, Frame, KindOf, ObjectId, ObjectStatus, PlayerIndex, Relationship,
    VeterancyLevel, WeaponBonusCondition, FOREVER,
};
use crate::upgrade::UpgradeEffect;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Per-frame services handed to bodies
#[derive(Debug)]
struct Services {
    frame: Frame,
    rng: ChaCha8Rng,
    events: EventLog,
    particles: ParticleSystems,
}

impl Services {
    fn damage_context<'a>(&'a mut self, data: &'a GameData) -> DamageContext<'a> {
        DamageContext {
            store: &data.armor,
            rules: &data.rules,
            frame: self.frame,
            rng: &mut self.rng,
            events: &mut self.events,
            particles: &mut self.particles,
        }
    }
}

#[derive(Debug)]
pub struct World {
    data: GameData,
    objects: BTreeMap<ObjectId, GameObject>,
    players: Players,
    services: Services,
    next_id: u32,
}

impl World {
    pub fn new(data: GameData, seed: u64) -> Self {
        World {
            data,
            objects: BTreeMap::new(),
            players: Players::new(),
            services: Services {
                frame: 0,
                rng: ChaCha8Rng::seed_from_u64(seed),
                events: EventLog::new(),
                particles: ParticleSystems::new(),
            },
            next_id: 1,
        }
    }

    /// World over the data set shipped with the crate
    pub fn with_default_data(seed: u64) -> Result<Self, ConfigError> {
        Ok(World::new(default_game_data()?, seed))
    }

    pub fn data(&self) -> &GameData {
        &self.data
    }

    pub fn frame(&self) -> Frame {
        self.services.frame
    }

    pub fn players(&self) -> &Players {
        &self.players
    }

    pub fn add_player(&mut self, name: &str) -> PlayerIndex {
        self.players.add(name)
    }

    /// Make two players allies in both directions
    pub fn set_allied(&mut self, a: PlayerIndex, b: PlayerIndex) {
        self.players.set_relationship(a, b, Relationship::Allies);
        self.players.set_relationship(b, a, Relationship::Allies);
    }

    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    pub fn events(&self) -> &EventLog {
        &self.services.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.services.events.drain()
    }

    pub fn live_particle_systems(&self) -> usize {
        self.services.particles.live_count()
    }

    // === Object lifecycle ===

    pub fn create_object(
        &mut self,
        template: &str,
        owner: Option<PlayerIndex>,
        position: Position,
    ) -> Option<ObjectId> {
        let template = match self.data.require_template(template) {
            Ok(template) => template,
            Err(err) => {
                tracing::warn!(%err, "object not created");
                return None;
            }
        };
        if let Some(owner) = owner {
            if self.players.get(owner).is_none() {
                tracing::warn!(player = owner.0, "object for unknown player");
                return None;
            }
        }

        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let mut object = GameObject::new(id, template, owner, position);
        object
            .body
            .validate_armor(&self.data.armor, &object.state.armor_set_flags);
        let mut ctx = self.services.damage_context(&self.data);
        object.body.on_create(id, &mut ctx);

        if let Some(player) = owner.and_then(|p| self.players.get_mut(p)) {
            player
                .energy
                .object_entering_influence(object.template.energy_production);
        }

        let initial: Vec<UpgradeEffect> = object
            .modules
            .upgrade_modules_mut()
            .filter(|m| m.activation().masks().starts_active)
            .flat_map(|m| m.force_activate())
            .collect();
        self.objects.insert(id, object);
        self.apply_upgrade_effects(id, initial);
        self.update_upgrade_modules(id);

        tracing::debug!(object = %id, "object created");
        Some(id)
    }

    /// Remove an object without death handling
    pub fn destroy_object(&mut self, id: ObjectId) -> bool {
        let Some(mut object) = self.objects.remove(&id) else {
            return false;
        };
        object
            .body
            .release_particle_systems(&mut self.services.particles, &mut self.services.events);
        if object.is_alive() {
            let bonus = object
                .state
                .power_bonus_active
                .then_some(object.template.energy_bonus);
            self.release_energy(object.state.owner, object.template.energy_production, bonus);
        }
        for other in self.objects.values_mut() {
            if let Some(contain) = other.state.contain.as_mut() {
                contain.passengers.retain(|p| *p != id);
            }
        }
        true
    }

    /// Take an object's production and any active upgrade bonus off `owner`
    fn release_energy(&mut self, owner: Option<PlayerIndex>, production: i32, bonus: Option<i32>) {
        let Some(player) = owner.and_then(|p| self.players.get_mut(p)) else {
            return;
        };
        player.energy.object_leaving_influence(production);
        if let Some(bonus) = bonus {
            player.energy.remove_power_bonus(bonus);
        }
    }

    /// Put `passenger` inside `container`
    pub fn enter_container(&mut self, container: ObjectId, passenger: ObjectId) -> bool {
        let alive = self.objects.get(&passenger).is_some_and(GameObject::is_alive);
        if container == passenger || !alive {
            return false;
        }
        let contain = self
            .objects
            .get_mut(&container)
            .and_then(|o| o.state.contain.as_mut());
        let Some(contain) = contain else {
            return false;
        };
        if contain.is_full() || contain.passengers.contains(&passenger) {
            return false;
        }
        contain.passengers.push(passenger);
        if let Some(object) = self.objects.get_mut(&passenger) {
            object.state.status.set(ObjectStatus::Garrisoned);
        }
        true
    }

    // === Damage ===

    fn fill_source(&self, input: &mut DamageInfoInput) {
        let Some(source) = input.source_id.and_then(|id| self.objects.get(&id)) else {
            return;
        };
        if !input.source_kinds.any() {
            input.source_kinds = source.state.kinds;
        }
        if input.source_player.is_none() {
            input.source_player = source.state.owner;
        }
        if input.source_custom_status.is_empty() {
            input.source_custom_status = source.state.custom_status.clone();
        }
    }

    /// Damage `target`; the returned info carries the amounts dealt
    pub fn attempt_damage(&mut self, target: ObjectId, mut info: DamageInfo) -> DamageInfo {
        self.fill_source(&mut info.input);
        let Some(object) = self.objects.get_mut(&target) else {
            tracing::warn!(object = %target, "damage to unknown object");
            info.output.no_effect = true;
            return info;
        };
        let mut ctx = self.services.damage_context(&self.data);
        let outcome = object
            .body
            .attempt_damage(&mut object.state, &mut object.modules, &mut ctx, &mut info);
        self.apply_outcome(target, &info, outcome);
        info
    }

    pub fn attempt_healing(&mut self, target: ObjectId, mut info: DamageInfo) -> DamageInfo {
        self.fill_source(&mut info.input);
        let Some(object) = self.objects.get_mut(&target) else {
            tracing::warn!(object = %target, "healing for unknown object");
            info.output.no_effect = true;
            return info;
        };
        let mut ctx = self.services.damage_context(&self.data);
        let outcome = object
            .body
            .attempt_healing(&mut object.state, &mut object.modules, &mut ctx, &mut info);
        self.apply_outcome(target, &info, outcome);
        info
    }

    /// What a request would remove from `target` right now
    pub fn estimate_damage(&mut self, target: ObjectId, info: &DamageInfo) -> f64 {
        let mut input = info.input.clone();
        self.fill_source(&mut input);
        let Some(object) = self.objects.get_mut(&target) else {
            return 0.0;
        };
        object
            .body
            .validate_armor(&self.data.armor, &object.state.armor_set_flags);
        object.body.estimate_damage(&object.state, &self.data.armor, &input)
    }

    pub fn kill_object(&mut self, id: ObjectId, killer: Option<ObjectId>) -> DamageInfo {
        self.attempt_damage(id, DamageInfo::kill(killer))
    }

    fn apply_outcome(&mut self, target: ObjectId, info: &DamageInfo, outcome: DamageOutcome) {
        let source = info.input.source_id;

        for passenger in &outcome.passengers_to_kill {
            let contain = self
                .objects
                .get_mut(&target)
                .and_then(|o| o.state.contain.as_mut());
            if let Some(contain) = contain {
                contain.passengers.retain(|p| p != passenger);
            }
            self.services.events.push(GameEvent::PassengerKilled {
                container: target,
                passenger: *passenger,
            });
            self.kill_object(*passenger, source);
        }

        if let Some(rider) = outcome.rider_to_kill {
            self.services.events.push(GameEvent::RiderKilled { object: target, rider });
            self.kill_object(rider, source);
        }
        if outcome.scuttle {
            self.kill_object(target, source);
        }

        if outcome.became_unmanned {
            if let Some(object) = self.objects.get_mut(&target) {
                let owner = object.state.owner.take();
                let production = object.template.energy_production;
                let bonus = std::mem::take(&mut object.state.power_bonus_active)
                    .then_some(object.template.energy_bonus);
                self.release_energy(owner, production, bonus);
            }
        }

        if let Some(attacker) = outcome.retaliate_against {
            self.order_retaliation(target, attacker);
        }

        if outcome.died {
            self.handle_death(target);
        }
    }

    fn order_retaliation(&mut self, victim: ObjectId, attacker: ObjectId) {
        let rules = &self.data.rules.retaliation;
        if !rules.enabled {
            return;
        }
        for id in retaliators(&self.objects, &self.players, victim, attacker, rules.radius) {
            if let Some(object) = self.objects.get_mut(&id) {
                object.state.ai = AiState::Attacking(attacker);
                self.services.events.push(GameEvent::RetaliationOrdered {
                    retaliator: id,
                    target: attacker,
                });
            }
        }
    }

    fn handle_death(&mut self, id: ObjectId) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        object.state.status.set(ObjectStatus::Destroyed);
        object.state.ai = AiState::Idle;
        object
            .body
            .release_particle_systems(&mut self.services.particles, &mut self.services.events);

        let (death_type, killer) = object
            .body
            .last_damage()
            .map_or((DeathType::Normal, None), |s| (s.death_type, s.source_id));
        let victim_owner = object.state.owner;
        let experience = object.template.experience_value;
        let production = object.template.energy_production;
        let bonus = object
            .state
            .power_bonus_active
            .then_some(object.template.energy_bonus);
        self.release_energy(victim_owner, production, bonus);

        tracing::debug!(object = %id, ?death_type, "object destroyed");
        self.services.events.push(GameEvent::ObjectDestroyed {
            object: id,
            death_type,
            killer,
        });

        if let Some(killer) = killer.filter(|k| *k != id) {
            let killer_owner = self.objects.get(&killer).and_then(|k| k.state.owner);
            if self.players.relationship(killer_owner, victim_owner) == Relationship::Enemies {
                self.award_experience(killer, experience);
            }
        }
    }

    fn award_experience(&mut self, id: ObjectId, amount: u32) {
        if amount == 0 {
            return;
        }
        let Some(object) = self.objects.get_mut(&id).filter(|o| o.is_alive()) else {
            return;
        };
        object.experience += amount;
        let level = object.template.level_for_experience(object.experience);
        self.services
            .events
            .push(GameEvent::ExperienceGained { object: id, amount });
        if level > object.veterancy {
            self.set_veterancy(id, level);
        }
    }

    /// Change veterancy, with the armor, weapon bonus and health that go with it
    pub fn set_veterancy(&mut self, id: ObjectId, level: VeterancyLevel) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        let old = object.veterancy;
        if old == level {
            return;
        }
        object.veterancy = level;

        let state = &mut object.state;
        for candidate in VeterancyLevel::ALL {
            if let Some(flag) = candidate.armor_set_flag() {
                state.armor_set_flags.clear(flag);
            }
            if let Some(condition) = veterancy_bonus(*candidate) {
                state.weapon_bonus.clear(condition);
            }
        }
        if let Some(flag) = level.armor_set_flag() {
            state.armor_set_flags.set(flag);
        }
        if let Some(condition) = veterancy_bonus(level) {
            state.weapon_bonus.set(condition);
        }

        let mut ctx = self.services.damage_context(&self.data);
        object
            .body
            .on_veterancy_level_changed(&object.state, &mut object.modules, &mut ctx, old, level);
        self.services
            .events
            .push(GameEvent::VeterancyChanged { object: id, level });
    }

    // === Time ===

    /// Advance one logic frame
    ///
    /// Objects destroyed during the previous frame are removed first, so a
    /// caller can still inspect a kill until the clock moves on.
    pub fn step(&mut self) {
        self.prune_dead();
        self.services.frame += 1;
        let frame = self.services.frame;
        for object in self.objects.values_mut() {
            object.state.expire(frame);
            let mut ctx = self.services.damage_context(&self.data);
            object.body.update(&mut object.state, &mut ctx);
        }
        self.refresh_energy();
    }

    fn prune_dead(&mut self) {
        let dead: Vec<ObjectId> = self
            .objects
            .values()
            .filter(|o| !o.is_alive())
            .map(GameObject::id)
            .collect();
        for id in dead {
            tracing::trace!(object = %id, "dead object removed");
            self.destroy_object(id);
        }
    }

    pub fn run_frames(&mut self, frames: u32) {
        for _ in 0..frames {
            self.step();
        }
    }

    fn refresh_energy(&mut self) {
        let frame = self.services.frame;
        for edge in self.players.refresh_energy(frame) {
            self.services.events.push(GameEvent::BrownoutChanged {
                player: edge.player,
                brownout: edge.brownout,
            });
            for object in self.objects.values_mut() {
                if object.state.owner != Some(edge.player)
                    || !object.state.is_kind_of(KindOf::Powered)
                {
                    continue;
                }
                if edge.brownout {
                    object.state.set_disabled_until(DisabledType::Underpowered, FOREVER);
                } else {
                    object.state.clear_disabled(DisabledType::Underpowered);
                }
            }
        }
    }

    // === Energy ===

    pub fn production(&mut self, player: PlayerIndex) -> i32 {
        self.refresh_energy();
        let frame = self.services.frame;
        self.players
            .get(player)
            .map_or(0, |p| p.energy.get_production(frame))
    }

    pub fn consumption(&self, player: PlayerIndex) -> i32 {
        self.players.get(player).map_or(0, |p| p.energy.get_consumption())
    }

    pub fn has_sufficient_power(&mut self, player: PlayerIndex) -> bool {
        self.refresh_energy();
        let frame = self.services.frame;
        self.players
            .get(player)
            .is_some_and(|p| p.energy.has_sufficient_power(frame))
    }

    /// Cut a player's power for `frames`; no amount and no percent is a blackout
    pub fn sabotage_power(
        &mut self,
        player: PlayerIndex,
        frames: Frame,
        amount: i32,
        percent: f64,
    ) {
        let frame = self.services.frame;
        let Some(entry) = self.players.get_mut(player) else {
            tracing::warn!(player = player.0, "sabotage of unknown player");
            return;
        };
        entry
            .energy
            .set_power_sabotaged_till_frame(frame, frame.saturating_add(frames), amount, percent);
        self.refresh_energy();
    }

    /// Move `amount` of `victim`'s power to `thief` for `frames`
    ///
    /// Returns the most the grant can deliver, fixed at the victim's current
    /// transferable power.
    pub fn steal_power(
        &mut self,
        thief: PlayerIndex,
        victim: PlayerIndex,
        source: GrantSource,
        amount: i32,
        frames: Frame,
    ) -> i32 {
        if thief == victim || self.players.get(thief).is_none() {
            return 0;
        }
        let frame = self.services.frame;
        let Some(entry) = self.players.get_mut(victim) else {
            tracing::warn!(player = victim.0, "theft from unknown player");
            return 0;
        };
        let cap = entry
            .energy
            .give_energy_to(thief, source, amount, frame.saturating_add(frames), frame);
        self.refresh_energy();
        cap
    }
}

fn veterancy_bonus(level: VeterancyLevel) -> Option<WeaponBonusCondition> {
    match level {
        VeterancyLevel::Regular => None,
        VeterancyLevel::Veteran => Some(WeaponBonusCondition::Veteran),
        VeterancyLevel::Elite => Some(WeaponBonusCondition::Elite),
        VeterancyLevel::Heroic => Some(WeaponBonusCondition::Hero),
    }
}
