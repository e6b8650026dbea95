//! ActiveBody - Health, damage state and the damage pools of one object
//!
//! The body owns health, the subdual and chrono pools, the cached armor and
//! the attached particle systems. Everything outside the body (status bits,
//! passengers, ownership) lives on [`ObjectState`] and is passed in; effects
//! that reach other objects are returned as a [`DamageOutcome`] for the world
//! to apply.

mod attribution;
mod damage;
mod pools;
mod state;

pub use attribution::{should_replace, DamageSnapshot};
pub use state::{calc_damage_state, health_for_state, DamageThresholds};

use crate::armor::{find_best_armor_set, Armor, ArmorSetEntry, ArmorStore};
use crate::behavior::{ModuleContext, ModuleRegistry};
use crate::config::{ConfigError, RulesConfig};
use crate::damage::DamageInfo;
use crate::events::{EventLog, GameEvent, ParticleSystemId, ParticleSystems};
use crate::object::ObjectState;
use crate::types::{
    ArmorSetFlag, BodyDamageType, DisabledType, FlagSet, Frame, KindOf, MaxHealthChangeType,
    ObjectId, VeterancyLevel,
};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Body configuration from the object template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveBodyData {
    pub max_health: f64,
    /// Starting health, `max_health` when absent
    #[serde(default)]
    pub initial_health: Option<f64>,

    // === Subdual ===
    /// Zero means the body cannot be subdued
    #[serde(default)]
    pub subdual_damage_cap: f64,
    /// Msec between subdual heal steps
    #[serde(default)]
    pub subdual_damage_heal_rate: u32,
    #[serde(default)]
    pub subdual_damage_heal_amount: f64,
    #[serde(default)]
    pub custom_subdual: BTreeMap<String, CustomSubdualData>,

    // === Chrono ===
    /// Fraction of max health the chrono pool must exceed to disable
    #[serde(default = "default_chrono_disable_ratio")]
    pub chrono_disable_ratio: f64,
    /// Msec between chrono decay steps, zero for no decay
    #[serde(default)]
    pub chrono_heal_rate: u32,
    #[serde(default)]
    pub chrono_heal_amount: f64,

    // === Armor and visuals ===
    #[serde(default)]
    pub armor_sets: Vec<ArmorSetEntry>,
    #[serde(default)]
    pub damage_particle_systems: BTreeMap<BodyDamageType, Vec<String>>,
}

fn default_chrono_disable_ratio() -> f64 {
    0.5
}

impl ActiveBodyData {
    pub fn new(max_health: f64) -> Self {
        ActiveBodyData {
            max_health,
            initial_health: None,
            subdual_damage_cap: 0.0,
            subdual_damage_heal_rate: 0,
            subdual_damage_heal_amount: 0.0,
            custom_subdual: BTreeMap::new(),
            chrono_disable_ratio: default_chrono_disable_ratio(),
            chrono_heal_rate: 0,
            chrono_heal_amount: 0.0,
            armor_sets: Vec::new(),
            damage_particle_systems: BTreeMap::new(),
        }
    }

    pub fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        if self.max_health <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "{}: max_health must be positive",
                owner
            )));
        }
        if let Some(initial) = self.initial_health {
            if initial <= 0.0 || initial > self.max_health {
                return Err(ConfigError::ValidationError(format!(
                    "{}: initial_health must be within 0..=max_health",
                    owner
                )));
            }
        }
        if self.subdual_damage_cap < 0.0 || self.custom_subdual.values().any(|c| c.cap < 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "{}: subdual caps cannot be negative",
                owner
            )));
        }
        Ok(())
    }
}

/// One named custom subdual pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomSubdualData {
    pub cap: f64,
    /// Msec between heal steps
    #[serde(default)]
    pub heal_rate: u32,
    #[serde(default)]
    pub heal_amount: f64,
    #[serde(default)]
    pub tint: Option<String>,
    #[serde(default)]
    pub disable_type: DisabledType,
    /// Projectiles are drawn toward the attractor instead of jamming
    #[serde(default)]
    pub attractor: bool,
}

/// Services a body needs while processing damage
pub struct DamageContext<'a> {
    pub store: &'a ArmorStore,
    pub rules: &'a RulesConfig,
    pub frame: Frame,
    pub rng: &'a mut ChaCha8Rng,
    pub events: &'a mut EventLog,
    pub particles: &'a mut ParticleSystems,
}

impl DamageContext<'_> {
    pub fn thresholds(&self) -> DamageThresholds {
        DamageThresholds::from(&self.rules.body)
    }

    fn module_context(&mut self, object: ObjectId) -> ModuleContext<'_> {
        ModuleContext {
            object,
            frame: self.frame,
            events: &mut *self.events,
        }
    }
}

/// Consequences of a damage event that reach beyond the body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DamageOutcome {
    /// Health crossed zero during this event
    pub died: bool,
    pub passengers_to_kill: Vec<ObjectId>,
    pub rider_to_kill: Option<ObjectId>,
    /// The container goes down with its rider
    pub scuttle: bool,
    /// Crew killed; ownership passes to nobody
    pub became_unmanned: bool,
    /// Attacker the victim's friends may retaliate against
    pub retaliate_against: Option<ObjectId>,
}

/// Serializable view of a body for display and logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyStatus {
    pub current_health: f64,
    pub max_health: f64,
    pub damage_state: BodyDamageType,
    pub subdual_damage: f64,
    pub subdual_cap: f64,
    pub chrono_damage: f64,
    pub subdued: bool,
    pub chrono_disabled: bool,
    pub indestructible: bool,
}

/// Accumulated damage that drains back down over time
#[derive(Debug, Clone, Default)]
struct DamagePool {
    damage: f64,
    heal_countdown: u32,
}

/// Damageable body of one object
#[derive(Debug, Clone)]
pub struct ActiveBody {
    data: Arc<ActiveBodyData>,

    current_health: f64,
    prev_health: f64,
    max_health: f64,
    initial_health: f64,
    cur_damage_state: BodyDamageType,

    subdual: DamagePool,
    custom_subdual: BTreeMap<String, DamagePool>,
    /// Never capped and never healed by healing damage
    chrono: DamagePool,

    indestructible: bool,
    damage_scalar: f64,
    armor: Armor,
    armor_flags: Option<FlagSet<ArmorSetFlag>>,

    last_damage: Option<DamageSnapshot>,
    last_damage_frame: Option<Frame>,
    last_healing_frame: Option<Frame>,
    particle_systems: Vec<ParticleSystemId>,
}

impl ActiveBody {
    pub fn new(data: Arc<ActiveBodyData>) -> Self {
        let max_health = data.max_health;
        let initial_health = data.initial_health.unwrap_or(max_health);
        ActiveBody {
            current_health: initial_health,
            prev_health: initial_health,
            max_health,
            initial_health,
            cur_damage_state: calc_damage_state(
                initial_health,
                max_health,
                DamageThresholds::default(),
            ),
            subdual: DamagePool::default(),
            custom_subdual: BTreeMap::new(),
            chrono: DamagePool::default(),
            indestructible: false,
            damage_scalar: 1.0,
            armor: Armor::default(),
            armor_flags: None,
            last_damage: None,
            last_damage_frame: None,
            last_healing_frame: None,
            particle_systems: Vec::new(),
            data,
        }
    }

    pub fn data(&self) -> &ActiveBodyData {
        &self.data
    }

    pub fn health(&self) -> f64 {
        self.current_health
    }

    pub fn previous_health(&self) -> f64 {
        self.prev_health
    }

    pub fn max_health(&self) -> f64 {
        self.max_health
    }

    pub fn initial_health(&self) -> f64 {
        self.initial_health
    }

    pub fn damage_state(&self) -> BodyDamageType {
        self.cur_damage_state
    }

    pub fn armor(&self) -> &Armor {
        &self.armor
    }

    pub fn last_damage(&self) -> Option<&DamageSnapshot> {
        self.last_damage.as_ref()
    }

    pub fn last_damage_frame(&self) -> Option<Frame> {
        self.last_damage_frame
    }

    pub fn last_healing_frame(&self) -> Option<Frame> {
        self.last_healing_frame
    }

    pub fn particle_systems(&self) -> &[ParticleSystemId] {
        &self.particle_systems
    }

    pub fn is_indestructible(&self) -> bool {
        self.indestructible
    }

    pub fn set_indestructible(&mut self, indestructible: bool) {
        self.indestructible = indestructible;
    }

    pub fn damage_scalar(&self) -> f64 {
        self.damage_scalar
    }

    /// Object-wide multiplier on resistible damage
    pub fn set_damage_scalar(&mut self, scalar: f64) {
        self.damage_scalar = scalar.max(0.0);
    }

    pub fn status(&self) -> BodyStatus {
        BodyStatus {
            current_health: self.current_health,
            max_health: self.max_health,
            damage_state: self.cur_damage_state,
            subdual_damage: self.subdual.damage,
            subdual_cap: self.data.subdual_damage_cap,
            chrono_damage: self.chrono.damage,
            subdued: self.is_subdued(),
            chrono_disabled: self.is_chrono_disabled(),
            indestructible: self.indestructible,
        }
    }

    /// Re-pick the armor when the object's armor set flags changed
    pub fn validate_armor(&mut self, store: &ArmorStore, flags: &FlagSet<ArmorSetFlag>) {
        if self.armor_flags.as_ref() == Some(flags) {
            return;
        }
        let template = find_best_armor_set(&self.data.armor_sets, flags)
            .and_then(|entry| entry.armor.as_deref())
            .and_then(|name| store.find_template(name));
        self.armor = Armor::new(template);
        self.armor_flags = Some(*flags);
    }

    /// Change health by `delta`, clamped to `0..=max_health`
    fn internal_change_health(&mut self, delta: f64) {
        self.prev_health = self.current_health;
        self.current_health = (self.current_health + delta).clamp(0.0, self.max_health);
    }

    /// Recompute the damage state and fire everything tied to a transition
    fn update_damage_state(
        &mut self,
        obj: &ObjectState,
        modules: &mut ModuleRegistry,
        ctx: &mut DamageContext<'_>,
        info: Option<&DamageInfo>,
    ) {
        let old = self.cur_damage_state;
        let new = calc_damage_state(self.current_health, self.max_health, ctx.thresholds());
        if old == new {
            return;
        }
        self.cur_damage_state = new;
        tracing::debug!(object = %obj.id, from = ?old, to = ?new, "damage state changed");

        ctx.events.push(GameEvent::DamageStateChanged {
            object: obj.id,
            from: old,
            to: new,
        });
        modules.on_body_damage_state_change(&mut ctx.module_context(obj.id), info, old, new);

        if new > old && matches!(new, BodyDamageType::Damaged | BodyDamageType::ReallyDamaged) {
            ctx.events.push(GameEvent::DamageStateSound {
                object: obj.id,
                state: new,
            });
        }
        if new == BodyDamageType::Rubble && obj.is_kind_of(KindOf::Structure) {
            ctx.events.push(GameEvent::StructureRubble { object: obj.id });
        }
        self.swap_particle_systems(obj.id, new, ctx);
    }

    fn swap_particle_systems(
        &mut self,
        object: ObjectId,
        state: BodyDamageType,
        ctx: &mut DamageContext<'_>,
    ) {
        for id in self.particle_systems.drain(..) {
            ctx.particles.destroy(id, ctx.events);
        }
        if let Some(names) = self.data.damage_particle_systems.get(&state) {
            for name in names {
                let id = ctx.particles.create(object, name, ctx.events);
                self.particle_systems.push(id);
            }
        }
    }

    /// Settle the starting damage state against the loaded rules
    ///
    /// `new` classifies with the default thresholds; this re-classifies and
    /// attaches the particle systems of whatever state the body starts in.
    pub fn on_create(&mut self, object: ObjectId, ctx: &mut DamageContext<'_>) {
        self.cur_damage_state =
            calc_damage_state(self.current_health, self.max_health, ctx.thresholds());
        self.swap_particle_systems(object, self.cur_damage_state, ctx);
    }

    /// Release every attached particle system
    pub fn release_particle_systems(
        &mut self,
        particles: &mut ParticleSystems,
        events: &mut EventLog,
    ) {
        for id in self.particle_systems.drain(..) {
            particles.destroy(id, events);
        }
    }

    /// Change max health and adjust current health per `change`
    pub fn set_max_health(
        &mut self,
        obj: &ObjectState,
        modules: &mut ModuleRegistry,
        ctx: &mut DamageContext<'_>,
        max_health: f64,
        change: MaxHealthChangeType,
    ) {
        let prev_max = self.max_health;
        self.max_health = max_health.max(0.0);
        self.prev_health = self.current_health;

        match change {
            MaxHealthChangeType::SameCurrentHealth => {}
            MaxHealthChangeType::PreserveRatio => {
                if prev_max > 0.0 {
                    self.current_health = self.max_health * (self.current_health / prev_max);
                }
            }
            MaxHealthChangeType::AddCurrentHealthToo => {
                self.current_health += self.max_health - prev_max;
            }
            MaxHealthChangeType::FullyHeal => {
                self.current_health = self.max_health;
            }
        }
        self.current_health = self.current_health.clamp(0.0, self.max_health);
        self.update_damage_state(obj, modules, ctx, None);
    }

    /// Force health to the level that selects `state`
    pub fn set_damage_state(
        &mut self,
        obj: &ObjectState,
        modules: &mut ModuleRegistry,
        ctx: &mut DamageContext<'_>,
        state: BodyDamageType,
    ) {
        let desired = health_for_state(state, self.max_health, ctx.thresholds());
        self.internal_change_health(desired - self.current_health);
        self.update_damage_state(obj, modules, ctx, None);
    }

    /// Set health to a percentage of initial health
    pub fn set_initial_health(
        &mut self,
        obj: &ObjectState,
        modules: &mut ModuleRegistry,
        ctx: &mut DamageContext<'_>,
        percent: f64,
    ) {
        let desired = self.initial_health * percent / 100.0;
        self.internal_change_health(desired - self.current_health);
        self.update_damage_state(obj, modules, ctx, None);
    }

    /// Rescale max health by the veterancy health bonus of the new level
    pub fn on_veterancy_level_changed(
        &mut self,
        obj: &ObjectState,
        modules: &mut ModuleRegistry,
        ctx: &mut DamageContext<'_>,
        old: VeterancyLevel,
        new: VeterancyLevel,
    ) {
        if old == new {
            return;
        }
        let bonus = &ctx.rules.body.veterancy_health_bonus;
        let (Some(old_bonus), Some(new_bonus)) = (bonus.get(old.index()), bonus.get(new.index()))
        else {
            return;
        };
        let factor = new_bonus / old_bonus;
        self.initial_health *= factor;
        let max_health = self.max_health * factor;
        self.set_max_health(obj, modules, ctx, max_health, MaxHealthChangeType::PreserveRatio);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::object::Position;
    use crate::types::ObjectId;
    use rand::SeedableRng;

    /// Owned services a test can borrow a [`DamageContext`] from
    pub struct Fixture {
        pub store: ArmorStore,
        pub rules: RulesConfig,
        pub frame: Frame,
        pub rng: ChaCha8Rng,
        pub events: EventLog,
        pub particles: ParticleSystems,
    }

    impl Fixture {
        pub fn new() -> Self {
            Fixture {
                store: ArmorStore::new(),
                rules: RulesConfig::default(),
                frame: 1,
                rng: ChaCha8Rng::seed_from_u64(7),
                events: EventLog::new(),
                particles: ParticleSystems::new(),
            }
        }

        pub fn ctx(&mut self) -> DamageContext<'_> {
            DamageContext {
                store: &self.store,
                rules: &self.rules,
                frame: self.frame,
                rng: &mut self.rng,
                events: &mut self.events,
                particles: &mut self.particles,
            }
        }
    }

    pub fn object(kinds: &[KindOf]) -> ObjectState {
        ObjectState::new(ObjectId(1), None, FlagSet::of(kinds), Position::default())
    }

    pub fn body(max_health: f64) -> ActiveBody {
        ActiveBody::new(Arc::new(ActiveBodyData::new(max_health)))
    }
}
