//! Game events - Side effects reported to the outside world
//!
//! Rendering, audio and particle effects are not simulated; the core records
//! what it would have triggered and callers drain the log once per frame.

use crate::types::{
    BodyDamageType, DamageType, DeathType, Frame, ObjectId, ObjectStatus, PlayerIndex,
    VeterancyLevel,
};
use serde::{Deserialize, Serialize};

/// Handle of an attached particle system
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleSystemId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Damaged {
        object: ObjectId,
        source: Option<ObjectId>,
        damage_type: DamageType,
        dealt: f64,
        health: f64,
    },
    Healed {
        object: ObjectId,
        amount: f64,
        health: f64,
    },
    DamageStateChanged {
        object: ObjectId,
        from: BodyDamageType,
        to: BodyDamageType,
    },
    /// Entry sound of the damaged / really damaged states
    DamageStateSound {
        object: ObjectId,
        state: BodyDamageType,
    },
    StructureRubble {
        object: ObjectId,
    },
    ParticleSystemCreated {
        id: ParticleSystemId,
        object: ObjectId,
        name: String,
    },
    ParticleSystemDestroyed {
        id: ParticleSystemId,
    },
    LowHealthFear {
        object: ObjectId,
    },
    SubdualChanged {
        object: ObjectId,
        custom_type: Option<String>,
        subdued: bool,
    },
    PassengersIdled {
        object: ObjectId,
    },
    ProjectileJammed {
        object: ObjectId,
    },
    ProjectileDrawn {
        object: ObjectId,
    },
    ChronoDisabled {
        object: ObjectId,
        disabled: bool,
    },
    StatusApplied {
        object: ObjectId,
        status: ObjectStatus,
        until: Frame,
    },
    PilotKilled {
        object: ObjectId,
    },
    RiderKilled {
        object: ObjectId,
        rider: ObjectId,
    },
    PassengerKilled {
        container: ObjectId,
        passenger: ObjectId,
    },
    ObjectDestroyed {
        object: ObjectId,
        death_type: DeathType,
        killer: Option<ObjectId>,
    },
    ExperienceGained {
        object: ObjectId,
        amount: u32,
    },
    VeterancyChanged {
        object: ObjectId,
        level: VeterancyLevel,
    },
    RetaliationOrdered {
        retaliator: ObjectId,
        target: ObjectId,
    },
    UpgradeApplied {
        object: ObjectId,
        module: String,
    },
    Fx {
        object: ObjectId,
        name: String,
    },
    BrownoutChanged {
        player: PlayerIndex,
        brownout: bool,
    },
}

impl GameEvent {
    /// One-line description for logs and the sandbox UI
    pub fn describe(&self) -> String {
        match self {
            GameEvent::Damaged { object, source, damage_type, dealt, health } => match source {
                Some(source) => format!(
                    "{} took {:.1} {} damage from {} ({:.1} left)",
                    object,
                    dealt,
                    damage_type.name(),
                    source,
                    health
                ),
                None => format!(
                    "{} took {:.1} {} damage ({:.1} left)",
                    object,
                    dealt,
                    damage_type.name(),
                    health
                ),
            },
            GameEvent::Healed { object, amount, health } => {
                format!("{} healed {:.1} ({:.1})", object, amount, health)
            }
            GameEvent::DamageStateChanged { object, from, to } => {
                format!("{} {} -> {}", object, from.name(), to.name())
            }
            GameEvent::DamageStateSound { object, state } => {
                format!("{} sound: {}", object, state.name())
            }
            GameEvent::StructureRubble { object } => format!("{} collapsed to rubble", object),
            GameEvent::ParticleSystemCreated { id, object, name } => {
                format!("{} particle system {} ({})", object, name, id.0)
            }
            GameEvent::ParticleSystemDestroyed { id } => {
                format!("particle system {} released", id.0)
            }
            GameEvent::LowHealthFear { object } => format!("{} is afraid", object),
            GameEvent::SubdualChanged { object, custom_type, subdued } => {
                let pool = custom_type.as_deref().unwrap_or("subdual");
                if *subdued {
                    format!("{} subdued ({})", object, pool)
                } else {
                    format!("{} recovered ({})", object, pool)
                }
            }
            GameEvent::PassengersIdled { object } => format!("{} passengers idled", object),
            GameEvent::ProjectileJammed { object } => format!("{} jammed", object),
            GameEvent::ProjectileDrawn { object } => format!("{} drawn off course", object),
            GameEvent::ChronoDisabled { object, disabled } => {
                if *disabled {
                    format!("{} frozen in time", object)
                } else {
                    format!("{} back in time", object)
                }
            }
            GameEvent::StatusApplied { object, status, until } => {
                format!("{} {:?} until frame {}", object, status, until)
            }
            GameEvent::PilotKilled { object } => format!("{} pilot killed", object),
            GameEvent::RiderKilled { object, rider } => format!("{} lost rider {}", object, rider),
            GameEvent::PassengerKilled { container, passenger } => {
                format!("{} passenger {} killed", container, passenger)
            }
            GameEvent::ObjectDestroyed { object, death_type, killer } => match killer {
                Some(killer) => format!("{} destroyed ({:?}) by {}", object, death_type, killer),
                None => format!("{} destroyed ({:?})", object, death_type),
            },
            GameEvent::ExperienceGained { object, amount } => format!("{} +{} xp", object, amount),
            GameEvent::VeterancyChanged { object, level } => {
                format!("{} is now {:?}", object, level)
            }
            GameEvent::RetaliationOrdered { retaliator, target } => {
                format!("{} retaliates against {}", retaliator, target)
            }
            GameEvent::UpgradeApplied { object, module } => {
                format!("{} upgraded: {}", object, module)
            }
            GameEvent::Fx { object, name } => format!("{} fx {}", object, name),
            GameEvent::BrownoutChanged { player, brownout } => {
                if *brownout {
                    format!("player {} browned out", player.0)
                } else {
                    format!("player {} power restored", player.0)
                }
            }
        }
    }
}

/// Append-only event log drained by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Hands out particle system ids and tracks which are alive
#[derive(Debug, Clone, Default)]
pub struct ParticleSystems {
    next_id: u32,
    live: std::collections::BTreeSet<ParticleSystemId>,
}

impl ParticleSystems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        object: ObjectId,
        name: &str,
        events: &mut EventLog,
    ) -> ParticleSystemId {
        let id = ParticleSystemId(self.next_id);
        self.next_id += 1;
        self.live.insert(id);
        events.push(GameEvent::ParticleSystemCreated {
            id,
            object,
            name: name.to_string(),
        });
        id
    }

    /// Release a system; unknown ids are ignored
    pub fn destroy(&mut self, id: ParticleSystemId, events: &mut EventLog) {
        if self.live.remove(&id) {
            events.push(GameEvent::ParticleSystemDestroyed { id });
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
