//! damage_core - Armor, damage and energy accounting for simulated game objects
//!
//! This library provides:
//! - ArmorTemplate / ArmorStore: Damage coefficients and the custom damage type graph
//! - ActiveBody: Health, damage states, subdual and chrono pools
//! - Energy: Per-player power with sabotage and theft ledgers
//! - Upgrades: Once-only upgrade activation and upgrade modules
//! - World: Owns templates, objects and players and applies damage outcomes

pub mod armor;
pub mod behavior;
pub mod body;
pub mod config;
pub mod damage;
pub mod energy;
pub mod events;
pub mod object;
pub mod player;
pub mod types;
pub mod upgrade;
pub mod world;

// Re-export core types for convenience
pub use armor::{Armor, ArmorSetEntry, ArmorStore, ArmorTemplate};
pub use behavior::{Capability, DamageHistory, DamageModule, ModuleRegistry, TransitionFx};
pub use body::{ActiveBody, ActiveBodyData, BodyStatus, DamageOutcome};
pub use config::{default_game_data, ConfigError, GameData, RulesConfig};
pub use damage::{DamageInfo, DamageInfoInput, DamageInfoOutput, DamageStrategy};
pub use energy::{Energy, GrantSource, DEFAULT_STOLEN_CONSTANT};
pub use events::{EventLog, GameEvent};
pub use object::{GameObject, ObjectTemplate, Position};
pub use player::{Player, Players};
pub use types::{
    ArmorSetFlag, BodyDamageType, DamageType, DeathType, DisabledType, Frame, KindOf, ObjectId,
    ObjectStatus, PlayerIndex, VeterancyLevel,
};
pub use upgrade::{UpgradeCenter, UpgradeEffect, UpgradeMask, UpgradeModule};
pub use world::World;
