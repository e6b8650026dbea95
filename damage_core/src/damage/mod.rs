//! Damage system - DamageInfo value objects and strategy dispatch

mod info;
mod strategy;

pub use info::{AttackerClass, DamageInfo, DamageInfoInput, DamageInfoOutput};
pub use strategy::DamageStrategy;
