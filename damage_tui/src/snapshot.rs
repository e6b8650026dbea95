//! JSON snapshot of the sandbox world

use crate::app::AppError;
use damage_core::object::ObjectState;
use damage_core::{BodyStatus, Energy, Frame, VeterancyLevel, World};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct WorldSnapshot<'a> {
    pub frame: Frame,
    pub players: Vec<PlayerSnapshot<'a>>,
    pub objects: Vec<ObjectSnapshot<'a>>,
}

#[derive(Debug, Serialize)]
pub struct PlayerSnapshot<'a> {
    pub name: &'a str,
    pub production: i32,
    pub consumption: i32,
    pub upgrades: Vec<&'a str>,
    pub energy: &'a Energy,
}

#[derive(Debug, Serialize)]
pub struct ObjectSnapshot<'a> {
    pub template: &'a str,
    pub body: BodyStatus,
    pub experience: u32,
    pub veterancy: VeterancyLevel,
    pub upgrades: Vec<&'a str>,
    pub modules: Vec<String>,
    pub state: &'a ObjectState,
}

pub fn capture(world: &World) -> WorldSnapshot<'_> {
    let frame = world.frame();
    let upgrades = &world.data().upgrades;

    let players = world
        .players()
        .iter()
        .map(|p| PlayerSnapshot {
            name: &p.name,
            production: p.energy.get_production(frame),
            consumption: p.energy.get_consumption(),
            upgrades: upgrades.names_in(p.upgrades),
            energy: &p.energy,
        })
        .collect();

    let objects = world
        .objects()
        .map(|o| ObjectSnapshot {
            template: &o.template.name,
            body: o.body.status(),
            experience: o.experience,
            veterancy: o.veterancy,
            upgrades: upgrades.names_in(o.upgrades),
            modules: o
                .modules
                .damage_modules()
                .map(|m| m.summary())
                .chain(o.modules.upgrade_modules().map(|m| m.summary()))
                .collect(),
            state: &o.state,
        })
        .collect();

    WorldSnapshot { frame, players, objects }
}

pub fn to_json(world: &World) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(&capture(world))?)
}

pub fn write(world: &World, path: &Path) -> Result<(), AppError> {
    fs::write(path, to_json(world)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use damage_core::{DamageInfo, DamageType, Position};

    #[test]
    fn test_snapshot_contents() {
        let mut world = World::with_default_data(3).unwrap();
        let usa = world.add_player("USA");
        let tank = world.create_object("Tank", Some(usa), Position::new(0.0, 0.0)).unwrap();
        world.attempt_damage(tank, DamageInfo::new(DamageType::Explosion, 100.0));

        let json = to_json(&world).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["players"][0]["name"], "USA");
        assert_eq!(value["objects"].as_array().unwrap().len(), 1);
        let object = &value["objects"][0];
        assert_eq!(object["template"], "Tank");
        assert_eq!(object["body"]["current_health"], 450.0);
        assert_eq!(object["body"]["damage_state"], "pristine");
        assert!(object["modules"]
            .as_array()
            .unwrap()
            .iter()
            .any(|m| m.as_str().is_some_and(|s| s.starts_with("ArmorUpgrade"))));
    }
}
