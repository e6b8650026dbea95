//! Integration test: Load data directory -> Spawn sandbox -> Fire, sabotage, upgrade
//!
//! Validates that the data files on disk load the same way the embedded copy
//! does and that a short sandbox session behaves as the UI shows it.

use damage_core::{
    default_game_data, BodyDamageType, DamageInfo, DamageType, GameData, GameEvent, ObjectId,
    PlayerIndex, Position, World,
};
use std::path::Path;

/// Helper to print a separator
fn separator(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("  {}", title);
    println!("{}\n", "=".repeat(60));
}

/// Helper to print an object's body
fn print_object(world: &World, id: ObjectId) {
    let Some(object) = world.object(id) else {
        println!("  {} gone", id);
        return;
    };
    let status = object.body.status();
    println!(
        "  {} {}: {:.0}/{:.0} {} subdual {:.0} chrono {:.0}",
        object.template.name,
        id,
        status.current_health,
        status.max_health,
        status.damage_state.name(),
        status.subdual_damage,
        status.chrono_damage
    );
}

fn print_events(world: &mut World) {
    for event in world.drain_events() {
        println!("    {}", event.describe());
    }
}

fn brownout_edges(world: &mut World) -> Vec<bool> {
    let edges: Vec<bool> = world
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::BrownoutChanged { brownout, .. } => Some(brownout),
            _ => None,
        })
        .collect();
    println!("  brownout edges: {:?}", edges);
    edges
}

fn data_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../damage_core/config"))
}

#[test]
fn test_data_dir_matches_embedded() {
    separator("Loading data directory");
    let loaded = GameData::load_dir(data_dir()).expect("data directory loads");
    let embedded = default_game_data().expect("embedded data loads");

    let loaded_names: Vec<&String> = loaded.templates.keys().collect();
    let embedded_names: Vec<&String> = embedded.templates.keys().collect();
    println!("  templates: {:?}", loaded_names);
    assert_eq!(loaded_names, embedded_names);
    assert_eq!(loaded.upgrades.len(), embedded.upgrades.len());
    assert!(loaded.armor.find_template("CompositeTankArmor").is_some());
}

#[test]
fn test_sandbox_session() {
    let data = GameData::load_dir(data_dir()).expect("data directory loads");
    let mut world = World::new(data, 5);
    let usa = world.add_player("USA");
    let gla = world.add_player("GLA");
    let spawn = |world: &mut World, template: &str, owner: PlayerIndex, x: f64| {
        world.create_object(template, Some(owner), Position::new(x, 0.0)).unwrap()
    };

    let plant = spawn(&mut world, "PowerPlant", usa, 0.0);
    spawn(&mut world, "WarFactory", usa, 50.0);
    let tank = spawn(&mut world, "Tank", usa, 100.0);
    let enemy = spawn(&mut world, "Tank", gla, 400.0);
    let escort = spawn(&mut world, "Tank", gla, 450.0);

    separator("Opening volley");
    for _ in 0..4 {
        world.attempt_damage(
            enemy,
            DamageInfo::new(DamageType::ArmorPiercing, 100.0).from_source(tank, None),
        );
    }
    print_object(&world, enemy);
    print_events(&mut world);
    let body = &world.object(enemy).unwrap().body;
    assert!((body.health() - 100.0).abs() < f64::EPSILON);
    assert_eq!(body.damage_state(), BodyDamageType::Damaged);
    assert_eq!(
        world.object(escort).unwrap().state.ai,
        damage_core::object::AiState::Attacking(tank)
    );

    separator("Blackout");
    world.sabotage_power(usa, 60, 0, 0.0);
    assert!(!world.has_sufficient_power(usa));
    assert_eq!(brownout_edges(&mut world), vec![true]);
    world.run_frames(60);
    assert!(world.has_sufficient_power(usa));
    assert_eq!(brownout_edges(&mut world), vec![false]);

    separator("Finish");
    world.kill_object(enemy, Some(tank));
    print_object(&world, enemy);
    print_object(&world, tank);
    print_events(&mut world);
    assert_eq!(world.object(tank).unwrap().experience, 100);
    assert_eq!(world.production(usa), 100);
    assert!(world.object(plant).unwrap().is_alive());
}
