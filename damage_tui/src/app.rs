//! Application state

use crate::simulation::KillSimulation;
use crate::snapshot;
use damage_core::types::Relationship;
use damage_core::upgrade::UpgradeKind;
use damage_core::{
    ConfigError, DamageInfo, DamageType, GameData, GameObject, GrantSource, KindOf, ObjectId,
    ObjectStatus, PlayerIndex, Position, World, DEFAULT_STOLEN_CONSTANT,
};
use std::io;
use std::path::Path;
use thiserror::Error;

const SNAPSHOT_FILE: &str = "damage_tui_snapshot.json";
const MAX_LOG_LINES: usize = 500;
/// Logic frames advanced per UI tick while running
const FRAMES_PER_TICK: u32 = 3;
const SABOTAGE_FRAMES: u32 = 300;
const THEFT_FRAMES: u32 = 600;
/// Status damage amounts are durations in msec
const STATUS_DAMAGE: ObjectStatus = ObjectStatus::FaerieFire;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Snapshot error: {0}")]
    SnapshotError(#[from] serde_json::Error),
}

/// Starting layout: (player slot, template, x, y)
const LINEUP: &[(usize, &str, f64, f64)] = &[
    (0, "PowerPlant", 0.0, 0.0),
    (0, "WarFactory", 60.0, 0.0),
    (0, "Tank", 120.0, 40.0),
    (0, "Ranger", 140.0, 60.0),
    (0, "Helicopter", 130.0, 80.0),
    (1, "PowerPlant", 600.0, 0.0),
    (1, "Bunker", 520.0, 30.0),
    (1, "Tank", 480.0, 50.0),
    (1, "Tank", 500.0, 90.0),
    (1, "CombatBike", 460.0, 70.0),
    (1, "ScoutDrone", 470.0, 20.0),
    (1, "Missile", 300.0, 40.0),
];

/// Fail start-up when the loaded data lacks a template the sandbox spawns
pub fn check_lineup(data: &GameData) -> Result<(), ConfigError> {
    for (_, template, _, _) in LINEUP {
        data.require_template(template)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Units,
    Combat,
    Power,
    Upgrades,
    Help,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Units, Tab::Combat, Tab::Power, Tab::Upgrades, Tab::Help]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tab::Units => "Units",
            Tab::Combat => "Combat",
            Tab::Power => "Power",
            Tab::Upgrades => "Upgrades",
            Tab::Help => "Help",
        }
    }
}

/// Cached estimate for the selected target and damage request
#[derive(Debug, Clone)]
pub struct Preview {
    pub estimate: f64,
    pub simulation: Option<KillSimulation>,
}

pub struct App {
    pub current_tab: Tab,
    pub world: World,
    pub players: [PlayerIndex; 2],
    pub selected_object: usize,
    pub selected_damage: usize,
    pub amount: f64,
    pub selected_player: usize,
    pub selected_upgrade: usize,
    pub log: Vec<String>,
    pub log_scroll: usize,
    pub paused: bool,
    pub show_help: bool,
    pub preview: Option<Preview>,
    data: GameData,
    seed: u64,
}

impl App {
    pub fn new(data: GameData, seed: u64) -> Self {
        let (world, players) = Self::populate(&data, seed);
        let mut app = App {
            current_tab: Tab::Units,
            world,
            players,
            selected_object: 0,
            selected_damage: 0,
            amount: 100.0,
            selected_player: 1,
            selected_upgrade: 0,
            log: vec![format!("Sandbox ready (seed {})", seed)],
            log_scroll: 0,
            paused: true,
            show_help: false,
            preview: None,
            data,
            seed,
        };
        app.drain_events();
        app.refresh_preview();
        app
    }

    fn populate(data: &GameData, seed: u64) -> (World, [PlayerIndex; 2]) {
        let mut world = World::new(data.clone(), seed);
        let players = [world.add_player("USA"), world.add_player("GLA")];

        let mut spawned = Vec::new();
        for (slot, template, x, y) in LINEUP {
            let position = Position::new(*x, *y);
            if let Some(id) = world.create_object(template, Some(players[*slot]), position) {
                spawned.push((*template, id));
            }
        }

        // Crew the bunker and the bike from the second player's infantry
        let find = |name: &str| spawned.iter().find(|(t, _)| *t == name).map(|(_, id)| *id);
        if let Some(bunker) = find("Bunker") {
            for _ in 0..2 {
                let position = Position::new(520.0, 30.0);
                if let Some(ranger) = world.create_object("Ranger", Some(players[1]), position) {
                    world.enter_container(bunker, ranger);
                }
            }
        }
        if let Some(bike) = find("CombatBike") {
            let position = Position::new(460.0, 70.0);
            if let Some(rider) = world.create_object("Ranger", Some(players[1]), position) {
                world.enter_container(bike, rider);
            }
        }
        (world, players)
    }

    // === Selection ===

    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.world.objects().map(GameObject::id).collect()
    }

    pub fn selected_id(&self) -> Option<ObjectId> {
        self.object_ids().get(self.selected_object).copied()
    }

    pub fn selected(&self) -> Option<&GameObject> {
        self.selected_id().and_then(|id| self.world.object(id))
    }

    pub fn damage_type(&self) -> DamageType {
        DamageType::ALL[self.selected_damage % DamageType::ALL.len()]
    }

    pub fn player_name(&self, player: Option<PlayerIndex>) -> &str {
        player
            .and_then(|p| self.world.players().get(p))
            .map_or("-", |p| p.name.as_str())
    }

    /// First live enemy unit able to fire at `target`
    pub fn attacker_for(&self, target: ObjectId) -> Option<ObjectId> {
        let owner = self.world.object(target)?.state.owner;
        self.world
            .objects()
            .filter(|o| o.is_alive() && o.state.is_kind_of(KindOf::CanAttack))
            .find(|o| {
                let relationship = self.world.players().relationship(o.state.owner, owner);
                o.state.owner.is_some() && relationship == Relationship::Enemies
            })
            .map(GameObject::id)
    }

    fn request(&self, damage_type: DamageType, attacker: Option<ObjectId>) -> DamageInfo {
        let mut info = DamageInfo::new(damage_type, self.amount);
        if damage_type == DamageType::Status {
            info = info.with_status(STATUS_DAMAGE);
        }
        match attacker {
            Some(attacker) => info.from_source(attacker, None),
            None => info,
        }
    }

    // === Navigation ===

    pub fn next_tab(&mut self) {
        let tabs = Tab::all();
        let current_idx = tabs.iter().position(|t| *t == self.current_tab).unwrap_or(0);
        self.current_tab = tabs[(current_idx + 1) % tabs.len()];
    }

    pub fn prev_tab(&mut self) {
        let tabs = Tab::all();
        let current_idx = tabs.iter().position(|t| *t == self.current_tab).unwrap_or(0);
        let prev_idx = if current_idx == 0 { tabs.len() - 1 } else { current_idx - 1 };
        self.current_tab = tabs[prev_idx];
    }

    pub fn set_tab(&mut self, index: usize) {
        let tabs = Tab::all();
        if index < tabs.len() {
            self.current_tab = tabs[index];
        }
    }

    pub fn on_up(&mut self) {
        match self.current_tab {
            Tab::Units | Tab::Combat => {
                self.selected_object = self.selected_object.saturating_sub(1);
                self.refresh_preview();
            }
            Tab::Power => self.selected_player = self.selected_player.saturating_sub(1),
            Tab::Upgrades => self.selected_upgrade = self.selected_upgrade.saturating_sub(1),
            Tab::Help => {}
        }
    }

    pub fn on_down(&mut self) {
        match self.current_tab {
            Tab::Units | Tab::Combat => {
                let count = self.world.objects().count();
                if self.selected_object + 1 < count {
                    self.selected_object += 1;
                }
                self.refresh_preview();
            }
            Tab::Power => {
                if self.selected_player + 1 < self.players.len() {
                    self.selected_player += 1;
                }
            }
            Tab::Upgrades => {
                if self.selected_upgrade + 1 < self.world.data().upgrades.len() {
                    self.selected_upgrade += 1;
                }
            }
            Tab::Help => {}
        }
    }

    pub fn on_left(&mut self) {
        match self.current_tab {
            Tab::Combat => {
                let count = DamageType::ALL.len();
                self.selected_damage = (self.selected_damage + count - 1) % count;
                self.refresh_preview();
            }
            Tab::Upgrades => {
                self.selected_object = self.selected_object.saturating_sub(1);
            }
            _ => {}
        }
    }

    pub fn on_right(&mut self) {
        match self.current_tab {
            Tab::Combat => {
                self.selected_damage = (self.selected_damage + 1) % DamageType::ALL.len();
                self.refresh_preview();
            }
            Tab::Upgrades => {
                if self.selected_object + 1 < self.world.objects().count() {
                    self.selected_object += 1;
                }
            }
            _ => {}
        }
    }

    pub fn on_enter(&mut self) {
        match self.current_tab {
            Tab::Units | Tab::Combat => self.attack(),
            Tab::Power => self.sabotage(),
            Tab::Upgrades => self.give_selected_upgrade(),
            Tab::Help => {}
        }
    }

    pub fn on_space(&mut self) {
        self.attack();
    }

    // === Actions ===

    pub fn attack(&mut self) {
        let Some(target) = self.selected_id() else {
            return;
        };
        let damage_type = self.damage_type();
        let attacker = self.attacker_for(target);
        let request = self.request(damage_type, attacker);
        let info = self.world.attempt_damage(target, request);

        let template = self.selected().map_or("?", |o| o.template.name.as_str()).to_string();
        self.log.push(format!(
            "━━━ [{}] {} {:.0} {} → {} {}",
            self.world.frame(),
            attacker.map_or("world".to_string(), |a| a.to_string()),
            self.amount,
            damage_type.name(),
            template,
            target
        ));
        if info.output.no_effect {
            self.log.push("  ⚪ no effect".to_string());
        } else {
            self.log.push(format!(
                "  ▶ Damage dealt: {:.1} (clipped {:.1})",
                info.output.actual_damage_dealt, info.output.actual_damage_clipped
            ));
        }
        tracing::info!(
            target = %target,
            damage_type = damage_type.name(),
            amount = self.amount,
            "attack"
        );
        self.drain_events();
        self.refresh_preview();
    }

    pub fn heal(&mut self) {
        let Some(target) = self.selected_id() else {
            return;
        };
        let info = self
            .world
            .attempt_healing(target, DamageInfo::new(DamageType::Healing, self.amount));
        self.log.push(format!(
            "━━━ [{}] heal {} for {:.0}: restored {:.1}",
            self.world.frame(),
            target,
            self.amount,
            info.output.actual_damage_clipped
        ));
        self.drain_events();
        self.refresh_preview();
    }

    pub fn adjust_amount(&mut self, delta: f64) {
        self.amount = (self.amount + delta).max(0.0);
        self.refresh_preview();
    }

    pub fn advance_frames(&mut self, frames: u32) {
        let before = self.object_ids().len();
        self.world.run_frames(frames);
        self.drain_events();
        // destroyed objects leave the world once the clock moves
        let count = self.object_ids().len();
        if count != before {
            self.selected_object = self.selected_object.min(count.saturating_sub(1));
            self.refresh_preview();
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn tick(&mut self) {
        if !self.paused {
            self.advance_frames(FRAMES_PER_TICK);
        }
    }

    pub fn focused_player(&self) -> PlayerIndex {
        self.players[self.selected_player.min(self.players.len() - 1)]
    }

    /// Black out the focused player's power for a while
    pub fn sabotage(&mut self) {
        let player = self.focused_player();
        self.world.sabotage_power(player, SABOTAGE_FRAMES, 0, 0.0);
        let line = format!(
            "━━━ [{}] {} sabotaged for {} frames",
            self.world.frame(),
            self.player_name(Some(player)),
            SABOTAGE_FRAMES
        );
        self.log.push(line);
        tracing::info!(player = player.0, "sabotage");
        self.drain_events();
    }

    /// The other player steals everything the focused player can spare
    pub fn steal(&mut self) {
        let victim = self.focused_player();
        let Some(thief) = self.players.iter().copied().find(|p| *p != victim) else {
            return;
        };
        let cap = self
            .world
            .steal_power(thief, victim, GrantSource::All, DEFAULT_STOLEN_CONSTANT, THEFT_FRAMES);
        let line = format!(
            "━━━ [{}] {} steals {} power from {}",
            self.world.frame(),
            self.player_name(Some(thief)),
            cap,
            self.player_name(Some(victim))
        );
        self.log.push(line);
        tracing::info!(thief = thief.0, victim = victim.0, cap, "power theft");
        self.drain_events();
    }

    /// Grant the selected upgrade to the selected object, or to its owner for player upgrades
    pub fn give_selected_upgrade(&mut self) {
        let Some((name, kind)) = self
            .world
            .data()
            .upgrades
            .templates()
            .nth(self.selected_upgrade)
            .map(|template| (template.name.clone(), template.kind))
        else {
            return;
        };
        let Some(target) = self.selected_id() else {
            return;
        };

        let granted = match kind {
            UpgradeKind::Player => match self.world.object(target).and_then(|o| o.state.owner) {
                Some(owner) => self.world.give_player_upgrade(owner, &name),
                None => false,
            },
            UpgradeKind::Object => self.world.give_object_upgrade(target, &name),
        };
        self.log.push(format!(
            "━━━ [{}] {} {} for {}",
            self.world.frame(),
            if granted { "granted" } else { "could not grant" },
            name,
            target
        ));
        self.drain_events();
        self.refresh_preview();
    }

    pub fn export_snapshot(&mut self) {
        match snapshot::write(&self.world, Path::new(SNAPSHOT_FILE)) {
            Ok(()) => self.log.push(format!("Snapshot written to {}", SNAPSHOT_FILE)),
            Err(e) => {
                tracing::warn!(error = %e, "snapshot failed");
                self.log.push(format!("Snapshot failed: {}", e));
            }
        }
    }

    pub fn reset(&mut self) {
        let (world, players) = Self::populate(&self.data, self.seed);
        self.world = world;
        self.players = players;
        self.log.clear();
        self.log.push("Sandbox reset.".to_string());
        self.log_scroll = 0;
        self.drain_events();
        self.refresh_preview();
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.current_tab = Tab::Help;
        }
    }

    // === Bookkeeping ===

    fn drain_events(&mut self) {
        let frame = self.world.frame();
        for event in self.world.drain_events() {
            self.log.push(format!("  [{:>5}] {}", frame, event.describe()));
        }
        if self.log.len() > MAX_LOG_LINES {
            let excess = self.log.len() - MAX_LOG_LINES;
            self.log.drain(..excess);
        }
        // Auto-scroll to bottom
        self.log_scroll = self.log.len().saturating_sub(15);
    }

    fn refresh_preview(&mut self) {
        let Some(target) = self.selected_id() else {
            self.preview = None;
            return;
        };
        let damage_type = self.damage_type();
        let attacker = self.attacker_for(target);
        let request = self.request(damage_type, attacker);
        let estimate = self.world.estimate_damage(target, &request);

        let attacker_template = attacker
            .and_then(|a| self.world.object(a))
            .map(|o| o.template.name.clone());
        let simulation = match (attacker_template, self.selected()) {
            (Some(attacker), Some(target)) => KillSimulation::run(
                &self.data,
                &attacker,
                &target.template.name,
                damage_type,
                self.amount,
                30,
                1800,
                self.seed,
            ),
            _ => None,
        };
        self.preview = Some(Preview { estimate, simulation });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use damage_core::default_game_data;

    fn app() -> App {
        App::new(default_game_data().unwrap(), 11)
    }

    fn select(app: &mut App, template: &str, owner: usize) {
        let owner = app.players[owner];
        let index = app
            .world
            .objects()
            .position(|o| o.template.name == template && o.state.owner == Some(owner))
            .unwrap();
        app.selected_object = index;
    }

    #[test]
    fn test_lineup_spawned() {
        let app = app();
        // lineup plus three crew rangers
        assert_eq!(app.world.objects().count(), LINEUP.len() + 3);
        let bunker = app.world.objects().find(|o| o.template.name == "Bunker").unwrap();
        assert_eq!(bunker.state.contain.as_ref().unwrap().passengers.len(), 2);
    }

    #[test]
    fn test_check_lineup() {
        let mut data = default_game_data().unwrap();
        assert!(check_lineup(&data).is_ok());
        data.templates.remove("Bunker");
        let err = check_lineup(&data).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTemplate(name) if name == "Bunker"));
    }

    #[test]
    fn test_destroyed_object_leaves_selection() {
        let mut app = app();
        let last = app.object_ids().len() - 1;
        app.selected_object = last;
        let target = app.selected_id().unwrap();
        app.world.kill_object(target, None);
        assert!(app.world.object(target).is_some());

        app.advance_frames(1);
        assert!(app.world.object(target).is_none());
        assert_eq!(app.selected_object, last - 1);
        assert!(app.selected().is_some());
    }

    #[test]
    fn test_attack_selected_target() {
        let mut app = app();
        select(&mut app, "Tank", 1);
        app.selected_damage = DamageType::ALL
            .iter()
            .position(|t| *t == DamageType::Explosion)
            .unwrap();
        app.amount = 200.0;
        let target = app.selected_id().unwrap();

        app.refresh_preview();
        let preview = app.preview.as_ref().unwrap();
        assert!((preview.estimate - 100.0).abs() < f64::EPSILON);
        assert!(preview.simulation.as_ref().unwrap().kill_frame.is_some());

        app.attack();
        assert!((app.world.object(target).unwrap().body.health() - 400.0).abs() < f64::EPSILON);
        assert!(app.log.iter().any(|l| l.contains("Damage dealt: 100.0")));
    }

    #[test]
    fn test_attacker_is_enemy() {
        let app = app();
        let usa_tank = app
            .world
            .objects()
            .find(|o| o.template.name == "Tank" && o.state.owner == Some(app.players[0]))
            .unwrap()
            .id();
        let attacker = app.attacker_for(usa_tank).unwrap();
        assert_eq!(app.world.object(attacker).unwrap().state.owner, Some(app.players[1]));
    }

    #[test]
    fn test_sabotage_and_theft() {
        let mut app = app();
        app.selected_player = 0;
        app.sabotage();
        assert_eq!(app.world.production(app.players[0]), 0);

        app.reset();
        app.selected_player = 0;
        app.steal();
        assert_eq!(app.world.production(app.players[1]), 200);
        assert_eq!(app.world.production(app.players[0]), 0);
    }

    #[test]
    fn test_give_player_upgrade_from_object() {
        let mut app = app();
        select(&mut app, "Tank", 0);
        app.selected_upgrade = app
            .world
            .data()
            .upgrades
            .templates()
            .position(|t| t.name == "Upgrade_CompositeArmor")
            .unwrap();
        app.give_selected_upgrade();
        let usa = app.world.players().get(app.players[0]).unwrap();
        assert!(usa.upgrades.any());
        assert!(app.log.iter().any(|l| l.contains("granted Upgrade_CompositeArmor")));
    }

    #[test]
    fn test_tab_cycle() {
        let mut app = app();
        for _ in 0..Tab::all().len() {
            app.next_tab();
        }
        assert_eq!(app.current_tab, Tab::Units);
        app.prev_tab();
        assert_eq!(app.current_tab, Tab::Help);
    }
}
