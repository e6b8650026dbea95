//! Kill-time simulation utilities

use damage_core::types::LOGIC_FRAMES_PER_SECOND;
use damage_core::{DamageInfo, DamageType, Frame, GameData, Position, World};

/// Result of firing one request repeatedly at a fresh target
#[derive(Debug, Clone, PartialEq)]
pub struct KillSimulation {
    pub hits: u32,
    pub total_damage: f64,
    pub frames: Frame,
    pub kill_frame: Option<Frame>,
}

impl KillSimulation {
    /// Fire `amount` of `damage_type` from `attacker` at `target` every
    /// `interval` frames until it dies or `max_frames` pass
    ///
    /// Both objects are spawned in a private world so the sandbox is left
    /// untouched. Returns `None` when either template is unknown.
    pub fn run(
        data: &GameData,
        attacker: &str,
        target: &str,
        damage_type: DamageType,
        amount: f64,
        interval: Frame,
        max_frames: Frame,
        seed: u64,
    ) -> Option<Self> {
        let mut world = World::new(data.clone(), seed);
        let us = world.add_player("Attacker");
        let them = world.add_player("Target");
        let source = world.create_object(attacker, Some(us), Position::new(0.0, 0.0))?;
        let victim = world.create_object(target, Some(them), Position::new(100.0, 0.0))?;

        let mut result = KillSimulation {
            hits: 0,
            total_damage: 0.0,
            frames: 0,
            kill_frame: None,
        };
        let interval = interval.max(1);

        while result.frames < max_frames {
            if result.frames % interval == 0 {
                let info = world.attempt_damage(
                    victim,
                    DamageInfo::new(damage_type, amount).from_source(source, None),
                );
                if info.output.no_effect {
                    break;
                }
                result.hits += 1;
                result.total_damage += info.output.actual_damage_clipped;
            }
            if !world.object(victim).is_some_and(|o| o.is_alive()) {
                result.kill_frame = Some(result.frames);
                break;
            }
            world.step();
            result.frames += 1;
        }
        Some(result)
    }

    /// Damage per second over the simulated span
    pub fn dps(&self) -> f64 {
        let seconds = self.frames.max(1) as f64 / LOGIC_FRAMES_PER_SECOND as f64;
        self.total_damage / seconds
    }

    pub fn time_to_kill(&self) -> Option<f64> {
        self.kill_frame
            .map(|frame| frame as f64 / LOGIC_FRAMES_PER_SECOND as f64)
    }

    pub fn avg_damage(&self) -> f64 {
        if self.hits > 0 {
            self.total_damage / self.hits as f64
        } else {
            0.0
        }
    }
}
