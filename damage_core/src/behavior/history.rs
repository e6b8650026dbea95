//! DamageHistory - Running totals of what an object has taken

use super::{DamageModule, ModuleContext};
use crate::damage::DamageInfo;
use crate::types::{BodyDamageType, Frame};

#[derive(Debug, Clone, Default)]
pub struct DamageHistory {
    pub hits: u32,
    pub total_damage: f64,
    pub total_healing: f64,
    pub last_hit_frame: Option<Frame>,
    pub transitions: u32,
}

impl DamageHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DamageModule for DamageHistory {
    fn name(&self) -> &str {
        "DamageHistory"
    }

    fn on_damage(&mut self, ctx: &mut ModuleContext<'_>, info: &DamageInfo) {
        self.hits += 1;
        self.total_damage += info.output.actual_damage_clipped;
        self.last_hit_frame = Some(ctx.frame);
    }

    fn on_healing(&mut self, _ctx: &mut ModuleContext<'_>, info: &DamageInfo) {
        self.total_healing += info.output.actual_damage_clipped;
    }

    fn on_body_damage_state_change(
        &mut self,
        _ctx: &mut ModuleContext<'_>,
        _info: Option<&DamageInfo>,
        _old: BodyDamageType,
        _new: BodyDamageType,
    ) {
        self.transitions += 1;
    }

    fn summary(&self) -> String {
        format!(
            "{} hits, {:.0} damage, {:.0} healed",
            self.hits, self.total_damage, self.total_healing
        )
    }
}
