//! TransitionFx - Named effect per damage state entered

use super::{DamageModule, ModuleContext};
use crate::damage::DamageInfo;
use crate::events::GameEvent;
use crate::types::BodyDamageType;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct TransitionFx {
    fx: BTreeMap<BodyDamageType, String>,
}

impl TransitionFx {
    pub fn new(fx: BTreeMap<BodyDamageType, String>) -> Self {
        TransitionFx { fx }
    }
}

impl DamageModule for TransitionFx {
    fn name(&self) -> &str {
        "TransitionFx"
    }

    fn on_damage(&mut self, _ctx: &mut ModuleContext<'_>, _info: &DamageInfo) {}

    fn on_body_damage_state_change(
        &mut self,
        ctx: &mut ModuleContext<'_>,
        _info: Option<&DamageInfo>,
        _old: BodyDamageType,
        new: BodyDamageType,
    ) {
        if let Some(name) = self.fx.get(&new) {
            ctx.events.push(GameEvent::Fx {
                object: ctx.object,
                name: name.clone(),
            });
        }
    }

    fn summary(&self) -> String {
        format!("TransitionFx ({} states)", self.fx.len())
    }
}
