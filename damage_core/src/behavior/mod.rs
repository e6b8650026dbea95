//! Behavior modules - Per-object capability registry
//!
//! Modules are registered under the capabilities they implement; callers ask
//! the registry for the modules of a capability instead of probing each
//! module for an interface.

mod history;
mod transition_fx;

pub use history::DamageHistory;
pub use transition_fx::TransitionFx;

use crate::config::DamageModuleDefinition;
use crate::damage::DamageInfo;
use crate::events::EventLog;
use crate::object::ObjectTemplate;
use crate::types::{BodyDamageType, Frame, ObjectId};
use crate::upgrade::{build_upgrade_module, UpgradeModule};
use std::fmt;

/// What a behavior module can be asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Damage,
    Upgrade,
}

/// Services handed to a module callback
pub struct ModuleContext<'a> {
    pub object: ObjectId,
    pub frame: Frame,
    pub events: &'a mut EventLog,
}

/// Module notified about damage to its object
pub trait DamageModule: fmt::Debug {
    fn name(&self) -> &str;

    /// Damage that reduced health or filled a pool
    fn on_damage(&mut self, ctx: &mut ModuleContext<'_>, info: &DamageInfo);

    fn on_healing(&mut self, _ctx: &mut ModuleContext<'_>, _info: &DamageInfo) {}

    fn on_body_damage_state_change(
        &mut self,
        _ctx: &mut ModuleContext<'_>,
        _info: Option<&DamageInfo>,
        _old: BodyDamageType,
        _new: BodyDamageType,
    ) {
    }

    /// Short description for display
    fn summary(&self) -> String {
        self.name().to_string()
    }
}

pub fn build_damage_module(def: &DamageModuleDefinition) -> Box<dyn DamageModule> {
    match def {
        DamageModuleDefinition::History => Box::new(DamageHistory::new()),
        DamageModuleDefinition::TransitionFx { fx } => Box::new(TransitionFx::new(fx.clone())),
    }
}

/// Modules of one object, grouped by capability in registration order
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    damage: Vec<Box<dyn DamageModule>>,
    upgrade: Vec<Box<dyn UpgradeModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate every module the template declares
    pub fn from_template(template: &ObjectTemplate) -> Self {
        let mut registry = ModuleRegistry::new();
        for def in &template.damage_modules {
            registry.register_damage(build_damage_module(def));
        }
        for module in &template.upgrade_modules {
            registry.register_upgrade(build_upgrade_module(module));
        }
        registry
    }

    pub fn register_damage(&mut self, module: Box<dyn DamageModule>) {
        self.damage.push(module);
    }

    pub fn register_upgrade(&mut self, module: Box<dyn UpgradeModule>) {
        self.upgrade.push(module);
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Damage => !self.damage.is_empty(),
            Capability::Upgrade => !self.upgrade.is_empty(),
        }
    }

    pub fn damage_modules(&self) -> impl Iterator<Item = &dyn DamageModule> {
        self.damage.iter().map(|m| m.as_ref())
    }

    pub fn upgrade_modules(&self) -> impl Iterator<Item = &dyn UpgradeModule> {
        self.upgrade.iter().map(|m| m.as_ref())
    }

    pub fn upgrade_modules_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn UpgradeModule>> {
        self.upgrade.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.damage.len() + self.upgrade.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn on_damage(&mut self, ctx: &mut ModuleContext<'_>, info: &DamageInfo) {
        for module in &mut self.damage {
            module.on_damage(ctx, info);
        }
    }

    pub fn on_healing(&mut self, ctx: &mut ModuleContext<'_>, info: &DamageInfo) {
        for module in &mut self.damage {
            module.on_healing(ctx, info);
        }
    }

    pub fn on_body_damage_state_change(
        &mut self,
        ctx: &mut ModuleContext<'_>,
        info: Option<&DamageInfo>,
        old: BodyDamageType,
        new: BodyDamageType,
    ) {
        for module in &mut self.damage {
            module.on_body_damage_state_change(ctx, info, old, new);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GameEvent;
    use crate::types::DamageType;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl DamageModule for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn on_damage(&mut self, _ctx: &mut ModuleContext<'_>, _info: &DamageInfo) {
            self.log.borrow_mut().push(self.name);
        }
    }

    #[test]
    fn test_damage_modules_notified_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        for name in ["first", "second", "third"] {
            registry.register_damage(Box::new(Recorder {
                name,
                log: Rc::clone(&log),
            }));
        }

        let mut events = EventLog::new();
        let mut ctx = ModuleContext {
            object: ObjectId(1),
            frame: 0,
            events: &mut events,
        };
        registry.on_damage(&mut ctx, &DamageInfo::new(DamageType::Explosion, 1.0));
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_capability_query() {
        let mut registry = ModuleRegistry::new();
        assert!(!registry.has_capability(Capability::Damage));
        registry.register_damage(Box::new(DamageHistory::new()));
        assert!(registry.has_capability(Capability::Damage));
        assert!(!registry.has_capability(Capability::Upgrade));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_state_change_reaches_fx_module() {
        let mut fx = std::collections::BTreeMap::new();
        fx.insert(BodyDamageType::Rubble, "FX_Collapse".to_string());
        let mut registry = ModuleRegistry::new();
        registry.register_damage(build_damage_module(&DamageModuleDefinition::TransitionFx { fx }));

        let mut events = EventLog::new();
        let mut ctx = ModuleContext {
            object: ObjectId(4),
            frame: 0,
            events: &mut events,
        };
        registry.on_body_damage_state_change(
            &mut ctx,
            None,
            BodyDamageType::ReallyDamaged,
            BodyDamageType::Rubble,
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::Fx { name, .. } if name == "FX_Collapse")));
    }
}
