//! ArmorStore - Registry of armor templates and custom damage types

use super::template::ArmorTemplate;
use crate::config::{ArmorDefinition, ArmorFile, ConfigError, CustomDamageTypeDefinition};
use crate::types::DamageType;
use std::collections::HashMap;
use std::sync::Arc;

/// Interned id of a custom damage type name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomTypeId(u32);

impl CustomTypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Global definition of a custom damage type
#[derive(Debug, Clone)]
pub struct CustomDamageTypeInfo {
    /// Coefficient used when nothing more specific resolves
    pub default_coefficient: f64,
    /// Built-in type whose coefficient is borrowed when no link resolves
    pub link_damage_type: Option<DamageType>,
    /// Other custom types searched for a coefficient, nearest first
    pub linked_custom_types: Vec<CustomTypeId>,
}

impl Default for CustomDamageTypeInfo {
    fn default() -> Self {
        CustomDamageTypeInfo {
            default_coefficient: 1.0,
            link_damage_type: None,
            linked_custom_types: Vec::new(),
        }
    }
}

/// Owns every armor template and the custom damage type link graph
///
/// Populated once while data files load and read-only afterwards. Custom type
/// names are interned so graph walks can track visited nodes in a flat vector;
/// a name may be interned (by being linked to) before it is defined.
#[derive(Debug, Clone, Default)]
pub struct ArmorStore {
    templates: HashMap<String, Arc<ArmorTemplate>>,
    names: Vec<String>,
    ids: HashMap<String, CustomTypeId>,
    custom_types: Vec<Option<CustomDamageTypeInfo>>,
}

impl ArmorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under `name`, replacing any previous one
    pub fn register_template(&mut self, name: &str, template: ArmorTemplate) -> Arc<ArmorTemplate> {
        let template = Arc::new(template);
        self.templates.insert(name.to_string(), Arc::clone(&template));
        template
    }

    pub fn find_template(&self, name: &str) -> Option<Arc<ArmorTemplate>> {
        self.templates.get(name).cloned()
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Copy an existing template so it can be extended under a new name
    pub fn extend_template(&self, base: &str) -> Result<ArmorTemplate, ConfigError> {
        self.templates
            .get(base)
            .map(|t| ArmorTemplate::clone(t))
            .ok_or_else(|| ConfigError::UnknownArmor(base.to_string()))
    }

    fn intern(&mut self, name: &str) -> CustomTypeId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = CustomTypeId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        self.custom_types.push(None);
        id
    }

    /// Define (or redefine) a custom damage type
    ///
    /// Links already recorded for the name are kept.
    pub fn register_custom_damage_type(
        &mut self,
        name: &str,
        info: CustomDamageTypeInfo,
    ) -> CustomTypeId {
        let id = self.intern(name);
        let slot = &mut self.custom_types[id.index()];
        let mut info = info;
        if let Some(existing) = slot.take() {
            for link in existing.linked_custom_types {
                if !info.linked_custom_types.contains(&link) {
                    info.linked_custom_types.push(link);
                }
            }
        }
        *slot = Some(info);
        id
    }

    /// Add `to` to the link list of `from`
    ///
    /// `from` is defined with defaults if it is not registered yet; `to` only
    /// needs to be a name.
    pub fn link_custom_damage_types(&mut self, from: &str, to: &str) {
        let from_id = self.intern(from);
        let to_id = self.intern(to);
        let info = self.custom_types[from_id.index()]
            .get_or_insert_with(CustomDamageTypeInfo::default);
        if !info.linked_custom_types.contains(&to_id) {
            info.linked_custom_types.push(to_id);
        }
    }

    pub fn custom_type_id(&self, name: &str) -> Option<CustomTypeId> {
        self.ids.get(name).copied()
    }

    /// Definition of an interned custom type, `None` if only ever linked to
    pub fn custom_type(&self, id: CustomTypeId) -> Option<&CustomDamageTypeInfo> {
        self.custom_types.get(id.index()).and_then(Option::as_ref)
    }

    pub fn custom_type_name(&self, id: CustomTypeId) -> &str {
        &self.names[id.index()]
    }

    /// Number of interned custom type names
    pub fn custom_type_count(&self) -> usize {
        self.names.len()
    }

    pub fn is_custom_damage_type(&self, name: &str) -> bool {
        self.custom_type_id(name)
            .and_then(|id| self.custom_type(id))
            .is_some()
    }

    /// Build a store from a parsed armor file
    ///
    /// Custom damage types are registered first so armors may name them.
    /// Armors are processed in file order, so `extends` must name an armor
    /// defined earlier.
    pub fn from_file(file: &ArmorFile) -> Result<Self, ConfigError> {
        let mut store = ArmorStore::new();

        for def in &file.custom_damage_type {
            store.add_custom_damage_type_definition(def)?;
        }

        for def in &file.armor {
            store.add_armor_definition(def)?;
        }

        tracing::debug!(
            armors = store.templates.len(),
            custom_types = store.custom_type_count(),
            "armor store loaded"
        );
        Ok(store)
    }

    fn add_custom_damage_type_definition(
        &mut self,
        def: &CustomDamageTypeDefinition,
    ) -> Result<(), ConfigError> {
        if self.is_custom_damage_type(&def.name) {
            return Err(ConfigError::DuplicateDefinition(def.name.clone()));
        }

        let link_damage_type = match &def.link_damage_type {
            Some(name) => Some(
                DamageType::from_name(name)
                    .ok_or_else(|| ConfigError::UnknownDamageType(name.clone()))?,
            ),
            None => None,
        };

        self.register_custom_damage_type(
            &def.name,
            CustomDamageTypeInfo {
                default_coefficient: def.default_coefficient,
                link_damage_type,
                linked_custom_types: Vec::new(),
            },
        );
        for linked in &def.linked_custom_types {
            self.link_custom_damage_types(&def.name, linked);
        }
        Ok(())
    }

    fn add_armor_definition(&mut self, def: &ArmorDefinition) -> Result<(), ConfigError> {
        if self.templates.contains_key(&def.name) {
            return Err(ConfigError::DuplicateDefinition(def.name.clone()));
        }

        let mut template = match &def.extends {
            Some(base) => self.extend_template(base)?,
            None => ArmorTemplate::new(),
        };

        // "default" first so specific entries override it regardless of map order
        if let Some(all) = def.coefficients.get("default") {
            template.set_all_coefficients(*all);
        }
        for (name, coefficient) in &def.coefficients {
            if name == "default" {
                continue;
            }
            let damage_type = DamageType::from_name(name)
                .ok_or_else(|| ConfigError::UnknownDamageType(name.clone()))?;
            template.set_coefficient(damage_type, *coefficient);
        }

        for (name, coefficient) in &def.custom_coefficients {
            template.set_custom_coefficient(name, *coefficient);
        }
        for (name, multiplier) in &def.custom_multipliers {
            template.set_custom_multiplier(name, *multiplier);
        }
        for (status, coefficient) in &def.status_coefficients {
            template.set_status_coefficient(*status, *coefficient);
        }
        for (condition, coefficient) in &def.weapon_bonus_coefficients {
            template.set_weapon_bonus_coefficient(*condition, *coefficient);
        }
        for (name, coefficient) in &def.custom_status_coefficients {
            template.set_custom_status_coefficient(name, *coefficient);
        }
        for (name, coefficient) in &def.custom_bonus_coefficients {
            template.set_custom_bonus_coefficient(name, *coefficient);
        }

        self.register_template(&def.name, template);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_armor_file;

    const ARMOR_TOML: &str = r#"
[[custom_damage_type]]
name = "Plasma"
default_coefficient = 0.8
linked_custom_types = ["Energy"]

[[custom_damage_type]]
name = "Energy"
link_damage_type = "laser"

[[armor]]
name = "Base"
[armor.coefficients]
default = 0.5
explosion = 0.25

[[armor]]
name = "Heavy"
extends = "Base"
[armor.coefficients]
small_arms = 0.1
[armor.custom_coefficients]
Energy = 0.3
"#;

    #[test]
    fn test_load_and_extend() {
        let file = parse_armor_file(ARMOR_TOML).unwrap();
        let store = ArmorStore::from_file(&file).unwrap();

        let base = store.find_template("Base").unwrap();
        assert!((base.coefficient(DamageType::Explosion) - 0.25).abs() < f64::EPSILON);
        assert!((base.coefficient(DamageType::Flame) - 0.5).abs() < f64::EPSILON);

        let heavy = store.find_template("Heavy").unwrap();
        // inherited from Base
        assert!((heavy.coefficient(DamageType::Explosion) - 0.25).abs() < f64::EPSILON);
        assert!((heavy.coefficient(DamageType::SmallArms) - 0.1).abs() < f64::EPSILON);
        // Base is untouched by the extension
        assert!((base.coefficient(DamageType::SmallArms) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_loaded_graph_resolves() {
        let file = parse_armor_file(ARMOR_TOML).unwrap();
        let store = ArmorStore::from_file(&file).unwrap();

        let heavy = store.find_template("Heavy").unwrap();
        let result = heavy.adjust_damage(&store, DamageType::Explosion, 100.0, "Plasma");
        assert!((result - 30.0).abs() < 1e-9);

        // Base declares nothing for Energy, so Plasma falls back to its default
        let base = store.find_template("Base").unwrap();
        let result = base.adjust_damage(&store, DamageType::Explosion, 100.0, "Plasma");
        assert!((result - 80.0).abs() < 1e-9);

        // Energy itself borrows the laser coefficient
        let result = base.adjust_damage(&store, DamageType::Explosion, 100.0, "Energy");
        assert!((result - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_base_is_fatal() {
        let toml = r#"
[[armor]]
name = "Orphan"
extends = "Missing"
"#;
        let file = parse_armor_file(toml).unwrap();
        let err = ArmorStore::from_file(&file).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownArmor(name) if name == "Missing"));
    }

    #[test]
    fn test_unknown_damage_type_is_fatal() {
        let toml = r#"
[[armor]]
name = "Typo"
[armor.coefficients]
explosoin = 0.5
"#;
        let file = parse_armor_file(toml).unwrap();
        let err = ArmorStore::from_file(&file).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDamageType(_)));
    }

    #[test]
    fn test_duplicate_armor_is_fatal() {
        let toml = r#"
[[armor]]
name = "Twice"

[[armor]]
name = "Twice"
"#;
        let file = parse_armor_file(toml).unwrap();
        assert!(matches!(
            ArmorStore::from_file(&file),
            Err(ConfigError::DuplicateDefinition(_))
        ));
    }

    #[test]
    fn test_link_before_definition_keeps_links() {
        let mut store = ArmorStore::new();
        store.link_custom_damage_types("Late", "Other");
        store.register_custom_damage_type("Late", CustomDamageTypeInfo::default());
        let id = store.custom_type_id("Late").unwrap();
        assert_eq!(store.custom_type(id).unwrap().linked_custom_types.len(), 1);
        // linked-only names are interned but not defined
        assert!(!store.is_custom_damage_type("Other"));
    }
}
