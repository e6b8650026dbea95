//! Global rules configuration

use super::ConfigError;
use serde::{Deserialize, Serialize};

/// Tunable global rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub body: BodyRules,
    #[serde(default)]
    pub retaliation: RetaliationRules,
}

impl RulesConfig {
    /// Reject values the damage pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let body = &self.body;
        if !(0.0..=1.0).contains(&body.unit_damaged_thresh)
            || !(0.0..=1.0).contains(&body.unit_really_damaged_thresh)
        {
            return Err(ConfigError::ValidationError(
                "damage thresholds must be within 0..=1".to_string(),
            ));
        }
        if body.unit_really_damaged_thresh > body.unit_damaged_thresh {
            return Err(ConfigError::ValidationError(
                "unit_really_damaged_thresh must not exceed unit_damaged_thresh".to_string(),
            ));
        }
        let bonus = &body.veterancy_health_bonus;
        if bonus.len() != 4 || bonus.iter().any(|b| *b <= 0.0) {
            return Err(ConfigError::ValidationError(
                "veterancy_health_bonus needs four positive entries".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyRules {
    /// Health ratio at or below which a body counts as damaged
    #[serde(default = "default_damaged_thresh")]
    pub unit_damaged_thresh: f64,
    /// Health ratio at or below which a body counts as really damaged
    #[serde(default = "default_really_damaged_thresh")]
    pub unit_really_damaged_thresh: f64,
    /// Health ratio whose downward crossing may trigger the fear voice
    #[serde(default = "default_fear_ratio")]
    pub low_health_fear_ratio: f64,
    /// Chance of the fear voice on each crossing
    #[serde(default = "default_fear_chance")]
    pub low_health_fear_chance: f64,
    /// Frames within which a significant attacker outranks a later one
    #[serde(default = "default_attribution_window")]
    pub attribution_window_frames: u32,
    /// Max health multiplier per veterancy level
    #[serde(default = "default_veterancy_health_bonus")]
    pub veterancy_health_bonus: Vec<f64>,
    /// Attackers carrying this custom status deal no damage
    #[serde(default)]
    pub no_damage_custom_status: Option<String>,
}

impl Default for BodyRules {
    fn default() -> Self {
        BodyRules {
            unit_damaged_thresh: default_damaged_thresh(),
            unit_really_damaged_thresh: default_really_damaged_thresh(),
            low_health_fear_ratio: default_fear_ratio(),
            low_health_fear_chance: default_fear_chance(),
            attribution_window_frames: default_attribution_window(),
            veterancy_health_bonus: default_veterancy_health_bonus(),
            no_damage_custom_status: None,
        }
    }
}

fn default_damaged_thresh() -> f64 {
    0.5
}
fn default_really_damaged_thresh() -> f64 {
    0.1
}
fn default_fear_ratio() -> f64 {
    0.25
}
fn default_fear_chance() -> f64 {
    0.25
}
fn default_attribution_window() -> u32 {
    1
}
fn default_veterancy_health_bonus() -> Vec<f64> {
    vec![1.0, 1.2, 1.3, 1.5]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetaliationRules {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Allies within this distance of a damaged unit join in
    #[serde(default = "default_retaliation_radius")]
    pub radius: f64,
}

impl Default for RetaliationRules {
    fn default() -> Self {
        RetaliationRules {
            enabled: true,
            radius: default_retaliation_radius(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_retaliation_radius() -> f64 {
    150.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = RulesConfig::default();
        assert!((rules.body.unit_damaged_thresh - 0.5).abs() < f64::EPSILON);
        assert!((rules.body.unit_really_damaged_thresh - 0.1).abs() < f64::EPSILON);
        assert!(rules.retaliation.enabled);
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_parse_rules() {
        let toml = r#"
[body]
unit_damaged_thresh = 0.6
no_damage_custom_status = "Phased"

[retaliation]
radius = 200.0
"#;
        let rules: RulesConfig = toml::from_str(toml).unwrap();
        assert!((rules.body.unit_damaged_thresh - 0.6).abs() < f64::EPSILON);
        assert!((rules.body.unit_really_damaged_thresh - 0.1).abs() < f64::EPSILON);
        assert_eq!(rules.body.no_damage_custom_status.as_deref(), Some("Phased"));
        assert!((rules.retaliation.radius - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut rules = RulesConfig::default();
        rules.body.unit_really_damaged_thresh = 0.8;
        assert!(matches!(rules.validate(), Err(ConfigError::ValidationError(_))));
    }
}
