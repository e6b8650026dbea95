//! Body damage state - The four-level classification of a health ratio

use crate::config::BodyRules;
use crate::types::BodyDamageType;

/// Health ratios separating the damage states
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageThresholds {
    pub damaged: f64,
    pub really_damaged: f64,
}

impl Default for DamageThresholds {
    fn default() -> Self {
        DamageThresholds {
            damaged: 0.5,
            really_damaged: 0.1,
        }
    }
}

impl From<&BodyRules> for DamageThresholds {
    fn from(rules: &BodyRules) -> Self {
        DamageThresholds {
            damaged: rules.unit_damaged_thresh,
            really_damaged: rules.unit_really_damaged_thresh,
        }
    }
}

/// Classify `health` out of `max_health`
///
/// A ratio strictly above a threshold stays in the better state.
pub fn calc_damage_state(
    health: f64,
    max_health: f64,
    thresholds: DamageThresholds,
) -> BodyDamageType {
    let ratio = if max_health > 0.0 { health / max_health } else { 0.0 };
    if ratio > thresholds.damaged {
        BodyDamageType::Pristine
    } else if ratio > thresholds.really_damaged {
        BodyDamageType::Damaged
    } else if ratio > 0.0 {
        BodyDamageType::ReallyDamaged
    } else {
        BodyDamageType::Rubble
    }
}

/// Health that puts a body just inside `state`
pub fn health_for_state(
    state: BodyDamageType,
    max_health: f64,
    thresholds: DamageThresholds,
) -> f64 {
    let ratio = match state {
        BodyDamageType::Pristine => 1.0,
        BodyDamageType::Damaged => thresholds.damaged,
        BodyDamageType::ReallyDamaged => thresholds.really_damaged,
        BodyDamageType::Rubble => 0.0,
    };
    // one point below the threshold since the comparison is strict
    (max_health * ratio - 1.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_ratio() {
        let t = DamageThresholds::default();
        assert_eq!(calc_damage_state(100.0, 100.0, t), BodyDamageType::Pristine);
        assert_eq!(calc_damage_state(60.0, 100.0, t), BodyDamageType::Pristine);
        assert_eq!(calc_damage_state(30.0, 100.0, t), BodyDamageType::Damaged);
        assert_eq!(calc_damage_state(5.0, 100.0, t), BodyDamageType::ReallyDamaged);
        assert_eq!(calc_damage_state(0.0, 100.0, t), BodyDamageType::Rubble);
    }

    #[test]
    fn test_threshold_boundaries() {
        let t = DamageThresholds::default();
        // exactly on a threshold falls into the worse state
        assert_eq!(calc_damage_state(50.0, 100.0, t), BodyDamageType::Damaged);
        assert_eq!(calc_damage_state(10.0, 100.0, t), BodyDamageType::ReallyDamaged);
        assert_eq!(calc_damage_state(10.0, 0.0, t), BodyDamageType::Rubble);
    }

    #[test]
    fn test_health_for_state_lands_in_state() {
        let t = DamageThresholds::default();
        for state in [
            BodyDamageType::Pristine,
            BodyDamageType::Damaged,
            BodyDamageType::ReallyDamaged,
            BodyDamageType::Rubble,
        ] {
            let health = health_for_state(state, 500.0, t);
            assert_eq!(calc_damage_state(health, 500.0, t), state);
        }
    }
}
