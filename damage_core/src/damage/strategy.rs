//! Damage strategies - Which handler a damage event is routed to

use super::DamageInfoInput;
use crate::types::DamageType;
use serde::{Deserialize, Serialize};

/// Named handler for one family of damage types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageStrategy {
    Heal,
    /// Disable a vehicle by removing its crew
    KillPilot,
    /// Kill passengers of a garrison instead of hurting the building
    KillGarrisoned,
    /// Timed status only, health untouched
    StatusOnly,
    Chrono,
    Subdual,
    Generic,
}

impl DamageStrategy {
    pub fn for_input(input: &DamageInfoInput) -> Self {
        if input.kill {
            return DamageStrategy::Generic;
        }
        match input.damage_type {
            DamageType::Healing => DamageStrategy::Heal,
            DamageType::KillPilot => DamageStrategy::KillPilot,
            DamageType::KillGarrisoned => DamageStrategy::KillGarrisoned,
            DamageType::Status => DamageStrategy::StatusOnly,
            t if t.is_chrono() => DamageStrategy::Chrono,
            t if t.is_subdual() => DamageStrategy::Subdual,
            _ if input.custom_subdual_type.is_some() => DamageStrategy::Subdual,
            _ => DamageStrategy::Generic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::DamageInfo;

    #[test]
    fn test_dispatch_table() {
        let cases = [
            (DamageType::Healing, DamageStrategy::Heal),
            (DamageType::KillPilot, DamageStrategy::KillPilot),
            (DamageType::KillGarrisoned, DamageStrategy::KillGarrisoned),
            (DamageType::Status, DamageStrategy::StatusOnly),
            (DamageType::ChronoGun, DamageStrategy::Chrono),
            (DamageType::ChronoUnresistable, DamageStrategy::Chrono),
            (DamageType::SubdualVehicle, DamageStrategy::Subdual),
            (DamageType::Explosion, DamageStrategy::Generic),
            (DamageType::Unresistable, DamageStrategy::Generic),
        ];
        for (damage_type, expected) in cases {
            let info = DamageInfo::new(damage_type, 1.0);
            assert_eq!(DamageStrategy::for_input(&info.input), expected, "{:?}", damage_type);
        }
    }

    #[test]
    fn test_custom_subdual_and_kill_routing() {
        let info = DamageInfo::new(DamageType::Microwave, 5.0).with_custom_subdual("Magnet");
        assert_eq!(DamageStrategy::for_input(&info.input), DamageStrategy::Subdual);

        let mut info = DamageInfo::new(DamageType::Healing, 5.0);
        info.input.kill = true;
        assert_eq!(DamageStrategy::for_input(&info.input), DamageStrategy::Generic);
    }
}
