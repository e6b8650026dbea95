//! Sabotage and transfer ledger entries

use crate::types::{Frame, ObjectId, PlayerIndex};
use serde::{Deserialize, Serialize};

/// Grant amount meaning "everything the donor has when the grant is made"
pub const DEFAULT_STOLEN_CONSTANT: i32 = -1;

/// Timed reduction of a player's production
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SabotageEntry {
    pub till_frame: Frame,
    pub amount: i32,
    /// Fraction of base production removed, 0.0..=1.0
    pub percent: f64,
}

impl SabotageEntry {
    pub fn is_live(&self, frame: Frame) -> bool {
        frame < self.till_frame
    }

    pub fn reduction(&self, production: i32) -> i32 {
        self.amount + (production as f64 * self.percent).round() as i32
    }
}

/// Who a grant is charged against on the donor side
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrantSource {
    /// The donor's whole grid
    All,
    /// A single object of the donor, such as a hijacked power plant
    Object(ObjectId),
}

/// Timed transfer of energy from the owning ledger to another player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyGrant {
    pub recipient: PlayerIndex,
    pub source: GrantSource,
    /// Requested amount, or [`DEFAULT_STOLEN_CONSTANT`]
    pub amount: i32,
    pub till_frame: Frame,
    /// Donor's transferable power when the grant was made
    pub max_energy_at_grant_time: i32,
}

impl EnergyGrant {
    pub fn is_live(&self, frame: Frame) -> bool {
        frame < self.till_frame
    }

    /// Most this grant can ever deliver
    pub fn cap(&self) -> i32 {
        let max = self.max_energy_at_grant_time.max(0);
        if self.amount == DEFAULT_STOLEN_CONSTANT {
            max
        } else {
            self.amount.clamp(0, max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grant_takes_everything_available() {
        let grant = EnergyGrant {
            recipient: PlayerIndex(1),
            source: GrantSource::All,
            amount: DEFAULT_STOLEN_CONSTANT,
            till_frame: 10,
            max_energy_at_grant_time: 70,
        };
        assert_eq!(grant.cap(), 70);
        assert!(grant.is_live(9));
        assert!(!grant.is_live(10));
    }

    #[test]
    fn test_explicit_grant_clamped_to_available() {
        let grant = EnergyGrant {
            recipient: PlayerIndex(1),
            source: GrantSource::Object(ObjectId(3)),
            amount: 500,
            till_frame: 10,
            max_energy_at_grant_time: 120,
        };
        assert_eq!(grant.cap(), 120);
    }

    #[test]
    fn test_sabotage_reduction() {
        let entry = SabotageEntry {
            till_frame: 5,
            amount: 10,
            percent: 0.25,
        };
        assert_eq!(entry.reduction(100), 35);
    }
}
