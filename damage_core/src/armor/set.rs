//! Armor sets - Conditional armor selection

use crate::types::{ArmorSetFlag, FlagSet};
use serde::{Deserialize, Serialize};

/// One armor choice guarded by a set of conditions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmorSetEntry {
    /// Flags that must all be present on the object
    #[serde(default)]
    pub conditions: FlagSet<ArmorSetFlag>,
    /// Armor template name, `None` for no armor
    #[serde(default)]
    pub armor: Option<String>,
}

/// Pick the entry that best matches the object's current flags
///
/// An entry qualifies when all of its conditions are present; among qualifying
/// entries the one with the most conditions wins, earlier entries winning ties.
pub fn find_best_armor_set<'a>(
    sets: &'a [ArmorSetEntry],
    flags: &FlagSet<ArmorSetFlag>,
) -> Option<&'a ArmorSetEntry> {
    let mut best: Option<&ArmorSetEntry> = None;
    for entry in sets {
        if !flags.test_for_all(&entry.conditions) {
            continue;
        }
        let better = match best {
            Some(current) => entry.conditions.count() > current.conditions.count(),
            None => true,
        };
        if better {
            best = Some(entry);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(conditions: &[ArmorSetFlag], armor: &str) -> ArmorSetEntry {
        ArmorSetEntry {
            conditions: FlagSet::of(conditions),
            armor: Some(armor.to_string()),
        }
    }

    #[test]
    fn test_default_set_when_no_flags() {
        let sets = vec![
            entry(&[], "Basic"),
            entry(&[ArmorSetFlag::PlayerUpgrade], "Composite"),
        ];
        let best = find_best_armor_set(&sets, &FlagSet::new()).unwrap();
        assert_eq!(best.armor.as_deref(), Some("Basic"));
    }

    #[test]
    fn test_most_specific_set_wins() {
        let sets = vec![
            entry(&[], "Basic"),
            entry(&[ArmorSetFlag::PlayerUpgrade], "Composite"),
            entry(&[ArmorSetFlag::PlayerUpgrade, ArmorSetFlag::Veteran], "VeteranComposite"),
        ];
        let flags = FlagSet::of(&[ArmorSetFlag::PlayerUpgrade, ArmorSetFlag::Veteran]);
        let best = find_best_armor_set(&sets, &flags).unwrap();
        assert_eq!(best.armor.as_deref(), Some("VeteranComposite"));

        let flags = FlagSet::of(&[ArmorSetFlag::PlayerUpgrade, ArmorSetFlag::Elite]);
        let best = find_best_armor_set(&sets, &flags).unwrap();
        assert_eq!(best.armor.as_deref(), Some("Composite"));
    }

    #[test]
    fn test_no_qualifying_set() {
        let sets = vec![entry(&[ArmorSetFlag::SecondLife], "Ghost")];
        assert!(find_best_armor_set(&sets, &FlagSet::new()).is_none());
    }
}
