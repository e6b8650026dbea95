//! Core enums, identifiers and small flag sets shared by every module

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Logic frame counter
pub type Frame = u32;

/// Simulation frames per second of game time
pub const LOGIC_FRAMES_PER_SECOND: u32 = 30;

/// Frame value used for "never expires"
pub const FOREVER: Frame = u32::MAX;

/// Convert a millisecond duration into (fractional) logic frames
pub fn msecs_to_frames(msecs: f64) -> f64 {
    msecs * LOGIC_FRAMES_PER_SECOND as f64 / 1000.0
}

/// Identifier of a simulated object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a player in the player list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerIndex(pub usize);

/// Anything that can live in a [`FlagSet`]
pub trait Flag: Copy + 'static {
    /// Every value, in bit order
    const ALL: &'static [Self];

    /// Bit position of this value (must be < 64)
    fn index(self) -> u32;
}

/// Small bitset over one of the flag enums
pub struct FlagSet<T> {
    bits: u64,
    marker: PhantomData<T>,
}

impl<T> Clone for FlagSet<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FlagSet<T> {}

impl<T> PartialEq for FlagSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T> Eq for FlagSet<T> {}

impl<T> Default for FlagSet<T> {
    fn default() -> Self {
        FlagSet {
            bits: 0,
            marker: PhantomData,
        }
    }
}

impl<T: Flag> FlagSet<T> {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set containing the given flags
    pub fn of(flags: &[T]) -> Self {
        flags.iter().copied().collect()
    }

    pub fn set(&mut self, flag: T) {
        self.bits |= 1 << flag.index();
    }

    pub fn clear(&mut self, flag: T) {
        self.bits &= !(1 << flag.index());
    }

    pub fn test(&self, flag: T) -> bool {
        self.bits & (1 << flag.index()) != 0
    }

    /// True if any bit is set
    pub fn any(&self) -> bool {
        self.bits != 0
    }

    /// True if at least one flag of `other` is also set here
    pub fn test_for_any(&self, other: &Self) -> bool {
        self.bits & other.bits != 0
    }

    /// True if every flag of `other` is also set here
    pub fn test_for_all(&self, other: &Self) -> bool {
        self.bits & other.bits == other.bits
    }

    /// Number of flags set
    pub fn count(&self) -> u32 {
        self.bits.count_ones()
    }

    /// Number of flags shared with `other`
    pub fn count_common(&self, other: &Self) -> u32 {
        (self.bits & other.bits).count_ones()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        T::ALL.iter().copied().filter(move |f| self.test(*f))
    }
}

impl<T: Flag> FromIterator<T> for FlagSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = FlagSet::new();
        for flag in iter {
            set.set(flag);
        }
        set
    }
}

impl<T: Flag + fmt::Debug> fmt::Debug for FlagSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Flag + Serialize> Serialize for FlagSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Flag + Deserialize<'de>> Deserialize<'de> for FlagSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flags = Vec::<T>::deserialize(deserializer)?;
        Ok(flags.into_iter().collect())
    }
}

/// Built-in damage categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Explosion,
    Crush,
    ArmorPiercing,
    SmallArms,
    Gattling,
    Radiation,
    Flame,
    Laser,
    Sniper,
    Poison,
    Healing,
    Unresistable,
    Water,
    Deploy,
    Surrender,
    Hack,
    KillPilot,
    Penalty,
    Falling,
    Melee,
    Disarm,
    HazardCleanup,
    ParticleBeam,
    Toppling,
    InfantryMissile,
    AuroraBomb,
    LandMine,
    JetMissiles,
    StealthjetMissiles,
    MolotovCocktail,
    ComancheVulcan,
    SubdualMissile,
    SubdualVehicle,
    SubdualBuilding,
    SubdualUnresistable,
    Microwave,
    KillGarrisoned,
    Status,
    ChronoGun,
    ChronoUnresistable,
}

impl DamageType {
    pub const ALL: &'static [DamageType] = &[
        DamageType::Explosion,
        DamageType::Crush,
        DamageType::ArmorPiercing,
        DamageType::SmallArms,
        DamageType::Gattling,
        DamageType::Radiation,
        DamageType::Flame,
        DamageType::Laser,
        DamageType::Sniper,
        DamageType::Poison,
        DamageType::Healing,
        DamageType::Unresistable,
        DamageType::Water,
        DamageType::Deploy,
        DamageType::Surrender,
        DamageType::Hack,
        DamageType::KillPilot,
        DamageType::Penalty,
        DamageType::Falling,
        DamageType::Melee,
        DamageType::Disarm,
        DamageType::HazardCleanup,
        DamageType::ParticleBeam,
        DamageType::Toppling,
        DamageType::InfantryMissile,
        DamageType::AuroraBomb,
        DamageType::LandMine,
        DamageType::JetMissiles,
        DamageType::StealthjetMissiles,
        DamageType::MolotovCocktail,
        DamageType::ComancheVulcan,
        DamageType::SubdualMissile,
        DamageType::SubdualVehicle,
        DamageType::SubdualBuilding,
        DamageType::SubdualUnresistable,
        DamageType::Microwave,
        DamageType::KillGarrisoned,
        DamageType::Status,
        DamageType::ChronoGun,
        DamageType::ChronoUnresistable,
    ];

    /// Number of built-in damage types
    pub const COUNT: usize = DamageType::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    /// Data-file name of this damage type
    pub fn name(self) -> &'static str {
        match self {
            DamageType::Explosion => "explosion",
            DamageType::Crush => "crush",
            DamageType::ArmorPiercing => "armor_piercing",
            DamageType::SmallArms => "small_arms",
            DamageType::Gattling => "gattling",
            DamageType::Radiation => "radiation",
            DamageType::Flame => "flame",
            DamageType::Laser => "laser",
            DamageType::Sniper => "sniper",
            DamageType::Poison => "poison",
            DamageType::Healing => "healing",
            DamageType::Unresistable => "unresistable",
            DamageType::Water => "water",
            DamageType::Deploy => "deploy",
            DamageType::Surrender => "surrender",
            DamageType::Hack => "hack",
            DamageType::KillPilot => "kill_pilot",
            DamageType::Penalty => "penalty",
            DamageType::Falling => "falling",
            DamageType::Melee => "melee",
            DamageType::Disarm => "disarm",
            DamageType::HazardCleanup => "hazard_cleanup",
            DamageType::ParticleBeam => "particle_beam",
            DamageType::Toppling => "toppling",
            DamageType::InfantryMissile => "infantry_missile",
            DamageType::AuroraBomb => "aurora_bomb",
            DamageType::LandMine => "land_mine",
            DamageType::JetMissiles => "jet_missiles",
            DamageType::StealthjetMissiles => "stealthjet_missiles",
            DamageType::MolotovCocktail => "molotov_cocktail",
            DamageType::ComancheVulcan => "comanche_vulcan",
            DamageType::SubdualMissile => "subdual_missile",
            DamageType::SubdualVehicle => "subdual_vehicle",
            DamageType::SubdualBuilding => "subdual_building",
            DamageType::SubdualUnresistable => "subdual_unresistable",
            DamageType::Microwave => "microwave",
            DamageType::KillGarrisoned => "kill_garrisoned",
            DamageType::Status => "status",
            DamageType::ChronoGun => "chrono_gun",
            DamageType::ChronoUnresistable => "chrono_unresistable",
        }
    }

    /// Look up a damage type by its data-file name
    pub fn from_name(name: &str) -> Option<DamageType> {
        DamageType::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Types that ignore every armor coefficient
    pub fn is_unresistable(self) -> bool {
        matches!(
            self,
            DamageType::Unresistable
                | DamageType::SubdualUnresistable
                | DamageType::ChronoUnresistable
        )
    }

    /// Types that fill the subdual pool instead of removing health
    pub fn is_subdual(self) -> bool {
        matches!(
            self,
            DamageType::SubdualMissile
                | DamageType::SubdualVehicle
                | DamageType::SubdualBuilding
                | DamageType::SubdualUnresistable
        )
    }

    /// Types that fill the chrono pool
    pub fn is_chrono(self) -> bool {
        matches!(self, DamageType::ChronoGun | DamageType::ChronoUnresistable)
    }

    /// Kind a subdual type is restricted to, if any
    pub fn subdual_target_kind(self) -> Option<KindOf> {
        match self {
            DamageType::SubdualMissile => Some(KindOf::Projectile),
            DamageType::SubdualVehicle => Some(KindOf::Vehicle),
            DamageType::SubdualBuilding => Some(KindOf::Structure),
            _ => None,
        }
    }
}

/// How an object died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathType {
    #[default]
    Normal,
    Crushed,
    Burned,
    Exploded,
    Poisoned,
    Toppled,
    Lasered,
    Suicided,
    Chrono,
}

/// Object status bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStatus {
    Destroyed,
    UnderConstruction,
    Stealthed,
    Detected,
    Airborne,
    Garrisoned,
    Deployed,
    IsUsingAbility,
    Burned,
    Poisoned,
    FaerieFire,
    BoobyTrapped,
    Repulsor,
    Hijacked,
    Reloading,
}

impl Flag for ObjectStatus {
    const ALL: &'static [Self] = &[
        ObjectStatus::Destroyed,
        ObjectStatus::UnderConstruction,
        ObjectStatus::Stealthed,
        ObjectStatus::Detected,
        ObjectStatus::Airborne,
        ObjectStatus::Garrisoned,
        ObjectStatus::Deployed,
        ObjectStatus::IsUsingAbility,
        ObjectStatus::Burned,
        ObjectStatus::Poisoned,
        ObjectStatus::FaerieFire,
        ObjectStatus::BoobyTrapped,
        ObjectStatus::Repulsor,
        ObjectStatus::Hijacked,
        ObjectStatus::Reloading,
    ];

    fn index(self) -> u32 {
        self as u32
    }
}

impl ObjectStatus {
    pub const COUNT: usize = <ObjectStatus as Flag>::ALL.len();
}

/// Conditions that grant weapon (and armor) bonuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponBonusCondition {
    Garrisoned,
    Horde,
    ContinuousFire,
    Nationalism,
    PlayerUpgrade,
    DroneSpotting,
    Veteran,
    Elite,
    Hero,
    BattleplanBombardment,
    BattleplanHoldTheLine,
    BattleplanSearchAndDestroy,
    Subliminal,
    Frenzy,
}

impl Flag for WeaponBonusCondition {
    const ALL: &'static [Self] = &[
        WeaponBonusCondition::Garrisoned,
        WeaponBonusCondition::Horde,
        WeaponBonusCondition::ContinuousFire,
        WeaponBonusCondition::Nationalism,
        WeaponBonusCondition::PlayerUpgrade,
        WeaponBonusCondition::DroneSpotting,
        WeaponBonusCondition::Veteran,
        WeaponBonusCondition::Elite,
        WeaponBonusCondition::Hero,
        WeaponBonusCondition::BattleplanBombardment,
        WeaponBonusCondition::BattleplanHoldTheLine,
        WeaponBonusCondition::BattleplanSearchAndDestroy,
        WeaponBonusCondition::Subliminal,
        WeaponBonusCondition::Frenzy,
    ];

    fn index(self) -> u32 {
        self as u32
    }
}

impl WeaponBonusCondition {
    pub const COUNT: usize = <WeaponBonusCondition as Flag>::ALL.len();
}

/// Object kinds from the template
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindOf {
    Structure,
    Infantry,
    Vehicle,
    Aircraft,
    Drone,
    Projectile,
    FsFactionStructure,
    FsBaseDefense,
    Powered,
    CanAttack,
    Immobile,
}

impl Flag for KindOf {
    const ALL: &'static [Self] = &[
        KindOf::Structure,
        KindOf::Infantry,
        KindOf::Vehicle,
        KindOf::Aircraft,
        KindOf::Drone,
        KindOf::Projectile,
        KindOf::FsFactionStructure,
        KindOf::FsBaseDefense,
        KindOf::Powered,
        KindOf::CanAttack,
        KindOf::Immobile,
    ];

    fn index(self) -> u32 {
        self as u32
    }
}

/// Reasons an object can be disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledType {
    Emp,
    Hacked,
    Unmanned,
    #[default]
    Subdued,
    Chrono,
    Paralyzed,
    Underpowered,
    Held,
    Frozen,
}

/// Conditions that select an armor set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorSetFlag {
    Veteran,
    Elite,
    Hero,
    PlayerUpgrade,
    WeakVersusBaseDefenses,
    SecondLife,
    CrateUpgradeOne,
    CrateUpgradeTwo,
}

impl Flag for ArmorSetFlag {
    const ALL: &'static [Self] = &[
        ArmorSetFlag::Veteran,
        ArmorSetFlag::Elite,
        ArmorSetFlag::Hero,
        ArmorSetFlag::PlayerUpgrade,
        ArmorSetFlag::WeakVersusBaseDefenses,
        ArmorSetFlag::SecondLife,
        ArmorSetFlag::CrateUpgradeOne,
        ArmorSetFlag::CrateUpgradeTwo,
    ];

    fn index(self) -> u32 {
        self as u32
    }
}

/// Ordered body damage state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyDamageType {
    #[default]
    Pristine,
    Damaged,
    ReallyDamaged,
    Rubble,
}

impl BodyDamageType {
    pub fn name(self) -> &'static str {
        match self {
            BodyDamageType::Pristine => "Pristine",
            BodyDamageType::Damaged => "Damaged",
            BodyDamageType::ReallyDamaged => "Really damaged",
            BodyDamageType::Rubble => "Rubble",
        }
    }
}

/// What happens to current health when max health changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxHealthChangeType {
    #[default]
    SameCurrentHealth,
    PreserveRatio,
    AddCurrentHealthToo,
    FullyHeal,
}

/// Relationship between two players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Allies,
    Neutral,
    Enemies,
}

/// Veterancy level of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VeterancyLevel {
    #[default]
    Regular,
    Veteran,
    Elite,
    Heroic,
}

impl VeterancyLevel {
    pub const ALL: &'static [VeterancyLevel] = &[
        VeterancyLevel::Regular,
        VeterancyLevel::Veteran,
        VeterancyLevel::Elite,
        VeterancyLevel::Heroic,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Armor set flag granted at this level
    pub fn armor_set_flag(self) -> Option<ArmorSetFlag> {
        match self {
            VeterancyLevel::Regular => None,
            VeterancyLevel::Veteran => Some(ArmorSetFlag::Veteran),
            VeterancyLevel::Elite => Some(ArmorSetFlag::Elite),
            VeterancyLevel::Heroic => Some(ArmorSetFlag::Hero),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_type_names_round_trip() {
        for t in DamageType::ALL {
            assert_eq!(DamageType::from_name(t.name()), Some(*t));
        }
        assert_eq!(DamageType::from_name("not_a_type"), None);
    }

    #[test]
    fn test_damage_type_indices_are_dense() {
        for (i, t) in DamageType::ALL.iter().enumerate() {
            assert_eq!(t.index(), i);
        }
    }

    #[test]
    fn test_unresistable_kinds() {
        assert!(DamageType::Unresistable.is_unresistable());
        assert!(DamageType::SubdualUnresistable.is_unresistable());
        assert!(DamageType::ChronoUnresistable.is_unresistable());
        assert!(!DamageType::Explosion.is_unresistable());
    }

    #[test]
    fn test_flag_set_any_all() {
        let set = FlagSet::of(&[KindOf::Vehicle, KindOf::CanAttack]);
        assert!(set.test(KindOf::Vehicle));
        assert!(!set.test(KindOf::Aircraft));
        assert!(set.test_for_any(&FlagSet::of(&[KindOf::Aircraft, KindOf::Vehicle])));
        assert!(!set.test_for_all(&FlagSet::of(&[KindOf::Aircraft, KindOf::Vehicle])));
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn test_flag_set_serializes_as_list() {
        let set = FlagSet::of(&[ObjectStatus::Stealthed, ObjectStatus::Garrisoned]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["stealthed","garrisoned"]"#);
        let back: FlagSet<ObjectStatus> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_msecs_to_frames() {
        assert!((msecs_to_frames(1000.0) - 30.0).abs() < f64::EPSILON);
    }
}
