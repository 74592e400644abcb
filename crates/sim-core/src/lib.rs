#![deny(warnings)]

//! Core domain models and invariants for Garden & Shelter.
//!
//! This crate defines the serializable economy state shared by every other
//! crate, the progression ledger that turns experience into levels, and
//! validation helpers used to reject malformed saves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Experience needed per level: reaching level `n + 1` costs `n * 100`.
pub const EXPERIENCE_PER_LEVEL: u64 = 100;
/// Currency granted to a fresh (or recovered blank) garden.
pub const STARTING_CURRENCY: u64 = 15;
/// Water level at which a plant advances to its next stage.
pub const MAX_WATER: u32 = 100;
/// Upper bound for animal hunger and happiness.
pub const MAX_STAT: f64 = 100.0;
/// Fixed key the whole state is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "gardenGame";

/// Stable identity of a plant or animal. Never reused within a save.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Crops that can be planted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlantKind {
    Tomato,
    Carrot,
    Sunflower,
    Strawberry,
    Pumpkin,
    Rose,
}

impl PlantKind {
    /// Every crop in shop order.
    pub const ALL: [PlantKind; 6] = [
        PlantKind::Tomato,
        PlantKind::Carrot,
        PlantKind::Sunflower,
        PlantKind::Strawberry,
        PlantKind::Pumpkin,
        PlantKind::Rose,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PlantKind::Tomato => "Tomato",
            PlantKind::Carrot => "Carrot",
            PlantKind::Sunflower => "Sunflower",
            PlantKind::Strawberry => "Strawberry",
            PlantKind::Pumpkin => "Pumpkin",
            PlantKind::Rose => "Rose",
        }
    }
}

impl fmt::Display for PlantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Animals that can be adopted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimalKind {
    Rabbit,
    Cat,
    Dog,
    Chicken,
    Pig,
    Duck,
}

impl AnimalKind {
    /// Every animal in shop order.
    pub const ALL: [AnimalKind; 6] = [
        AnimalKind::Rabbit,
        AnimalKind::Cat,
        AnimalKind::Dog,
        AnimalKind::Chicken,
        AnimalKind::Pig,
        AnimalKind::Duck,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnimalKind::Rabbit => "Rabbit",
            AnimalKind::Cat => "Cat",
            AnimalKind::Dog => "Dog",
            AnimalKind::Chicken => "Chicken",
            AnimalKind::Pig => "Pig",
            AnimalKind::Duck => "Duck",
        }
    }
}

impl fmt::Display for AnimalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Discrete growth phase of a plant. Serialized as its number (0..=3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GrowthStage {
    Seed = 0,
    Sprout = 1,
    Growing = 2,
    /// Terminal stage: the plant only accepts a harvest.
    Harvestable = 3,
}

impl GrowthStage {
    /// Display label for the stage.
    pub fn label(self) -> &'static str {
        match self {
            GrowthStage::Seed => "Seed",
            GrowthStage::Sprout => "Sprout",
            GrowthStage::Growing => "Growing",
            GrowthStage::Harvestable => "Harvestable",
        }
    }

    /// Next stage; `Harvestable` stays put.
    #[must_use]
    pub fn advance(self) -> Self {
        match self {
            GrowthStage::Seed => GrowthStage::Sprout,
            GrowthStage::Sprout => GrowthStage::Growing,
            GrowthStage::Growing | GrowthStage::Harvestable => GrowthStage::Harvestable,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == GrowthStage::Harvestable
    }
}

impl TryFrom<u8> for GrowthStage {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GrowthStage::Seed),
            1 => Ok(GrowthStage::Sprout),
            2 => Ok(GrowthStage::Growing),
            3 => Ok(GrowthStage::Harvestable),
            other => Err(ValidationError::StageOutOfRange(other)),
        }
    }
}

impl From<GrowthStage> for u8 {
    fn from(stage: GrowthStage) -> u8 {
        stage as u8
    }
}

/// A planted crop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    /// Unique id assigned at purchase.
    pub id: EntityId,
    /// Crop kind.
    pub kind: PlantKind,
    /// Current growth phase.
    pub stage: GrowthStage,
    /// Water accumulated towards the next stage, in [0, 100].
    pub water_level: u32,
    /// Purchase time, stored as epoch milliseconds. Display only.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub planted_at: DateTime<Utc>,
}

/// An adopted animal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    /// Unique id assigned at adoption.
    pub id: EntityId,
    /// Animal kind.
    pub kind: AnimalKind,
    /// Hunger in [0, 100]; rises every tick.
    pub hunger: f64,
    /// Happiness in [0, 100]; falls every tick.
    pub happiness: f64,
}

/// Level and experience of the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    /// Current level (>= 1).
    pub level: u32,
    /// Experience into the current level, always below `experience_to_next()`.
    pub experience: u64,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
        }
    }
}

impl Progression {
    /// Experience required to leave the current level.
    pub fn experience_to_next(&self) -> u64 {
        u64::from(self.level.max(1)) * EXPERIENCE_PER_LEVEL
    }

    /// Fill ratio of the experience bar in [0, 1].
    pub fn progress_fraction(&self) -> f64 {
        (self.experience as f64 / self.experience_to_next() as f64).min(1.0)
    }

    /// Add experience and roll every full threshold into a level.
    ///
    /// A single large award may cross several levels.
    #[must_use]
    pub fn award(self, amount: u64) -> Self {
        let mut level = self.level.max(1);
        let mut experience = self.experience.saturating_add(amount);
        loop {
            let threshold = u64::from(level) * EXPERIENCE_PER_LEVEL;
            if experience < threshold {
                break;
            }
            experience -= threshold;
            level = level.saturating_add(1);
        }
        Self { level, experience }
    }
}

/// Level change produced by an experience award.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub from: u32,
    pub to: u32,
}

/// Whole economy: currency, id allocator, progression, and both collections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomyState {
    /// Spendable coins.
    pub currency: u64,
    /// Id handed to the next created plant or animal.
    pub next_id: EntityId,
    /// Level and experience.
    pub progression: Progression,
    /// Garden contents in planting order.
    pub plants: Vec<Plant>,
    /// Shelter contents in adoption order.
    pub animals: Vec<Animal>,
}

impl Default for EconomyState {
    fn default() -> Self {
        Self {
            currency: STARTING_CURRENCY,
            next_id: EntityId(1),
            progression: Progression::default(),
            plants: Vec::new(),
            animals: Vec::new(),
        }
    }
}

impl EconomyState {
    pub fn plant(&self, id: EntityId) -> Option<&Plant> {
        self.plants.iter().find(|p| p.id == id)
    }

    pub fn animal(&self, id: EntityId) -> Option<&Animal> {
        self.animals.iter().find(|a| a.id == id)
    }

    /// Hand out the next id and advance the counter.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id = EntityId(id.0.saturating_add(1));
        id
    }

    /// Broke with nothing planted or adopted.
    pub fn is_blank(&self) -> bool {
        self.currency == 0 && self.plants.is_empty() && self.animals.is_empty()
    }
}

/// Progression ledger: award experience to a state.
///
/// Returns the new state and, when at least one threshold was crossed, the
/// level change for the one-time notification.
pub fn award_experience(mut state: EconomyState, amount: u64) -> (EconomyState, Option<LevelUp>) {
    let before = state.progression;
    state.progression = before.award(amount);
    let change = (state.progression.level > before.level).then_some(LevelUp {
        from: before.level,
        to: state.progression.level,
    });
    (state, change)
}

/// Simulation configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Milliseconds between periodic ticks (reference cadence: 10 s).
    pub tick_interval_ms: u64,
    /// Seed for the deterministic passive-income draws.
    pub rng_seed: u64,
    /// Key the state is saved under.
    pub storage_key: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10_000,
            rng_seed: 42,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl SimConfig {
    /// Tick period, never zero.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Level must start at 1.
    #[error("level must be >= 1")]
    ZeroLevel,
    /// Experience was not normalized into levels.
    #[error("experience {experience} is not below {threshold} at level {level}")]
    UnnormalizedExperience {
        level: u32,
        experience: u64,
        threshold: u64,
    },
    /// Growth stage outside [0, 3].
    #[error("growth stage {0} is out of range [0,3]")]
    StageOutOfRange(u8),
    /// Water above the cap.
    #[error("plant {id} water level {level} exceeds 100")]
    WaterOutOfRange { id: EntityId, level: u32 },
    /// Hunger or happiness outside [0, 100] or not finite.
    #[error("animal {id} {stat} = {value} is outside [0,100]")]
    StatOutOfRange {
        id: EntityId,
        stat: &'static str,
        value: f64,
    },
    /// Two entities share an id.
    #[error("duplicate entity id {0}")]
    DuplicateId(EntityId),
    /// Entity id was never handed out by the allocator.
    #[error("entity id {id} is not below next id {next}")]
    IdNotAllocated { id: EntityId, next: EntityId },
}

/// Validate progression fields.
pub fn validate_progression(p: &Progression) -> Result<(), ValidationError> {
    if p.level == 0 {
        return Err(ValidationError::ZeroLevel);
    }
    let threshold = p.experience_to_next();
    if p.experience >= threshold {
        return Err(ValidationError::UnnormalizedExperience {
            level: p.level,
            experience: p.experience,
            threshold,
        });
    }
    Ok(())
}

/// Validate a plant.
pub fn validate_plant(p: &Plant) -> Result<(), ValidationError> {
    if p.water_level > MAX_WATER {
        return Err(ValidationError::WaterOutOfRange {
            id: p.id,
            level: p.water_level,
        });
    }
    Ok(())
}

/// Validate an animal.
pub fn validate_animal(a: &Animal) -> Result<(), ValidationError> {
    for (stat, value) in [("hunger", a.hunger), ("happiness", a.happiness)] {
        if !(0.0..=MAX_STAT).contains(&value) {
            return Err(ValidationError::StatOutOfRange {
                id: a.id,
                stat,
                value,
            });
        }
    }
    Ok(())
}

/// Validate the whole state, including id uniqueness and allocation.
pub fn validate_state(state: &EconomyState) -> Result<(), ValidationError> {
    validate_progression(&state.progression)?;
    let mut ids: BTreeSet<EntityId> = BTreeSet::new();
    let plant_ids = state.plants.iter().map(|p| validate_plant(p).map(|_| p.id));
    let animal_ids = state
        .animals
        .iter()
        .map(|a| validate_animal(a).map(|_| a.id));
    for id in plant_ids.chain(animal_ids) {
        let id = id?;
        if !ids.insert(id) {
            return Err(ValidationError::DuplicateId(id));
        }
        if id >= state.next_id {
            return Err(ValidationError::IdNotAllocated {
                id,
                next: state.next_id,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn planted() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    fn sample_state() -> EconomyState {
        EconomyState {
            currency: 120,
            next_id: EntityId(3),
            progression: Progression {
                level: 2,
                experience: 40,
            },
            plants: vec![Plant {
                id: EntityId(1),
                kind: PlantKind::Rose,
                stage: GrowthStage::Sprout,
                water_level: 50,
                planted_at: planted(),
            }],
            animals: vec![Animal {
                id: EntityId(2),
                kind: AnimalKind::Duck,
                hunger: 51.0,
                happiness: 49.5,
            }],
        }
    }

    #[test]
    fn fresh_state_matches_starting_grant() {
        let s = EconomyState::default();
        assert_eq!(s.currency, 15);
        assert_eq!(s.next_id, EntityId(1));
        assert_eq!(s.progression, Progression { level: 1, experience: 0 });
        assert!(s.plants.is_empty() && s.animals.is_empty());
        validate_state(&s).unwrap();
    }

    #[test]
    fn award_crosses_several_levels_at_once() {
        // 100 (1->2) + 200 (2->3) + 300 (3->4) = 600, 50 left over
        let p = Progression::default().award(650);
        assert_eq!(p, Progression { level: 4, experience: 50 });
    }

    #[test]
    fn award_exactly_at_threshold_levels_up() {
        let p = Progression { level: 1, experience: 95 }.award(5);
        assert_eq!(p, Progression { level: 2, experience: 0 });
    }

    #[test]
    fn ledger_reports_level_change_only_when_crossed() {
        let (s, change) = award_experience(EconomyState::default(), 99);
        assert!(change.is_none());
        let (s, change) = award_experience(s, 1);
        assert_eq!(change, Some(LevelUp { from: 1, to: 2 }));
        assert_eq!(s.progression.experience, 0);
    }

    #[test]
    fn progress_fraction_of_bar() {
        let p = Progression { level: 2, experience: 50 };
        assert_eq!(p.experience_to_next(), 200);
        assert!((p.progress_fraction() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn stage_advances_and_stops_at_harvestable() {
        assert_eq!(GrowthStage::Seed.advance(), GrowthStage::Sprout);
        assert_eq!(GrowthStage::Growing.advance(), GrowthStage::Harvestable);
        assert_eq!(GrowthStage::Harvestable.advance(), GrowthStage::Harvestable);
        assert_eq!(GrowthStage::Growing.label(), "Growing");
    }

    #[test]
    fn allocate_id_is_monotonic() {
        let mut s = EconomyState::default();
        assert_eq!(s.allocate_id(), EntityId(1));
        assert_eq!(s.allocate_id(), EntityId(2));
        assert_eq!(s.next_id, EntityId(3));
    }

    #[test]
    fn state_snapshot_roundtrip() {
        let s = sample_state();
        validate_state(&s).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"planted_at\":1700000000000"));
        assert!(json.contains("\"stage\":1"));
        let back: EconomyState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn stage_out_of_range_is_rejected_on_decode() {
        let json = serde_json::to_string(&sample_state())
            .unwrap()
            .replace("\"stage\":1", "\"stage\":4");
        assert!(serde_json::from_str::<EconomyState>(&json).is_err());
    }

    #[test]
    fn validation_catches_duplicates_and_unallocated_ids() {
        let mut s = sample_state();
        s.animals[0].id = EntityId(1);
        assert_eq!(
            validate_state(&s),
            Err(ValidationError::DuplicateId(EntityId(1)))
        );
        let mut s = sample_state();
        s.next_id = EntityId(2);
        assert!(matches!(
            validate_state(&s),
            Err(ValidationError::IdNotAllocated { .. })
        ));
    }

    #[test]
    fn validation_catches_out_of_range_values() {
        let mut s = sample_state();
        s.plants[0].water_level = 101;
        assert!(matches!(
            validate_state(&s),
            Err(ValidationError::WaterOutOfRange { .. })
        ));
        let mut s = sample_state();
        s.animals[0].happiness = f64::NAN;
        assert!(matches!(
            validate_state(&s),
            Err(ValidationError::StatOutOfRange { stat: "happiness", .. })
        ));
        let mut s = sample_state();
        s.progression.experience = 200;
        assert!(matches!(
            validate_state(&s),
            Err(ValidationError::UnnormalizedExperience { .. })
        ));
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg: SimConfig = serde_json::from_str(r#"{"rng_seed": 7}"#).unwrap();
        assert_eq!(cfg.rng_seed, 7);
        assert_eq!(cfg.tick_interval(), Duration::from_secs(10));
        assert_eq!(cfg.storage_key, "gardenGame");
    }

    proptest! {
        #[test]
        fn award_keeps_experience_normalized(level in 1u32..500,
                                             frac in 0.0f64..1.0,
                                             amount in 0u64..1_000_000) {
            let threshold = u64::from(level) * EXPERIENCE_PER_LEVEL;
            let experience = ((threshold as f64) * frac) as u64 % threshold;
            let before = Progression { level, experience };
            let after = before.award(amount);
            prop_assert!(after.level >= before.level);
            prop_assert!(after.experience < after.experience_to_next());
            prop_assert!(validate_progression(&after).is_ok());
        }
    }
}
