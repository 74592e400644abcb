#![deny(warnings)]

//! Economy rules for Garden & Shelter.
//!
//! Every player action and the periodic tick is a transform that consumes the
//! current [`EconomyState`] and returns the next one together with an
//! out-of-band [`Outcome`] (rewards for display, or why nothing happened).
//! Invalid actions never fail: they hand back the state untouched.
//!
//! - [`garden`]: watering and harvesting plants
//! - [`shelter`]: feeding, playing, and the decay/passive-income tick
//! - [`shop`]: catalog purchases
//! - [`catalog`]: static offer configuration
//! - [`draw`]: injectable random source for the tick

pub mod catalog;
pub mod draw;
pub mod garden;
pub mod shelter;
pub mod shop;

pub use catalog::{AnimalOffer, Catalog, CatalogError, PlantOffer};
pub use draw::{seeded, Draw, ScriptedDraws};
pub use garden::{harvest_plant, harvest_preview, water_plant};
pub use shelter::{feed_animal, play_with_animal, tick, TickReport};
pub use shop::{animal_listings, plant_listings, purchase_animal, purchase_plant, Listing};

use sim_core::{EconomyState, EntityId, GrowthStage, LevelUp};
use thiserror::Error;

/// Result of a player action applied to the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The action changed the state.
    Applied(Reward),
    /// The action was a no-op; the state is unchanged.
    Ignored(Ignored),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn reward(&self) -> Option<&Reward> {
        match self {
            Outcome::Applied(r) => Some(r),
            Outcome::Ignored(_) => None,
        }
    }
}

/// Values surfaced to the caller for feedback; not part of the state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reward {
    /// Experience awarded.
    pub experience: u64,
    /// Coins earned.
    pub coins_earned: u64,
    /// Coins spent.
    pub coins_spent: u64,
    /// Entity created by a purchase.
    pub created: Option<EntityId>,
    /// Stage reached when a watering advanced the plant.
    pub advanced_to: Option<GrowthStage>,
    /// Level change caused by the experience award.
    pub level_up: Option<LevelUp>,
}

/// Why an action left the state unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Ignored {
    #[error("no plant with id {0}")]
    UnknownPlant(EntityId),
    #[error("no animal with id {0}")]
    UnknownAnimal(EntityId),
    #[error("plant {0} is ready to harvest and takes no more water")]
    AlreadyHarvestable(EntityId),
    #[error("plant {id} is still at stage {stage:?}")]
    NotHarvestable { id: EntityId, stage: GrowthStage },
    #[error("no catalog offer at index {0}")]
    UnknownOffer(usize),
    #[error("price {price} exceeds available {available}")]
    InsufficientFunds { price: u64, available: u64 },
}

/// A transform's output: the next state and what happened.
pub type Transition = (EconomyState, Outcome);

pub(crate) fn ignored(state: EconomyState, reason: Ignored) -> Transition {
    tracing::debug!(%reason, "action ignored");
    (state, Outcome::Ignored(reason))
}
