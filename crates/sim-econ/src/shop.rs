//! Shop: atomic check-then-deduct purchases that create new entities.

use crate::{ignored, Catalog, Ignored, Outcome, Reward, Transition};
use chrono::{DateTime, Utc};
use sim_core::{Animal, EconomyState, GrowthStage, Plant};
use tracing::info;

/// Hunger of every newly adopted animal.
pub const INITIAL_HUNGER: f64 = 50.0;
/// Happiness of every newly adopted animal.
pub const INITIAL_HAPPINESS: f64 = 50.0;

/// One row of the shop for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    pub index: usize,
    pub label: String,
    pub price: u64,
    pub affordable: bool,
}

fn charge(state: &mut EconomyState, price: u64) -> Result<(), Ignored> {
    if state.currency < price {
        return Err(Ignored::InsufficientFunds {
            price,
            available: state.currency,
        });
    }
    state.currency -= price;
    Ok(())
}

/// Buy seeds at `index` and plant them at `now`.
pub fn purchase_plant(
    mut state: EconomyState,
    catalog: &Catalog,
    index: usize,
    now: DateTime<Utc>,
) -> Transition {
    let Some(offer) = catalog.plant_offer(index) else {
        return ignored(state, Ignored::UnknownOffer(index));
    };
    if let Err(reason) = charge(&mut state, offer.price) {
        return ignored(state, reason);
    }
    let id = state.allocate_id();
    state.plants.push(Plant {
        id,
        kind: offer.kind,
        stage: GrowthStage::Seed,
        water_level: 0,
        planted_at: now,
    });
    info!(%id, kind = %offer.kind, price = offer.price, "planted seeds");
    let reward = Reward {
        coins_spent: offer.price,
        created: Some(id),
        ..Reward::default()
    };
    (state, Outcome::Applied(reward))
}

/// Adopt the animal at `index`.
pub fn purchase_animal(mut state: EconomyState, catalog: &Catalog, index: usize) -> Transition {
    let Some(offer) = catalog.animal_offer(index) else {
        return ignored(state, Ignored::UnknownOffer(index));
    };
    if let Err(reason) = charge(&mut state, offer.price) {
        return ignored(state, reason);
    }
    let id = state.allocate_id();
    state.animals.push(Animal {
        id,
        kind: offer.kind,
        hunger: INITIAL_HUNGER,
        happiness: INITIAL_HAPPINESS,
    });
    info!(%id, kind = %offer.kind, price = offer.price, "adopted animal");
    let reward = Reward {
        coins_spent: offer.price,
        created: Some(id),
        ..Reward::default()
    };
    (state, Outcome::Applied(reward))
}

pub fn plant_listings(catalog: &Catalog, state: &EconomyState) -> Vec<Listing> {
    catalog
        .plants
        .iter()
        .enumerate()
        .map(|(index, o)| Listing {
            index,
            label: o.label(),
            price: o.price,
            affordable: state.currency >= o.price,
        })
        .collect()
}

pub fn animal_listings(catalog: &Catalog, state: &EconomyState) -> Vec<Listing> {
    catalog
        .animals
        .iter()
        .enumerate()
        .map(|(index, o)| Listing {
            index,
            label: o.kind.to_string(),
            price: o.price,
            affordable: state.currency >= o.price,
        })
        .collect()
}
