//! Garden rules: watering drives growth, the final stage pays out once.

use crate::{ignored, Ignored, Outcome, Reward, Transition};
use sim_core::{award_experience, EconomyState, EntityId, MAX_WATER};
use tracing::debug;

/// Water added per watering.
pub const WATER_PER_ACTION: u32 = 25;
/// Experience for a successful watering.
pub const WATER_EXPERIENCE: u64 = 5;
/// Experience for a harvest.
pub const HARVEST_EXPERIENCE: u64 = 25;
/// Harvest coins before the level bonus.
pub const HARVEST_BASE_COINS: u64 = 20;
/// Harvest coins added per player level.
pub const HARVEST_COINS_PER_LEVEL: u64 = 5;

/// Coins a harvest pays at the state's current level.
pub fn harvest_preview(state: &EconomyState) -> u64 {
    HARVEST_BASE_COINS + u64::from(state.progression.level) * HARVEST_COINS_PER_LEVEL
}

/// Water a plant; reaching the cap advances its stage and empties it.
pub fn water_plant(mut state: EconomyState, id: EntityId) -> Transition {
    let Some(plant) = state.plants.iter_mut().find(|p| p.id == id) else {
        return ignored(state, Ignored::UnknownPlant(id));
    };
    if plant.stage.is_terminal() {
        return ignored(state, Ignored::AlreadyHarvestable(id));
    }
    plant.water_level = plant
        .water_level
        .saturating_add(WATER_PER_ACTION)
        .min(MAX_WATER);
    let mut advanced_to = None;
    if plant.water_level >= MAX_WATER {
        plant.stage = plant.stage.advance();
        plant.water_level = 0;
        advanced_to = Some(plant.stage);
    }
    debug!(%id, water = plant.water_level, stage = ?plant.stage, "watered plant");

    let (state, level_up) = award_experience(state, WATER_EXPERIENCE);
    let reward = Reward {
        experience: WATER_EXPERIENCE,
        advanced_to,
        level_up,
        ..Reward::default()
    };
    (state, Outcome::Applied(reward))
}

/// Harvest a ripe plant: remove it, pay coins at the pre-harvest level, then
/// award experience.
pub fn harvest_plant(mut state: EconomyState, id: EntityId) -> Transition {
    let Some(index) = state.plants.iter().position(|p| p.id == id) else {
        return ignored(state, Ignored::UnknownPlant(id));
    };
    let stage = state.plants[index].stage;
    if !stage.is_terminal() {
        return ignored(state, Ignored::NotHarvestable { id, stage });
    }
    let coins = harvest_preview(&state);
    let plant = state.plants.remove(index);
    state.currency = state.currency.saturating_add(coins);
    debug!(%id, kind = %plant.kind, coins, "harvested plant");

    let (state, level_up) = award_experience(state, HARVEST_EXPERIENCE);
    let reward = Reward {
        experience: HARVEST_EXPERIENCE,
        coins_earned: coins,
        level_up,
        ..Reward::default()
    };
    (state, Outcome::Applied(reward))
}
