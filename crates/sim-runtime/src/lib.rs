#![deny(warnings)]

//! ECS-hosted runtime for the garden economy.
//!
//! A [`Simulation`] owns the single canonical [`EconomyState`] inside a
//! `bevy_ecs` world and commits one command at a time. The periodic tick runs
//! as a system on a single-threaded schedule. [`SharedSimulation`] serializes
//! commands from several threads (player input, [`Ticker`]) through one lock.

pub mod command;
pub mod ticker;

pub use command::{Action, Command, ParseCommandError};
pub use ticker::Ticker;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use chrono::{DateTime, Utc};
use sim_core::{EconomyState, LevelUp, SimConfig};
use sim_econ::{Catalog, Draw, Outcome, TickReport};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Canonical economy state.
#[derive(Resource, Default)]
pub struct Economy(pub EconomyState);

/// Random source consumed by the tick.
#[derive(Resource)]
pub struct TickDraws(pub Box<dyn Draw + Send + Sync>);

/// Running counters, exposed for status output.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub ticks: u64,
    pub passive_income: u64,
    pub actions_applied: u64,
    pub actions_ignored: u64,
    pub last_tick: TickReport,
}

/// Level-ups not yet shown to the player.
#[derive(Resource, Default)]
pub struct PendingLevelUps(pub Vec<LevelUp>);

fn tick_system(
    mut economy: ResMut<Economy>,
    mut draws: ResMut<TickDraws>,
    mut stats: ResMut<Stats>,
) {
    let state = std::mem::take(&mut economy.0);
    let (next, report) = sim_econ::tick(state, &mut *draws.0);
    economy.0 = next;
    stats.ticks += 1;
    stats.passive_income += report.bonus;
    stats.last_tick = report;
}

/// What a committed command did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Commit {
    Action(Outcome),
    Tick(TickReport),
}

/// Single-writer simulation: every command sees the previous one's result.
pub struct Simulation {
    world: World,
    tick_schedule: Schedule,
    catalog: Catalog,
}

impl Simulation {
    /// Seeded simulation as configured.
    pub fn new(state: EconomyState, catalog: Catalog, cfg: &SimConfig) -> Self {
        Self::with_draws(state, catalog, Box::new(sim_econ::seeded(cfg.rng_seed)))
    }

    /// Simulation with an explicit random source.
    pub fn with_draws(
        state: EconomyState,
        catalog: Catalog,
        draws: Box<dyn Draw + Send + Sync>,
    ) -> Self {
        let mut world = World::new();
        world.insert_resource(Economy(state));
        world.insert_resource(TickDraws(draws));
        world.insert_resource(Stats::default());
        world.insert_resource(PendingLevelUps::default());
        let mut tick_schedule = Schedule::default();
        tick_schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        tick_schedule.add_systems(tick_system);
        Self {
            world,
            tick_schedule,
            catalog,
        }
    }

    pub fn state(&self) -> &EconomyState {
        &self.world.resource::<Economy>().0
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn stats(&self) -> Stats {
        *self.world.resource::<Stats>()
    }

    pub fn into_state(mut self) -> EconomyState {
        std::mem::take(&mut self.world.resource_mut::<Economy>().0)
    }

    /// Level-ups since the last call, oldest first.
    pub fn drain_level_ups(&mut self) -> Vec<LevelUp> {
        std::mem::take(&mut self.world.resource_mut::<PendingLevelUps>().0)
    }

    /// Commit one command. `now` stamps newly planted seeds.
    pub fn apply(&mut self, command: Command, now: DateTime<Utc>) -> Commit {
        match command {
            Command::Tick => Commit::Tick(self.tick()),
            Command::Action(action) => Commit::Action(self.act(action, now)),
        }
    }

    /// Run the periodic tick system once.
    pub fn tick(&mut self) -> TickReport {
        self.tick_schedule.run(&mut self.world);
        self.world.resource::<Stats>().last_tick
    }

    /// Apply a player action.
    pub fn act(&mut self, action: Action, now: DateTime<Utc>) -> Outcome {
        let state = std::mem::take(&mut self.world.resource_mut::<Economy>().0);
        let (next, outcome) = match action {
            Action::WaterPlant(id) => sim_econ::water_plant(state, id),
            Action::HarvestPlant(id) => sim_econ::harvest_plant(state, id),
            Action::FeedAnimal(id) => sim_econ::feed_animal(state, id),
            Action::PlayWithAnimal(id) => sim_econ::play_with_animal(state, id),
            Action::BuyPlant(index) => sim_econ::purchase_plant(state, &self.catalog, index, now),
            Action::BuyAnimal(index) => sim_econ::purchase_animal(state, &self.catalog, index),
        };
        self.world.resource_mut::<Economy>().0 = next;

        match outcome {
            Outcome::Applied(reward) => {
                self.world.resource_mut::<Stats>().actions_applied += 1;
                if let Some(up) = reward.level_up {
                    info!(from = up.from, to = up.to, "level up");
                    self.world.resource_mut::<PendingLevelUps>().0.push(up);
                }
            }
            Outcome::Ignored(reason) => {
                self.world.resource_mut::<Stats>().actions_ignored += 1;
                debug!(?action, %reason, "no-op");
            }
        }
        outcome
    }
}

/// Thread-safe handle; all commands funnel through one lock.
#[derive(Clone)]
pub struct SharedSimulation {
    inner: Arc<Mutex<Simulation>>,
}

impl SharedSimulation {
    pub fn new(sim: Simulation) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sim)),
        }
    }

    // Every commit replaces the whole state, so a poisoned lock still holds
    // a consistent simulation.
    fn lock(&self) -> MutexGuard<'_, Simulation> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn submit(&self, command: Command, now: DateTime<Utc>) -> Commit {
        self.lock().apply(command, now)
    }

    pub fn tick(&self) -> TickReport {
        self.lock().tick()
    }

    pub fn snapshot(&self) -> EconomyState {
        self.lock().state().clone()
    }

    /// Run `f` with exclusive access, e.g. to read and drain in one step.
    pub fn with<R>(&self, f: impl FnOnce(&mut Simulation) -> R) -> R {
        f(&mut self.lock())
    }
}
