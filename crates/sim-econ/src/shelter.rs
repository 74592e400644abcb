//! Shelter rules: care actions and the periodic decay tick.

use crate::{ignored, Draw, Ignored, Outcome, Reward, Transition};
use sim_core::{award_experience, Animal, EconomyState, EntityId, MAX_STAT};
use tracing::debug;

/// Hunger removed by one feeding.
pub const FEED_AMOUNT: f64 = 20.0;
pub const FEED_EXPERIENCE: u64 = 5;
/// Happiness added by one play session.
pub const PLAY_AMOUNT: f64 = 15.0;
pub const PLAY_EXPERIENCE: u64 = 10;
/// Hunger gained per tick.
pub const HUNGER_PER_TICK: f64 = 1.0;
/// Happiness lost per tick.
pub const HAPPINESS_DECAY_PER_TICK: f64 = 0.5;
/// Animals strictly above this happiness (after decay) roll for income.
pub const BONUS_HAPPINESS_THRESHOLD: f64 = 70.0;
/// A draw strictly above this succeeds (p = 0.3).
pub const BONUS_DRAW_THRESHOLD: f64 = 0.7;
/// Coins per successful roll.
pub const PASSIVE_BONUS: u64 = 2;

/// Summary of one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Animals that qualified for a passive-income roll.
    pub eligible: usize,
    /// Rolls that paid out.
    pub successes: usize,
    /// Coins added to the state.
    pub bonus: u64,
}

fn care(
    mut state: EconomyState,
    id: EntityId,
    experience: u64,
    apply: impl FnOnce(&mut Animal),
) -> Transition {
    let Some(animal) = state.animals.iter_mut().find(|a| a.id == id) else {
        return ignored(state, Ignored::UnknownAnimal(id));
    };
    apply(&mut *animal);
    debug!(%id, hunger = animal.hunger, happiness = animal.happiness, "cared for animal");
    let (state, level_up) = award_experience(state, experience);
    let reward = Reward {
        experience,
        level_up,
        ..Reward::default()
    };
    (state, Outcome::Applied(reward))
}

/// Feed an animal, lowering hunger (floored at 0).
pub fn feed_animal(state: EconomyState, id: EntityId) -> Transition {
    care(state, id, FEED_EXPERIENCE, |a| {
        a.hunger = (a.hunger - FEED_AMOUNT).max(0.0);
    })
}

/// Play with an animal, raising happiness (capped at 100).
pub fn play_with_animal(state: EconomyState, id: EntityId) -> Transition {
    care(state, id, PLAY_EXPERIENCE, |a| {
        a.happiness = (a.happiness + PLAY_AMOUNT).min(MAX_STAT);
    })
}

/// Advance every animal by one tick, then roll passive income.
///
/// Decay is applied before eligibility is checked. Each eligible animal, in
/// shelter order, takes exactly one draw; ineligible animals take none.
pub fn tick<D: Draw + ?Sized>(mut state: EconomyState, draws: &mut D) -> (EconomyState, TickReport) {
    for a in &mut state.animals {
        a.hunger = (a.hunger + HUNGER_PER_TICK).min(MAX_STAT);
        a.happiness = (a.happiness - HAPPINESS_DECAY_PER_TICK).max(0.0);
    }

    let mut report = TickReport::default();
    for _ in state
        .animals
        .iter()
        .filter(|a| a.happiness > BONUS_HAPPINESS_THRESHOLD)
    {
        report.eligible += 1;
        if draws.draw() > BONUS_DRAW_THRESHOLD {
            report.successes += 1;
        }
    }
    report.bonus = PASSIVE_BONUS * report.successes as u64;
    state.currency = state.currency.saturating_add(report.bonus);
    debug!(
        animals = state.animals.len(),
        eligible = report.eligible,
        bonus = report.bonus,
        "tick"
    );
    (state, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedDraws;
    use proptest::prelude::*;
    use sim_core::AnimalKind;

    fn shelter(stats: &[(f64, f64)]) -> EconomyState {
        let mut state = EconomyState::default();
        for &(hunger, happiness) in stats {
            let id = state.allocate_id();
            state.animals.push(Animal {
                id,
                kind: AnimalKind::Cat,
                hunger,
                happiness,
            });
        }
        state
    }

    #[test]
    fn feeding_floors_hunger_and_awards_experience() {
        let (s, out) = feed_animal(shelter(&[(15.0, 50.0)]), EntityId(1));
        assert_eq!(s.animals[0].hunger, 0.0);
        assert_eq!(s.progression.experience, 5);
        assert_eq!(out.reward().unwrap().experience, 5);
    }

    #[test]
    fn playing_caps_happiness() {
        let (s, _) = play_with_animal(shelter(&[(50.0, 95.0)]), EntityId(1));
        assert_eq!(s.animals[0].happiness, 100.0);
        assert_eq!(s.progression.experience, 10);
    }

    #[test]
    fn care_for_unknown_animal_is_noop() {
        let before = shelter(&[(50.0, 50.0)]);
        let (after, out) = feed_animal(before.clone(), EntityId(8));
        assert_eq!(after, before);
        assert_eq!(out, Outcome::Ignored(Ignored::UnknownAnimal(EntityId(8))));
        let (after, _) = play_with_animal(before.clone(), EntityId(8));
        assert_eq!(after, before);
    }

    #[test]
    fn tick_decays_before_checking_eligibility() {
        let mut draws = ScriptedDraws::constant(0.9);
        let (s, report) = tick(shelter(&[(50.0, 71.0)]), &mut draws);
        assert_eq!(s.animals[0].happiness, 70.5);
        assert_eq!(s.animals[0].hunger, 51.0);
        assert_eq!(report.eligible, 1);
        assert_eq!(s.currency, 15 + 2);
    }

    #[test]
    fn animal_dropping_to_threshold_is_not_eligible() {
        // 70.5 decays to exactly 70.0, which is not above the threshold
        let mut draws = ScriptedDraws::constant(0.99);
        let (s, report) = tick(shelter(&[(0.0, 70.5)]), &mut draws);
        assert_eq!(report, TickReport::default());
        assert_eq!(draws.consumed(), 0);
        assert_eq!(s.currency, 15);
    }

    #[test]
    fn each_eligible_animal_rolls_independently() {
        let mut draws = ScriptedDraws::new([0.71, 0.7, 0.95]);
        let state = shelter(&[(0.0, 90.0), (0.0, 20.0), (0.0, 90.0), (0.0, 90.0)]);
        let (s, report) = tick(state, &mut draws);
        assert_eq!(draws.consumed(), 3);
        assert_eq!(report.eligible, 3);
        assert_eq!(report.successes, 2);
        assert_eq!(report.bonus, 4);
        assert_eq!(s.currency, 19);
    }

    #[test]
    fn tick_without_animals_draws_nothing() {
        let mut draws = ScriptedDraws::constant(0.9);
        let (s, report) = tick(EconomyState::default(), &mut draws);
        assert_eq!(report.bonus, 0);
        assert_eq!(s, EconomyState::default());
    }

    proptest! {
        #[test]
        fn repeated_ticks_stay_in_bounds(hunger in 0.0f64..=100.0,
                                         happiness in 0.0f64..=100.0,
                                         ticks in 0usize..300,
                                         seed in any::<u64>()) {
            let mut state = shelter(&[(hunger, happiness)]);
            let mut draws = crate::seeded(seed);
            for _ in 0..ticks {
                state = tick(state, &mut draws).0;
                let a = &state.animals[0];
                prop_assert!(a.hunger <= 100.0 && a.hunger >= 0.0);
                prop_assert!(a.happiness >= 0.0 && a.happiness <= 100.0);
            }
        }
    }
}
