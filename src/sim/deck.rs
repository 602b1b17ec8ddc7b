//! Deck piles
//!
//! Every card instance lives in exactly one of draw, active, discard, or the
//! candidate limbo. Shuffling happens when piles are rebuilt, never at draw
//! time; the top of the draw pile is the end of the vector.

use std::collections::HashSet;

use rand::seq::SliceRandom;

use super::card::{CardInstance, CardRegistry};
use super::state::GolfRng;
use crate::error::ConfigError;

/// Terrain-luck modifier deck: 20 cards, three of which force a reshuffle
pub const MODIFIER_DECK: [(&str, usize); 8] = [
    ("clean_strike", 6),
    ("steady_plus_1", 4),
    ("shaky_minus_1", 4),
    ("steady_plus_2", 2),
    ("shaky_minus_2", 1),
    ("perfect_accuracy", 1),
    ("whiff", 1),
    ("big_slice", 1),
];

/// Expand the modifier deck composition into card ids
pub fn modifier_deck_ids() -> Vec<&'static str> {
    MODIFIER_DECK
        .iter()
        .flat_map(|(id, count)| std::iter::repeat_n(*id, *count))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckState {
    pub draw: Vec<CardInstance>,
    pub active: Vec<CardInstance>,
    pub discard: Vec<CardInstance>,
    /// Drawn for a choose-one step, not yet in any pile
    pub candidates: Vec<CardInstance>,
    /// A reshuffle-trigger card was drawn; resolved once its effect is used
    pub pending_reshuffle: bool,
    pub reshuffles: u32,
}

impl DeckState {
    /// Build a shuffled deck from card instances
    pub fn new(mut cards: Vec<CardInstance>, rng: &mut GolfRng) -> Self {
        cards.shuffle(rng);
        Self {
            draw: cards,
            ..Self::default()
        }
    }

    /// Instantiate every id from the registry, numbering from `next_id`
    pub fn from_ids<S: AsRef<str>>(
        registry: &CardRegistry,
        ids: &[S],
        next_id: &mut u32,
        rng: &mut GolfRng,
    ) -> Result<Self, ConfigError> {
        let cards = ids
            .iter()
            .map(|id| {
                let card = registry.instantiate(id.as_ref(), *next_id)?;
                *next_id += 1;
                Ok(card)
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self::new(cards, rng))
    }

    /// Cards across all piles and the candidate limbo
    pub fn total(&self) -> usize {
        self.draw.len() + self.active.len() + self.discard.len() + self.candidates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardInstance> {
        self.draw
            .iter()
            .chain(&self.active)
            .chain(&self.discard)
            .chain(&self.candidates)
    }

    /// Move discard (minus exhausted cards) into draw as a fresh permutation
    fn reshuffle(&mut self, rng: &mut GolfRng) {
        let (exhausted, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.discard)
            .into_iter()
            .partition(|card| card.is_exhausted);
        self.discard = exhausted;
        self.draw.extend(live);
        self.draw.shuffle(rng);
        self.reshuffles += 1;
        log::debug!("Reshuffled discard, draw pile now {}", self.draw.len());
    }

    /// Pop the next usable card off the draw pile, reshuffling once if the
    /// pile runs dry. Exhausted cards found on the way go to discard.
    fn pop_drawable(&mut self, rng: &mut GolfRng) -> Option<CardInstance> {
        let mut reshuffled = false;
        loop {
            match self.draw.pop() {
                Some(card) if card.is_exhausted => self.discard.push(card),
                Some(card) => return Some(card),
                None if !reshuffled && self.discard.iter().any(|c| !c.is_exhausted) => {
                    self.reshuffle(rng);
                    reshuffled = true;
                }
                None => return None,
            }
        }
    }

    /// Draw one card into the active pile. `None` when no usable card is
    /// left anywhere; callers treat that as a normal state.
    pub fn draw_card(&mut self, rng: &mut GolfRng) -> Option<&CardInstance> {
        let card = self.pop_drawable(rng)?;
        if card.data.reshuffle {
            log::info!("Drew {}, reshuffle queued", card.data.id);
            self.pending_reshuffle = true;
        }
        self.active.push(card);
        self.active.last()
    }

    /// Draw up to `n` cards into the candidate limbo
    pub fn draw_candidates(&mut self, n: usize, rng: &mut GolfRng) -> &[CardInstance] {
        for _ in 0..n {
            match self.pop_drawable(rng) {
                Some(card) => self.candidates.push(card),
                None => break,
            }
        }
        &self.candidates
    }

    /// Commit one candidate to the active pile, spending one use
    pub fn play_candidate(&mut self, index: usize) -> Option<&CardInstance> {
        if index >= self.candidates.len() {
            return None;
        }
        let mut card = self.candidates.remove(index);
        card.use_once();
        if card.data.reshuffle {
            self.pending_reshuffle = true;
        }
        self.active.push(card);
        self.active.last()
    }

    /// Send every unresolved candidate to discard
    pub fn discard_candidates(&mut self) {
        let candidates = std::mem::take(&mut self.candidates);
        self.discard.extend(candidates);
    }

    /// Shot boundary: active cards go to discard
    pub fn clear_active_cards(&mut self) {
        let active = std::mem::take(&mut self.active);
        self.discard.extend(active);
        self.check_invariants();
    }

    /// Perform a queued reshuffle: draw and discard recombined and shuffled
    pub fn resolve_pending_reshuffle(&mut self, rng: &mut GolfRng) -> bool {
        if !self.pending_reshuffle {
            return false;
        }
        self.pending_reshuffle = false;
        self.reshuffle(rng);
        true
    }

    /// Take a card out of the deck entirely (sell/destroy)
    pub fn remove_card(&mut self, instance_id: u32) -> Option<CardInstance> {
        for pile in [
            &mut self.draw,
            &mut self.active,
            &mut self.discard,
            &mut self.candidates,
        ] {
            if let Some(pos) = pile.iter().position(|c| c.instance_id == instance_id) {
                return Some(pile.remove(pos));
            }
        }
        None
    }

    /// New cards enter through the discard pile
    pub fn add_card(&mut self, card: CardInstance) {
        self.discard.push(card);
    }

    fn duplicate_ids(&self) -> Vec<u32> {
        let mut seen = HashSet::new();
        self.iter()
            .filter(|card| !seen.insert(card.instance_id))
            .map(|card| card.instance_id)
            .collect()
    }

    /// Drop repeated instances, keeping the first in pile order
    /// (draw, active, discard, candidates). Returns how many were removed.
    pub fn enforce_unique(&mut self) -> usize {
        let mut seen = HashSet::new();
        let mut removed = 0;
        for pile in [
            &mut self.draw,
            &mut self.active,
            &mut self.discard,
            &mut self.candidates,
        ] {
            pile.retain(|card| {
                let keep = seen.insert(card.instance_id);
                removed += usize::from(!keep);
                keep
            });
        }
        removed
    }

    /// Panics in debug builds if a card sits in two places; repairs it in
    /// release builds
    pub fn check_invariants(&mut self) {
        let dupes = self.duplicate_ids();
        if dupes.is_empty() {
            return;
        }
        debug_assert!(false, "card instances in more than one pile: {dupes:?}");
        log::error!("Card instances in more than one pile: {dupes:?}, repairing");
        self.enforce_unique();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn registry() -> CardRegistry {
        CardRegistry::builtin().unwrap()
    }

    fn modifier_deck(rng: &mut GolfRng) -> DeckState {
        let mut next_id = 0;
        DeckState::from_ids(&registry(), &modifier_deck_ids(), &mut next_id, rng).unwrap()
    }

    #[test]
    fn test_modifier_deck_composition() {
        let ids = modifier_deck_ids();
        assert_eq!(ids.len(), 20);
        assert_eq!(ids.iter().filter(|id| **id == "clean_strike").count(), 6);
    }

    #[test]
    fn test_draw_moves_card_to_active() {
        let mut rng = GolfRng::seed_from_u64(3);
        let mut deck = modifier_deck(&mut rng);
        assert!(deck.draw_card(&mut rng).is_some());
        assert_eq!(deck.draw.len(), 19);
        assert_eq!(deck.active.len(), 1);
        assert_eq!(deck.total(), 20);
    }

    #[test]
    fn test_empty_draw_reshuffles_discard() {
        let mut rng = GolfRng::seed_from_u64(4);
        let mut deck = modifier_deck(&mut rng);
        let all = std::mem::take(&mut deck.draw);
        deck.discard = all;
        assert!(deck.draw_card(&mut rng).is_some());
        assert_eq!(deck.reshuffles, 1);
        assert_eq!(deck.total(), 20);
    }

    #[test]
    fn test_fully_empty_deck_draws_nothing() {
        let mut rng = GolfRng::seed_from_u64(5);
        let mut deck = DeckState::default();
        assert!(deck.draw_card(&mut rng).is_none());
        assert!(deck.draw_candidates(3, &mut rng).is_empty());
    }

    #[test]
    fn test_candidates_resolve_to_piles() {
        let mut rng = GolfRng::seed_from_u64(6);
        let mut deck = modifier_deck(&mut rng);
        assert_eq!(deck.draw_candidates(3, &mut rng).len(), 3);
        assert_eq!(deck.total(), 20);
        assert!(deck.play_candidate(1).is_some());
        assert!(deck.play_candidate(9).is_none());
        deck.discard_candidates();
        assert_eq!(deck.active.len(), 1);
        assert_eq!(deck.discard.len(), 2);
        assert!(deck.candidates.is_empty());
        assert_eq!(deck.total(), 20);
    }

    #[test]
    fn test_candidates_smaller_deck() {
        let mut rng = GolfRng::seed_from_u64(7);
        let mut next_id = 0;
        let mut deck =
            DeckState::from_ids(&registry(), &["clean_strike", "whiff"], &mut next_id, &mut rng)
                .unwrap();
        assert_eq!(deck.draw_candidates(5, &mut rng).len(), 2);
    }

    #[test]
    fn test_reshuffle_trigger_is_deferred() {
        let mut rng = GolfRng::seed_from_u64(8);
        let mut deck = modifier_deck(&mut rng);
        let mut triggers = 0;
        for _ in 0..20 {
            deck.clear_active_cards();
            let reshuffle = deck.draw_card(&mut rng).unwrap().data.reshuffle;
            assert_eq!(reshuffle, deck.pending_reshuffle);
            if reshuffle {
                triggers += 1;
                // The trigger stays active until its shot finishes
                assert!(deck.active[0].data.reshuffle);
                deck.clear_active_cards();
                assert!(deck.resolve_pending_reshuffle(&mut rng));
                assert_eq!(deck.draw.len(), 20);
                break;
            }
        }
        assert_eq!(triggers, 1);
        assert!(!deck.draw.is_empty());
    }

    #[test]
    fn test_exhausted_cards_are_never_drawn() {
        let mut rng = GolfRng::seed_from_u64(9);
        let mut next_id = 0;
        let mut deck = DeckState::from_ids(
            &registry(),
            &["floater_ball", "clean_strike"],
            &mut next_id,
            &mut rng,
        )
        .unwrap();
        for card in deck.draw.iter_mut() {
            if card.id() == "floater_ball" {
                card.is_exhausted = true;
            }
        }
        for _ in 0..10 {
            let card = deck.draw_card(&mut rng).unwrap();
            assert_eq!(card.id(), "clean_strike");
            deck.clear_active_cards();
        }
        assert_eq!(deck.total(), 2);
    }

    #[test]
    fn test_remove_and_add() {
        let mut rng = GolfRng::seed_from_u64(10);
        let mut deck = modifier_deck(&mut rng);
        let id = deck.draw[0].instance_id;
        let card = deck.remove_card(id).unwrap();
        assert_eq!(deck.total(), 19);
        deck.add_card(card);
        assert_eq!(deck.total(), 20);
        assert!(deck.remove_card(999).is_none());
    }

    #[test]
    fn test_enforce_unique_keeps_first() {
        let mut rng = GolfRng::seed_from_u64(11);
        let mut deck = modifier_deck(&mut rng);
        let dup = deck.draw[3].clone();
        deck.discard.push(dup.clone());
        deck.candidates.push(dup);
        assert_eq!(deck.enforce_unique(), 2);
        assert_eq!(deck.total(), 20);
        assert!(deck.discard.is_empty());
    }
}
