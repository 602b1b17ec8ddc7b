//! Run state
//!
//! Everything that outlives a single shot: the RNG stream, decks, jokers,
//! rule tables, and where the ball is on the current hole.

use std::sync::Arc;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::card::{CardInstance, CardRegistry, CardType};
use super::club::ClubTable;
use super::deck::{DeckState, modifier_deck_ids};
use super::terrain::{Course, TerrainKind, TerrainTable};
use crate::error::{ConfigError, ShotError};
use crate::hex::{Hex, HexDir};
use crate::settings::Settings;

/// The one RNG type used by the simulation
pub type GolfRng = Pcg32;

/// Cards a new run starts with
pub const STARTER_DECK: [&str; 12] = [
    "power_swing",
    "power_swing",
    "laser_focus",
    "straight_arrow",
    "runway",
    "draw_shot",
    "backspin",
    "topspin",
    "floater_ball",
    "long_drive",
    "chip_stack",
    "club_wedge",
];

/// RNG seed wrapper for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// A generator for the given position in the run. Stream 0 is the
    /// fresh run; restored runs use the number of shots already taken.
    pub fn to_rng(&self) -> GolfRng {
        let mixed = self.seed ^ self.stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Pcg32::seed_from_u64(mixed)
    }
}

/// Per-hole wind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Direction the wind blows towards
    pub direction: HexDir,
    pub strength: f32,
}

impl Wind {
    pub fn new(direction: HexDir, strength: f32) -> Self {
        Self {
            direction,
            strength,
        }
    }
}

/// Session state for one run
#[derive(Debug, Clone)]
pub struct RunState {
    pub seed: u64,
    pub rng: GolfRng,
    pub settings: Settings,
    pub registry: Arc<CardRegistry>,
    pub clubs: ClubTable,
    pub terrain: TerrainTable,
    pub deck: DeckState,
    /// Terrain-luck deck, one card flipped per shot
    pub modifier_deck: Option<DeckState>,
    pub jokers: Vec<CardInstance>,

    // === Current hole ===
    pub ball: Hex,
    /// Shots played on this hole
    pub shot_index: u32,
    /// Shots plus penalty strokes
    pub strokes: u32,
    pub hole_score: i64,
    pub hole_complete: bool,
    pub wind: Option<Wind>,

    // === Run totals ===
    pub total_score: i64,
    pub shots_taken: u32,
    pub next_instance_id: u32,
}

impl RunState {
    /// New run with a deck built from registered card ids
    pub fn new<S: AsRef<str>>(
        seed: u64,
        settings: Settings,
        registry: Arc<CardRegistry>,
        deck_ids: &[S],
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let mut rng = RngState::new(seed).to_rng();
        let mut next_instance_id = 0;
        let deck = DeckState::from_ids(&registry, deck_ids, &mut next_instance_id, &mut rng)?;
        log::info!("New run (seed {seed}) with {} cards", deck.total());

        Ok(Self {
            seed,
            rng,
            settings,
            registry,
            clubs: ClubTable::default(),
            terrain: TerrainTable::default(),
            deck,
            modifier_deck: None,
            jokers: Vec::new(),

            ball: Hex::ORIGIN,
            shot_index: 0,
            strokes: 0,
            hole_score: 0,
            hole_complete: false,
            wind: None,

            total_score: 0,
            shots_taken: 0,
            next_instance_id,
        })
    }

    /// Add the 20-card terrain-luck deck
    pub fn with_modifier_deck(mut self) -> Result<Self, ConfigError> {
        let deck = DeckState::from_ids(
            &self.registry,
            &modifier_deck_ids(),
            &mut self.next_instance_id,
            &mut self.rng,
        )?;
        self.modifier_deck = Some(deck);
        Ok(self)
    }

    pub fn add_joker(&mut self, id: &str) -> Result<(), ConfigError> {
        let card = self.registry.instantiate(id, self.next_instance_id)?;
        if !matches!(card.data.card_type, CardType::Joker | CardType::Passive) {
            return Err(ConfigError::InvalidCard {
                card: id.to_string(),
                reason: format!("{:?} cards cannot be held as jokers", card.data.card_type),
            });
        }
        self.next_instance_id += 1;
        self.jokers.push(card);
        Ok(())
    }

    /// Add a card to the main deck (enters through discard)
    pub fn add_card(&mut self, id: &str) -> Result<u32, ConfigError> {
        let card = self.registry.instantiate(id, self.next_instance_id)?;
        self.next_instance_id += 1;
        let instance_id = card.instance_id;
        self.deck.add_card(card);
        Ok(instance_id)
    }

    /// Put the ball on the tee and reset the hole counters
    pub fn start_hole(&mut self, tee: Hex, wind: Option<Wind>) {
        self.ball = tee;
        self.shot_index = 0;
        self.strokes = 0;
        self.hole_score = 0;
        self.hole_complete = false;
        self.wind = wind;
        log::info!("Hole started at {tee}, wind {:?}", wind);
    }

    /// Terrain under the ball
    pub fn lie(&self, course: &dyn Course) -> Result<TerrainKind, ShotError> {
        course.terrain(self.ball).ok_or(ShotError::OffCourse(self.ball))
    }

    pub fn rng_state(&self) -> RngState {
        RngState {
            seed: self.seed,
            stream: self.shots_taken as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn run(seed: u64) -> RunState {
        let registry = Arc::new(CardRegistry::builtin().unwrap());
        RunState::new(seed, Settings::default(), registry, &STARTER_DECK)
            .unwrap()
            .with_modifier_deck()
            .unwrap()
    }

    #[test]
    fn test_same_seed_same_shuffle() {
        let a = run(42);
        let b = run(42);
        let ids = |r: &RunState| r.deck.draw.iter().map(|c| c.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(a.deck.total(), STARTER_DECK.len());
        assert_eq!(a.modifier_deck.as_ref().unwrap().total(), 20);
    }

    #[test]
    fn test_instance_ids_are_unique() {
        let r = run(1);
        let mut ids: Vec<u32> = r
            .deck
            .iter()
            .chain(r.modifier_deck.as_ref().unwrap().iter())
            .map(|c| c.instance_id)
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), STARTER_DECK.len() + 20);
    }

    #[test]
    fn test_unknown_deck_card_is_config_error() {
        let registry = Arc::new(CardRegistry::builtin().unwrap());
        let err = RunState::new(1, Settings::default(), registry, &["nope"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCard(_)));
    }

    #[test]
    fn test_only_jokers_and_passives_as_jokers() {
        let mut r = run(1);
        assert!(r.add_joker("bounce_house").is_ok());
        assert!(r.add_joker("power_swing").is_err());
        assert_eq!(r.jokers.len(), 1);
    }

    #[test]
    fn test_added_card_enters_discard() {
        let mut r = run(2);
        let id = r.add_card("mult_master").unwrap();
        assert_eq!(r.deck.discard.last().map(|c| c.instance_id), Some(id));
        assert_eq!(r.deck.total(), STARTER_DECK.len() + 1);
        assert!(r.add_card("nope").is_err());
    }

    #[test]
    fn test_rng_state_tracks_shots() {
        let mut r = run(3);
        r.shots_taken = 5;
        assert_eq!(r.rng_state(), RngState { seed: 3, stream: 5 });
    }

    #[test]
    fn test_rng_streams_differ() {
        let mut a = RngState { seed: 9, stream: 0 }.to_rng();
        let mut b = RngState { seed: 9, stream: 3 }.to_rng();
        let xa: u64 = a.random();
        let xb: u64 = b.random();
        assert_ne!(xa, xb);
    }
}
