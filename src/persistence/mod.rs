//! Save/load of run decks
//!
//! Features:
//! - Versioned JSON envelope
//! - Cards stored by id and resolved against the registry on load
//! - Unknown card ids are a hard error, never silently dropped

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::hex::Hex;
use crate::settings::Settings;
use crate::sim::card::{CardInstance, CardRegistry};
use crate::sim::club::ClubTable;
use crate::sim::deck::DeckState;
use crate::sim::state::{RngState, RunState};
use crate::sim::terrain::TerrainTable;

/// Current save format
pub const SAVE_VERSION: u32 = 1;

/// One saved card instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSave {
    pub card_id: String,
    pub upgrade_level: u32,
    pub uses_remaining: i32,
    pub is_exhausted: bool,
    pub is_locked: bool,
}

impl CardSave {
    pub fn capture(card: &CardInstance) -> Self {
        Self {
            card_id: card.data.id.clone(),
            upgrade_level: card.upgrade_level,
            uses_remaining: card.uses_remaining,
            is_exhausted: card.is_exhausted,
            is_locked: card.is_locked,
        }
    }

    /// Rebuild the instance, checking saved fields against the blueprint
    pub fn restore(&self, registry: &CardRegistry, instance_id: u32) -> Result<CardInstance, LoadError> {
        let data = registry
            .get(&self.card_id)
            .cloned()
            .ok_or_else(|| LoadError::UnknownCard(self.card_id.clone()))?;
        let invalid = |reason: String| LoadError::InvalidCard {
            card: self.card_id.clone(),
            reason,
        };
        if self.upgrade_level > data.max_upgrade_level {
            return Err(invalid(format!(
                "upgrade level {} above cap {}",
                self.upgrade_level, data.max_upgrade_level
            )));
        }
        if data.is_limited() && !(0..=data.max_uses).contains(&self.uses_remaining) {
            return Err(invalid(format!(
                "{} uses remaining out of {}",
                self.uses_remaining, data.max_uses
            )));
        }

        let mut card = CardInstance::new(instance_id, data);
        card.upgrade_level = self.upgrade_level;
        card.uses_remaining = self.uses_remaining;
        card.is_exhausted = self.is_exhausted;
        card.is_locked = self.is_locked;
        Ok(card)
    }
}

/// Saved piles. Top of the draw pile is the last entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckSave {
    pub draw: Vec<CardSave>,
    #[serde(default)]
    pub active: Vec<CardSave>,
    #[serde(default)]
    pub discard: Vec<CardSave>,
}

impl DeckSave {
    /// Unresolved candidates go back on top of the draw pile
    pub fn capture(deck: &DeckState) -> Self {
        Self {
            draw: deck
                .draw
                .iter()
                .chain(&deck.candidates)
                .map(CardSave::capture)
                .collect(),
            active: deck.active.iter().map(CardSave::capture).collect(),
            discard: deck.discard.iter().map(CardSave::capture).collect(),
        }
    }

    pub fn restore(&self, registry: &CardRegistry, next_id: &mut u32) -> Result<DeckState, LoadError> {
        let mut pile = |saves: &[CardSave]| -> Result<Vec<CardInstance>, LoadError> {
            saves
                .iter()
                .map(|save| {
                    let card = save.restore(registry, *next_id)?;
                    *next_id += 1;
                    Ok(card)
                })
                .collect()
        };
        Ok(DeckState {
            draw: pile(&self.draw)?,
            active: pile(&self.active)?,
            discard: pile(&self.discard)?,
            ..DeckState::default()
        })
    }
}

/// Everything needed to resume a run between shots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    pub seed: u64,
    pub shots_taken: u32,
    #[serde(default)]
    pub total_score: i64,
    pub deck: DeckSave,
    #[serde(default)]
    pub modifier_deck: Option<DeckSave>,
    #[serde(default)]
    pub jokers: Vec<CardSave>,
}

impl SaveEnvelope {
    pub fn capture(run: &RunState) -> Self {
        Self {
            version: SAVE_VERSION,
            seed: run.seed,
            shots_taken: run.shots_taken,
            total_score: run.total_score,
            deck: DeckSave::capture(&run.deck),
            modifier_deck: run.modifier_deck.as_ref().map(DeckSave::capture),
            jokers: run.jokers.iter().map(CardSave::capture).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let envelope: SaveEnvelope = serde_json::from_str(json)?;
        if envelope.version != SAVE_VERSION {
            return Err(LoadError::VersionMismatch {
                found: envelope.version,
                expected: SAVE_VERSION,
            });
        }
        Ok(envelope)
    }

    /// Rebuild a run. The RNG is reseeded from the seed and shot count, and
    /// the ball waits on `tee` for a new hole.
    pub fn restore(
        &self,
        settings: Settings,
        registry: Arc<CardRegistry>,
        tee: Hex,
    ) -> Result<RunState, LoadError> {
        let mut next_id = 0;
        let deck = self.deck.restore(&registry, &mut next_id)?;
        let modifier_deck = self
            .modifier_deck
            .as_ref()
            .map(|saved| saved.restore(&registry, &mut next_id))
            .transpose()?;
        let jokers = self
            .jokers
            .iter()
            .map(|save| {
                let card = save.restore(&registry, next_id)?;
                next_id += 1;
                Ok(card)
            })
            .collect::<Result<Vec<_>, LoadError>>()?;

        let rng = RngState {
            seed: self.seed,
            stream: self.shots_taken as u64,
        }
        .to_rng();
        log::info!(
            "Restored run (seed {}, {} shots, {} cards)",
            self.seed,
            self.shots_taken,
            deck.total()
        );

        let mut run = RunState {
            seed: self.seed,
            rng,
            settings,
            registry,
            clubs: ClubTable::default(),
            terrain: TerrainTable::default(),
            deck,
            modifier_deck,
            jokers,
            ball: tee,
            shot_index: 0,
            strokes: 0,
            hole_score: 0,
            hole_complete: false,
            wind: None,
            total_score: self.total_score,
            shots_taken: self.shots_taken,
            next_instance_id: next_id,
        };
        run.start_hole(tee, None);
        Ok(run)
    }
}
