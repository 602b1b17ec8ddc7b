//! Error types
//!
//! Configuration problems fail at load time, save problems fail at restore
//! time, and pipeline misuse is reported per call. Effect failures are caught
//! inside the modifier manager and never leave the pipeline.

use thiserror::Error;

use crate::hex::Hex;
use crate::sim::club::ClubId;
use crate::sim::effect::Phase;
use crate::sim::shot::ShotPhase;
use crate::sim::terrain::TerrainKind;

/// Errors raised while loading game data (cards, tables, settings)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate card id `{0}`")]
    DuplicateCard(String),

    #[error("unknown card id `{0}`")]
    UnknownCard(String),

    #[error("card `{card}`: effect `{effect}` cannot run in phase {phase:?}")]
    EffectPhase {
        card: String,
        effect: &'static str,
        phase: Phase,
    },

    #[error("card `{card}`: {reason}")]
    InvalidCard { card: String, reason: String },

    #[error("terrain table is missing a row for {0:?}")]
    MissingTerrainRow(TerrainKind),

    #[error("club table is missing stats for {0:?}")]
    MissingClub(ClubId),

    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

/// Errors raised while restoring a saved run
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("malformed save data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("save version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("save references unknown card id `{0}`")]
    UnknownCard(String),

    #[error("saved card `{card}` is invalid: {reason}")]
    InvalidCard { card: String, reason: String },
}

impl LoadError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            LoadError::VersionMismatch { .. } => true,
            LoadError::Parse(_) | LoadError::UnknownCard(_) | LoadError::InvalidCard { .. } => {
                false
            }
        }
    }
}

/// Pipeline misuse: an input arrived that the current phase cannot accept
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShotError {
    #[error("expected phase {expected}, but the shot is in {actual:?}")]
    WrongPhase {
        expected: &'static str,
        actual: ShotPhase,
    },

    #[error("{club:?} cannot be played from {lie:?}")]
    ClubNotAllowed { club: ClubId, lie: TerrainKind },

    #[error("no candidate card at index {0}")]
    NoSuchCandidate(usize),

    #[error("not enough tempo: card needs {needed}, {remaining} left")]
    TempoExhausted { needed: u32, remaining: u32 },

    #[error("the hole is already complete")]
    HoleComplete,

    #[error("ball position {0} is off the course")]
    OffCourse(Hex),
}

/// A card effect or modifier produced an unusable result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    #[error("{0} produced a non-finite value")]
    NonFinite(&'static str),

    #[error("{effect}: {reason}")]
    InvalidValue { effect: &'static str, reason: String },
}
