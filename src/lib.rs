//! That Golf Game - shot resolution core for a hex-grid roguelike golf game
//!
//! Core modules:
//! - `hex`: Axial hex coordinates and grid geometry
//! - `sim`: Deterministic shot pipeline (clubs, terrain, cards, modifiers, ball path)
//! - `persistence`: Versioned save/load of run decks
//! - `scorecard`: Per-shot records and best-shot leaderboard
//! - `settings`: Data-driven rules tuning
//! - `error`: Error types for loading and playing

pub mod error;
pub mod hex;
pub mod persistence;
pub mod scorecard;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, EffectError, LoadError, ShotError};
pub use hex::{Hex, HexDir};
pub use scorecard::Scorecard;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Chips awarded per cell of distance travelled
    pub const CHIPS_PER_CELL: f32 = 5.0;
    /// Chips for a shot that goes nowhere
    pub const DEFAULT_CHIPS: i64 = 10;

    /// Cards offered per choose-one draw
    pub const CANDIDATE_COUNT: usize = 3;
    /// Tempo budget per shot
    pub const TEMPO_PER_SHOT: u32 = 3;

    /// Tiles of drift for a full-curve swing
    pub const SWING_CURVE_SCALE: f32 = 3.0;
    /// Arc height needed to fly over trees
    pub const TREE_CLEAR_ARC: f32 = 0.75;
    /// Loft (degrees) at which the ball stops bouncing
    pub const HIGH_LOFT_DEGREES: f32 = 40.0;
    /// Rolling stops on terrain below this friction
    pub const ROLL_STOP_FRICTION: f32 = 0.5;
    /// Lateral drift per unit of crosswind
    pub const WIND_CURVE_FACTOR: f32 = 0.5;

    pub const WATER_PENALTY_STROKES: u32 = 1;

    /// Flight curve shape: drift(t) = t^EXPONENT * sin(ARC * pi * t)
    pub const CURVE_EXPONENT: f32 = 1.3;
    pub const CURVE_ARC: f32 = 0.9;

    /// Best-shot leaderboard size
    pub const MAX_BEST_SHOTS: usize = 10;
}
