//! Rules configuration
//!
//! Tunable numbers for shot resolution, loaded from JSON. Any field missing
//! from the file keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Game rules and tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Scoring ===
    /// Chips awarded per cell of distance travelled
    pub chips_per_cell: f32,
    /// Base chips when the ball travels no distance
    pub default_chips: i64,

    // === Cards ===
    /// Cards offered per choose-one draw
    pub candidate_count: usize,
    /// Tempo budget for cards played in one shot
    pub tempo_per_shot: u32,

    // === Ball flight ===
    /// Hazards stop the ball unless an effect says otherwise
    pub stop_at_hazard: bool,
    /// Tiles of lateral drift for a full swing-meter curve
    pub swing_curve_scale: f32,
    /// Clubs with a lower arc height collide with trees in flight
    pub tree_clear_arc: f32,
    /// Clubs at or above this loft (degrees) do not bounce on landing
    pub high_loft: f32,
    /// Rolling into non-hazard terrain below this friction stops the ball
    pub roll_stop_friction: f32,
    /// Lateral drift per unit of crosswind
    pub wind_curve_factor: f32,

    // === Penalties ===
    /// Extra strokes when the ball finishes in water
    pub water_penalty_strokes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chips_per_cell: CHIPS_PER_CELL,
            default_chips: DEFAULT_CHIPS,

            candidate_count: CANDIDATE_COUNT,
            tempo_per_shot: TEMPO_PER_SHOT,

            stop_at_hazard: true,
            swing_curve_scale: SWING_CURVE_SCALE,
            tree_clear_arc: TREE_CLEAR_ARC,
            high_loft: HIGH_LOFT_DEGREES,
            roll_stop_friction: ROLL_STOP_FRICTION,
            wind_curve_factor: WIND_CURVE_FACTOR,

            water_penalty_strokes: WATER_PENALTY_STROKES,
        }
    }
}

impl Settings {
    /// Parse settings from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            what: "settings",
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Read settings from a JSON file, falling back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings");
                settings
            }
            Err(e) => {
                log::info!("Using default settings ({e})");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject values that would make shot resolution meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("chips_per_cell", self.chips_per_cell),
            ("swing_curve_scale", self.swing_curve_scale),
            ("tree_clear_arc", self.tree_clear_arc),
            ("high_loft", self.high_loft),
            ("roll_stop_friction", self.roll_stop_friction),
            ("wind_curve_factor", self.wind_curve_factor),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidSetting {
                    name,
                    reason: format!("must be a finite non-negative number, got {value}"),
                });
            }
        }
        if self.default_chips < 0 {
            return Err(ConfigError::InvalidSetting {
                name: "default_chips",
                reason: format!("must not be negative, got {}", self.default_chips),
            });
        }
        if self.candidate_count == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "candidate_count",
                reason: "must offer at least one card".to_string(),
            });
        }
        Ok(())
    }
}
