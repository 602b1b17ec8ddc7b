//! Per-shot mutable state
//!
//! A `ShotContext` is created fresh when a shot is prepared, threaded through
//! every pipeline phase, and dropped once the shot completes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::aoe::compute_aoe;
use super::club::{ClubId, ClubStats};
use super::scoring::score_formula;
use super::terrain::{TerrainKind, TileEdit};
use crate::hex::{Hex, HexDir};

pub const FLAG_HIT_SAND: &str = "hit_sand";
pub const FLAG_HIT_WATER: &str = "hit_water";
pub const FLAG_HIT_TREE: &str = "hit_tree";
pub const FLAG_REACHED_FLAG: &str = "reached_flag";
pub const FLAG_OUT_OF_BOUNDS: &str = "out_of_bounds";
pub const FLAG_PERFECT_ACCURACY: &str = "perfect_accuracy";

/// Shape of the landing zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AoeShape {
    /// Every tile within the radius
    #[default]
    Circle,
    /// Same tile set as a circle
    Ring,
    /// Across the shot line (draw/fade uncertainty)
    LineHorizontal,
    /// Along the shot line (short/long uncertainty)
    LineVertical,
    /// Fixed run of tiles forward from the centre
    Strip { tiles: u32 },
}

/// Swing-meter capture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingResult {
    /// 0..1
    pub power: f32,
    /// 0..1, 1 = perfect
    pub accuracy: f32,
    /// -1..1, positive curves right
    pub curve: f32,
}

impl SwingResult {
    pub const PERFECT: SwingResult = SwingResult {
        power: 1.0,
        accuracy: 1.0,
        curve: 0.0,
    };

    pub fn new(power: f32, accuracy: f32, curve: f32) -> Self {
        Self {
            power,
            accuracy,
            curve,
        }
    }

    /// Clamp into range; non-finite inputs become a clean strike
    pub fn clamped(self) -> Self {
        fn fix(v: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
            if v.is_finite() { v.clamp(lo, hi) } else { fallback }
        }
        Self {
            power: fix(self.power, 0.0, 1.0, 1.0),
            accuracy: fix(self.accuracy, 0.0, 1.0, 1.0),
            curve: fix(self.curve, -1.0, 1.0, 0.0),
        }
    }
}

/// Value stored in the shot metadata map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Flag(bool),
    Number(f64),
}

/// The mutable record threaded through one shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotContext {
    // === Identity ===
    pub start_tile: Hex,
    pub aim_tile: Hex,
    /// Where the ball touches down (after curve)
    pub landing_tile: Hex,
    /// Where the ball comes to rest (after roll)
    pub rest_tile: Hex,
    pub club: ClubId,
    pub club_stats: ClubStats,
    /// Terrain the shot is played from
    pub lie: TerrainKind,
    /// Clubs the lie permits; empty means any
    pub allowed_clubs: Vec<ClubId>,
    pub landing_terrain: Option<TerrainKind>,
    pub rest_terrain: Option<TerrainKind>,

    // === Lie modifiers (additive) ===
    pub power_mod: i32,
    pub power_mult: f32,
    pub accuracy_mod: i32,
    pub spin_mod: f32,
    pub curve_mod: f32,
    pub roll_mod: i32,

    // === AOE ===
    pub aoe_tiles: Vec<Hex>,
    pub aoe_radius: i32,
    pub aoe_shape: AoeShape,
    #[serde(default, with = "crate::hex::tile_map::option")]
    pub aoe_weights: Option<BTreeMap<Hex, f32>>,

    // === Path ===
    pub path_tiles: Vec<Hex>,
    pub bounce_count: u32,
    pub rolled_tiles: u32,
    pub did_curve: bool,
    /// Signed lateral drift in tiles (positive = right of the shot line)
    pub curve_strength: f32,
    pub roll_distance_mult: f32,
    pub friction_mult: f32,
    pub stop_at_hazard: bool,
    /// Straight-line distance from start to rest, in cells
    pub distance_traveled: f32,

    // === Swing ===
    pub swing_power: f32,
    pub swing_accuracy: f32,
    pub swing_curve: f32,

    // === Scoring ===
    pub base_chips: i64,
    pub chips: i64,
    pub mult: f64,
    /// Set exactly once, after every scoring effect has run
    pub final_score: Option<i64>,

    // === Bookkeeping ===
    pub shot_index_in_hole: u32,
    pub metadata: BTreeMap<String, MetaValue>,
    /// Course writes queued by effects, applied after the shot
    pub tile_edits: Vec<(Hex, TileEdit)>,
}

impl ShotContext {
    pub fn new(
        start_tile: Hex,
        club: ClubId,
        club_stats: ClubStats,
        lie: TerrainKind,
        shot_index_in_hole: u32,
        stop_at_hazard: bool,
    ) -> Self {
        Self {
            start_tile,
            aim_tile: start_tile,
            landing_tile: start_tile,
            rest_tile: start_tile,
            club,
            club_stats,
            lie,
            allowed_clubs: Vec::new(),
            landing_terrain: None,
            rest_terrain: None,

            power_mod: 0,
            power_mult: 1.0,
            accuracy_mod: 0,
            spin_mod: 0.0,
            curve_mod: 0.0,
            roll_mod: 0,

            aoe_tiles: Vec::new(),
            aoe_radius: 0,
            aoe_shape: AoeShape::Circle,
            aoe_weights: None,

            path_tiles: Vec::new(),
            bounce_count: 0,
            rolled_tiles: 0,
            did_curve: false,
            curve_strength: 0.0,
            roll_distance_mult: 1.0,
            friction_mult: 1.0,
            stop_at_hazard,
            distance_traveled: 0.0,

            swing_power: 1.0,
            swing_accuracy: 1.0,
            swing_curve: 0.0,

            base_chips: 0,
            chips: 0,
            mult: 1.0,
            final_score: None,

            shot_index_in_hole,
            metadata: BTreeMap::new(),
            tile_edits: Vec::new(),
        }
    }

    /// Maximum reach for this shot after lie and power modifiers
    pub fn effective_distance(&self) -> u32 {
        let base = (self.club_stats.max_distance as i32 + self.power_mod).max(1) as f32;
        let scaled = (base * self.power_mult.max(0.0)).round();
        (scaled as u32).max(1)
    }

    /// Club accuracy plus accumulated ring deltas, clamped at zero
    pub fn base_aoe_radius(&self) -> i32 {
        (self.club_stats.accuracy_rings as i32 + self.accuracy_mod).max(0)
    }

    /// Direction of the shot (start towards aim)
    pub fn shot_direction(&self) -> HexDir {
        HexDir::towards(self.start_tile, self.aim_tile)
    }

    pub fn allows_club(&self, club: ClubId) -> bool {
        self.allowed_clubs.is_empty() || self.allowed_clubs.contains(&club)
    }

    /// Move the landing zone to `center`, carrying any tile weights with it
    pub fn recenter_aoe(&mut self, center: Hex) {
        let shift = center - self.aim_tile;
        self.aoe_tiles = compute_aoe(center, self.aoe_radius, self.aoe_shape, self.shot_direction());
        if let Some(weights) = self.aoe_weights.take() {
            self.aoe_weights = Some(weights.into_iter().map(|(t, w)| (t + shift, w)).collect());
        }
    }

    /// Terrain the ball currently relates to: rest, else landing, else lie
    pub fn current_terrain(&self) -> TerrainKind {
        self.rest_terrain
            .or(self.landing_terrain)
            .unwrap_or(self.lie)
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.metadata.insert(key.to_string(), MetaValue::Flag(value));
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.metadata.get(key), Some(MetaValue::Flag(true)))
    }

    pub fn set_number(&mut self, key: &str, value: f64) {
        self.metadata.insert(key.to_string(), MetaValue::Number(value));
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.metadata.get(key) {
            Some(MetaValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Compute and store the final score. Later calls return the stored value.
    pub fn finalize_score(&mut self) -> i64 {
        if let Some(score) = self.final_score {
            return score;
        }
        self.chips = self.chips.max(0);
        if !self.mult.is_finite() || self.mult < 0.0 {
            self.mult = 0.0;
        }
        let score = score_formula(self.chips, self.mult);
        self.final_score = Some(score);
        score
    }

    /// Repair values an effect left out of range. Non-finite floats revert to
    /// the value in `before`; negative quantities clamp to zero. Returns the
    /// names of repaired fields.
    pub fn sanitize(&mut self, before: &ShotContext) -> Vec<&'static str> {
        let mut repaired = Vec::new();

        macro_rules! finite_or_revert {
            ($($field:ident),*) => {
                $(
                    if !self.$field.is_finite() {
                        self.$field = before.$field;
                        repaired.push(stringify!($field));
                    }
                )*
            };
        }
        finite_or_revert!(
            power_mult,
            spin_mod,
            curve_mod,
            curve_strength,
            roll_distance_mult,
            friction_mult,
            mult
        );

        if self.aoe_radius < 0 {
            self.aoe_radius = 0;
            repaired.push("aoe_radius");
        }
        macro_rules! floor_at_zero {
            ($($field:ident),*) => {
                $(
                    if self.$field < 0.0 {
                        self.$field = 0.0;
                        repaired.push(stringify!($field));
                    }
                )*
            };
        }
        floor_at_zero!(power_mult, roll_distance_mult, friction_mult);

        if let Some(weights) = self.aoe_weights.as_mut() {
            let before_len = weights.len();
            weights.retain(|_, w| w.is_finite());
            if weights.len() != before_len {
                repaired.push("aoe_weights");
            }
        }

        repaired
    }
}
