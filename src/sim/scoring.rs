//! Base scoring
//!
//! Runs after the ball path is resolved and before scoring-phase effects.

use super::context::{FLAG_REACHED_FLAG, ShotContext};
use super::terrain::{TerrainKind, TerrainTable};
use crate::settings::Settings;

/// Products this close below a whole number floor to that number
const FLOOR_TOLERANCE: f64 = 1e-6;

/// `floor(chips * mult)`
pub fn score_formula(chips: i64, mult: f64) -> i64 {
    (chips as f64 * mult + FLOOR_TOLERANCE).floor() as i64
}

/// Chips earned for the distance covered
pub fn base_chips(distance: f32, settings: &Settings) -> i64 {
    let chips = (distance * settings.chips_per_cell).floor() as i64;
    if chips <= 0 { settings.default_chips } else { chips }
}

/// Fill in base chips, reset mult, and apply the rest tile's terrain row
pub fn compute_scoring(ctx: &mut ShotContext, terrain: &TerrainTable, settings: &Settings) {
    ctx.base_chips = base_chips(ctx.distance_traveled, settings);
    ctx.chips = ctx.base_chips;
    ctx.mult = 1.0;

    let finish = ctx.current_terrain();
    let row = terrain.get(finish);
    ctx.chips += row.chip_bonus;
    ctx.mult += row.mult_bonus;

    if finish == TerrainKind::Flag {
        ctx.set_flag(FLAG_REACHED_FLAG, true);
    }
}
