//! Area-of-effect landing zones
//!
//! `compute_aoe` is a pure function of its inputs. Landing selection draws
//! from the run RNG and honours per-tile weights.

use std::collections::BTreeMap;

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;

use super::context::AoeShape;
use super::state::GolfRng;
use crate::hex::{Hex, HexDir};

/// Candidate landing tiles around `center`.
///
/// `direction` is the shot direction; it orients the line and strip shapes.
/// The result always contains `center` and never repeats a tile.
pub fn compute_aoe(center: Hex, radius: i32, shape: AoeShape, direction: HexDir) -> Vec<Hex> {
    let radius = radius.max(0);
    match shape {
        AoeShape::Circle | AoeShape::Ring => center.disk(radius as u32),
        AoeShape::LineVertical => (-radius..=radius)
            .map(|k| center.offset(direction, k))
            .collect(),
        AoeShape::LineHorizontal => (-radius..=radius)
            .map(|k| lateral(center, direction, k))
            .collect(),
        AoeShape::Strip { tiles } => (0..tiles.max(1) as i32)
            .map(|k| center.offset(direction, k))
            .collect(),
    }
}

/// Tile `k` steps across the shot line (positive = right).
///
/// Hex grids have no axis perpendicular to a neighbour direction, so the line
/// zig-zags between the two directions either side of the perpendicular.
fn lateral(center: Hex, direction: HexDir, k: i32) -> Hex {
    let (first, second) = if k >= 0 {
        (direction.rotate(-1), direction.rotate(-2))
    } else {
        (direction.rotate(1), direction.rotate(2))
    };
    let steps = k.unsigned_abs();
    let mut hex = center;
    for step in 0..steps {
        hex = hex.neighbor(if step % 2 == 0 { first } else { second });
    }
    hex
}

/// Swing-meter weighting: the centre keeps full weight, off-centre tiles fade
/// with distance. A perfect swing (accuracy 1) puts all weight on the centre.
pub fn swing_weights(tiles: &[Hex], center: Hex, accuracy: f32, difficulty: f32) -> Vec<f32> {
    let spread = ((1.0 - accuracy) * difficulty).clamp(0.0, 1.0);
    tiles
        .iter()
        .map(|tile| match tile.distance(center) {
            0 => 1.0,
            d => spread / d as f32,
        })
        .collect()
}

/// Combine swing weights with modifier-supplied weights (default 1.0).
/// Tiles whose modifier weight is zero, negative, or non-finite get zero.
pub fn combined_weights(
    tiles: &[Hex],
    swing: &[f32],
    modifier: Option<&BTreeMap<Hex, f32>>,
) -> Vec<f32> {
    tiles
        .iter()
        .zip(swing)
        .map(|(tile, s)| {
            let m = modifier.and_then(|w| w.get(tile).copied()).unwrap_or(1.0);
            if m.is_finite() && m > 0.0 { s * m } else { 0.0 }
        })
        .collect()
}

/// Weighted sample over `tiles`. Non-positive weights are excluded; if no
/// weight is positive the pick is uniform. `None` only for an empty slice.
pub fn pick_weighted(tiles: &[Hex], weights: &[f32], rng: &mut GolfRng) -> Option<Hex> {
    let candidates: Vec<(Hex, f32)> = tiles
        .iter()
        .zip(weights)
        .filter(|(_, w)| w.is_finite() && **w > 0.0)
        .map(|(t, w)| (*t, *w))
        .collect();

    if candidates.is_empty() {
        return tiles.choose(rng).copied();
    }
    if candidates.len() == 1 {
        return Some(candidates[0].0);
    }
    match WeightedIndex::new(candidates.iter().map(|(_, w)| *w)) {
        Ok(dist) => Some(candidates[dist.sample(rng)].0),
        Err(e) => {
            log::warn!("Landing weights rejected ({e}), picking uniformly");
            candidates.choose(rng).map(|(t, _)| *t)
        }
    }
}

/// Pick a landing tile: swing × modifier weights first, then modifier
/// weights alone, then uniform.
pub fn pick_landing(
    tiles: &[Hex],
    center: Hex,
    accuracy: f32,
    difficulty: f32,
    modifier: Option<&BTreeMap<Hex, f32>>,
    rng: &mut GolfRng,
) -> Option<Hex> {
    let swing = swing_weights(tiles, center, accuracy, difficulty);
    let weights = combined_weights(tiles, &swing, modifier);
    if weights.iter().any(|w| *w > 0.0) {
        return pick_weighted(tiles, &weights, rng);
    }
    let flat = vec![1.0; tiles.len()];
    let modifier_only = combined_weights(tiles, &flat, modifier);
    pick_weighted(tiles, &modifier_only, rng)
}
