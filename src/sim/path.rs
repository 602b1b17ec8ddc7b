//! Ball flight and roll
//!
//! The flight runs from the start tile to the resolved landing tile, bending
//! sideways with a late-breaking curve. After touchdown the ball rolls on
//! along the shot line until it runs out of roll, reaches the flag, or is
//! stopped by the terrain.

use glam::Vec2;

use super::context::{
    FLAG_HIT_SAND, FLAG_HIT_TREE, FLAG_HIT_WATER, FLAG_OUT_OF_BOUNDS, FLAG_REACHED_FLAG,
    ShotContext,
};
use super::terrain::{Course, TerrainKind, TerrainTable};
use crate::consts::{CURVE_ARC, CURVE_EXPONENT};
use crate::hex::{HEX_SPACING, Hex, HexDir};
use crate::settings::Settings;

/// Curve easing: `t^1.3 * sin(0.9 * pi * t)`. Slow start, late break.
pub fn curve_factor(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t.powf(CURVE_EXPONENT) * (CURVE_ARC * std::f32::consts::PI * t).sin()
}

/// How the flight ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flight {
    Landed,
    /// Ball dropped where it hit something
    Stopped,
}

/// Fly the ball from `start_tile` towards `landing_tile`, writing the
/// touchdown back into `landing_tile`
fn fly(ctx: &mut ShotContext, course: &dyn Course, settings: &Settings) -> Flight {
    let start = ctx.start_tile;
    let target = ctx.landing_tile;
    ctx.path_tiles.clear();
    ctx.path_tiles.push(start);

    let steps = start.distance(target);
    if steps == 0 {
        return Flight::Landed;
    }

    let from = start.to_world();
    let to = target.to_world();
    let line = to - from;
    let right = line.normalize_or_zero().perp();
    let drift = ctx.curve_strength + ctx.curve_mod;
    // Nudge off exact tile edges so ties round the same way every time
    let nudge = Vec2::splat(1e-4);

    let samples = steps * 2;
    for i in 1..=samples {
        let t = i as f32 / samples as f32;
        let straight = from + line * t + nudge;
        let bent = straight + right * drift * curve_factor(t) * HEX_SPACING;
        let tile = Hex::from_world(bent);
        if tile != Hex::from_world(straight) {
            ctx.did_curve = true;
        }
        if ctx.path_tiles.last() == Some(&tile) {
            continue;
        }

        let Some(terrain) = course.terrain(tile) else {
            log::debug!("Ball left the course at {tile}");
            ctx.set_flag(FLAG_OUT_OF_BOUNDS, true);
            ctx.landing_tile = *ctx.path_tiles.last().unwrap_or(&start);
            return Flight::Stopped;
        };
        ctx.path_tiles.push(tile);

        if terrain == TerrainKind::Tree
            && ctx.stop_at_hazard
            && ctx.club_stats.arc_height < settings.tree_clear_arc
        {
            ctx.set_flag(FLAG_HIT_TREE, true);
            ctx.landing_tile = tile;
            return Flight::Stopped;
        }
    }

    ctx.landing_tile = *ctx.path_tiles.last().unwrap_or(&target);
    Flight::Landed
}

/// Tiles of roll after touchdown, before terrain stops are considered
pub fn roll_distance(
    ctx: &ShotContext,
    course: &dyn Course,
    terrain: &TerrainTable,
) -> u32 {
    let Some(kind) = course.terrain(ctx.landing_tile) else {
        return 0;
    };
    let base = (ctx.club_stats.roll_tiles as i32 + ctx.roll_mod).max(0) as f32;
    let spin = (1.0 - ctx.spin_mod).clamp(0.0, 2.0);
    let roll = base
        * ctx.roll_distance_mult
        * terrain.get(kind).friction
        * ctx.friction_mult
        * spin
        + course.slope(ctx.landing_tile).roll_delta() as f32;
    if roll.is_finite() { roll.round().max(0.0) as u32 } else { 0 }
}

/// Resolve the full ball path: flight, touchdown, roll, and the terrain flags
pub fn simulate_ball_path(
    ctx: &mut ShotContext,
    course: &dyn Course,
    terrain: &TerrainTable,
    settings: &Settings,
) {
    let flight = fly(ctx, course, settings);
    let touchdown = ctx.landing_tile;
    let landed_on = course.terrain(touchdown);
    ctx.landing_terrain = landed_on;

    let bounces = landed_on.is_some_and(|kind| kind.is_bouncy())
        && flight == Flight::Landed
        && ctx.club_stats.loft < settings.high_loft;
    if bounces {
        ctx.bounce_count += 1;
    }

    let stopped_dead = flight == Flight::Stopped
        || landed_on.is_none_or(|k| (k.is_hazard() && ctx.stop_at_hazard) || k == TerrainKind::Flag);
    let roll = if stopped_dead {
        0
    } else {
        roll_distance(ctx, course, terrain)
    };

    let dir = if touchdown == ctx.start_tile {
        ctx.shot_direction()
    } else {
        HexDir::towards(ctx.start_tile, touchdown)
    };
    let mut at = touchdown;
    let mut prev_kind = landed_on;
    for _ in 0..roll {
        let next = at.neighbor(dir);
        let Some(kind) = course.terrain(next) else {
            ctx.set_flag(FLAG_OUT_OF_BOUNDS, true);
            break;
        };
        ctx.path_tiles.push(next);
        ctx.rolled_tiles += 1;
        at = next;

        if prev_kind != Some(kind) && kind.is_bouncy() {
            ctx.bounce_count += 1;
        }
        prev_kind = Some(kind);

        if kind == TerrainKind::Flag {
            break;
        }
        if kind.is_hazard() {
            if ctx.stop_at_hazard {
                break;
            }
        } else if terrain.get(kind).friction < settings.roll_stop_friction {
            break;
        }
    }

    ctx.rest_tile = at;
    ctx.rest_terrain = course.terrain(at);

    // Flags from touchdown onwards; the flight itself only clips trees
    let skip = ctx.path_tiles.len() - 1 - ctx.rolled_tiles as usize;
    let touched: Vec<TerrainKind> = ctx.path_tiles[skip..]
        .iter()
        .filter_map(|tile| course.terrain(*tile))
        .collect();
    if touched.contains(&TerrainKind::Sand) {
        ctx.set_flag(FLAG_HIT_SAND, true);
    }
    if touched.contains(&TerrainKind::Water) {
        ctx.set_flag(FLAG_HIT_WATER, true);
    }
    if ctx.rest_terrain == Some(TerrainKind::Flag) {
        ctx.set_flag(FLAG_REACHED_FLAG, true);
    }

    let distance = ctx.start_tile.cell_distance(ctx.rest_tile);
    ctx.distance_traveled = (distance * 1000.0).round() / 1000.0;
    log::debug!(
        "Path {} -> {} (touchdown {}, {} roll, {} bounces)",
        ctx.start_tile,
        ctx.rest_tile,
        touchdown,
        ctx.rolled_tiles,
        ctx.bounce_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::club::{ClubId, ClubTable};
    use crate::sim::terrain::{GridCourse, Slope, SlopeKind};

    fn shot(club: ClubId, aim: Hex) -> ShotContext {
        let mut ctx = ShotContext::new(
            Hex::ORIGIN,
            club,
            ClubTable::default().get(club),
            TerrainKind::Fairway,
            0,
            true,
        );
        ctx.aim_tile = aim;
        ctx.landing_tile = aim;
        ctx
    }

    fn fairway() -> GridCourse {
        GridCourse::filled(Hex::ORIGIN, 30, TerrainKind::Fairway)
    }

    fn run(ctx: &mut ShotContext, course: &GridCourse) {
        simulate_ball_path(ctx, course, &TerrainTable::default(), &Settings::default());
    }

    #[test]
    fn test_curve_factor_shape() {
        assert_eq!(curve_factor(0.0), 0.0);
        assert!(curve_factor(0.25) < curve_factor(0.5));
        assert!(curve_factor(0.5) < curve_factor(0.75));
        let end = (0.9 * std::f32::consts::PI).sin();
        assert!((curve_factor(1.0) - end).abs() < 1e-6);
    }

    #[test]
    fn test_driver_rolls_two_on_fairway() {
        let course = fairway();
        let mut ctx = shot(ClubId::Driver, Hex::new(21, 0));
        run(&mut ctx, &course);
        assert_eq!(ctx.landing_tile, Hex::new(21, 0));
        assert_eq!(ctx.rest_tile, Hex::new(23, 0));
        assert_eq!(ctx.rolled_tiles, 2);
        assert_eq!(ctx.bounce_count, 1);
        assert!(!ctx.did_curve);
        assert_eq!(ctx.distance_traveled, 23.0);
    }

    #[test]
    fn test_high_loft_does_not_bounce() {
        let course = fairway();
        let mut ctx = shot(ClubId::SandWedge, Hex::new(5, 0));
        run(&mut ctx, &course);
        assert_eq!(ctx.bounce_count, 0);
        assert_eq!(ctx.rest_tile, Hex::new(5, 0));
    }

    #[test]
    fn test_curve_moves_touchdown_right() {
        let course = fairway();
        let mut ctx = shot(ClubId::Driver, Hex::new(20, 0));
        ctx.curve_strength = 3.0;
        run(&mut ctx, &course);
        assert!(ctx.did_curve);
        // Right of an eastward shot is south (+y)
        assert!(ctx.landing_tile.to_world().y > 0.0);
    }

    #[test]
    fn test_sand_stops_ball_unless_ignored() {
        let mut course = fairway();
        course.set(Hex::new(10, 0), TerrainKind::Sand);
        let mut ctx = shot(ClubId::Driver, Hex::new(10, 0));
        run(&mut ctx, &course);
        assert_eq!(ctx.rest_tile, Hex::new(10, 0));
        assert!(ctx.flag(FLAG_HIT_SAND));

        let mut ctx = shot(ClubId::Driver, Hex::new(9, 0));
        ctx.stop_at_hazard = false;
        run(&mut ctx, &course);
        assert!(ctx.flag(FLAG_HIT_SAND));
        assert_eq!(ctx.rest_tile, Hex::new(11, 0));
    }

    #[test]
    fn test_low_arc_clips_trees() {
        let mut course = fairway();
        course.set(Hex::new(6, 0), TerrainKind::Tree);
        let mut ctx = shot(ClubId::Driver, Hex::new(12, 0));
        run(&mut ctx, &course);
        assert!(ctx.flag(FLAG_HIT_TREE));
        assert_eq!(ctx.rest_tile, Hex::new(6, 0));

        let mut wedge = shot(ClubId::PitchingWedge, Hex::new(7, 0));
        run(&mut wedge, &course);
        assert!(!wedge.flag(FLAG_HIT_TREE));
        assert_eq!(wedge.rest_tile, Hex::new(7, 0));
    }

    #[test]
    fn test_rolling_into_flag_stops() {
        let mut course = fairway();
        course.set(Hex::new(11, 0), TerrainKind::Flag);
        let mut ctx = shot(ClubId::Driver, Hex::new(10, 0));
        run(&mut ctx, &course);
        assert_eq!(ctx.rest_tile, Hex::new(11, 0));
        assert!(ctx.flag(FLAG_REACHED_FLAG));
    }

    #[test]
    fn test_out_of_bounds_truncates() {
        let course = GridCourse::filled(Hex::ORIGIN, 5, TerrainKind::Fairway);
        let mut ctx = shot(ClubId::Driver, Hex::new(10, 0));
        run(&mut ctx, &course);
        assert!(ctx.flag(FLAG_OUT_OF_BOUNDS));
        assert_eq!(ctx.rest_tile, Hex::new(5, 0));
    }

    #[test]
    fn test_landing_slope_changes_the_roll() {
        let touchdown = Hex::new(21, 0);
        let table = TerrainTable::default();

        let mut downhill = fairway();
        downhill.set_slope(touchdown, Slope::new(SlopeKind::Downhill, 1.0));
        let mut ctx = shot(ClubId::Driver, touchdown);
        assert_eq!(roll_distance(&ctx, &downhill, &table), 3);
        run(&mut ctx, &downhill);
        assert_eq!(ctx.rolled_tiles, 3);
        assert_eq!(ctx.rest_tile, Hex::new(24, 0));

        let mut uphill = fairway();
        uphill.set_slope(touchdown, Slope::new(SlopeKind::Uphill, 1.0));
        let mut ctx = shot(ClubId::Driver, touchdown);
        assert_eq!(roll_distance(&ctx, &uphill, &table), 1);
        run(&mut ctx, &uphill);
        assert_eq!(ctx.rolled_tiles, 1);
        assert_eq!(ctx.rest_tile, Hex::new(22, 0));

        // A ball with no roll is not pushed back below zero
        let mut wedge = shot(ClubId::SandWedge, Hex::new(5, 0));
        uphill.set_slope(Hex::new(5, 0), Slope::new(SlopeKind::Uphill, 1.0));
        assert_eq!(roll_distance(&wedge, &uphill, &table), 0);
        run(&mut wedge, &uphill);
        assert_eq!(wedge.rest_tile, Hex::new(5, 0));
    }

    #[test]
    fn test_roll_modifiers() {
        let course = fairway();
        let mut ctx = shot(ClubId::Driver, Hex::new(10, 0));
        ctx.roll_distance_mult = 2.0;
        ctx.roll_mod = 1;
        assert_eq!(roll_distance(&ctx, &course, &TerrainTable::default()), 6);
        ctx.spin_mod = 1.0;
        assert_eq!(roll_distance(&ctx, &course, &TerrainTable::default()), 0);
    }
}
