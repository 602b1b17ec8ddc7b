//! Modifier dispatch
//!
//! Everything that changes a shot (lie, wind, cards, jokers) is a `Modifier`
//! registered with the `ModifierManager`. Each phase runs two passes: every
//! modifier's additive effects in registration order, then the absolute
//! overrides. A hook that fails or leaves garbage behind is rolled back or
//! repaired here and never stops the shot.

use std::fmt;

use glam::Vec2;

use super::card::CardInstance;
use super::club::ClubTable;
use super::context::ShotContext;
use super::effect::Phase;
use super::state::{GolfRng, Wind};
use super::terrain::{Slope, TerrainKind, TerrainModifier};
use crate::error::EffectError;

/// Which half of a phase is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Additive,
    Override,
}

/// Shared inputs lent to every hook
pub struct HookEnv<'a> {
    pub rng: &'a mut GolfRng,
    pub clubs: &'a ClubTable,
    pub pass: Pass,
}

/// Anything that hooks into the shot pipeline. Every hook defaults to a
/// no-op.
pub trait Modifier {
    fn name(&self) -> &str;

    fn before_aim(&self, _ctx: &mut ShotContext, _env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        Ok(())
    }

    fn on_aoe(&self, _ctx: &mut ShotContext, _env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        Ok(())
    }

    fn on_landing(&self, _ctx: &mut ShotContext, _env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        Ok(())
    }

    fn on_scoring(&self, _ctx: &mut ShotContext, _env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        Ok(())
    }

    fn after_shot(&self, _ctx: &mut ShotContext, _env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        Ok(())
    }

    /// Whether this modifier sets absolute values in `phase`
    fn has_overrides(&self, _phase: Phase) -> bool {
        false
    }
}

fn run_hook(
    modifier: &dyn Modifier,
    phase: Phase,
    ctx: &mut ShotContext,
    env: &mut HookEnv<'_>,
) -> Result<(), EffectError> {
    match phase {
        Phase::BeforeAim => modifier.before_aim(ctx, env),
        Phase::OnAoe => modifier.on_aoe(ctx, env),
        Phase::OnLanding => modifier.on_landing(ctx, env),
        Phase::OnScoring => modifier.on_scoring(ctx, env),
        Phase::AfterShot => modifier.after_shot(ctx, env),
    }
}

/// Returned by `add`, used to remove the modifier again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifierHandle(usize);

/// Ordered set of active modifiers. The only place modifiers are iterated.
#[derive(Default)]
pub struct ModifierManager {
    slots: Vec<Option<Box<dyn Modifier>>>,
}

impl fmt::Debug for ModifierManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ModifierManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, modifier: Box<dyn Modifier>) -> ModifierHandle {
        self.slots.push(Some(modifier));
        ModifierHandle(self.slots.len() - 1)
    }

    pub fn remove(&mut self, handle: ModifierHandle) -> Option<Box<dyn Modifier>> {
        self.slots.get_mut(handle.0).and_then(Option::take)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.slots.iter().flatten().map(|m| m.name()).collect()
    }

    /// Run `phase` on every modifier: additive pass, then override pass
    pub fn dispatch(
        &self,
        phase: Phase,
        ctx: &mut ShotContext,
        rng: &mut GolfRng,
        clubs: &ClubTable,
    ) {
        for pass in [Pass::Additive, Pass::Override] {
            for modifier in self.slots.iter().flatten() {
                if pass == Pass::Override && !modifier.has_overrides(phase) {
                    continue;
                }
                let snapshot = ctx.clone();
                let mut env = HookEnv {
                    rng: &mut *rng,
                    clubs,
                    pass,
                };
                match run_hook(modifier.as_ref(), phase, ctx, &mut env) {
                    Ok(()) => {
                        let repaired = ctx.sanitize(&snapshot);
                        if !repaired.is_empty() {
                            log::warn!(
                                "Modifier {} left bad values in {:?} ({:?}), repaired",
                                modifier.name(),
                                phase,
                                repaired
                            );
                        }
                    }
                    Err(e) => {
                        log::warn!(
                            "Modifier {} failed in {:?}: {}; rolled back",
                            modifier.name(),
                            phase,
                            e
                        );
                        *ctx = snapshot;
                    }
                }
            }
        }
    }
}

/// Terrain row and slope under the ball
#[derive(Debug, Clone)]
pub struct LieModifier {
    pub terrain: TerrainKind,
    pub row: TerrainModifier,
    pub slope: Slope,
}

impl Modifier for LieModifier {
    fn name(&self) -> &str {
        self.terrain.as_str()
    }

    fn before_aim(&self, ctx: &mut ShotContext, _env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        ctx.power_mod += self.row.power + self.slope.power_delta();
        ctx.accuracy_mod += self.row.accuracy + self.slope.accuracy_delta();
        ctx.spin_mod += self.row.spin;
        ctx.curve_mod += self.row.curve;
        ctx.roll_mod += self.row.roll;
        Ok(())
    }
}

/// Per-hole wind acting on the landing zone
#[derive(Debug, Clone, Copy)]
pub struct WindModifier {
    pub wind: Wind,
    /// Lateral drift per unit of crosswind
    pub curve_factor: f32,
}

impl WindModifier {
    /// Wind components relative to a shot heading: (along, across).
    /// Positive along is a tailwind, positive across pushes right.
    pub fn components(&self, heading: Vec2) -> (f32, f32) {
        let heading = heading.normalize_or_zero();
        let wind = self.wind.direction.unit() * self.wind.strength;
        (wind.dot(heading), wind.dot(heading.perp()))
    }
}

impl Modifier for WindModifier {
    fn name(&self) -> &str {
        "wind"
    }

    fn on_aoe(&self, ctx: &mut ShotContext, _env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        if self.wind.strength <= 0.0 {
            return Ok(());
        }
        let heading = ctx.aim_tile.to_world() - ctx.start_tile.to_world();
        let (along, across) = self.components(heading);
        ctx.curve_strength += across * self.curve_factor;
        if along <= -0.5 {
            ctx.aoe_radius += 1;
        } else if along >= 0.5 {
            ctx.roll_distance_mult *= 1.0 + 0.25 * along;
        }
        Ok(())
    }
}

/// A card in play
#[derive(Debug, Clone)]
pub struct CardModifier {
    pub card: CardInstance,
}

impl CardModifier {
    pub fn new(card: CardInstance) -> Self {
        Self { card }
    }
}

impl Modifier for CardModifier {
    fn name(&self) -> &str {
        &self.card.data.name
    }

    fn before_aim(&self, ctx: &mut ShotContext, env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        self.card.apply_effects(ctx, Phase::BeforeAim, env)
    }

    fn on_aoe(&self, ctx: &mut ShotContext, env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        self.card.apply_effects(ctx, Phase::OnAoe, env)
    }

    fn on_landing(&self, ctx: &mut ShotContext, env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        self.card.apply_effects(ctx, Phase::OnLanding, env)
    }

    fn on_scoring(&self, ctx: &mut ShotContext, env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        self.card.apply_effects(ctx, Phase::OnScoring, env)
    }

    fn after_shot(&self, ctx: &mut ShotContext, env: &mut HookEnv<'_>) -> Result<(), EffectError> {
        self.card.apply_effects(ctx, Phase::AfterShot, env)
    }

    fn has_overrides(&self, phase: Phase) -> bool {
        self.card.has_overrides(phase)
    }
}
