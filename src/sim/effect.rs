//! Card effects
//!
//! Every effect kind is a closed enum variant. A card attaches effects through
//! `EffectSpec`, which adds the phase the effect runs in and the condition
//! under which it triggers. Magnitudes scale with the card's upgrade level.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::club::ClubId;
use super::context::{AoeShape, FLAG_PERFECT_ACCURACY, ShotContext};
use super::modifier::HookEnv;
use super::terrain::{TerrainKind, TileEdit};
use crate::error::EffectError;

/// Pipeline phases that run modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    BeforeAim,
    OnAoe,
    OnLanding,
    OnScoring,
    AfterShot,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::BeforeAim,
        Phase::OnAoe,
        Phase::OnLanding,
        Phase::OnScoring,
        Phase::AfterShot,
    ];
}

/// Condition that must hold for an effect to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    #[default]
    Always,
    /// Ball is on (or, before landing, playing from) this terrain
    OnTerrain(TerrainKind),
    /// The ball bounced at least once
    OnBounce,
    /// The ball rolled at least one tile
    OnRoll,
}

impl Trigger {
    pub fn can_trigger(&self, ctx: &ShotContext) -> bool {
        match self {
            Trigger::Always => true,
            Trigger::OnTerrain(kind) => ctx.current_terrain() == *kind,
            Trigger::OnBounce => ctx.bounce_count > 0,
            Trigger::OnRoll => ctx.rolled_tiles > 0,
        }
    }
}

/// A magnitude that grows with upgrade level: `base + per_upgrade * level`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scaled {
    pub base: f64,
    #[serde(default)]
    pub per_upgrade: f64,
}

impl Scaled {
    pub const ZERO: Scaled = Scaled::flat(0.0);
    pub const ONE: Scaled = Scaled::flat(1.0);

    pub const fn flat(base: f64) -> Self {
        Self {
            base,
            per_upgrade: 0.0,
        }
    }

    pub const fn new(base: f64, per_upgrade: f64) -> Self {
        Self { base, per_upgrade }
    }

    pub fn value(&self, level: u32) -> Result<f64, EffectError> {
        let v = self.base + self.per_upgrade * level as f64;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(EffectError::NonFinite("scaled value"))
        }
    }

    /// For fields kept in single precision
    pub fn value_f32(&self, level: u32) -> Result<f32, EffectError> {
        Ok(self.value(level)? as f32)
    }

    /// Rounded to the nearest whole number
    pub fn whole(&self, level: u32) -> Result<i64, EffectError> {
        Ok(self.value(level)?.round() as i64)
    }

    pub fn is_zero(&self) -> bool {
        self.base == 0.0 && self.per_upgrade == 0.0
    }
}

fn one() -> Scaled {
    Scaled::ONE
}

/// Distance condition for distance-based bonuses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceRule {
    /// Bonus multiplied by cells travelled
    PerCell,
    /// Full bonus when the shot travels at least `min_cells`
    LongShot { min_cells: f32 },
    /// Full bonus when the shot travels at most `max_cells`
    ShortShot { max_cells: f32 },
}

/// Which tile a terrain check or tile edit looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileTarget {
    Start,
    Landing,
    Rest,
}

/// Effect behaviors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    /// Flat chips
    ChipsBonus { chips: Scaled },
    /// Flat mult
    MultBonus { mult: Scaled },
    DistanceBonus {
        rule: DistanceRule,
        #[serde(default)]
        chips: Scaled,
        #[serde(default)]
        mult: Scaled,
    },
    TerrainBonus {
        terrain: TerrainKind,
        at: TileTarget,
        #[serde(default)]
        chips: Scaled,
        #[serde(default)]
        mult: Scaled,
    },
    /// Per bounce
    BounceBonus {
        #[serde(default)]
        chips: Scaled,
        #[serde(default)]
        mult: Scaled,
    },
    /// Range delta in tiles
    PowerBonus { power: Scaled },
    /// Range multiplier
    PowerScale { factor: Scaled },
    /// AOE ring delta applied before the AOE is built (negative = tighter)
    AccuracyShift { rings: Scaled },
    /// Grow or shrink the computed AOE
    ExpandAoe { rings: Scaled },
    ForceShape { shape: AoeShape },
    /// Radius forced to zero, whatever else ran
    PerfectAccuracy,
    Curve {
        strength: Scaled,
        #[serde(default)]
        random_direction: bool,
    },
    Roll {
        #[serde(default)]
        tiles: Scaled,
        #[serde(default = "one")]
        distance_mult: Scaled,
        #[serde(default = "one")]
        friction_mult: Scaled,
    },
    /// Hazards no longer stop the ball this shot
    IgnoreHazards,
    UseClub { club: ClubId },
    EditTile { at: TileTarget, edit: TileEdit },
}

impl EffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::ChipsBonus { .. } => "chips_bonus",
            EffectKind::MultBonus { .. } => "mult_bonus",
            EffectKind::DistanceBonus { .. } => "distance_bonus",
            EffectKind::TerrainBonus { .. } => "terrain_bonus",
            EffectKind::BounceBonus { .. } => "bounce_bonus",
            EffectKind::PowerBonus { .. } => "power_bonus",
            EffectKind::PowerScale { .. } => "power_scale",
            EffectKind::AccuracyShift { .. } => "accuracy_shift",
            EffectKind::ExpandAoe { .. } => "expand_aoe",
            EffectKind::ForceShape { .. } => "force_shape",
            EffectKind::PerfectAccuracy => "perfect_accuracy",
            EffectKind::Curve { .. } => "curve",
            EffectKind::Roll { .. } => "roll",
            EffectKind::IgnoreHazards => "ignore_hazards",
            EffectKind::UseClub { .. } => "use_club",
            EffectKind::EditTile { .. } => "edit_tile",
        }
    }

    /// Phases this effect is allowed to be attached to
    pub fn valid_phases(&self) -> &'static [Phase] {
        match self {
            EffectKind::ChipsBonus { .. }
            | EffectKind::MultBonus { .. }
            | EffectKind::DistanceBonus { .. }
            | EffectKind::TerrainBonus { .. }
            | EffectKind::BounceBonus { .. } => &[Phase::OnScoring],
            EffectKind::PowerBonus { .. }
            | EffectKind::PowerScale { .. }
            | EffectKind::AccuracyShift { .. }
            | EffectKind::IgnoreHazards
            | EffectKind::UseClub { .. } => &[Phase::BeforeAim],
            EffectKind::ExpandAoe { .. }
            | EffectKind::ForceShape { .. }
            | EffectKind::PerfectAccuracy => &[Phase::OnAoe],
            EffectKind::Curve { .. } | EffectKind::Roll { .. } => {
                &[Phase::BeforeAim, Phase::OnAoe, Phase::OnLanding]
            }
            EffectKind::EditTile { .. } => &[Phase::AfterShot],
        }
    }

    /// Effects that set absolute values. They run after all additive effects
    /// of the same phase.
    pub fn is_override(&self) -> bool {
        matches!(
            self,
            EffectKind::ForceShape { .. } | EffectKind::PerfectAccuracy | EffectKind::UseClub { .. }
        )
    }

    pub fn apply(
        &self,
        ctx: &mut ShotContext,
        level: u32,
        env: &mut HookEnv<'_>,
    ) -> Result<(), EffectError> {
        match self {
            EffectKind::ChipsBonus { chips } => ctx.chips += chips.whole(level)?,
            EffectKind::MultBonus { mult } => ctx.mult += mult.value(level)?,
            EffectKind::DistanceBonus { rule, chips, mult } => {
                let d = ctx.distance_traveled;
                let factor = match rule {
                    DistanceRule::PerCell => d as f64,
                    DistanceRule::LongShot { min_cells } => (d >= *min_cells) as u8 as f64,
                    DistanceRule::ShortShot { max_cells } => (d <= *max_cells) as u8 as f64,
                };
                if factor > 0.0 {
                    ctx.chips += (chips.value(level)? * factor).floor() as i64;
                    ctx.mult += mult.value(level)? * factor;
                }
            }
            EffectKind::TerrainBonus {
                terrain,
                at,
                chips,
                mult,
            } => {
                let on = match at {
                    TileTarget::Start => Some(ctx.lie),
                    TileTarget::Landing => ctx.landing_terrain,
                    TileTarget::Rest => ctx.rest_terrain,
                };
                if on == Some(*terrain) {
                    ctx.chips += chips.whole(level)?;
                    ctx.mult += mult.value(level)?;
                }
            }
            EffectKind::BounceBonus { chips, mult } => {
                let bounces = ctx.bounce_count as f64;
                ctx.chips += (chips.value(level)? * bounces).floor() as i64;
                ctx.mult += mult.value(level)? * bounces;
            }
            EffectKind::PowerBonus { power } => ctx.power_mod += power.whole(level)? as i32,
            EffectKind::PowerScale { factor } => {
                let factor = factor.value_f32(level)?;
                if factor < 0.0 {
                    return Err(EffectError::InvalidValue {
                        effect: self.name(),
                        reason: format!("negative range factor {factor}"),
                    });
                }
                ctx.power_mult *= factor;
            }
            EffectKind::AccuracyShift { rings } => ctx.accuracy_mod += rings.whole(level)? as i32,
            EffectKind::ExpandAoe { rings } => {
                ctx.aoe_radius = (ctx.aoe_radius + rings.whole(level)? as i32).max(0);
            }
            EffectKind::ForceShape { shape } => ctx.aoe_shape = *shape,
            EffectKind::PerfectAccuracy => {
                ctx.aoe_radius = 0;
                ctx.set_flag(FLAG_PERFECT_ACCURACY, true);
            }
            EffectKind::Curve {
                strength,
                random_direction,
            } => {
                let mut s = strength.value_f32(level)?;
                if *random_direction && env.rng.random_bool(0.5) {
                    s = -s;
                }
                ctx.curve_strength += s;
            }
            EffectKind::Roll {
                tiles,
                distance_mult,
                friction_mult,
            } => {
                ctx.roll_mod += tiles.whole(level)? as i32;
                ctx.roll_distance_mult *= distance_mult.value_f32(level)?;
                ctx.friction_mult *= friction_mult.value_f32(level)?;
            }
            EffectKind::IgnoreHazards => ctx.stop_at_hazard = false,
            EffectKind::UseClub { club } => {
                if !ctx.allows_club(*club) {
                    return Err(EffectError::InvalidValue {
                        effect: self.name(),
                        reason: format!("{} cannot be played from {:?}", club.as_str(), ctx.lie),
                    });
                }
                ctx.club = *club;
                ctx.club_stats = env.clubs.get(*club);
            }
            EffectKind::EditTile { at, edit } => {
                let tile = match at {
                    TileTarget::Start => ctx.start_tile,
                    TileTarget::Landing => ctx.landing_tile,
                    TileTarget::Rest => ctx.rest_tile,
                };
                ctx.tile_edits.push((tile, edit.clone()));
            }
        }
        Ok(())
    }
}

/// An effect attached to a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub phase: Phase,
    #[serde(default)]
    pub trigger: Trigger,
    pub effect: EffectKind,
}

impl EffectSpec {
    pub fn new(phase: Phase, effect: EffectKind) -> Self {
        Self {
            phase,
            trigger: Trigger::Always,
            effect,
        }
    }

    pub fn when(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Load-time check that the effect can run in its phase
    pub fn is_valid(&self) -> bool {
        self.effect.valid_phases().contains(&self.phase)
    }
}
