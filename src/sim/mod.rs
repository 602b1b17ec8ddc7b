//! Deterministic shot simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One seeded RNG stream per run
//! - Ordered collections wherever iteration order reaches the RNG
//! - No rendering, input or platform dependencies

pub mod aoe;
pub mod card;
pub mod club;
pub mod context;
pub mod deck;
pub mod effect;
pub mod events;
pub mod modifier;
pub mod path;
pub mod scoring;
pub mod shot;
pub mod state;
pub mod terrain;

pub use aoe::{combined_weights, compute_aoe, pick_landing, pick_weighted, swing_weights};
pub use card::{CardData, CardInstance, CardRegistry, CardType, Rarity};
pub use club::{ClubId, ClubStats, ClubTable};
pub use context::{
    AoeShape, FLAG_HIT_SAND, FLAG_HIT_TREE, FLAG_HIT_WATER, FLAG_OUT_OF_BOUNDS,
    FLAG_PERFECT_ACCURACY, FLAG_REACHED_FLAG, MetaValue, ShotContext, SwingResult,
};
pub use deck::{DeckState, MODIFIER_DECK, modifier_deck_ids};
pub use effect::{DistanceRule, EffectKind, EffectSpec, Phase, Scaled, TileTarget, Trigger};
pub use events::{EventBus, ShotEvent, ShotListener};
pub use modifier::{
    CardModifier, HookEnv, LieModifier, Modifier, ModifierHandle, ModifierManager, Pass,
    WindModifier,
};
pub use path::{curve_factor, roll_distance, simulate_ball_path};
pub use scoring::{base_chips, compute_scoring, score_formula};
pub use shot::{ShotManager, ShotPhase, ShotResult};
pub use state::{GolfRng, RngState, RunState, STARTER_DECK, Wind};
pub use terrain::{
    Course, GridCourse, Slope, SlopeKind, TerrainKind, TerrainModifier, TerrainTable, TileEdit,
    TileInfo,
};
