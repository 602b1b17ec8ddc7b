//! Shot pipeline
//!
//! `ShotManager` walks one shot through its phases. The two points where a
//! player has to act (choosing the aim tile and finishing the swing meter)
//! are separate calls, so the caller drives the pipeline:
//!
//! ```text
//! Idle --begin_shot--> Setup --start_aiming--> AwaitingAim
//!      --aim_tile_selected--> AwaitingSwing --swing_completed--> Idle
//! ```
//!
//! `swing_cancelled` returns to `Idle` from any phase and restores the decks
//! and RNG as they were before `begin_shot`.

use serde::{Deserialize, Serialize};

use super::aoe::{compute_aoe, pick_landing};
use super::card::CardInstance;
use super::club::ClubId;
use super::context::{ShotContext, SwingResult};
use super::deck::DeckState;
use super::effect::Phase;
use super::events::{EventBus, ShotEvent, ShotListener};
use super::modifier::{CardModifier, LieModifier, ModifierManager, WindModifier};
use super::path::simulate_ball_path;
use super::scoring::compute_scoring;
use super::state::{GolfRng, RunState};
use super::terrain::{Course, TerrainKind};
use crate::error::ShotError;
use crate::hex::Hex;

/// Where the current shot is waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShotPhase {
    /// No shot in progress
    #[default]
    Idle,
    /// Shot prepared; cards may be drawn and played
    Setup,
    /// Waiting for the aim tile
    AwaitingAim,
    /// AOE shown; waiting for the swing meter
    AwaitingSwing,
}

impl ShotPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotPhase::Idle => "Idle",
            ShotPhase::Setup => "Setup",
            ShotPhase::AwaitingAim => "AwaitingAim",
            ShotPhase::AwaitingSwing => "AwaitingSwing",
        }
    }
}

/// A finished shot
#[derive(Debug, Clone, PartialEq)]
pub struct ShotResult {
    pub context: ShotContext,
    pub final_score: i64,
    /// The ball finished on the flag
    pub holed: bool,
    pub penalty_strokes: u32,
}

/// Run state captured at `begin_shot` so a cancelled shot commits nothing
#[derive(Debug, Clone)]
struct Checkpoint {
    deck: DeckState,
    modifier_deck: Option<DeckState>,
    jokers: Vec<CardInstance>,
    rng: GolfRng,
}

impl Checkpoint {
    fn take(run: &RunState) -> Self {
        Self {
            deck: run.deck.clone(),
            modifier_deck: run.modifier_deck.clone(),
            jokers: run.jokers.clone(),
            rng: run.rng.clone(),
        }
    }

    fn restore(self, run: &mut RunState) {
        run.deck = self.deck;
        run.modifier_deck = self.modifier_deck;
        run.jokers = self.jokers;
        run.rng = self.rng;
    }
}

#[derive(Debug, Default)]
pub struct ShotManager {
    phase: ShotPhase,
    shot: Option<ShotContext>,
    modifiers: ModifierManager,
    events: EventBus,
    checkpoint: Option<Checkpoint>,
    tempo_used: u32,
}

impl ShotManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ShotPhase {
        self.phase
    }

    /// The in-flight shot, if any
    pub fn context(&self) -> Option<&ShotContext> {
        self.shot.as_ref()
    }

    pub fn subscribe(&mut self, listener: Box<dyn ShotListener>) {
        self.events.subscribe(listener);
    }

    pub fn tempo_remaining(&self, run: &RunState) -> u32 {
        run.settings.tempo_per_shot.saturating_sub(self.tempo_used)
    }

    fn require(&self, expected: ShotPhase) -> Result<(), ShotError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ShotError::WrongPhase {
                expected: expected.as_str(),
                actual: self.phase,
            })
        }
    }

    fn wrong_phase(&self, expected: ShotPhase) -> ShotError {
        ShotError::WrongPhase {
            expected: expected.as_str(),
            actual: self.phase,
        }
    }

    /// Prepare a shot from the ball's current tile
    pub fn begin_shot(
        &mut self,
        run: &mut RunState,
        course: &dyn Course,
        club: ClubId,
    ) -> Result<&ShotContext, ShotError> {
        self.require(ShotPhase::Idle)?;
        if run.hole_complete {
            return Err(ShotError::HoleComplete);
        }
        let lie = run.lie(course)?;
        if !run.terrain.get(lie).allows(club) {
            return Err(ShotError::ClubNotAllowed { club, lie });
        }

        self.checkpoint = Some(Checkpoint::take(run));
        self.modifiers.clear();
        self.tempo_used = 0;

        run.deck.clear_active_cards();
        if let Some(modifier_deck) = run.modifier_deck.as_mut() {
            modifier_deck.clear_active_cards();
            match modifier_deck.draw_card(&mut run.rng) {
                Some(card) => log::debug!("Modifier card: {}", card.data.name),
                None => log::warn!("Modifier deck is empty"),
            }
        }

        let mut ctx = ShotContext::new(
            run.ball,
            club,
            run.clubs.get(club),
            lie,
            run.shot_index,
            run.settings.stop_at_hazard,
        );
        ctx.allowed_clubs = run.terrain.get(lie).allowed_clubs.clone();
        log::debug!(
            "Shot {} from {} ({:?}) with {}",
            run.shot_index,
            run.ball,
            lie,
            club.as_str()
        );
        self.phase = ShotPhase::Setup;
        let ctx = self.shot.insert(ctx);
        self.events.emit(ShotEvent::ShotStarted(ctx));
        Ok(ctx)
    }

    /// Offer candidate cards for this shot
    pub fn draw_candidates<'r>(
        &mut self,
        run: &'r mut RunState,
    ) -> Result<&'r [CardInstance], ShotError> {
        self.require(ShotPhase::Setup)?;
        let count = run.settings.candidate_count;
        Ok(run.deck.draw_candidates(count, &mut run.rng))
    }

    /// Play one candidate, paying its tempo
    pub fn play_candidate(&mut self, run: &mut RunState, index: usize) -> Result<(), ShotError> {
        self.require(ShotPhase::Setup)?;
        let card = run
            .deck
            .candidates
            .get(index)
            .ok_or(ShotError::NoSuchCandidate(index))?;
        let needed = card.data.tempo;
        let remaining = self.tempo_remaining(run);
        if needed > remaining {
            return Err(ShotError::TempoExhausted { needed, remaining });
        }
        if let Some(card) = run.deck.play_candidate(index) {
            log::debug!("Played {} (tempo {needed})", card.data.name);
        }
        self.tempo_used += needed;
        Ok(())
    }

    pub fn discard_candidates(&mut self, run: &mut RunState) -> Result<(), ShotError> {
        self.require(ShotPhase::Setup)?;
        run.deck.discard_candidates();
        Ok(())
    }

    /// Close the card step, register modifiers, and run `BeforeAim`
    pub fn start_aiming(&mut self, run: &mut RunState, course: &dyn Course) -> Result<(), ShotError> {
        self.require(ShotPhase::Setup)?;
        let missing = self.wrong_phase(ShotPhase::Setup);
        let ctx = self.shot.as_mut().ok_or(missing)?;
        run.deck.discard_candidates();

        self.modifiers.clear();
        self.modifiers.add(Box::new(LieModifier {
            terrain: ctx.lie,
            row: run.terrain.get(ctx.lie).clone(),
            slope: course.slope(ctx.start_tile),
        }));
        if let Some(wind) = run.wind.filter(|w| w.strength > 0.0) {
            self.modifiers.add(Box::new(WindModifier {
                wind,
                curve_factor: run.settings.wind_curve_factor,
            }));
        }
        if let Some(modifier_deck) = run.modifier_deck.as_ref() {
            for card in &modifier_deck.active {
                self.modifiers.add(Box::new(CardModifier::new(card.clone())));
            }
        }
        for card in &run.deck.active {
            self.modifiers.add(Box::new(CardModifier::new(card.clone())));
        }
        for joker in run.jokers.iter_mut() {
            if joker.is_exhausted {
                continue;
            }
            if joker.data.is_limited() {
                joker.use_once();
            }
            self.modifiers.add(Box::new(CardModifier::new(joker.clone())));
        }
        log::debug!("Modifiers: {:?}", self.modifiers.names());

        self.modifiers
            .dispatch(Phase::BeforeAim, ctx, &mut run.rng, &run.clubs);
        self.phase = ShotPhase::AwaitingAim;
        Ok(())
    }

    /// The player picked a tile: build the landing zone
    pub fn aim_tile_selected(
        &mut self,
        run: &mut RunState,
        course: &dyn Course,
        tile: Hex,
    ) -> Result<&ShotContext, ShotError> {
        if self.phase == ShotPhase::Setup {
            self.start_aiming(run, course)?;
        }
        self.require(ShotPhase::AwaitingAim)?;
        let missing = self.wrong_phase(ShotPhase::AwaitingAim);
        let ctx = self.shot.as_mut().ok_or(missing)?;

        // Out-of-range aims are pulled back along the line
        let range = ctx.effective_distance();
        let mut aim = tile;
        if ctx.start_tile.distance(tile) > range {
            let line = ctx.start_tile.line_to(tile);
            aim = line.get(range as usize).copied().unwrap_or(tile);
            log::debug!("Aim {tile} beyond range {range}, clamped to {aim}");
        }
        ctx.aim_tile = aim;

        ctx.aoe_radius = ctx.base_aoe_radius();
        ctx.aoe_tiles = compute_aoe(aim, ctx.aoe_radius, ctx.aoe_shape, ctx.shot_direction());
        self.modifiers
            .dispatch(Phase::OnAoe, ctx, &mut run.rng, &run.clubs);
        ctx.aoe_radius = ctx.aoe_radius.max(0);
        ctx.aoe_tiles = compute_aoe(aim, ctx.aoe_radius, ctx.aoe_shape, ctx.shot_direction());

        self.phase = ShotPhase::AwaitingSwing;
        self.events.emit(ShotEvent::AoeComputed(ctx));
        Ok(ctx)
    }

    /// The swing meter finished: resolve the rest of the shot
    pub fn swing_completed(
        &mut self,
        run: &mut RunState,
        course: &mut dyn Course,
        swing: SwingResult,
    ) -> Result<ShotResult, ShotError> {
        self.require(ShotPhase::AwaitingSwing)?;
        let mut ctx = self
            .shot
            .take()
            .ok_or(self.wrong_phase(ShotPhase::AwaitingSwing))?;

        let swing = swing.clamped();
        ctx.swing_power = swing.power;
        ctx.swing_accuracy = swing.accuracy;
        ctx.swing_curve = swing.curve;
        ctx.curve_strength += swing.curve * run.settings.swing_curve_scale;

        // A weak swing drops the zone short of the aim
        let mut center = ctx.aim_tile;
        if swing.power < 1.0 {
            let line = ctx.start_tile.line_to(ctx.aim_tile);
            let reach = (ctx.start_tile.distance(ctx.aim_tile) as f32 * swing.power).round() as usize;
            center = line.get(reach).copied().unwrap_or(ctx.aim_tile);
            ctx.recenter_aoe(center);
        }

        let mut tiles: Vec<Hex> = ctx
            .aoe_tiles
            .iter()
            .copied()
            .filter(|t| course.terrain(*t).is_some())
            .collect();
        if tiles.is_empty() {
            log::warn!("Landing zone around {center} is entirely off the course");
            let fallback = if course.terrain(center).is_some() {
                center
            } else {
                ctx.start_tile
            };
            tiles.push(fallback);
        }
        let landing = pick_landing(
            &tiles,
            center,
            swing.accuracy,
            ctx.club_stats.swing_difficulty,
            ctx.aoe_weights.as_ref(),
            &mut run.rng,
        )
        .unwrap_or(tiles[0]);
        ctx.landing_tile = landing;
        ctx.landing_terrain = course.terrain(landing);

        self.modifiers
            .dispatch(Phase::OnLanding, &mut ctx, &mut run.rng, &run.clubs);
        self.events.emit(ShotEvent::LandingResolved(&ctx));

        simulate_ball_path(&mut ctx, &*course, &run.terrain, &run.settings);

        compute_scoring(&mut ctx, &run.terrain, &run.settings);
        self.modifiers
            .dispatch(Phase::OnScoring, &mut ctx, &mut run.rng, &run.clubs);
        let final_score = ctx.finalize_score();
        self.events.emit(ShotEvent::ScoringComputed(&ctx));

        self.modifiers
            .dispatch(Phase::AfterShot, &mut ctx, &mut run.rng, &run.clubs);
        for (tile, edit) in &ctx.tile_edits {
            course.apply_tile_edit(*tile, edit);
        }

        // Run bookkeeping
        let in_water = ctx.rest_terrain == Some(TerrainKind::Water) && ctx.stop_at_hazard;
        let penalty_strokes = if in_water {
            run.settings.water_penalty_strokes
        } else {
            0
        };
        run.ball = if in_water { ctx.start_tile } else { ctx.rest_tile };
        let holed = ctx.rest_terrain == Some(TerrainKind::Flag);
        run.strokes += 1 + penalty_strokes;
        run.shot_index += 1;
        run.shots_taken += 1;
        run.hole_score += final_score;
        run.total_score += final_score;
        if holed {
            run.hole_complete = true;
            log::info!("Holed out in {} strokes", run.strokes);
        }

        self.cleanup(run);

        log::info!(
            "Shot {} scored {} ({} chips x {:.2})",
            ctx.shot_index_in_hole,
            final_score,
            ctx.chips,
            ctx.mult
        );
        let result = ShotResult {
            context: ctx,
            final_score,
            holed,
            penalty_strokes,
        };
        self.events.emit(ShotEvent::ShotCompleted(&result));
        Ok(result)
    }

    /// Abandon the in-flight shot without committing anything
    pub fn swing_cancelled(&mut self, run: &mut RunState) -> Result<(), ShotError> {
        if self.phase == ShotPhase::Idle {
            return Err(ShotError::WrongPhase {
                expected: "a shot in progress",
                actual: self.phase,
            });
        }
        if let Some(checkpoint) = self.checkpoint.take() {
            checkpoint.restore(run);
        }
        self.shot = None;
        self.modifiers.clear();
        self.tempo_used = 0;
        self.phase = ShotPhase::Idle;
        log::debug!("Shot {} cancelled", run.shot_index);
        self.events.emit(ShotEvent::ShotCancelled {
            shot_index: run.shot_index,
        });
        Ok(())
    }

    /// Shot-completed boundary: piles settle and pending reshuffles run
    fn cleanup(&mut self, run: &mut RunState) {
        run.deck.clear_active_cards();
        if run.deck.resolve_pending_reshuffle(&mut run.rng) {
            log::info!("Deck reshuffled");
        }
        if let Some(modifier_deck) = run.modifier_deck.as_mut() {
            modifier_deck.clear_active_cards();
            if modifier_deck.resolve_pending_reshuffle(&mut run.rng) {
                log::info!("Modifier deck reshuffled");
            }
        }
        self.modifiers.clear();
        self.checkpoint = None;
        self.tempo_used = 0;
        self.phase = ShotPhase::Idle;
    }

    /// Play a whole shot without a card step
    pub fn play_shot(
        &mut self,
        run: &mut RunState,
        course: &mut dyn Course,
        club: ClubId,
        aim: Hex,
        swing: SwingResult,
    ) -> Result<ShotResult, ShotError> {
        self.begin_shot(run, &*course, club)?;
        self.aim_tile_selected(run, &*course, aim)?;
        self.swing_completed(run, course, swing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::settings::Settings;
    use crate::sim::card::CardRegistry;
    use crate::sim::terrain::GridCourse;

    fn run_with(deck: &[&str]) -> RunState {
        let registry = Arc::new(CardRegistry::builtin().unwrap());
        RunState::new(5, Settings::default(), registry, deck).unwrap()
    }

    fn fairway() -> GridCourse {
        GridCourse::filled(Hex::ORIGIN, 30, TerrainKind::Fairway)
    }

    #[test]
    fn test_inputs_in_wrong_phase_are_rejected() {
        let mut run = run_with(&["power_swing"]);
        let mut course = fairway();
        let mut manager = ShotManager::new();
        assert!(matches!(
            manager.aim_tile_selected(&mut run, &course, Hex::new(5, 0)),
            Err(ShotError::WrongPhase { .. })
        ));
        assert!(manager.swing_cancelled(&mut run).is_err());

        manager.begin_shot(&mut run, &course, ClubId::Driver).unwrap();
        assert!(matches!(
            manager.swing_completed(&mut run, &mut course, SwingResult::PERFECT),
            Err(ShotError::WrongPhase {
                actual: ShotPhase::Setup,
                ..
            })
        ));
        assert!(manager.begin_shot(&mut run, &course, ClubId::Driver).is_err());
    }

    #[test]
    fn test_club_restricted_by_lie() {
        let mut run = run_with(&["power_swing"]);
        let mut course = fairway();
        course.set(Hex::ORIGIN, TerrainKind::Sand);
        let mut manager = ShotManager::new();
        assert_eq!(
            manager.begin_shot(&mut run, &course, ClubId::Driver).unwrap_err(),
            ShotError::ClubNotAllowed {
                club: ClubId::Driver,
                lie: TerrainKind::Sand
            }
        );
        assert!(manager.begin_shot(&mut run, &course, ClubId::SandWedge).is_ok());
    }

    #[test]
    fn test_club_card_cannot_bypass_lie() {
        let mut run = run_with(&["club_driver"]);
        let mut course = fairway();
        course.set(Hex::ORIGIN, TerrainKind::Sand);
        let mut manager = ShotManager::new();
        manager.begin_shot(&mut run, &course, ClubId::SandWedge).unwrap();
        manager.draw_candidates(&mut run).unwrap();
        manager.play_candidate(&mut run, 0).unwrap();
        let ctx = manager
            .aim_tile_selected(&mut run, &course, Hex::new(20, 0))
            .unwrap();
        assert_eq!(ctx.club, ClubId::SandWedge);
        assert_eq!(ctx.club_stats, run.clubs.get(ClubId::SandWedge));
        assert!(ctx.effective_distance() < run.clubs.get(ClubId::Driver).max_distance);

        // From the fairway the same card does swap clubs
        let mut run = run_with(&["club_driver"]);
        let course = fairway();
        let mut manager = ShotManager::new();
        manager
            .begin_shot(&mut run, &course, ClubId::PitchingWedge)
            .unwrap();
        manager.draw_candidates(&mut run).unwrap();
        manager.play_candidate(&mut run, 0).unwrap();
        let ctx = manager
            .aim_tile_selected(&mut run, &course, Hex::new(20, 0))
            .unwrap();
        assert_eq!(ctx.club, ClubId::Driver);
    }

    #[test]
    fn test_tempo_budget() {
        // power_swing costs 2, the budget is 3
        let mut run = run_with(&["power_swing", "power_swing", "power_swing"]);
        let course = fairway();
        let mut manager = ShotManager::new();
        manager.begin_shot(&mut run, &course, ClubId::Driver).unwrap();
        assert_eq!(manager.draw_candidates(&mut run).unwrap().len(), 3);
        manager.play_candidate(&mut run, 0).unwrap();
        assert_eq!(
            manager.play_candidate(&mut run, 0),
            Err(ShotError::TempoExhausted {
                needed: 2,
                remaining: 1
            })
        );
        assert_eq!(
            manager.play_candidate(&mut run, 7),
            Err(ShotError::NoSuchCandidate(7))
        );
        manager.start_aiming(&mut run, &course).unwrap();
        assert!(run.deck.candidates.is_empty());
        assert_eq!(run.deck.discard.len(), 2);
        assert_eq!(run.deck.active.len(), 1);
    }

    #[test]
    fn test_played_card_changes_the_shot() {
        let mut run = run_with(&["power_swing"]);
        let course = fairway();
        let mut manager = ShotManager::new();
        manager.begin_shot(&mut run, &course, ClubId::Driver).unwrap();
        manager.draw_candidates(&mut run).unwrap();
        manager.play_candidate(&mut run, 0).unwrap();
        let ctx = manager
            .aim_tile_selected(&mut run, &course, Hex::new(40, 0))
            .unwrap();
        // Driver 22, fairway -1, power_swing +3
        assert_eq!(ctx.effective_distance(), 24);
        assert_eq!(ctx.aim_tile, Hex::new(24, 0));
    }

    #[test]
    fn test_cancel_restores_decks_and_rng() {
        let mut run = run_with(&["power_swing", "laser_focus", "backspin"]);
        let course = fairway();
        let before_deck = run.deck.clone();
        let before_rng = run.rng.clone();

        let mut manager = ShotManager::new();
        manager.begin_shot(&mut run, &course, ClubId::Driver).unwrap();
        manager.draw_candidates(&mut run).unwrap();
        manager.play_candidate(&mut run, 0).unwrap();
        manager
            .aim_tile_selected(&mut run, &course, Hex::new(10, 0))
            .unwrap();
        manager.swing_cancelled(&mut run).unwrap();

        assert_eq!(manager.phase(), ShotPhase::Idle);
        assert!(manager.context().is_none());
        assert_eq!(run.deck, before_deck);
        assert_eq!(run.rng, before_rng);
        assert_eq!(run.shot_index, 0);
        assert_eq!(run.ball, Hex::ORIGIN);
    }

    #[test]
    fn test_water_returns_ball_with_penalty() {
        let mut run = run_with(&["power_swing"]);
        let mut course = fairway();
        course.set(Hex::new(8, 0), TerrainKind::Water);
        let mut manager = ShotManager::new();
        let result = manager
            .play_shot(
                &mut run,
                &mut course,
                ClubId::NineIron,
                Hex::new(8, 0),
                SwingResult::PERFECT,
            )
            .unwrap();
        assert_eq!(result.penalty_strokes, 1);
        assert_eq!(run.ball, Hex::ORIGIN);
        assert_eq!(run.strokes, 2);
    }

    #[test]
    fn test_holing_out_completes_the_hole() {
        let mut run = run_with(&["power_swing"]);
        let mut course = fairway();
        course.set(Hex::new(6, 0), TerrainKind::Flag);
        let mut manager = ShotManager::new();
        let result = manager
            .play_shot(
                &mut run,
                &mut course,
                ClubId::NineIron,
                Hex::new(6, 0),
                SwingResult::PERFECT,
            )
            .unwrap();
        assert!(result.holed);
        assert!(run.hole_complete);
        assert_eq!(
            manager.begin_shot(&mut run, &course, ClubId::Putter).unwrap_err(),
            ShotError::HoleComplete
        );
    }
}
