//! End-to-end shot scenarios driven through `ShotManager`

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use that_golf_game::Settings;
use that_golf_game::hex::{Hex, HexDir};
use that_golf_game::persistence::SaveEnvelope;
use that_golf_game::scorecard::Scorecard;
use that_golf_game::sim::{
    CardInstance, CardRegistry, ClubId, Course, GridCourse, RunState, STARTER_DECK, ShotEvent,
    ShotListener, ShotManager, ShotPhase, SwingResult, TerrainKind,
};

fn ids(cards: &[CardInstance]) -> Vec<String> {
    cards.iter().map(|c| c.id().to_string()).collect()
}

fn registry() -> Arc<CardRegistry> {
    Arc::new(CardRegistry::builtin().unwrap())
}

fn run_with(seed: u64, deck: &[&str]) -> RunState {
    RunState::new(seed, Settings::default(), registry(), deck).unwrap()
}

fn fairway(radius: u32) -> GridCourse {
    GridCourse::filled(Hex::ORIGIN, radius, TerrainKind::Fairway)
}

#[derive(Default)]
struct Recorder(Vec<&'static str>);

impl ShotListener for Recorder {
    fn on_event(&mut self, event: &ShotEvent<'_>) {
        self.0.push(event.name());
    }
}

#[test]
fn driver_off_the_fairway() {
    let mut run = run_with(1, &STARTER_DECK);
    let mut course = fairway(30);
    let mut manager = ShotManager::new();

    let result = manager
        .play_shot(
            &mut run,
            &mut course,
            ClubId::Driver,
            Hex::new(21, 0),
            SwingResult::PERFECT,
        )
        .unwrap();
    let ctx = &result.context;

    // Driver 22 less the fairway's 1
    assert_eq!(ctx.effective_distance(), 21);
    assert_eq!(ctx.aoe_radius, 1);
    assert_eq!(ctx.aoe_tiles.len(), 7);
    assert_eq!(ctx.landing_tile, Hex::new(21, 0));
    assert_eq!(ctx.rest_tile, Hex::new(23, 0));
    assert_eq!(ctx.distance_traveled, 23.0);
    assert_eq!(ctx.base_chips, 23 * 5);
    assert!((ctx.mult - 1.1).abs() < 1e-9);
    assert_eq!(result.final_score, (115.0_f64 * 1.1).floor() as i64);
    assert!(!result.holed);

    assert_eq!(run.ball, Hex::new(23, 0));
    assert_eq!(run.strokes, 1);
    assert_eq!(run.shots_taken, 1);
    assert_eq!(run.total_score, result.final_score);
    assert_eq!(manager.phase(), ShotPhase::Idle);
}

#[test]
fn long_drive_threshold_is_inclusive() {
    let play = |aim: Hex| {
        let mut run = run_with(2, &["long_drive"]);
        let mut course = fairway(20);
        let mut manager = ShotManager::new();
        manager
            .begin_shot(&mut run, &course, ClubId::NineIron)
            .unwrap();
        assert_eq!(manager.draw_candidates(&mut run).unwrap().len(), 1);
        manager.play_candidate(&mut run, 0).unwrap();
        manager.aim_tile_selected(&mut run, &course, aim).unwrap();
        manager
            .swing_completed(&mut run, &mut course, SwingResult::PERFECT)
            .unwrap()
    };

    // Nine iron: 9 less 1 for the fairway, high loft so no roll
    let eight = play(Hex::new(8, 0));
    assert_eq!(eight.context.distance_traveled, 8.0);
    assert_eq!(eight.context.chips, eight.context.base_chips + 20);
    assert!((eight.context.mult - 1.6).abs() < 1e-6);

    let seven = play(Hex::new(7, 0));
    assert_eq!(seven.context.distance_traveled, 7.0);
    assert_eq!(seven.context.chips, seven.context.base_chips);
    assert!((seven.context.mult - 1.1).abs() < 1e-6);
}

#[test]
fn modifier_deck_reshuffles_within_twenty_shots() {
    let mut run = run_with(3, &STARTER_DECK).with_modifier_deck().unwrap();
    let mut course = fairway(120);
    let mut manager = ShotManager::new();

    for _ in 0..20 {
        let aim = run.ball.offset(HexDir::East, 3);
        manager
            .play_shot(
                &mut run,
                &mut course,
                ClubId::NineIron,
                aim,
                SwingResult::PERFECT,
            )
            .unwrap();

        let deck = run.modifier_deck.as_ref().unwrap();
        assert_eq!(deck.total(), 20);
        assert!(deck.active.is_empty());
        assert!(!deck.pending_reshuffle);
        assert!(!deck.draw.is_empty() || !deck.discard.is_empty());
    }
    assert!(run.modifier_deck.as_ref().unwrap().reshuffles >= 1);
}

fn play_hole(seed: u64) -> (Vec<(Hex, Hex, i64)>, RunState) {
    let mut run = run_with(seed, &STARTER_DECK).with_modifier_deck().unwrap();
    run.add_joker("bounce_house").unwrap();
    let mut course = GridCourse::sample_hole();
    let flag = course.flag;
    run.start_hole(course.tee, None);

    let mut manager = ShotManager::new();
    let mut shots = Vec::new();
    while !run.hole_complete && shots.len() < 8 {
        let lie = run.lie(&course).unwrap();
        let row = run.terrain.get(lie).clone();
        let club = run
            .clubs
            .club_for_distance(run.ball.distance(flag), |c| row.allows(c));
        manager.begin_shot(&mut run, &course, club).unwrap();
        let tempo = manager.tempo_remaining(&run);
        let pick = manager
            .draw_candidates(&mut run)
            .unwrap()
            .iter()
            .position(|c| c.data.tempo <= tempo);
        if let Some(pick) = pick {
            manager.play_candidate(&mut run, pick).unwrap();
        }
        manager.aim_tile_selected(&mut run, &course, flag).unwrap();
        let result = manager
            .swing_completed(&mut run, &mut course, SwingResult::new(0.9, 0.6, 0.2))
            .unwrap();
        shots.push((
            result.context.landing_tile,
            result.context.rest_tile,
            result.final_score,
        ));
    }
    (shots, run)
}

#[test]
fn same_seed_same_hole() {
    let (a, run_a) = play_hole(99);
    let (b, run_b) = play_hole(99);
    assert!(!a.is_empty());
    assert_eq!(a, b);
    assert_eq!(run_a.rng, run_b.rng);
    assert_eq!(run_a.deck, run_b.deck);
    assert_eq!(run_a.total_score, run_b.total_score);
}

#[test]
fn cancelled_shot_commits_nothing() {
    let mut run = run_with(4, &STARTER_DECK).with_modifier_deck().unwrap();
    run.add_joker("groundskeeper").unwrap();
    let mut course = fairway(30);
    let scorecard = Rc::new(RefCell::new(Scorecard::new()));
    let mut manager = ShotManager::new();
    manager.subscribe(Box::new(scorecard.clone()));

    let deck = run.deck.clone();
    let modifier_deck = run.modifier_deck.clone();
    let jokers = run.jokers.clone();
    let rng = run.rng.clone();

    manager.begin_shot(&mut run, &course, ClubId::Driver).unwrap();
    manager.draw_candidates(&mut run).unwrap();
    manager.play_candidate(&mut run, 0).unwrap();
    manager
        .aim_tile_selected(&mut run, &course, Hex::new(15, 0))
        .unwrap();
    // Limited joker spent a use when aiming started
    assert_eq!(run.jokers[0].uses_remaining, 0);
    manager.swing_cancelled(&mut run).unwrap();

    assert_eq!(manager.phase(), ShotPhase::Idle);
    assert_eq!(run.deck, deck);
    assert_eq!(run.modifier_deck, modifier_deck);
    assert_eq!(run.jokers, jokers);
    assert_eq!(run.rng, rng);
    assert_eq!(run.ball, Hex::ORIGIN);
    assert_eq!(run.strokes, 0);
    assert_eq!(course.terrain(Hex::ORIGIN), Some(TerrainKind::Fairway));
    assert_eq!(scorecard.borrow().cancelled, 1);
    assert!(scorecard.borrow().is_empty());

    // The next shot starts cleanly
    manager
        .play_shot(
            &mut run,
            &mut course,
            ClubId::NineIron,
            Hex::new(5, 0),
            SwingResult::PERFECT,
        )
        .unwrap();
    assert_eq!(scorecard.borrow().shots.len(), 1);
}

#[test]
fn events_fire_in_pipeline_order() {
    let mut run = run_with(5, &STARTER_DECK);
    let mut course = fairway(30);
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let mut manager = ShotManager::new();
    manager.subscribe(Box::new(recorder.clone()));

    manager
        .play_shot(
            &mut run,
            &mut course,
            ClubId::SevenIron,
            Hex::new(10, 0),
            SwingResult::PERFECT,
        )
        .unwrap();
    assert_eq!(
        recorder.borrow().0,
        vec![
            "shot_started",
            "aoe_computed",
            "landing_resolved",
            "scoring_computed",
            "shot_completed"
        ]
    );
}

#[test]
fn groundskeeper_edits_the_resting_tile() {
    let mut run = run_with(6, &STARTER_DECK);
    run.add_joker("groundskeeper").unwrap();
    let mut course = fairway(30);
    course.set(Hex::new(5, 0), TerrainKind::Rough);
    let mut manager = ShotManager::new();

    let result = manager
        .play_shot(
            &mut run,
            &mut course,
            ClubId::PitchingWedge,
            Hex::new(5, 0),
            SwingResult::PERFECT,
        )
        .unwrap();
    assert_eq!(result.context.rest_tile, Hex::new(5, 0));
    assert_eq!(result.context.rest_terrain, Some(TerrainKind::Rough));
    assert_eq!(course.terrain(Hex::new(5, 0)), Some(TerrainKind::Fairway));
    assert!(run.jokers[0].is_exhausted);
}

#[test]
fn save_and_resume_between_shots() {
    let mut run = run_with(7, &STARTER_DECK).with_modifier_deck().unwrap();
    run.add_joker("bounce_house").unwrap();
    let mut course = fairway(40);
    let mut manager = ShotManager::new();
    for aim in [Hex::new(9, 0), Hex::new(18, 0)] {
        manager
            .play_shot(
                &mut run,
                &mut course,
                ClubId::SevenIron,
                aim,
                SwingResult::PERFECT,
            )
            .unwrap();
    }

    let json = SaveEnvelope::capture(&run).to_json().unwrap();
    let mut restored = SaveEnvelope::from_json(&json)
        .unwrap()
        .restore(Settings::default(), run.registry.clone(), run.ball)
        .unwrap();

    assert_eq!(ids(&restored.deck.draw), ids(&run.deck.draw));
    assert_eq!(ids(&restored.deck.discard), ids(&run.deck.discard));
    assert_eq!(restored.deck.total(), run.deck.total());
    assert_eq!(restored.shots_taken, 2);
    assert_eq!(restored.total_score, run.total_score);
    assert_eq!(restored.ball, run.ball);

    let aim = restored.ball.offset(HexDir::East, 3);
    let result = manager
        .play_shot(
            &mut restored,
            &mut course,
            ClubId::SandWedge,
            aim,
            SwingResult::PERFECT,
        )
        .unwrap();
    assert!(result.final_score >= 0);
    assert_eq!(restored.shots_taken, 3);
}
