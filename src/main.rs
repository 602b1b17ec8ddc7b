//! That Golf Game headless demo
//!
//! Plays the sample hole with a fixed seed and a simulated swing meter,
//! logging every shot.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("That Golf Game (headless) starting...");

    if let Err(e) = demo::play_sample_hole(2024) {
        log::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host on wasm
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cell::RefCell;
    use std::error::Error;
    use std::rc::Rc;
    use std::sync::Arc;

    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use that_golf_game::Settings;
    use that_golf_game::hex::HexDir;
    use that_golf_game::persistence::SaveEnvelope;
    use that_golf_game::scorecard::Scorecard;
    use that_golf_game::sim::{
        CardRegistry, GridCourse, RunState, STARTER_DECK, ShotManager, SwingResult, Wind,
    };

    /// Safety stop for a ball that never finds the flag
    const MAX_SHOTS: u32 = 12;

    /// Swing meter stand-in. Uses its own RNG so the run stream only sees
    /// what the pipeline draws.
    fn swing(meter: &mut Pcg32) -> SwingResult {
        SwingResult::new(
            meter.random_range(0.85..=1.0),
            meter.random_range(0.5..=1.0),
            meter.random_range(-0.3..=0.3),
        )
    }

    pub fn play_sample_hole(seed: u64) -> Result<(), Box<dyn Error>> {
        let registry = Arc::new(CardRegistry::builtin()?);
        let mut run = RunState::new(seed, Settings::default(), registry, &STARTER_DECK)?
            .with_modifier_deck()?;
        run.add_joker("bounce_house")?;

        let mut course = GridCourse::sample_hole();
        let flag = course.flag;
        run.start_hole(course.tee, Some(Wind::new(HexDir::NorthEast, 1.0)));

        let scorecard = Rc::new(RefCell::new(Scorecard::new()));
        let mut manager = ShotManager::new();
        manager.subscribe(Box::new(scorecard.clone()));
        let mut meter = Pcg32::seed_from_u64(seed ^ 0xFACE);

        while !run.hole_complete && run.shot_index < MAX_SHOTS {
            let lie = run.lie(&course)?;
            let row = run.terrain.get(lie).clone();
            let club = run
                .clubs
                .club_for_distance(run.ball.distance(flag), |c| row.allows(c));

            manager.begin_shot(&mut run, &course, club)?;
            let offered: Vec<(String, u32)> = manager
                .draw_candidates(&mut run)?
                .iter()
                .map(|c| (c.data.name.clone(), c.data.tempo))
                .collect();
            if let Some(pick) = offered
                .iter()
                .position(|(_, tempo)| *tempo <= manager.tempo_remaining(&run))
            {
                manager.play_candidate(&mut run, pick)?;
                log::info!("Playing {} (offered {:?})", offered[pick].0, offered);
            }

            let ctx = manager.aim_tile_selected(&mut run, &course, flag)?;
            log::info!(
                "{} from {:?} aimed at {}, {} tiles in the zone",
                ctx.club.as_str(),
                ctx.lie,
                ctx.aim_tile,
                ctx.aoe_tiles.len()
            );

            let result = manager.swing_completed(&mut run, &mut course, swing(&mut meter))?;
            let ctx = &result.context;
            println!(
                "Shot {:>2}: {:<14} {} -> {} ({:?}) {:>5.1} cells  {:>4} chips x {:.2} = {}",
                ctx.shot_index_in_hole + 1,
                ctx.club.as_str(),
                ctx.start_tile,
                ctx.rest_tile,
                ctx.rest_terrain,
                ctx.distance_traveled,
                ctx.chips,
                ctx.mult,
                result.final_score
            );
        }

        let card = scorecard.borrow();
        println!(
            "\n{} in {} strokes, {} points (best shot {})",
            if run.hole_complete { "Holed" } else { "Gave up" },
            card.strokes(),
            card.total(),
            card.top_score().unwrap_or(0)
        );

        let save = SaveEnvelope::capture(&run).to_json()?;
        log::info!("Run save is {} bytes", save.len());
        Ok(())
    }
}
