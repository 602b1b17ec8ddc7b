//! Scorecard
//!
//! Records every completed shot and keeps a best-shot leaderboard. Subscribe
//! it to a `ShotManager` to have it fill itself in.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_BEST_SHOTS;
use crate::hex::Hex;
use crate::sim::club::ClubId;
use crate::sim::events::{ShotEvent, ShotListener};
use crate::sim::shot::ShotResult;
use crate::sim::terrain::TerrainKind;

/// One completed shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    pub shot_index: u32,
    pub club: ClubId,
    pub start: Hex,
    pub rest: Hex,
    pub finish: Option<TerrainKind>,
    pub distance: f32,
    pub chips: i64,
    pub mult: f64,
    pub score: i64,
    pub penalty_strokes: u32,
    pub holed: bool,
}

impl ShotRecord {
    pub fn from_result(result: &ShotResult) -> Self {
        let ctx = &result.context;
        Self {
            shot_index: ctx.shot_index_in_hole,
            club: ctx.club,
            start: ctx.start_tile,
            rest: ctx.rest_tile,
            finish: ctx.rest_terrain,
            distance: ctx.distance_traveled,
            chips: ctx.chips,
            mult: ctx.mult,
            score: result.final_score,
            penalty_strokes: result.penalty_strokes,
            holed: result.holed,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scorecard {
    /// In play order
    pub shots: Vec<ShotRecord>,
    /// Highest scoring shots, best first
    pub best: Vec<ShotRecord>,
    #[serde(default)]
    pub cancelled: u32,
}

impl Scorecard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score makes the best-shot list
    pub fn qualifies(&self, score: i64) -> bool {
        if score <= 0 {
            return false;
        }
        if self.best.len() < MAX_BEST_SHOTS {
            return true;
        }
        self.best.last().is_none_or(|e| score > e.score)
    }

    /// Record a shot. Returns its leaderboard rank (1-indexed) if it made it.
    pub fn add_shot(&mut self, record: ShotRecord) -> Option<usize> {
        self.shots.push(record.clone());
        if !self.qualifies(record.score) {
            return None;
        }

        // Sorted descending; ties keep the earlier shot ahead
        let pos = self.best.iter().position(|e| record.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.best.insert(i, record);
                i + 1
            }
            None => {
                self.best.push(record);
                self.best.len()
            }
        };
        self.best.truncate(MAX_BEST_SHOTS);
        Some(rank)
    }

    pub fn total(&self) -> i64 {
        self.shots.iter().map(|s| s.score).sum()
    }

    /// Strokes including penalties
    pub fn strokes(&self) -> u32 {
        self.shots.iter().map(|s| 1 + s.penalty_strokes).sum()
    }

    pub fn top_score(&self) -> Option<i64> {
        self.best.first().map(|e| e.score)
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }
}

impl ShotListener for Scorecard {
    fn on_event(&mut self, event: &ShotEvent<'_>) {
        match event {
            ShotEvent::ShotCompleted(result) => {
                if let Some(rank) = self.add_shot(ShotRecord::from_result(result)) {
                    log::info!("Shot scored {} (#{} best)", result.final_score, rank);
                }
            }
            ShotEvent::ShotCancelled { .. } => self.cancelled += 1,
            _ => {}
        }
    }
}
