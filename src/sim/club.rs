//! Club data
//!
//! Read-only per-club stats consumed when a shot is prepared.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Club identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClubId {
    Driver,
    ThreeWood,
    FiveIron,
    SevenIron,
    NineIron,
    PitchingWedge,
    SandWedge,
    Putter,
}

impl ClubId {
    pub const ALL: [ClubId; 8] = [
        ClubId::Driver,
        ClubId::ThreeWood,
        ClubId::FiveIron,
        ClubId::SevenIron,
        ClubId::NineIron,
        ClubId::PitchingWedge,
        ClubId::SandWedge,
        ClubId::Putter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClubId::Driver => "Driver",
            ClubId::ThreeWood => "3 Wood",
            ClubId::FiveIron => "5 Iron",
            ClubId::SevenIron => "7 Iron",
            ClubId::NineIron => "9 Iron",
            ClubId::PitchingWedge => "Pitching Wedge",
            ClubId::SandWedge => "Sand Wedge",
            ClubId::Putter => "Putter",
        }
    }
}

/// Static stats for one club
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClubStats {
    /// Full-power carry in tiles
    pub max_distance: u32,
    /// Base AOE radius in rings
    pub accuracy_rings: u32,
    /// Tiles of roll after landing on neutral terrain
    pub roll_tiles: u32,
    /// Loft in degrees
    pub loft: f32,
    /// Peak of the flight arc (0 = along the ground, 1 = highest)
    pub arc_height: f32,
    /// How strongly a poor swing spreads the landing (0..1)
    pub swing_difficulty: f32,
}

impl ClubStats {
    const fn new(
        max_distance: u32,
        accuracy_rings: u32,
        roll_tiles: u32,
        loft: f32,
        arc_height: f32,
        swing_difficulty: f32,
    ) -> Self {
        Self {
            max_distance,
            accuracy_rings,
            roll_tiles,
            loft,
            arc_height,
            swing_difficulty,
        }
    }

    /// Fallback for a club missing from a table
    pub const NEUTRAL: ClubStats = ClubStats::new(1, 0, 0, 45.0, 0.5, 0.5);
}

/// Club id -> stats lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubTable {
    clubs: HashMap<ClubId, ClubStats>,
}

impl Default for ClubTable {
    fn default() -> Self {
        let clubs = ClubId::ALL
            .into_iter()
            .map(|id| (id, default_stats(id)))
            .collect();
        Self { clubs }
    }
}

fn default_stats(id: ClubId) -> ClubStats {
    match id {
        ClubId::Driver => ClubStats::new(22, 1, 2, 10.5, 0.6, 1.0),
        ClubId::ThreeWood => ClubStats::new(19, 1, 2, 15.0, 0.7, 0.9),
        ClubId::FiveIron => ClubStats::new(15, 1, 1, 26.0, 0.8, 0.7),
        ClubId::SevenIron => ClubStats::new(12, 1, 1, 34.0, 0.9, 0.6),
        ClubId::NineIron => ClubStats::new(9, 1, 0, 42.0, 1.0, 0.5),
        ClubId::PitchingWedge => ClubStats::new(7, 1, 0, 46.0, 1.0, 0.4),
        ClubId::SandWedge => ClubStats::new(5, 1, 0, 56.0, 1.0, 0.4),
        ClubId::Putter => ClubStats::new(6, 0, 0, 3.0, 0.0, 0.2),
    }
}

impl ClubTable {
    /// Parse a complete club table; every club must be present
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let clubs: HashMap<ClubId, ClubStats> =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse {
                what: "club table",
                source,
            })?;
        if let Some(missing) = ClubId::ALL.into_iter().find(|id| !clubs.contains_key(id)) {
            return Err(ConfigError::MissingClub(missing));
        }
        Ok(Self { clubs })
    }

    /// Stats for a club (neutral stats if the table lacks it)
    pub fn get(&self, id: ClubId) -> ClubStats {
        match self.clubs.get(&id) {
            Some(stats) => *stats,
            None => {
                log::warn!("No stats for {:?}, using neutral club", id);
                ClubStats::NEUTRAL
            }
        }
    }

    pub fn set(&mut self, id: ClubId, stats: ClubStats) {
        self.clubs.insert(id, stats);
    }

    /// Longest-range club that can reach `distance` tiles, or the shortest
    /// club that overshoots least when none fall short
    pub fn club_for_distance(&self, distance: u32, allowed: impl Fn(ClubId) -> bool) -> ClubId {
        let mut candidates: Vec<(ClubId, u32)> = ClubId::ALL
            .into_iter()
            .filter(|id| allowed(*id))
            .map(|id| (id, self.get(id).max_distance))
            .collect();
        candidates.sort_by_key(|(_, d)| *d);
        candidates
            .iter()
            .find(|(_, d)| *d >= distance)
            .or_else(|| candidates.last())
            .map(|(id, _)| *id)
            .unwrap_or(ClubId::Putter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_driver_stats() {
        let table = ClubTable::default();
        let driver = table.get(ClubId::Driver);
        assert_eq!(driver.max_distance, 22);
        assert_eq!(driver.accuracy_rings, 1);
    }

    #[test]
    fn test_from_json_requires_every_club() {
        let err = ClubTable::from_json(
            r#"{ "driver": { "max_distance": 20, "accuracy_rings": 1, "roll_tiles": 2,
                 "loft": 10.0, "arc_height": 0.6, "swing_difficulty": 1.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingClub(ClubId::ThreeWood)));
    }

    #[test]
    fn test_club_for_distance() {
        let table = ClubTable::default();
        assert_eq!(table.club_for_distance(4, |_| true), ClubId::SandWedge);
        assert_eq!(table.club_for_distance(30, |_| true), ClubId::Driver);
        assert_eq!(
            table.club_for_distance(30, |id| id != ClubId::Driver),
            ClubId::ThreeWood
        );
    }
}
