//! Terrain, lie modifiers, and the course collaborator
//!
//! The terrain table is authored data: one row per terrain kind holding the
//! lie deltas applied before aiming plus the scoring bonus for finishing on
//! that terrain. The course itself lives outside the core and is reached only
//! through the `Course` trait.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::club::ClubId;
use crate::error::ConfigError;
use crate::hex::{Hex, HexDir};

/// Terrain types a tile can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    Tee,
    Fairway,
    Rough,
    DeepRough,
    Sand,
    Green,
    Water,
    Tree,
    Flag,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 9] = [
        TerrainKind::Tee,
        TerrainKind::Fairway,
        TerrainKind::Rough,
        TerrainKind::DeepRough,
        TerrainKind::Sand,
        TerrainKind::Green,
        TerrainKind::Water,
        TerrainKind::Tree,
        TerrainKind::Flag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TerrainKind::Tee => "Tee",
            TerrainKind::Fairway => "Fairway",
            TerrainKind::Rough => "Rough",
            TerrainKind::DeepRough => "Deep Rough",
            TerrainKind::Sand => "Sand",
            TerrainKind::Green => "Green",
            TerrainKind::Water => "Water",
            TerrainKind::Tree => "Tree",
            TerrainKind::Flag => "Flag",
        }
    }

    /// Terrain that stops a ball under the stop-at-hazard rule
    pub fn is_hazard(&self) -> bool {
        matches!(
            self,
            TerrainKind::Sand | TerrainKind::Water | TerrainKind::Tree
        )
    }

    /// Firm terrain the ball bounces on
    pub fn is_bouncy(&self) -> bool {
        matches!(
            self,
            TerrainKind::Tee | TerrainKind::Fairway | TerrainKind::Green
        )
    }
}

/// Slope categories reported by the course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlopeKind {
    #[default]
    Flat,
    Uphill,
    Downhill,
    SideHill,
}

/// Slope under a tile
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Slope {
    pub kind: SlopeKind,
    pub strength: f32,
}

impl Slope {
    pub const FLAT: Slope = Slope {
        kind: SlopeKind::Flat,
        strength: 0.0,
    };

    pub fn new(kind: SlopeKind, strength: f32) -> Self {
        Self { kind, strength }
    }

    /// Power delta for a shot played from this slope
    pub fn power_delta(&self) -> i32 {
        match self.kind {
            SlopeKind::Uphill => -(2.0 * self.strength).round() as i32,
            SlopeKind::Downhill => self.strength.round() as i32,
            SlopeKind::Flat | SlopeKind::SideHill => 0,
        }
    }

    /// Accuracy (ring) delta for a shot played from this slope
    pub fn accuracy_delta(&self) -> i32 {
        match self.kind {
            SlopeKind::SideHill => 1,
            _ => 0,
        }
    }

    /// Extra roll tiles for a ball coming to rest on this slope
    pub fn roll_delta(&self) -> i32 {
        match self.kind {
            SlopeKind::Downhill => 1,
            SlopeKind::Uphill => -1,
            SlopeKind::Flat | SlopeKind::SideHill => 0,
        }
    }
}

/// One row of the terrain table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainModifier {
    /// Range delta in tiles
    pub power: i32,
    /// AOE ring delta (positive = less accurate)
    pub accuracy: i32,
    /// Spin delta; positive spin shortens roll
    pub spin: f32,
    /// Lateral curve delta in tiles
    pub curve: f32,
    /// Roll delta in tiles
    pub roll: i32,
    /// Roll multiplier for a ball landing on this terrain
    pub friction: f32,
    /// Flat chips for finishing here
    pub chip_bonus: i64,
    /// Mult for finishing here
    pub mult_bonus: f64,
    /// Clubs playable from this lie (empty = any)
    pub allowed_clubs: Vec<ClubId>,
}

impl Default for TerrainModifier {
    fn default() -> Self {
        Self {
            power: 0,
            accuracy: 0,
            spin: 0.0,
            curve: 0.0,
            roll: 0,
            friction: 1.0,
            chip_bonus: 0,
            mult_bonus: 0.0,
            allowed_clubs: Vec::new(),
        }
    }
}

impl TerrainModifier {
    /// A row that changes nothing
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn allows(&self, club: ClubId) -> bool {
        self.allowed_clubs.is_empty() || self.allowed_clubs.contains(&club)
    }
}

/// Terrain kind -> modifier row lookup
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainTable {
    rows: HashMap<TerrainKind, TerrainModifier>,
    neutral: TerrainModifier,
}

impl Default for TerrainTable {
    fn default() -> Self {
        let rows = TerrainKind::ALL
            .into_iter()
            .map(|kind| (kind, default_row(kind)))
            .collect();
        Self {
            rows,
            neutral: TerrainModifier::neutral(),
        }
    }
}

fn default_row(kind: TerrainKind) -> TerrainModifier {
    use ClubId::*;
    let base = TerrainModifier::default();
    match kind {
        TerrainKind::Tee => base,
        TerrainKind::Fairway => TerrainModifier {
            power: -1,
            mult_bonus: 0.1,
            ..base
        },
        TerrainKind::Rough => TerrainModifier {
            power: -3,
            accuracy: 1,
            spin: -0.2,
            roll: -1,
            friction: 0.6,
            ..base
        },
        TerrainKind::DeepRough => TerrainModifier {
            power: -6,
            accuracy: 2,
            spin: -0.4,
            roll: -2,
            friction: 0.3,
            chip_bonus: -5,
            mult_bonus: -0.1,
            allowed_clubs: vec![FiveIron, SevenIron, NineIron, PitchingWedge, SandWedge],
            ..base
        },
        TerrainKind::Sand => TerrainModifier {
            power: -5,
            accuracy: 1,
            spin: -0.3,
            roll: -2,
            friction: 0.0,
            chip_bonus: -10,
            allowed_clubs: vec![NineIron, PitchingWedge, SandWedge],
            ..base
        },
        TerrainKind::Green => TerrainModifier {
            accuracy: -1,
            roll: 1,
            friction: 1.4,
            chip_bonus: 20,
            mult_bonus: 0.2,
            allowed_clubs: vec![Putter, PitchingWedge, SandWedge],
            ..base
        },
        TerrainKind::Water => TerrainModifier {
            friction: 0.0,
            chip_bonus: -20,
            mult_bonus: -0.5,
            ..base
        },
        TerrainKind::Tree => TerrainModifier {
            power: -4,
            accuracy: 2,
            friction: 0.0,
            chip_bonus: -5,
            allowed_clubs: vec![SevenIron, NineIron, PitchingWedge, SandWedge],
            ..base
        },
        TerrainKind::Flag => TerrainModifier {
            friction: 0.0,
            chip_bonus: 50,
            mult_bonus: 1.0,
            ..base
        },
    }
}

impl TerrainTable {
    /// Parse a complete table; every terrain kind must have a row
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let rows: HashMap<TerrainKind, TerrainModifier> =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse {
                what: "terrain table",
                source,
            })?;
        if let Some(missing) = TerrainKind::ALL
            .into_iter()
            .find(|kind| !rows.contains_key(kind))
        {
            return Err(ConfigError::MissingTerrainRow(missing));
        }
        Ok(Self {
            rows,
            neutral: TerrainModifier::neutral(),
        })
    }

    /// Row for a terrain kind. A missing row yields the neutral modifier.
    pub fn get(&self, kind: TerrainKind) -> &TerrainModifier {
        match self.rows.get(&kind) {
            Some(row) => row,
            None => {
                log::warn!("No terrain row for {:?}, applying no modifiers", kind);
                &self.neutral
            }
        }
    }

    pub fn set(&mut self, kind: TerrainKind, row: TerrainModifier) {
        self.rows.insert(kind, row);
    }
}

/// One-shot write back to the course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileEdit {
    AddTag(String),
    RemoveTag(String),
    SetTerrain(TerrainKind),
    SetElevation(f32),
}

/// Course/grid collaborator. The core reads through this and writes only via
/// `apply_tile_edit`.
pub trait Course {
    /// Terrain at a tile; `None` means off the course
    fn terrain(&self, tile: Hex) -> Option<TerrainKind>;
    fn elevation(&self, tile: Hex) -> f32;
    fn slope(&self, tile: Hex) -> Slope;
    fn apply_tile_edit(&mut self, tile: Hex, edit: &TileEdit);
}

/// State of one tile in a `GridCourse`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileInfo {
    pub terrain: TerrainKind,
    pub elevation: f32,
    pub slope: Slope,
    pub tags: BTreeSet<String>,
}

impl TileInfo {
    pub fn new(terrain: TerrainKind) -> Self {
        Self {
            terrain,
            elevation: 0.0,
            slope: Slope::FLAT,
            tags: BTreeSet::new(),
        }
    }
}

/// In-memory course backed by a tile map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridCourse {
    #[serde(with = "crate::hex::tile_map")]
    tiles: HashMap<Hex, TileInfo>,
    pub tee: Hex,
    pub flag: Hex,
}

impl GridCourse {
    pub fn new() -> Self {
        Self::default()
    }

    /// A disk of one terrain kind
    pub fn filled(center: Hex, radius: u32, terrain: TerrainKind) -> Self {
        let mut course = Self::new();
        course.paint_disk(center, radius, terrain);
        course.tee = center;
        course.flag = center;
        course
    }

    pub fn set(&mut self, tile: Hex, terrain: TerrainKind) {
        self.tiles
            .entry(tile)
            .and_modify(|info| info.terrain = terrain)
            .or_insert_with(|| TileInfo::new(terrain));
    }

    pub fn set_slope(&mut self, tile: Hex, slope: Slope) {
        if let Some(info) = self.tiles.get_mut(&tile) {
            info.slope = slope;
        }
    }

    pub fn paint_disk(&mut self, center: Hex, radius: u32, terrain: TerrainKind) {
        for tile in center.disk(radius) {
            self.set(tile, terrain);
        }
    }

    pub fn tile(&self, tile: Hex) -> Option<&TileInfo> {
        self.tiles.get(&tile)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// A par-4 style hole running east: tee box, fairway corridor with a
    /// bunker and a pond, trees along the rough, and a green around the flag.
    pub fn sample_hole() -> Self {
        let tee = Hex::ORIGIN;
        let flag = tee.offset(HexDir::East, 40);
        let mut course = Self::new();

        // Rough everywhere along the corridor, fairway down the middle
        for step in -2..=44 {
            let spine = tee.offset(HexDir::East, step);
            course.paint_disk(spine, 5, TerrainKind::Rough);
        }
        for step in 2..=36 {
            let spine = tee.offset(HexDir::East, step);
            course.paint_disk(spine, 2, TerrainKind::Fairway);
        }
        for step in -1..=44 {
            let spine = tee.offset(HexDir::East, step);
            course.set(spine.offset(HexDir::NorthEast, 5), TerrainKind::Tree);
            course.set(spine.offset(HexDir::SouthWest, 5), TerrainKind::DeepRough);
        }

        course.paint_disk(tee, 1, TerrainKind::Tee);
        course.paint_disk(tee.offset(HexDir::East, 24).offset(HexDir::NorthEast, 2), 1, TerrainKind::Sand);
        course.paint_disk(tee.offset(HexDir::East, 30).offset(HexDir::SouthEast, 3), 2, TerrainKind::Water);
        course.paint_disk(flag, 3, TerrainKind::Green);
        course.paint_disk(flag.offset(HexDir::West, 4), 1, TerrainKind::Sand);
        course.set(flag, TerrainKind::Flag);

        course.set_slope(tee.offset(HexDir::East, 20), Slope::new(SlopeKind::Downhill, 1.0));
        course.set_slope(flag.offset(HexDir::West, 2), Slope::new(SlopeKind::Uphill, 0.5));

        course.tee = tee;
        course.flag = flag;
        course
    }
}

impl Course for GridCourse {
    fn terrain(&self, tile: Hex) -> Option<TerrainKind> {
        self.tiles.get(&tile).map(|info| info.terrain)
    }

    fn elevation(&self, tile: Hex) -> f32 {
        self.tiles.get(&tile).map(|info| info.elevation).unwrap_or(0.0)
    }

    fn slope(&self, tile: Hex) -> Slope {
        self.tiles.get(&tile).map(|info| info.slope).unwrap_or(Slope::FLAT)
    }

    fn apply_tile_edit(&mut self, tile: Hex, edit: &TileEdit) {
        let Some(info) = self.tiles.get_mut(&tile) else {
            log::warn!("Tile edit {:?} targets off-course tile {}", edit, tile);
            return;
        };
        match edit {
            TileEdit::AddTag(tag) => {
                info.tags.insert(tag.clone());
            }
            TileEdit::RemoveTag(tag) => {
                info.tags.remove(tag);
            }
            TileEdit::SetTerrain(kind) => info.terrain = *kind,
            TileEdit::SetElevation(h) => info.elevation = *h,
        }
    }
}
