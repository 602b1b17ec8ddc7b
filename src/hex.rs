//! Hex grid coordinates
//!
//! Uses axial coordinates (q, r) on a pointy-top grid. World space is 2D with
//! unit hex radius:
//! - X axis: horizontal (positive = east)
//! - Y axis: screen-style vertical (positive = south)
//!
//! Neighbouring tile centres are `HEX_SPACING` apart, so dividing a world
//! distance by `HEX_SPACING` gives a distance in cells.

use std::ops::{Add, Sub};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// sqrt(3)
pub const SQRT_3: f32 = 1.732_050_8;

/// Distance between the centres of two neighbouring tiles
pub const HEX_SPACING: f32 = SQRT_3;

/// A tile coordinate in axial space
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub const ORIGIN: Hex = Hex { q: 0, r: 0 };

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Implicit third cube coordinate
    #[inline]
    pub fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Hex (step) distance between two tiles
    pub fn distance(self, other: Hex) -> u32 {
        let d = self - other;
        ((d.q.abs() + d.r.abs() + d.s().abs()) / 2) as u32
    }

    pub fn neighbor(self, dir: HexDir) -> Hex {
        self + dir.offset()
    }

    /// Step `steps` tiles along `dir` (negative steps walk the opposite way)
    pub fn offset(self, dir: HexDir, steps: i32) -> Hex {
        let o = dir.offset();
        Hex::new(self.q + o.q * steps, self.r + o.r * steps)
    }

    /// Centre of this tile in world space
    pub fn to_world(self) -> Vec2 {
        let q = self.q as f32;
        let r = self.r as f32;
        Vec2::new(SQRT_3 * (q + r / 2.0), 1.5 * r)
    }

    /// Tile containing a world-space point
    pub fn from_world(pos: Vec2) -> Hex {
        let r = pos.y / 1.5;
        let q = pos.x / SQRT_3 - r / 2.0;
        Hex::round(q, r)
    }

    /// Rounds fractional axial coordinates to the nearest tile.
    ///
    /// Uses cube rounding: the component with the largest rounding error is
    /// rebuilt from the other two.
    pub fn round(q: f32, r: f32) -> Hex {
        let s = -q - r;

        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        Hex::new(rq as i32, rr as i32)
    }

    /// Euclidean distance between tile centres, measured in cells
    pub fn cell_distance(self, other: Hex) -> f32 {
        self.to_world().distance(other.to_world()) / HEX_SPACING
    }

    /// Tiles exactly `radius` steps away, walking counter-clockwise
    pub fn ring(self, radius: u32) -> Vec<Hex> {
        if radius == 0 {
            return vec![self];
        }
        let mut out = Vec::with_capacity(6 * radius as usize);
        let mut hex = self.offset(HexDir::SouthWest, radius as i32);
        for dir in HexDir::ALL {
            for _ in 0..radius {
                out.push(hex);
                hex = hex.neighbor(dir);
            }
        }
        out
    }

    /// All tiles within `radius` steps, centre first then ring by ring
    pub fn disk(self, radius: u32) -> Vec<Hex> {
        let mut out = Vec::with_capacity(disk_size(radius));
        for k in 0..=radius {
            out.extend(self.ring(k));
        }
        out
    }

    /// Tiles on the straight line from `self` to `other`, both ends included
    pub fn line_to(self, other: Hex) -> Vec<Hex> {
        let n = self.distance(other);
        if n == 0 {
            return vec![self];
        }
        // Nudge off exact tile edges so ties round consistently
        let (aq, ar) = (self.q as f32 + 1e-6, self.r as f32 + 1e-6);
        let (bq, br) = (other.q as f32 + 1e-6, other.r as f32 + 1e-6);
        (0..=n)
            .map(|i| {
                let t = i as f32 / n as f32;
                Hex::round(aq + (bq - aq) * t, ar + (br - ar) * t)
            })
            .collect()
    }
}

/// Number of tiles in a disk of the given radius
pub fn disk_size(radius: u32) -> usize {
    let r = radius as usize;
    3 * r * r + 3 * r + 1
}

impl Add for Hex {
    type Output = Hex;
    fn add(self, rhs: Hex) -> Hex {
        Hex::new(self.q + rhs.q, self.r + rhs.r)
    }
}

impl Sub for Hex {
    type Output = Hex;
    fn sub(self, rhs: Hex) -> Hex {
        Hex::new(self.q - rhs.q, self.r - rhs.r)
    }
}

impl std::fmt::Display for Hex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Serde adapter for a `HashMap` keyed by `Hex`. JSON object keys must be
/// strings, so the map is written as a list of `[tile, value]` pairs sorted
/// by tile.
pub mod tile_map {
    use std::collections::HashMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Hex;

    pub fn serialize<V, S>(map: &HashMap<Hex, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        let mut pairs: Vec<(&Hex, &V)> = map.iter().collect();
        pairs.sort_by_key(|(tile, _)| **tile);
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<HashMap<Hex, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(Hex, V)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }

    /// Same encoding for an optional `BTreeMap`; `None` is `null`
    pub mod option {
        use std::collections::BTreeMap;

        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        use super::super::Hex;

        pub fn serialize<V, S>(
            map: &Option<BTreeMap<Hex, V>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            V: Serialize,
            S: Serializer,
        {
            map.as_ref()
                .map(|m| m.iter().collect::<Vec<(&Hex, &V)>>())
                .serialize(serializer)
        }

        pub fn deserialize<'de, V, D>(deserializer: D) -> Result<Option<BTreeMap<Hex, V>>, D::Error>
        where
            V: Deserialize<'de>,
            D: Deserializer<'de>,
        {
            let pairs = Option::<Vec<(Hex, V)>>::deserialize(deserializer)?;
            Ok(pairs.map(|p| p.into_iter().collect()))
        }
    }
}

/// The six neighbour directions, counter-clockwise from east
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HexDir {
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl HexDir {
    pub const ALL: [HexDir; 6] = [
        HexDir::East,
        HexDir::NorthEast,
        HexDir::NorthWest,
        HexDir::West,
        HexDir::SouthWest,
        HexDir::SouthEast,
    ];

    /// Axial step for one move in this direction
    pub fn offset(self) -> Hex {
        match self {
            HexDir::East => Hex::new(1, 0),
            HexDir::NorthEast => Hex::new(1, -1),
            HexDir::NorthWest => Hex::new(0, -1),
            HexDir::West => Hex::new(-1, 0),
            HexDir::SouthWest => Hex::new(-1, 1),
            HexDir::SouthEast => Hex::new(0, 1),
        }
    }

    fn index(self) -> i32 {
        match self {
            HexDir::East => 0,
            HexDir::NorthEast => 1,
            HexDir::NorthWest => 2,
            HexDir::West => 3,
            HexDir::SouthWest => 4,
            HexDir::SouthEast => 5,
        }
    }

    /// Rotate by `steps` sixths of a turn (positive = counter-clockwise)
    pub fn rotate(self, steps: i32) -> HexDir {
        HexDir::ALL[(self.index() + steps).rem_euclid(6) as usize]
    }

    pub fn opposite(self) -> HexDir {
        self.rotate(3)
    }

    /// Unit vector in world space
    pub fn unit(self) -> Vec2 {
        self.offset().to_world() / HEX_SPACING
    }

    /// Direction best aligned with a world-space vector (east for zero)
    pub fn nearest(v: Vec2) -> HexDir {
        if v.length_squared() < 1e-8 {
            return HexDir::East;
        }
        let mut best = HexDir::East;
        let mut best_dot = f32::NEG_INFINITY;
        for dir in HexDir::ALL {
            let dot = dir.unit().dot(v);
            if dot > best_dot {
                best_dot = dot;
                best = dir;
            }
        }
        best
    }

    /// Direction from one tile towards another
    pub fn towards(from: Hex, to: Hex) -> HexDir {
        HexDir::nearest(to.to_world() - from.to_world())
    }
}
