//! Hex grid support.
//!
//! The world map is an odd-row offset hex grid. Neighbor offsets differ by
//! row parity; [`Direction`] names the six edges in the order the chain's
//! movement calls expect them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use mirage_store::prelude::{Biome, ComponentStore};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the six hex edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

/// Neighbor offsets for even rows: `(d_col, d_row, direction)`.
const NEIGHBOR_OFFSETS_EVEN: [(i64, i64, Direction); 6] = [
    (1, 0, Direction::East),
    (0, 1, Direction::NorthEast),
    (-1, 1, Direction::NorthWest),
    (-1, 0, Direction::West),
    (-1, -1, Direction::SouthWest),
    (0, -1, Direction::SouthEast),
];

/// Neighbor offsets for odd rows.
const NEIGHBOR_OFFSETS_ODD: [(i64, i64, Direction); 6] = [
    (1, 0, Direction::East),
    (1, 1, Direction::NorthEast),
    (0, 1, Direction::NorthWest),
    (-1, 0, Direction::West),
    (0, -1, Direction::SouthWest),
    (1, -1, Direction::SouthEast),
];

// ---------------------------------------------------------------------------
// HexPos
// ---------------------------------------------------------------------------

/// A hex coordinate in odd-row offset layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexPos {
    pub col: u32,
    pub row: u32,
}

impl HexPos {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    fn offsets(self) -> &'static [(i64, i64, Direction); 6] {
        if self.row % 2 == 0 {
            &NEIGHBOR_OFFSETS_EVEN
        } else {
            &NEIGHBOR_OFFSETS_ODD
        }
    }

    /// The (up to six) adjacent hexes. Map-edge neighbors are skipped.
    pub fn neighbors(self) -> Vec<HexPos> {
        self.offsets()
            .iter()
            .filter_map(|&(dc, dr, _)| {
                let col = (self.col as i64).checked_add(dc)?;
                let row = (self.row as i64).checked_add(dr)?;
                Some(HexPos {
                    col: u32::try_from(col).ok()?,
                    row: u32::try_from(row).ok()?,
                })
            })
            .collect()
    }

    /// The edge leading to an adjacent hex, `None` when `other` is not
    /// adjacent.
    pub fn direction_to(self, other: HexPos) -> Option<Direction> {
        self.offsets().iter().find_map(|&(dc, dr, dir)| {
            let col = (self.col as i64) + dc;
            let row = (self.row as i64) + dr;
            (col == other.col as i64 && row == other.row as i64).then_some(dir)
        })
    }
}

// ---------------------------------------------------------------------------
// ExploredMap
// ---------------------------------------------------------------------------

/// Revealed hexes, col -> row -> biome. The shape path-finding consumes.
#[derive(Clone, Debug, Default)]
pub struct ExploredMap {
    inner: HashMap<u32, HashMap<u32, Biome>>,
    len: usize,
}

impl ExploredMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from every tile the store holds, overrides included, so
    /// optimistically revealed hexes are traversable immediately.
    pub fn from_store(store: &ComponentStore) -> Self {
        let mut map = Self::new();
        for entity in store.tiles.entities() {
            if let Some(tile) = store.tiles.get(entity) {
                map.insert(HexPos::new(tile.col, tile.row), tile.biome);
            }
        }
        map
    }

    pub fn insert(&mut self, pos: HexPos, biome: Biome) {
        let prev = self.inner.entry(pos.col).or_default().insert(pos.row, biome);
        if prev.is_none() {
            self.len += 1;
        }
    }

    pub fn biome(&self, pos: HexPos) -> Option<Biome> {
        self.inner.get(&pos.col)?.get(&pos.row).copied()
    }

    pub fn is_explored(&self, pos: HexPos) -> bool {
        self.biome(pos).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
