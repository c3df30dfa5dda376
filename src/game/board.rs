// src/game/board.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::*;
use crate::enums::{Nation, TerrainKind, UnitKind};

/// Axial offsets of the six edge-sharing neighbours, clockwise from east.
const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

pub const FLAGSHIP_RADIUS: i32 = 5;

/// The six hex-adjacent positions, in a fixed order. Pure geometry.
pub fn neighbours(pos: Position) -> [Position; 6] {
    DIRECTIONS.map(|(dq, dr)| Position::new(pos.q + dq, pos.r + dr))
}

pub fn are_adjacent(a: Position, b: Position) -> bool {
    distance(a, b) == 1
}

pub fn distance(a: Position, b: Position) -> u32 {
    let dq = (a.q - b.q).unsigned_abs();
    let dr = (a.r - b.r).unsigned_abs();
    let ds = (a.s() - b.s()).unsigned_abs();
    (dq + dr + ds) / 2
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerrainMap {
    cells: HashMap<Position, TerrainKind>,
}

impl TerrainMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell(mut self, pos: Position, kind: TerrainKind) -> Self {
        self.cells.insert(pos, kind);
        self
    }

    /// Total lookup: anything off the map is `Impassable`.
    pub fn terrain_at(&self, pos: Position) -> TerrainKind {
        self.cells
            .get(&pos)
            .copied()
            .unwrap_or(TerrainKind::Impassable)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains_key(&pos)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Hexagonal map of radius 5 around the origin. A road runs along `r = 0`,
    /// a marshy river valley along `q = 0`, with forest and hill belts on
    /// either flank and a mountain spur that cannot be entered.
    pub fn flagship() -> Self {
        let mut map = TerrainMap::new();
        for q in -FLAGSHIP_RADIUS..=FLAGSHIP_RADIUS {
            for r in -FLAGSHIP_RADIUS..=FLAGSHIP_RADIUS {
                let pos = Position::new(q, r);
                if distance(pos, Position::new(0, 0)) > FLAGSHIP_RADIUS as u32 {
                    continue;
                }
                map.cells.insert(pos, flagship_terrain(pos));
            }
        }
        map
    }
}

fn flagship_terrain(pos: Position) -> TerrainKind {
    match (pos.q, pos.r) {
        (_, 0) => TerrainKind::Road,
        (0, _) => TerrainKind::Marsh,
        (4, -4) | (4, -3) | (5, -4) => TerrainKind::Impassable,
        (q, _) if q.abs() == 3 => TerrainKind::Forest,
        (q, r) if q.abs() == 2 && r.abs() >= 2 => TerrainKind::Hills,
        _ => TerrainKind::Clear,
    }
}

/// Opening set-up of the flagship scenario, in unit-table order.
pub fn flagship_deployment() -> Vec<Deployment> {
    let unit = |id, nation, kind, strength| GameUnit {
        id,
        nation,
        kind,
        strength,
    };
    vec![
        (
            unit(1, Nation::Germany, UnitKind::Infantry, 6),
            Position::new(-2, 0),
        ),
        (
            unit(2, Nation::Germany, UnitKind::Artillery, 4),
            Position::new(-3, 1),
        ),
        (
            unit(3, Nation::AustriaHungary, UnitKind::Infantry, 4),
            Position::new(-2, 2),
        ),
        (
            unit(4, Nation::France, UnitKind::Infantry, 5),
            Position::new(2, 0),
        ),
        (
            unit(5, Nation::Britain, UnitKind::Cavalry, 3),
            Position::new(2, -1),
        ),
        (
            unit(6, Nation::Russia, UnitKind::Infantry, 5),
            Position::new(1, -4),
        ),
    ]
}
