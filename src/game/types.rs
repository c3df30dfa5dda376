// src/game/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::{Nation, Side, UnitKind};

/// Axial hex coordinate. The implicit third cube axis is `-q - r`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub q: i32,
    pub r: i32,
}

impl Position {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub fn s(&self) -> i32 {
        -self.q - self.r
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GameUnit {
    pub id: u8,
    pub nation: Nation,
    pub kind: UnitKind,
    pub strength: u8,
}

impl GameUnit {
    pub fn side(&self) -> Side {
        self.nation.side()
    }
}

/// Unit table entry: a unit and where it currently stands.
pub type Deployment = (GameUnit, Position);
