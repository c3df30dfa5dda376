use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Allies,
    Axis,
}

/// Seating order used when handing out sides to joining players.
pub const SIDES: [Side; 2] = [Side::Allies, Side::Axis];

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Allies => Side::Axis,
            Side::Axis => Side::Allies,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Allies => write!(f, "Allies"),
            Side::Axis => write!(f, "Axis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Nation {
    France,
    Britain,
    Russia,
    Italy,
    Usa,
    Germany,
    AustriaHungary,
    Ottoman,
    Bulgaria,
}

pub const NATIONS: [Nation; 9] = [
    Nation::France,
    Nation::Britain,
    Nation::Russia,
    Nation::Italy,
    Nation::Usa,
    Nation::Germany,
    Nation::AustriaHungary,
    Nation::Ottoman,
    Nation::Bulgaria,
];

impl Nation {
    /// Every nation fights for exactly one side for the whole game.
    pub fn side(self) -> Side {
        match self {
            Nation::France | Nation::Britain | Nation::Russia | Nation::Italy | Nation::Usa => {
                Side::Allies
            }
            Nation::Germany | Nation::AustriaHungary | Nation::Ottoman | Nation::Bulgaria => {
                Side::Axis
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Infantry,
    Cavalry,
    Artillery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    Clear,
    Road,
    Forest,
    Hills,
    Marsh,
    /// Also returned for every cell outside the map.
    Impassable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Open,
    Full,
    Started,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Open => write!(f, "open"),
            GameStatus::Full => write!(f, "full"),
            GameStatus::Started => write!(f, "started"),
        }
    }
}
