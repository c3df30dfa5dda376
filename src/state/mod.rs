// src/state/mod.rs
mod replay;

pub use replay::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::actions::{GameId, PlayerKey, PlayerName};
use crate::enums::{GameStatus, Side, SIDES};
use crate::game::Deployment;

/// Seats per game in the flagship title.
pub const FLAGSHIP_CAPACITY: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub key: PlayerKey,
    pub side: Side,
}

/// Current view of one game, derived only by folding its event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub game_id: Option<GameId>,
    pub players: BTreeMap<PlayerName, PlayerSlot>,
    pub capacity: usize,
    pub status: GameStatus,
    /// Empty until the game starts.
    pub units: Vec<Deployment>,
    /// Events folded so far, nested ones included.
    pub version: u64,
}

impl Default for Aggregate {
    fn default() -> Self {
        Self {
            game_id: None,
            players: BTreeMap::new(),
            capacity: FLAGSHIP_CAPACITY,
            status: GameStatus::Open,
            units: Vec::new(),
            version: 0,
        }
    }
}

impl Aggregate {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    pub fn has_player(&self, name: &str) -> bool {
        self.players.contains_key(name)
    }

    pub fn player_by_key(&self, key: &PlayerKey) -> Option<(&PlayerName, &PlayerSlot)> {
        self.players.iter().find(|(_, slot)| slot.key == *key)
    }

    pub fn key_in_use(&self, key: &PlayerKey) -> bool {
        self.player_by_key(key).is_some()
    }

    /// First side in seating order that nobody holds yet.
    pub fn free_side(&self) -> Option<Side> {
        SIDES
            .into_iter()
            .find(|side| self.players.values().all(|slot| slot.side != *side))
    }
}
