use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::Side;

/// Length of every generated identifier.
pub const ID_LENGTH: usize = 8;

/// Opaque 8-character alphanumeric token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Accepts only well-formed tokens.
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed =
            raw.len() == ID_LENGTH && raw.chars().all(|c| c.is_ascii_alphanumeric());
        well_formed.then(|| Id(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for games
pub type GameId = Id;

/// Secret handed to a player when they take a seat
pub type PlayerKey = Id;

/// Name under which a player is registered
pub type PlayerName = String;

/// A seated player: who they are and the key they were given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId {
    pub name: PlayerName,
    pub key: PlayerKey,
}

/// Facts recorded in a game's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamesEvent {
    NewGameCreated {
        game_id: GameId,
    },
    PlayerJoined {
        game_id: GameId,
        side: Side,
        player: PlayerId,
    },
    GameStarted {
        game_id: GameId,
    },
    PlayerLeft {
        game_id: GameId,
        side: Side,
        player: PlayerId,
    },
    /// A player coming back, carrying what happened while they were away.
    /// `missed` never contains another `PlayerReJoined`; the log rejects it.
    PlayerReJoined {
        game_id: GameId,
        side: Side,
        player: PlayerId,
        missed: Vec<GamesEvent>,
    },
}

impl GamesEvent {
    pub fn game_id(&self) -> &GameId {
        match self {
            GamesEvent::NewGameCreated { game_id }
            | GamesEvent::PlayerJoined { game_id, .. }
            | GamesEvent::GameStarted { game_id }
            | GamesEvent::PlayerLeft { game_id, .. }
            | GamesEvent::PlayerReJoined { game_id, .. } => game_id,
        }
    }

    pub fn is_rejoin(&self) -> bool {
        matches!(self, GamesEvent::PlayerReJoined { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GamesEvent::NewGameCreated { .. } => "new_game_created",
            GamesEvent::PlayerJoined { .. } => "player_joined",
            GamesEvent::GameStarted { .. } => "game_started",
            GamesEvent::PlayerLeft { .. } => "player_left",
            GamesEvent::PlayerReJoined { .. } => "player_rejoined",
        }
    }
}
