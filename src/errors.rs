use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::{GameId, PlayerKey, PlayerName};

/// Caller-facing outcomes of session registry operations.
///
/// None of these are fatal; the wire layer maps each one to a 4xx response.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionError {
    #[error("Game not found: {game_id}")]
    UnknownGame { game_id: GameId },

    #[error("Player {player_key} not found in game {game_id}")]
    UnknownPlayer {
        game_id: GameId,
        player_key: PlayerKey,
    },

    #[error("Player is not registered: {player_name}")]
    PlayerNotRegistered { player_name: PlayerName },

    #[error("Player {player_name} already joined game {game_id}")]
    AlreadyJoined {
        game_id: GameId,
        player_name: PlayerName,
    },

    #[error("Game {game_id} is full ({capacity} players)")]
    GameFull { game_id: GameId, capacity: usize },

    #[error("Malformed event: {details}")]
    MalformedEvent { details: String },

    #[error("Identifier source exhausted after {attempts} attempts")]
    IdExhausted { attempts: usize },
}

/// Configuration errors raised while reading overrides
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Result type aliases for convenience
pub type SessionResult<T> = Result<T, SessionError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Helper methods for creating common errors
impl SessionError {
    pub fn unknown_game(game_id: &GameId) -> Self {
        Self::UnknownGame {
            game_id: game_id.clone(),
        }
    }

    pub fn unknown_player(game_id: &GameId, player_key: &PlayerKey) -> Self {
        Self::UnknownPlayer {
            game_id: game_id.clone(),
            player_key: player_key.clone(),
        }
    }

    pub fn malformed(details: impl Into<String>) -> Self {
        Self::MalformedEvent {
            details: details.into(),
        }
    }
}
