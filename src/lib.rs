// War Room Library - Core Module Organization
//
// Event-sourced game sessions for hex-and-counter wargames, together with
// the rules queries (terrain, movement cost, zones of control) they serve.

// Core data structures and enums
pub mod enums;
pub mod game;
pub mod state;

// Session events and their log
pub mod actions;
pub mod event_log;

// Session registry and its collaborators
pub mod application;
pub mod config;
pub mod errors;
pub mod id_source;
pub mod ordered_hashmap;
pub mod player_system;

// Re-export common types for convenient access
pub use crate::actions::{GameId, GamesEvent, Id, PlayerId, PlayerKey, PlayerName};
pub use crate::application::{GameService, GameSummary, PlayerState, PlayerView};
pub use crate::config::ServiceConfig;
pub use crate::enums::{GameStatus, Nation, Side, TerrainKind, UnitKind};
pub use crate::errors::{ConfigError, SessionError, SessionResult};
pub use crate::game::{Cost, Position, TerrainMap, ZoC};
pub use crate::state::{replay, Aggregate};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
