use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::actions::PlayerName;

/// A registered player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: PlayerName,
}

/// Read-only view of the player registry the session service consults.
#[async_trait]
pub trait PlayerRegistry: Send + Sync {
    async fn is_registered(&self, name: &str) -> bool;

    async fn list_registered(&self) -> Vec<Player>;
}

/// Registry kept in process memory, listing players by name.
#[derive(Debug, Default)]
pub struct InMemoryPlayerRegistry {
    players: RwLock<BTreeMap<PlayerName, Player>>,
}

impl InMemoryPlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_players<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PlayerName>,
    {
        let players = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                (name.clone(), Player { name })
            })
            .collect();
        Self {
            players: RwLock::new(players),
        }
    }

    /// Returns false when the name was already taken.
    pub async fn register(&self, name: impl Into<PlayerName>) -> bool {
        let name = name.into();
        let mut players = self.players.write().await;
        if players.contains_key(&name) {
            return false;
        }
        log::info!("Registered player {}", name);
        players.insert(name.clone(), Player { name });
        true
    }
}

#[async_trait]
impl PlayerRegistry for InMemoryPlayerRegistry {
    async fn is_registered(&self, name: &str) -> bool {
        self.players.read().await.contains_key(name)
    }

    async fn list_registered(&self) -> Vec<Player> {
        self.players.read().await.values().cloned().collect()
    }
}
