use serde::{Deserialize, Serialize};

use crate::actions::{GameId, GamesEvent};
use crate::errors::{SessionError, SessionResult};

/// Append-only history of one game. Insertion order is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    game_id: GameId,
    events: Vec<GamesEvent>,
}

impl EventLog {
    pub fn new(game_id: GameId) -> Self {
        Self {
            game_id,
            events: Vec::new(),
        }
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn events(&self) -> &[GamesEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether `event` would be accepted by `append`.
    pub fn check(&self, event: &GamesEvent) -> SessionResult<()> {
        validate(&self.game_id, event)
    }

    /// The only mutator. Structurally invalid events are refused and leave
    /// the log untouched.
    pub fn append(&mut self, event: GamesEvent) -> SessionResult<()> {
        self.check(&event)?;
        self.events.push(event);
        Ok(())
    }
}

fn validate(game_id: &GameId, event: &GamesEvent) -> SessionResult<()> {
    if event.game_id() != game_id {
        return Err(SessionError::malformed(format!(
            "{} event for game {} appended to log of game {}",
            event.kind(),
            event.game_id(),
            game_id
        )));
    }
    if let GamesEvent::PlayerReJoined { missed, .. } = event {
        if let Some(nested) = missed.iter().find(|e| e.is_rejoin()) {
            return Err(SessionError::malformed(format!(
                "rejoin embeds another rejoin for {}",
                nested.game_id()
            )));
        }
        for inner in missed {
            validate(game_id, inner)?;
        }
    }
    Ok(())
}
