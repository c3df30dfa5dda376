// src/state/replay.rs
use super::{Aggregate, PlayerSlot};
use crate::actions::{GamesEvent, PlayerId};
use crate::enums::{GameStatus, Side};
use crate::game::flagship_deployment;

/// Rebuilds a game from its full history.
pub fn replay(events: &[GamesEvent]) -> Aggregate {
    replay_from(Aggregate::empty(), events)
}

/// Left fold of `events` onto `aggregate`.
pub fn replay_from(aggregate: Aggregate, events: &[GamesEvent]) -> Aggregate {
    events.iter().fold(aggregate, apply_event)
}

/// Folds a single event. Deterministic: consults nothing but its arguments.
pub fn apply_event(mut aggregate: Aggregate, event: &GamesEvent) -> Aggregate {
    aggregate.version += 1;
    match event {
        GamesEvent::NewGameCreated { game_id } => {
            match &aggregate.game_id {
                None => aggregate.game_id = Some(game_id.clone()),
                Some(existing) => {
                    log::warn!("Ignoring repeated creation of {} (already {})", game_id, existing);
                }
            }
            aggregate
        }
        GamesEvent::PlayerJoined { side, player, .. } => seat(aggregate, *side, player),
        GamesEvent::PlayerLeft { player, .. } => {
            aggregate.players.remove(&player.name);
            if aggregate.status == GameStatus::Full && !aggregate.is_full() {
                aggregate.status = GameStatus::Open;
            }
            aggregate
        }
        GamesEvent::GameStarted { .. } => {
            aggregate.status = GameStatus::Started;
            if aggregate.units.is_empty() {
                aggregate.units = flagship_deployment();
            }
            aggregate
        }
        GamesEvent::PlayerReJoined {
            side,
            player,
            missed,
            ..
        } => {
            // Catch-up events are spliced in right here, after the seat is
            // restored and before the outer history continues.
            let aggregate = seat(aggregate, *side, player);
            replay_from(aggregate, missed)
        }
    }
}

/// Gives `player` the slot on `side`; a game that fills up becomes `Full`.
pub fn seat(mut aggregate: Aggregate, side: Side, player: &PlayerId) -> Aggregate {
    aggregate.players.insert(
        player.name.clone(),
        PlayerSlot {
            key: player.key.clone(),
            side,
        },
    );
    if aggregate.status == GameStatus::Open && aggregate.is_full() {
        aggregate.status = GameStatus::Full;
    }
    aggregate
}
