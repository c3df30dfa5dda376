use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::actions::{GameId, GamesEvent, Id, PlayerId, PlayerKey, PlayerName};
use crate::config::ServiceConfig;
use crate::enums::{GameStatus, Side};
use crate::errors::{SessionError, SessionResult};
use crate::event_log::EventLog;
use crate::game::{in_zoc, path_cost, Cost, Position, TerrainMap, ZoC};
use crate::id_source::{IdSource, SeededIdSource};
use crate::ordered_hashmap::OrderedHashMap;
use crate::player_system::PlayerRegistry;
use crate::state::{apply_event, replay, seat, Aggregate};

/// What a seated player sees while their game is still filling up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub game_id: GameId,
    pub name: PlayerName,
    pub key: PlayerKey,
    pub side: Side,
    pub status: GameStatus,
    pub players: Vec<PlayerName>,
}

/// Answer to a player-state query: either the state itself or, once the
/// game is full, the title-qualified path where the game now lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PlayerView {
    State(PlayerState),
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub game_id: GameId,
    pub status: GameStatus,
    pub players: Vec<PlayerName>,
    pub capacity: usize,
}

/// One game's history together with the aggregate folded from it.
#[derive(Debug, Clone)]
struct GameEntry {
    log: EventLog,
    aggregate: Aggregate,
}

impl GameEntry {
    fn new(game_id: GameId) -> SessionResult<Self> {
        let mut log = EventLog::new(game_id.clone());
        log.append(GamesEvent::NewGameCreated { game_id })?;
        let aggregate = replay(log.events());
        Ok(Self { log, aggregate })
    }

    /// Appends and refolds; on error neither half changes.
    fn record(&mut self, event: GamesEvent) -> SessionResult<()> {
        self.log.append(event)?;
        self.aggregate = replay(self.log.events());
        Ok(())
    }
}

type SharedEntry = Arc<RwLock<GameEntry>>;

/// Session registry: every game's log and aggregate, keyed by game id.
///
/// The outer lock only guards the id → entry map; each entry has its own
/// lock so transactions on different games do not contend.
#[derive(Clone)]
pub struct GameService {
    games: Arc<RwLock<OrderedHashMap<GameId, SharedEntry>>>,
    ids: Arc<Mutex<Box<dyn IdSource>>>,
    players: Arc<dyn PlayerRegistry>,
    map: Arc<TerrainMap>,
    config: ServiceConfig,
}

impl GameService {
    pub fn new(config: ServiceConfig, players: Arc<dyn PlayerRegistry>) -> Self {
        let ids = Box::new(SeededIdSource::new(config.seed));
        Self::with_id_source(config, players, ids)
    }

    pub fn with_id_source(
        config: ServiceConfig,
        players: Arc<dyn PlayerRegistry>,
        ids: Box<dyn IdSource>,
    ) -> Self {
        Self {
            games: Arc::new(RwLock::new(OrderedHashMap::new())),
            ids: Arc::new(Mutex::new(ids)),
            players,
            map: Arc::new(TerrainMap::flagship()),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn terrain(&self) -> &TerrainMap {
        &self.map
    }

    /// Create a new empty game and return its ID
    pub async fn create_game(&self) -> SessionResult<GameId> {
        let mut games = self.games.write().await;
        let game_id = self.fresh_id(|id| games.contains_key(id)).await?;
        let entry = GameEntry::new(game_id.clone())?;
        games.insert(game_id.clone(), Arc::new(RwLock::new(entry)));
        log::info!("Created game {}", game_id);
        Ok(game_id)
    }

    /// All known game ids in creation order
    pub async fn list_games(&self) -> Vec<GameId> {
        self.games.read().await.keys().cloned().collect()
    }

    pub async fn list_summaries(&self) -> Vec<GameSummary> {
        let entries: Vec<SharedEntry> = {
            let games = self.games.read().await;
            games.iter().map(|(_, entry)| entry.clone()).collect()
        };
        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.read().await;
            let aggregate = &entry.aggregate;
            summaries.push(GameSummary {
                game_id: entry.log.game_id().clone(),
                status: aggregate.status,
                players: aggregate.players.keys().cloned().collect(),
                capacity: aggregate.capacity,
            });
        }
        summaries
    }

    /// Seat a registered player and hand back their key.
    pub async fn join_game(&self, game_id: &GameId, player_name: &str) -> SessionResult<PlayerKey> {
        // The registry is an external collaborator; ask it before any game
        // lock is taken.
        let registered = self.players.is_registered(player_name).await;
        let entry = self.entry(game_id).await?;
        if !registered {
            log::debug!("Rejected join of unregistered {} to {}", player_name, game_id);
            return Err(SessionError::PlayerNotRegistered {
                player_name: player_name.to_string(),
            });
        }

        let mut entry = entry.write().await;
        check_admission(&entry.aggregate, game_id, player_name, false)?;
        let side = entry
            .aggregate
            .free_side()
            .ok_or_else(|| game_full(game_id, &entry.aggregate))?;
        let key = self
            .fresh_id(|key| entry.aggregate.key_in_use(key))
            .await?;

        entry.record(GamesEvent::PlayerJoined {
            game_id: game_id.clone(),
            side,
            player: PlayerId {
                name: player_name.to_string(),
                key: key.clone(),
            },
        })?;
        log::info!(
            "{} joined game {} as {} ({})",
            player_name,
            game_id,
            side,
            entry.aggregate.status
        );
        Ok(key)
    }

    pub async fn get_player_state(
        &self,
        game_id: &GameId,
        key: &PlayerKey,
    ) -> SessionResult<PlayerView> {
        let entry = self.entry(game_id).await?;
        let entry = entry.read().await;
        let aggregate = &entry.aggregate;
        let (name, slot) = aggregate
            .player_by_key(key)
            .ok_or_else(|| SessionError::unknown_player(game_id, key))?;

        if aggregate.status != GameStatus::Open {
            return Ok(PlayerView::Redirect(self.player_path(game_id, key)));
        }
        Ok(PlayerView::State(PlayerState {
            game_id: game_id.clone(),
            name: name.clone(),
            key: key.clone(),
            side: slot.side,
            status: aggregate.status,
            players: aggregate.players.keys().cloned().collect(),
        }))
    }

    /// Free the slot held by `key`.
    pub async fn leave_game(&self, game_id: &GameId, key: &PlayerKey) -> SessionResult<()> {
        let entry = self.entry(game_id).await?;
        let mut entry = entry.write().await;
        let (name, slot) = entry
            .aggregate
            .player_by_key(key)
            .map(|(name, slot)| (name.clone(), slot.clone()))
            .ok_or_else(|| SessionError::unknown_player(game_id, key))?;

        entry.record(GamesEvent::PlayerLeft {
            game_id: game_id.clone(),
            side: slot.side,
            player: PlayerId {
                name: name.clone(),
                key: slot.key,
            },
        })?;
        log::info!("{} left game {}", name, game_id);
        Ok(())
    }

    /// Returns whether the game was started by this call.
    pub async fn start_game(&self, game_id: &GameId) -> SessionResult<bool> {
        let entry = self.entry(game_id).await?;
        let mut entry = entry.write().await;
        if entry.aggregate.status == GameStatus::Started {
            return Ok(false);
        }
        entry.record(GamesEvent::GameStarted {
            game_id: game_id.clone(),
        })?;
        log::info!("Started game {}", game_id);
        Ok(true)
    }

    /// Append an externally built event, e.g. a rejoin carrying the history
    /// its player missed. Every seat-taking event, the embedded ones
    /// included, goes through the same admission checks as `join_game`.
    pub async fn append_event(&self, game_id: &GameId, event: GamesEvent) -> SessionResult<()> {
        let mut unregistered = None;
        for name in seated_names(&event) {
            if !self.players.is_registered(name).await {
                unregistered = Some(name.to_string());
                break;
            }
        }

        let entry = self.entry(game_id).await?;
        let mut entry = entry.write().await;
        entry.log.check(&event)?;
        if let Some(player_name) = unregistered {
            log::debug!("Rejected {} for unregistered {}", event.kind(), player_name);
            return Err(SessionError::PlayerNotRegistered { player_name });
        }
        admit(entry.aggregate.clone(), game_id, &event)?;

        let kind = event.kind();
        entry.record(event)?;
        log::info!("Appended {} to game {}", kind, game_id);
        Ok(())
    }

    /// Consistent copy of a game's aggregate.
    pub async fn snapshot(&self, game_id: &GameId) -> SessionResult<Aggregate> {
        let entry = self.entry(game_id).await?;
        let aggregate = entry.read().await.aggregate.clone();
        Ok(aggregate)
    }

    pub async fn events(&self, game_id: &GameId) -> SessionResult<Vec<GamesEvent>> {
        let entry = self.entry(game_id).await?;
        let events = entry.read().await.log.events().to_vec();
        Ok(events)
    }

    /// Zone of control at `pos` for `side`, evaluated outside any lock.
    pub async fn zoc_at(&self, game_id: &GameId, side: Side, pos: Position) -> SessionResult<ZoC> {
        let units = self.snapshot(game_id).await?.units;
        Ok(in_zoc(side, &units, pos))
    }

    /// Movement cost along `path` on the flagship map, evaluated outside any lock.
    pub async fn path_cost(
        &self,
        game_id: &GameId,
        side: Side,
        path: &[Position],
    ) -> SessionResult<Cost> {
        let units = self.snapshot(game_id).await?.units;
        Ok(path_cost(&self.map, &units, side, path))
    }

    pub fn player_path(&self, game_id: &GameId, key: &PlayerKey) -> String {
        format!(
            "/games/{}/{}/players/{}",
            self.config.game_type, game_id, key
        )
    }

    async fn entry(&self, game_id: &GameId) -> SessionResult<SharedEntry> {
        self.games
            .read()
            .await
            .get(game_id)
            .cloned()
            .ok_or_else(|| SessionError::unknown_game(game_id))
    }

    async fn fresh_id<F>(&self, in_use: F) -> SessionResult<Id>
    where
        F: Fn(&Id) -> bool,
    {
        let mut ids = self.ids.lock().await;
        for _ in 0..self.config.id_attempts {
            match ids.next_id() {
                Some(id) if !in_use(&id) => return Ok(id),
                Some(id) => log::debug!("Identifier {} already in use, drawing again", id),
                None => break,
            }
        }
        log::warn!(
            "No fresh identifier after {} attempts",
            self.config.id_attempts
        );
        Err(SessionError::IdExhausted {
            attempts: self.config.id_attempts,
        })
    }
}

fn game_full(game_id: &GameId, aggregate: &Aggregate) -> SessionError {
    SessionError::GameFull {
        game_id: game_id.clone(),
        capacity: aggregate.capacity,
    }
}

/// Rejoins may return to a started game; fresh joins may not.
fn check_admission(
    aggregate: &Aggregate,
    game_id: &GameId,
    player_name: &str,
    rejoin: bool,
) -> SessionResult<()> {
    if aggregate.has_player(player_name) {
        log::debug!("{} already holds a slot in {}", player_name, game_id);
        return Err(SessionError::AlreadyJoined {
            game_id: game_id.clone(),
            player_name: player_name.to_string(),
        });
    }
    let closed = aggregate.status == GameStatus::Started && !rejoin;
    if aggregate.is_full() || closed {
        log::debug!("Game {} has no free slot for {}", game_id, player_name);
        return Err(game_full(game_id, aggregate));
    }
    Ok(())
}

/// Folds `event` onto `aggregate` after checking it as a fresh append would
/// be checked. A rejoin's catch-up events are checked one by one against the
/// aggregate as it stands at that point of the splice.
fn admit(aggregate: Aggregate, game_id: &GameId, event: &GamesEvent) -> SessionResult<Aggregate> {
    match event {
        GamesEvent::NewGameCreated { .. } => Err(SessionError::malformed(format!(
            "game {} has already been created",
            game_id
        ))),
        GamesEvent::PlayerJoined { player, side, .. } => {
            check_admission(&aggregate, game_id, &player.name, false)?;
            check_seat(&aggregate, player, *side)?;
            Ok(apply_event(aggregate, event))
        }
        GamesEvent::PlayerReJoined {
            player,
            side,
            missed,
            ..
        } => {
            check_admission(&aggregate, game_id, &player.name, true)?;
            check_seat(&aggregate, player, *side)?;
            missed
                .iter()
                .try_fold(seat(aggregate, *side, player), |aggregate, inner| {
                    admit(aggregate, game_id, inner)
                })
        }
        GamesEvent::PlayerLeft { player, .. } => {
            let seated = aggregate
                .players
                .get(&player.name)
                .is_some_and(|slot| slot.key == player.key);
            if !seated {
                return Err(SessionError::unknown_player(game_id, &player.key));
            }
            Ok(apply_event(aggregate, event))
        }
        GamesEvent::GameStarted { .. } => Ok(apply_event(aggregate, event)),
    }
}

/// Names an event would seat, outer player first.
fn seated_names(event: &GamesEvent) -> Vec<&str> {
    match event {
        GamesEvent::PlayerJoined { player, .. } => vec![player.name.as_str()],
        GamesEvent::PlayerReJoined { player, missed, .. } => {
            let mut names = vec![player.name.as_str()];
            names.extend(missed.iter().flat_map(seated_names));
            names
        }
        _ => Vec::new(),
    }
}

fn check_seat(aggregate: &Aggregate, player: &PlayerId, side: Side) -> SessionResult<()> {
    if aggregate.key_in_use(&player.key) {
        return Err(SessionError::malformed(format!(
            "key {} is already held in this game",
            player.key
        )));
    }
    if aggregate.players.values().any(|slot| slot.side == side) {
        return Err(SessionError::malformed(format!("side {} is already taken", side)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_source::ScriptedIdSource;
    use crate::player_system::InMemoryPlayerRegistry;
    use futures::future::join_all;
    use std::collections::HashSet;

    fn service_with(names: &[&str]) -> GameService {
        let registry = InMemoryPlayerRegistry::with_players(names.iter().copied());
        GameService::new(ServiceConfig::default(), Arc::new(registry))
    }

    fn id(raw: &str) -> Id {
        Id::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_created_games_are_listed_in_creation_order() {
        let service = service_with(&[]);
        let mut created = Vec::new();
        for _ in 0..20 {
            created.push(service.create_game().await.unwrap());
        }
        let distinct: HashSet<_> = created.iter().cloned().collect();
        assert_eq!(distinct.len(), 20);
        assert_eq!(service.list_games().await, created);
    }

    #[tokio::test]
    async fn test_new_game_is_empty_and_open() {
        let service = service_with(&[]);
        let game_id = service.create_game().await.unwrap();
        let aggregate = service.snapshot(&game_id).await.unwrap();
        assert_eq!(aggregate.game_id, Some(game_id.clone()));
        assert!(aggregate.players.is_empty());
        assert_eq!(aggregate.status, GameStatus::Open);
        assert_eq!(
            service.events(&game_id).await.unwrap(),
            vec![GamesEvent::NewGameCreated { game_id }]
        );
    }

    #[tokio::test]
    async fn test_join_then_join_again_is_rejected() {
        let service = service_with(&["Alice"]);
        let game_id = service.create_game().await.unwrap();
        let key = service.join_game(&game_id, "Alice").await.unwrap();
        assert_eq!(key.as_str().len(), 8);

        let err = service.join_game(&game_id, "Alice").await.unwrap_err();
        assert_eq!(
            err,
            SessionError::AlreadyJoined {
                game_id: game_id.clone(),
                player_name: "Alice".to_string(),
            }
        );
        assert_eq!(service.events(&game_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unregistered_player_cannot_join() {
        let service = service_with(&[]);
        let game_id = service.create_game().await.unwrap();
        let err = service.join_game(&game_id, "Alice").await.unwrap_err();
        assert_eq!(
            err,
            SessionError::PlayerNotRegistered {
                player_name: "Alice".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_game_is_reported_first() {
        let service = service_with(&[]);
        let missing = id("NOSUCHGM");
        let err = service.join_game(&missing, "Alice").await.unwrap_err();
        assert_eq!(err, SessionError::unknown_game(&missing));
        assert!(matches!(
            service.get_player_state(&missing, &id("KEYKEYKE")).await,
            Err(SessionError::UnknownGame { .. })
        ));
    }

    #[tokio::test]
    async fn test_third_join_finds_game_full() {
        let service = service_with(&["Alice", "Bob", "Carol"]);
        let game_id = service.create_game().await.unwrap();
        service.join_game(&game_id, "Alice").await.unwrap();
        service.join_game(&game_id, "Bob").await.unwrap();
        let err = service.join_game(&game_id, "Carol").await.unwrap_err();
        assert_eq!(
            err,
            SessionError::GameFull {
                game_id,
                capacity: 2
            }
        );
    }

    #[tokio::test]
    async fn test_open_game_returns_player_state() {
        let service = service_with(&["Alice"]);
        let game_id = service.create_game().await.unwrap();
        let key = service.join_game(&game_id, "Alice").await.unwrap();
        match service.get_player_state(&game_id, &key).await.unwrap() {
            PlayerView::State(state) => {
                assert_eq!(state.name, "Alice");
                assert_eq!(state.side, Side::Allies);
                assert_eq!(state.status, GameStatus::Open);
            }
            other => panic!("expected state, got {:?}", other),
        }
        let err = service
            .get_player_state(&game_id, &id("UNKNOWN1"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownPlayer { .. }));
    }

    #[tokio::test]
    async fn test_full_game_redirects_both_players() {
        let service = service_with(&["Alice", "Bob"]);
        let game_id = service.create_game().await.unwrap();
        let alice = service.join_game(&game_id, "Alice").await.unwrap();
        let bob = service.join_game(&game_id, "Bob").await.unwrap();
        assert_eq!(
            service.snapshot(&game_id).await.unwrap().status,
            GameStatus::Full
        );

        for key in [alice, bob] {
            let view = service.get_player_state(&game_id, &key).await.unwrap();
            assert_eq!(
                view,
                PlayerView::Redirect(format!("/games/DerDesDers/{}/players/{}", game_id, key))
            );
        }
    }

    #[tokio::test]
    async fn test_leave_reopens_game() {
        let service = service_with(&["Alice", "Bob", "Carol"]);
        let game_id = service.create_game().await.unwrap();
        service.join_game(&game_id, "Alice").await.unwrap();
        let bob = service.join_game(&game_id, "Bob").await.unwrap();
        service.leave_game(&game_id, &bob).await.unwrap();

        let aggregate = service.snapshot(&game_id).await.unwrap();
        assert_eq!(aggregate.status, GameStatus::Open);
        let carol = service.join_game(&game_id, "Carol").await.unwrap();
        let aggregate = service.snapshot(&game_id).await.unwrap();
        assert_eq!(aggregate.players["Carol"].key, carol);
        assert_eq!(aggregate.players["Carol"].side, Side::Axis);
        assert!(matches!(
            service.leave_game(&game_id, &bob).await,
            Err(SessionError::UnknownPlayer { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejoin_through_append_event() {
        let service = service_with(&["Alice", "Bob"]);
        let game_id = service.create_game().await.unwrap();
        service.join_game(&game_id, "Alice").await.unwrap();
        let bob = service.join_game(&game_id, "Bob").await.unwrap();
        service.leave_game(&game_id, &bob).await.unwrap();

        let rejoin = GamesEvent::PlayerReJoined {
            game_id: game_id.clone(),
            side: Side::Axis,
            player: PlayerId {
                name: "Bob".to_string(),
                key: bob.clone(),
            },
            missed: vec![GamesEvent::GameStarted {
                game_id: game_id.clone(),
            }],
        };
        service.append_event(&game_id, rejoin.clone()).await.unwrap();
        let aggregate = service.snapshot(&game_id).await.unwrap();
        assert_eq!(aggregate.status, GameStatus::Started);
        assert_eq!(aggregate.players["Bob"].key, bob);

        let err = service.append_event(&game_id, rejoin).await.unwrap_err();
        assert!(matches!(err, SessionError::AlreadyJoined { .. }));
    }

    #[tokio::test]
    async fn test_started_game_takes_rejoins_but_not_newcomers() {
        let service = service_with(&["Alice", "Bob", "Carol"]);
        let game_id = service.create_game().await.unwrap();
        service.join_game(&game_id, "Alice").await.unwrap();
        let bob = service.join_game(&game_id, "Bob").await.unwrap();
        service.start_game(&game_id).await.unwrap();
        service.leave_game(&game_id, &bob).await.unwrap();

        let err = service.join_game(&game_id, "Carol").await.unwrap_err();
        assert!(matches!(err, SessionError::GameFull { .. }));

        let rejoin = GamesEvent::PlayerReJoined {
            game_id: game_id.clone(),
            side: Side::Axis,
            player: PlayerId {
                name: "Bob".to_string(),
                key: bob,
            },
            missed: Vec::new(),
        };
        service.append_event(&game_id, rejoin).await.unwrap();
        let aggregate = service.snapshot(&game_id).await.unwrap();
        assert_eq!(aggregate.players.len(), 2);
        assert_eq!(aggregate.status, GameStatus::Started);
    }

    fn joined(game_id: &GameId, name: &str, key: &Id, side: Side) -> GamesEvent {
        GamesEvent::PlayerJoined {
            game_id: game_id.clone(),
            side,
            player: PlayerId {
                name: name.to_string(),
                key: key.clone(),
            },
        }
    }

    fn rejoined(game_id: &GameId, name: &str, key: &Id, missed: Vec<GamesEvent>) -> GamesEvent {
        GamesEvent::PlayerReJoined {
            game_id: game_id.clone(),
            side: Side::Axis,
            player: PlayerId {
                name: name.to_string(),
                key: key.clone(),
            },
            missed,
        }
    }

    async fn alice_stays_bob_left(service: &GameService) -> (GameId, PlayerKey, PlayerKey) {
        let game_id = service.create_game().await.unwrap();
        let alice = service.join_game(&game_id, "Alice").await.unwrap();
        let bob = service.join_game(&game_id, "Bob").await.unwrap();
        service.leave_game(&game_id, &bob).await.unwrap();
        (game_id, alice, bob)
    }

    #[tokio::test]
    async fn test_catch_up_join_cannot_overfill_or_reuse_a_key() {
        let service = service_with(&["Alice", "Bob", "Mallory"]);
        let (game_id, alice, bob) = alice_stays_bob_left(&service).await;
        let before = service.events(&game_id).await.unwrap();

        let overfill = rejoined(
            &game_id,
            "Bob",
            &bob,
            vec![
                joined(&game_id, "Mallory", &alice, Side::Allies),
                GamesEvent::NewGameCreated {
                    game_id: game_id.clone(),
                },
            ],
        );
        let err = service.append_event(&game_id, overfill).await.unwrap_err();
        assert!(matches!(err, SessionError::GameFull { capacity: 2, .. }));

        // Alice steps out during the absence, so the seat is free but her
        // key still may not be handed to someone else.
        let reused_key = rejoined(
            &game_id,
            "Bob",
            &bob,
            vec![
                GamesEvent::PlayerLeft {
                    game_id: game_id.clone(),
                    side: Side::Allies,
                    player: PlayerId {
                        name: "Alice".to_string(),
                        key: alice.clone(),
                    },
                },
                joined(&game_id, "Mallory", &bob, Side::Allies),
            ],
        );
        let err = service.append_event(&game_id, reused_key).await.unwrap_err();
        assert!(matches!(err, SessionError::MalformedEvent { .. }));

        let recreated = rejoined(
            &game_id,
            "Bob",
            &bob,
            vec![GamesEvent::NewGameCreated {
                game_id: game_id.clone(),
            }],
        );
        let err = service.append_event(&game_id, recreated).await.unwrap_err();
        assert!(matches!(err, SessionError::MalformedEvent { .. }));

        assert_eq!(service.events(&game_id).await.unwrap(), before);
        let aggregate = service.snapshot(&game_id).await.unwrap();
        assert_eq!(aggregate.players.len(), 1);
        assert_eq!(aggregate.status, GameStatus::Open);
    }

    #[tokio::test]
    async fn test_catch_up_join_needs_a_registered_name() {
        let service = service_with(&["Alice", "Bob"]);
        let (game_id, alice, bob) = alice_stays_bob_left(&service).await;
        let swap = rejoined(
            &game_id,
            "Bob",
            &bob,
            vec![
                GamesEvent::PlayerLeft {
                    game_id: game_id.clone(),
                    side: Side::Allies,
                    player: PlayerId {
                        name: "Alice".to_string(),
                        key: alice,
                    },
                },
                joined(&game_id, "Mallory", &id("MALLORY1"), Side::Allies),
            ],
        );
        let err = service.append_event(&game_id, swap).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::PlayerNotRegistered {
                player_name: "Mallory".to_string()
            }
        );
        assert_eq!(service.snapshot(&game_id).await.unwrap().players.len(), 1);
    }

    #[tokio::test]
    async fn test_valid_catch_up_is_spliced_in() {
        let service = service_with(&["Alice", "Bob", "Carol"]);
        let (game_id, alice, bob) = alice_stays_bob_left(&service).await;
        let carol = id("CAROLKEY");
        let catch_up = rejoined(
            &game_id,
            "Bob",
            &bob,
            vec![
                GamesEvent::PlayerLeft {
                    game_id: game_id.clone(),
                    side: Side::Allies,
                    player: PlayerId {
                        name: "Alice".to_string(),
                        key: alice,
                    },
                },
                joined(&game_id, "Carol", &carol, Side::Allies),
            ],
        );
        service.append_event(&game_id, catch_up).await.unwrap();

        let aggregate = service.snapshot(&game_id).await.unwrap();
        assert_eq!(aggregate.status, GameStatus::Full);
        assert_eq!(aggregate.players["Carol"].key, carol);
        assert_eq!(aggregate.players["Bob"].side, Side::Axis);
        assert!(!aggregate.has_player("Alice"));
    }

    #[tokio::test]
    async fn test_appended_join_follows_join_rules() {
        let service = service_with(&["Alice", "Bob", "Carol"]);
        let game_id = service.create_game().await.unwrap();
        let alice = service.join_game(&game_id, "Alice").await.unwrap();

        let again = joined(&game_id, "Alice", &id("ALICE002"), Side::Axis);
        assert!(matches!(
            service.append_event(&game_id, again).await,
            Err(SessionError::AlreadyJoined { .. })
        ));

        let taken_side = joined(&game_id, "Bob", &id("BOBKEY01"), Side::Allies);
        assert!(matches!(
            service.append_event(&game_id, taken_side).await,
            Err(SessionError::MalformedEvent { .. })
        ));

        let held_key = joined(&game_id, "Bob", &alice, Side::Axis);
        assert!(matches!(
            service.append_event(&game_id, held_key).await,
            Err(SessionError::MalformedEvent { .. })
        ));

        let bob = joined(&game_id, "Bob", &id("BOBKEY01"), Side::Axis);
        service.append_event(&game_id, bob).await.unwrap();
        assert_eq!(
            service.snapshot(&game_id).await.unwrap().status,
            GameStatus::Full
        );

        let carol = joined(&game_id, "Carol", &id("CAROLKEY"), Side::Axis);
        assert_eq!(
            service.append_event(&game_id, carol).await.unwrap_err(),
            SessionError::GameFull {
                game_id: game_id.clone(),
                capacity: 2
            }
        );
        assert_eq!(service.events(&game_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_appended_leave_and_creation_are_checked() {
        let service = service_with(&["Alice"]);
        let game_id = service.create_game().await.unwrap();
        let alice = service.join_game(&game_id, "Alice").await.unwrap();

        let stranger = GamesEvent::PlayerLeft {
            game_id: game_id.clone(),
            side: Side::Axis,
            player: PlayerId {
                name: "Bob".to_string(),
                key: id("BOBKEY01"),
            },
        };
        assert_eq!(
            service.append_event(&game_id, stranger).await.unwrap_err(),
            SessionError::unknown_player(&game_id, &id("BOBKEY01"))
        );

        let wrong_key = GamesEvent::PlayerLeft {
            game_id: game_id.clone(),
            side: Side::Allies,
            player: PlayerId {
                name: "Alice".to_string(),
                key: id("NOTALICE"),
            },
        };
        assert!(matches!(
            service.append_event(&game_id, wrong_key).await,
            Err(SessionError::UnknownPlayer { .. })
        ));

        let recreated = GamesEvent::NewGameCreated {
            game_id: game_id.clone(),
        };
        assert!(matches!(
            service.append_event(&game_id, recreated).await,
            Err(SessionError::MalformedEvent { .. })
        ));

        assert_eq!(service.events(&game_id).await.unwrap().len(), 2);
        let aggregate = service.snapshot(&game_id).await.unwrap();
        assert_eq!(aggregate.players["Alice"].key, alice);
    }

    #[tokio::test]
    async fn test_nested_rejoin_is_refused_without_side_effects() {
        let service = service_with(&["Bob"]);
        let game_id = service.create_game().await.unwrap();
        let player = PlayerId {
            name: "Bob".to_string(),
            key: id("BOBKEY01"),
        };
        let inner = GamesEvent::PlayerReJoined {
            game_id: game_id.clone(),
            side: Side::Axis,
            player: player.clone(),
            missed: Vec::new(),
        };
        let outer = GamesEvent::PlayerReJoined {
            game_id: game_id.clone(),
            side: Side::Axis,
            player,
            missed: vec![inner],
        };
        let err = service.append_event(&game_id, outer).await.unwrap_err();
        assert!(matches!(err, SessionError::MalformedEvent { .. }));
        assert_eq!(service.events(&game_id).await.unwrap().len(), 1);
        assert!(service.snapshot(&game_id).await.unwrap().players.is_empty());
    }

    #[tokio::test]
    async fn test_start_game_is_idempotent_and_deploys_units() {
        let service = service_with(&[]);
        let game_id = service.create_game().await.unwrap();
        assert!(service.start_game(&game_id).await.unwrap());
        assert!(!service.start_game(&game_id).await.unwrap());
        let aggregate = service.snapshot(&game_id).await.unwrap();
        assert_eq!(aggregate.status, GameStatus::Started);
        assert!(!aggregate.units.is_empty());
    }

    #[tokio::test]
    async fn test_rules_queries_use_started_units() {
        let service = service_with(&[]);
        let game_id = service.create_game().await.unwrap();
        let next_to_germans = Position::new(-1, 0);
        assert_eq!(
            service
                .zoc_at(&game_id, Side::Allies, next_to_germans)
                .await
                .unwrap(),
            ZoC::Free
        );

        service.start_game(&game_id).await.unwrap();
        assert_eq!(
            service
                .zoc_at(&game_id, Side::Allies, next_to_germans)
                .await
                .unwrap(),
            ZoC::InZoC(Side::Axis)
        );
        let cost = service
            .path_cost(
                &game_id,
                Side::Axis,
                &[Position::new(-2, 0), Position::new(-1, 0)],
            )
            .await
            .unwrap();
        assert_eq!(cost, Cost::half(Cost::Zero));
    }

    #[tokio::test]
    async fn test_id_collisions_are_redrawn_then_exhausted() {
        let ids = ScriptedIdSource::new(vec![id("SAMESAME"), id("SAMESAME"), id("OTHER001")]);
        let service = GameService::with_id_source(
            ServiceConfig::default(),
            Arc::new(InMemoryPlayerRegistry::new()),
            Box::new(ids),
        );
        assert_eq!(service.create_game().await.unwrap(), id("SAMESAME"));
        assert_eq!(service.create_game().await.unwrap(), id("OTHER001"));
        assert_eq!(
            service.create_game().await.unwrap_err(),
            SessionError::IdExhausted { attempts: 16 }
        );
        assert_eq!(service.list_games().await.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_joins_never_overfill() {
        let names: Vec<String> = (0..8).map(|i| format!("Player{}", i)).collect();
        let registry = InMemoryPlayerRegistry::with_players(names.clone());
        let service = GameService::new(ServiceConfig::default(), Arc::new(registry));
        let game_id = service.create_game().await.unwrap();

        let joins = names.iter().map(|name| {
            let service = service.clone();
            let game_id = game_id.clone();
            let name = name.clone();
            tokio::spawn(async move { service.join_game(&game_id, &name).await })
        });
        let results: Vec<_> = join_all(joins)
            .await
            .into_iter()
            .map(|handle| handle.unwrap())
            .collect();

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 2);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, SessionError::GameFull { .. })));

        let aggregate = service.snapshot(&game_id).await.unwrap();
        assert_eq!(aggregate.players.len(), 2);
        assert_eq!(aggregate, replay(&service.events(&game_id).await.unwrap()));
    }

    #[tokio::test]
    async fn test_summaries_follow_creation_order() {
        let service = service_with(&["Alice"]);
        let first = service.create_game().await.unwrap();
        let second = service.create_game().await.unwrap();
        service.join_game(&second, "Alice").await.unwrap();

        let summaries = service.list_summaries().await;
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].game_id, first);
        assert!(summaries[0].players.is_empty());
        assert_eq!(summaries[1].players, vec!["Alice".to_string()]);
    }
}
