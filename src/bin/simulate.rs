use clap::Parser;
use itertools::Itertools;
use log::info;
use std::sync::Arc;

use warroom::game::{cheapest, neighbours, Position};
use warroom::player_system::InMemoryPlayerRegistry;
use warroom::{GameService, PlayerView, ServiceConfig, Side};

/// Drive a handful of sessions end to end and print what the registry sees.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Seed for game ids and player keys
    #[arg(long)]
    seed: Option<u64>,

    /// Game-type tag used in redirect paths
    #[arg(long)]
    game_type: Option<String>,

    /// Comma separated names registered before joining
    #[arg(long, value_delimiter = ',', default_value = "Alice,Bob")]
    players: Vec<String>,

    /// Number of games to create
    #[arg(short = 'n', long, default_value_t = 1)]
    games: usize,
}

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args = Args::parse();
    let mut config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(game_type) = args.game_type {
        config.game_type = game_type;
    }

    let registry = Arc::new(InMemoryPlayerRegistry::new());
    for name in &args.players {
        registry.register(name.as_str()).await;
    }
    let service = GameService::new(config, registry);

    println!("War Room Simulation");
    println!("===================");
    println!("  - Players: {}", args.players.iter().join(", "));
    println!("  - Games: {}", args.games);

    for game_num in 0..args.games {
        if let Err(e) = simulate_single_game(&service, &args.players).await {
            println!("Game {} aborted: {}", game_num + 1, e);
        }
    }

    let summaries = service.list_summaries().await;
    match serde_json::to_string_pretty(&summaries) {
        Ok(json) => println!("\nSummaries:\n{}", json),
        Err(e) => println!("Could not serialise summaries: {}", e),
    }
}

async fn simulate_single_game(
    service: &GameService,
    players: &[String],
) -> warroom::SessionResult<()> {
    let game_id = service.create_game().await?;
    println!("\nGame {}", game_id);

    let mut keys = Vec::new();
    for name in players {
        match service.join_game(&game_id, name).await {
            Ok(key) => {
                println!("  {} joined with key {}", name, key);
                keys.push(key);
            }
            Err(e) => println!("  {} turned away: {}", name, e),
        }
    }

    for key in &keys {
        match service.get_player_state(&game_id, key).await? {
            PlayerView::State(state) => {
                println!("  {} waits as {} ({})", state.name, state.side, state.status)
            }
            PlayerView::Redirect(path) => println!("  {} -> {}", key, path),
        }
    }

    if service.start_game(&game_id).await? {
        info!("Game {} started", game_id);
    }
    let snapshot = service.snapshot(&game_id).await?;
    println!(
        "  Deployed: {}",
        snapshot
            .units
            .iter()
            .map(|(unit, pos)| format!("{:?} {:?} at {}", unit.nation, unit.kind, pos))
            .join("; ")
    );

    // Zones of control the Allies face around the German line.
    let front = Position::new(-2, 0);
    let mut contested = Vec::new();
    for pos in neighbours(front) {
        if !service.terrain().contains(pos) {
            continue;
        }
        if !service.zoc_at(&game_id, Side::Allies, pos).await?.is_free() {
            contested.push(pos);
        }
    }
    println!(
        "  Allied ZoC hexes near {}: {}",
        front,
        contested.iter().join(" ")
    );

    let road = [Position::new(2, 0), Position::new(1, 0), Position::new(0, 0)];
    let detour = [
        Position::new(2, 0),
        Position::new(1, 1),
        Position::new(0, 1),
        Position::new(0, 0),
    ];
    for path in [&road[..], &detour[..]] {
        let cost = service.path_cost(&game_id, Side::Allies, path).await?;
        println!("  Path {}: {}", path.iter().join(" -> "), cost);
    }
    let units = snapshot.units;
    if let Some((index, cost)) = cheapest(
        service.terrain(),
        &units,
        Side::Allies,
        [&road[..], &detour[..]],
    ) {
        println!("  Cheapest is path {} at {}", index, cost);
    }
    Ok(())
}
