//! `agentquest play`: run rounds against a generated world.

use agentquest_config::{AppConfig, load_roster};
use agentquest_core::world::WorldState;
use agentquest_crew::{GameSession, SessionOptions, store};
use std::path::PathBuf;

pub struct PlayArgs {
    pub world: Option<PathBuf>,
    pub players: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub rounds: Option<u32>,
    pub fresh: bool,
}

pub async fn run(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    let world_path = args.world.unwrap_or_else(|| config.generation.world_path());
    let roster_path = args.players.unwrap_or_else(|| config.session.players_file.clone());
    let output_dir = args.output.unwrap_or_else(|| config.session.output_dir.clone());

    let world: WorldState = store::load(&world_path)
        .await
        .map_err(|e| format!("{e} (run `agentquest generate` first)"))?;
    let players = load_roster(&roster_path)?;
    let executor = agentquest_gateway::executor_from_config(&config)?;

    let mut session = GameSession::open(
        world,
        players,
        &output_dir,
        executor,
        session_options(&config, world_path, !args.fresh),
    )
    .await?;

    println!("⚔️  {}", session.world().setting);
    println!(
        "   Round {} at {} — {} players",
        session.game_state().round_number,
        session.game_state().current_location,
        session.players().len()
    );
    println!("   Transcript: {}\n", session.paths().transcript.display());

    let mut played = 0u32;
    loop {
        if args.rounds.is_some_and(|limit| played >= limit) {
            tracing::info!(rounds = played, "Round limit reached");
            println!("⏸️  Stopped after {played} rounds; run `agentquest play` to resume.");
            break;
        }

        let round = session.game_state().round_number;
        let keep_going = session.run_round().await?;
        played += 1;

        println!("── Round {round} ──");
        if let Some(latest) = session.game_state().session_history.last() {
            println!("{latest}\n");
        }

        if !keep_going {
            println!("🏁 Game over after round {round}.");
            break;
        }
    }

    Ok(())
}

fn session_options(config: &AppConfig, world_path: PathBuf, resume: bool) -> SessionOptions {
    SessionOptions {
        resume,
        starting_hp: config.session.starting_hp,
        starting_inventory: config.session.starting_inventory.clone(),
        history_threshold: config.session.history_threshold,
        keep_recent: config.session.keep_recent,
        world_path: Some(world_path),
    }
}
