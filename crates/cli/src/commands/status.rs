//! `agentquest status` — Show configuration and saved artifacts.

use agentquest_config::AppConfig;
use agentquest_core::game::GameState;
use agentquest_crew::session::GAME_STATE_FILE;
use agentquest_crew::store;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    println!("🎲 AgentQuest Status");
    println!("====================");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Provider:       {}", config.default_provider);
    println!("  Model:          {}", config.default_model);
    println!("  Temperature:    {}", config.default_temperature);
    println!("  API key:        {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Max iterations: {}", config.generation.max_iterations);
    println!(
        "  Compaction:     over {} entries, keep {}",
        config.session.history_threshold, config.session.keep_recent
    );
    println!("  Gateway:        {}:{}", config.gateway.host, config.gateway.port);

    let world_path = config.generation.world_path();
    if world_path.is_file() {
        println!("\n  ✅ World: {}", world_path.display());
    } else {
        println!("\n  ⚠️  No world yet — run `agentquest generate --seed ...`");
    }

    let state_path = config.session.output_dir.join(GAME_STATE_FILE);
    match store::load::<GameState>(&state_path).await {
        Ok(state) => println!(
            "  ✅ Game in progress: round {} at {}",
            state.round_number, state.current_location
        ),
        Err(agentquest_core::StoreError::NotFound { .. }) => println!("  No game in progress"),
        Err(e) => println!("  ⚠️  Game state unreadable: {e}"),
    }

    if config.session.players_file.is_file() {
        println!("  ✅ Roster: {}", config.session.players_file.display());
    } else {
        println!("  ⚠️  No roster — run `agentquest onboard` first");
    }

    Ok(())
}
