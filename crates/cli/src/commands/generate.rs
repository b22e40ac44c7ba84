//! `agentquest generate`: build a world from a seed.

use agentquest_core::world::WorldState;
use agentquest_crew::WorldGenerator;
use std::path::PathBuf;

pub async fn run(
    seed: String,
    output: Option<PathBuf>,
    max_iterations: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;
    if let Some(dir) = output {
        config.generation.output_dir = dir;
    }
    if let Some(n) = max_iterations {
        config.generation.max_iterations = n;
    }

    let executor = agentquest_gateway::executor_from_config(&config)?;

    println!("🌍 Generating world: {seed}");
    println!("   Model: {} via {}", config.default_model, config.default_provider);

    let world = WorldGenerator::new(executor, &config.generation.output_dir)
        .with_max_iterations(config.generation.max_iterations)
        .run(&seed)
        .await?;

    println!("\n{}", summary(&world));
    println!("✅ Saved to {}", config.generation.world_path().display());
    Ok(())
}

fn summary(world: &WorldState) -> String {
    let mut out = format!("Setting: {}\n", world.setting);
    out.push_str(&format!("Factions: {}\n", world.factions.join(", ")));
    out.push_str(&format!(
        "Locations ({}): {}\n",
        world.locations.len(),
        world
            .locations
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    out.push_str(&format!("NPCs: {}\n", world.npcs.len()));
    out.push_str(&format!(
        "Main quest: {} (+{} side quests)\n",
        world.main_quest.title,
        world.side_quests.len()
    ));
    for dangling in world.dangling_references() {
        out.push_str(&format!("⚠️  {dangling}\n"));
    }
    out
}
