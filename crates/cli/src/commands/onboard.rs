//! `agentquest onboard` — First-time setup.

use agentquest_config::AppConfig;
use agentquest_config::roster::sample_roster_toml;
use std::path::Path;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = AppConfig::config_path();

    println!("🎲 AgentQuest — First-Time Setup");
    println!("================================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
    }

    let config = AppConfig::load_from(&config_path)?;
    if write_sample_roster(&config.session.players_file)? {
        println!("✅ Created sample roster: {}", config.session.players_file.display());
    } else {
        println!("  Roster exists: {}", config.session.players_file.display());
    }

    println!("\n📝 Next steps:");
    println!("   1. Set AGENTQUEST_API_KEY (or add api_key to {})", config_path.display());
    println!("   2. Run: agentquest generate --seed \"A frozen northern kingdom\"");
    println!("   3. Run: agentquest play\n");

    Ok(())
}

/// Returns `false` when a roster already exists.
fn write_sample_roster(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, sample_roster_toml())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_roster_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("party").join("players.toml");

        assert!(write_sample_roster(&path).unwrap());
        std::fs::write(&path, "edited").unwrap();
        assert!(!write_sample_roster(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "edited");
    }

    #[test]
    fn sample_roster_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("players.toml");
        write_sample_roster(&path).unwrap();
        let players = agentquest_config::load_roster(&path).unwrap();
        assert_eq!(players.len(), 2);
    }
}
