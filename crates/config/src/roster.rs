//! Player roster files.
//!
//! ```toml
//! [[players]]
//! name = "Valerius"
//! character_class = "Paladin"
//! personality = "Stoic, honorable"
//! goal = "Restore the fallen crown"
//! alignment = "Lawful Good"
//! ```
//!
//! A `.json` file with a top-level `players` array (or a bare array) is
//! accepted as well.

use crate::ConfigError;
use agentquest_core::PlayerConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct RosterFile {
    players: Vec<PlayerConfig>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRoster {
    Wrapped(RosterFile),
    Bare(Vec<PlayerConfig>),
}

/// Load and validate a roster from disk. The format follows the extension.
pub fn load_roster(path: &Path) -> Result<Vec<PlayerConfig>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let players = if is_json {
        parse_json(&content, path)?
    } else {
        parse_toml(&content, path)?
    };

    validate(players)
}

/// Parse a roster given inline as TOML text.
pub fn parse_roster_toml(content: &str) -> Result<Vec<PlayerConfig>, ConfigError> {
    validate(parse_toml(content, Path::new("<inline>"))?)
}

fn parse_toml(content: &str, path: &Path) -> Result<Vec<PlayerConfig>, ConfigError> {
    toml::from_str::<RosterFile>(content)
        .map(|r| r.players)
        .map_err(|e| parse_error(path, e))
}

fn parse_json(content: &str, path: &Path) -> Result<Vec<PlayerConfig>, ConfigError> {
    match serde_json::from_str::<JsonRoster>(content).map_err(|e| parse_error(path, e))? {
        JsonRoster::Wrapped(r) => Ok(r.players),
        JsonRoster::Bare(players) => Ok(players),
    }
}

fn parse_error(path: &Path, e: impl std::fmt::Display) -> ConfigError {
    ConfigError::ParseError {
        path: PathBuf::from(path),
        reason: e.to_string(),
    }
}

fn validate(players: Vec<PlayerConfig>) -> Result<Vec<PlayerConfig>, ConfigError> {
    if players.is_empty() {
        return Err(ConfigError::ValidationError("roster has no players".into()));
    }

    let mut seen = HashSet::new();
    for p in &players {
        if p.name.trim().is_empty() {
            return Err(ConfigError::ValidationError("player name must not be empty".into()));
        }
        if !seen.insert(p.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate player name: {}",
                p.name
            )));
        }
    }

    Ok(players)
}

/// A two-player roster written by `agentquest onboard`.
pub fn sample_roster_toml() -> &'static str {
    r#"[[players]]
name = "Valerius"
character_class = "Paladin"
personality = "Stoic, honorable, protective of the weak"
goal = "Restore the fallen crown"
alignment = "Lawful Good"

[[players]]
name = "Lyra"
character_class = "Rogue"
personality = "Quick-witted, curious, a little greedy"
goal = "Find the treasure hidden beneath Stormkeep"
alignment = "Chaotic Neutral"
backstory = "Grew up picking pockets in the harbor district."
"#
}
