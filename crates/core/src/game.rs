//! Live session state: round counter, party, and the running history.

use crate::player::PlayerConfig;
use crate::world::WorldState;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Location name used when a world declares no locations at all.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Per-character mutable state. `name` matches a `PlayerConfig::name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CharacterState {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    /// Item names; duplicates allowed
    pub inventory: Vec<String>,
    pub status_effects: Vec<String>,
}

impl CharacterState {
    pub fn new(name: impl Into<String>, hp: i32, inventory: Vec<String>) -> Self {
        Self {
            name: name.into(),
            hp,
            max_hp: hp,
            inventory,
            status_effects: Vec::new(),
        }
    }

    /// `0 <= hp <= max_hp`. Not enforced anywhere; useful for diagnostics.
    pub fn hp_in_bounds(&self) -> bool {
        (0..=self.max_hp).contains(&self.hp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GameState {
    /// Starts at 1, increases by one per committed round
    pub round_number: u32,
    /// Name of a location in the world
    pub current_location: String,
    /// One per player, in roster order
    pub characters: Vec<CharacterState>,
    /// NPC name -> attitude override
    pub npc_attitudes: BTreeMap<String, String>,
    /// Quest title -> completed
    pub quest_progress: BTreeMap<String, bool>,
    /// Round resolutions, oldest first
    pub session_history: Vec<String>,
}

impl GameState {
    /// A fresh session at round 1 in the world's first location.
    pub fn new(
        world: &WorldState,
        players: &[PlayerConfig],
        starting_hp: i32,
        starting_inventory: &[String],
    ) -> Self {
        let characters = players
            .iter()
            .map(|p| CharacterState::new(&p.name, starting_hp, starting_inventory.to_vec()))
            .collect();

        let current_location = world
            .starting_location()
            .map(|l| l.name.clone())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        Self {
            round_number: 1,
            current_location,
            characters,
            npc_attitudes: BTreeMap::new(),
            quest_progress: BTreeMap::new(),
            session_history: Vec::new(),
        }
    }

    /// Case-insensitive character lookup.
    pub fn character(&self, name: &str) -> Option<&CharacterState> {
        let name = name.trim();
        self.characters
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}
