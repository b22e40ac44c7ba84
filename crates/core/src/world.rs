//! The generated world: setting, lore, locations, NPCs and quests.
//!
//! A `WorldState` is produced once by the generation pipeline and is
//! read-only afterwards. Cross references (`connected_to`, `npcs_present`)
//! are plain names; keeping them consistent is the consistency checker's job,
//! not something deserialization enforces.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A place the party can be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    /// Unique within a world
    pub name: String,
    pub description: String,
    /// Names of reachable locations (directed)
    pub connected_to: Vec<String>,
    /// Names of NPCs found here
    pub npcs_present: Vec<String>,
}

/// A non-player character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Npc {
    /// Unique within a world
    pub name: String,
    pub role: String,
    pub personality: String,
    /// Usually "friendly", "neutral" or "hostile", but any text is kept as-is.
    pub attitude_toward_party: String,
    pub backstory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Quest {
    pub title: String,
    pub description: String,
    pub objectives: Vec<String>,
    pub twists: Vec<String>,
    pub is_main_quest: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorldState {
    /// The free-text prompt the world was generated from
    pub seed: String,
    pub setting: String,
    pub lore: String,
    pub factions: Vec<String>,
    pub locations: Vec<Location>,
    pub npcs: Vec<Npc>,
    pub main_quest: Quest,
    pub side_quests: Vec<Quest>,
    pub consistency_approved: bool,
}

/// A cross reference that names nothing in the same world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DanglingReference {
    Location { from: String, to: String },
    Npc { location: String, npc: String },
}

impl std::fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Location { from, to } => write!(f, "{from} connects to unknown location {to}"),
            Self::Npc { location, npc } => write!(f, "{location} lists unknown NPC {npc}"),
        }
    }
}

impl WorldState {
    pub fn location(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == name)
    }

    pub fn npc(&self, name: &str) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.name == name)
    }

    /// The first declared location, where every session begins.
    pub fn starting_location(&self) -> Option<&Location> {
        self.locations.first()
    }

    /// All quests, main quest first.
    pub fn quests(&self) -> impl Iterator<Item = &Quest> {
        std::iter::once(&self.main_quest).chain(self.side_quests.iter())
    }

    /// Lists references that do not resolve inside this world.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        for loc in &self.locations {
            for to in &loc.connected_to {
                if self.location(to).is_none() {
                    dangling.push(DanglingReference::Location {
                        from: loc.name.clone(),
                        to: to.clone(),
                    });
                }
            }
            for npc in &loc.npcs_present {
                if self.npc(npc).is_none() {
                    dangling.push(DanglingReference::Npc {
                        location: loc.name.clone(),
                        npc: npc.clone(),
                    });
                }
            }
        }
        dangling
    }
}
