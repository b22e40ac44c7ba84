//! Agent tools for AgentQuest.
//!
//! The Dungeon Master rolls dice and consults the world; players read their
//! own character sheet. Both registries read the persisted JSON files, so the
//! agents always see the last committed state.

pub mod character_sheet;
pub mod dice_roller;
pub mod world_state;

pub use character_sheet::CharacterSheetTool;
pub use dice_roller::{DiceExpression, DiceRollerTool};
pub use world_state::WorldStateTool;

use agentquest_core::tool::ToolRegistry;
use std::path::Path;

/// Tools available to the Dungeon Master.
pub fn dm_registry(world_path: &Path) -> ToolRegistry {
    ToolRegistry::new()
        .with(DiceRollerTool)
        .with(WorldStateTool::new(world_path))
}

/// Tools available to a player agent.
pub fn player_registry(game_state_path: &Path) -> ToolRegistry {
    ToolRegistry::new().with(CharacterSheetTool::new(game_state_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dm_has_dice_and_world_tools() {
        let registry = dm_registry(Path::new("world_state.json"));
        assert_eq!(registry.names(), vec!["query_world_state", "roll_dice"]);
    }

    #[test]
    fn player_has_character_sheet_only() {
        let registry = player_registry(Path::new("game_state.json"));
        assert_eq!(registry.names(), vec!["character_sheet"]);
    }
}
