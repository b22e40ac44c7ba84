//! Agent personas.
//!
//! A persona is who the model is asked to be for one task: a role, a goal, a
//! backstory and the tools it may call. The same persona can serve many tasks.

use agentquest_core::player::PlayerConfig;
use agentquest_core::tool::ToolRegistry;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Persona {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Arc<ToolRegistry>,
}

impl Persona {
    pub fn new(role: impl Into<String>, goal: impl Into<String>, backstory: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Arc::new(ToolRegistry::new()),
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Arc::new(tools);
        self
    }

    /// The system message this persona speaks from.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}.\n{}\n\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }

    pub fn world_builder() -> Self {
        Self::new(
            "World Builder",
            "Create a cohesive setting, lore, factions, and locations based on the world seed.",
            "You are a master world-builder for tabletop RPGs, known for creating incredibly immersive and logical fantasy/sci-fi settings.",
        )
    }

    pub fn character_creator() -> Self {
        Self::new(
            "Character Creator",
            "Populate the world with interesting NPCs fitting the locations and setting.",
            "You are an expert character writer. You craft NPCs with deep personalities, intertwined backstories, and varied attitudes.",
        )
    }

    pub fn quest_designer() -> Self {
        Self::new(
            "Quest Designer",
            "Design one main epic quest and multiple engaging side quests.",
            "You are a veteran campaign designer. You excel at weaving interesting plot twists, complex faction dynamics, and dramatic story arcs.",
        )
    }

    pub fn consistency_checker() -> Self {
        Self::new(
            "Consistency Checker",
            "Ensure the entire generated game world is geographically and logically consistent.",
            "You are a meticulous editor and logic-checker. You spot contradictions and impossible connections instantly.",
        )
    }

    /// The Dungeon Master rolls dice and consults the persisted world.
    pub fn dungeon_master(world_path: &Path) -> Self {
        Self::new(
            "Dungeon Master",
            "Orchestrate the game round, collect player actions, resolve outcomes, and narrate the scene.",
            "You are a master storyteller and fair adjudicator of rules. You keep the game challenging but fun.",
        )
        .with_tools(agentquest_tools::dm_registry(world_path))
    }

    /// Condenses old rounds when the session history grows too long.
    pub fn chronicler() -> Self {
        Self::new(
            "Chronicler",
            "Condense the story so far into a faithful, compact record.",
            "You keep the campaign log. Nothing important is ever lost in your summaries: who did what, who was hurt, what was found, and where the story is heading.",
        )
    }

    /// A player character, reading its own sheet from the persisted game state.
    pub fn player(config: &PlayerConfig, game_state_path: &Path) -> Self {
        Self::new(
            &config.name,
            format!(
                "Act as {}, a {}, and decide your next action based on your personality.",
                config.name, config.character_class
            ),
            config.character_brief(),
        )
        .with_tools(agentquest_tools::player_registry(game_state_path))
    }
}
