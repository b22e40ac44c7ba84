//! Player character configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Who a player agent is. Loaded once per session and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlayerConfig {
    /// Unique across the players of a session
    pub name: String,
    pub character_class: String,
    pub personality: String,
    pub goal: String,
    pub alignment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backstory: Option<String>,
}

impl PlayerConfig {
    /// The character description a player agent plays from.
    pub fn character_brief(&self) -> String {
        let mut brief = format!(
            "Class: {}\nAlignment: {}\nPersonality: {}\nGoal: {}",
            self.character_class, self.alignment, self.personality, self.goal
        );
        if let Some(backstory) = &self.backstory {
            brief.push_str("\nBackstory: ");
            brief.push_str(backstory);
        }
        brief
    }
}
