//! World-state query tool. Lets the Dungeon Master look up a section of the
//! persisted world.

use async_trait::async_trait;
use agentquest_core::error::ToolError;
use agentquest_core::tool::{Tool, ToolResult};
use std::path::PathBuf;

pub const SECTIONS: &[&str] = &[
    "seed",
    "setting",
    "lore",
    "factions",
    "locations",
    "npcs",
    "main_quest",
    "side_quests",
];

pub struct WorldStateTool {
    world_path: PathBuf,
}

impl WorldStateTool {
    pub fn new(world_path: impl Into<PathBuf>) -> Self {
        Self {
            world_path: world_path.into(),
        }
    }
}

#[async_trait]
impl Tool for WorldStateTool {
    fn name(&self) -> &str {
        "query_world_state"
    }

    fn description(&self) -> &str {
        "Query sections of the world state. Useful for getting information about locations, NPCs, quests, or lore."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "section": {
                    "type": "string",
                    "enum": SECTIONS,
                    "description": "Which part of the world to read"
                }
            },
            "required": ["section"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let section = arguments["section"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'section' argument".into()))?
            .trim()
            .to_lowercase();

        if !SECTIONS.contains(&section.as_str()) {
            return Ok(ToolResult::failure(format!(
                "Error: '{section}' is not a valid section. Valid sections are: {}",
                SECTIONS.join(", ")
            )));
        }

        let content = match tokio::fs::read_to_string(&self.world_path).await {
            Ok(c) => c,
            Err(e) => {
                return Ok(ToolResult::failure(format!(
                    "Error reading world state from {}: {e}",
                    self.world_path.display()
                )));
            }
        };

        let document: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: format!("world state is not valid JSON: {e}"),
            })?;

        let Some(value) = document.get(&section) else {
            return Ok(ToolResult::failure(format!(
                "Error: the world state has no '{section}' section"
            )));
        };

        let output = match value {
            serde_json::Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        Ok(ToolResult::ok(output).with_data(value.clone()))
    }
}
