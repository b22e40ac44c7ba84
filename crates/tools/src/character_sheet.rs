//! Character sheet tool. A player reads its own stats and inventory from the
//! persisted game state.

use async_trait::async_trait;
use agentquest_core::error::ToolError;
use agentquest_core::game::GameState;
use agentquest_core::tool::{Tool, ToolResult};
use std::path::PathBuf;

pub struct CharacterSheetTool {
    game_state_path: PathBuf,
}

impl CharacterSheetTool {
    pub fn new(game_state_path: impl Into<PathBuf>) -> Self {
        Self {
            game_state_path: game_state_path.into(),
        }
    }
}

#[async_trait]
impl Tool for CharacterSheetTool {
    fn name(&self) -> &str {
        "character_sheet"
    }

    fn description(&self) -> &str {
        "Query your own character's stats and inventory from the game state."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "character_name": {
                    "type": "string",
                    "description": "Your character's name"
                }
            },
            "required": ["character_name"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let name = arguments["character_name"].as_str().ok_or_else(|| {
            ToolError::InvalidArguments("Missing 'character_name' argument".into())
        })?;

        let content = match tokio::fs::read_to_string(&self.game_state_path).await {
            Ok(c) => c,
            Err(e) => {
                return Ok(ToolResult::failure(format!(
                    "Error reading game state from {}: {e}",
                    self.game_state_path.display()
                )));
            }
        };

        let state: GameState =
            serde_json::from_str(&content).map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: format!("game state is invalid: {e}"),
            })?;

        match state.character(name) {
            Some(character) => {
                let data = serde_json::to_value(character).map_err(|e| ToolError::ExecutionFailed {
                    tool_name: self.name().into(),
                    reason: e.to_string(),
                })?;
                let output = serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string());
                Ok(ToolResult::ok(output).with_data(data))
            }
            None => Ok(ToolResult::failure(format!(
                "Error: Character '{}' not found in game state.",
                name.trim()
            ))),
        }
    }
}
