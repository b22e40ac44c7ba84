//! # AgentQuest Core
//!
//! Domain types, traits, and error definitions for the AgentQuest
//! orchestrator. Framework-free: the world and game records, the player
//! roster entry, and the `Provider` / `Tool` seams every other crate
//! implements against.

pub mod error;
pub mod game;
pub mod message;
pub mod player;
pub mod provider;
pub mod tool;
pub mod world;

// Re-export key types at crate root for ergonomics
pub use error::{
    DispatchError, Error, GenerationAttempt, GenerationError, GenerationFailure, ProviderError, Result,
    RoundError, StoreError, ToolError,
};
pub use game::{CharacterState, GameState};
pub use message::{Message, MessageToolCall, Role};
pub use player::PlayerConfig;
pub use provider::{Provider, ProviderRequest, ProviderResponse, ResponseFormat, ToolDefinition, Usage};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
pub use world::{Location, Npc, Quest, WorldState};
