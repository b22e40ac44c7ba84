//! # AgentQuest Crew
//!
//! The orchestration layer: personas and tasks, the agent-execution seam
//! (`TaskExecutor`), sequential crews, the JSON state store, the history
//! compactor, the round executor (`GameSession`) and the world generation
//! loop (`WorldGenerator`).
//!
//! Everything that talks to a model goes through `TaskExecutor`, so the
//! orchestration can be driven by a scripted executor in tests.

pub mod compactor;
pub mod crew;
pub mod event;
pub mod extract;
pub mod generation;
pub mod persona;
pub mod schema;
pub mod session;
pub mod store;
pub mod task;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use compactor::HistoryCompactor;
pub use crew::Crew;
pub use event::{RoundEvent, RoundOutcome};
pub use generation::{WORLD_FILE, WorldGenerator};
pub use persona::Persona;
pub use session::{GameSession, RoundReport, SessionOptions, SessionPaths, spawn_round};
pub use task::{CrewTask, ProviderExecutor, TaskExecutor, TaskOutput};
