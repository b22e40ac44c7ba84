//! Round events: what a streaming caller sees while a round runs.

use agentquest_core::game::GameState;
use serde::{Deserialize, Serialize};

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Continue,
    GameOver,
}

impl RoundOutcome {
    /// Whether the caller may ask for another round.
    pub fn may_continue(self) -> bool {
        self == Self::Continue
    }
}

/// An event emitted during a round. Serialized as tagged JSON for SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    RoundStarted {
        round: u32,
        location: String,
    },

    /// Older history was folded into one summary entry.
    HistoryCompacted {
        round: u32,
        summarized: usize,
        kept: usize,
    },

    StepStarted {
        step: String,
        agent: String,
    },

    StepCompleted {
        step: String,
        agent: String,
        output: String,
    },

    /// The round's state was persisted.
    RoundCommitted {
        round: u32,
        outcome: RoundOutcome,
        resolution: String,
        game_state: GameState,
    },

    Error {
        message: String,
    },

    /// Sentinel; always the last event of a round stream.
    Done,
}

impl RoundEvent {
    /// Event name used for SSE.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RoundStarted { .. } => "round_started",
            Self::HistoryCompacted { .. } => "history_compacted",
            Self::StepStarted { .. } => "step_started",
            Self::StepCompleted { .. } => "step_completed",
            Self::RoundCommitted { .. } => "round_committed",
            Self::Error { .. } => "error",
            Self::Done => "done",
        }
    }
}
