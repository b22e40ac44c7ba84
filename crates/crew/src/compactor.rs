//! History compactor.
//!
//! Keeps `session_history` short enough for the agents' context windows. Once
//! the history grows past the threshold, everything but the most recent
//! entries is summarized into a single entry. The summarized entries are gone
//! afterwards; only the summary survives.

use crate::event::RoundEvent;
use crate::persona::Persona;
use crate::task::{CrewTask, TaskExecutor};
use agentquest_core::error::DispatchError;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

pub const SUMMARY_PREFIX: &str = "Summary of early events:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCompactor {
    /// Compact when the history is longer than this
    pub threshold: usize,
    /// Entries kept verbatim
    pub keep_recent: usize,
}

impl Default for HistoryCompactor {
    fn default() -> Self {
        Self {
            threshold: 10,
            keep_recent: 3,
        }
    }
}

impl HistoryCompactor {
    pub fn new(threshold: usize, keep_recent: usize) -> Self {
        Self {
            threshold,
            keep_recent: keep_recent.min(threshold),
        }
    }

    pub fn needs_compaction(&self, history: &[String]) -> bool {
        history.len() > self.threshold
    }

    fn summary_task(&self, to_summarize: &[String]) -> CrewTask {
        CrewTask::new(
            "summarize_history",
            Persona::chronicler(),
            format!(
                "Summarize the following game history into a concise overview. \
                 Focus on key events, decisions, character status, and plot progression.\n\n{}",
                to_summarize.join("\n\n")
            ),
            "A 1-2 paragraph summary of the early game history.",
        )
    }

    /// Returns the compacted history, or `None` when no compaction is needed.
    /// A failed summary is an error; the history is never silently left
    /// uncompacted.
    pub async fn compact(
        &self,
        history: &[String],
        executor: &dyn TaskExecutor,
        events: Option<&UnboundedSender<RoundEvent>>,
    ) -> Result<Option<Vec<String>>, DispatchError> {
        if !self.needs_compaction(history) {
            return Ok(None);
        }

        let split = history.len() - self.keep_recent;
        let (to_summarize, recent) = history.split_at(split);

        let task = self.summary_task(to_summarize);
        crate::crew::emit(
            events,
            RoundEvent::StepStarted {
                step: task.name.clone(),
                agent: task.persona.role.clone(),
            },
        );
        let output = executor.execute(&task, &[]).await?;
        crate::crew::emit(
            events,
            RoundEvent::StepCompleted {
                step: output.task.clone(),
                agent: output.agent.clone(),
                output: output.raw.clone(),
            },
        );

        info!(
            summarized = to_summarize.len(),
            kept = recent.len(),
            "Compacted session history"
        );

        let mut compacted = Vec::with_capacity(recent.len() + 1);
        compacted.push(format!("{SUMMARY_PREFIX}\n{}", output.raw.trim()));
        compacted.extend_from_slice(recent);
        Ok(Some(compacted))
    }
}
