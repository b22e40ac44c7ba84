//! An ordered chain of tasks run against one executor.

use crate::event::RoundEvent;
use crate::task::{CrewTask, TaskExecutor, TaskOutput};
use agentquest_core::error::DispatchError;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Crew {
    tasks: Vec<CrewTask>,
}

impl Crew {
    pub fn new(tasks: Vec<CrewTask>) -> Self {
        Self { tasks }
    }

    /// Run every task in declaration order. A task sees only the outputs of
    /// the tasks it names in `context`, and those must run earlier.
    pub async fn kickoff(
        &self,
        executor: &dyn TaskExecutor,
        events: Option<&UnboundedSender<RoundEvent>>,
    ) -> Result<Vec<TaskOutput>, DispatchError> {
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());
        let mut by_name: HashMap<&str, usize> = HashMap::new();

        for task in &self.tasks {
            if by_name.contains_key(task.name.as_str()) {
                return Err(DispatchError::MalformedTask {
                    step: task.name.clone(),
                    reason: "duplicate task name".into(),
                });
            }

            let context = task
                .context
                .iter()
                .map(|dep| {
                    by_name
                        .get(dep.as_str())
                        .map(|&i| outputs[i].clone())
                        .ok_or_else(|| DispatchError::MalformedTask {
                            step: task.name.clone(),
                            reason: format!("depends on unknown or later task '{dep}'"),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            emit(
                events,
                RoundEvent::StepStarted {
                    step: task.name.clone(),
                    agent: task.persona.role.clone(),
                },
            );
            debug!(step = %task.name, deps = context.len(), "Dispatching step");

            let output = executor.execute(task, &context).await?;

            emit(
                events,
                RoundEvent::StepCompleted {
                    step: output.task.clone(),
                    agent: output.agent.clone(),
                    output: output.raw.clone(),
                },
            );

            by_name.insert(task.name.as_str(), outputs.len());
            outputs.push(output);
        }

        Ok(outputs)
    }
}

/// Send to an optional listener; a dropped receiver is not an error.
pub(crate) fn emit(events: Option<&UnboundedSender<RoundEvent>>, event: RoundEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::Persona;
    use crate::test_helpers::ScriptedExecutor;
    use agentquest_core::error::ProviderError;

    fn task(name: &str, deps: &[&str]) -> CrewTask {
        CrewTask::new(name, Persona::world_builder(), format!("Do {name}"), "text")
            .with_context(deps.iter().copied())
    }

    #[tokio::test]
    async fn runs_in_order_with_declared_context() {
        let executor = ScriptedExecutor::new(|t, _| Ok(format!("{} done", t.name)));
        let crew = Crew::new(vec![
            task("a", &[]),
            task("b", &["a"]),
            task("c", &["a", "b"]),
        ]);

        let outputs = crew.kickoff(&executor, None).await.unwrap();
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[2].raw, "c done");

        let calls = executor.calls();
        assert_eq!(calls[0].context, Vec::<String>::new());
        assert_eq!(calls[1].context, vec!["a"]);
        assert_eq!(calls[2].context, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn unknown_dependency_is_malformed() {
        let executor = ScriptedExecutor::new(|_, _| Ok("x".into()));
        let crew = Crew::new(vec![task("a", &["later"]), task("later", &[])]);
        let err = crew.kickoff(&executor, None).await.unwrap_err();
        assert!(matches!(err, DispatchError::MalformedTask { ref step, .. } if step == "a"));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn duplicate_name_is_malformed() {
        let executor = ScriptedExecutor::new(|_, _| Ok("x".into()));
        let crew = Crew::new(vec![task("a", &[]), task("a", &[])]);
        assert!(crew.kickoff(&executor, None).await.is_err());
    }

    #[tokio::test]
    async fn failure_stops_the_chain() {
        let executor = ScriptedExecutor::new(|t, _| {
            if t.name == "b" {
                Err(DispatchError::Provider {
                    step: "b".into(),
                    source: ProviderError::Timeout("slow".into()),
                })
            } else {
                Ok("ok".into())
            }
        });
        let crew = Crew::new(vec![task("a", &[]), task("b", &["a"]), task("c", &["b"])]);
        let err = crew.kickoff(&executor, None).await.unwrap_err();
        assert_eq!(err.step(), "b");
        assert_eq!(executor.calls().len(), 2);
    }

    #[tokio::test]
    async fn emits_step_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let executor = ScriptedExecutor::new(|_, _| Ok("out".into()));
        Crew::new(vec![task("a", &[])])
            .kickoff(&executor, Some(&tx))
            .await
            .unwrap();

        assert!(matches!(rx.recv().await, Some(RoundEvent::StepStarted { ref step, .. }) if step == "a"));
        assert!(matches!(
            rx.recv().await,
            Some(RoundEvent::StepCompleted { ref output, .. }) if output == "out"
        ));
    }
}
