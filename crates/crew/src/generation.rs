//! World generation loop.
//!
//! Four steps per iteration: build the setting, create NPCs, design quests,
//! check consistency. The checker's output must be an approved `WorldState`.
//! Parse failures, schema mismatches and rejections each rewrite the seed with
//! the specific problem and try again, up to `max_iterations`. Only an
//! approved world is ever written to disk.

use crate::crew::Crew;
use crate::extract::ExtractorChain;
use crate::persona::Persona;
use crate::schema::{ISSUES_FIELD, world_schema};
use crate::store;
use crate::task::{CrewTask, TaskExecutor, TaskOutput};
use agentquest_core::error::{GenerationAttempt, GenerationError, GenerationFailure};
use agentquest_core::world::WorldState;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub const WORLD_FILE: &str = "world_state.json";

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

pub struct WorldGenerator {
    executor: Arc<dyn TaskExecutor>,
    output_dir: PathBuf,
    max_iterations: u32,
    extractors: ExtractorChain,
}

impl WorldGenerator {
    pub fn new(executor: Arc<dyn TaskExecutor>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            output_dir: output_dir.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            extractors: ExtractorChain::default(),
        }
    }

    /// At least one iteration always runs.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn world_path(&self) -> PathBuf {
        self.output_dir.join(WORLD_FILE)
    }

    /// Generate, validate and persist a world from `seed`.
    pub async fn run(&self, seed: &str) -> Result<WorldState, GenerationError> {
        let mut current_seed = seed.to_string();
        let mut attempts: Vec<GenerationAttempt> = Vec::new();

        for iteration in 1..=self.max_iterations {
            info!(iteration, max = self.max_iterations, "Running generation crew");

            let outputs = generation_crew(&current_seed)
                .kickoff(self.executor.as_ref(), None)
                .await
                .map_err(|source| GenerationError::Dispatch { iteration, source })?;

            let failure = match outputs.last().map(|o| self.evaluate(o, seed)) {
                Some(Ok(world)) => {
                    let path = self.world_path();
                    store::save(&world, &path).await?;
                    info!(iteration, path = %path.display(), "World approved and saved");
                    return Ok(world);
                }
                Some(Err(failure)) => failure,
                None => GenerationFailure::Parse("generation crew produced no output".into()),
            };

            warn!(iteration, failure = %failure, "Generation attempt failed");
            current_seed = retry_seed(seed, &failure);
            attempts.push(GenerationAttempt { iteration, failure });
        }

        let last_failure = attempts
            .last()
            .map(|a| a.failure.clone())
            .unwrap_or_else(|| GenerationFailure::Parse("no attempts were made".into()));
        Err(GenerationError::Exhausted {
            attempts,
            last_failure,
        })
    }

    fn evaluate(&self, output: &TaskOutput, original_seed: &str) -> Result<WorldState, GenerationFailure> {
        let mut value = self.extractors.extract(output)?;

        if let Some(obj) = value.as_object_mut() {
            obj.entry("seed")
                .or_insert_with(|| Value::String(original_seed.to_string()));
        }
        let issues = issues_of(&value);

        let world: WorldState = store::validate(value).map_err(|v| GenerationFailure::Schema {
            field: v.field,
            reason: v.reason,
        })?;

        if !world.consistency_approved {
            return Err(GenerationFailure::Rejected { issues });
        }
        Ok(world)
    }
}

/// Checkers explain rejections under a few different keys, as text or a list.
fn issues_of(value: &Value) -> Option<String> {
    [ISSUES_FIELD, "issues", "feedback"]
        .iter()
        .filter_map(|key| value.get(key))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|i| match i {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            _ => None,
        })
}

/// The seed for the next iteration, built from the original seed and what
/// went wrong.
pub fn retry_seed(original: &str, failure: &GenerationFailure) -> String {
    match failure {
        GenerationFailure::Parse(reason) => format!(
            "Fix formatting errors. The output MUST be valid JSON matching the WorldState schema. \
             Previous seed was: {original}\n\nThe last output could not be parsed: {reason}"
        ),
        GenerationFailure::Schema { field, reason } => format!(
            "Original seed: {original}\n\nSchema error: Please ensure output matches the required JSON \
             structure exactly. The field `{field}` was wrong: {reason}"
        ),
        GenerationFailure::Rejected { issues } => {
            let mut seed = format!(
                "Original seed: {original}\n\nFeedback from Consistency Checker to fix: The generated world \
                 was inconsistent. Please ensure you fix the following issues in this iteration."
            );
            if let Some(issues) = issues {
                seed.push('\n');
                seed.push_str(issues);
            }
            seed
        }
    }
}

fn generation_crew(seed: &str) -> Crew {
    Crew::new(vec![
        CrewTask::new(
            "build_world",
            Persona::world_builder(),
            format!(
                "Create a setting, lore, factions, and locations for the following seed: '{seed}'. \
                 Make locations interconnected."
            ),
            "JSON containing 'setting', 'lore', 'factions', and 'locations'.",
        ),
        CrewTask::new(
            "create_npcs",
            Persona::character_creator(),
            "Generate interesting NPCs (merchants, guards, villains, allies) that fit the setting and locations \
             created by the World Builder. Give them distinct personalities and attitudes.",
            "JSON array of NPCs matching the required schema.",
        )
        .with_context(["build_world"]),
        CrewTask::new(
            "design_quests",
            Persona::quest_designer(),
            "Design one main quest arc involving major factions and locations, and several side quests. \
             Include narrative twists.",
            "JSON containing 'main_quest' and 'side_quests'.",
        )
        .with_context(["build_world", "create_npcs"]),
        CrewTask::new(
            "check_consistency",
            Persona::consistency_checker(),
            format!(
                "Review the generated world (setting, locations, NPCs, quests). Ensure no geographic \
                 impossibilities, lore contradictions, or missing references. Output the complete world as JSON \
                 with 'consistency_approved' set to true, or set it to false and explain what needs fixing in \
                 '{ISSUES_FIELD}'."
            ),
            "The complete world as a single JSON object matching the WorldState schema, including the boolean \
             'consistency_approved'.",
        )
        .with_context(["build_world", "create_npcs", "design_quests"])
        .with_output_schema(world_schema()),
    ])
}

/// Whether an approved world already exists in `output_dir`.
pub fn world_exists(output_dir: &Path) -> bool {
    output_dir.join(WORLD_FILE).is_file()
}
