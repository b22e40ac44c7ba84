//! JSON schemas for persisted records and the consistency checker's output.
//!
//! Derived from the record types so the prompt, the store and the validator
//! never disagree.
//! Subschemas are inlined; some providers reject `$ref`.

use agentquest_core::world::WorldState;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use serde_json::Value;

/// Optional field the checker uses to explain a rejection.
pub const ISSUES_FIELD: &str = "consistency_issues";

/// The JSON schema of `T` with every subschema inlined.
pub fn record_schema<T: JsonSchema>() -> Value {
    let schema = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        })
        .into_generator()
        .into_root_schema_for::<T>();
    serde_json::to_value(schema).unwrap_or_default()
}

/// The `WorldState` schema plus an optional `consistency_issues` string.
pub fn world_schema() -> Value {
    let mut value = record_schema::<WorldState>();
    if let Some(props) = value.get_mut("properties").and_then(Value::as_object_mut) {
        props.insert(
            ISSUES_FIELD.to_string(),
            serde_json::json!({
                "type": "string",
                "description": "When consistency_approved is false, the specific problems found"
            }),
        );
    }
    value
}
