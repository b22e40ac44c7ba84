//! JSON persistence for worlds, game states and rosters.
//!
//! Loading validates structure only: a missing or mistyped field is a
//! `SchemaInvalid` error naming the field. Dangling references and similar
//! semantic problems are left to the consistency checker.

use crate::schema::record_schema;
use agentquest_core::error::StoreError;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// A structural mismatch between a JSON value and a target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Dotted path of the offending field; `.` for the document root
    pub field: String,
    pub reason: String,
}

/// Deserialize `value` as `T`, reporting the offending field on failure.
///
/// Records must be JSON objects at every level: serde would otherwise accept
/// a positional array in place of a struct.
pub fn validate<T: DeserializeOwned + JsonSchema>(value: Value) -> Result<T, SchemaViolation> {
    if let Some(field) = positional_record(&record_schema::<T>(), &value, "") {
        return Err(SchemaViolation {
            field,
            reason: "expected an object with named fields, found an array".into(),
        });
    }

    serde_path_to_error::deserialize(value).map_err(|e| {
        let reason = e.inner().to_string();
        SchemaViolation {
            field: field_of(&e.path().to_string(), &reason),
            reason,
        }
    })
}

/// Path of the first place where the schema wants an object and `value` has
/// an array.
fn positional_record(schema: &Value, value: &Value, path: &str) -> Option<String> {
    match schema.get("type").and_then(Value::as_str) {
        Some("object") => {
            if value.is_array() {
                return Some(if path.is_empty() { ".".into() } else { path.into() });
            }
            let props = schema.get("properties")?.as_object()?;
            props.iter().find_map(|(key, sub)| {
                let child = value.get(key)?;
                let child_path = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                positional_record(sub, child, &child_path)
            })
        }
        Some("array") => {
            let items = schema.get("items")?;
            value
                .as_array()?
                .iter()
                .enumerate()
                .find_map(|(i, item)| positional_record(items, item, &format!("{path}[{i}]")))
        }
        _ => None,
    }
}

/// Dotted field path for an error. A missing field is named itself rather
/// than by the record that lacks it.
fn field_of(path: &str, reason: &str) -> String {
    let path = path.trim_start_matches('.');
    let missing = reason
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next());
    match (path.is_empty(), missing) {
        (true, Some(name)) => name.to_string(),
        (false, Some(name)) => format!("{path}.{name}"),
        (true, None) => ".".to_string(),
        (false, None) => path.to_string(),
    }
}

/// Load and validate a JSON document.
pub async fn load<T: DeserializeOwned + JsonSchema>(path: &Path) -> Result<T, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    let document: Value = serde_json::from_str(&content).map_err(|e| StoreError::SchemaInvalid {
        path: path.to_path_buf(),
        field: ".".into(),
        reason: e.to_string(),
    })?;
    let value = validate(document).map_err(|v| StoreError::SchemaInvalid {
        path: path.to_path_buf(),
        field: v.field,
        reason: v.reason,
    })?;

    debug!(path = %path.display(), "Loaded state");
    Ok(value)
}

/// Persist `value` as pretty JSON. The file is replaced in one rename, so a
/// reader never sees a half-written document.
pub async fn save<T: Serialize>(value: &T, path: &Path) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        StoreError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json.as_bytes())
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::io(path, e))?;

    debug!(path = %path.display(), bytes = json.len(), "Saved state");
    Ok(())
}

/// Append one round to the transcript. The transcript is never rewritten.
pub async fn append_transcript(path: &Path, round: u32, text: &str) -> Result<(), StoreError> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| StoreError::io(path, e))?;

    let entry = format!("## Round {round}\n\n{text}\n\n");
    file.write_all(entry.as_bytes())
        .await
        .map_err(|e| StoreError::io(path, e))?;
    file.flush().await.map_err(|e| StoreError::io(path, e))?;
    Ok(())
}
