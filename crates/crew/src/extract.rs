//! Structured-output extraction.
//!
//! Models do not always honor a JSON response format, so the value is looked
//! for in order: the executor's structured channel, the first balanced
//! `{...}` block in the raw text, then the whole text. The first strategy that
//! yields a JSON object wins.

use crate::task::TaskOutput;
use agentquest_core::error::GenerationFailure;
use serde_json::Value;

/// One way of pulling a JSON object out of a task output.
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Err` carries the reason this strategy gave up.
    fn extract(&self, output: &TaskOutput) -> Result<Value, String>;
}

/// The value the executor already parsed, if any.
pub struct StructuredChannel;

impl Extractor for StructuredChannel {
    fn name(&self) -> &'static str {
        "structured output"
    }

    fn extract(&self, output: &TaskOutput) -> Result<Value, String> {
        match &output.structured {
            Some(value) if value.is_object() => Ok(value.clone()),
            Some(_) => Err("not a JSON object".into()),
            None => Err("none provided".into()),
        }
    }
}

/// The first balanced `{...}` block in the raw text that parses as JSON.
pub struct BracketScan;

impl Extractor for BracketScan {
    fn name(&self) -> &'static str {
        "bracket scan"
    }

    fn extract(&self, output: &TaskOutput) -> Result<Value, String> {
        let text = output.raw.as_str();
        let mut last_error = "no '{' found".to_string();

        for (start, _) in text.match_indices('{') {
            let Some(len) = balanced_len(&text[start..]) else {
                last_error = "unbalanced braces".into();
                continue;
            };
            match serde_json::from_str::<Value>(&text[start..start + len]) {
                Ok(value) if value.is_object() => return Ok(value),
                Ok(_) => last_error = "not a JSON object".into(),
                Err(e) => last_error = e.to_string(),
            }
        }
        Err(last_error)
    }
}

/// Byte length of the brace-balanced block at the start of `s`, skipping
/// braces inside JSON strings.
fn balanced_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// The raw text as a whole.
pub struct WholeText;

impl Extractor for WholeText {
    fn name(&self) -> &'static str {
        "whole text"
    }

    fn extract(&self, output: &TaskOutput) -> Result<Value, String> {
        match serde_json::from_str::<Value>(output.raw.trim()) {
            Ok(value) if value.is_object() => Ok(value),
            Ok(_) => Err("not a JSON object".into()),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// An ordered chain of extractors.
pub struct ExtractorChain {
    strategies: Vec<Box<dyn Extractor>>,
}

impl Default for ExtractorChain {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(StructuredChannel),
                Box::new(BracketScan),
                Box::new(WholeText),
            ],
        }
    }
}

impl ExtractorChain {
    /// Stop at the first success; otherwise a parse failure listing every
    /// strategy's reason.
    pub fn extract(&self, output: &TaskOutput) -> Result<Value, GenerationFailure> {
        let mut reasons = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            match strategy.extract(output) {
                Ok(value) => return Ok(value),
                Err(reason) => reasons.push(format!("{}: {reason}", strategy.name())),
            }
        }
        Err(GenerationFailure::Parse(reasons.join("; ")))
    }
}
