//! Parsing raw model output into an [`ActionResponse`].
//!
//! The model is asked to answer with a bare JSON object:
//!
//! ```json
//! {"code": "bot.dig(stone)", "memory": "player asked to mine stone"}
//! ```
//!
//! Models often wrap that object in a Markdown fence or a sentence of prose,
//! so parsing tries three candidates in order: the raw text, the body of a
//! leading code fence, and the outermost `{ ... }` span. The first candidate
//! that is valid JSON wins.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Why a model response could not be turned into an [`ActionResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// No JSON object could be found in the output.
    #[error("model response is not valid JSON: {0}")]
    MalformedResponse(String),

    /// Valid JSON, but the mandatory `code` field is absent or empty.
    #[error("model response has no \"code\" field")]
    MissingCode,
}

/// Parsed model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    /// Action script to run.
    pub code: String,
    /// Optional fact to remember.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

impl ActionResponse {
    /// Parse raw model output.
    ///
    /// # Errors
    ///
    /// [`ResponseError::MalformedResponse`] when no candidate is a JSON
    /// object or `code` is not a string, [`ResponseError::MissingCode`] when
    /// the object has no usable `code`.
    pub fn parse(raw: &str) -> Result<Self, ResponseError> {
        let object = extract_object(raw)?;

        let code = match object.get("code") {
            None | Some(Value::Null) => return Err(ResponseError::MissingCode),
            Some(Value::String(code)) if code.trim().is_empty() => {
                return Err(ResponseError::MissingCode);
            }
            Some(Value::String(code)) => code.clone(),
            Some(other) => {
                return Err(ResponseError::MalformedResponse(format!(
                    "\"code\" must be a string, got {}",
                    json_type(other)
                )));
            }
        };

        let memory = match object.get("memory") {
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Some(v.to_string()),
            _ => None,
        }
        .filter(|s| !s.is_empty());

        Ok(Self { code, memory })
    }
}

fn extract_object(raw: &str) -> Result<serde_json::Map<String, Value>, ResponseError> {
    let trimmed = raw.trim();

    let mut first_error = None;
    for candidate in candidates(trimmed) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(other) => {
                first_error.get_or_insert_with(|| {
                    format!("expected a JSON object, got {}", json_type(&other))
                });
            }
            Err(e) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    Err(ResponseError::MalformedResponse(
        first_error.unwrap_or_else(|| "empty response".to_string()),
    ))
}

fn candidates(text: &str) -> Vec<&str> {
    let mut out = Vec::with_capacity(3);
    if !text.is_empty() {
        out.push(text);
    }
    if let Some(body) = strip_code_fence(text) {
        out.push(body);
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            let span = &text[start..=end];
            if !out.contains(&span) {
                out.push(span);
            }
        }
    }
    out
}

/// Body of a Markdown fence such as ```` ```json\n{...}\n``` ````.
fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let body_start = rest.find('\n')? + 1;
    let body = &rest[body_start..];
    let body = body.trim_end().strip_suffix("```").unwrap_or(body);
    Some(body.trim())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
