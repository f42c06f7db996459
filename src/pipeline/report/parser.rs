use serde_json::{Map, Value};

use super::SchemaViolation;

/// Parse the collaborator's raw text into a JSON object.
///
/// Accepts a bare object, an object inside a ```json fence, or an object
/// surrounded by prose (first `{` through last `}`).
pub fn parse_reasoning_response(response: &str) -> Result<Map<String, Value>, SchemaViolation> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(SchemaViolation::MalformedJson("empty response".into()));
    }

    let candidate = fenced_json(trimmed)
        .or_else(|| outer_braces(trimmed))
        .unwrap_or(trimmed);

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(SchemaViolation::MalformedJson(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(SchemaViolation::MalformedJson(e.to_string())),
    }
}

/// Content of the first ```json fenced block.
fn fenced_json(response: &str) -> Option<&str> {
    let start = response.find("```json")? + 7;
    let end = response[start..].find("```")?;
    Some(response[start..start + end].trim())
}

fn outer_braces(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
