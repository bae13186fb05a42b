use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of the streaming chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub username: String,
}

/// One decoded wire record.
///
/// A single JSON object may carry both `message` and `error`; it then decodes
/// to a `Content` followed by an `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    Content(String),
    Error(String),
    Unrecognized,
}

impl WireEvent {
    /// Decode one complete, non-blank line.
    ///
    /// Only invalid JSON is an error. Valid JSON that is not an object, or an
    /// object without usable fields, yields `Unrecognized`.
    pub fn decode_line(line: &str) -> Result<Vec<WireEvent>, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        let Value::Object(record) = value else {
            return Ok(vec![WireEvent::Unrecognized]);
        };

        let mut events = Vec::with_capacity(1);
        if let Some(text) = record
            .get("message")
            .filter(|value| is_truthy(value))
            .and_then(message_text)
        {
            events.push(WireEvent::Content(text));
        }
        if let Some(error) = record.get("error").filter(|value| is_truthy(value)) {
            events.push(WireEvent::Error(error_text(error)));
        }

        if events.is_empty() {
            events.push(WireEvent::Unrecognized);
        }
        Ok(events)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text appended for a truthy `message`. Arrays and objects carry no text.
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn error_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
