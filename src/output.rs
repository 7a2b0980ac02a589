//! Output shaping for the CLI surface.
//!
//! CHANGELOG:
//! - 08/27/2026 - Initial implementation

use serde::Serialize;
use serde_json::{json, Value};

/// Output control settings from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct OutputControls {
    pub json: bool,
    pub compact: bool,
    pub fields: Option<String>,
    pub max_text_chars: Option<u32>,
}

impl OutputControls {
    /// Render data according to the controls.
    pub fn emit<T: Serialize>(&self, data: &T) -> String {
        let value = serde_json::to_value(data).unwrap_or(json!(null));

        let shaped = match &self.fields {
            Some(fields) => filter_fields(&value, fields),
            None => value,
        };
        let shaped = match self.max_text_chars {
            Some(max) => truncate_text_fields(&shaped, max as usize),
            None => shaped,
        };

        if self.compact {
            serde_json::to_string(&shaped).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string_pretty(&shaped).unwrap_or_else(|_| "{}".to_string())
        }
    }

    /// Print data to stdout according to the controls.
    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", self.emit(data));
    }
}

/// Keep only the named comma-separated fields of each object.
fn filter_fields(value: &Value, fields: &str) -> Value {
    match value {
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| filter_fields(v, fields)).collect())
        }
        Value::Object(map) => {
            let mut kept = serde_json::Map::new();
            for field in fields.split(',').map(str::trim) {
                if let Some(v) = map.get(field) {
                    kept.insert(field.to_string(), v.clone());
                }
            }
            Value::Object(kept)
        }
        _ => value.clone(),
    }
}

/// Truncate every string field to at most `max_chars` characters.
fn truncate_text_fields(value: &Value, max_chars: usize) -> Value {
    match value {
        Value::String(s) if s.chars().count() > max_chars => {
            let cut: String = s.chars().take(max_chars).collect();
            Value::String(format!("{cut}..."))
        }
        Value::Array(items) => Value::Array(
            items.iter().map(|v| truncate_text_fields(v, max_chars)).collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), truncate_text_fields(v, max_chars)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Format an error as a JSON object for machine consumers.
pub fn format_error(error: &str) -> String {
    serde_json::to_string(&json!({
        "error": error,
        "success": false,
    }))
    .unwrap_or_else(|_| format!(r#"{{"error":"{error}"}}"#))
}
