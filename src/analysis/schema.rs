use schemars::schema_for;
use serde_json::Value;

use super::models::ModelOutput;

/// JSON schema the generation client sends alongside the prompt so the
/// backing model constrains its output shape. The validator re-checks
/// everything regardless; the schema only improves first-attempt odds.
pub fn model_output_schema() -> Value {
    serde_json::to_value(schema_for!(ModelOutput)).unwrap_or_else(|_| Value::Object(Default::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_declares_the_students_array() {
        let schema = model_output_schema();
        assert!(schema["properties"]["students"].is_object());
    }

    #[test]
    fn schema_constrains_the_enums() {
        let rendered = model_output_schema().to_string();
        for value in ["critical", "high", "medium", "low", "conceptual", "procedural", "careless"] {
            assert!(rendered.contains(value), "schema is missing enum value {}", value);
        }
    }
}
