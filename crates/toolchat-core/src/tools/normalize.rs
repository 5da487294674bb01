//! Conversion of tool return values into the text the LLM accepts

use serde_json::Value;

use super::provider::ProviderOutput;

/// Result text used when a tool returns nothing
pub const EMPTY_RESULT_PLACEHOLDER: &str = "The operation completed but didn't return any results.";

/// Normalize a local tool's return value to text
///
/// - null, `""`, `[]` and `{}` become [`EMPTY_RESULT_PLACEHOLDER`]
/// - arrays are joined with `", "`; string elements are not quoted
/// - objects are pretty-printed JSON
/// - everything else uses its plain representation
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::Null => EMPTY_RESULT_PLACEHOLDER.to_string(),
        Value::String(s) if s.is_empty() => EMPTY_RESULT_PLACEHOLDER.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.is_empty() => EMPTY_RESULT_PLACEHOLDER.to_string(),
        Value::Array(items) => items.iter().map(element_text).collect::<Vec<_>>().join(", "),
        Value::Object(map) if map.is_empty() => EMPTY_RESULT_PLACEHOLDER.to_string(),
        Value::Object(_) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
    }
}

fn element_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalize a provider result: text items joined by newlines
pub fn normalize_provider_output(output: &ProviderOutput) -> String {
    let texts: Vec<&str> = output
        .texts
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .collect();

    if texts.is_empty() {
        EMPTY_RESULT_PLACEHOLDER.to_string()
    } else {
        texts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_values_use_placeholder() {
        for value in [json!(null), json!(""), json!([]), json!({})] {
            assert_eq!(normalize_value(&value), EMPTY_RESULT_PLACEHOLDER);
        }
    }

    #[test]
    fn test_array_is_comma_joined() {
        let ids = json!(["2401.00001v1", "2401.00002v2"]);
        assert_eq!(normalize_value(&ids), "2401.00001v1, 2401.00002v2");

        let mixed = json!(["a", 1, true, {"k": "v"}]);
        assert_eq!(normalize_value(&mixed), r#"a, 1, true, {"k":"v"}"#);
    }

    #[test]
    fn test_object_is_pretty_printed() {
        let text = normalize_value(&json!({ "title": "Attention" }));
        assert_eq!(text, "{\n  \"title\": \"Attention\"\n}");
    }

    #[test]
    fn test_scalars_use_plain_text() {
        assert_eq!(normalize_value(&json!("plain")), "plain");
        assert_eq!(normalize_value(&json!(42)), "42");
        assert_eq!(normalize_value(&json!(false)), "false");
    }

    #[test]
    fn test_provider_output_joins_text_items() {
        let output = ProviderOutput {
            texts: vec!["first".into(), String::new(), "second".into()],
            is_error: false,
        };
        assert_eq!(normalize_provider_output(&output), "first\nsecond");
        assert_eq!(
            normalize_provider_output(&ProviderOutput::default()),
            EMPTY_RESULT_PLACEHOLDER
        );
    }
}
