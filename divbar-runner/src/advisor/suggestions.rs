//! Lenient parsing of model replies into suggestion records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One proposed rule modification. Free text, never executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub change: String,
    pub rationale: String,
    pub implementation_hint: String,
}

/// Parse a JSON array of suggestion objects.
///
/// Non-object entries and entries with an empty `change` are skipped; fields
/// are trimmed and missing ones become empty strings. Anything that is not a
/// JSON array yields an empty list.
pub fn parse_suggestions(raw: &str) -> Vec<Suggestion> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw.trim()) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            let field = |key: &str| match obj.get(key) {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string().trim().to_string(),
            };
            let change = field("change");
            if change.is_empty() {
                return None;
            }
            Some(Suggestion {
                change,
                rationale: field("rationale"),
                implementation_hint: field("implementation_hint"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_trims() {
        let raw = r#"[
            {"change": "  Add ATR floor ", "rationale": " avoid chop ", "implementation_hint": "x"},
            {"change": "", "rationale": "dropped"},
            {"rationale": "no change key"},
            42,
            {"change": "Tighten buffer"}
        ]"#;
        let out = parse_suggestions(raw);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].change, "Add ATR floor");
        assert_eq!(out[0].rationale, "avoid chop");
        assert_eq!(out[1].change, "Tighten buffer");
        assert_eq!(out[1].rationale, "");
    }

    #[test]
    fn whitespace_only_change_is_dropped() {
        assert!(parse_suggestions(r#"[{"change": "   "}]"#).is_empty());
    }

    #[test]
    fn non_array_is_empty() {
        assert!(parse_suggestions(r#"{"change": "x"}"#).is_empty());
        assert!(parse_suggestions("not json").is_empty());
        assert!(parse_suggestions("").is_empty());
    }
}
