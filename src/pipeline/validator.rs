//! Input validation for assistance requests.
//!
//! Pure function from a raw JSON body to either a normalized
//! [`AssistanceRequest`] or the full list of field violations. Each field
//! is checked independently: text, then trim, then non-empty, then length.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum context length in characters, after trimming.
pub const CONTEXT_MAX_CHARS: usize = 10_000;

/// Maximum question length in characters, after trimming.
pub const QUESTION_MAX_CHARS: usize = 1_000;

/// A validated, trimmed client query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistanceRequest {
    pub context: String,
    pub question: String,
}

/// The rule a field violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Value is missing or not a string.
    IsString,
    /// Value is empty after trimming.
    NotEmpty,
    /// Value is longer than the field maximum after trimming.
    MaxLength,
    /// Body is not a JSON document.
    Json,
}

/// One field-level violation, reported to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub rule: Rule,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, rule: Rule, message: String) -> Self {
        Self { field, rule, message }
    }

    /// Violation for a body that could not be read or parsed.
    pub fn malformed_body(reason: impl std::fmt::Display) -> Self {
        Self::new("body", Rule::Json, format!("request body must be a JSON object: {}", reason))
    }
}

/// Validate a raw request body.
///
/// Missing fields and non-object bodies are reported as `is_string`
/// violations, never as a parse failure.
pub fn validate(body: &Value) -> Result<AssistanceRequest, Vec<Violation>> {
    let mut violations = Vec::new();

    let context = check_text("context", body.get("context"), CONTEXT_MAX_CHARS, &mut violations);
    let question = check_text("question", body.get("question"), QUESTION_MAX_CHARS, &mut violations);

    match (context, question) {
        (Some(context), Some(question)) => Ok(AssistanceRequest { context, question }),
        _ => Err(violations),
    }
}

fn check_text(
    field: &'static str,
    raw: Option<&Value>,
    max_chars: usize,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    let Some(text) = raw.and_then(Value::as_str) else {
        violations.push(Violation::new(field, Rule::IsString, format!("{} must be a string", field)));
        return None;
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        violations.push(Violation::new(field, Rule::NotEmpty, format!("{} must not be empty", field)));
        return None;
    }

    let len = trimmed.chars().count();
    if len > max_chars {
        violations.push(Violation::new(
            field,
            Rule::MaxLength,
            format!("{} must be at most {} characters (got {})", field, max_chars, len),
        ));
        return None;
    }

    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(context: &str, question: &str) -> Value {
        json!({ "context": context, "question": question })
    }

    #[test]
    fn test_valid_request_is_trimmed() {
        let request = validate(&body("  Photoshop layers panel \n", "\tHow do I create a new layer? ")).unwrap();
        assert_eq!(request.context, "Photoshop layers panel");
        assert_eq!(request.question, "How do I create a new layer?");
    }

    #[test]
    fn test_context_length_boundary() {
        assert!(validate(&body(&"a".repeat(CONTEXT_MAX_CHARS), "q")).is_ok());

        let violations = validate(&body(&"a".repeat(CONTEXT_MAX_CHARS + 1), "q")).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "context");
        assert_eq!(violations[0].rule, Rule::MaxLength);
    }

    #[test]
    fn test_question_length_boundary() {
        assert!(validate(&body("c", &"a".repeat(QUESTION_MAX_CHARS))).is_ok());

        let violations = validate(&body("c", &"a".repeat(QUESTION_MAX_CHARS + 1))).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "question");
        assert_eq!(violations[0].rule, Rule::MaxLength);
    }

    #[test]
    fn test_length_counts_after_trim() {
        let padded = format!("   {}   ", "a".repeat(QUESTION_MAX_CHARS));
        assert!(validate(&body("c", &padded)).is_ok());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let accented = "é".repeat(QUESTION_MAX_CHARS);
        assert!(validate(&body("c", &accented)).is_ok());
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let violations = validate(&body("context", "   ")).unwrap_err();
        assert_eq!(
            violations,
            vec![Violation {
                field: "question",
                rule: Rule::NotEmpty,
                message: "question must not be empty".into(),
            }]
        );
    }

    #[test]
    fn test_collects_violations_for_both_fields() {
        let violations = validate(&json!({})).unwrap_err();
        let fields: Vec<_> = violations.iter().map(|v| (v.field, v.rule)).collect();
        assert_eq!(fields, vec![("context", Rule::IsString), ("question", Rule::IsString)]);
    }

    #[test]
    fn test_non_string_values_rejected() {
        let violations = validate(&json!({ "context": 42, "question": ["a"] })).unwrap_err();
        assert!(violations.iter().all(|v| v.rule == Rule::IsString));
        assert_eq!(violations.len(), 2);

        let violations = validate(&json!({ "context": null, "question": "ok" })).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "context");
    }

    #[test]
    fn test_non_object_body() {
        let violations = validate(&json!("just a string")).unwrap_err();
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let input = json!({ "context": "", "question": "b".repeat(1_001) });
        let first = validate(&input).unwrap_err();
        let second = validate(&input).unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn test_violation_serialization() {
        let violation = Violation::new("question", Rule::NotEmpty, "question must not be empty".into());
        assert_eq!(
            serde_json::to_value(&violation).unwrap(),
            json!({ "field": "question", "rule": "not_empty", "message": "question must not be empty" })
        );
    }
}
