//! Turning untrusted model replies into a validated `AiInsight`
//!
//! Each stage returns an explicit result: locate candidate object spans,
//! parse strictly, repair once, parse again, then check the schema.

use crate::error::InsightError;
use crate::model::AiInsight;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Greedy first-`{`-to-last-`}` span, kept as the last resort.
fn greedy_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

/// Parse a raw provider reply into an insight.
pub fn parse_insight(reply: Option<&str>) -> Result<AiInsight, InsightError> {
    let text = reply
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(InsightError::EmptyResponse)?;

    let candidates = extract_candidates(text);
    if candidates.is_empty() {
        return Err(InsightError::MalformedInsight {
            raw: text.to_string(),
            detail: "no JSON object found in response".to_string(),
        });
    }

    let mut schema_error = None;
    let mut parse_error = None;
    for candidate in candidates {
        match parse_with_repair(candidate) {
            Ok(value) => match validate_insight(value) {
                Ok(insight) => return Ok(insight),
                Err(err) => {
                    schema_error.get_or_insert(err);
                }
            },
            Err(err) => {
                parse_error.get_or_insert(err);
            }
        }
    }

    if let Some(err) = schema_error {
        return Err(err);
    }
    Err(InsightError::MalformedInsight {
        raw: text.to_string(),
        detail: parse_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown parse error".to_string()),
    })
}

/// Object spans in the order they should be tried: every balanced
/// top-level object first, then the greedy span if it differs. A `{` that
/// never closes is skipped and the scan resumes after it.
pub(crate) fn extract_candidates(text: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    let mut search_from = 0usize;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        match balanced_object_end(text, start) {
            Some(end) => {
                out.push(&text[start..end]);
                search_from = end;
            }
            None => search_from = start + 1,
        }
    }

    if let Some(greedy) = greedy_object_regex().find(text) {
        let span = greedy.as_str();
        if !out.contains(&span) {
            out.push(span);
        }
    }

    out
}

/// Byte index just past the `}` closing the object opened at `start`.
/// Braces inside string literals are ignored.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn parse_strict(candidate: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(candidate)
}

/// Strict parse, then at most one repaired retry.
fn parse_with_repair(candidate: &str) -> Result<Value, serde_json::Error> {
    match parse_strict(candidate) {
        Ok(value) => Ok(value),
        Err(strict_err) => match repair_json(candidate) {
            Some(repaired) => parse_strict(&repaired),
            None => Err(strict_err),
        },
    }
}

/// Whitespace repair for replies that break strings across lines.
///
/// Inside string literals, a line break plus the indentation around it
/// collapses to one space and other control characters become spaces.
/// Outside strings, a trailing comma before `}` or `]` is dropped.
/// Returns `None` when nothing needed changing.
pub(crate) fn repair_json(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut collapsing = false;
    let mut changed = false;

    for ch in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(ch);
                continue;
            }
            match ch {
                '\n' | '\r' => {
                    while out.ends_with(' ') || out.ends_with('\t') {
                        out.pop();
                    }
                    if !collapsing {
                        out.push(' ');
                    }
                    collapsing = true;
                    changed = true;
                }
                ' ' | '\t' if collapsing => {
                    changed = true;
                }
                c if c.is_control() => {
                    out.push(' ');
                    collapsing = false;
                    changed = true;
                }
                '\\' => {
                    escaped = true;
                    collapsing = false;
                    out.push(ch);
                }
                '"' => {
                    in_string = false;
                    collapsing = false;
                    out.push(ch);
                }
                _ => {
                    collapsing = false;
                    out.push(ch);
                }
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '}' | ']' => {
                let kept = out.trim_end_matches(char::is_whitespace).len();
                if out[..kept].ends_with(',') {
                    out.remove(kept - 1);
                    changed = true;
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    changed.then_some(out)
}

/// The parsed value must be an object with exactly the insight keys.
pub(crate) fn validate_insight(value: Value) -> Result<AiInsight, InsightError> {
    if !value.is_object() {
        return Err(InsightError::SchemaViolation(format!(
            "expected a JSON object, got {}",
            json_type_name(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| InsightError::SchemaViolation(e.to_string()))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"executive_summary":"...","risk_explanation":"...","improvement_suggestions":["a","b"]}"#;

    #[test]
    fn test_prose_wrapped_reply() {
        let reply = format!("Sure, here is the JSON:\n{}", VALID);
        let insight = parse_insight(Some(&reply)).unwrap();
        assert_eq!(insight.executive_summary, "...");
        assert_eq!(insight.risk_explanation, "...");
        assert_eq!(insight.improvement_suggestions, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_reply() {
        assert_eq!(parse_insight(None), Err(InsightError::EmptyResponse));
        assert_eq!(parse_insight(Some("")), Err(InsightError::EmptyResponse));
        assert_eq!(parse_insight(Some("  \n ")), Err(InsightError::EmptyResponse));
    }

    #[test]
    fn test_no_object_is_malformed() {
        let err = parse_insight(Some("I cannot help with that.")).unwrap_err();
        match err {
            InsightError::MalformedInsight { raw, detail } => {
                assert_eq!(raw, "I cannot help with that.");
                assert!(detail.contains("no JSON object"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_markdown_fenced_reply() {
        let reply = format!("```json\n{}\n```", VALID);
        assert!(parse_insight(Some(&reply)).is_ok());
    }

    #[test]
    fn test_braces_inside_strings_do_not_break_extraction() {
        let reply = r#"{"executive_summary":"uses {braces}","risk_explanation":"}","improvement_suggestions":[]}"#;
        let insight = parse_insight(Some(reply)).unwrap();
        assert_eq!(insight.executive_summary, "uses {braces}");
        assert_eq!(insight.risk_explanation, "}");
    }

    #[test]
    fn test_unrelated_brace_pair_before_object() {
        let reply = format!("Template {{placeholder}} follows.\n{}\nDone {{ok}}", VALID);
        let insight = parse_insight(Some(&reply)).unwrap();
        assert_eq!(insight.improvement_suggestions.len(), 2);
    }

    #[test]
    fn test_newlines_inside_strings_are_repaired() {
        let reply = "{\"executive_summary\": \"Tests fail\n    in the login module\",\n \"risk_explanation\": \"High\",\n \"improvement_suggestions\": [\"Fix\n the test\"]}";
        assert!(parse_strict(reply).is_err());
        let insight = parse_insight(Some(reply)).unwrap();
        assert_eq!(insight.executive_summary, "Tests fail in the login module");
        assert_eq!(insight.improvement_suggestions, vec!["Fix the test"]);
    }

    #[test]
    fn test_trailing_commas_are_repaired() {
        let reply = r#"{"executive_summary":"a","risk_explanation":"b","improvement_suggestions":["c",],}"#;
        let insight = parse_insight(Some(reply)).unwrap();
        assert_eq!(insight.improvement_suggestions, vec!["c"]);
    }

    #[test]
    fn test_unrepairable_reply_is_malformed() {
        let reply = r#"{"executive_summary": 'single quotes', "risk_explanation": "b"}"#;
        let err = parse_insight(Some(reply)).unwrap_err();
        match err {
            InsightError::MalformedInsight { raw, detail } => {
                assert_eq!(raw, reply);
                assert!(!detail.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_key_is_schema_violation() {
        let reply = r#"{"executive_summary":"a","risk_explanation":"b"}"#;
        assert_eq!(parse_insight(Some(reply)).unwrap_err().kind(), "SchemaViolation");
    }

    #[test]
    fn test_extra_key_is_schema_violation() {
        let reply = r#"{"executive_summary":"a","risk_explanation":"b","improvement_suggestions":[],"overall_status":"PASS"}"#;
        assert_eq!(parse_insight(Some(reply)).unwrap_err().kind(), "SchemaViolation");
    }

    #[test]
    fn test_mistyped_key_is_schema_violation() {
        let reply = r#"{"executive_summary":"a","risk_explanation":"b","improvement_suggestions":"c"}"#;
        assert_eq!(parse_insight(Some(reply)).unwrap_err().kind(), "SchemaViolation");
    }

    #[test]
    fn test_non_object_value_is_schema_violation() {
        let err = validate_insight(serde_json::json!(["a"])).unwrap_err();
        assert_eq!(
            err,
            InsightError::SchemaViolation("expected a JSON object, got an array".to_string())
        );
    }

    #[test]
    fn test_extract_candidates_order() {
        let text = "a {\"x\":1} b {\"y\":2} c";
        assert_eq!(
            extract_candidates(text),
            vec!["{\"x\":1}", "{\"y\":2}", "{\"x\":1} b {\"y\":2}"]
        );
    }

    #[test]
    fn test_unbalanced_reply_falls_back_to_greedy_span() {
        let text = "prefix {\"x\": \"open} suffix";
        assert_eq!(extract_candidates(text), vec!["{\"x\": \"open}"]);
    }

    #[test]
    fn test_unclosed_brace_in_prose_is_skipped() {
        let reply = format!("Note: the set {{ is unclosed in my reasoning.\n{}", VALID);
        let insight = parse_insight(Some(&reply)).unwrap();
        assert_eq!(insight.improvement_suggestions, vec!["a", "b"]);
        assert_eq!(extract_candidates(&reply)[0], VALID);
    }

    #[test]
    fn test_many_unrelated_brace_pairs_before_object() {
        let reply = format!("Fields {{a}} {{b}} {{c}} {{d}} then:\n{}", VALID);
        let insight = parse_insight(Some(&reply)).unwrap();
        assert_eq!(insight.executive_summary, "...");
    }

    #[test]
    fn test_repair_leaves_valid_json_alone() {
        assert_eq!(repair_json(VALID), None);
    }
}
