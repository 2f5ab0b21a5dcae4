//! Payload parsing and candidate-term extraction.
//!
//! The monitored endpoint prefixes its JSON body with a non-JSON guard
//! sequence and does not keep a stable shape across versions, so extraction
//! is a schema-tolerant walk over the decoded tree rather than a typed
//! deserialization.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON start marker in response body")]
    NoJsonStart,

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// A trending term that crossed the significance rule, before staging.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTerm {
    pub text: String,
    pub score: f64,
    pub is_breakout: bool,
    pub source_tag: String,
}

/// Alias keys, threshold and marker words live here rather than as literals
/// so payload-shape drift stays a config change.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    pub term_keys: Vec<String>,
    pub magnitude_keys: Vec<String>,
    pub significance_threshold: f64,
    pub breakout_markers: Vec<String>,
    pub source_tag: String,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            term_keys: vec![
                "query".to_string(),
                "term".to_string(),
                "keyword".to_string(),
                "name".to_string(),
            ],
            magnitude_keys: vec![
                "value".to_string(),
                "percent".to_string(),
                "score".to_string(),
            ],
            significance_threshold: 300.0,
            breakout_markers: vec!["breakout".to_string(), "surge".to_string()],
            source_tag: "extension-observed".to_string(),
        }
    }
}

/// Drop everything before the first JSON start marker.
pub fn strip_preamble(raw: &str) -> Result<&str, ParseError> {
    raw.find(['{', '['])
        .map(|idx| &raw[idx..])
        .ok_or(ParseError::NoJsonStart)
}

/// Extract candidate terms from a raw response body.
///
/// Pure: the same payload and rules always yield the same candidate list.
pub fn extract_terms(raw: &str, rules: &ExtractionRules) -> Result<Vec<CandidateTerm>, ParseError> {
    let payload = strip_preamble(raw)?;
    let tree: Value = serde_json::from_str(payload)?;

    let mut candidates = Vec::new();
    walk(&tree, rules, &mut candidates);
    Ok(candidates)
}

fn walk(value: &Value, rules: &ExtractionRules, out: &mut Vec<CandidateTerm>) {
    match value {
        Value::Object(map) => {
            if let Some(candidate) = candidate_from_object(map, rules) {
                out.push(candidate);
            }
            for child in map.values() {
                walk(child, rules, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                walk(child, rules, out);
            }
        }
        _ => {}
    }
}

fn candidate_from_object(
    map: &serde_json::Map<String, Value>,
    rules: &ExtractionRules,
) -> Option<CandidateTerm> {
    let text_raw = rules
        .term_keys
        .iter()
        .find_map(|key| map.get(key).and_then(Value::as_str))?;

    let magnitude = rules
        .magnitude_keys
        .iter()
        .find_map(|key| map.get(key).and_then(magnitude_of))?;

    let is_breakout = has_breakout_marker(map, rules);

    if magnitude < rules.significance_threshold && !is_breakout {
        return None;
    }

    let text = normalize_term(text_raw, &rules.breakout_markers)?;

    Some(CandidateTerm {
        text,
        score: magnitude.max(0.0),
        is_breakout,
        source_tag: rules.source_tag.clone(),
    })
}

/// Magnitude fields arrive either as numbers or display strings like
/// "+1,900%".
fn magnitude_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = s
                .trim()
                .trim_start_matches('+')
                .trim_end_matches('%')
                .replace(',', "");
            cleaned.parse().ok()
        }
        _ => None,
    }
}

/// A breakout/surge marker anywhere in the sibling text lifts a candidate
/// past the numeric threshold.
fn has_breakout_marker(map: &serde_json::Map<String, Value>, rules: &ExtractionRules) -> bool {
    map.values().any(|value| {
        value.as_str().is_some_and(|s| {
            let lowered = s.to_lowercase();
            rules.breakout_markers.iter().any(|m| lowered.contains(m))
        })
    })
}

/// Trim, collapse internal whitespace, strip a leading digit run and known
/// surge label words. Returns None when fewer than 2 characters survive.
fn normalize_term(raw: &str, markers: &[String]) -> Option<String> {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let ws = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"));

    let collapsed = ws.replace_all(raw.trim(), " ");
    let stripped = collapsed
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start();

    let text = stripped
        .split(' ')
        .filter(|word| !markers.iter().any(|m| word.eq_ignore_ascii_case(m)))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();

    (text.chars().count() >= 2).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ExtractionRules {
        ExtractionRules::default()
    }

    #[test]
    fn strips_guard_preamble_before_first_brace() {
        let body = ")]}'\n{\"default\":{}}";
        assert_eq!(strip_preamble(body).unwrap(), "{\"default\":{}}");
    }

    #[test]
    fn missing_json_start_is_a_parse_error() {
        assert!(matches!(
            strip_preamble("plain text only"),
            Err(ParseError::NoJsonStart)
        ));
    }

    #[test]
    fn extracts_ranked_keywords_above_threshold() {
        let body = r#")]}'
        {"default":{"rankedList":[{"rankedKeyword":[
            {"query":"solar eclipse","value":450},
            {"query":"weather","value":120}
        ]}]}}"#;

        let terms = extract_terms(body, &rules()).unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].text, "solar eclipse");
        assert!((terms[0].score - 450.0).abs() < f64::EPSILON);
        assert!(!terms[0].is_breakout);
        assert_eq!(terms[0].source_tag, "extension-observed");
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let body = r#"{"items":[
            {"term":"at the line","value":300},
            {"term":"just below","value":299.99}
        ]}"#;

        let terms = extract_terms(body, &rules()).unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].text, "at the line");
    }

    #[test]
    fn breakout_marker_overrides_low_magnitude() {
        let body = r#"{"related":[
            {"query":"meteor shower tonight","value":40,"formattedValue":"Breakout"}
        ]}"#;

        let terms = extract_terms(body, &rules()).unwrap();
        assert_eq!(terms.len(), 1);
        assert!(terms[0].is_breakout);
        assert_eq!(terms[0].text, "meteor shower tonight");
    }

    #[test]
    fn walks_arbitrary_nesting_depth() {
        let body = r#"{"a":{"b":[{"c":{"d":[{"query":"deep term","percent":"+1,900%"}]}}]}}"#;

        let terms = extract_terms(body, &rules()).unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].text, "deep term");
        assert!((terms[0].score - 1900.0).abs() < f64::EPSILON);
    }

    #[test]
    fn extraction_is_idempotent() {
        let body = r#"{"items":[{"query":"repeat me","value":512}]}"#;
        let first = extract_terms(body, &rules()).unwrap();
        let second = extract_terms(body, &rules()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn normalization_cleans_term_text() {
        assert_eq!(
            normalize_term("  42  solar   Breakout  eclipse ", &rules().breakout_markers),
            Some("solar eclipse".to_string())
        );
    }

    #[test]
    fn normalization_rejects_short_leftovers() {
        assert_eq!(normalize_term("7", &rules().breakout_markers), None);
        assert_eq!(normalize_term("  x ", &rules().breakout_markers), None);
    }

    #[test]
    fn garbage_payload_yields_invalid_json() {
        assert!(matches!(
            extract_terms("junk {not json", &rules()),
            Err(ParseError::InvalidJson(_))
        ));
    }
}
