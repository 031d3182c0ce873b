//! Legacy snapshot migration.
//!
//! Old snapshots graded answers with a three-valued qualitative `rating`
//! (`developing`/`competent`/`strong`) and labelled the topic `category`.
//! Each step here is a pure function over raw JSON, so the chain is
//! unit-testable in isolation and idempotent: running it over already
//! normalized records is a no-op.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::{QuestionId, Response};

/// Fixed qualitative-to-numeric grade table, matched case-insensitively.
const RATING_TABLE: [(&str, f64); 3] = [("developing", 2.0), ("competent", 3.0), ("strong", 4.0)];

/// Resolves a numeric grade from a raw response record.
///
/// Order: a parseable numeric `grade` field wins; else the legacy `rating`
/// table; else `None` (ungraded, but the record is retained).
#[must_use]
pub fn extract_grade(record: &Value) -> Option<f64> {
    let obj = record.as_object()?;

    if let Some(grade) = obj.get("grade") {
        let numeric = match grade {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        if let Some(n) = numeric {
            if !n.is_nan() {
                return Some(n);
            }
        }
    }

    if let Some(rating) = obj.get("rating").and_then(Value::as_str) {
        let rating = rating.to_lowercase();
        return RATING_TABLE
            .iter()
            .find(|(name, _)| *name == rating)
            .map(|(_, grade)| *grade);
    }

    None
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Normalizes one raw record to the current response shape.
///
/// Returns `None` only for non-object entries. A record without a
/// `questionId` (or `id`, in the oldest shape) is still retained under an
/// empty id; migration never invents data, but it never drops an object
/// record either. The legacy `rating` field does not survive
/// normalization.
#[must_use]
pub fn normalize_record(record: &Value) -> Option<Response> {
    let obj = record.as_object()?;

    let question_id = str_field(obj, "questionId")
        .or_else(|| str_field(obj, "id"))
        .map_or_else(|| QuestionId::new(""), QuestionId::new);

    let timestamp = str_field(obj, "timestamp")
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|t| t.with_timezone(&Utc));

    Some(Response {
        question_id,
        grade: extract_grade(record),
        notes: str_field(obj, "notes").unwrap_or_default(),
        topic: str_field(obj, "topic").or_else(|| str_field(obj, "category")),
        difficulty: str_field(obj, "difficulty"),
        prompt: str_field(obj, "prompt"),
        timestamp,
    })
}

/// Upgrades a raw response array, discarding non-object entries.
#[must_use]
pub fn upgrade_responses(raw: &[Value]) -> Vec<Response> {
    raw.iter().filter_map(normalize_record).collect()
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_grade_wins_over_rating() {
        let record = json!({"questionId": "q1", "grade": 1, "rating": "strong"});
        assert_eq!(extract_grade(&record), Some(1.0));
    }

    #[test]
    fn string_grades_parse_numerically() {
        let record = json!({"questionId": "q1", "grade": "3"});
        assert_eq!(extract_grade(&record), Some(3.0));
    }

    #[test]
    fn rating_table_is_case_insensitive() {
        assert_eq!(extract_grade(&json!({"rating": "Strong"})), Some(4.0));
        assert_eq!(extract_grade(&json!({"rating": "COMPETENT"})), Some(3.0));
        assert_eq!(extract_grade(&json!({"rating": "developing"})), Some(2.0));
    }

    #[test]
    fn unknown_rating_yields_ungraded_but_retained() {
        let record = json!({"questionId": "q1", "rating": "unknown"});
        let response = normalize_record(&record).unwrap();
        assert_eq!(response.grade, None);
    }

    #[test]
    fn strong_rating_migrates_to_grade_four() {
        let record = json!({"id": "q1", "rating": "strong", "category": "Rust"});
        let response = normalize_record(&record).unwrap();
        assert_eq!(response.grade, Some(4.0));
        assert_eq!(response.topic.as_deref(), Some("Rust"));
        assert_eq!(response.question_id.as_str(), "q1");
    }

    #[test]
    fn topic_prefers_existing_topic_over_category() {
        let record = json!({"questionId": "q1", "topic": "T", "category": "C"});
        let response = normalize_record(&record).unwrap();
        assert_eq!(response.topic.as_deref(), Some("T"));
    }

    #[test]
    fn record_without_an_id_is_retained_under_an_empty_id() {
        let record = json!({"rating": "strong", "category": "Systems"});
        let response = normalize_record(&record).unwrap();
        assert_eq!(response.question_id.as_str(), "");
        assert_eq!(response.grade, Some(4.0));
        assert_eq!(response.topic.as_deref(), Some("Systems"));

        let upgraded = upgrade_responses(&[record]);
        assert_eq!(upgraded.len(), 1);
    }

    #[test]
    fn non_object_entries_are_discarded() {
        let raw = vec![json!(null), json!("junk"), json!(42), json!({"id": "q1"})];
        let upgraded = upgrade_responses(&raw);
        assert_eq!(upgraded.len(), 1);
    }

    #[test]
    fn upgrade_is_idempotent() {
        let raw = vec![
            json!({"id": "q1", "rating": "strong", "category": "A", "notes": "n"}),
            json!({"questionId": "q2", "grade": 2.5, "topic": "B"}),
            json!({"questionId": "q3", "rating": "unknown"}),
        ];

        let once = upgrade_responses(&raw);
        let reserialized: Vec<Value> = once
            .iter()
            .map(|r| serde_json::to_value(r).unwrap())
            .collect();
        let twice = upgrade_responses(&reserialized);

        assert_eq!(once, twice);
    }
}
