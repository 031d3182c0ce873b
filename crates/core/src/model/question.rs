use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when constructing a grade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GradeError {
    #[error("invalid grade value: {0} (expected 0-4)")]
    InvalidGrade(u8),
}

//
// ─── QUESTION ID ──────────────────────────────────────────────────────────────
//

/// Unique identifier for a question within a catalog.
///
/// Identifiers are opaque strings supplied by the question catalog; the
/// engine never interprets them beyond equality.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

//
// ─── GRADE ────────────────────────────────────────────────────────────────────
//

/// Five-level grade assigned to a respondent's answer.
///
/// Grades drive branching: each question's follow-up map is keyed by the
/// string form of the grade that was just given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grade(u8);

impl Grade {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 4;

    /// Converts a numeric value (0-4) to a `Grade`.
    ///
    /// # Errors
    ///
    /// Returns `GradeError::InvalidGrade` if the value is out of range.
    pub fn from_u8(value: u8) -> Result<Self, GradeError> {
        if value > Self::MAX {
            return Err(GradeError::InvalidGrade(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Returns the string key used in follow-up maps.
    #[must_use]
    pub fn key(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Follow-up map key used when no exact grade key matches.
pub(crate) const DEFAULT_FOLLOW_UP: &str = "default";

/// A single question record, immutable and externally supplied.
///
/// `prompt` and `difficulty` are opaque to the engine; `category` is the
/// grouping key for topic filtering and per-topic metrics. `follow_ups`
/// maps the string form of a grade to the next question id, with an
/// optional `default` fallback. A question with neither an exact match nor
/// a default for the given grade is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub follow_ups: BTreeMap<String, QuestionId>,
    /// Rubric text per grade, display-only.
    #[serde(default)]
    pub score_descriptors: BTreeMap<String, String>,
}

impl Question {
    /// Resolves the follow-up for the given grade.
    ///
    /// Exact grade key first, then the `default` key, then `None`
    /// (terminal).
    #[must_use]
    pub fn follow_up(&self, grade: Grade) -> Option<&QuestionId> {
        self.follow_ups
            .get(&grade.key())
            .or_else(|| self.follow_ups.get(DEFAULT_FOLLOW_UP))
    }

    /// Score descriptors with numeric keys, sorted highest grade first.
    ///
    /// Entries whose key does not parse as an integer are skipped.
    #[must_use]
    pub fn descriptors_desc(&self) -> Vec<(u8, &str)> {
        let mut entries: Vec<(u8, &str)> = self
            .score_descriptors
            .iter()
            .filter_map(|(key, text)| key.parse::<u8>().ok().map(|g| (g, text.as_str())))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn question_with_follow_ups(pairs: &[(&str, &str)]) -> Question {
        Question {
            id: QuestionId::new("q1"),
            prompt: "Tell me about ownership".into(),
            category: "Rust".into(),
            difficulty: "medium".into(),
            follow_ups: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), QuestionId::new(*v)))
                .collect(),
            score_descriptors: BTreeMap::new(),
        }
    }

    #[test]
    fn grade_bounds_are_enforced() {
        assert_eq!(Grade::from_u8(0).unwrap().value(), 0);
        assert_eq!(Grade::from_u8(4).unwrap().value(), 4);
        let err = Grade::from_u8(5).unwrap_err();
        assert!(matches!(err, GradeError::InvalidGrade(5)));
    }

    #[test]
    fn follow_up_prefers_exact_grade_key() {
        let question = question_with_follow_ups(&[("3", "q2"), ("default", "q3")]);
        let next = question.follow_up(Grade::from_u8(3).unwrap()).unwrap();
        assert_eq!(next.as_str(), "q2");
    }

    #[test]
    fn follow_up_falls_back_to_default() {
        let question = question_with_follow_ups(&[("3", "q2"), ("default", "q3")]);
        let next = question.follow_up(Grade::from_u8(1).unwrap()).unwrap();
        assert_eq!(next.as_str(), "q3");
    }

    #[test]
    fn follow_up_without_match_is_terminal() {
        let question = question_with_follow_ups(&[("3", "q2")]);
        assert!(question.follow_up(Grade::from_u8(1).unwrap()).is_none());
    }

    #[test]
    fn descriptors_sort_highest_first_and_skip_junk_keys() {
        let mut question = question_with_follow_ups(&[]);
        question.score_descriptors = [
            ("2".to_string(), "adequate".to_string()),
            ("4".to_string(), "excellent".to_string()),
            ("n/a".to_string(), "ignored".to_string()),
        ]
        .into_iter()
        .collect();

        let entries = question.descriptors_desc();
        assert_eq!(entries, vec![(4, "excellent"), (2, "adequate")]);
    }

    #[test]
    fn question_deserializes_from_camel_case() {
        let json = r#"{
            "id": "q1",
            "prompt": "P",
            "category": "C",
            "difficulty": "easy",
            "followUps": {"0": "q2", "default": "q3"},
            "scoreDescriptors": {"4": "great"}
        }"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.follow_ups.len(), 2);
        assert_eq!(question.score_descriptors.get("4").unwrap(), "great");
    }
}
