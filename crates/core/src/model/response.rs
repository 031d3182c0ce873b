use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::question::{Grade, QuestionId};

/// Record of a single answered question, owned by the session.
///
/// `topic` and `difficulty` are copied from the question at answer time so
/// later catalog edits do not rewrite history. `grade` is nullable: legacy
/// snapshots may carry ungraded entries, and migration retains them rather
/// than dropping data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub question_id: QuestionId,
    #[serde(default)]
    pub grade: Option<f64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Response {
    /// Builds a freshly graded response for a question.
    #[must_use]
    pub fn graded(
        question_id: QuestionId,
        grade: Grade,
        notes: impl Into<String>,
        topic: impl Into<String>,
        difficulty: impl Into<String>,
        prompt: impl Into<String>,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id,
            grade: Some(f64::from(grade.value())),
            notes: notes.into(),
            topic: Some(topic.into()),
            difficulty: Some(difficulty.into()),
            prompt: Some(prompt.into()),
            timestamp: Some(answered_at),
        }
    }

    /// Returns true if this entry carries a numeric grade.
    #[must_use]
    pub fn is_graded(&self) -> bool {
        self.grade.is_some_and(|g| !g.is_nan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn graded_response_copies_question_display_data() {
        let response = Response::graded(
            QuestionId::new("q1"),
            Grade::from_u8(3).unwrap(),
            "solid answer",
            "Rust",
            "medium",
            "Explain borrowing",
            fixed_now(),
        );

        assert_eq!(response.grade, Some(3.0));
        assert_eq!(response.topic.as_deref(), Some("Rust"));
        assert_eq!(response.timestamp, Some(fixed_now()));
        assert!(response.is_graded());
    }

    #[test]
    fn legacy_shape_deserializes_with_defaults() {
        let json = r#"{"questionId": "q1"}"#;
        let response: Response = serde_json::from_str(json).unwrap();
        assert_eq!(response.grade, None);
        assert!(response.notes.is_empty());
        assert!(!response.is_graded());
    }
}
