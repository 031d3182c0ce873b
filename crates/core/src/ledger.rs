//! Ordered collection of per-question responses.

use serde_json::Value;

use crate::migrate;
use crate::model::{QuestionId, Response};

/// Insertion-ordered responses with at most one entry per question.
///
/// Re-answering a question replaces the earlier entry in place, keeping its
/// original position; later entries never shift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseLedger {
    entries: Vec<Response>,
}

impl ResponseLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps already-normalized responses, preserving their order.
    #[must_use]
    pub fn from_responses(entries: Vec<Response>) -> Self {
        Self { entries }
    }

    /// Builds a ledger from raw snapshot records via legacy migration.
    #[must_use]
    pub fn from_raw(raw: &[Value]) -> Self {
        Self::from_responses(migrate::upgrade_responses(raw))
    }

    /// Records a response, replacing any earlier answer to the same
    /// question at its existing index.
    pub fn upsert(&mut self, response: Response) {
        match self
            .entries
            .iter()
            .position(|entry| entry.question_id == response.question_id)
        {
            Some(index) => self.entries[index] = response,
            None => self.entries.push(response),
        }
    }

    #[must_use]
    pub fn find_by_question(&self, id: &QuestionId) -> Option<&Response> {
        self.entries.iter().find(|entry| &entry.question_id == id)
    }

    /// All responses in insertion order.
    #[must_use]
    pub fn responses(&self) -> &[Response] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Grade;
    use crate::time::fixed_now;
    use serde_json::json;

    fn response(id: &str, grade: u8, notes: &str) -> Response {
        Response::graded(
            QuestionId::new(id),
            Grade::from_u8(grade).unwrap(),
            notes,
            "Rust",
            "medium",
            "Prompt",
            fixed_now(),
        )
    }

    #[test]
    fn upsert_appends_new_questions_in_order() {
        let mut ledger = ResponseLedger::new();
        ledger.upsert(response("q1", 3, ""));
        ledger.upsert(response("q2", 4, ""));

        let ids: Vec<&str> = ledger
            .responses()
            .iter()
            .map(|r| r.question_id.as_str())
            .collect();
        assert_eq!(ids, ["q1", "q2"]);
    }

    #[test]
    fn reanswering_replaces_in_place() {
        let mut ledger = ResponseLedger::new();
        ledger.upsert(response("q1", 1, "first"));
        ledger.upsert(response("q2", 3, ""));
        ledger.upsert(response("q1", 4, "second"));

        assert_eq!(ledger.len(), 2);
        let ids: Vec<&str> = ledger
            .responses()
            .iter()
            .map(|r| r.question_id.as_str())
            .collect();
        assert_eq!(ids, ["q1", "q2"]);

        let q1 = ledger.find_by_question(&QuestionId::new("q1")).unwrap();
        assert_eq!(q1.grade, Some(4.0));
        assert_eq!(q1.notes, "second");
    }

    #[test]
    fn from_raw_runs_legacy_migration() {
        let raw = vec![
            json!({"id": "q1", "rating": "competent", "category": "A"}),
            json!("garbage"),
        ];
        let ledger = ResponseLedger::from_raw(&raw);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.responses()[0].grade, Some(3.0));
    }

    #[test]
    fn find_by_question_misses_cleanly() {
        let ledger = ResponseLedger::new();
        assert!(ledger.find_by_question(&QuestionId::new("nope")).is_none());
    }
}
