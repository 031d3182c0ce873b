use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogMeta;
use crate::ledger::ResponseLedger;
use crate::model::question::QuestionId;
use crate::navigation::NavState;

//
// ─── TOPIC FILTER ─────────────────────────────────────────────────────────────
//

/// Active topic selection for an interview run.
///
/// `select_all` is a shortcut meaning "ignore the explicit set and treat it
/// as every topic the catalog knows about".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    pub topics: Vec<String>,
    pub select_all: bool,
}

impl TopicFilter {
    /// Filter covering all catalog topics.
    #[must_use]
    pub fn all(topics: Vec<String>) -> Self {
        Self {
            topics,
            select_all: true,
        }
    }

    /// Explicit subset of topics.
    #[must_use]
    pub fn subset(topics: Vec<String>) -> Self {
        Self {
            topics,
            select_all: false,
        }
    }

    /// True when nothing is selected and the all-topics shortcut is off.
    #[must_use]
    pub fn is_empty_selection(&self) -> bool {
        !self.select_all && self.topics.is_empty()
    }
}

impl Default for TopicFilter {
    fn default() -> Self {
        Self::all(Vec::new())
    }
}

//
// ─── SESSION STATE ────────────────────────────────────────────────────────────
//

/// Mutable state of the single active interview session.
///
/// Created empty at startup, populated either by a fresh start or by
/// restoring a snapshot. Navigation position and history are owned by the
/// embedded `NavState`; responses live in the `ResponseLedger` held by the
/// caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub nav: NavState,
    pub topic_filter: TopicFilter,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Clears position, history, and the saved-at marker.
    ///
    /// The topic filter is left untouched; a fresh start sets it explicitly.
    pub fn reset(&mut self) {
        self.nav = NavState::default();
        self.last_saved_at = None;
    }
}

//
// ─── SNAPSHOT ─────────────────────────────────────────────────────────────────
//

/// Durable wire shape of a session, one JSON document per storage slot.
///
/// Responses are held as raw JSON values so that restoring always passes
/// them through legacy migration; every other field is tolerant of being
/// absent or malformed in older snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub meta: Option<CatalogMeta>,
    #[serde(default)]
    pub current_id: Option<QuestionId>,
    #[serde(default)]
    pub history: Vec<QuestionId>,
    #[serde(default)]
    pub responses: Vec<serde_json::Value>,
    #[serde(default)]
    pub selected_topics: Option<Vec<String>>,
    #[serde(default)]
    pub select_all_topics: Option<bool>,
    #[serde(default)]
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Captures the current session and ledger into a durable document.
    #[must_use]
    pub fn capture(
        state: &SessionState,
        ledger: &ResponseLedger,
        meta: Option<CatalogMeta>,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            meta,
            current_id: state.nav.current().cloned(),
            history: state.nav.history().to_vec(),
            responses: ledger
                .responses()
                .iter()
                .filter_map(|r| serde_json::to_value(r).ok())
                .collect(),
            selected_topics: Some(state.topic_filter.topics.clone()),
            select_all_topics: Some(state.topic_filter.select_all),
            last_saved_at: Some(saved_at),
        }
    }

    /// True iff the snapshot holds something worth resuming: at least one
    /// response, or a non-null current question.
    #[must_use]
    pub fn has_restorable_progress(&self) -> bool {
        !self.responses.is_empty() || self.current_id.is_some()
    }

    /// Rebuilds session state and ledger from this snapshot.
    ///
    /// Raw responses go through legacy migration; a missing or malformed
    /// topic selection defaults to "all topics" using `catalog_topics`.
    #[must_use]
    pub fn restore(&self, catalog_topics: &[String]) -> (SessionState, ResponseLedger) {
        let topic_filter = match (&self.selected_topics, self.select_all_topics) {
            (Some(topics), Some(select_all)) => TopicFilter {
                topics: topics.clone(),
                select_all,
            },
            (Some(topics), None) => TopicFilter::all(topics.clone()),
            _ => TopicFilter::all(catalog_topics.to_vec()),
        };

        let state = SessionState {
            nav: NavState::restored(self.current_id.clone(), self.history.clone()),
            topic_filter,
            last_saved_at: self.last_saved_at,
        };
        let ledger = ResponseLedger::from_raw(&self.responses);
        (state, ledger)
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::Grade;
    use crate::model::response::Response;
    use crate::time::fixed_now;

    #[test]
    fn capture_then_restore_round_trips_state_and_ledger() {
        let mut state = SessionState::default();
        state.nav.set_current(Some(QuestionId::new("q2")));
        state.nav.visit(&QuestionId::new("q1"));
        state.nav.visit(&QuestionId::new("q2"));
        state.topic_filter = TopicFilter::subset(vec!["Rust".into()]);

        let mut ledger = ResponseLedger::default();
        ledger.upsert(Response::graded(
            QuestionId::new("q1"),
            Grade::from_u8(4).unwrap(),
            "notes",
            "Rust",
            "easy",
            "Prompt",
            fixed_now(),
        ));

        let snapshot = Snapshot::capture(&state, &ledger, None, fixed_now());
        let (restored_state, restored_ledger) = snapshot.restore(&["Rust".to_string()]);

        assert_eq!(restored_state.nav, state.nav);
        assert_eq!(restored_state.topic_filter, state.topic_filter);
        assert_eq!(restored_ledger.responses(), ledger.responses());
    }

    #[test]
    fn snapshot_json_uses_camel_case_field_names() {
        let snapshot = Snapshot::capture(
            &SessionState::default(),
            &ResponseLedger::default(),
            None,
            fixed_now(),
        );
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("currentId").is_some());
        assert!(json.get("selectAllTopics").is_some());
        assert!(json.get("lastSavedAt").is_some());
    }

    #[test]
    fn missing_topic_selection_defaults_to_all_topics() {
        let snapshot: Snapshot = serde_json::from_str(r#"{"currentId": "q3"}"#).unwrap();
        let (state, _) = snapshot.restore(&["A".to_string(), "B".to_string()]);
        assert!(state.topic_filter.select_all);
        assert_eq!(state.topic_filter.topics, vec!["A", "B"]);
    }

    #[test]
    fn empty_snapshot_is_not_restorable() {
        let snapshot = Snapshot::default();
        assert!(!snapshot.has_restorable_progress());

        let with_current: Snapshot = serde_json::from_str(r#"{"currentId": "q1"}"#).unwrap();
        assert!(with_current.has_restorable_progress());
    }
}
