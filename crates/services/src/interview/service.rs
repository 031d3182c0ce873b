use tracing::warn;

use interview_core::catalog::Catalog;
use interview_core::ledger::ResponseLedger;
use interview_core::metrics::{self, Metrics};
use interview_core::model::{Grade, Response, SessionState, Snapshot, TopicFilter};
use interview_core::navigation::{self, NavState};
use interview_core::time::Clock;
use storage::repository::SnapshotStore;

use super::report::SessionReport;
use super::view::{QuestionView, Step};
use crate::error::InterviewError;

/// Durable slot name for the single active session.
pub const DEFAULT_SLOT: &str = "adaptive-interview-session";

//
// ─── INTERVIEW SERVICE ────────────────────────────────────────────────────────
//

/// Owns one interview session end to end: catalog, position, history,
/// ledger, and the durable snapshot slot.
///
/// The catalog is installed once via [`Self::install_catalog`]; every
/// trigger before that is rejected with `NotReady`. Snapshot writes are
/// best-effort: on storage failure the session degrades to in-memory-only
/// operation and the interview keeps going.
pub struct InterviewService {
    clock: Clock,
    store: SnapshotStore,
    slot: String,
    catalog: Option<Catalog>,
    state: SessionState,
    ledger: ResponseLedger,
}

impl InterviewService {
    #[must_use]
    pub fn new(clock: Clock, store: SnapshotStore) -> Self {
        Self {
            clock,
            store,
            slot: DEFAULT_SLOT.to_owned(),
            catalog: None,
            state: SessionState::default(),
            ledger: ResponseLedger::new(),
        }
    }

    /// Use a different storage slot name.
    #[must_use]
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    /// Installs the loaded catalog, making the trigger surface available.
    ///
    /// The catalog fetch is the caller's one asynchronous boundary; the
    /// engine only accepts its completed result.
    pub fn install_catalog(&mut self, catalog: Catalog) {
        self.state.topic_filter = TopicFilter::all(catalog.topics().to_vec());
        self.catalog = Some(catalog);
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.catalog.is_some()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn ledger(&self) -> &ResponseLedger {
        &self.ledger
    }

    fn catalog(&self) -> Result<&Catalog, InterviewError> {
        self.catalog.as_ref().ok_or(InterviewError::NotReady)
    }

    //
    // ─── TRIGGERS ─────────────────────────────────────────────────────────
    //

    /// Starts a fresh interview with the given topic filter.
    ///
    /// Clears history, responses, and the durable slot, then positions at
    /// the catalog's entry question. Resuming never goes through here.
    ///
    /// # Errors
    ///
    /// `NotReady` before the catalog is installed; `NoTopicsSelected` if
    /// the filter selects nothing explicitly and the all-topics shortcut is
    /// off. Both leave state unchanged.
    pub async fn start_fresh(&mut self, filter: TopicFilter) -> Result<Step, InterviewError> {
        let catalog = self.catalog()?;
        if filter.is_empty_selection() {
            return Err(InterviewError::NoTopicsSelected);
        }

        let topic_filter = if filter.select_all {
            TopicFilter::all(catalog.topics().to_vec())
        } else {
            filter
        };
        let start = catalog.start_question().cloned();

        self.state = SessionState {
            nav: NavState::start(start),
            topic_filter,
            last_saved_at: None,
        };
        self.ledger.clear();
        if let Err(error) = self.store.clear(&self.slot).await {
            warn!(%error, "failed to purge snapshot slot; continuing in memory");
        }

        Ok(self.render_current())
    }

    /// Restores the persisted session, if there is one worth restoring.
    ///
    /// Missing, corrupt, and never-started snapshots all yield `Ok(None)`.
    /// Restoring never clears the ledger or history.
    ///
    /// # Errors
    ///
    /// `NotReady` before the catalog is installed; `Storage` if the slot
    /// cannot be read at all.
    pub async fn resume(&mut self) -> Result<Option<Step>, InterviewError> {
        self.catalog()?;

        let Some(snapshot) = self.store.load(&self.slot).await? else {
            return Ok(None);
        };
        if !snapshot.has_restorable_progress() {
            return Ok(None);
        }

        let catalog = self.catalog()?;
        let (state, ledger) = snapshot.restore(catalog.topics());
        self.state = state;
        self.ledger = ledger;

        Ok(Some(self.render_current()))
    }

    /// Records the grade and notes for the current question, then advances.
    ///
    /// The ledger write always precedes the navigation step; re-answering a
    /// question overwrites its earlier entry in place. Returns the next
    /// question, or `SummaryReady` when the graph reaches a terminal.
    ///
    /// # Errors
    ///
    /// `NotReady` before the catalog is installed.
    pub async fn submit_grade(
        &mut self,
        grade: Grade,
        notes: &str,
    ) -> Result<Step, InterviewError> {
        let catalog = self.catalog()?;

        let Some(current_id) = self.state.nav.current().cloned() else {
            return Ok(Step::SummaryReady);
        };
        let Some(question) = catalog.get(&current_id).cloned() else {
            // Position referenced a question the catalog no longer has.
            warn!(question = %current_id, "current question missing from catalog; ending interview");
            self.state.nav.set_current(None);
            self.persist().await;
            return Ok(Step::SummaryReady);
        };

        self.ledger.upsert(Response::graded(
            question.id.clone(),
            grade,
            notes.trim(),
            question.category.clone(),
            question.difficulty.clone(),
            question.prompt.clone(),
            self.clock.now(),
        ));

        let next = navigation::advance(&question, grade).cloned();
        self.state.nav.set_current(next.clone());

        let Some(next_id) = next else {
            self.persist().await;
            return Ok(Step::SummaryReady);
        };

        let catalog = self.catalog()?;
        let Some(next_question) = catalog.get(&next_id).cloned() else {
            warn!(question = %next_id, "follow-up question missing from catalog; ending interview");
            self.state.nav.set_current(None);
            self.persist().await;
            return Ok(Step::SummaryReady);
        };

        self.state.nav.visit(&next_id);
        self.persist().await;
        let existing = self.ledger.find_by_question(&next_id);
        Ok(Step::Question(QuestionView::from_question(
            &next_question,
            existing,
        )))
    }

    /// Steps back to the previously visited question.
    ///
    /// Returns `Idle` once history is exhausted; further calls stay idle.
    ///
    /// # Errors
    ///
    /// `NotReady` before the catalog is installed.
    pub async fn back(&mut self) -> Result<Step, InterviewError> {
        self.catalog()?;
        self.state.nav.back();
        self.persist().await;

        let step = match self.state.nav.current() {
            Some(_) => self.render_current(),
            None => Step::Idle,
        };
        Ok(step)
    }

    /// Clears the session and purges the durable slot.
    ///
    /// # Errors
    ///
    /// `NotReady` before the catalog is installed. A failed purge is logged
    /// and degraded, not surfaced.
    pub async fn reset(&mut self) -> Result<(), InterviewError> {
        let catalog = self.catalog()?;
        self.state = SessionState {
            nav: NavState::default(),
            topic_filter: TopicFilter::all(catalog.topics().to_vec()),
            last_saved_at: None,
        };
        self.ledger.clear();
        if let Err(error) = self.store.clear(&self.slot).await {
            warn!(%error, "failed to purge snapshot slot; continuing in memory");
        }
        Ok(())
    }

    /// Computes summary statistics from the ledger.
    ///
    /// # Errors
    ///
    /// `NotReady` before the catalog is installed.
    pub fn request_summary(&self) -> Result<Metrics, InterviewError> {
        self.catalog()?;
        Ok(metrics::summarize(self.ledger.responses()))
    }

    /// Builds the exportable session report.
    ///
    /// # Errors
    ///
    /// `NotReady` before the catalog is installed.
    pub fn export_report(&self) -> Result<SessionReport, InterviewError> {
        let catalog = self.catalog()?;
        Ok(SessionReport {
            generated_at: self.clock.now(),
            meta: catalog.meta().clone(),
            history: self.state.nav.history().to_vec(),
            selected_topics: self.state.topic_filter.topics.clone(),
            select_all_topics: self.state.topic_filter.select_all,
            metrics: metrics::summarize(self.ledger.responses()),
            responses: self.ledger.responses().to_vec(),
        })
    }

    /// True when the durable slot holds a resumable session.
    ///
    /// Storage failures degrade to `false`; the caller simply loses the
    /// resume affordance.
    pub async fn has_restorable_progress(&self) -> bool {
        match self.store.load(&self.slot).await {
            Ok(Some(snapshot)) => snapshot.has_restorable_progress(),
            Ok(None) => false,
            Err(error) => {
                warn!(%error, "snapshot probe failed; treating as no session");
                false
            }
        }
    }

    //
    // ─── INTERNALS ────────────────────────────────────────────────────────
    //

    /// View for the current position; records the visit when a question is
    /// active so repeated renders stay idempotent.
    fn render_current(&mut self) -> Step {
        let Some(current_id) = self.state.nav.current().cloned() else {
            return Step::SummaryReady;
        };
        let question = self
            .catalog
            .as_ref()
            .and_then(|catalog| catalog.get(&current_id))
            .cloned();
        let Some(question) = question else {
            warn!(question = %current_id, "current question missing from catalog; ending interview");
            self.state.nav.set_current(None);
            return Step::SummaryReady;
        };

        self.state.nav.visit(&current_id);
        let existing = self.ledger.find_by_question(&current_id);
        Step::Question(QuestionView::from_question(&question, existing))
    }

    /// Best-effort snapshot write; stamps `last_saved_at` first.
    async fn persist(&mut self) {
        let meta = self.catalog.as_ref().map(|c| c.meta().clone());
        let now = self.clock.now();
        self.state.last_saved_at = Some(now);
        let snapshot = Snapshot::capture(&self.state, &self.ledger, meta, now);
        if let Err(error) = self.store.save(&self.slot, &snapshot, now).await {
            warn!(%error, "snapshot save failed; continuing without persistence");
        }
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::time::fixed_clock;

    fn catalog_json() -> &'static str {
        r#"{
            "meta": {"startQuestion": "q1", "title": "Backend Screen"},
            "questions": [
                {
                    "id": "q1",
                    "prompt": "Walk through a recent incident",
                    "category": "Operations",
                    "difficulty": "medium",
                    "followUps": {"3": "q2", "default": "q3"},
                    "scoreDescriptors": {"4": "clear timeline", "2": "vague"}
                },
                {
                    "id": "q2",
                    "prompt": "How was it prevented from recurring?",
                    "category": "Operations",
                    "difficulty": "hard",
                    "followUps": {}
                },
                {
                    "id": "q3",
                    "prompt": "Describe your monitoring setup",
                    "category": "Observability",
                    "difficulty": "easy",
                    "followUps": {"default": "missing-question"}
                }
            ]
        }"#
    }

    fn ready_service() -> InterviewService {
        let mut service = InterviewService::new(fixed_clock(), SnapshotStore::in_memory());
        service.install_catalog(Catalog::from_json_str(catalog_json()).unwrap());
        service
    }

    fn grade(value: u8) -> Grade {
        Grade::from_u8(value).unwrap()
    }

    #[tokio::test]
    async fn triggers_are_rejected_before_catalog_install() {
        let mut service = InterviewService::new(fixed_clock(), SnapshotStore::in_memory());
        assert!(!service.is_ready());

        let err = service.start_fresh(TopicFilter::default()).await.unwrap_err();
        assert!(matches!(err, InterviewError::NotReady));
        let err = service.submit_grade(grade(3), "").await.unwrap_err();
        assert!(matches!(err, InterviewError::NotReady));
        assert!(matches!(
            service.request_summary().unwrap_err(),
            InterviewError::NotReady
        ));
    }

    #[tokio::test]
    async fn empty_topic_selection_is_rejected_without_state_change() {
        let mut service = ready_service();
        let err = service
            .start_fresh(TopicFilter::subset(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::NoTopicsSelected));
        assert!(service.state().nav.current().is_none());
    }

    #[tokio::test]
    async fn exact_grade_key_routes_to_its_follow_up() {
        let mut service = ready_service();
        let step = service.start_fresh(TopicFilter::default()).await.unwrap();
        assert_eq!(step.question().unwrap().id.as_str(), "q1");

        let step = service.submit_grade(grade(3), "good detail").await.unwrap();
        assert_eq!(step.question().unwrap().id.as_str(), "q2");
    }

    #[tokio::test]
    async fn unmatched_grade_falls_back_to_default() {
        let mut service = ready_service();
        service.start_fresh(TopicFilter::default()).await.unwrap();

        let step = service.submit_grade(grade(1), "").await.unwrap();
        assert_eq!(step.question().unwrap().id.as_str(), "q3");
    }

    #[tokio::test]
    async fn terminal_question_yields_summary_ready() {
        let mut service = ready_service();
        service.start_fresh(TopicFilter::default()).await.unwrap();
        service.submit_grade(grade(3), "").await.unwrap();

        // q2 has no follow-ups at all.
        let step = service.submit_grade(grade(4), "").await.unwrap();
        assert_eq!(step, Step::SummaryReady);
        assert!(service.state().nav.current().is_none());
    }

    #[tokio::test]
    async fn dangling_follow_up_id_ends_the_interview() {
        let mut service = ready_service();
        service.start_fresh(TopicFilter::default()).await.unwrap();
        service.submit_grade(grade(1), "").await.unwrap();

        // q3's default follow-up points at an id the catalog lacks.
        let step = service.submit_grade(grade(2), "").await.unwrap();
        assert_eq!(step, Step::SummaryReady);
        // The answer itself was still recorded before navigation.
        assert_eq!(service.ledger().len(), 2);
    }

    #[tokio::test]
    async fn back_returns_to_previous_question_with_prefill() {
        let mut service = ready_service();
        service.start_fresh(TopicFilter::default()).await.unwrap();
        service.submit_grade(grade(3), "first pass").await.unwrap();

        let step = service.back().await.unwrap();
        let view = step.question().unwrap();
        assert_eq!(view.id.as_str(), "q1");
        let existing = view.existing.as_ref().unwrap();
        assert_eq!(existing.grade, Some(3.0));
        assert_eq!(existing.notes, "first pass");
    }

    #[tokio::test]
    async fn back_past_the_start_goes_idle_and_stays_there() {
        let mut service = ready_service();
        service.start_fresh(TopicFilter::default()).await.unwrap();

        assert_eq!(service.back().await.unwrap(), Step::Idle);
        assert_eq!(service.back().await.unwrap(), Step::Idle);
    }

    #[tokio::test]
    async fn reanswering_overwrites_in_place() {
        let mut service = ready_service();
        service.start_fresh(TopicFilter::default()).await.unwrap();
        service.submit_grade(grade(3), "first").await.unwrap();
        service.back().await.unwrap();
        service.submit_grade(grade(1), "second").await.unwrap();

        assert_eq!(service.ledger().len(), 1);
        let entry = &service.ledger().responses()[0];
        assert_eq!(entry.grade, Some(1.0));
        assert_eq!(entry.notes, "second");
    }

    #[tokio::test]
    async fn descriptors_render_highest_grade_first() {
        let mut service = ready_service();
        let step = service.start_fresh(TopicFilter::default()).await.unwrap();
        let view = step.question().unwrap();
        assert_eq!(view.descriptors[0].grade, 4);
        assert_eq!(view.descriptors[1].grade, 2);
    }

    #[tokio::test]
    async fn select_all_filter_expands_to_catalog_topics() {
        let mut service = ready_service();
        service
            .start_fresh(TopicFilter::all(Vec::new()))
            .await
            .unwrap();
        assert_eq!(
            service.state().topic_filter.topics,
            vec!["Observability".to_string(), "Operations".to_string()]
        );
    }

    #[tokio::test]
    async fn report_carries_meta_history_and_metrics() {
        let mut service = ready_service();
        service.start_fresh(TopicFilter::default()).await.unwrap();
        service.submit_grade(grade(3), "").await.unwrap();

        let report = service.export_report().unwrap();
        assert_eq!(report.meta.title.as_deref(), Some("Backend Screen"));
        assert_eq!(report.history.len(), 2);
        assert_eq!(report.metrics.total_questions, 1);
        assert_eq!(report.responses.len(), 1);
    }
}
