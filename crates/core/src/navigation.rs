//! Grade-conditioned traversal over the question graph.
//!
//! Navigation is a small state machine over question ids plus one synthetic
//! terminal state (`None`). The visited-id history doubles as the back
//! stack; it never repeats an id adjacently, so re-rendering the same
//! question is idempotent.

use crate::model::{Grade, Question, QuestionId};

/// Upper bound on retained history entries; the oldest are dropped first.
const HISTORY_LIMIT: usize = 512;

/// Resolves the next question id for a graded answer.
///
/// Pure two-tier lookup: exact grade key, then the `default` fallback, then
/// `None` (terminal, triggers the summary). Has no effect on history; the
/// caller pushes the result via [`NavState::visit`].
#[must_use]
pub fn advance(question: &Question, grade: Grade) -> Option<&QuestionId> {
    question.follow_up(grade)
}

/// Current position and back stack of the interview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavState {
    current: Option<QuestionId>,
    history: Vec<QuestionId>,
}

impl NavState {
    /// Fresh navigation origin: position at the catalog's entry question
    /// (which may be undefined), empty history.
    #[must_use]
    pub fn start(start_question: Option<QuestionId>) -> Self {
        Self {
            current: start_question,
            history: Vec::new(),
        }
    }

    /// Rebuilds navigation from persisted fields.
    ///
    /// Snapshots are trusted once they parse, except that an over-long
    /// history is cut down to the newest `HISTORY_LIMIT` entries so the
    /// bound holds even across restores.
    #[must_use]
    pub fn restored(current: Option<QuestionId>, mut history: Vec<QuestionId>) -> Self {
        if history.len() > HISTORY_LIMIT {
            history.drain(..history.len() - HISTORY_LIMIT);
        }
        Self { current, history }
    }

    #[must_use]
    pub fn current(&self) -> Option<&QuestionId> {
        self.current.as_ref()
    }

    pub fn set_current(&mut self, id: Option<QuestionId>) {
        self.current = id;
    }

    #[must_use]
    pub fn history(&self) -> &[QuestionId] {
        &self.history
    }

    /// Records that a question became current.
    ///
    /// Pushes onto history only if the id differs from the last entry, so
    /// repeated renders of the same question leave the stack unchanged.
    pub fn visit(&mut self, id: &QuestionId) {
        if self.history.last() == Some(id) {
            return;
        }
        while self.history.len() >= HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push(id.clone());
    }

    /// Steps back one question.
    ///
    /// Pops the current entry and repositions on the new top of the stack.
    /// Returns the new current id, or `None` once history is exhausted;
    /// that signals a return to idle, not an error, and further calls stay
    /// at `None`.
    pub fn back(&mut self) -> Option<&QuestionId> {
        self.history.pop();
        self.current = self.history.last().cloned();
        self.current.as_ref()
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
