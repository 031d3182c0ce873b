use interview_core::model::{Question, QuestionId, Response};

/// One rubric line for display, already resolved to a numeric grade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorView {
    pub grade: u8,
    pub text: String,
}

/// Presentation-agnostic view of the current question.
///
/// This is intentionally **not** a UI view-model: no pre-formatted strings
/// and no layout assumptions. `existing` carries a previously recorded
/// answer so a renderer can pre-fill grade and notes after back-navigation
/// or resume.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub prompt: String,
    pub category: String,
    pub difficulty: String,
    /// Rubric entries sorted highest grade first.
    pub descriptors: Vec<DescriptorView>,
    pub existing: Option<Response>,
}

impl QuestionView {
    #[must_use]
    pub fn from_question(question: &Question, existing: Option<&Response>) -> Self {
        Self {
            id: question.id.clone(),
            prompt: question.prompt.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty.clone(),
            descriptors: question
                .descriptors_desc()
                .into_iter()
                .map(|(grade, text)| DescriptorView {
                    grade,
                    text: text.to_owned(),
                })
                .collect(),
            existing: existing.cloned(),
        }
    }
}

/// Result of a trigger: where the session stands now.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A question is active and should be presented.
    Question(QuestionView),
    /// The interview reached a terminal state; a summary can be requested.
    SummaryReady,
    /// No active session (history exhausted or never started).
    Idle,
}

impl Step {
    #[must_use]
    pub fn question(&self) -> Option<&QuestionView> {
        match self {
            Step::Question(view) => Some(view),
            _ => None,
        }
    }
}
