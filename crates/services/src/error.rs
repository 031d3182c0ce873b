//! Shared error types for the services crate.

use thiserror::Error;

use interview_core::model::GradeError;
use storage::repository::StorageError;

/// Errors emitted by `InterviewService`.
///
/// None of these are fatal: `NotReady` and `NoTopicsSelected` are
/// advisories that leave state unchanged, and storage failures outside the
/// resume path are degraded to in-memory operation rather than surfaced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InterviewError {
    #[error("questions are still loading; try again in a moment")]
    NotReady,

    #[error("select at least one topic or choose all topics to begin")]
    NoTopicsSelected,

    #[error(transparent)]
    Grade(#[from] GradeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
