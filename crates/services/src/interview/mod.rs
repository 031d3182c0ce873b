mod report;
mod service;
mod view;

// Public API of the interview subsystem.
pub use crate::error::InterviewError;
pub use report::SessionReport;
pub use service::{DEFAULT_SLOT, InterviewService};
pub use view::{DescriptorView, QuestionView, Step};
