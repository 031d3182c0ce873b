#![forbid(unsafe_code)]

pub mod error;
pub mod interview;

pub use interview_core::Clock;

pub use error::InterviewError;
pub use interview::{DescriptorView, InterviewService, QuestionView, SessionReport, Step};
