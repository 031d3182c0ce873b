mod question;
mod response;
mod session;

pub use question::{Grade, GradeError, Question, QuestionId};
pub use response::Response;
pub use session::{SessionState, Snapshot, TopicFilter};
