pub mod leveled;
pub mod session;

pub use leveled::{apply_grade, grade_correct, grade_incorrect, interval_days, Grade, Transition};
pub use session::{build_session, sort_candidates, GradedItem, ReviewSession, SessionProgress};
