mod persistence;
mod session;

pub use persistence::load_reference;
pub use session::{EvaluationRecord, SessionState};
