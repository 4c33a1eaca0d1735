pub mod constants;
pub mod evaluation;
pub mod output;
pub mod policy;
pub mod profile;
pub mod search;
pub mod session;

pub use evaluation::{
    accuracy_score, pair_results, reflect_speedup, speedup_score, BenchmarkPair, Direction,
    ScoreMode, ScoreResult,
};
pub use output::{print_summary, write_parameters, write_trace_csv, WriteMode};
pub use policy::{RetryPolicy, SearchProgress, StopPolicy, StopReason};
pub use profile::{CategoryBounds, Profile};
pub use search::{Evaluation, MonotonicSearch, Outcome};
pub use session::{SessionConfig, TuningSession};
