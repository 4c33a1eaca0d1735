use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortaError {
    #[error("Non-zero exit code ({status}):\n{command}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    Execution {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("Command timed out after {timeout:?}: {command}")]
    Timeout { command: String, timeout: Duration },

    #[error("Can't find result for benchmark {0}")]
    IncompleteResult(String),

    #[error("Still missing result for benchmark {missing} after {attempts} attempts: {command}")]
    RetriesExhausted {
        command: String,
        attempts: u32,
        missing: String,
    },

    #[error("Malformed benchmark output: {0}")]
    MalformedOutput(String),

    #[error("No benchmarks for {0}")]
    NoBenchmarks(String),

    #[error("Unknown benchmark class {name}{}", did_you_mean(.suggestion))]
    UnknownCategory {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Only one parameter per search is supported (got {0})")]
    UnsupportedSearchSpace(usize),

    #[error("Invalid bounds for {name}: min {min} must be below max {max}")]
    InvalidBounds { name: String, min: i64, max: i64 },

    #[error("Expecting value for cpu quota when tuning {0}")]
    MissingCpuQuota(String),

    #[error("Score is not finite: {0}")]
    NonFiniteScore(String),

    #[error("Score reported with no candidate awaiting evaluation")]
    NoPendingCandidate,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PortaError {
    /// Whether re-running the same command may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, PortaError::IncompleteResult(_))
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, PortaError>;
