//! Running benchmark commands and turning their output into samples.

mod command;
mod process;

pub use command::{CommandBuilder, DockerCommandBuilder};
pub use process::ProcessSampler;

use crate::error::{PortaError, Result};
use crate::models::SampleSet;

/// Captured output of a command that exited successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutput {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
}

/// Executes benchmark commands.
///
/// Implementors only provide [`Sampler::execute`]; parsing and the
/// completeness check are shared. A sampler never retries on its own.
pub trait Sampler {
    /// Run `command` to completion. A non-zero exit is an `Execution` error.
    fn execute(&mut self, command: &str) -> Result<RawOutput>;

    /// Run `command` and parse its stdout as benchmark results.
    ///
    /// Returns `IncompleteResult` when any of `expected` is absent from the
    /// parsed output, so callers can tell a rerun apart from a fatal error.
    fn run(&mut self, command: &str, expected: &[String]) -> Result<SampleSet> {
        let output = self.execute(command)?;
        let samples = SampleSet::parse(&output.stdout).map_err(|e| match e {
            PortaError::Json(err) => PortaError::MalformedOutput(format!(
                "{}\ncommand: {}\nstdout:\n{}",
                err, command, output.stdout
            )),
            other => other,
        })?;

        if let Some(missing) = samples.first_missing(expected) {
            return Err(PortaError::IncompleteResult(missing.to_string()));
        }

        Ok(samples)
    }
}

impl<S: Sampler + ?Sized> Sampler for &mut S {
    fn execute(&mut self, command: &str) -> Result<RawOutput> {
        (**self).execute(command)
    }
}
