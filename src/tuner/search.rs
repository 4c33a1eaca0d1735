use serde::{Deserialize, Serialize};

use crate::error::{PortaError, Result};
use crate::models::{Configuration, Parameter, SearchSpace};
use crate::tuner::constants::INITIAL_STEP_SIZE;
use crate::tuner::evaluation::ScoreResult;

/// A configuration together with the score it achieved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub configuration: Configuration,
    pub score: ScoreResult,
}

/// What a reported score did to the search state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// First evaluation, taken as the starting point.
    Anchored,
    /// Strictly better than the current point; keep stepping the same way.
    Improved,
    /// Not better; direction flipped and step halved.
    Reversed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Anchored => "anchored",
            Outcome::Improved => "improved",
            Outcome::Reversed => "reversed",
        }
    }
}

/// Adaptive bidirectional line search over a single integer parameter.
///
/// Assumes the objective is monotonic (or close to unimodal) along the
/// parameter. The first candidate pins the parameter to its maximum. Each
/// later candidate moves the current best by `step_size` in unit space; a
/// candidate that is not strictly better flips the direction and halves the
/// step. There is no convergence test: the caller decides when to stop and
/// reads [`MonotonicSearch::best`].
#[derive(Debug, Clone)]
pub struct MonotonicSearch {
    parameter: Parameter,
    step_size: f64,
    go_down: bool,
    current: Option<Evaluation>,
    pending: Option<Configuration>,
    emitted: usize,
}

impl MonotonicSearch {
    pub fn new(space: &SearchSpace) -> Result<Self> {
        if space.len() != 1 {
            return Err(PortaError::UnsupportedSearchSpace(space.len()));
        }
        Ok(Self {
            parameter: space.parameters()[0].clone(),
            step_size: INITIAL_STEP_SIZE,
            go_down: true,
            current: None,
            pending: None,
            emitted: 0,
        })
    }

    /// Next configuration to evaluate.
    ///
    /// Until a score is reported for it, the same candidate is returned again.
    pub fn next_candidate(&mut self) -> Configuration {
        if let Some(pending) = &self.pending {
            return pending.clone();
        }

        let candidate = match &self.current {
            None => self
                .parameter
                .with_value(&Configuration::new(), self.parameter.max_value()),
            Some(current) => {
                let unit_value = self
                    .parameter
                    .unit_value(&current.configuration)
                    .unwrap_or(1.0);
                let proposed = if self.go_down {
                    unit_value - self.step_size
                } else {
                    unit_value + self.step_size
                };
                self.parameter
                    .with_unit_value(&current.configuration, proposed.max(0.0))
            }
        };

        self.pending = Some(candidate.clone());
        self.emitted += 1;
        candidate
    }

    /// Feed back the score of the last candidate from [`Self::next_candidate`].
    pub fn report(&mut self, score: ScoreResult) -> Result<Outcome> {
        let configuration = self.pending.take().ok_or(PortaError::NoPendingCandidate)?;
        let evaluated = Evaluation {
            configuration,
            score,
        };

        let outcome = match &self.current {
            None => Outcome::Anchored,
            Some(current) if evaluated.score.is_better_than(&current.score) => Outcome::Improved,
            Some(_) => Outcome::Reversed,
        };

        match outcome {
            Outcome::Anchored | Outcome::Improved => self.current = Some(evaluated),
            Outcome::Reversed => {
                self.go_down = !self.go_down;
                self.step_size /= 2.0;
            }
        }

        Ok(outcome)
    }

    /// Best evaluation seen so far.
    pub fn best(&self) -> Option<&Evaluation> {
        self.current.as_ref()
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn go_down(&self) -> bool {
        self.go_down
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of distinct candidates handed out.
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}
