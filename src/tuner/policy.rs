use std::fmt;
use std::time::Duration;

use rand::Rng;

use crate::error::{PortaError, Result};
use crate::tuner::constants::{DEFAULT_TEST_LIMIT, MAX_RETRY_BACKOFF_MS};

/// How often a command whose output lacked a benchmark is re-run.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per command, including the first. `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Delay before the first retry; doubles on every further retry.
    pub backoff: Duration,
    pub max_backoff: Duration,
    /// Scale each delay by a uniform factor in `[0.5, 1.0]`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RetryPolicy {
    /// Re-run immediately until the output is complete.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            backoff: Duration::ZERO,
            max_backoff: Duration::from_millis(MAX_RETRY_BACKOFF_MS),
            jitter: false,
        }
    }

    /// Never re-run; incomplete output fails the session.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: Some(1),
            ..Self::unbounded()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether another attempt may follow `attempts` completed ones.
    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }

    /// Delay before the retry that follows `attempts` completed attempts.
    pub fn delay<R: Rng>(&self, attempts: u32, rng: &mut R) -> Duration {
        if self.backoff.is_zero() {
            return Duration::ZERO;
        }
        let exponent = attempts.saturating_sub(1).min(16);
        let delay = self
            .backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff);
        if self.jitter {
            delay.mul_f64(rng.gen_range(0.5..=1.0))
        } else {
            delay
        }
    }
}

/// Why a category's search was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EvaluationLimit,
    TimeLimit,
    Stalled,
    Converged,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::EvaluationLimit => "evaluation limit reached",
            StopReason::TimeLimit => "time limit reached",
            StopReason::Stalled => "no improvement within stall limit",
            StopReason::Converged => "step size below minimum",
        };
        f.write_str(s)
    }
}

/// Snapshot of a running search, as seen by the stop policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchProgress {
    pub evaluations: usize,
    pub elapsed: Duration,
    /// Consecutive evaluations that were not an improvement.
    pub since_improvement: usize,
    pub step_size: f64,
}

/// The driver's budget and convergence criteria for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct StopPolicy {
    pub max_evaluations: Option<usize>,
    pub max_duration: Option<Duration>,
    pub stall_limit: Option<usize>,
    pub min_step_size: Option<f64>,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            max_evaluations: Some(DEFAULT_TEST_LIMIT),
            max_duration: None,
            stall_limit: None,
            min_step_size: None,
        }
    }
}

impl StopPolicy {
    /// Reject policies that can never stop or can never evaluate anything.
    pub fn validate(&self) -> Result<()> {
        if self.max_evaluations.is_none()
            && self.max_duration.is_none()
            && self.stall_limit.is_none()
            && self.min_step_size.is_none()
        {
            return Err(PortaError::InvalidInput(
                "stop policy needs at least one limit".to_string(),
            ));
        }
        if self.max_evaluations == Some(0) {
            return Err(PortaError::InvalidInput(
                "evaluation limit must be at least 1".to_string(),
            ));
        }
        if self.stall_limit == Some(0) {
            return Err(PortaError::InvalidInput(
                "stall limit must be at least 1".to_string(),
            ));
        }
        if self.max_duration.is_some_and(|d| d.is_zero()) {
            return Err(PortaError::InvalidInput(
                "time limit must be positive".to_string(),
            ));
        }
        // The step size only halves, so a non-positive floor is never crossed.
        if let Some(min) = self.min_step_size {
            if !(min.is_finite() && min > 0.0) {
                return Err(PortaError::InvalidInput(format!(
                    "minimum step size must be a positive number, got {}",
                    min
                )));
            }
        }
        Ok(())
    }

    /// Checked before each candidate. The first evaluation is always allowed.
    pub fn should_stop(&self, progress: &SearchProgress) -> Option<StopReason> {
        if progress.evaluations == 0 {
            return None;
        }
        if self.max_evaluations.is_some_and(|max| progress.evaluations >= max) {
            return Some(StopReason::EvaluationLimit);
        }
        if self.max_duration.is_some_and(|max| progress.elapsed >= max) {
            return Some(StopReason::TimeLimit);
        }
        if self.stall_limit.is_some_and(|max| progress.since_improvement >= max) {
            return Some(StopReason::Stalled);
        }
        if self.min_step_size.is_some_and(|min| progress.step_size < min) {
            return Some(StopReason::Converged);
        }
        None
    }
}
