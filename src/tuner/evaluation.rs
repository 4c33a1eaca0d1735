use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{PortaError, Result};
use crate::models::SampleSet;
use crate::tuner::constants::{ACCURACY_SCALE, ACCURACY_ZERO_GUARD};

/// Whether a larger or a smaller objective value is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Maximize,
    Minimize,
}

/// Scalar objective for one evaluated configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub value: f64,
    pub direction: Direction,
}

impl ScoreResult {
    /// Strict comparison in this score's direction. Equal values are never better.
    pub fn is_better_than(&self, other: &ScoreResult) -> bool {
        match self.direction {
            Direction::Maximize => self.value > other.value,
            Direction::Minimize => self.value < other.value,
        }
    }
}

/// Reference and candidate result for one benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkPair {
    pub name: String,
    pub reference: f64,
    pub current: f64,
}

impl BenchmarkPair {
    pub fn new(name: impl Into<String>, reference: f64, current: f64) -> Self {
        Self {
            name: name.into(),
            reference,
            current,
        }
    }

    pub fn diff(&self) -> f64 {
        (self.current - self.reference).abs()
    }

    pub fn speedup(&self) -> f64 {
        self.current / self.reference
    }
}

/// Pair up `benchmarks` between the reference set and a fresh sample.
pub fn pair_results(
    reference: &SampleSet,
    current: &SampleSet,
    benchmarks: &[String],
) -> Result<Vec<BenchmarkPair>> {
    benchmarks
        .iter()
        .map(|name| -> Result<BenchmarkPair> {
            Ok(BenchmarkPair {
                name: name.clone(),
                reference: reference.result(name)?,
                current: current.result(name)?,
            })
        })
        .collect()
}

/// How paired results are reduced to one objective value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    /// Closeness to absolute target results. Higher is better.
    Accuracy,
    /// Mean ratio to base results, reflected about 1.0. Lower is better.
    Speedup,
}

impl ScoreMode {
    pub fn direction(&self) -> Direction {
        match self {
            ScoreMode::Accuracy => Direction::Maximize,
            ScoreMode::Speedup => Direction::Minimize,
        }
    }

    pub fn score(&self, pairs: &[BenchmarkPair]) -> Result<ScoreResult> {
        let value = match self {
            ScoreMode::Accuracy => accuracy_score(pairs)?,
            ScoreMode::Speedup => speedup_score(pairs)?,
        };
        Ok(ScoreResult {
            value,
            direction: self.direction(),
        })
    }
}

impl fmt::Display for ScoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreMode::Accuracy => f.write_str("accuracy"),
            ScoreMode::Speedup => f.write_str("speedup"),
        }
    }
}

fn ensure_finite(value: f64, what: &str, pairs: &[BenchmarkPair]) -> Result<f64> {
    if value.is_finite() {
        return Ok(value);
    }
    let detail = pairs
        .iter()
        .map(|p| format!("{}: reference={} current={}", p.name, p.reference, p.current))
        .collect::<Vec<_>>()
        .join(", ");
    Err(PortaError::NonFiniteScore(format!("{} = {} ({})", what, value, detail)))
}

/// `1000 / (mean |current - reference| + 1)`.
pub fn accuracy_score(pairs: &[BenchmarkPair]) -> Result<f64> {
    if pairs.is_empty() {
        return Err(PortaError::NoBenchmarks("accuracy score".to_string()));
    }
    let diff_mean = pairs.iter().map(BenchmarkPair::diff).sum::<f64>() / pairs.len() as f64;
    ensure_finite(ACCURACY_SCALE / (diff_mean + ACCURACY_ZERO_GUARD), "accuracy", pairs)
}

/// Mean of `current / reference`, reflected about 1.0 when below it.
pub fn speedup_score(pairs: &[BenchmarkPair]) -> Result<f64> {
    if pairs.is_empty() {
        return Err(PortaError::NoBenchmarks("speedup score".to_string()));
    }
    let speedup_mean = pairs.iter().map(BenchmarkPair::speedup).sum::<f64>() / pairs.len() as f64;
    ensure_finite(reflect_speedup(speedup_mean), "speedup", pairs)
}

/// Slowdowns are penalized like speedups of the same margin: 0.952 becomes 1.048.
pub fn reflect_speedup(speedup_mean: f64) -> f64 {
    if speedup_mean < 1.0 {
        1.0 + (1.0 - speedup_mean)
    } else {
        speedup_mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BenchmarkSample;

    #[test]
    fn test_accuracy_perfect_match_is_finite() {
        let pairs = vec![BenchmarkPair::new("a", 5.0, 5.0)];
        assert_eq!(accuracy_score(&pairs).unwrap(), 1000.0);
    }

    #[test]
    fn test_accuracy_decreases_with_diff() {
        let near = accuracy_score(&[BenchmarkPair::new("a", 100.0, 101.0)]).unwrap();
        let far = accuracy_score(&[BenchmarkPair::new("a", 100.0, 130.0)]).unwrap();
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn test_reflect_speedup() {
        assert_eq!(reflect_speedup(1.0), 1.0);
        assert!((reflect_speedup(0.9) - 1.1).abs() < 1e-12);
        assert_eq!(reflect_speedup(1.2), 1.2);
    }

    #[test]
    fn test_speedup_zero_base_is_not_finite() {
        let pairs = vec![BenchmarkPair::new("a", 0.0, 5.0)];
        assert!(matches!(
            speedup_score(&pairs),
            Err(PortaError::NonFiniteScore(_))
        ));
    }

    #[test]
    fn test_empty_pairs() {
        assert!(matches!(accuracy_score(&[]), Err(PortaError::NoBenchmarks(_))));
        assert!(matches!(
            ScoreMode::Speedup.score(&[]),
            Err(PortaError::NoBenchmarks(_))
        ));
    }

    #[test]
    fn test_strict_comparison() {
        let a = ScoreResult {
            value: 1.5,
            direction: Direction::Minimize,
        };
        let b = ScoreResult {
            value: 1.5,
            direction: Direction::Minimize,
        };
        assert!(!a.is_better_than(&b));

        let lower = ScoreResult { value: 1.2, ..a };
        assert!(lower.is_better_than(&a));
        assert!(!a.is_better_than(&lower));

        let high = ScoreResult {
            value: 90.0,
            direction: Direction::Maximize,
        };
        let low = ScoreResult { value: 80.0, ..high };
        assert!(high.is_better_than(&low));
    }

    #[test]
    fn test_pair_results_missing_current() {
        let reference = SampleSet::new(vec![BenchmarkSample::new("a", "processor", 1.0)]);
        let current = SampleSet::default();
        assert!(matches!(
            pair_results(&reference, &current, &["a".to_string()]),
            Err(PortaError::IncompleteResult(_))
        ));
    }
}
