use assert_float_eq::assert_float_absolute_eq;

use porta::models::{BenchmarkSample, SampleSet};
use porta::tuner::{
    accuracy_score, pair_results, reflect_speedup, speedup_score, BenchmarkPair, Direction,
    ScoreMode,
};

fn set(entries: &[(&str, f64)]) -> SampleSet {
    SampleSet::new(
        entries
            .iter()
            .map(|(name, result)| BenchmarkSample::new(*name, "processor", *result))
            .collect(),
    )
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_accuracy_worked_example() {
    let reference = set(&[("A", 100.0), ("B", 200.0)]);
    let current = set(&[("A", 110.0), ("B", 190.0)]);
    let pairs = pair_results(&reference, &current, &names(&["A", "B"])).unwrap();

    let score = ScoreMode::Accuracy.score(&pairs).unwrap();
    assert_eq!(score.direction, Direction::Maximize);
    assert_float_absolute_eq!(score.value, 1000.0 / 11.0, 1e-9);
}

#[test]
fn test_speedup_worked_example() {
    let reference = set(&[("A", 100.0)]);
    let current = set(&[("A", 80.0)]);
    let pairs = pair_results(&reference, &current, &names(&["A"])).unwrap();

    let score = ScoreMode::Speedup.score(&pairs).unwrap();
    assert_eq!(score.direction, Direction::Minimize);
    assert_float_absolute_eq!(score.value, 1.2, 1e-9);
}

#[test]
fn test_reflection_table() {
    assert_float_absolute_eq!(reflect_speedup(1.0), 1.0, 1e-12);
    assert_float_absolute_eq!(reflect_speedup(0.9), 1.1, 1e-12);
    assert_float_absolute_eq!(reflect_speedup(1.2), 1.2, 1e-12);
}

#[test]
fn test_speedup_averages_before_reflecting() {
    // 0.5 and 1.3 average to 0.9, which reflects to 1.1.
    let pairs = vec![
        BenchmarkPair::new("A", 100.0, 50.0),
        BenchmarkPair::new("B", 100.0, 130.0),
    ];
    assert_float_absolute_eq!(speedup_score(&pairs).unwrap(), 1.1, 1e-9);
}

#[test]
fn test_accuracy_strictly_decreasing_in_mean_diff() {
    let mut previous = f64::INFINITY;
    for diff in [0.0, 0.5, 1.0, 10.0, 1000.0, 1e9] {
        let score = accuracy_score(&[BenchmarkPair::new("A", 0.0, diff)]).unwrap();
        assert!(score.is_finite() && score > 0.0);
        assert!(score < previous, "score {} not below {}", score, previous);
        previous = score;
    }
}

#[test]
fn test_accuracy_ignores_sign_of_difference() {
    let over = accuracy_score(&[BenchmarkPair::new("A", 100.0, 120.0)]).unwrap();
    let under = accuracy_score(&[BenchmarkPair::new("A", 100.0, 80.0)]).unwrap();
    assert_eq!(over, under);
}
