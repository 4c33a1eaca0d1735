use porta::models::{Configuration, SearchSpace};
use porta::tuner::constants::INITIAL_STEP_SIZE;
use porta::tuner::{Direction, MonotonicSearch, Outcome, ScoreResult};

fn search(lo: i64, hi: i64) -> MonotonicSearch {
    let space = SearchSpace::new().add_int("knob", lo, hi).unwrap();
    MonotonicSearch::new(&space).unwrap()
}

fn value(config: &Configuration) -> i64 {
    config.get("knob").unwrap()
}

fn minimize(value: f64) -> ScoreResult {
    ScoreResult {
        value,
        direction: Direction::Minimize,
    }
}

fn maximize(value: f64) -> ScoreResult {
    ScoreResult {
        value,
        direction: Direction::Maximize,
    }
}

#[test]
fn test_first_candidate_is_upper_bound() {
    for (lo, hi) in [(0, 1), (5000, 50000), (5000, 100000), (10, 350), (-40, 40)] {
        let mut s = search(lo, hi);
        assert_eq!(value(&s.next_candidate()), hi, "bounds [{}, {}]", lo, hi);
    }
}

#[test]
fn test_saturates_at_lower_bound() {
    let (lo, hi) = (100, 2000);
    let mut s = search(lo, hi);

    for _ in 0..40 {
        let candidate = s.next_candidate();
        let v = value(&candidate);
        assert!(v >= lo && v <= hi, "value {} escaped bounds", v);
        // Lower values always score better, pulling the search to the floor.
        s.report(minimize(v as f64)).unwrap();
    }

    assert_eq!(value(&s.best().unwrap().configuration), lo);
}

#[test]
fn test_never_exceeds_upper_bound_when_going_up() {
    let (lo, hi) = (10, 350);
    let mut s = search(lo, hi);

    // Anchor at max, then make the first step down worse so the search turns up.
    s.next_candidate();
    s.report(maximize(1.0)).unwrap();
    s.next_candidate();
    assert_eq!(s.report(maximize(0.5)).unwrap(), Outcome::Reversed);
    assert!(!s.go_down());

    for _ in 0..10 {
        let v = value(&s.next_candidate());
        assert!(v <= hi && v >= lo);
        s.report(maximize(0.0)).unwrap();
    }
}

#[test]
fn test_step_size_only_decays() {
    let mut s = search(0, 100_000);
    let mut previous_step = s.step_size();
    let mut previous_dir = s.go_down();

    // Alternate between improving and not improving.
    s.next_candidate();
    s.report(minimize(1000.0)).unwrap();
    let mut best = 1000.0;

    for i in 0..30 {
        s.next_candidate();
        let score = if i % 3 == 0 { best - 1.0 } else { best + 1.0 };
        let outcome = s.report(minimize(score)).unwrap();

        match outcome {
            Outcome::Improved => {
                best = score;
                assert_eq!(s.step_size(), previous_step);
                assert_eq!(s.go_down(), previous_dir);
            }
            Outcome::Reversed => {
                assert_eq!(s.step_size(), previous_step / 2.0);
                assert_eq!(s.go_down(), !previous_dir);
            }
            Outcome::Anchored => panic!("only the first report anchors"),
        }
        assert!(s.step_size() <= previous_step);
        previous_step = s.step_size();
        previous_dir = s.go_down();
    }

    assert!(s.step_size() < INITIAL_STEP_SIZE);
}

#[test]
fn test_identical_scores_are_not_better() {
    let mut s = search(0, 1000);
    s.next_candidate();
    s.report(maximize(42.0)).unwrap();
    s.next_candidate();

    assert_eq!(s.report(maximize(42.0)).unwrap(), Outcome::Reversed);
    assert_eq!(s.step_size(), INITIAL_STEP_SIZE / 2.0);
    assert_eq!(value(&s.best().unwrap().configuration), 1000);
}

#[test]
fn test_converges_on_unimodal_objective() {
    let (lo, hi) = (5000, 50000);
    let optimum = 20000.0;
    let mut s = search(lo, hi);

    for _ in 0..30 {
        let v = value(&s.next_candidate()) as f64;
        s.report(minimize((v - optimum).abs())).unwrap();
    }

    let best = value(&s.best().unwrap().configuration);
    assert!((best - 20000).abs() < 1000, "best {} too far from optimum", best);
}
