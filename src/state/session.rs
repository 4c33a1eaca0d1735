use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Category, Configuration};
use crate::tuner::search::{Evaluation, Outcome};

/// One evaluated candidate, kept for the trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRecord {
    pub category: Category,
    /// 1-based position within the category's search.
    pub iteration: usize,
    pub configuration: Configuration,
    pub score: f64,
    pub outcome: Outcome,
    /// Benchmark invocations spent on this candidate (0 when cached).
    pub attempts: u32,
    pub cached: bool,
}

/// Best configuration per category and the history that led there.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    best: BTreeMap<Category, Evaluation>,
    order: Vec<Category>,
    history: Vec<EvaluationRecord>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: EvaluationRecord) {
        self.history.push(record);
    }

    /// Store the final result of a category's search.
    pub fn set_best(&mut self, category: Category, evaluation: Evaluation) {
        if self.best.insert(category, evaluation).is_none() {
            self.order.push(category);
        }
    }

    pub fn best(&self, category: Category) -> Option<&Evaluation> {
        self.best.get(&category)
    }

    /// Categories with a result, in the order they finished.
    pub fn categories(&self) -> &[Category] {
        &self.order
    }

    /// All best values flattened into one map; later categories win on clashes.
    pub fn merged_parameters(&self) -> BTreeMap<String, i64> {
        let mut merged = BTreeMap::new();
        for category in &self.order {
            if let Some(evaluation) = self.best.get(category) {
                for (name, value) in evaluation.configuration.iter() {
                    merged.insert(name.to_string(), value);
                }
            }
        }
        merged
    }

    pub fn history(&self) -> &[EvaluationRecord] {
        &self.history
    }

    /// History of a single category.
    pub fn history_for(&self, category: Category) -> impl Iterator<Item = &EvaluationRecord> {
        self.history.iter().filter(move |r| r.category == category)
    }

    /// Benchmark invocations across the whole session.
    pub fn total_attempts(&self) -> u32 {
        self.history.iter().map(|r| r.attempts).sum()
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuner::evaluation::{Direction, ScoreResult};

    fn evaluation(name: &str, value: i64) -> Evaluation {
        Evaluation {
            configuration: Configuration::new().with_value(name, value),
            score: ScoreResult {
                value: 1.0,
                direction: Direction::Minimize,
            },
        }
    }

    #[test]
    fn test_merged_parameters_flat() {
        let mut state = SessionState::new();
        state.set_best(Category::Processor, evaluation("cpu-quota", 20000));
        state.set_best(Category::Memory, evaluation("mem-bw-limit", 800));

        let merged = state.merged_parameters();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["cpu-quota"], 20000);
        assert_eq!(merged["mem-bw-limit"], 800);
        assert_eq!(state.categories(), &[Category::Processor, Category::Memory]);
    }

    #[test]
    fn test_empty_state() {
        let state = SessionState::new();
        assert!(state.is_empty());
        assert!(state.merged_parameters().is_empty());
        assert_eq!(state.total_attempts(), 0);
    }

    #[test]
    fn test_history_filters_by_category() {
        let mut state = SessionState::new();
        for (category, attempts) in [(Category::Processor, 2), (Category::Memory, 1)] {
            state.record(EvaluationRecord {
                category,
                iteration: 1,
                configuration: Configuration::new(),
                score: 1.0,
                outcome: Outcome::Anchored,
                attempts,
                cached: false,
            });
        }
        assert_eq!(state.history_for(Category::Memory).count(), 1);
        assert_eq!(state.total_attempts(), 3);
    }
}
