use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Category, Parameter, SearchSpace};
use crate::tuner::constants::DEFAULT_CPU_PERIOD;
use crate::tuner::evaluation::ScoreMode;
use crate::tuner::output::WriteMode;
use crate::tuner::policy::RetryPolicy;

/// (min, max) of the tuned parameter for each category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryBounds {
    /// cpu-quota range
    pub processor: (i64, i64),
    /// mem-bw-limit range
    pub memory: (i64, i64),
}

impl Default for CategoryBounds {
    fn default() -> Self {
        Profile::Base.bounds()
    }
}

impl CategoryBounds {
    pub fn get(&self, category: Category) -> (i64, i64) {
        match category {
            Category::Processor => self.processor,
            Category::Memory => self.memory,
        }
    }

    pub fn with(mut self, category: Category, bounds: (i64, i64)) -> Self {
        match category {
            Category::Processor => self.processor = bounds,
            Category::Memory => self.memory = bounds,
        }
        self
    }

    /// The one-parameter search space for `category`.
    pub fn search_space(&self, category: Category) -> Result<SearchSpace> {
        let (lo, hi) = self.get(category);
        Ok(SearchSpace::new().add_parameter(Parameter::new(category.parameter_name(), lo, hi)?))
    }
}

/// Presets for the two deployments the tuner is used in.
///
/// `Target` matches a machine against absolute target results; `Base`
/// matches relative speed against results from a base machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Target,
    #[default]
    Base,
}

impl Profile {
    pub fn bounds(&self) -> CategoryBounds {
        match self {
            Profile::Target => CategoryBounds {
                processor: (5000, 100_000),
                memory: (10, 350),
            },
            Profile::Base => CategoryBounds {
                processor: (5000, 50_000),
                memory: (100, 2000),
            },
        }
    }

    pub fn score_mode(&self) -> ScoreMode {
        match self {
            Profile::Target => ScoreMode::Accuracy,
            Profile::Base => ScoreMode::Speedup,
        }
    }

    pub fn write_mode(&self) -> WriteMode {
        match self {
            Profile::Target => WriteMode::Append,
            Profile::Base => WriteMode::Truncate,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Profile::Target => RetryPolicy::single_attempt(),
            Profile::Base => RetryPolicy::unbounded(),
        }
    }

    pub fn reference_file(&self) -> &'static str {
        match self {
            Profile::Target => "target.json",
            Profile::Base => "base.json",
        }
    }

    pub fn cpu_period(&self) -> Option<u64> {
        match self {
            Profile::Target => None,
            Profile::Base => Some(DEFAULT_CPU_PERIOD),
        }
    }

    pub fn wrapper_args(&self) -> Vec<String> {
        match self {
            Profile::Target => Vec::new(),
            Profile::Base => vec!["1000".to_string()],
        }
    }

    /// Whether memory runs reuse the cpu quota tuned for the processor.
    pub fn pins_cpu_quota(&self) -> bool {
        matches!(self, Profile::Base)
    }

    pub fn default_benchmarks(&self) -> Vec<String> {
        let names: &[&str] = match self {
            Profile::Target => &["stream-copy", "crafty"],
            Profile::Base => &[
                "stream-copy",
                "stream-add",
                "stream-scale",
                "stream-triad",
                "crafty",
                "c-ray",
            ],
        };
        names.iter().map(|s| s.to_string()).collect()
    }
}
