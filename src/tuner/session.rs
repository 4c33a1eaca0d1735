use std::collections::HashMap;
use std::thread;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::error::{PortaError, Result};
use crate::models::{Category, Configuration, ReferenceSet, SampleSet};
use crate::sampler::{CommandBuilder, Sampler};
use crate::state::{EvaluationRecord, SessionState};
use crate::tuner::constants::DEFAULT_SEED;
use crate::tuner::evaluation::{pair_results, ScoreMode, ScoreResult};
use crate::tuner::policy::{RetryPolicy, SearchProgress, StopPolicy};
use crate::tuner::profile::{CategoryBounds, Profile};
use crate::tuner::search::{Evaluation, MonotonicSearch, Outcome};

/// Configuration for a tuning session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Tuned in this order.
    pub categories: Vec<Category>,
    /// Benchmarks to consider; each category uses those of its class.
    pub benchmarks: Vec<String>,
    pub bounds: CategoryBounds,
    pub score_mode: ScoreMode,
    pub retry: RetryPolicy,
    pub stop: StopPolicy,
    /// Log every benchmark result at info level instead of debug.
    pub show_bench_results: bool,
    /// Seed for retry jitter.
    pub seed: u64,
}

impl SessionConfig {
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            benchmarks: profile.default_benchmarks(),
            bounds: profile.bounds(),
            score_mode: profile.score_mode(),
            retry: profile.retry_policy(),
            stop: StopPolicy::default(),
            show_bench_results: false,
            seed: DEFAULT_SEED,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}

/// A category with everything its search needs, checked before any run.
struct CategoryPlan {
    category: Category,
    benchmarks: Vec<String>,
    search: MonotonicSearch,
}

/// Tunes one parameter per category against a fixed reference set.
pub struct TuningSession<'a, S, B> {
    config: SessionConfig,
    reference: &'a ReferenceSet,
    sampler: S,
    builder: B,
    state: SessionState,
    rng: StdRng,
}

impl<'a, S: Sampler, B: CommandBuilder> TuningSession<'a, S, B> {
    pub fn new(
        config: SessionConfig,
        reference: &'a ReferenceSet,
        sampler: S,
        builder: B,
    ) -> Result<Self> {
        config.stop.validate()?;
        if config.categories.is_empty() {
            return Err(PortaError::InvalidInput(
                "no categories to tune".to_string(),
            ));
        }
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            reference,
            sampler,
            builder,
            state: SessionState::new(),
            rng,
        })
    }

    /// Tune every category in order and return the final state.
    ///
    /// All categories are validated first, so a misconfigured one aborts the
    /// session before any benchmark runs.
    pub fn run(mut self) -> Result<SessionState> {
        let plans = self
            .config
            .categories
            .clone()
            .into_iter()
            .map(|category| self.plan(category))
            .collect::<Result<Vec<_>>>()?;

        for plan in plans {
            self.tune(plan)?;
        }

        Ok(self.state)
    }

    /// Tune a single category and return its best evaluation.
    pub fn tune_category(&mut self, category: Category) -> Result<Evaluation> {
        let plan = self.plan(category)?;
        self.tune(plan)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    fn plan(&self, category: Category) -> Result<CategoryPlan> {
        let benchmarks = self
            .reference
            .benchmarks_for_category(&self.config.benchmarks, category);
        if benchmarks.is_empty() {
            return Err(PortaError::NoBenchmarks(category.to_string()));
        }
        let space = self.config.bounds.search_space(category)?;
        let search = MonotonicSearch::new(&space)?;
        Ok(CategoryPlan {
            category,
            benchmarks,
            search,
        })
    }

    fn tune(&mut self, plan: CategoryPlan) -> Result<Evaluation> {
        let CategoryPlan {
            category,
            benchmarks,
            mut search,
        } = plan;
        let parameter = search.parameter().clone();

        info!(
            %category,
            parameter = parameter.name(),
            min = parameter.min_value(),
            max = parameter.max_value(),
            benchmarks = %benchmarks.join(" "),
            mode = %self.config.score_mode,
            "tuning category"
        );

        let started = Instant::now();
        let mut cache: HashMap<Configuration, ScoreResult> = HashMap::new();
        let mut evaluations = 0;
        let mut since_improvement = 0;

        loop {
            let progress = SearchProgress {
                evaluations,
                elapsed: started.elapsed(),
                since_improvement,
                step_size: search.step_size(),
            };
            if let Some(reason) = self.config.stop.should_stop(&progress) {
                info!(%category, evaluations, %reason, "stopping search");
                break;
            }

            let candidate = search.next_candidate();
            let (score, attempts, cached) = match cache.get(&candidate) {
                Some(score) => (*score, 0, true),
                None => {
                    let (score, attempts) = self.evaluate(category, &benchmarks, &candidate)?;
                    cache.insert(candidate.clone(), score);
                    (score, attempts, false)
                }
            };

            let outcome = search.report(score)?;
            evaluations += 1;
            match outcome {
                Outcome::Anchored | Outcome::Improved => since_improvement = 0,
                Outcome::Reversed => since_improvement += 1,
            }

            debug!(
                %category,
                iteration = evaluations,
                candidate = %candidate.display(),
                score = score.value,
                outcome = outcome.as_str(),
                cached,
                step_size = search.step_size(),
                "evaluated candidate"
            );

            self.state.record(EvaluationRecord {
                category,
                iteration: evaluations,
                configuration: candidate,
                score: score.value,
                outcome,
                attempts,
                cached,
            });
        }

        let best = search.best().cloned().ok_or_else(|| {
            PortaError::InvalidInput(format!("no configuration evaluated for {}", category))
        })?;

        info!(
            %category,
            best = %best.configuration.display(),
            score = best.score.value,
            "category tuned"
        );

        self.builder.record_tuned(category, &best.configuration);
        self.state.set_best(category, best.clone());
        Ok(best)
    }

    /// Run and score one configuration. Returns the score and the number of
    /// benchmark invocations it took.
    fn evaluate(
        &mut self,
        category: Category,
        benchmarks: &[String],
        configuration: &Configuration,
    ) -> Result<(ScoreResult, u32)> {
        let command = self.builder.build(category, benchmarks, configuration)?;
        let (current, attempts) = self.sample_until_complete(&command, benchmarks)?;
        let pairs = pair_results(self.reference, &current, benchmarks)?;

        for pair in &pairs {
            if self.config.show_bench_results {
                info!(
                    benchmark = %pair.name,
                    result = pair.current,
                    reference = pair.reference,
                    speedup = pair.speedup(),
                    config = %configuration.display(),
                    "benchmark result"
                );
            } else {
                debug!(
                    benchmark = %pair.name,
                    result = pair.current,
                    reference = pair.reference,
                    "benchmark result"
                );
            }
        }

        let score = self.config.score_mode.score(&pairs)?;
        Ok((score, attempts))
    }

    /// Re-run `command` while its output is missing a benchmark, as far as the
    /// retry policy allows. Other errors are returned immediately.
    fn sample_until_complete(
        &mut self,
        command: &str,
        benchmarks: &[String],
    ) -> Result<(SampleSet, u32)> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match self.sampler.run(command, benchmarks) {
                Ok(samples) => return Ok((samples, attempts)),
                Err(PortaError::IncompleteResult(missing)) => {
                    if !self.config.retry.allows_retry(attempts) {
                        return Err(PortaError::RetriesExhausted {
                            command: command.to_string(),
                            attempts,
                            missing,
                        });
                    }
                    let delay = self.config.retry.delay(attempts, &mut self.rng);
                    warn!(
                        missing = %missing,
                        attempts,
                        ?delay,
                        "incomplete benchmark results, running again"
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
