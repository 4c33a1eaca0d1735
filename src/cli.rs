use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::error::{PortaError, Result};

use crate::tuner::constants::{DEFAULT_CPUSET, DEFAULT_IMAGE, DEFAULT_SEED, DEFAULT_TEST_LIMIT};
use crate::tuner::{Profile, ScoreMode, WriteMode};

/// Auto-tunes container resource limits so a workload reproduces a
/// reference benchmark profile on another machine.
#[derive(Parser, Debug)]
#[command(name = "porta")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the benchmarks once, unrestricted, and print their raw output.
    Base(BaseArgs),

    /// Tune resource limits per category to match reference results.
    Tune(TuneArgs),
}

#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Benchmarks to execute.
    #[arg(long, num_args = 1.., default_values = ["stream-copy", "crafty"])]
    pub benchmarks: Vec<String>,

    /// Benchmark container image.
    #[arg(long, default_value = DEFAULT_IMAGE)]
    pub image: String,

    /// CPUs the container is pinned to.
    #[arg(long, default_value = DEFAULT_CPUSET)]
    pub cpuset: String,

    /// Kill the benchmark after this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Args, Debug)]
pub struct TuneArgs {
    /// Deployment preset supplying defaults for every option below.
    #[arg(long, value_enum, default_value_t = Profile::Base)]
    pub profile: Profile,

    /// Categories to tune, in order (processor, memory).
    #[arg(long, num_args = 1.., default_values = ["processor", "memory"])]
    pub categories: Vec<String>,

    /// Benchmarks to execute [default: the profile's list].
    #[arg(long, num_args = 1..)]
    pub benchmarks: Option<Vec<String>>,

    /// JSON file with the reference results [default: base.json or target.json].
    #[arg(long, aliases = ["base-file", "target-file"])]
    pub reference_file: Option<PathBuf>,

    /// Output JSON file for the tuned parameters.
    #[arg(long, default_value = "parameters.json")]
    pub output_file: PathBuf,

    /// How the output file is written [default: from profile].
    #[arg(long, value_enum)]
    pub write_mode: Option<WriteMode>,

    /// Objective used to compare runs [default: from profile].
    #[arg(long, value_enum)]
    pub score_mode: Option<ScoreMode>,

    /// cpu-quota range as MIN:MAX.
    #[arg(long, value_parser = parse_bounds)]
    pub processor_bounds: Option<(i64, i64)>,

    /// mem-bw-limit range as MIN:MAX.
    #[arg(long, value_parser = parse_bounds)]
    pub memory_bounds: Option<(i64, i64)>,

    /// cpu quota for memory runs (replaced by the tuned value when the
    /// processor category runs first under the base profile).
    #[arg(long)]
    pub cpu_quota: Option<i64>,

    /// Scheduling period passed with the cpu quota [default: from profile].
    #[arg(long)]
    pub cpu_period: Option<u64>,

    /// Benchmark container image.
    #[arg(long, default_value = DEFAULT_IMAGE)]
    pub image: String,

    /// CPUs the container is pinned to.
    #[arg(long, default_value = DEFAULT_CPUSET)]
    pub cpuset: String,

    /// Candidates evaluated per category.
    #[arg(long, default_value_t = DEFAULT_TEST_LIMIT)]
    pub test_limit: usize,

    /// Stop a category's search after this many seconds.
    #[arg(long)]
    pub stop_after: Option<f64>,

    /// Stop after this many consecutive non-improving candidates.
    #[arg(long)]
    pub stall_limit: Option<usize>,

    /// Stop once the step size (fraction of the range) drops below this.
    #[arg(long)]
    pub min_step_size: Option<f64>,

    /// Attempts per command when output is incomplete [default: from profile;
    /// base retries forever].
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Initial delay between attempts, doubled on each retry.
    #[arg(long, default_value_t = 0)]
    pub retry_backoff_ms: u64,

    /// Randomize retry delays.
    #[arg(long)]
    pub retry_jitter: bool,

    /// Kill a benchmark run after this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Write every evaluation to this CSV file.
    #[arg(long)]
    pub trace_csv: Option<PathBuf>,

    /// Random seed for retry jitter.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Show the result of each benchmark for every evaluation.
    #[arg(long)]
    pub show_bench_results: bool,
}

impl TuneArgs {
    /// `--stop-after` as a duration; negative, NaN or huge values are rejected.
    pub fn stop_after_duration(&self) -> Result<Option<Duration>> {
        self.stop_after
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|e| {
                    PortaError::InvalidInput(format!("--stop-after {}: {}", secs, e))
                })
            })
            .transpose()
    }
}

/// Parse `MIN:MAX` into a pair of integers.
pub fn parse_bounds(s: &str) -> std::result::Result<(i64, i64), String> {
    let (lo, hi) = s
        .split_once(':')
        .ok_or_else(|| format!("expected MIN:MAX, got '{}'", s))?;
    let lo: i64 = lo
        .trim()
        .parse()
        .map_err(|_| format!("invalid minimum '{}'", lo))?;
    let hi: i64 = hi
        .trim()
        .parse()
        .map_err(|_| format!("invalid maximum '{}'", hi))?;
    if lo >= hi {
        return Err(format!("minimum {} must be below maximum {}", lo, hi));
    }
    Ok((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bounds() {
        assert_eq!(parse_bounds("5000:50000"), Ok((5000, 50000)));
        assert_eq!(parse_bounds(" 10 : 350 "), Ok((10, 350)));
        assert!(parse_bounds("5000").is_err());
        assert!(parse_bounds("a:b").is_err());
        assert!(parse_bounds("10:10").is_err());
    }

    #[test]
    fn test_tune_defaults() {
        let cli = Cli::parse_from(["porta", "tune"]);
        let Command::Tune(args) = cli.command else {
            panic!("expected tune");
        };
        assert_eq!(args.profile, Profile::Base);
        assert_eq!(args.categories, vec!["processor", "memory"]);
        assert!(args.benchmarks.is_none());
        assert_eq!(args.test_limit, DEFAULT_TEST_LIMIT);
    }

    #[test]
    fn test_tune_flags() {
        let cli = Cli::parse_from([
            "porta",
            "tune",
            "--profile",
            "target",
            "--categories",
            "memory",
            "--benchmarks",
            "stream-copy",
            "stream-add",
            "--target-file",
            "t.json",
            "--memory-bounds",
            "10:350",
            "--write-mode",
            "truncate",
            "--show-bench-results",
        ]);
        let Command::Tune(args) = cli.command else {
            panic!("expected tune");
        };
        assert_eq!(args.profile, Profile::Target);
        assert_eq!(args.categories, vec!["memory"]);
        assert_eq!(
            args.benchmarks,
            Some(vec!["stream-copy".to_string(), "stream-add".to_string()])
        );
        assert_eq!(args.reference_file, Some(PathBuf::from("t.json")));
        assert_eq!(args.memory_bounds, Some((10, 350)));
        assert_eq!(args.write_mode, Some(WriteMode::Truncate));
        assert!(args.show_bench_results);
    }

    fn tune_args(extra: &[&str]) -> TuneArgs {
        let mut argv = vec!["porta", "tune"];
        argv.extend_from_slice(extra);
        let Command::Tune(args) = Cli::parse_from(argv).command else {
            panic!("expected tune");
        };
        args
    }

    #[test]
    fn test_stop_after_duration() {
        assert_eq!(tune_args(&[]).stop_after_duration().unwrap(), None);
        assert_eq!(
            tune_args(&["--stop-after", "1.5"]).stop_after_duration().unwrap(),
            Some(Duration::from_millis(1500))
        );
        for bad in ["-1", "NaN", "1e300"] {
            let flag = format!("--stop-after={}", bad);
            let args = tune_args(&[flag.as_str()]);
            assert!(
                matches!(args.stop_after_duration(), Err(PortaError::InvalidInput(_))),
                "accepted --stop-after {}",
                bad
            );
        }
    }
}
