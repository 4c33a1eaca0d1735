use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use porta::cli::{BaseArgs, Cli, Command, TuneArgs};
use porta::error::Result;
use porta::models::Category;
use porta::sampler::{DockerCommandBuilder, ProcessSampler, Sampler};
use porta::state::load_reference;
use porta::tuner::{
    print_summary, write_parameters, write_trace_csv, CategoryBounds, RetryPolicy,
    SessionConfig, StopPolicy, TuningSession,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Base(args) => cmd_base(args),
        Command::Tune(args) => cmd_tune(args),
    }
}

/// Run the benchmarks once without limits and print the raw results.
fn cmd_base(args: BaseArgs) -> Result<()> {
    let builder = DockerCommandBuilder {
        image: args.image,
        cpuset: args.cpuset,
        ..Default::default()
    };
    let command = builder.reference_command(&args.benchmarks);

    let mut sampler = ProcessSampler::new().with_timeout(args.timeout_secs.map(Duration::from_secs));
    let output = sampler.execute(&command)?;
    print!("{}", output.stdout);
    Ok(())
}

/// Tune every requested category and write the merged parameters.
fn cmd_tune(args: TuneArgs) -> Result<()> {
    let profile = args.profile;
    let categories = Category::parse_list(&args.categories)?;

    let reference_file = args
        .reference_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(profile.reference_file()));
    let reference = load_reference(&reference_file)?;

    let mut bounds: CategoryBounds = profile.bounds();
    if let Some(b) = args.processor_bounds {
        bounds = bounds.with(Category::Processor, b);
    }
    if let Some(b) = args.memory_bounds {
        bounds = bounds.with(Category::Memory, b);
    }

    let mut retry: RetryPolicy = profile
        .retry_policy()
        .with_backoff(Duration::from_millis(args.retry_backoff_ms));
    if args.max_attempts.is_some() {
        retry = retry.with_max_attempts(args.max_attempts);
    }
    retry.jitter = args.retry_jitter;

    let max_duration = args.stop_after_duration()?;

    let stop = StopPolicy {
        max_evaluations: Some(args.test_limit),
        max_duration,
        stall_limit: args.stall_limit,
        min_step_size: args.min_step_size,
    };

    let config = SessionConfig {
        categories,
        benchmarks: args.benchmarks.unwrap_or_else(|| profile.default_benchmarks()),
        bounds,
        score_mode: args.score_mode.unwrap_or(profile.score_mode()),
        retry,
        stop,
        show_bench_results: args.show_bench_results,
        seed: args.seed,
    };

    let builder = DockerCommandBuilder {
        image: args.image,
        cpuset: args.cpuset,
        cpu_period: args.cpu_period.or(profile.cpu_period()),
        wrapper_args: profile.wrapper_args(),
        cpu_quota: args.cpu_quota,
        pin_cpu_quota: profile.pins_cpu_quota(),
        ..Default::default()
    };
    let sampler = ProcessSampler::new().with_timeout(args.timeout_secs.map(Duration::from_secs));

    info!(
        profile = ?profile,
        reference = %reference_file.display(),
        categories = config.categories.len(),
        "starting tuning session"
    );

    let session = TuningSession::new(config, &reference, sampler, builder)?;
    let state = session.run()?;

    print_summary(&state);

    if let Some(path) = &args.trace_csv {
        write_trace_csv(state.history(), path)?;
        println!("Wrote evaluation trace to {:?}", path);
    }

    let write_mode = args.write_mode.unwrap_or(profile.write_mode());
    write_parameters(&args.output_file, &state.merged_parameters(), write_mode)?;
    println!("Wrote parameters to {:?}", args.output_file);

    Ok(())
}
