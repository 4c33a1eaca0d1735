/// Initial step of the monotonic search, as a fraction of the unit range.
pub const INITIAL_STEP_SIZE: f64 = 0.15;

/// Numerator of the accuracy score.
pub const ACCURACY_SCALE: f64 = 1000.0;

/// Added to the mean absolute difference so a perfect match stays finite.
pub const ACCURACY_ZERO_GUARD: f64 = 1.0;

/// Parameter tuned for the processor category.
pub const CPU_QUOTA_PARAM: &str = "cpu-quota";

/// Parameter tuned for the memory category.
pub const MEM_BW_PARAM: &str = "mem-bw-limit";

/// Jaro-Winkler similarity required before suggesting a category name.
pub const SUGGESTION_THRESHOLD: f64 = 0.8;

// ─────────────────────────────────────────────────────────────────────────────
// Container invocation defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Benchmark image run for every sample.
pub const DEFAULT_IMAGE: &str = "ivotron/microbench";

/// CPUs the container is pinned to.
pub const DEFAULT_CPUSET: &str = "0";

/// Scheduling period paired with the cpu quota (microseconds).
pub const DEFAULT_CPU_PERIOD: u64 = 50_000;

/// Wrapper that applies a memory-bandwidth limit around `docker run`.
pub const MEMORY_WRAPPER: &str = "docker-run-wrapper";

// ─────────────────────────────────────────────────────────────────────────────
// Driver defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Candidates evaluated per category unless overridden.
pub const DEFAULT_TEST_LIMIT: usize = 30;

/// How often a running benchmark is polled for completion.
pub const PROCESS_POLL_INTERVAL_MS: u64 = 50;

/// Upper bound on a single retry backoff.
pub const MAX_RETRY_BACKOFF_MS: u64 = 30_000;

/// Bytes read from a benchmark's stdout or stderr per chunk.
pub const READ_CHUNK_BYTES: usize = 8192;

/// Seed for the retry jitter generator when none is given.
pub const DEFAULT_SEED: u64 = 123;
