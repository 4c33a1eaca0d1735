use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::{EvaluationRecord, SessionState};

/// How the parameters file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Append the JSON object to any existing content, without a newline.
    Append,
    /// Replace the file with the JSON object and a trailing newline.
    Truncate,
}

/// Write the tuned parameters as one flat JSON object.
pub fn write_parameters(
    path: &Path,
    parameters: &BTreeMap<String, i64>,
    mode: WriteMode,
) -> Result<()> {
    let json = serde_json::to_string(parameters)?;
    match mode {
        WriteMode::Append => {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(json.as_bytes())?;
        }
        WriteMode::Truncate => {
            let mut file = File::create(path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Write every evaluation to a CSV file.
pub fn write_trace_csv(records: &[EvaluationRecord], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "category",
        "iteration",
        "configuration",
        "score",
        "outcome",
        "attempts",
        "cached",
    ])?;

    for record in records {
        wtr.write_record([
            record.category.to_string(),
            record.iteration.to_string(),
            record.configuration.display(),
            format!("{:.6}", record.score),
            record.outcome.as_str().to_string(),
            record.attempts.to_string(),
            record.cached.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Print the best configuration of every tuned category.
pub fn print_summary(state: &SessionState) {
    println!("\n=== Tuned Parameters ===\n");

    for category in state.categories() {
        let Some(best) = state.best(*category) else {
            continue;
        };
        let evaluations = state.history_for(*category).count();
        let runs: u32 = state.history_for(*category).map(|r| r.attempts).sum();

        println!(
            "{:<10} {}  score={:.4}  ({} evaluations, {} benchmark runs)",
            category,
            best.configuration.display(),
            best.score.value,
            evaluations,
            runs
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Configuration};
    use crate::tuner::search::Outcome;
    use tempfile::TempDir;

    fn params() -> BTreeMap<String, i64> {
        let mut p = BTreeMap::new();
        p.insert("cpu-quota".to_string(), 20000);
        p.insert("mem-bw-limit".to_string(), 640);
        p
    }

    #[test]
    fn test_truncate_writes_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parameters.json");
        std::fs::write(&path, "stale content").unwrap();

        write_parameters(&path, &params(), WriteMode::Truncate).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"cpu-quota\":20000,\"mem-bw-limit\":640}\n");
    }

    #[test]
    fn test_append_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parameters.json");

        write_parameters(&path, &params(), WriteMode::Append).unwrap();
        write_parameters(&path, &params(), WriteMode::Append).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let one = "{\"cpu-quota\":20000,\"mem-bw-limit\":640}";
        assert_eq!(content, format!("{}{}", one, one));
    }

    #[test]
    fn test_trace_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trace.csv");
        let records = vec![EvaluationRecord {
            category: Category::Processor,
            iteration: 1,
            configuration: Configuration::new().with_value("cpu-quota", 50000),
            score: 1.25,
            outcome: Outcome::Anchored,
            attempts: 2,
            cached: false,
        }];

        write_trace_csv(&records, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("category,iteration,configuration,score,outcome,attempts,cached")
        );
        assert_eq!(
            lines.next(),
            Some("processor,1,cpu-quota=50000,1.250000,anchored,2,false")
        );
    }
}
