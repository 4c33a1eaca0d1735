use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PortaError, Result};
use crate::models::Category;

/// A single named benchmark result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSample {
    pub name: String,

    #[serde(default)]
    pub class: String,

    #[serde(deserialize_with = "deserialize_result")]
    pub result: f64,
}

impl BenchmarkSample {
    pub fn new(name: impl Into<String>, class: impl Into<String>, result: f64) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            result,
        }
    }
}

/// Benchmark output keyed by name: `{"crafty": {"class": ..., "result": ...}}`.
#[derive(Deserialize)]
struct KeyedRecord {
    #[serde(default)]
    class: String,
    #[serde(deserialize_with = "deserialize_result")]
    result: f64,
}

/// Results are emitted either as numbers or as numeric strings.
fn deserialize_result<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("non-numeric result '{}'", s))),
    }
}

/// An ordered collection of benchmark results from one run.
///
/// File order is kept. When a name appears twice the first entry wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SampleSet {
    samples: Vec<BenchmarkSample>,
}

/// Results taken once against the reference system and only read afterwards.
pub type ReferenceSet = SampleSet;

impl SampleSet {
    pub fn new(samples: Vec<BenchmarkSample>) -> Self {
        Self { samples }
    }

    /// Parse benchmark JSON in either the keyed or the ordered record shape.
    pub fn parse(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text)?;
        Self::from_value(document)
    }

    pub fn from_value(document: Value) -> Result<Self> {
        let samples = match document {
            Value::Array(records) => records
                .into_iter()
                .map(serde_json::from_value::<BenchmarkSample>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| PortaError::MalformedOutput(e.to_string()))?,
            Value::Object(map) => map
                .into_iter()
                .map(|(name, record)| -> Result<BenchmarkSample> {
                    let record: KeyedRecord = serde_json::from_value(record).map_err(|e| {
                        PortaError::MalformedOutput(format!("benchmark {}: {}", name, e))
                    })?;
                    Ok(BenchmarkSample {
                        name,
                        class: record.class,
                        result: record.result,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(PortaError::MalformedOutput(format!(
                    "expected an object or array of benchmark results, got {}",
                    json_kind(&other)
                )))
            }
        };
        Ok(Self { samples })
    }

    pub fn get(&self, name: &str) -> Option<&BenchmarkSample> {
        self.samples.iter().find(|s| s.name == name)
    }

    /// Result for `name`, or `IncompleteResult` if the run did not report it.
    pub fn result(&self, name: &str) -> Result<f64> {
        self.get(name)
            .map(|s| s.result)
            .ok_or_else(|| PortaError::IncompleteResult(name.to_string()))
    }

    /// First of `expected` that has no result here.
    pub fn first_missing<'a>(&self, expected: &'a [String]) -> Option<&'a str> {
        expected
            .iter()
            .find(|name| self.get(name).is_none())
            .map(String::as_str)
    }

    /// Requested benchmarks whose class matches `category`, in set order.
    pub fn benchmarks_for_category(&self, requested: &[String], category: Category) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for sample in &self.samples {
            if sample.class == category.as_str()
                && requested.iter().any(|r| *r == sample.name)
                && !names.contains(&sample.name)
            {
                names.push(sample.name.clone());
            }
        }
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &BenchmarkSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
