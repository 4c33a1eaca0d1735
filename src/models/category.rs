use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::error::PortaError;
use crate::tuner::constants::{CPU_QUOTA_PARAM, MEM_BW_PARAM, SUGGESTION_THRESHOLD};

/// A class of resource-control benchmark, each tuned through its own knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Processor,
    Memory,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Processor, Category::Memory];

    /// Name used on the command line and in the `class` field of results.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Processor => "processor",
            Category::Memory => "memory",
        }
    }

    /// Name of the parameter tuned for this category.
    pub fn parameter_name(&self) -> &'static str {
        match self {
            Category::Processor => CPU_QUOTA_PARAM,
            Category::Memory => MEM_BW_PARAM,
        }
    }

    /// Parse a list of category names, failing on the first unknown one.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Category>, PortaError> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PortaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        if let Some(category) = Category::ALL.iter().find(|c| c.as_str() == needle) {
            return Ok(*category);
        }

        let suggestion = Category::ALL
            .iter()
            .map(|c| (c.as_str(), jaro_winkler(&needle, c.as_str())))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, _)| name.to_string());

        Err(PortaError::UnknownCategory {
            name: s.to_string(),
            suggestion,
        })
    }
}
