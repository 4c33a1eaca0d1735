use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{PortaError, Result};
use crate::models::ReferenceSet;

/// Load reference results from a JSON file.
///
/// Accepts either a mapping `name -> {class, result}` or an array of
/// `{name, class, result}` records.
pub fn load_reference<P: AsRef<Path>>(path: P) -> Result<ReferenceSet> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let reference = ReferenceSet::parse(&content).map_err(|e| match e {
        PortaError::Json(err) => {
            PortaError::MalformedOutput(format!("{}: {}", path.display(), err))
        }
        other => other,
    })?;

    info!(path = %path.display(), benchmarks = reference.len(), "loaded reference results");
    Ok(reference)
}
