// fdcsync/src/sync/sources.rs
use indexmap::IndexSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{Result, SyncError};
use crate::sync::overrides::PortionOverrides;

/// Reads an id list file: one id per line, surrounding whitespace ignored.
pub fn read_id_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
    Ok(text.lines().map(|line| line.trim().to_string()).collect())
}

/// Builds the list of fdc ids to process from the command line, the id list
/// file and the keys of the portion override file, in that order.
///
/// Blank ids are dropped. Repeats keep the position of their first occurrence.
pub fn resolve_fdc_ids(
    explicit: &[String],
    id_file: Option<&Path>,
    overrides: Option<&PortionOverrides>,
) -> Result<Vec<String>> {
    let mut candidates: Vec<String> = explicit.iter().map(|id| id.trim().to_string()).collect();

    if let Some(path) = id_file {
        let from_file = read_id_file(path)?;
        debug!("Read {} lines from {}", from_file.len(), path.display());
        candidates.extend(from_file);
    }

    if let Some(overrides) = overrides {
        candidates.extend(overrides.keys().cloned());
    }

    let total = candidates.len();
    let unique: IndexSet<String> = candidates.into_iter().filter(|id| !id.is_empty()).collect();
    info!(
        "Resolved {} unique fdc ids from {} candidates",
        unique.len(),
        total
    );
    Ok(unique.into_iter().collect())
}
