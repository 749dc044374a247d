// fdcsync/src/sync/overrides.rs
use indexmap::IndexMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::{Result, SyncError};
use crate::models::PortionEntry;

/// Manual portions keyed by fdc id, both in first-seen order.
pub type PortionOverrides = IndexMap<String, Vec<PortionEntry>>;

/// Reads a portion override file. A missing or unreadable file is fatal; a bad
/// row is not.
pub fn load_portion_overrides(path: &Path) -> Result<PortionOverrides> {
    let text = fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
    let overrides = parse_portion_overrides(&text);
    debug!(
        "Loaded manual portions for {} foods from {}",
        overrides.len(),
        path.display()
    );
    Ok(overrides)
}

/// Parses `fdc_id, gram_weight, unit, modifier` rows. There is no header and
/// no quoting. Every portion gets an amount of 1 and an empty description.
/// The trailing modifier column may be left off.
pub fn parse_portion_overrides(text: &str) -> PortionOverrides {
    let mut overrides = PortionOverrides::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line) {
            Ok((fdc_id, portion)) => overrides.entry(fdc_id).or_default().push(portion),
            Err(reason) => warn!("⚠️ Skipping portion override on line {}: {}", index + 1, reason),
        }
    }

    overrides
}

fn parse_row(line: &str) -> std::result::Result<(String, PortionEntry), String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let (fdc_id, gram_weight, unit, modifier) = match fields.as_slice() {
        [id, weight, unit] => (*id, *weight, *unit, ""),
        [id, weight, unit, modifier] => (*id, *weight, *unit, *modifier),
        _ => {
            return Err(format!(
                "expected 3 or 4 comma separated fields, found {}",
                fields.len()
            ));
        }
    };

    if fdc_id.is_empty() {
        return Err("missing fdc id".to_string());
    }
    if unit.is_empty() {
        return Err("missing unit".to_string());
    }
    let gram_weight: f64 = gram_weight
        .parse()
        .map_err(|_| format!("gram weight '{}' is not a number", gram_weight))?;
    if !gram_weight.is_finite() {
        return Err(format!("gram weight '{}' is not a finite number", gram_weight));
    }

    Ok((
        fdc_id.to_string(),
        PortionEntry::new(1.0, unit, gram_weight, "", modifier),
    ))
}
