//! Fold the sidecars found by the hierarchy resolver into one document.

use std::path::Path;

use crate::error::{ConversionError, Result};
use crate::hierarchy::SidecarCandidate;
use crate::value::{MetaMap, MetaValue};

/// Merge existing candidates in order. Later documents replace same-named
/// top-level keys wholesale; nested maps are not deep-merged.
pub fn merge_sidecars(candidates: &[SidecarCandidate]) -> Result<MetaMap> {
    let mut merged = MetaMap::new();
    for candidate in candidates {
        if !candidate.path.is_file() {
            continue;
        }
        tracing::debug!(
            level = ?candidate.level,
            path = %candidate.path.display(),
            "merging sidecar"
        );
        merged.extend(read_document(&candidate.path)?);
    }
    Ok(merged)
}

/// Parse a JSON document whose top level must be an object.
pub fn read_document(path: &Path) -> Result<MetaMap> {
    let text = std::fs::read_to_string(path).map_err(|e| ConversionError::io(path, e))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| ConversionError::malformed_sidecar(path, e.to_string()))?;
    match MetaValue::from(value) {
        MetaValue::Map(map) => Ok(map),
        _ => Err(ConversionError::malformed_sidecar(
            path,
            "top-level value is not an object",
        )),
    }
}
