//! Reads the on-disk dump artifacts (spec §6.2) back into memory for apply.

use crate::error::ApplyError;
use serde_json::Value;
use std::path::Path;

pub fn read_jsonl(path: &Path) -> Result<Vec<Value>, ApplyError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ApplyError::Io {
        path: path.display().to_string(),
        source,
    })?;
    contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|source| ApplyError::Parse {
                path: path.display().to_string(),
                source,
            })
        })
        .collect()
}

pub fn read_json_doc(path: &Path) -> Result<Value, ApplyError> {
    if !path.exists() {
        return Ok(Value::Null);
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ApplyError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ApplyError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Lists every metaobject dump file (`metaobjects-{type}.jsonl`) in `dir`,
/// returning `(type, path)` pairs.
pub fn discover_metaobject_dumps(dir: &Path) -> Result<Vec<(String, std::path::PathBuf)>, ApplyError> {
    let mut out = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|source| ApplyError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ApplyError::Io { path: dir.display().to_string(), source })?;
        let path = entry.path();
        let Some(filename) = path.file_name().and_then(|f| f.to_str()) else { continue };
        if let Some(type_) = filename.strip_prefix("metaobjects-").and_then(|r| r.strip_suffix(".jsonl")) {
            out.push((type_.to_string(), path));
        }
    }
    Ok(out)
}
