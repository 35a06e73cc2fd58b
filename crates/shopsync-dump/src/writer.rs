//! Thin append-one-line-per-record helper (spec §4.5, §6.2). Writers buffer
//! nothing beyond the OS file buffer — a dump session's records already live
//! fully in memory as the reconstructed bulk result, so there is no streaming
//! back-pressure to manage here.

use crate::error::DumpError;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct JsonlWriter {
    path: PathBuf,
    inner: BufWriter<File>,
}

impl JsonlWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, DumpError> {
        let path = path.into();
        let file = File::create(&path).map_err(|source| DumpError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(JsonlWriter { path, inner: BufWriter::new(file) })
    }

    pub fn write_record(&mut self, record: &Value) -> Result<(), DumpError> {
        let line = serde_json::to_string(record).expect("Value always serializes");
        self.write_line(&line)
    }

    fn write_line(&mut self, line: &str) -> Result<(), DumpError> {
        writeln!(self.inner, "{line}").map_err(|source| DumpError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// Writes a single JSON document (object or array) to `path`, used for the
/// non-JSONL artifacts (`definitions.json`, `menus.json`, ...).
pub fn write_json_doc<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), DumpError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(value).expect("value always serializes");
    std::fs::write(path, json).map_err(|source| DumpError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn jsonl_writer_appends_one_record_per_line() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("records.jsonl");
        let mut writer = JsonlWriter::create(&path).unwrap();
        writer.write_record(&json!({"id": 1})).unwrap();
        writer.write_record(&json!({"id": 2})).unwrap();
        drop(writer);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(serde_json::from_str::<Value>(lines[0]).unwrap(), json!({"id": 1}));
        assert_eq!(serde_json::from_str::<Value>(lines[1]).unwrap(), json!({"id": 2}));
    }

    #[test]
    fn write_json_doc_round_trips_through_pretty_printing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("definitions.json");
        let doc = json!({"metaobjectDefinitions": [], "metafieldDefinitions": []});
        write_json_doc(&path, &doc).unwrap();

        let read_back: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read_back, doc);
    }
}
