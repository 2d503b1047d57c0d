//! Persistence of raw scorer output, one JSON object per line.
//!
//! The cache is what makes runs resumable: an identifier with a record is
//! never sent to the scorer again. Saving always rewrites the whole file
//! through a temporary sibling and a rename, so an interrupted run leaves
//! the previous snapshot intact.

use crate::error::{JudgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Default filename for the evaluation cache.
pub const CACHE_FILENAME: &str = "gpt4_vision_evaluation_output.jsonl";

/// Raw scorer output for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub image_id: String,
    pub output: String,
}

impl EvaluationRecord {
    pub fn new(image_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            output: output.into(),
        }
    }
}

/// Records keyed by identifier.
pub type RecordMap = BTreeMap<String, EvaluationRecord>;

/// JSONL-backed store of evaluation records.
#[derive(Debug, Clone)]
pub struct ResultCache {
    path: PathBuf,
}

impl ResultCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The cache file inside an output directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CACHE_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read every persisted record. A missing file is an empty cache.
    ///
    /// Lines without an `image_id` are ignored; a line that is not JSON is
    /// an error, since silently dropping it would trigger a re-fetch.
    pub fn load(&self) -> Result<RecordMap> {
        let mut records = RecordMap::new();

        if !self.path.exists() {
            return Ok(records);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| JudgeError::io(&self.path, e))?;

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
                JudgeError::Serialization(format!(
                    "{} line {}: {}",
                    self.path.display(),
                    index + 1,
                    e
                ))
            })?;

            if value.get("image_id").is_none() {
                debug!(line = index + 1, "cache line has no image_id, skipping");
                continue;
            }

            let record: EvaluationRecord = serde_json::from_value(value).map_err(|e| {
                JudgeError::Serialization(format!(
                    "{} line {}: {}",
                    self.path.display(),
                    index + 1,
                    e
                ))
            })?;
            records.insert(record.image_id.clone(), record);
        }

        Ok(records)
    }

    /// Replace the cache contents with `records`.
    ///
    /// The snapshot is written to a temporary file in the same directory and
    /// renamed over the cache; on failure the temporary file is removed.
    pub fn save(&self, records: &RecordMap) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| JudgeError::io(parent, e))?;
        }

        let tmp = NamedTempFile::new_in(parent).map_err(|e| JudgeError::io(parent, e))?;
        let mut writer = BufWriter::new(tmp);

        for record in records.values() {
            let line = serde_json::to_string(record)
                .map_err(|e| JudgeError::Serialization(e.to_string()))?;
            writeln!(writer, "{}", line).map_err(|e| JudgeError::io(&self.path, e))?;
        }

        let tmp = writer
            .into_inner()
            .map_err(|e| JudgeError::io(&self.path, e.into_error()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| JudgeError::io(tmp.path(), e))?;

        tmp.persist(&self.path)
            .map_err(|e| JudgeError::io(&self.path, e.error))?;

        Ok(())
    }

    /// Delete the cache so every pair is scored again.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| JudgeError::io(&self.path, e))?;
        }
        Ok(())
    }
}
