//! Memory store persisted as a JSON lines file.

use crate::retrieval;
use crate::store::{MemoryStore, validate_content};
use crate::types::{MemoryRecord, clamp_importance};
use async_trait::async_trait;
use relay_common::Result;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// File-backed store: one JSON record per line, appended on save and
/// rewritten on delete.
pub struct JsonlMemoryStore {
    path: PathBuf,
    max_results: usize,
    /// Serializes file access between concurrent requests.
    lock: Mutex<()>,
}

impl JsonlMemoryStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>, max_results: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), "Initialized JSONL memory store");

        Ok(Self {
            path,
            max_results,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("jsonl.tmp")
    }

    /// Every non-blank line in file order, paired with its record when it parses.
    fn load_lines(&self) -> Result<Vec<(String, Option<MemoryRecord>)>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(&self.path)?;
        let reader = BufReader::new(file);
        let mut lines = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = match serde_json::from_str::<MemoryRecord>(&line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        line = lineno + 1,
                        error = %e,
                        "Skipping unreadable memory record"
                    );
                    None
                }
            };
            lines.push((line, record));
        }
        Ok(lines)
    }

    fn load_records(&self) -> Result<Vec<MemoryRecord>> {
        Ok(self
            .load_lines()?
            .into_iter()
            .filter_map(|(_, record)| record)
            .collect())
    }

    /// Replace the file contents; unreadable lines pass through verbatim.
    fn write_lines<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let temp_path = self.temp_path();
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            for line in lines {
                writeln!(file, "{line}")?;
            }
        }
        std::fs::rename(temp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for JsonlMemoryStore {
    async fn fetch(&self, user_id: &str, query: Option<&str>) -> Result<Vec<MemoryRecord>> {
        let _guard = self.lock.lock().await;
        let mut records = self.load_records()?;
        records.retain(|m| m.user_id == user_id);

        let ranked = retrieval::rank(records, query, self.max_results);
        debug!(user_id = %user_id, count = ranked.len(), "Fetched memories from file");
        Ok(ranked)
    }

    async fn save(
        &self,
        user_id: &str,
        content: &str,
        memory_type: &str,
        importance: f32,
    ) -> Result<MemoryRecord> {
        let content = validate_content(content)?;
        let record = MemoryRecord::new(
            user_id,
            content,
            memory_type,
            clamp_importance(importance),
        );

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(&record)?;
        writeln!(file, "{line}")?;

        debug!(
            memory_id = %record.id,
            user_id = %user_id,
            content_len = record.content.len(),
            "Stored memory record"
        );
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut lines = self.load_lines()?;
        let before = lines.len();
        lines.retain(|(_, record)| record.as_ref().is_none_or(|m| m.id != id));
        if lines.len() == before {
            return Ok(false);
        }
        self.write_lines(lines.iter().map(|(line, _)| line.as_str()))?;
        Ok(true)
    }
}
