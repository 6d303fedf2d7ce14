//! Append-only feedback log.
//!
//! JSONL store, one record per line. Appends are serialized behind a lock
//! so concurrent feedback submissions cannot interleave half-written
//! lines. A missing or partially corrupt file is treated as an empty or
//! shorter log, never as a fatal condition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// One feedback submission. Never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub original_solution: String,
    pub refined_solution: String,
    pub feedback: String,
    /// 1-5 star rating as submitted by the user.
    pub rating: u8,
}

impl FeedbackEntry {
    pub fn new(
        query: &str,
        original_solution: &str,
        refined_solution: &str,
        feedback: &str,
        rating: u8,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            query: query.to_string(),
            original_solution: original_solution.to_string(),
            refined_solution: refined_solution.to_string(),
            feedback: feedback.to_string(),
            rating,
        }
    }
}

/// Append-only JSONL feedback store.
pub struct FeedbackLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FeedbackLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Creates the parent directory on first use.
    pub fn append(&self, entry: &FeedbackEntry) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let line = serde_json::to_string(entry)?;
        writeln!(file, "{}", line)?;

        Ok(())
    }

    /// Read the whole log in chronological order. Unparseable lines are
    /// skipped with a warning; a missing file reads as empty.
    pub fn read_all(&self) -> std::io::Result<Vec<FeedbackEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<FeedbackEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping corrupt feedback line: {}", e),
            }
        }

        Ok(entries)
    }

    /// The most recent `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> std::io::Result<Vec<FeedbackEntry>> {
        let mut entries = self.read_all()?;
        if entries.len() > limit {
            entries.drain(..entries.len() - limit);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(query: &str, rating: u8) -> FeedbackEntry {
        FeedbackEntry::new(query, "original", "refined", "too terse", rating)
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let log = FeedbackLog::new(dir.path().join("feedback.jsonl"));
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let log = FeedbackLog::new(dir.path().join("feedback.jsonl"));

        log.append(&entry("solve x^2 = 4", 2)).unwrap();
        log.append(&entry("integrate x dx", 5)).unwrap();

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].query, "solve x^2 = 4");
        assert_eq!(entries[0].rating, 2);
        assert_eq!(entries[1].rating, 5);
    }

    #[test]
    fn test_corrupt_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.jsonl");
        let log = FeedbackLog::new(&path);

        log.append(&entry("first", 4)).unwrap();
        fs::write(
            &path,
            format!(
                "{}\nnot json at all\n",
                serde_json::to_string(&entry("first", 4)).unwrap()
            ),
        )
        .unwrap();
        log.append(&entry("second", 3)).unwrap();

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].query, "first");
        assert_eq!(entries[1].query, "second");
    }

    #[test]
    fn test_recent_returns_tail() {
        let dir = TempDir::new().unwrap();
        let log = FeedbackLog::new(dir.path().join("feedback.jsonl"));

        for i in 0..5 {
            log.append(&entry(&format!("query {}", i), 5)).unwrap();
        }

        let recent = log.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "query 3");
        assert_eq!(recent[1].query, "query 4");
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let log = FeedbackLog::new(dir.path().join("nested/data/feedback.jsonl"));
        log.append(&entry("solve", 5)).unwrap();
        assert_eq!(log.read_all().unwrap().len(), 1);
    }
}
