//! Operation history: an append-only JSONL audit trail of stack mutations,
//! used by `status`/`doctor` to show recent activity.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Trim the log once it exceeds this many entries by this margin.
const MAX_LOG_ENTRIES: usize = 1000;
const TRIM_MARGIN: usize = 100;

/// A single recorded stack mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    StackCreated { name: String, base: String },
    ChangeAmended { stack: String, uuid: String },
    ChangeInserted { stack: String, uuid: String, after: String },
    RefreshCompleted { stack: String, merged: Vec<String> },
    RestackStarted { stack: String, onto: String },
    RestackCompleted { stack: String, success: bool },
    PushCompleted { stack: String, created: usize, updated: usize, skipped: usize },
}

impl Operation {
    /// The stack name this operation belongs to, for filtering a combined log.
    pub fn stack_name(&self) -> &str {
        match self {
            Operation::StackCreated { name, .. } => name,
            Operation::ChangeAmended { stack, .. }
            | Operation::ChangeInserted { stack, .. }
            | Operation::RefreshCompleted { stack, .. }
            | Operation::RestackStarted { stack, .. }
            | Operation::RestackCompleted { stack, .. }
            | Operation::PushCompleted { stack, .. } => stack,
        }
    }

    /// One-line human summary, independent of the stack name.
    pub fn summary(&self) -> String {
        match self {
            Operation::StackCreated { base, .. } => format!("created stack (base: {base})"),
            Operation::ChangeAmended { uuid, .. } => format!("amended {uuid}"),
            Operation::ChangeInserted { uuid, after } => format!("inserted {uuid} after {after}"),
            Operation::RefreshCompleted { merged, .. } => {
                if merged.is_empty() {
                    "refreshed (nothing merged)".to_string()
                } else {
                    format!("refreshed ({} merged)", merged.len())
                }
            }
            Operation::RestackStarted { onto, .. } => format!("restack started onto {onto}"),
            Operation::RestackCompleted { success, .. } => {
                if *success { "restack completed".to_string() } else { "restack failed".to_string() }
            }
            Operation::PushCompleted { created, updated, skipped, .. } => {
                format!("push: {created} created, {updated} updated, {skipped} skipped")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
}

impl LogEntry {
    pub fn new(operation: Operation) -> Self {
        Self { timestamp: Utc::now(), operation }
    }
}

/// Append-only log at `<store_root>/operations.jsonl`.
pub struct OperationLog {
    log_path: PathBuf,
}

impl OperationLog {
    pub fn new(store_root: &Path) -> Self {
        Self { log_path: store_root.join("operations.jsonl") }
    }

    pub fn log(&self, entry: LogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .context("failed to open operation log")?;

        let json = serde_json::to_string(&entry).context("failed to serialize log entry")?;
        writeln!(file, "{json}").context("failed to write to operation log")?;

        self.maybe_trim()?;
        Ok(())
    }

    fn maybe_trim(&self) -> Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let file = File::open(&self.log_path).context("failed to open log for trim check")?;
        let line_count = BufReader::new(file).lines().count();
        if line_count <= MAX_LOG_ENTRIES + TRIM_MARGIN {
            return Ok(());
        }

        let entries = self.read_all()?;
        if entries.len() <= MAX_LOG_ENTRIES {
            return Ok(());
        }

        let to_keep = &entries[entries.len() - MAX_LOG_ENTRIES..];
        let temp_path = self.log_path.with_extension("jsonl.tmp");
        {
            let mut file = File::create(&temp_path).context("failed to create temp log file")?;
            for entry in to_keep {
                writeln!(file, "{}", serde_json::to_string(entry)?)?;
            }
        }
        fs::rename(&temp_path, &self.log_path).context("failed to rotate operation log")?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<LogEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path).context("failed to open operation log")?;
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.context("failed to read line from operation log")?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line).context("failed to parse operation log entry")?);
        }
        Ok(entries)
    }

    pub fn read_last(&self, n: usize) -> Result<Vec<LogEntry>> {
        let all = self.read_all()?;
        let start = all.len().saturating_sub(n);
        Ok(all[start..].to_vec())
    }

    /// Last `n` entries belonging to a given stack, most recent last.
    pub fn read_last_for_stack(&self, stack_name: &str, n: usize) -> Result<Vec<LogEntry>> {
        let matching: Vec<LogEntry> =
            self.read_all()?.into_iter().filter(|e| e.operation.stack_name() == stack_name).collect();
        let start = matching.len().saturating_sub(n);
        Ok(matching[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let log = OperationLog::new(dir.path());

        log.log(LogEntry::new(Operation::StackCreated { name: "feat".to_string(), base: "main".to_string() })).unwrap();
        log.log(LogEntry::new(Operation::PushCompleted { stack: "feat".to_string(), created: 1, updated: 0, skipped: 2 }))
            .unwrap();

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0].operation, Operation::StackCreated { .. }));
    }

    #[test]
    fn read_last_returns_suffix() {
        let dir = tempdir().unwrap();
        let log = OperationLog::new(dir.path());

        for i in 0..5 {
            log.log(LogEntry::new(Operation::RestackStarted { stack: format!("s{i}"), onto: "main".to_string() })).unwrap();
        }

        let last_two = log.read_last(2).unwrap();
        assert_eq!(last_two.len(), 2);
        assert!(matches!(&last_two[0].operation, Operation::RestackStarted { stack, .. } if stack == "s3"));
    }

    #[test]
    fn read_all_on_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let log = OperationLog::new(dir.path());
        assert!(log.read_all().unwrap().is_empty());
    }
}
