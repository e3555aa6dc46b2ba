// 📜 Audit Log - every pipeline action is an event
// Stages push events into one injected log; the log renders them as
// `timestamp - LEVEL - message` lines which the report view parses by text.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

// ============================================================================
// LEVEL & STAGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    /// Label used in rendered log lines
    pub fn label(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Load,
    Analyze,
    CleanLoans,
    CleanMembers,
    Reconcile,
    WriteFiles,
    WriteStore,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Analyze => "analyze",
            Stage::CleanLoans => "clean_loans",
            Stage::CleanMembers => "clean_members",
            Stage::Reconcile => "reconcile",
            Stage::WriteFiles => "write_files",
            Stage::WriteStore => "write_store",
        }
    }
}

// ============================================================================
// AUDIT EVENT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub stage: Stage,
    pub message: String,
    /// Structured payload (counts, ids, digests); not part of the rendered line
    pub data: serde_json::Value,
}

impl AuditEvent {
    /// Render in the stable line format, e.g.
    /// `2024-03-01 10:15:02,118 - INFO - Removed 2 empty rows from books data`
    pub fn render(&self) -> String {
        format!(
            "{} - {} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.level.label(),
            self.message
        )
    }
}

// ============================================================================
// AUDIT LOG
// ============================================================================

/// Append-only event list for one pipeline run
#[derive(Debug, Clone)]
pub struct AuditLog {
    run_id: String,
    events: Vec<AuditEvent>,
}

impl AuditLog {
    pub fn new() -> Self {
        AuditLog {
            run_id: uuid::Uuid::new_v4().to_string(),
            events: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn info(&mut self, stage: Stage, message: impl Into<String>) {
        self.push(Level::Info, stage, message.into(), serde_json::Value::Null);
    }

    pub fn info_with(&mut self, stage: Stage, message: impl Into<String>, data: serde_json::Value) {
        self.push(Level::Info, stage, message.into(), data);
    }

    pub fn warn(&mut self, stage: Stage, message: impl Into<String>) {
        self.push(Level::Warning, stage, message.into(), serde_json::Value::Null);
    }

    pub fn warn_with(&mut self, stage: Stage, message: impl Into<String>, data: serde_json::Value) {
        self.push(Level::Warning, stage, message.into(), data);
    }

    pub fn error(&mut self, stage: Stage, message: impl Into<String>) {
        self.push(Level::Error, stage, message.into(), serde_json::Value::Null);
    }

    fn push(&mut self, level: Level, stage: Stage, message: String, data: serde_json::Value) {
        match level {
            Level::Info => tracing::info!(run_id = %self.run_id, stage = stage.name(), "{}", message),
            Level::Warning => tracing::warn!(run_id = %self.run_id, stage = stage.name(), "{}", message),
            Level::Error => tracing::error!(run_id = %self.run_id, stage = stage.name(), "{}", message),
        }

        self.events.push(AuditEvent {
            timestamp: Local::now(),
            level,
            stage,
            message,
            data,
        });
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Messages recorded by one stage, in order
    pub fn messages(&self, stage: Stage) -> Vec<&str> {
        self.events
            .iter()
            .filter(|e| e.stage == stage)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(AuditEvent::render).collect()
    }

    /// Append all rendered lines to `path`, creating it if needed
    pub fn append_to_file(&self, path: &Path) -> Result<usize> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open audit log: {}", path.display()))?;

        for line in self.lines() {
            writeln!(file, "{}", line)
                .with_context(|| format!("Failed to write audit log: {}", path.display()))?;
        }

        Ok(self.events.len())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_line_format() {
        let mut log = AuditLog::new();
        log.warn(Stage::CleanLoans, "3 Book checkout values could not be parsed");

        let line = &log.lines()[0];
        assert!(line.contains(" - WARNING - 3 Book checkout values could not be parsed"));

        // "2024-03-01 10:15:02,118" is 23 characters
        let (stamp, _) = line.split_at(23);
        assert_eq!(&stamp[10..11], " ");
        assert_eq!(&stamp[19..20], ",");
    }

    #[test]
    fn test_messages_by_stage() {
        let mut log = AuditLog::new();
        log.info(Stage::CleanLoans, "Removed 1 empty rows from books data");
        log.info(Stage::CleanMembers, "Removed 0 empty rows from customers data");
        log.error(Stage::WriteStore, "Database write failed, rolled back: boom");

        assert_eq!(log.len(), 3);
        assert_eq!(log.messages(Stage::CleanLoans), vec!["Removed 1 empty rows from books data"]);
        assert_eq!(log.events()[2].level, Level::Error);
    }

    #[test]
    fn test_append_to_file_is_additive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");

        let mut first = AuditLog::new();
        first.info(Stage::Load, "first run");
        first.append_to_file(&path).unwrap();

        let mut second = AuditLog::new();
        second.info(Stage::Load, "second run");
        second.append_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first run"));
        assert!(lines[1].ends_with("second run"));
        assert_ne!(first.run_id(), second.run_id());

        println!("✅ Audit log append test PASSED");
    }
}
