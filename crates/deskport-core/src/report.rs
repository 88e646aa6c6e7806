//! Import outcome reporting
//!
//! The importer accumulates per-category counts, skipped records, and
//! record-level errors into an [`ImportReport`] instead of aborting on
//! the first bad record. Rendering truncates long lists so a report for
//! a large account stays readable.

use serde::Serialize;
use std::fmt;

/// How many skipped records or errors to list before summarizing
const LIST_LIMIT: usize = 10;

/// Created/reused tally for one record category
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Counter {
    pub created: usize,
    pub reused: usize,
}

impl Counter {
    pub fn total(&self) -> usize {
        self.created + self.reused
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} created, {} reused", self.created, self.reused)
    }
}

/// A record the importer deliberately left out
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecord {
    pub phase: String,
    pub key: String,
    pub reason: String,
}

/// A record that failed to import
#[derive(Debug, Clone, Serialize)]
pub struct ImportError {
    pub phase: String,
    pub key: String,
    pub message: String,
}

/// Outcome of one import run
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub account_created: bool,
    pub users: Counter,
    pub contacts: Counter,
    pub inboxes: Counter,
    pub labels: Counter,
    pub teams: Counter,
    pub conversations: Counter,
    pub messages: Counter,
    pub attachments: Counter,
    pub canned_responses: Counter,
    pub custom_filters: Counter,
    pub webhooks: Counter,
    pub automation_rules: Counter,
    pub skipped: Vec<SkippedRecord>,
    pub errors: Vec<ImportError>,
    pub dry_run: bool,
}

impl ImportReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn skip(&mut self, phase: &str, key: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedRecord {
            phase: phase.to_string(),
            key: key.into(),
            reason: reason.into(),
        });
    }

    pub fn record_error(&mut self, phase: &str, key: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ImportError {
            phase: phase.to_string(),
            key: key.into(),
            message: message.into(),
        });
    }
}

fn write_truncated<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    mut line: impl FnMut(&T) -> String,
) -> fmt::Result {
    for item in items.iter().take(LIST_LIMIT) {
        writeln!(f, "    - {}", line(item))?;
    }
    if items.len() > LIST_LIMIT {
        writeln!(f, "    ... and {} more", items.len() - LIST_LIMIT)?;
    }
    Ok(())
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "Import finished (dry run, all changes rolled back)")?;
        } else {
            writeln!(f, "Import finished")?;
        }

        if self.account_created {
            writeln!(f, "  account: created")?;
        } else {
            writeln!(f, "  account: reused existing")?;
        }
        writeln!(f, "  users: {}", self.users)?;
        writeln!(f, "  contacts: {}", self.contacts)?;
        writeln!(f, "  inboxes: {}", self.inboxes)?;
        writeln!(f, "  labels: {}", self.labels)?;
        writeln!(f, "  teams: {}", self.teams)?;
        writeln!(f, "  conversations: {}", self.conversations)?;
        writeln!(f, "  messages: {} created", self.messages.created)?;
        writeln!(f, "  attachments: {} created", self.attachments.created)?;
        writeln!(f, "  canned responses: {}", self.canned_responses)?;
        writeln!(f, "  custom filters: {}", self.custom_filters)?;
        writeln!(f, "  webhooks: {}", self.webhooks)?;
        writeln!(f, "  automation rules: {}", self.automation_rules)?;

        if !self.skipped.is_empty() {
            writeln!(f, "  skipped: {}", self.skipped.len())?;
            write_truncated(f, &self.skipped, |s| {
                format!("{} {}: {}", s.phase, s.key, s.reason)
            })?;
        }

        if !self.errors.is_empty() {
            writeln!(f, "  errors: {}", self.errors.len())?;
            write_truncated(f, &self.errors, |e| {
                format!("{} {}: {}", e.phase, e.key, e.message)
            })?;
        }

        Ok(())
    }
}
