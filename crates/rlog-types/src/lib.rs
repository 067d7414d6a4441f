//! Shared types for rlog
//!
//! This crate contains data structures used across multiple rlog crates.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// Identifier of the file a record was read from
pub type SourceId = Arc<Path>;

/// Rendering used when a materialized timestamp is shown
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// ============================================================================
// Log Records
// ============================================================================

/// A single log record, reconstructed from a header line and any
/// continuation lines that followed it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// File the record was read from
    pub source: SourceId,

    /// 1-based line number of the header within its source
    pub line: u64,

    /// Severity token, stored as written
    pub level: String,

    /// Thread or component label
    pub thread: String,

    /// Timestamp text as written in the header (`MM-DD HH:MM:SS.ffffff`)
    pub stamp: String,

    /// Calendar timestamp, only populated when materialization was requested
    pub timestamp: Option<NaiveDateTime>,

    /// Header payload followed by continuation lines, verbatim
    pub content: String,

    /// Exact original text, header line through last continuation line
    pub raw: String,
}

impl Record {
    /// Raw text for lossless emission
    pub fn as_plain_text(&self) -> &str {
        &self.raw
    }

    /// Borrowed view for structured transports
    pub fn as_structured(&self) -> StructuredRecord<'_> {
        let timestamp = match self.timestamp {
            Some(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            None => self.stamp.clone(),
        };

        StructuredRecord {
            source: self.source.display().to_string(),
            line: self.line,
            level: &self.level,
            thread: &self.thread,
            timestamp,
            raw: &self.raw,
        }
    }

    /// Numeric value of the level token, if it is numeric
    pub fn numeric_level(&self) -> Option<u32> {
        self.level.parse().ok()
    }
}

/// Serializable projection of a [`Record`]
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct StructuredRecord<'a> {
    pub source: String,
    pub line: u64,
    pub level: &'a str,
    pub thread: &'a str,
    /// Materialized timestamp when available, the header text otherwise
    pub timestamp: String,
    pub raw: &'a str,
}

// ============================================================================
// File Summaries
// ============================================================================

/// Aggregate statistics for one source, used to skip it without parsing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub min_timestamp: Option<NaiveDateTime>,
    pub max_timestamp: Option<NaiveDateTime>,
    pub threads: BTreeSet<String>,
    pub records: usize,
}

impl FileSummary {
    /// Fold one record into the summary
    pub fn observe(&mut self, record: &Record) {
        self.records += 1;

        if let Some(ts) = record.timestamp {
            self.min_timestamp = Some(self.min_timestamp.map_or(ts, |min| min.min(ts)));
            self.max_timestamp = Some(self.max_timestamp.map_or(ts, |max| max.max(ts)));
        }

        if !self.threads.contains(&record.thread) {
            self.threads.insert(record.thread.clone());
        }
    }

    /// Whether the summary saw no records at all
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Check whether the timestamp span intersects `[start, end]`.
    ///
    /// Open bounds are unbounded. A summary without timestamps cannot be
    /// ruled out on time alone.
    pub fn overlaps(&self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> bool {
        let (Some(min), Some(max)) = (self.min_timestamp, self.max_timestamp) else {
            return true;
        };

        if let Some(start) = start {
            if max < start {
                return false;
            }
        }
        if let Some(end) = end {
            if min > end {
                return false;
            }
        }
        true
    }
}
