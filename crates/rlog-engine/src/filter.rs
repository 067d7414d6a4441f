use chrono::{Datelike, Local, NaiveDateTime};
use regex::Regex;

use rlog_types::{FileSummary, Record};

use crate::error::{FilterError, Result};

const FULL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Compiled filter criteria, all ANDed together.
///
/// An absent criterion never excludes anything. Patterns are compiled once
/// at construction and reused for every record of a query.
#[derive(Clone, Default)]
pub struct FilterSpec {
    /// Numeric level to match exactly (None = any)
    level: Option<u32>,

    /// Thread patterns, any one may match (empty = any)
    threads: Vec<Regex>,

    /// Inclusive lower time bound
    start_time: Option<NaiveDateTime>,

    /// Inclusive upper time bound
    end_time: Option<NaiveDateTime>,

    /// Pattern searched anywhere in the content
    content: Option<Regex>,

    /// Pattern matched against source file names before parsing
    source_name: Option<Regex>,
}

impl FilterSpec {
    /// A filter that matches everything
    pub fn any() -> Self {
        Self::default()
    }

    pub fn builder() -> FilterSpecBuilder {
        FilterSpecBuilder::default()
    }

    /// Build from textual parameters, as received from a command line or a
    /// query string. Empty values count as absent.
    pub fn from_params(params: &FilterParams) -> Result<Self> {
        let year = Local::now().year();
        let mut builder = Self::builder();

        if let Some(level) = non_empty(&params.level) {
            let level = level
                .trim()
                .parse::<u32>()
                .map_err(|_| FilterError::InvalidLevel(level.to_string()))?;
            builder = builder.level(level);
        }
        for thread in params.threads.iter().filter(|t| !t.is_empty()) {
            builder = builder.thread(thread);
        }
        if let Some(start) = non_empty(&params.start_time) {
            builder = builder.start_time(parse_time(start, year)?);
        }
        if let Some(end) = non_empty(&params.end_time) {
            builder = builder.end_time(parse_time(end, year)?);
        }
        if let Some(content) = non_empty(&params.content) {
            builder = builder.content(content);
        }
        if let Some(name) = non_empty(&params.source_name) {
            builder = builder.source_name(name);
        }

        builder.build()
    }

    /// Check if a record matches every configured criterion
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(level) = self.level {
            // non-numeric levels never match a numeric filter
            if record.numeric_level() != Some(level) {
                return false;
            }
        }

        if !self.threads.is_empty() && !self.matches_thread(&record.thread) {
            return false;
        }

        if let Some(ts) = record.timestamp {
            if self.start_time.is_some_and(|start| ts < start) {
                return false;
            }
            if self.end_time.is_some_and(|end| ts > end) {
                return false;
            }
        }

        match &self.content {
            Some(re) => re.is_match(&record.content),
            None => true,
        }
    }

    /// Check whether a source with this summary could hold a matching record.
    ///
    /// Only thread and time criteria can rule a source out.
    pub fn admits(&self, summary: &FileSummary) -> bool {
        if !self.prunes() {
            return true;
        }
        if summary.is_empty() {
            return false;
        }

        if !self.threads.is_empty() && !summary.threads.iter().any(|t| self.matches_thread(t)) {
            return false;
        }

        summary.overlaps(self.start_time, self.end_time)
    }

    /// Check a file name against the source-name pattern
    pub fn matches_source_name(&self, name: &str) -> bool {
        match &self.source_name {
            Some(re) => re.is_match(name),
            None => true,
        }
    }

    fn matches_thread(&self, thread: &str) -> bool {
        self.threads.iter().any(|re| re.is_match(thread))
    }

    /// Whether a summary index can rule sources out for this filter
    pub fn prunes(&self) -> bool {
        !self.threads.is_empty() || self.constrains_time()
    }

    /// Either time bound is set, so record timestamps must be materialized
    pub fn constrains_time(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }

    /// Both time bounds are set
    pub fn has_window(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

}

impl std::fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterSpec")
            .field("level", &self.level)
            .field(
                "threads",
                &self.threads.iter().map(Regex::as_str).collect::<Vec<_>>(),
            )
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("content", &self.content.as_ref().map(Regex::as_str))
            .field("source_name", &self.source_name.as_ref().map(Regex::as_str))
            .finish()
    }
}

/// Builder collecting raw criteria; patterns compile in [`build`](Self::build)
#[derive(Clone, Debug, Default)]
pub struct FilterSpecBuilder {
    level: Option<u32>,
    threads: Vec<String>,
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
    content: Option<String>,
    source_name: Option<String>,
}

impl FilterSpecBuilder {
    pub fn level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    /// Add a thread pattern, matched from the start of the label
    pub fn thread(mut self, pattern: impl Into<String>) -> Self {
        self.threads.push(pattern.into());
        self
    }

    pub fn start_time(mut self, start: NaiveDateTime) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn end_time(mut self, end: NaiveDateTime) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Pattern searched anywhere within the content
    pub fn content(mut self, pattern: impl Into<String>) -> Self {
        self.content = Some(pattern.into());
        self
    }

    /// Pattern matched from the start of each source's file name
    pub fn source_name(mut self, pattern: impl Into<String>) -> Self {
        self.source_name = Some(pattern.into());
        self
    }

    pub fn build(self) -> Result<FilterSpec> {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err(FilterError::EmptyWindow {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }

        let threads = self
            .threads
            .iter()
            .map(|p| compile_prefix("thread", p))
            .collect::<Result<Vec<_>>>()?;
        let content = self
            .content
            .as_deref()
            .map(|p| compile("content", p, p))
            .transpose()?;
        let source_name = self
            .source_name
            .as_deref()
            .map(|p| compile_prefix("source name", p))
            .transpose()?;

        Ok(FilterSpec {
            level: self.level,
            threads,
            start_time: self.start_time,
            end_time: self.end_time,
            content,
            source_name,
        })
    }
}

/// Loosely typed filter parameters, before validation
#[derive(Clone, Debug, Default)]
pub struct FilterParams {
    pub level: Option<String>,
    pub threads: Vec<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub content: Option<String>,
    pub source_name: Option<String>,
}

/// Parse a time bound.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.fff]`, or `MM-DD HH:MM:SS[.fff]` completed
/// with `default_year`.
pub fn parse_time(text: &str, default_year: i32) -> Result<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, FULL_TIME_FORMAT)
        .or_else(|_| {
            NaiveDateTime::parse_from_str(&format!("{default_year}-{text}"), FULL_TIME_FORMAT)
        })
        .map_err(|_| FilterError::InvalidTime(text.to_string()))
}

/// Compile so the pattern must match at the start of the haystack, but may
/// stop anywhere
fn compile_prefix(field: &'static str, pattern: &str) -> Result<Regex> {
    compile(field, pattern, &format!("^(?:{pattern})"))
}

fn compile(field: &'static str, pattern: &str, source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|error| FilterError::InvalidPattern {
        field,
        pattern: pattern.to_string(),
        error,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
