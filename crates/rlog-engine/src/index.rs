//! Per-source summaries for skipping whole files.
//!
//! The index is built with one full pass over each source and is never
//! updated afterwards; rebuild it to pick up new data.

use std::collections::HashMap;

use rlog_types::{FileSummary, SourceId};

use crate::error::SourceError;
use crate::filter::FilterSpec;
use crate::parser::RecordParser;
use crate::source::LogSource;

/// Mapping from source to its [`FileSummary`]
#[derive(Debug, Default)]
pub struct FileSummaryIndex {
    summaries: HashMap<SourceId, FileSummary>,

    /// Sources that failed during the build, left out of the index
    failures: Vec<SourceError>,

    /// Year used to complete header timestamps while summarizing
    year: i32,
}

impl FileSummaryIndex {
    /// Build summaries for `sources` using the current year
    pub fn build<I>(sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: LogSource,
    {
        Self::build_with(&RecordParser::new(true), sources)
    }

    /// Build summaries with a specific parser; timestamps are always materialized
    pub fn build_with<I>(parser: &RecordParser, sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: LogSource,
    {
        let parser = parser.clone().with_timestamps(true);
        let sources: Vec<I::Item> = sources.into_iter().collect();

        // Sources without any record still get a (prunable) summary
        let mut summaries: HashMap<SourceId, FileSummary> = sources
            .iter()
            .map(|s| (s.id(), FileSummary::default()))
            .collect();
        let mut failures = Vec::new();

        for result in parser.parse(sources) {
            match result {
                Ok(record) => {
                    if let Some(summary) = summaries.get_mut(&record.source) {
                        summary.observe(&record);
                    }
                }
                Err(err) => {
                    tracing::warn!("not indexing: {}", err);
                    summaries.remove(err.source_id());
                    failures.push(err);
                }
            }
        }

        tracing::info!(
            "indexed {} sources ({} failed)",
            summaries.len(),
            failures.len()
        );

        Self {
            summaries,
            failures,
            year: parser.year(),
        }
    }

    pub fn get(&self, source: &SourceId) -> Option<&FileSummary> {
        self.summaries.get(source)
    }

    /// Sources absent from the index are always eligible
    pub fn is_eligible(&self, filter: &FilterSpec, source: &SourceId) -> bool {
        self.summaries
            .get(source)
            .is_none_or(|summary| filter.admits(summary))
    }

    /// Keep the sources that may hold a match, preserving their order
    pub fn prune<S: LogSource>(&self, filter: &FilterSpec, sources: Vec<S>) -> Vec<S> {
        if !filter.prunes() {
            return sources;
        }

        let before = sources.len();
        let kept: Vec<S> = sources
            .into_iter()
            .filter(|s| self.is_eligible(filter, &s.id()))
            .collect();
        tracing::debug!("pruned {} of {} sources", before - kept.len(), before);
        kept
    }

    /// Summary spans are only comparable with records parsed for this year
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn failures(&self) -> &[SourceError] {
        &self.failures
    }

    /// Number of indexed sources
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}
