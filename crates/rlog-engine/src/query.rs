use rlog_types::Record;

use crate::error::SourceError;
use crate::filter::FilterSpec;
use crate::index::FileSummaryIndex;
use crate::parser::{RecordParser, Records};
use crate::source::LogSource;

/// Maximum number of matches returned by a bounded query
pub const RESULT_CAP: usize = 1000;

/// Whether a query stops after [`RESULT_CAP`] matches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryMode {
    /// Stop after [`RESULT_CAP`] matches
    Bounded,
    /// Yield every match
    Unbounded,
}

impl QueryMode {
    /// Interactive queries are capped unless both time bounds narrow them
    pub fn for_filter(filter: &FilterSpec) -> Self {
        if filter.has_window() {
            Self::Unbounded
        } else {
            Self::Bounded
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Bounded => Some(RESULT_CAP),
            Self::Unbounded => None,
        }
    }
}

/// A query over an ordered list of sources
#[derive(Clone, Debug)]
pub struct Query<'a> {
    filter: &'a FilterSpec,
    index: Option<&'a FileSummaryIndex>,
    mode: QueryMode,
    parser: RecordParser,
}

impl<'a> Query<'a> {
    /// Create a query in the mode implied by `filter`
    pub fn new(filter: &'a FilterSpec) -> Self {
        Self {
            filter,
            index: None,
            mode: QueryMode::for_filter(filter),
            parser: RecordParser::new(filter.constrains_time()),
        }
    }

    /// Prune sources with a summary index before parsing
    pub fn with_index(mut self, index: Option<&'a FileSummaryIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the year used to complete header timestamps
    pub fn with_year(mut self, year: i32) -> Self {
        self.parser = self.parser.with_year(year);
        self
    }

    /// Resolve the surviving sources and stream matching records from them.
    ///
    /// Per-source failures are yielded in place and do not count towards
    /// the cap; reading carries on with the next source.
    pub fn run<I>(&self, sources: I) -> QueryResults<'a, std::vec::IntoIter<I::Item>>
    where
        I: IntoIterator,
        I::Item: LogSource,
    {
        let candidates: Vec<I::Item> = sources
            .into_iter()
            .filter(|s| self.filter.matches_source_name(&s.name()))
            .collect();

        let candidates = match self.index {
            Some(index) if index.year() == self.parser.year() => {
                index.prune(self.filter, candidates)
            }
            Some(index) => {
                tracing::debug!(
                    "index built for {}, parsing for {}; not pruning",
                    index.year(),
                    self.parser.year()
                );
                candidates
            }
            None => candidates,
        };
        tracing::debug!("querying {} sources ({:?})", candidates.len(), self.mode);

        QueryResults {
            records: self.parser.parse(candidates),
            filter: self.filter,
            limit: self.mode.limit(),
            yielded: 0,
        }
    }
}

/// Run `filter` over `sources`
pub fn query<'a, I>(
    sources: I,
    filter: &'a FilterSpec,
    index: Option<&'a FileSummaryIndex>,
    mode: QueryMode,
) -> QueryResults<'a, std::vec::IntoIter<I::Item>>
where
    I: IntoIterator,
    I::Item: LogSource,
{
    Query::new(filter).with_index(index).with_mode(mode).run(sources)
}

/// Lazy stream of matching records; ends early once the cap is reached
pub struct QueryResults<'a, I>
where
    I: Iterator,
    I::Item: LogSource,
{
    records: Records<I>,
    filter: &'a FilterSpec,
    limit: Option<usize>,
    yielded: usize,
}

impl<I> QueryResults<'_, I>
where
    I: Iterator,
    I::Item: LogSource,
{
    /// Number of matches yielded so far
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Whether the cap has been reached
    pub fn is_capped(&self) -> bool {
        self.limit.is_some_and(|limit| self.yielded >= limit)
    }
}

impl<I> Iterator for QueryResults<'_, I>
where
    I: Iterator,
    I::Item: LogSource,
{
    type Item = Result<Record, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_capped() {
            return None;
        }

        loop {
            match self.records.next()? {
                Ok(record) => {
                    if self.filter.matches(&record) {
                        self.yielded += 1;
                        return Some(Ok(record));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
