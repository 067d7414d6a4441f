use chrono::{Datelike, Local, NaiveDateTime};
use regex::{Captures, Regex};
use std::io::BufRead;
use std::sync::LazyLock;

use rlog_types::{Record, SourceId};

use crate::error::SourceError;
use crate::source::LogSource;

/// `[<LEVEL> <THREAD>,<MM-DD HH:MM:SS.fff>]:<CONTENT>`
///
/// The thread label cannot contain `,` or `]`; such lines are treated as
/// continuation lines.
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*\[([A-Za-z0-9]+)\s+([^,\]]+),(\d{2}-\d{2}\s\d{2}:\d{2}:\d{2}\.\d+)\]:(.*)$",
    )
    .expect("header pattern compiles")
});

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parser turning line-based sources into structured records
#[derive(Clone, Debug)]
pub struct RecordParser {
    /// Year prepended to header timestamps, which only carry month and day
    year: i32,

    /// Whether timestamps are parsed into calendar values
    timestamps: bool,
}

impl RecordParser {
    /// Create a parser using the current local year
    pub fn new(want_timestamps: bool) -> Self {
        Self {
            year: Local::now().year(),
            timestamps: want_timestamps,
        }
    }

    /// Override the year used to complete header timestamps
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    /// Turn timestamp materialization on or off
    pub fn with_timestamps(mut self, want_timestamps: bool) -> Self {
        self.timestamps = want_timestamps;
        self
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Stream records out of `sources`, in order, one open source at a time
    pub fn parse<I>(&self, sources: I) -> Records<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: LogSource,
    {
        Records {
            parser: self.clone(),
            sources: sources.into_iter(),
            active: None,
            pending: None,
            deferred: None,
            line: String::new(),
        }
    }

    /// Check whether a line (terminator included or not) is a header line
    pub fn is_header(line: &str) -> bool {
        HEADER.is_match(strip_terminator(line))
    }

    /// Start a record from a header line, or `None` if the line is a continuation
    fn start_record(
        &self,
        line: &str,
        source: &SourceId,
        line_number: u64,
    ) -> Option<Result<Record, SourceError>> {
        let caps = HEADER.captures(strip_terminator(line))?;
        Some(self.build_record(&caps, line, source, line_number))
    }

    fn build_record(
        &self,
        caps: &Captures<'_>,
        line: &str,
        source: &SourceId,
        line_number: u64,
    ) -> Result<Record, SourceError> {
        let stamp = &caps[3];

        let timestamp = if self.timestamps {
            let full = format!("{}-{}", self.year, stamp);
            let parsed = NaiveDateTime::parse_from_str(&full, STAMP_FORMAT).map_err(|_| {
                SourceError::MalformedTimestamp {
                    source_id: source.clone(),
                    line: line_number,
                    text: stamp.to_string(),
                }
            })?;
            Some(parsed)
        } else {
            None
        };

        Ok(Record {
            source: source.clone(),
            line: line_number,
            level: caps[1].to_string(),
            thread: caps[2].to_string(),
            stamp: stamp.to_string(),
            timestamp,
            content: caps[4].to_string(),
            raw: line.to_string(),
        })
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Stream records from `sources` with the current year
pub fn parse<I>(sources: I, want_timestamps: bool) -> Records<I::IntoIter>
where
    I: IntoIterator,
    I::Item: LogSource,
{
    RecordParser::new(want_timestamps).parse(sources)
}

/// Source currently being read
struct ActiveSource {
    id: SourceId,
    reader: Box<dyn BufRead>,
    line_number: u64,
}

/// Lazy, single-pass record stream.
///
/// Holds at most one open source and one record under construction. A record
/// is yielded once the next header line shows up or its source runs out, so
/// records never span two sources. After a [`SourceError`] the rest of that
/// source is skipped and reading continues with the next one.
pub struct Records<I>
where
    I: Iterator,
    I::Item: LogSource,
{
    parser: RecordParser,
    sources: I,
    active: Option<ActiveSource>,
    pending: Option<Record>,
    deferred: Option<SourceError>,
    line: String,
}

impl<I> Records<I>
where
    I: Iterator,
    I::Item: LogSource,
{
    /// Abandon the active source, yielding its pending record before `err`
    fn fail_source(&mut self, err: SourceError) -> Result<Record, SourceError> {
        self.active = None;
        match self.pending.take() {
            Some(record) => {
                self.deferred = Some(err);
                Ok(record)
            }
            None => Err(err),
        }
    }
}

impl<I> Iterator for Records<I>
where
    I: Iterator,
    I::Item: LogSource,
{
    type Item = Result<Record, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(err) = self.deferred.take() {
                return Some(Err(err));
            }

            if self.active.is_none() {
                // pending is always empty here: it is flushed when a source ends
                let source = self.sources.next()?;
                let id = source.id();
                tracing::debug!("reading {}", id.display());

                match source.open() {
                    Ok(reader) => {
                        self.active = Some(ActiveSource {
                            id,
                            reader,
                            line_number: 0,
                        });
                    }
                    Err(error) => {
                        return Some(Err(SourceError::UnreadableSource {
                            source_id: id,
                            error,
                        }));
                    }
                }
                continue;
            }

            self.line.clear();
            let Some(active) = self.active.as_mut() else {
                continue;
            };

            match active.reader.read_line(&mut self.line) {
                Ok(0) => {
                    self.active = None;
                    if let Some(record) = self.pending.take() {
                        return Some(Ok(record));
                    }
                }
                Ok(_) => {
                    active.line_number += 1;
                    let id = active.id.clone();
                    let line_number = active.line_number;

                    match self.parser.start_record(&self.line, &id, line_number) {
                        Some(Ok(record)) => {
                            if let Some(done) = self.pending.replace(record) {
                                return Some(Ok(done));
                            }
                        }
                        Some(Err(err)) => return Some(self.fail_source(err)),
                        None => {
                            // continuation line, or an orphan before the first header
                            if let Some(record) = self.pending.as_mut() {
                                record.content.push_str(&self.line);
                                record.raw.push_str(&self.line);
                            }
                        }
                    }
                }
                Err(error) => {
                    let source_id = active.id.clone();
                    return Some(self.fail_source(SourceError::UnreadableSource {
                        source_id,
                        error,
                    }));
                }
            }
        }
    }
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
