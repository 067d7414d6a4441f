//! Log record reconstruction and filtering for rlog
//!
//! This crate turns line-based log files into structured records, filters
//! them, and keeps per-file summaries for skipping files that cannot match.

mod discover;
mod error;
mod filter;
mod index;
mod parser;
mod query;
mod session;
mod source;

pub use discover::discover;
pub use error::{FilterError, Result, SourceError};
pub use filter::{FilterParams, FilterSpec, FilterSpecBuilder, parse_time};
pub use index::FileSummaryIndex;
pub use parser::{RecordParser, Records, parse};
pub use query::{Query, QueryMode, QueryResults, RESULT_CAP, query};
pub use session::Session;
pub use source::LogSource;

// Re-export types used in our public API
pub use rlog_types::{FileSummary, Record, SourceId, StructuredRecord};
