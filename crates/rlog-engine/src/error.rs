//! Error types for the log engine.

use std::io;

use thiserror::Error;

use rlog_types::SourceId;

/// Per-source failures raised while reading records.
///
/// Each one identifies the offending source; the record stream moves on to
/// the next source after yielding it.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A header's timestamp could not be parsed while materialization was on.
    #[error("malformed timestamp {text:?} in {} at line {line}", source_id.display())]
    MalformedTimestamp {
        source_id: SourceId,
        line: u64,
        text: String,
    },

    /// The source could not be opened or read.
    #[error("cannot read {}: {error}", source_id.display())]
    UnreadableSource {
        source_id: SourceId,
        #[source]
        error: io::Error,
    },
}

impl SourceError {
    /// The source this failure belongs to.
    pub fn source_id(&self) -> &SourceId {
        match self {
            Self::MalformedTimestamp { source_id, .. } => source_id,
            Self::UnreadableSource { source_id, .. } => source_id,
        }
    }
}

/// Errors raised while constructing a filter, before any parsing starts.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A pattern failed to compile.
    #[error("invalid {field} pattern {pattern:?}: {error}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        #[source]
        error: regex::Error,
    },

    /// The level filter is not a number.
    #[error("invalid level: {0:?} is not a number")]
    InvalidLevel(String),

    /// A time bound could not be parsed.
    #[error("invalid time: {0:?}")]
    InvalidTime(String),

    /// The start bound lies after the end bound.
    #[error("empty time window: start {start} is after end {end}")]
    EmptyWindow { start: String, end: String },
}

/// Result type alias for filter construction.
pub type Result<T> = std::result::Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    #[test]
    fn error_display_messages() {
        let err = SourceError::MalformedTimestamp {
            source_id: Arc::from(Path::new("a.log")),
            line: 7,
            text: "02-30 10:00:00.1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed timestamp \"02-30 10:00:00.1\" in a.log at line 7"
        );

        let err = FilterError::InvalidLevel("high".to_string());
        assert_eq!(err.to_string(), "invalid level: \"high\" is not a number");
    }

    #[test]
    fn error_source_id() {
        let err = SourceError::UnreadableSource {
            source_id: Arc::from(Path::new("missing.log")),
            error: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.source_id().as_ref(), Path::new("missing.log"));
        assert!(err.to_string().contains("missing.log"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SourceError>();
        assert_send_sync::<FilterError>();
    }
}
