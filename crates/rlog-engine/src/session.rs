use std::path::PathBuf;

use crate::discover::discover;
use crate::filter::FilterSpec;
use crate::index::FileSummaryIndex;
use crate::query::{Query, QueryMode, QueryResults};

/// Discovered sources plus their optional summary index.
///
/// Both are fixed for the lifetime of the session; open a new session to
/// pick up new files.
#[derive(Debug, Default)]
pub struct Session {
    /// Files and directories as given by the caller
    inputs: Vec<PathBuf>,

    /// Discovered files, lexicographically ordered
    sources: Vec<PathBuf>,

    index: Option<FileSummaryIndex>,
}

impl Session {
    /// Discover sources under `inputs` without building an index
    pub fn open(inputs: Vec<PathBuf>) -> Self {
        let sources = discover(&inputs);
        Self {
            inputs,
            sources,
            index: None,
        }
    }

    /// Discover sources and build their summary index
    pub fn indexed(inputs: Vec<PathBuf>) -> Self {
        let mut session = Self::open(inputs);
        session.rebuild_index();
        session
    }

    pub fn rebuild_index(&mut self) -> &FileSummaryIndex {
        self.index.insert(FileSummaryIndex::build(&self.sources))
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn index(&self) -> Option<&FileSummaryIndex> {
        self.index.as_ref()
    }

    /// A query over this session's sources, pruned with its index
    pub fn query<'a>(&'a self, filter: &'a FilterSpec) -> Query<'a> {
        Query::new(filter).with_index(self.index.as_ref())
    }

    /// Run `filter` in `mode` over this session's sources
    pub fn run<'a>(
        &'a self,
        filter: &'a FilterSpec,
        mode: QueryMode,
    ) -> QueryResults<'a, std::vec::IntoIter<&'a PathBuf>> {
        self.query(filter).with_mode(mode).run(&self.sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_new_session_sees_new_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.log"),
            "[1 main,05-12 10:00:00.0]: one\n[1 io,05-12 10:00:01.0]: two\n",
        )
        .unwrap();

        let session = Session::indexed(vec![dir.path().to_path_buf()]);
        assert_eq!(session.sources().len(), 1);
        assert_eq!(session.index().map(|i| i.len()), Some(1));

        let filter = FilterSpec::builder().thread("io").build().unwrap();
        let out: Vec<_> = session
            .run(&filter, QueryMode::Bounded)
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, " two");

        // new data is invisible until the session is refreshed
        fs::write(dir.path().join("b.log"), "[1 io,05-12 11:00:00.0]: three\n").unwrap();
        assert_eq!(session.run(&filter, QueryMode::Bounded).count(), 1);

        let mut session = Session::open(session.inputs().to_vec());
        assert!(session.index().is_none());
        assert_eq!(session.sources().len(), 2);
        assert_eq!(session.rebuild_index().len(), 2);
        assert_eq!(session.run(&filter, QueryMode::Bounded).count(), 2);
    }

    #[test]
    fn test_session_without_index() {
        let session = Session::open(vec![PathBuf::from("/definitely/not/here")]);
        assert!(session.index().is_none());
        assert!(session.sources().is_empty());
        assert_eq!(session.run(&FilterSpec::any(), QueryMode::Unbounded).count(), 0);
    }
}
