use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rlog_types::SourceId;

/// Something records can be read from, opened lazily one at a time
pub trait LogSource {
    /// Identifier reported on records and failures
    fn id(&self) -> SourceId;

    /// Open a fresh reader positioned at the start of the source
    fn open(&self) -> io::Result<Box<dyn BufRead>>;

    /// File name used by the source-name filter
    fn name(&self) -> String {
        let id = self.id();
        id.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.display().to_string())
    }
}

impl LogSource for Path {
    fn id(&self) -> SourceId {
        Arc::from(self)
    }

    fn open(&self) -> io::Result<Box<dyn BufRead>> {
        let file = File::open(self)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

impl LogSource for PathBuf {
    fn id(&self) -> SourceId {
        self.as_path().id()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead>> {
        self.as_path().open()
    }
}

impl<T: LogSource + ?Sized> LogSource for &T {
    fn id(&self) -> SourceId {
        (**self).id()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead>> {
        (**self).open()
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// In-memory source for unit tests
#[cfg(test)]
#[derive(Clone, Debug)]
pub(crate) struct TextSource {
    pub path: PathBuf,
    pub text: String,
}

#[cfg(test)]
impl TextSource {
    pub(crate) fn new(path: &str, text: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            text: text.to_string(),
        }
    }
}

#[cfg(test)]
impl LogSource for TextSource {
    fn id(&self) -> SourceId {
        Arc::from(self.path.as_path())
    }

    fn open(&self) -> io::Result<Box<dyn BufRead>> {
        Ok(Box::new(io::Cursor::new(self.text.clone().into_bytes())))
    }
}
