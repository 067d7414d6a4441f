//! Chunked file output for exported records.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use rlog_types::Record;

const CHUNK_PREFIX: &str = "result_";
const CHUNK_SUFFIX: &str = ".log";

/// Writes records' raw text into `result_<n>.log` files, moving on to the
/// next file once the current one grows past the size limit
pub struct ChunkedSink {
    dir: PathBuf,
    limit: u64,
    current: Option<BufWriter<File>>,
    current_size: u64,
    summary: SinkSummary,
}

/// What a sink wrote
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SinkSummary {
    pub records: usize,
    pub chunks: usize,
    pub bytes: u64,
}

impl ChunkedSink {
    /// Prepare `dir`, removing chunks left over from a previous export
    pub fn create(dir: &Path, limit: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(CHUNK_PREFIX)
                && name.ends_with(CHUNK_SUFFIX)
                && entry.file_type()?.is_file()
            {
                fs::remove_file(entry.path())?;
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            limit,
            current: None,
            current_size: 0,
            summary: SinkSummary::default(),
        })
    }

    pub fn write(&mut self, record: &Record) -> io::Result<()> {
        let text = record.as_plain_text().as_bytes();

        if self.current.is_none() || self.current_size > self.limit {
            self.rotate()?;
        }
        if let Some(out) = self.current.as_mut() {
            out.write_all(text)?;
        }

        self.current_size += text.len() as u64;
        self.summary.bytes += text.len() as u64;
        self.summary.records += 1;
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut out) = self.current.take() {
            out.flush()?;
        }

        let path = self.chunk_path(self.summary.chunks);
        tracing::debug!("writing {}", path.display());
        self.current = Some(BufWriter::new(File::create(path)?));
        self.current_size = 0;
        self.summary.chunks += 1;
        Ok(())
    }

    fn chunk_path(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{CHUNK_PREFIX}{index}{CHUNK_SUFFIX}"))
    }

    /// Flush the last chunk
    pub fn finish(mut self) -> io::Result<SinkSummary> {
        if let Some(mut out) = self.current.take() {
            out.flush()?;
        }
        Ok(self.summary)
    }
}
