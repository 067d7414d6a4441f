//! Settings file for rlog
//!
//! Looked up at `--config <FILE>`, or `rlog.toml` in the working directory.
//! Command-line flags override anything set here.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings file looked up when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "rlog.toml";

/// Chunk size threshold for exported results (10 MiB)
const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory receiving `result_<n>.log` chunks
    pub out_dir: PathBuf,

    /// A new chunk starts once the current one grows past this many bytes
    pub chunk_size: u64,

    /// Address the web interface listens on
    pub listen: SocketAddr,

    /// Default file-name pattern
    pub glob: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("./out"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            listen: SocketAddr::from(([127, 0, 0, 1], 5000)),
            glob: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default file if it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(settings)
    }
}
