use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Expand inputs into a sorted, de-duplicated list of files.
///
/// Files are taken as given; directories are walked recursively. Inputs that
/// do not exist are logged and skipped.
pub fn discover<P: AsRef<Path>>(inputs: &[P]) -> Vec<PathBuf> {
    let mut files = BTreeSet::new();

    for input in inputs {
        let path = input.as_ref();
        if path.is_file() {
            files.insert(path.to_path_buf());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(true) {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        files.insert(entry.into_path());
                    }
                    Ok(_) => {}
                    Err(err) => tracing::warn!("skipping entry under {}: {}", path.display(), err),
                }
            }
        } else {
            tracing::warn!("input {} does not exist", path.display());
        }
    }

    tracing::debug!("discovered {} files", files.len());
    files.into_iter().collect()
}
