//! WAV file discovery
//!
//! Recursive traversal of a working folder, collecting files with a `wav`
//! extension. Individual unreadable entries are logged and skipped; only a
//! missing or non-directory root is fatal.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};
use wavedeck_common::{Error, Result};

// System droppings that should never count as working-set entries
const IGNORED_NAMES: &[&str] = &[".DS_Store", "Thumbs.db"];

fn is_ignored(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.') || IGNORED_NAMES.contains(&name))
        .unwrap_or(false)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Collect all WAV files under `root`, depth-first, skipping dotfiles and
/// system entries.
pub fn scan_folder(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::NotFound(root.display().to_string()));
    }
    if !root.is_dir() {
        return Err(Error::InvalidInput(format!(
            "not a directory: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_ignored(e));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_wav(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
            Err(e) => {
                // Keep scanning; one unreadable entry must not kill the walk
                warn!(error = %e, "Error accessing entry during scan");
            }
        }
    }

    files.sort();
    Ok(files)
}
