use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("corpus root {path} is not accessible: {source}")]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corpus root {0} is neither a file nor a directory")]
    UnsupportedRoot(PathBuf),
}

/// One traversal result, in discovery order.
#[derive(Clone, Debug, PartialEq)]
pub enum CorpusEntry {
    File(PathBuf),
    /// An entry the walk could not read. Counted as a seen file that failed
    /// classification.
    Unreadable { path: Option<PathBuf>, reason: String },
}

impl CorpusEntry {
    pub fn path(&self) -> Option<&Path> {
        match self {
            CorpusEntry::File(path) => Some(path),
            CorpusEntry::Unreadable { path, .. } => path.as_deref(),
        }
    }
}

/// Lists the files of a corpus.
///
/// A file root yields itself. A directory root is walked recursively with
/// siblings sorted by file name, so runs over the same tree see the same
/// order. Symlinks are not followed and directories are not reported.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorpusWalker;

impl CorpusWalker {
    pub fn new() -> Self {
        Self
    }

    pub fn walk(&self, root: &Path) -> Result<Vec<CorpusEntry>, CorpusError> {
        let metadata = fs::metadata(root).map_err(|source| CorpusError::InvalidRoot {
            path: root.to_path_buf(),
            source,
        })?;
        if metadata.is_file() {
            return Ok(vec![CorpusEntry::File(root.to_path_buf())]);
        }
        if !metadata.is_dir() {
            return Err(CorpusError::UnsupportedRoot(root.to_path_buf()));
        }

        let mut entries = Vec::new();
        for result in WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            match result {
                Ok(entry) if entry.file_type().is_file() => {
                    entries.push(CorpusEntry::File(entry.into_path()));
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Cannot read corpus entry: {e}");
                    entries.push(CorpusEntry::Unreadable {
                        path: e.path().map(Path::to_path_buf),
                        reason: e.to_string(),
                    });
                }
            }
        }
        log::debug!("Found {} entries under {}", entries.len(), root.display());
        Ok(entries)
    }
}
