//! File scanning: walk a directory tree and collect indexable documents

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::{DocseekError, Result, extract};

/// Directory names that are never descended into.
pub const EXCLUDED_DIR_NAMES: &[&str] = &[
    "AppData",
    "anaconda3",
    "node_modules",
    "__pycache__",
    "WindowsNoEditor",
    ".git",
    ".vscode",
    ".conda",
    ".cache",
    ".mamba",
    "env",
    "venv",
];

/// Directory walker that yields candidate files for indexing.
#[derive(Debug, Clone)]
pub struct Scanner {
    max_file_size: u64,
    exclude_dirs: Vec<String>,
}

impl Scanner {
    /// Create a scanner that skips files larger than `max_file_size` bytes.
    pub fn new(max_file_size: u64) -> Self {
        Self {
            max_file_size,
            exclude_dirs: EXCLUDED_DIR_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Skip additional directory names on top of [`EXCLUDED_DIR_NAMES`].
    pub fn with_excluded_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_dirs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Collect every supported file under `root` that is within the size limit.
    ///
    /// Paths are absolute. Entries that cannot be read or stat'd are logged
    /// and skipped; only an unusable root is an error.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = root.canonicalize()?;
        if !root.is_dir() {
            return Err(DocseekError::NotADirectory(root));
        }

        let excluded = self.exclude_dirs.clone();
        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !(name.starts_with('.') || excluded.iter().any(|e| e.as_str() == name.as_ref()))
            })
            .build();

        let mut files = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Walk error: {}", e);
                    continue;
                }
            };

            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if !(file_type.is_file() || file_type.is_symlink()) {
                continue;
            }

            let path = entry.path();
            if !extract::is_supported(path) {
                continue;
            }

            // links are kept under their own path when the target is a file
            let metadata = if file_type.is_symlink() {
                std::fs::metadata(path).map_err(|e| e.to_string())
            } else {
                entry.metadata().map_err(|e| e.to_string())
            };

            match metadata {
                Ok(metadata) if !metadata.is_file() => {}
                Ok(metadata) if metadata.len() <= self.max_file_size => {
                    files.push(path.to_path_buf());
                }
                Ok(metadata) => {
                    tracing::debug!(
                        "Skipping large file: {} ({} bytes)",
                        path.display(),
                        metadata.len()
                    );
                }
                Err(e) => {
                    tracing::warn!("Skipped {}: {}", path.display(), e);
                }
            }
        }

        Ok(files)
    }
}

/// Scan `root` with the built-in directory exclusions.
pub fn scan_files(root: &Path, max_file_size: u64) -> Result<Vec<PathBuf>> {
    Scanner::new(max_file_size).scan(root)
}
