//! Persisted index/metadata pair
//!
//! The vector index lives in one binary file and the metadata records in a
//! JSON array next to it. Record `i` describes vector `i`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{DocseekError, FlatL2Index, Result, VectorIndex};

/// Per-document descriptor stored alongside its vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Absolute file path
    pub path: String,
    /// Parent directory of `path`
    pub folder: String,
    /// Leading chunks of the extracted text, separated by blank lines
    pub snippet: String,
}

impl MetadataRecord {
    /// Describe a document from its path and chunks, keeping at most
    /// `snippet_chunks` chunks in the snippet.
    pub fn from_path(path: &Path, chunks: &[String], snippet_chunks: usize) -> Self {
        let folder = path
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let keep = chunks.len().min(snippet_chunks);

        Self {
            path: path.to_string_lossy().to_string(),
            folder,
            snippet: chunks[..keep].join("\n\n"),
        }
    }
}

/// Load metadata records from disk.
pub fn load_metadata(path: &Path) -> Result<Vec<MetadataRecord>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Save metadata records to disk.
pub fn save_metadata(path: &Path, records: &[MetadataRecord]) -> Result<()> {
    let content = serde_json::to_string_pretty(records)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// A loaded vector index with its aligned metadata.
#[derive(Debug)]
pub struct Storage<I = FlatL2Index> {
    pub index: I,
    pub metadata: Vec<MetadataRecord>,
}

impl<I: VectorIndex> Storage<I> {
    /// Load the pair, failing if either file is missing, unreadable, or the
    /// two disagree on length.
    pub fn load(index_path: &Path, metadata_path: &Path) -> Result<Self> {
        for path in [index_path, metadata_path] {
            if !path.exists() {
                return Err(DocseekError::IndexNotFound(path.to_path_buf()));
            }
        }

        let index = I::load(index_path)?;
        let metadata = load_metadata(metadata_path)?;

        if index.len() != metadata.len() {
            return Err(DocseekError::Storage(format!(
                "Index has {} vectors but metadata has {} records",
                index.len(),
                metadata.len()
            )));
        }

        Ok(Self { index, metadata })
    }

    /// Load the pair, or `None` when there is no usable prior state.
    pub fn load_or_fresh(index_path: &Path, metadata_path: &Path) -> Option<Self> {
        match Self::load(index_path, metadata_path) {
            Ok(storage) => {
                tracing::info!(
                    "Found existing index with {} documents",
                    storage.metadata.len()
                );
                Some(storage)
            }
            Err(DocseekError::IndexNotFound(path)) => {
                tracing::info!("No existing index at {}, starting fresh", path.display());
                None
            }
            Err(e) => {
                tracing::info!("Error loading existing index, rebuilding: {}", e);
                None
            }
        }
    }

    /// Write both files, replacing any previous versions.
    ///
    /// Each file is written beside its destination and renamed into place.
    pub fn save(&self, index_path: &Path, metadata_path: &Path) -> Result<()> {
        let index_tmp = staging_path(index_path);
        let metadata_tmp = staging_path(metadata_path);

        for path in [index_path, metadata_path] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        self.index.save(&index_tmp)?;
        save_metadata(&metadata_tmp, &self.metadata)?;

        std::fs::rename(&index_tmp, index_path)?;
        std::fs::rename(&metadata_tmp, metadata_path)?;

        Ok(())
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}

/// Delete the index and metadata files. Files that are already gone are fine.
pub fn remove_files(index_path: &Path, metadata_path: &Path) -> Result<()> {
    for path in [index_path, metadata_path] {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::info!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
