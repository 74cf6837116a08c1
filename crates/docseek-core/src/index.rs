//! Incremental indexing: embed only files the persisted index has not seen

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::{
    Config, DocseekError, FlatL2Index, Result, Storage, VectorIndex,
    embed::{Embed, mean_pool},
    extract,
    storage::{self, MetadataRecord},
};

/// Type alias for progress callback: fraction complete in `[0, 1]` and a message.
pub type ProgressCallback = Box<dyn Fn(f32, &str) + Send>;

/// Share of the progress range spent on per-file work; the rest covers
/// merging and saving.
const FILE_PROGRESS_SHARE: f32 = 0.9;

/// Stats from an indexing run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildStats {
    /// Candidate paths passed in
    pub candidates: usize,
    /// Candidates not present in the existing index
    pub new_files: usize,
    /// New files that were embedded and recorded
    pub files_indexed: usize,
    /// New files skipped because extraction or embedding failed
    pub files_skipped: usize,
    /// Chunks sent to the embedder
    pub chunks_embedded: usize,
    /// Documents in the index after the run
    pub total_documents: usize,
}

/// A document ready to be appended to the index.
struct EmbeddedFile {
    vector: Vec<f32>,
    record: MetadataRecord,
    chunk_count: usize,
}

/// Builds and extends the persisted index/metadata pair.
pub struct IndexBuilder<'a> {
    index_path: PathBuf,
    metadata_path: PathBuf,
    embedder: &'a dyn Embed,
    chunk_size: usize,
    snippet_chunks: usize,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> IndexBuilder<'a> {
    /// Create a builder writing to the given index and metadata files.
    pub fn new(index_path: PathBuf, metadata_path: PathBuf, embedder: &'a dyn Embed) -> Self {
        Self {
            index_path,
            metadata_path,
            embedder,
            chunk_size: crate::DEFAULT_CHUNK_SIZE,
            snippet_chunks: crate::DEFAULT_SNIPPET_CHUNKS,
            progress_callback: None,
        }
    }

    /// Create a builder for a docseek repository using its config.
    pub fn from_config(root: &Path, config: &Config, embedder: &'a dyn Embed) -> Self {
        Self::new(config.index_file(root), config.metadata_file(root), embedder)
            .with_chunk_size(config.chunk_size)
            .with_snippet_chunks(config.snippet_chunks)
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_snippet_chunks(mut self, snippet_chunks: usize) -> Self {
        self.snippet_chunks = snippet_chunks;
        self
    }

    /// Set a callback to receive progress updates during indexing.
    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress_callback = Some(callback);
    }

    /// Emit a progress update if a callback is registered.
    fn emit_progress(&self, fraction: f32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(fraction, message);
        }
    }

    /// Bring the persisted index up to date with `files` using a flat L2 index.
    pub fn build(&self, files: &[PathBuf]) -> Result<BuildStats> {
        self.build_with::<FlatL2Index>(files)
    }

    /// Discard the persisted index and build it again from `files`.
    ///
    /// Every candidate is embedded, so changed and deleted files are
    /// reflected afterwards.
    pub fn rebuild(&self, files: &[PathBuf]) -> Result<BuildStats> {
        tracing::info!("Rebuilding index from scratch");
        storage::remove_files(&self.index_path, &self.metadata_path)?;
        self.build(files)
    }

    /// Bring the persisted index up to date with `files`.
    ///
    /// Files already recorded are never embedded again. Failures on
    /// individual files are logged and skipped; only writing the final
    /// index or metadata can fail the call. When nothing new is embedded
    /// the files on disk are left untouched.
    pub fn build_with<I: VectorIndex>(&self, files: &[PathBuf]) -> Result<BuildStats> {
        let mut stats = BuildStats {
            candidates: files.len(),
            ..BuildStats::default()
        };

        let existing = Storage::<I>::load_or_fresh(&self.index_path, &self.metadata_path);

        let new_files = pending_files(
            files,
            existing.as_ref().map_or(&[][..], |s| &s.metadata[..]),
        );

        stats.new_files = new_files.len();
        stats.total_documents = existing.as_ref().map_or(0, |s| s.len());

        if new_files.is_empty() {
            tracing::info!("No new files to index");
            self.emit_progress(1.0, "No new files to index");
            return Ok(stats);
        }

        tracing::info!("Adding {} new files to the index", new_files.len());

        let total = new_files.len();
        self.emit_progress(0.0, &format!("Starting to index {} files", total));

        let mut dimension = existing.as_ref().map(|s| s.index.dimension());
        let mut vectors = Vec::new();
        let mut records = Vec::new();

        for (i, path) in new_files.iter().enumerate() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            self.emit_progress(
                progress(i, total),
                &format!("Processing {} ({}/{})", name, i + 1, total),
            );

            match self.embed_file(path, dimension) {
                Ok(file) => {
                    if dimension.is_none() {
                        dimension = Some(file.vector.len());
                    }
                    stats.files_indexed += 1;
                    stats.chunks_embedded += file.chunk_count;
                    vectors.push(file.vector);
                    records.push(file.record);
                }
                Err(e) => {
                    tracing::warn!("Skipped {}: {}", path.display(), e);
                    stats.files_skipped += 1;
                }
            }

            self.emit_progress(
                progress(i + 1, total),
                &format!("Processed {}/{} files", i + 1, total),
            );
        }

        let Some(dimension) = dimension.filter(|_| !vectors.is_empty()) else {
            tracing::warn!("No new embeddings to add to index");
            self.emit_progress(1.0, "Completed - no new content to index");
            return Ok(stats);
        };

        self.emit_progress(FILE_PROGRESS_SHARE, "Preparing embeddings...");

        let mut storage = existing.unwrap_or_else(|| Storage {
            index: I::new(dimension),
            metadata: Vec::new(),
        });
        storage.index.add(&vectors)?;
        storage.metadata.extend(records);

        self.emit_progress(0.95, "Saving index to disk...");
        storage.save(&self.index_path, &self.metadata_path)?;

        stats.total_documents = storage.len();
        tracing::info!(
            "Added {} documents; index now holds {}",
            stats.files_indexed,
            stats.total_documents
        );
        self.emit_progress(1.0, "Indexing complete!");

        Ok(stats)
    }

    /// Extract, chunk and embed one file into a single document vector.
    fn embed_file(&self, path: &Path, dimension: Option<usize>) -> Result<EmbeddedFile> {
        let text = extract::extract_text(path);
        let chunks = extract::chunk_text(&text, self.chunk_size);
        if chunks.is_empty() {
            return Err(DocseekError::Extract("no text extracted".to_string()));
        }

        let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        if embeddings.len() != chunks.len() {
            return Err(DocseekError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let vector = mean_pool(&embeddings).ok_or_else(|| {
            DocseekError::Embedding("embeddings have inconsistent dimensions".to_string())
        })?;

        if let Some(expected) = dimension {
            if vector.len() != expected {
                return Err(DocseekError::Dimension {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        tracing::debug!("Embedded {} ({} chunks)", path.display(), chunks.len());

        Ok(EmbeddedFile {
            vector,
            record: MetadataRecord::from_path(path, &chunks, self.snippet_chunks),
            chunk_count: chunks.len(),
        })
    }
}

/// Candidates not yet recorded in `indexed`, in input order and without
/// duplicates.
///
/// Records store paths as UTF-8, so a path that is not valid UTF-8 could
/// never be matched again. Such paths are skipped with a warning.
pub fn pending_files<'p>(files: &'p [PathBuf], indexed: &[MetadataRecord]) -> Vec<&'p Path> {
    let indexed: HashSet<&str> = indexed.iter().map(|m| m.path.as_str()).collect();
    let mut seen = HashSet::new();

    files
        .iter()
        .filter_map(|path| {
            let Some(key) = path.to_str() else {
                tracing::warn!("Skipped {}: path is not valid UTF-8", path.display());
                return None;
            };
            (!indexed.contains(key) && seen.insert(key)).then_some(path.as_path())
        })
        .collect()
}

fn progress(done: usize, total: usize) -> f32 {
    done as f32 / total as f32 * FILE_PROGRESS_SHARE
}
