//! docseek-core: Resumable local document search
//!
//! This library scans a directory for documents, extracts and chunks their
//! text, embeds each document once and keeps the resulting vectors in a
//! persisted index that later runs extend instead of rebuilding.

pub mod config;
pub mod consts;
pub mod discover;
pub mod embed;
pub mod extract;
pub mod index;
pub mod scan;
pub mod search;
pub mod storage;
pub mod vector;

pub use config::Config;
pub use consts::*;
pub use discover::find_root;
pub use embed::{Embed, Embedder};
pub use index::{BuildStats, IndexBuilder, pending_files};
pub use scan::scan_files;
pub use search::{SearchResult, Searcher, search_documents};
pub use storage::{MetadataRecord, Storage};
pub use vector::{FlatL2Index, Neighbor, VectorIndex};

#[derive(Debug, thiserror::Error)]
pub enum DocseekError {
    #[error("Not in a docseek repository (no .docseek folder found)")]
    NotInRepo,

    #[error("Already initialized: {0}")]
    AlreadyInitialized(std::path::PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(std::path::PathBuf),

    #[error("Index not found: {0}")]
    IndexNotFound(std::path::PathBuf),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Extraction error: {0}")]
    Extract(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, DocseekError>;
