//! Configuration handling for .docseek/config.json

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_CHUNK_SIZE, DEFAULT_INDEX_PATH, DEFAULT_MAX_FILE_SIZE, DEFAULT_METADATA_PATH,
    DEFAULT_MODEL, DEFAULT_SNIPPET_CHUNKS, DEFAULT_TOP_K, DocseekError, Result, discover,
};

/// Configuration stored in .docseek/config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Embedding model name (fastembed model ID)
    #[serde(default = "default_model")]
    pub model: String,

    /// Chunk budget in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum file size to index (bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Number of leading chunks kept as a document's snippet
    #[serde(default = "default_snippet_chunks")]
    pub snippet_chunks: usize,

    /// Default number of search results
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Directory names to skip on top of the built-in list
    #[serde(default)]
    pub exclude_dirs: Vec<String>,

    /// Vector index file, relative to the repository root
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Metadata file, relative to the repository root
    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_snippet_chunks() -> usize {
    DEFAULT_SNIPPET_CHUNKS
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_index_path() -> PathBuf {
    PathBuf::from(DEFAULT_INDEX_PATH)
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from(DEFAULT_METADATA_PATH)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            chunk_size: default_chunk_size(),
            max_file_size: default_max_file_size(),
            snippet_chunks: default_snippet_chunks(),
            top_k: default_top_k(),
            exclude_dirs: Vec::new(),
            index_path: default_index_path(),
            metadata_path: default_metadata_path(),
        }
    }
}

impl Config {
    /// Load config from the .docseek directory.
    pub fn load(root: &Path) -> Result<Self> {
        let path = discover::config_path(root);
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Self = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the .docseek directory.
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = discover::config_path(root);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DocseekError::Config("chunk_size must be positive".into()));
        }
        if self.top_k == 0 {
            return Err(DocseekError::Config("top_k must be positive".into()));
        }
        Ok(())
    }

    /// Absolute location of the vector index for a repository root.
    pub fn index_file(&self, root: &Path) -> PathBuf {
        root.join(&self.index_path)
    }

    /// Absolute location of the metadata file for a repository root.
    pub fn metadata_file(&self, root: &Path) -> PathBuf {
        root.join(&self.metadata_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DOCSEEK_DIR;

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.max_file_size, 100 * 1024 * 1024);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join(DOCSEEK_DIR)).unwrap();
        std::fs::write(
            discover::config_path(temp.path()),
            r#"{"chunk_size": 200, "exclude_dirs": ["build"]}"#,
        )
        .unwrap();

        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.chunk_size, 200);
        assert_eq!(config.exclude_dirs, vec!["build".to_string()]);
        assert_eq!(config.snippet_chunks, DEFAULT_SNIPPET_CHUNKS);
    }

    #[test]
    fn test_save_and_reload() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join(DOCSEEK_DIR)).unwrap();

        let config = Config {
            top_k: 9,
            ..Config::default()
        };
        config.save(temp.path()).unwrap();

        assert_eq!(Config::load(temp.path()).unwrap().top_k, 9);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join(DOCSEEK_DIR)).unwrap();
        std::fs::write(discover::config_path(temp.path()), r#"{"chunk_size": 0}"#).unwrap();

        assert!(matches!(
            Config::load(temp.path()),
            Err(DocseekError::Config(_))
        ));
    }

    #[test]
    fn test_index_paths_are_rooted() {
        let config = Config::default();
        let root = Path::new("/data/docs");
        assert_eq!(
            config.index_file(root),
            PathBuf::from("/data/docs/.docseek/index/vectors.bin")
        );
        assert_eq!(
            config.metadata_file(root),
            PathBuf::from("/data/docs/.docseek/index/metadata.json")
        );
    }
}
