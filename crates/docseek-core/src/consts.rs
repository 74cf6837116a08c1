/// The name of the docseek folder (like .git)
pub const DOCSEEK_DIR: &str = ".docseek";

/// Default embedding model
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Default chunk budget in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default number of chunks kept in a document snippet
pub const DEFAULT_SNIPPET_CHUNKS: usize = 300;

/// Default max file size (100MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Default number of search results
pub const DEFAULT_TOP_K: usize = 5;

/// Default vector index location, relative to the repository root
pub const DEFAULT_INDEX_PATH: &str = ".docseek/index/vectors.bin";

/// Default metadata location, relative to the repository root
pub const DEFAULT_METADATA_PATH: &str = ".docseek/index/metadata.json";
