//! Search functionality

use std::path::Path;

use crate::{
    Config, DocseekError, FlatL2Index, Result, Storage, VectorIndex, embed::Embed,
    storage::MetadataRecord,
};

/// A search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Similarity derived from distance, in (0, 1]
    pub score: f32,
    /// Raw distance reported by the index
    pub distance: f32,
    /// The matched document
    pub record: MetadataRecord,
}

/// Map a distance to a similarity score that decreases as distance grows.
pub fn score(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Embed `query` and return the `k` nearest documents, best first.
pub fn search_documents<I: VectorIndex>(
    query: &str,
    embedder: &dyn Embed,
    index: &I,
    metadata: &[MetadataRecord],
    k: usize,
) -> Result<Vec<SearchResult>> {
    let query_embedding = embedder.embed(query)?;
    let neighbors = index.search(&query_embedding, k)?;

    let results = neighbors
        .into_iter()
        .filter_map(|neighbor| {
            let record = metadata.get(neighbor.position)?;
            Some(SearchResult {
                score: score(neighbor.distance),
                distance: neighbor.distance,
                record: record.clone(),
            })
        })
        .collect();

    Ok(results)
}

/// Searcher for querying a persisted index.
pub struct Searcher<'a, I = FlatL2Index> {
    embedder: &'a dyn Embed,
    storage: Storage<I>,
}

impl<'a, I: VectorIndex> Searcher<'a, I> {
    /// Load the index and metadata; fails if either is missing or unreadable.
    pub fn open(index_path: &Path, metadata_path: &Path, embedder: &'a dyn Embed) -> Result<Self> {
        let storage = Storage::load(index_path, metadata_path)?;
        if storage.is_empty() {
            return Err(DocseekError::IndexNotFound(index_path.to_path_buf()));
        }
        Ok(Self { embedder, storage })
    }

    /// Open the index of a docseek repository.
    pub fn from_config(root: &Path, config: &Config, embedder: &'a dyn Embed) -> Result<Self> {
        Self::open(
            &config.index_file(root),
            &config.metadata_file(root),
            embedder,
        )
    }

    /// Search for documents matching the query.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        search_documents(
            query,
            self.embedder,
            &self.storage.index,
            &self.storage.metadata,
            k,
        )
    }

    /// Number of searchable documents.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maps "doc<N>" to the N-th unit vector.
    struct UnitEmbedder;

    impl Embed for UnitEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let n: usize = t.trim_start_matches("doc").parse().unwrap_or(0);
                    let mut v = vec![0.0; 10];
                    v[n % 10] = 1.0;
                    v
                })
                .collect())
        }
    }

    fn ten_documents() -> (FlatL2Index, Vec<MetadataRecord>) {
        let embedder = UnitEmbedder;
        let texts: Vec<String> = (0..10).map(|i| format!("doc{i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let mut index = FlatL2Index::new(10);
        index.add(&embedder.embed_batch(&refs).unwrap()).unwrap();

        let metadata = texts
            .iter()
            .map(|t| MetadataRecord {
                path: format!("/docs/{t}.txt"),
                folder: "/docs".to_string(),
                snippet: t.clone(),
            })
            .collect();
        (index, metadata)
    }

    #[test]
    fn test_score_monotonic() {
        assert_eq!(score(0.0), 1.0);
        assert!(score(0.5) > score(1.0));
        assert!(score(1e6) > 0.0);
    }

    #[test]
    fn test_exact_match_ranks_first() {
        let (index, metadata) = ten_documents();
        let results = search_documents("doc3", &UnitEmbedder, &index, &metadata, 5).unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(results[0].record.path, "/docs/doc3.txt");
        assert_eq!(results[0].score, 1.0);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_searcher_missing_index() {
        let temp = tempfile::tempdir().unwrap();
        let result: Result<Searcher> = Searcher::open(
            &temp.path().join("vectors.bin"),
            &temp.path().join("metadata.json"),
            &UnitEmbedder,
        );
        assert!(matches!(result, Err(DocseekError::IndexNotFound(_))));
    }

    #[test]
    fn test_searcher_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let index_path = temp.path().join("vectors.bin");
        let metadata_path = temp.path().join("metadata.json");

        let (index, metadata) = ten_documents();
        Storage { index, metadata }
            .save(&index_path, &metadata_path)
            .unwrap();

        let searcher: Searcher = Searcher::open(&index_path, &metadata_path, &UnitEmbedder).unwrap();
        assert_eq!(searcher.len(), 10);

        let results = searcher.search("doc7", 2).unwrap();
        assert_eq!(results[0].record.snippet, "doc7");
        assert_eq!(results.len(), 2);
    }
}
