//! Vector index: exact nearest-neighbour search over fixed-dimension vectors

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{DocseekError, Result};

/// Leading bytes of a serialized index blob
const MAGIC: [u8; 4] = *b"DSVI";

/// Current blob layout version
const FORMAT_VERSION: u32 = 1;

/// A search hit: the position of a stored vector and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Append-only nearest-neighbour index persisted as a single file.
pub trait VectorIndex: Sized {
    /// Create an empty index for vectors of `dimension` components.
    fn new(dimension: usize) -> Self;

    fn dimension(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append vectors; positions continue from the current length.
    ///
    /// Either every vector is added or none is.
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()>;

    /// The `k` closest stored vectors, nearest first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    fn save(&self, path: &Path) -> Result<()>;

    fn load(path: &Path) -> Result<Self>;
}

/// Brute-force index ranking by squared Euclidean distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct IndexBlob {
    magic: [u8; 4],
    version: u32,
    index: FlatL2Index,
}

impl FlatL2Index {
    fn vector(&self, position: usize) -> &[f32] {
        let start = position * self.dimension;
        &self.data[start..start + self.dimension]
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(DocseekError::Dimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl VectorIndex for FlatL2Index {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        for vector in vectors {
            self.check_dimension(vector)?;
        }
        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_dimension(query)?;

        let mut neighbors: Vec<Neighbor> = (0..self.len())
            .map(|position| Neighbor {
                position,
                distance: squared_l2(query, self.vector(position)),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let blob = IndexBlob {
            magic: MAGIC,
            version: FORMAT_VERSION,
            index: self.clone(),
        };
        let bytes = bincode::serialize(&blob)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let blob: IndexBlob = bincode::deserialize(&bytes)?;

        if blob.magic != MAGIC {
            return Err(DocseekError::Storage(format!(
                "{} is not a vector index",
                path.display()
            )));
        }
        if blob.version != FORMAT_VERSION {
            return Err(DocseekError::Storage(format!(
                "Unsupported index version {} in {}",
                blob.version,
                path.display()
            )));
        }

        let index = blob.index;
        if index.dimension == 0 || index.data.len() % index.dimension != 0 {
            return Err(DocseekError::Storage(format!(
                "Truncated vector data in {}",
                path.display()
            )));
        }

        Ok(index)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dim: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[hot] = 1.0;
        v
    }

    #[test]
    fn test_add_and_len() {
        let mut index = FlatL2Index::new(3);
        assert!(index.is_empty());

        index.add(&[unit(3, 0), unit(3, 1)]).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimension(), 3);
    }

    #[test]
    fn test_add_rejects_wrong_dimension() {
        let mut index = FlatL2Index::new(3);
        let result = index.add(&[unit(3, 0), vec![1.0, 2.0]]);

        assert!(matches!(
            result,
            Err(DocseekError::Dimension {
                expected: 3,
                actual: 2
            })
        ));
        assert!(index.is_empty());
    }

    #[test]
    fn test_search_orders_by_distance() {
        let mut index = FlatL2Index::new(2);
        index
            .add(&[vec![10.0, 0.0], vec![1.0, 0.0], vec![3.0, 0.0]])
            .unwrap();

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![1, 2, 0]);
        assert_eq!(hits[0].distance, 1.0);
        assert_eq!(hits[1].distance, 9.0);
    }

    #[test]
    fn test_search_k_larger_than_index() {
        let mut index = FlatL2Index::new(2);
        index.add(&[vec![0.0, 1.0]]).unwrap();

        assert_eq!(index.search(&[0.0, 0.0], 5).unwrap().len(), 1);
        assert!(FlatL2Index::new(2).search(&[0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_search_exact_match_first() {
        let mut index = FlatL2Index::new(10);
        let vectors: Vec<Vec<f32>> = (0..10).map(|i| unit(10, i)).collect();
        index.add(&vectors).unwrap();

        let hits = index.search(&unit(10, 3), 5).unwrap();
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0].position, 3);
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("vectors.bin");

        let mut index = FlatL2Index::new(2);
        index.add(&[vec![0.5, 1.5], vec![2.0, -1.0]]).unwrap();
        index.save(&path).unwrap();

        let loaded = FlatL2Index::load(&path).unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn test_load_garbage_fails() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("vectors.bin");
        std::fs::write(&path, b"definitely not an index").unwrap();

        assert!(FlatL2Index::load(&path).is_err());
    }

    #[test]
    fn test_load_missing_fails() {
        let temp = tempfile::tempdir().unwrap();
        assert!(FlatL2Index::load(&temp.path().join("missing.bin")).is_err());
    }
}
