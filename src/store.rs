//! In-memory vector index with directory persistence.

use std::path::Path;

use uuid::Uuid;

use crate::cosine::{cosine_similarity, magnitude};
use crate::error::RecError;
use crate::persistence;
use crate::types::{ChunkEntry, ScoredChunk};

/// Exact-scan vector index over chunk embeddings.
///
/// Entries keep insertion order, and lookup uses a stable sort on score
/// only, so equal-score results tie-break toward earlier entries. The index
/// is filled once by the offline build and opened read-only for serving.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    entries: Vec<ChunkEntry>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self {
            dimension: 0,
            entries: Vec::new(),
        }
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimension of this index; 0 until the first insert.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Stored entries in insertion order.
    pub fn entries(&self) -> &[ChunkEntry] {
        &self.entries
    }

    /// Append a chunk with its embedding and source-row ordinal, returning
    /// the generated entry id. The first insert fixes the index dimension;
    /// every later insert must match it.
    pub fn upsert(
        &mut self,
        text: impl Into<String>,
        embedding: Vec<f32>,
        item: usize,
    ) -> Result<String, RecError> {
        let text = text.into();
        if text.is_empty() {
            return Err(RecError::Validation("cannot index an empty chunk".into()));
        }
        if embedding.is_empty() {
            return Err(RecError::Validation(
                "cannot index an empty embedding".into(),
            ));
        }
        if self.entries.is_empty() {
            self.dimension = embedding.len();
        } else if embedding.len() != self.dimension {
            return Err(RecError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let id = Uuid::new_v4().to_string();
        self.entries.push(ChunkEntry {
            id: id.clone(),
            text,
            embedding,
            item,
        });
        Ok(id)
    }

    /// Exact nearest-neighbor lookup by cosine similarity, best first.
    ///
    /// Returns at most `k` results and never more than the index holds; an
    /// empty index yields an empty vec. A query of the wrong dimension is
    /// rejected outright, and a zero-magnitude query matches nothing.
    pub fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, RecError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(RecError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if magnitude(query) == 0.0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                text: entry.text.clone(),
                score: cosine_similarity(query, &entry.embedding),
                item: entry.item,
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);
        Ok(results)
    }

    /// Persist to `dir`, replacing any index already there.
    pub fn persist(&self, dir: &Path) -> Result<(), RecError> {
        persistence::save_to_directory(dir, self.dimension, &self.entries)
    }

    /// Open a persisted index. A missing directory or index file is
    /// `NotFound`; undecodable content is `Corruption`.
    pub fn open(dir: &Path) -> Result<Self, RecError> {
        let data = persistence::load_from_directory(dir)?;
        Ok(Self {
            dimension: data.dimension,
            entries: data.entries,
        })
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}
