//! Pipeline stages: the offline index build and the serving-side
//! recommendation flow.

use std::path::{Path, PathBuf};

use crate::catalog;
use crate::chunker::split_text;
use crate::error::RecError;
use crate::models::Embedder;
use crate::recommender::Recommender;
use crate::store::VectorIndex;
use crate::types::{RecommendationResult, ScoredChunk};

/// Chunks per embedding request during the build.
const EMBED_BATCH: usize = 32;

/// Query length bounds, applied after trimming.
pub const MIN_QUERY_CHARS: usize = 3;
pub const MAX_QUERY_CHARS: usize = 500;

// ── Offline build ─────────────────────────────────────────────────────────

/// Build a vector index from a normalized catalog.
///
/// Chunks every item, embeds the chunks in order-preserving batches, and
/// persists the finished index in a single step at the end. Any embedding
/// failure aborts the whole build with nothing written; a partial index
/// would serve silently wrong retrievals. A missing input file stays a
/// plain `NotFound`, and every other failure is wrapped as `IndexBuild`.
pub fn build_index(
    embedder: &dyn Embedder,
    normalized_path: &Path,
    index_dir: &Path,
    chunk_chars: usize,
) -> Result<PathBuf, RecError> {
    build_index_inner(embedder, normalized_path, index_dir, chunk_chars).map_err(|e| match e {
        e @ RecError::NotFound(_) => e,
        other => RecError::index_build(format!("building {}", index_dir.display()), other),
    })
}

fn build_index_inner(
    embedder: &dyn Embedder,
    normalized_path: &Path,
    index_dir: &Path,
    chunk_chars: usize,
) -> Result<PathBuf, RecError> {
    let items = catalog::load_normalized(normalized_path)?;
    tracing::info!(
        items = items.len(),
        path = %normalized_path.display(),
        "Normalized catalog loaded"
    );

    let mut chunk_texts: Vec<String> = Vec::new();
    let mut chunk_items: Vec<usize> = Vec::new();
    for (ordinal, item) in items.iter().enumerate() {
        for chunk in split_text(&item.combined_text, chunk_chars) {
            chunk_texts.push(chunk);
            chunk_items.push(ordinal);
        }
    }
    tracing::info!(chunks = chunk_texts.len(), "Catalog chunked");

    let mut index = VectorIndex::new();
    for (batch_idx, batch) in chunk_texts.chunks(EMBED_BATCH).enumerate() {
        let vectors = embedder.embed_batch(batch)?;
        if vectors.len() != batch.len() {
            return Err(RecError::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                batch.len()
            )));
        }
        let base = batch_idx * EMBED_BATCH;
        for (offset, (text, vector)) in batch.iter().zip(vectors).enumerate() {
            index.upsert(text.clone(), vector, chunk_items[base + offset])?;
        }
    }

    index.persist(index_dir)?;
    tracing::info!(
        entries = index.len(),
        dimension = index.dimension(),
        dir = %index_dir.display(),
        "Vector index persisted"
    );
    Ok(index_dir.to_path_buf())
}

// ── Serving pipeline ──────────────────────────────────────────────────────

/// Where the pipeline ended up after construction. There is no third state
/// and no runtime recovery: a failed open stays failed until restart.
enum PipelineState {
    Ready { index: VectorIndex },
    Failed { reason: String },
}

/// The serving-side pipeline: owns the opened index and both collaborators,
/// and answers queries for the lifetime of the process.
pub struct RecommendPipeline {
    state: PipelineState,
    embedder: Box<dyn Embedder>,
    recommender: Recommender,
    top_k: usize,
}

impl RecommendPipeline {
    /// Open the persisted index and assemble the pipeline.
    ///
    /// A missing or unreadable index is not an error here: the pipeline
    /// comes up in a failed state and reports not-ready on every request,
    /// so the process keeps serving its status surface instead of dying.
    pub fn open(
        index_dir: &Path,
        embedder: Box<dyn Embedder>,
        recommender: Recommender,
        top_k: usize,
    ) -> Self {
        let state = match VectorIndex::open(index_dir) {
            Ok(index) => {
                tracing::info!(
                    entries = index.len(),
                    dimension = index.dimension(),
                    dir = %index_dir.display(),
                    "Vector index opened"
                );
                PipelineState::Ready { index }
            }
            Err(e) => {
                tracing::error!(dir = %index_dir.display(), error = %e, "Failed to open vector index");
                PipelineState::Failed {
                    reason: e.to_string(),
                }
            }
        };
        Self {
            state,
            embedder,
            recommender,
            top_k,
        }
    }

    /// Whether the index opened and queries can be served.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, PipelineState::Ready { .. })
    }

    /// Number of chunks in the opened index; 0 when not ready.
    pub fn entry_count(&self) -> usize {
        match &self.state {
            PipelineState::Ready { index } => index.len(),
            PipelineState::Failed { .. } => 0,
        }
    }

    /// Index embedding dimension, when ready.
    pub fn dimension(&self) -> Option<usize> {
        match &self.state {
            PipelineState::Ready { index } => Some(index.dimension()),
            PipelineState::Failed { .. } => None,
        }
    }

    fn ready_index(&self) -> Result<&VectorIndex, RecError> {
        match &self.state {
            PipelineState::Ready { index } => Ok(index),
            PipelineState::Failed { reason } => Err(RecError::NotReady(reason.clone())),
        }
    }

    /// Validate a query and hand back the trimmed form used downstream.
    fn validate_query(query: &str) -> Result<&str, RecError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(RecError::Validation("query must not be empty".into()));
        }
        let chars = trimmed.chars().count();
        if chars < MIN_QUERY_CHARS {
            return Err(RecError::Validation(format!(
                "query must be at least {MIN_QUERY_CHARS} characters"
            )));
        }
        if chars > MAX_QUERY_CHARS {
            return Err(RecError::Validation(format!(
                "query must be at most {MAX_QUERY_CHARS} characters"
            )));
        }
        Ok(trimmed)
    }

    /// Retrieve the nearest chunks for `query` without generating anything.
    /// `k` falls back to the configured top-k when absent.
    pub fn retrieve(&self, query: &str, k: Option<usize>) -> Result<Vec<ScoredChunk>, RecError> {
        let trimmed = Self::validate_query(query)?;
        let index = self.ready_index()?;
        let vector = self.embedder.embed(trimmed)?;
        index.nearest_neighbors(&vector, k.unwrap_or(self.top_k))
    }

    /// Answer a recommendation query.
    ///
    /// Validation runs before the readiness check, so a bad query is
    /// reported as bad input even while the pipeline is failed. Downstream
    /// failures are wrapped as `Recommendation` with the cause preserved;
    /// validation and readiness pass through as their own signals. A failed
    /// call leaves the pipeline untouched and ready for the next one.
    pub fn recommend(&self, query: &str) -> Result<RecommendationResult, RecError> {
        let trimmed = Self::validate_query(query)?;
        let index = self.ready_index()?;

        tracing::info!(query_chars = trimmed.chars().count(), "Recommendation requested");

        let answer = self
            .recommend_inner(index, trimmed)
            .map_err(|e| RecError::recommendation("answering query", e))?;

        tracing::info!(answer_chars = answer.chars().count(), "Recommendation generated");

        Ok(RecommendationResult {
            answer,
            query: query.to_string(),
        })
    }

    fn recommend_inner(&self, index: &VectorIndex, trimmed: &str) -> Result<String, RecError> {
        let vector = self.embedder.embed(trimmed)?;
        let context = index.nearest_neighbors(&vector, self.top_k)?;
        tracing::debug!(retrieved = context.len(), "Context retrieved");
        self.recommender.compose(trimmed, &context)
    }
}
