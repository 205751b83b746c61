use serde::{Deserialize, Serialize};

/// One catalog row after preparation. `combined_text` folds title, genres,
/// and synopsis into the single string downstream stages embed and retrieve;
/// nothing else about the row survives normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub combined_text: String,
}

/// A stored index entry: one chunk of one catalog row plus its embedding.
/// `item` is the ordinal of the source row in the normalized catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkEntry {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub item: usize,
}

/// A chunk coming back from retrieval, scored by cosine similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f64,
    pub item: usize,
}

/// Answer for a single recommendation request. `query` echoes the caller's
/// original string untouched, whitespace and all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub answer: String,
    pub query: String,
}
