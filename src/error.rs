use thiserror::Error;

/// Unified error vocabulary for the recommendation engine.
///
/// Stage failures (`DataPreparation`, `IndexBuild`, `Generation`,
/// `Recommendation`) wrap the error that caused them, so one rendered
/// message carries the whole chain. `root()` walks to the innermost cause
/// when the kind matters more than the story.
#[derive(Debug, Error)]
pub enum RecError {
    #[error("Schema mismatch: {0}")]
    Schema(String),
    #[error("Data preparation failed: {context}: {cause}")]
    DataPreparation {
        context: String,
        cause: Box<RecError>,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Index build failed: {context}: {cause}")]
    IndexBuild {
        context: String,
        cause: Box<RecError>,
    },
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Generation failed: {context}: {cause}")]
    Generation {
        context: String,
        cause: Box<RecError>,
    },
    #[error("Recommendation failed: {context}: {cause}")]
    Recommendation {
        context: String,
        cause: Box<RecError>,
    },
    #[error("Not ready: {0}")]
    NotReady(String),
    #[error("Embedding request failed: {0}")]
    Embedding(String),
    #[error("Completion request failed: {0}")]
    Completion(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Storage corruption: {0}")]
    Corruption(String),
    #[error("Dimension mismatch: index stores {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl RecError {
    /// Stable machine-readable tag per variant, carried across the protocol
    /// boundary as `error.data.code`.
    pub fn code(&self) -> &str {
        match self {
            Self::Schema(_) => "REC_SCHEMA",
            Self::DataPreparation { .. } => "REC_DATA_PREP",
            Self::NotFound(_) => "REC_NOT_FOUND",
            Self::IndexBuild { .. } => "REC_INDEX_BUILD",
            Self::Validation(_) => "REC_INVALID_INPUT",
            Self::Generation { .. } => "REC_GENERATION",
            Self::Recommendation { .. } => "REC_RECOMMENDATION",
            Self::NotReady(_) => "REC_NOT_READY",
            Self::Embedding(_) => "REC_EMBEDDING",
            Self::Completion(_) => "REC_COMPLETION",
            Self::Io(_) => "REC_IO",
            Self::Serialization(_) => "REC_SERIALIZATION",
            Self::Corruption(_) => "REC_CORRUPT",
            Self::DimensionMismatch { .. } => "REC_DIMENSION",
        }
    }

    /// Innermost cause of a stage-failure chain. Leaf errors return themselves.
    pub fn root(&self) -> &RecError {
        match self {
            Self::DataPreparation { cause, .. }
            | Self::IndexBuild { cause, .. }
            | Self::Generation { cause, .. }
            | Self::Recommendation { cause, .. } => cause.root(),
            other => other,
        }
    }

    // Stage wrappers. Each records where the failure happened and keeps the
    // cause for `root()`.

    pub fn data_prep(context: impl Into<String>, cause: RecError) -> Self {
        Self::DataPreparation {
            context: context.into(),
            cause: Box::new(cause),
        }
    }

    pub fn index_build(context: impl Into<String>, cause: RecError) -> Self {
        Self::IndexBuild {
            context: context.into(),
            cause: Box::new(cause),
        }
    }

    pub fn generation(context: impl Into<String>, cause: RecError) -> Self {
        Self::Generation {
            context: context.into(),
            cause: Box::new(cause),
        }
    }

    pub fn recommendation(context: impl Into<String>, cause: RecError) -> Self {
        Self::Recommendation {
            context: context.into(),
            cause: Box::new(cause),
        }
    }
}
