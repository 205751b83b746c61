//! Collaborator seams. The pipeline embeds and generates only through these
//! traits; everything HTTP lives in the implementations behind them.

pub mod groq;
pub mod tei;

use crate::error::RecError;

/// Trait for embedding collaborators.
pub trait Embedder: Send {
    /// Embed a batch of texts. Must return exactly one vector per input,
    /// in input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RecError>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, RecError> {
        let batch = [text.to_string()];
        let mut vectors = self.embed_batch(&batch)?;
        if vectors.len() != 1 {
            return Err(RecError::Embedding(format!(
                "expected 1 embedding, got {}",
                vectors.len()
            )));
        }
        Ok(vectors.remove(0))
    }
}

/// Trait for generation collaborators: one prompt in, one reply out, no
/// session state between calls.
pub trait Generator: Send {
    fn generate(&self, prompt: &str) -> Result<GenerationReply, RecError>;
}

/// What a generation backend hands back: plain text, or a sequence of
/// content parts, depending on the protocol dialect it speaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationReply {
    Text(String),
    Parts(Vec<ReplyPart>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPart {
    pub text: String,
}

impl GenerationReply {
    /// Flatten a reply to plain text. This is the only place reply structure
    /// is interpreted; parts are concatenated in order.
    pub fn answer_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts.iter().map(|p| p.text.as_str()).collect(),
        }
    }
}
