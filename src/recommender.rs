//! Recommendation composition: retrieved context plus query in, final
//! answer text out, through a single generation call.

use crate::error::RecError;
use crate::models::Generator;
use crate::prompt::{build_prompt, INSUFFICIENT_CONTEXT_ANSWER};
use crate::types::ScoredChunk;

/// Owns the generation collaborator and turns retrieval results into the
/// final recommendation text.
pub struct Recommender {
    generator: Box<dyn Generator>,
}

impl Recommender {
    pub fn new(generator: Box<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Compose the answer for `query` grounded in `context`.
    ///
    /// An empty context short-circuits to the fixed insufficient-context
    /// answer without invoking the generator, since there is nothing to
    /// ground a recommendation in. Generator failures surface as
    /// `Generation` with the cause preserved; no fallback text is
    /// synthesized for those.
    pub fn compose(&self, query: &str, context: &[ScoredChunk]) -> Result<String, RecError> {
        if context.is_empty() {
            tracing::debug!("Empty retrieval context, answering without generation");
            return Ok(INSUFFICIENT_CONTEXT_ANSWER.to_string());
        }

        let prompt = build_prompt(context, query);
        tracing::debug!(
            context_chunks = context.len(),
            prompt_chars = prompt.len(),
            "Invoking generator"
        );

        let reply = self
            .generator
            .generate(&prompt)
            .map_err(|e| RecError::generation("composing recommendations", e))?;

        Ok(reply.answer_text())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::models::GenerationReply;

    #[derive(Clone)]
    struct RecordingGenerator {
        prompts: Arc<Mutex<Vec<String>>>,
        reply: GenerationReply,
    }

    impl RecordingGenerator {
        fn new(reply: GenerationReply) -> Self {
            Self {
                prompts: Arc::new(Mutex::new(Vec::new())),
                reply,
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl Generator for RecordingGenerator {
        fn generate(&self, prompt: &str) -> Result<GenerationReply, RecError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct FailingGenerator;

    impl Generator for FailingGenerator {
        fn generate(&self, _prompt: &str) -> Result<GenerationReply, RecError> {
            Err(RecError::Completion("upstream returned 503".into()))
        }
    }

    fn chunk(text: &str) -> ScoredChunk {
        ScoredChunk {
            text: text.to_string(),
            score: 0.8,
            item: 0,
        }
    }

    #[test]
    fn empty_context_answers_without_generating() {
        let generator = RecordingGenerator::new(GenerationReply::Text("unused".into()));
        let probe = generator.clone();
        let recommender = Recommender::new(Box::new(generator));

        let answer = recommender.compose("mecha anime", &[]).unwrap();
        assert_eq!(answer, INSUFFICIENT_CONTEXT_ANSWER);
        assert_eq!(probe.calls(), 0);
    }

    #[test]
    fn composes_prompt_and_generates_once() {
        let generator = RecordingGenerator::new(GenerationReply::Text("1. Naruto ...".into()));
        let probe = generator.clone();
        let recommender = Recommender::new(Box::new(generator));

        let context = vec![chunk("Title: Naruto\nGenres: Action\nOverview: A ninja story.")];
        let answer = recommender.compose("ninja anime", &context).unwrap();

        assert_eq!(answer, "1. Naruto ...");
        assert_eq!(probe.calls(), 1);
        let prompts = probe.prompts.lock().unwrap();
        assert!(prompts[0].contains("ninja anime"));
        assert!(prompts[0].contains("Title: Naruto"));
    }

    #[test]
    fn parts_reply_is_flattened() {
        use crate::models::ReplyPart;
        let generator = RecordingGenerator::new(GenerationReply::Parts(vec![
            ReplyPart {
                text: "1. Naruto".into(),
            },
            ReplyPart {
                text: "\n2. Bleach".into(),
            },
        ]));
        let recommender = Recommender::new(Box::new(generator));

        let answer = recommender
            .compose("action", &[chunk("Title: Naruto")])
            .unwrap();
        assert_eq!(answer, "1. Naruto\n2. Bleach");
    }

    #[test]
    fn generator_failure_is_wrapped_with_cause() {
        let recommender = Recommender::new(Box::new(FailingGenerator));
        let err = recommender
            .compose("action", &[chunk("Title: Naruto")])
            .unwrap_err();

        assert!(matches!(err, RecError::Generation { .. }));
        assert!(matches!(err.root(), RecError::Completion(_)));
        assert!(err.to_string().contains("upstream returned 503"));
    }
}
