//! Prompt assembly for recommendation requests.

use crate::types::ScoredChunk;

/// The answer the model is told to give, and the engine returns directly,
/// when the retrieved context cannot support a recommendation.
pub const INSUFFICIENT_CONTEXT_ANSWER: &str = "I don't know based on the given data.";

/// Build the recommendation prompt from retrieved context and the query.
///
/// The wording carries the whole output contract: exactly three numbered
/// recommendations, each with a title, a short plot summary, and a reason
/// tied to the query, grounded only in the context block. Whether the model
/// actually honors it is not checked anywhere.
pub fn build_prompt(context: &[ScoredChunk], query: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are an expert anime recommendation engine.\n\n");
    prompt.push_str("Your task:\n");
    prompt.push_str("- Use ONLY the provided context to make recommendations.\n");
    prompt.push_str("- Suggest EXACTLY three anime titles.\n");
    prompt.push_str("- For each recommendation, include:\n");
    prompt.push_str("  1. **Title**\n");
    prompt.push_str("  2. **Plot Summary** (2-3 sentences)\n");
    prompt.push_str("  3. **Why it matches the user's query**\n\n");
    prompt.push_str("Formatting Rules:\n");
    prompt.push_str("- Present results as a **numbered list** (1., 2., 3.)\n");
    prompt.push_str("- Keep language clear and helpful.\n");
    prompt.push_str("- If information is missing from the context, say: \"");
    prompt.push_str(INSUFFICIENT_CONTEXT_ANSWER);
    prompt.push_str("\"\n\n");
    prompt.push_str("Important Rules:\n");
    prompt.push_str("- DO NOT use outside knowledge.\n");
    prompt.push_str("- DO NOT hallucinate missing details.\n");
    prompt.push_str("- ONLY use information available inside the context.\n\n");
    prompt.push_str("Context:\n");
    for chunk in context {
        prompt.push_str(&chunk.text);
        prompt.push_str("\n\n");
    }
    prompt.push_str("User Query:\n");
    prompt.push_str(query);
    prompt.push_str("\n\nYour final structured answer:\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> ScoredChunk {
        ScoredChunk {
            text: text.to_string(),
            score: 0.9,
            item: 0,
        }
    }

    #[test]
    fn prompt_contains_query_and_context() {
        let context = vec![
            chunk("Title: Naruto\nGenres: Action\nOverview: A ninja story."),
            chunk("Title: Bleach\nGenres: Action\nOverview: A soul reaper."),
        ];
        let prompt = build_prompt(&context, "action anime with a ninja");

        assert!(prompt.contains("action anime with a ninja"));
        assert!(prompt.contains("Title: Naruto"));
        assert!(prompt.contains("Title: Bleach"));
    }

    #[test]
    fn prompt_pins_the_three_recommendation_contract() {
        let prompt = build_prompt(&[chunk("Title: Naruto")], "ninja");
        assert!(prompt.contains("EXACTLY three"));
        assert!(prompt.contains("numbered list"));
        assert!(prompt.contains(INSUFFICIENT_CONTEXT_ANSWER));
    }

    #[test]
    fn context_block_precedes_the_query() {
        let prompt = build_prompt(&[chunk("Title: Naruto")], "ninja adventures");
        let context_pos = prompt.find("Title: Naruto").unwrap();
        let query_pos = prompt.find("ninja adventures").unwrap();
        assert!(context_pos < query_pos);
    }
}
