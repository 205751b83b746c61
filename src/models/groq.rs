//! OpenAI-compatible chat completions client.
//!
//! The defaults target Groq's hosted endpoint, but anything speaking the
//! same chat-completions protocol works. One blocking request per
//! recommendation; no streaming, no retries.

use serde::{Deserialize, Serialize};
use ureq::Agent;

use super::{GenerationReply, Generator, ReplyPart};
use crate::error::RecError;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Configuration for the chat-completions generator.
#[derive(Debug, Clone)]
pub struct GroqConfig {
    /// Base URL up to (not including) `/chat/completions`.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Sampling temperature; 0 keeps recommendations reproducible.
    pub temperature: f64,
    pub max_tokens: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: GROQ_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            timeout_secs: 30,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: MessageContent,
}

/// Assistant content arrives either as a bare string or as an array of
/// typed parts, depending on the backend.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}

/// Generator backed by an OpenAI-compatible chat-completions endpoint.
pub struct GroqGenerator {
    url: String,
    agent: Agent,
    config: GroqConfig,
}

impl GroqGenerator {
    /// Create a new generator with the given configuration.
    pub fn new(config: GroqConfig) -> Self {
        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let agent_config = Agent::config_builder()
            .timeout_global(Some(std::time::Duration::from_secs(config.timeout_secs)))
            .build();
        let agent = Agent::new_with_config(agent_config);
        Self { url, agent, config }
    }
}

impl Generator for GroqGenerator {
    fn generate(&self, prompt: &str) -> Result<GenerationReply, RecError> {
        tracing::debug!(
            url = %self.url,
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "Sending completion request"
        );

        let body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let auth = format!("Bearer {}", self.config.api_key.trim());
        let parsed: ChatResponse = self
            .agent
            .post(&self.url)
            .header("Authorization", auth.as_str())
            .send_json(&body)
            .map_err(|e| RecError::Completion(format!("chat request failed: {e}")))?
            .body_mut()
            .read_json()
            .map_err(|e| RecError::Completion(format!("chat response parse error: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RecError::Completion("chat response has no choices".into()))?;

        Ok(match content {
            MessageContent::Text(text) => GenerationReply::Text(text),
            MessageContent::Parts(parts) => GenerationReply::Parts(
                parts
                    .into_iter()
                    .map(|part| ReplyPart { text: part.text })
                    .collect(),
            ),
        })
    }
}
