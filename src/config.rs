use clap::Parser;

use crate::models::groq::{DEFAULT_MODEL, GROQ_BASE_URL};

#[derive(Parser, Debug)]
#[command(name = "anirec", about = "RAG anime recommendation engine over JSON-RPC 2.0 / NDJSON stdio")]
pub struct CliArgs {
    /// Directory holding the persisted vector index
    #[arg(long, default_value = "index_db", env = "ANIREC_INDEX_DIR")]
    pub index_dir: String,

    /// Embedding server URL (TEI-compatible)
    #[arg(long, default_value = "http://localhost:8080", env = "ANIREC_EMBED_URL")]
    pub embed_url: String,

    /// Bearer token for the embedding server, if it requires one
    #[arg(long, env = "ANIREC_EMBED_API_KEY")]
    pub embed_api_key: Option<String>,

    /// Chat-completions base URL (OpenAI-compatible)
    #[arg(long, default_value = GROQ_BASE_URL, env = "ANIREC_LLM_URL")]
    pub llm_url: String,

    /// Groq API key. Required: the engine refuses to start without one.
    #[arg(long, env = "GROQ_API_KEY")]
    pub groq_api_key: String,

    /// Chat model used for recommendation generation
    #[arg(long, default_value = DEFAULT_MODEL, env = "ANIREC_LLM_MODEL")]
    pub llm_model: String,

    /// Temperature for generation
    #[arg(long, default_value = "0.0")]
    pub temperature: f64,

    /// Maximum tokens to generate
    #[arg(long, default_value = "1024")]
    pub max_tokens: usize,

    /// Chunks retrieved per query
    #[arg(long, default_value = "3", env = "ANIREC_TOP_K")]
    pub top_k: usize,

    /// HTTP timeout in seconds for both collaborators
    #[arg(long, default_value = "30", env = "ANIREC_HTTP_TIMEOUT")]
    pub timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "ANIREC_LOG_LEVEL")]
    pub log_level: String,
}
