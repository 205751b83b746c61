use std::path::Path;

use anyhow::Result;
use clap::Parser;

use anirec::config::CliArgs;
use anirec::models::groq::{GroqConfig, GroqGenerator};
use anirec::models::tei::{TeiConfig, TeiEmbedder};
use anirec::pipeline::RecommendPipeline;
use anirec::recommender::Recommender;
use anirec::server::RecServer;
use anirec::transport::NdjsonTransport;

fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Initialize logging to stderr (the protocol uses stdout exclusively)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let embedder = TeiEmbedder::new(TeiConfig {
        base_url: args.embed_url.clone(),
        api_key: args.embed_api_key.clone(),
        timeout_secs: args.timeout_secs,
        ..Default::default()
    });

    let generator = GroqGenerator::new(GroqConfig {
        base_url: args.llm_url.clone(),
        api_key: args.groq_api_key.clone(),
        model: args.llm_model.clone(),
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        timeout_secs: args.timeout_secs,
    });

    tracing::info!(
        index_dir = %args.index_dir,
        embed_url = %args.embed_url,
        llm_model = %args.llm_model,
        top_k = args.top_k,
        "Starting recommendation engine"
    );

    let pipeline = RecommendPipeline::open(
        Path::new(&args.index_dir),
        Box::new(embedder),
        Recommender::new(Box::new(generator)),
        args.top_k,
    );
    if !pipeline.is_ready() {
        tracing::warn!("Index not available; serving status only until an index is built");
    }

    let mut server = RecServer::new(pipeline, NdjsonTransport::new());

    tracing::info!("anirec engine ready");
    server.run()
}
