//! Offline index builder: normalize the raw catalog, embed every chunk,
//! and persist the vector index the serving engine opens at startup.

use std::path::Path;

use anyhow::Result;
use clap::Parser;

use anirec::catalog;
use anirec::models::tei::{TeiConfig, TeiEmbedder};
use anirec::pipeline;

#[derive(Parser, Debug)]
#[command(name = "anirec-build", about = "Build the anirec vector index from a raw anime catalog CSV")]
struct BuildArgs {
    /// Raw catalog CSV with Name, Genres and Synopsis columns
    #[arg(long, default_value = "data/anime_with_synopsis.csv", env = "ANIREC_RAW_CSV")]
    raw_csv: String,

    /// Where the normalized catalog (JSONL) is written
    #[arg(long, default_value = "data/anime_normalized.jsonl", env = "ANIREC_NORMALIZED")]
    normalized: String,

    /// Directory the finished index is persisted into
    #[arg(long, default_value = "index_db", env = "ANIREC_INDEX_DIR")]
    index_dir: String,

    /// Maximum characters per chunk
    #[arg(long, default_value = "1000")]
    chunk_chars: usize,

    /// Embedding server URL (TEI-compatible)
    #[arg(long, default_value = "http://localhost:8080", env = "ANIREC_EMBED_URL")]
    embed_url: String,

    /// Bearer token for the embedding server, if it requires one
    #[arg(long, env = "ANIREC_EMBED_API_KEY")]
    embed_api_key: Option<String>,

    /// HTTP timeout in seconds for embedding requests
    #[arg(long, default_value = "30", env = "ANIREC_HTTP_TIMEOUT")]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "ANIREC_LOG_LEVEL")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = BuildArgs::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    tracing::info!(
        raw_csv = %args.raw_csv,
        index_dir = %args.index_dir,
        chunk_chars = args.chunk_chars,
        "Starting index build"
    );

    tracing::info!("Preparing catalog");
    let normalized = catalog::prepare(Path::new(&args.raw_csv), Path::new(&args.normalized))?;
    tracing::info!(path = %normalized.display(), "Catalog prepared");

    let embedder = TeiEmbedder::new(TeiConfig {
        base_url: args.embed_url.clone(),
        api_key: args.embed_api_key.clone(),
        timeout_secs: args.timeout_secs,
        ..Default::default()
    });

    tracing::info!(embed_url = %args.embed_url, "Building vector index");
    let index_dir = pipeline::build_index(
        &embedder,
        &normalized,
        Path::new(&args.index_dir),
        args.chunk_chars,
    )?;
    tracing::info!(dir = %index_dir.display(), "Index build complete");

    Ok(())
}
