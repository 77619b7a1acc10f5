use anyhow::{Context, Result};
use clap::Parser;
use fetcher::{write_jsonl, FetcherConfig, HttpSource, DEFAULT_SOURCE_URL};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "fetcher")]
#[command(about = "Download the upstream message corpus to JSONL")]
struct Cli {
    /// Paginated message endpoint
    #[arg(long, env = "DATA_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    url: String,
    /// Output JSONL file path
    #[arg(long, default_value = "./sample_data/messages.jsonl")]
    output: String,
    /// Documents requested per page
    #[arg(long, default_value_t = 100)]
    page_size: usize,
    /// Maximum number of documents to fetch
    #[arg(long, env = "MAX_RECORDS", default_value_t = 50_000)]
    max_records: usize,
    /// Attempts per page before giving up
    #[arg(long, env = "HTTP_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,
    /// Request timeout seconds
    #[arg(long, env = "HTTP_TIMEOUT", default_value_t = 30.0)]
    timeout_secs: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Cli::parse();

    let url = Url::parse(&args.url).with_context(|| format!("invalid url {}", args.url))?;
    let mut cfg = FetcherConfig::new(url);
    cfg.page_size = args.page_size;
    cfg.max_records = args.max_records;
    cfg.max_retries = args.max_retries;
    cfg.timeout = Duration::from_secs_f64(args.timeout_secs);

    let source = HttpSource::new(cfg)?;
    let docs = source.fetch_all().await?;

    write_jsonl(Path::new(&args.output), &docs).with_context(|| format!("writing {}", args.output))?;

    tracing::info!(documents = docs.len(), output = %args.output, "corpus written");
    Ok(())
}
