use anyhow::{Context, Result};
use clap::Parser;
use fetcher::{FetcherConfig, HttpSource, DEFAULT_SOURCE_URL};
use indexer::FileSource;
use search_core::{DocumentSource, EngineConfig, Refresher, SearchEngine, StemmerKind, TfMode};
use server::{build_app, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[derive(Parser)]
struct Args {
    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    /// Paginated message endpoint to index
    #[arg(long, env = "DATA_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    source_url: String,
    /// Index a local JSON/JSONL file or directory instead of the remote source
    #[arg(long, env = "SOURCE_FILE")]
    source_file: Option<String>,
    /// Seconds between corpus refreshes
    #[arg(long, env = "REFRESH_INTERVAL_SECONDS", default_value_t = 300)]
    refresh_interval: u64,
    /// Seconds between attempts while no index is available yet
    #[arg(long, env = "STARTUP_RETRY_SECONDS", default_value_t = 10)]
    startup_retry: u64,
    /// Cached query rankings (0 disables the cache)
    #[arg(long, env = "SEARCH_CACHE_SIZE", default_value_t = 1000)]
    cache_capacity: usize,
    /// Results returned when the request has no k
    #[arg(long, env = "DEFAULT_PAGE_SIZE", default_value_t = 10)]
    top_k_default: usize,
    /// Upper bound for k
    #[arg(long, env = "MAX_PAGE_SIZE", default_value_t = 100)]
    max_top_k: usize,
    /// Shortest stem the stemmer may produce
    #[arg(long, env = "MIN_STEM_LENGTH", default_value_t = 3)]
    min_stem_length: usize,
    /// Stemmer: suffix, snowball or none
    #[arg(long, env = "STEMMER", default_value = "suffix")]
    stemmer: StemmerKind,
    /// Divide term frequency by document length
    #[arg(long, env = "LENGTH_NORMALIZED_TF", default_value_t = false)]
    length_normalized: bool,
    /// Upstream request timeout seconds
    #[arg(long, env = "HTTP_TIMEOUT", default_value_t = 30.0)]
    http_timeout: f64,
    /// Attempts per upstream page
    #[arg(long, env = "HTTP_MAX_RETRIES", default_value_t = 3)]
    http_max_retries: u32,
    /// Maximum documents fetched from upstream
    #[arg(long, env = "MAX_RECORDS", default_value_t = 50_000)]
    max_records: usize,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            refresh_interval: Duration::from_secs(self.refresh_interval),
            startup_retry_interval: Duration::from_secs(self.startup_retry),
            cache_capacity: self.cache_capacity,
            top_k_default: self.top_k_default,
            max_top_k: self.max_top_k,
            min_stem_length: self.min_stem_length,
            stemmer: self.stemmer,
            remove_stopwords: true,
            tf_mode: if self.length_normalized { TfMode::LengthNormalized } else { TfMode::Raw },
        }
    }

    fn source(&self) -> Result<Arc<dyn DocumentSource>> {
        if let Some(path) = &self.source_file {
            tracing::info!(path = %path, "indexing local corpus");
            return Ok(Arc::new(FileSource::new(path)));
        }
        let url = Url::parse(&self.source_url).with_context(|| format!("invalid source url {}", self.source_url))?;
        let mut cfg = FetcherConfig::new(url);
        cfg.timeout = Duration::from_secs_f64(self.http_timeout);
        cfg.max_retries = self.http_max_retries;
        cfg.max_records = self.max_records;
        tracing::info!(url = %cfg.url, "indexing remote corpus");
        Ok(Arc::new(HttpSource::new(cfg)?))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let config = args.engine_config();
    config.validate()?;
    let engine = Arc::new(SearchEngine::new(config));
    let refresher = Arc::new(Refresher::new(engine, args.source()?));
    let refresh_task = Arc::clone(&refresher).spawn();

    let app = build_app(AppState::new(refresher));
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await?;

    refresh_task.abort();
    Ok(())
}
