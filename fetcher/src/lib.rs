//! Paginated HTTP source for the upstream message API.
//!
//! The upstream answers `GET {url}?skip=S&limit=L` with
//! `{"total": n, "items": [...]}` and offers no search of its own.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;
use search_core::{Document, DocumentSource, FetchError};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;

pub const DEFAULT_SOURCE_URL: &str = "https://november7-730026606190.europe-west1.run.app/messages/";

/// Statuses that end pagination instead of being retried.
const STOP_STATUSES: &[StatusCode] = &[
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
    StatusCode::TOO_MANY_REQUESTS,
];

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub url: Url,
    pub page_size: usize,
    pub max_records: usize,
    pub max_retries: u32,
    pub timeout: Duration,
    /// Base delay; attempt `n` waits `retry_backoff * 2^n`.
    pub retry_backoff: Duration,
    pub page_delay: Duration,
    pub user_agent: String,
}

impl FetcherConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            page_size: 100,
            max_records: 50_000,
            max_retries: 3,
            timeout: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(1),
            page_delay: Duration::from_millis(50),
            user_agent: concat!("message-search/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Upper bound for a single retry wait.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt)).min(MAX_BACKOFF)
}

enum PageFetch {
    Page(Page),
    /// The upstream answered with one of [`STOP_STATUSES`].
    Refused(StatusCode),
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    items: Vec<RemoteMessage>,
}

#[derive(Debug, Deserialize)]
struct RemoteMessage {
    id: String,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    message: String,
}

impl From<RemoteMessage> for Document {
    fn from(m: RemoteMessage) -> Self {
        Document { id: m.id, text: m.message, author: m.user_name, timestamp: m.timestamp }
    }
}

pub struct HttpSource {
    client: Client,
    cfg: FetcherConfig,
}

impl HttpSource {
    pub fn new(cfg: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client, cfg })
    }

    /// Walk every page up to `max_records` documents.
    pub async fn fetch_all(&self) -> Result<Vec<Document>, FetchError> {
        let limit = self.cfg.page_size.max(1);
        let mut docs: Vec<Document> = Vec::new();
        let mut skip = 0usize;
        let mut total: Option<usize> = None;

        loop {
            let page = match self.fetch_page(skip, limit).await? {
                PageFetch::Page(page) => page,
                // a refusal before any data arrived is a failed fetch, not an empty corpus
                PageFetch::Refused(status) if docs.is_empty() => {
                    return Err(FetchError::Status { status: status.as_u16(), url: self.cfg.url.to_string() });
                }
                PageFetch::Refused(_) => break,
            };
            if page.items.is_empty() {
                break;
            }
            docs.extend(page.items.into_iter().map(Document::from));

            let total = *total.get_or_insert_with(|| {
                if page.total > self.cfg.max_records {
                    tracing::warn!(
                        remote = page.total,
                        max_records = self.cfg.max_records,
                        "remote corpus exceeds max_records, truncating"
                    );
                }
                page.total
            });

            skip += limit;
            if skip >= total.min(self.cfg.max_records) {
                break;
            }
            sleep(self.cfg.page_delay).await;
        }

        docs.truncate(self.cfg.max_records);
        tracing::info!(documents = docs.len(), url = %self.cfg.url, "fetched corpus");
        Ok(docs)
    }

    /// One page, retried with exponential backoff.
    async fn fetch_page(&self, skip: usize, limit: usize) -> Result<PageFetch, FetchError> {
        let attempts = self.cfg.max_retries.max(1);
        let mut attempt = 0;
        loop {
            let last = attempt + 1 >= attempts;
            let err = match self.request(skip, limit).await {
                Ok(resp) if STOP_STATUSES.contains(&resp.status()) => {
                    tracing::warn!(status = resp.status().as_u16(), skip, "upstream refused page, stopping");
                    return Ok(PageFetch::Refused(resp.status()));
                }
                Ok(resp) if resp.status().is_success() => {
                    let page = resp.json::<Page>().await.map_err(|e| FetchError::Malformed(e.to_string()))?;
                    return Ok(PageFetch::Page(page));
                }
                Ok(resp) => FetchError::Status { status: resp.status().as_u16(), url: self.cfg.url.to_string() },
                Err(e) => FetchError::Transport(e.to_string()),
            };

            tracing::warn!(%err, attempt = attempt + 1, skip, "page request failed");
            if last {
                return Err(err);
            }
            sleep(backoff_delay(self.cfg.retry_backoff, attempt)).await;
            attempt += 1;
        }
    }

    async fn request(&self, skip: usize, limit: usize) -> reqwest::Result<reqwest::Response> {
        self.client.get(self.cfg.url.clone()).query(&[("skip", skip), ("limit", limit)]).send().await
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<Document>, FetchError> {
        self.fetch_all().await
    }

    async fn remote_total(&self) -> Result<Option<usize>, FetchError> {
        match self.request(0, 1).await {
            Ok(resp) if resp.status().is_success() => Ok(resp.json::<Page>().await.ok().map(|p| p.total)),
            Ok(_) | Err(_) => Ok(None),
        }
    }
}

/// Write `docs` as one JSON object per line, creating parent directories.
pub fn write_jsonl(path: &Path, docs: &[Document]) -> Result<(), FetchError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    for doc in docs {
        serde_json::to_writer(&mut out, doc).map_err(std::io::Error::from)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
