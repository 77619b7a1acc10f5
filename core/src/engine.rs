use crate::cache::{CacheStats, ResultCache};
use crate::config::EngineConfig;
use crate::error::{BuildError, NotReady};
use crate::index::InvertedIndex;
use crate::scorer;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::tokenizer::Analyzer;
use crate::Document;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Readiness {
    NotReady,
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub document: Arc<Document>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    /// Version of the snapshot the ranking was computed against.
    pub version: u64,
    /// Matching documents before `skip`/`limit` were applied.
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
    pub cached: bool,
}

impl SearchResults {
    fn empty(version: u64) -> Self {
        Self { version, total_hits: 0, hits: Vec::new(), cached: false }
    }
}

#[derive(Debug, Clone)]
pub struct EngineStats {
    pub readiness: Readiness,
    pub version: Option<u64>,
    pub documents: u32,
    pub terms: usize,
    pub built_at: Option<OffsetDateTime>,
    pub cache: CacheStats,
}

/// In-memory search engine: build, publish and query versioned snapshots.
///
/// Queries read whichever snapshot is active when they start and never wait
/// on an ingest. Ingests are serialized among themselves.
#[derive(Debug)]
pub struct SearchEngine {
    config: EngineConfig,
    analyzer: Analyzer,
    store: SnapshotStore,
    cache: ResultCache,
    writer: Mutex<()>,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            analyzer: Analyzer::from_config(&config),
            cache: ResultCache::new(config.cache_capacity),
            store: SnapshotStore::new(),
            writer: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig { &self.config }

    /// Build an index from `documents` and publish it as the next version.
    ///
    /// On error the active snapshot is left untouched.
    pub fn ingest(&self, documents: Vec<Document>) -> Result<u64, BuildError> {
        let _writer = self.writer.lock();
        let start = Instant::now();
        let index = InvertedIndex::build(self.analyzer.clone(), documents)?;
        let (num_docs, num_terms, skipped) = (index.num_docs, index.num_terms(), index.skipped);

        let version = self.store.publish(index);
        let purged = self.cache.retain_version(version);
        tracing::info!(
            version,
            num_docs,
            num_terms,
            skipped,
            purged,
            took_ms = start.elapsed().as_millis() as u64,
            "published index snapshot"
        );
        Ok(version)
    }

    pub fn query(&self, text: &str, top_k: usize) -> Result<SearchResults, NotReady> {
        self.search_page(text, 0, top_k)
    }

    /// Rank `text` against the active snapshot and return `limit` hits after
    /// skipping the first `skip`.
    pub fn search_page(&self, text: &str, skip: usize, limit: usize) -> Result<SearchResults, NotReady> {
        let snapshot = self.store.current().ok_or(NotReady)?;
        let terms = snapshot.index.analyzer().analyze(text);
        if terms.is_empty() {
            return Ok(SearchResults::empty(snapshot.version));
        }

        // terms never contain whitespace, so the joined form is unambiguous
        let normalized = terms.join(" ");
        let (ranking, cached) = match self.cache.get(&normalized, snapshot.version) {
            Some(ranking) => (ranking, true),
            None => {
                let ranking = Arc::new(scorer::rank(&snapshot.index, &terms, self.config.tf_mode));
                self.cache.put(&normalized, snapshot.version, Arc::clone(&ranking));
                (ranking, false)
            }
        };

        let hits = ranking
            .iter()
            .skip(skip)
            .take(limit)
            .filter_map(|r| {
                snapshot.index.document(r.doc_id).map(|doc| SearchHit {
                    id: doc.id.clone(),
                    score: r.score,
                    document: Arc::clone(doc),
                })
            })
            .collect();

        Ok(SearchResults { version: snapshot.version, total_hits: ranking.len(), hits, cached })
    }

    pub fn health(&self) -> Readiness {
        if self.store.is_published() { Readiness::Ready } else { Readiness::NotReady }
    }

    pub fn is_ready(&self) -> bool { self.health() == Readiness::Ready }

    pub fn document(&self, id: &str) -> Result<Option<Arc<Document>>, NotReady> {
        let snapshot = self.store.current().ok_or(NotReady)?;
        Ok(snapshot.index.document_by_id(id).cloned())
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> { self.store.current() }

    pub fn version(&self) -> Option<u64> { self.store.version() }

    pub fn stats(&self) -> EngineStats {
        let snapshot = self.store.current();
        EngineStats {
            readiness: self.health(),
            version: snapshot.as_ref().map(|s| s.version),
            documents: snapshot.as_ref().map_or(0, |s| s.index.num_docs),
            terms: snapshot.as_ref().map_or(0, |s| s.index.num_terms()),
            built_at: snapshot.as_ref().map(|s| s.built_at),
            cache: self.cache.stats(),
        }
    }

    pub fn clear_cache(&self) { self.cache.clear() }
}
