use async_trait::async_trait;
use search_core::{
    Document, DocumentSource, EngineConfig, FetchError, Readiness, RefreshError, RefreshOutcome, Refresher,
    SearchEngine,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Replays scripted fetch results; the last one repeats forever.
struct ScriptedSource {
    script: parking_lot::Mutex<VecDeque<Result<Vec<Document>, String>>>,
    total: parking_lot::Mutex<Option<usize>>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    fn new(script: Vec<Result<Vec<Document>, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: parking_lot::Mutex::new(script.into()),
            total: parking_lot::Mutex::new(None),
            fetches: AtomicUsize::new(0),
        })
    }

    fn report_total(&self, total: Option<usize>) {
        *self.total.lock() = total;
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for ScriptedSource {
    async fn fetch(&self) -> Result<Vec<Document>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock();
        let next = if script.len() > 1 { script.pop_front() } else { script.front().cloned() };
        next.unwrap_or_else(|| Ok(Vec::new())).map_err(FetchError::Transport)
    }

    async fn remote_total(&self) -> Result<Option<usize>, FetchError> {
        Ok(*self.total.lock())
    }
}

fn corpus(ids: &[&str]) -> Vec<Document> {
    ids.iter().map(|id| Document::new(*id, format!("harbor report {id}"))).collect()
}

fn engine(interval: Duration, retry: Duration) -> Arc<SearchEngine> {
    Arc::new(SearchEngine::new(EngineConfig {
        refresh_interval: interval,
        startup_retry_interval: retry,
        ..EngineConfig::default()
    }))
}

#[tokio::test]
async fn first_refresh_makes_engine_ready() {
    let engine = engine(Duration::from_secs(300), Duration::from_secs(10));
    let source = ScriptedSource::new(vec![Ok(corpus(&["a", "b"]))]);
    let refresher = Refresher::new(engine.clone(), source.clone());

    assert_eq!(engine.health(), Readiness::NotReady);
    let outcome = refresher.refresh(true).await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Published { version: 1, documents: 2 });
    assert_eq!(engine.health(), Readiness::Ready);
    assert_eq!(engine.query("harbor", 10).unwrap().total_hits, 2);
}

#[tokio::test]
async fn failed_initial_fetch_stays_not_ready() {
    let engine = engine(Duration::from_secs(300), Duration::from_secs(10));
    let source = ScriptedSource::new(vec![Err("connection refused".into())]);
    let refresher = Refresher::new(engine.clone(), source);

    let err = refresher.refresh(true).await.unwrap_err();
    assert!(matches!(err, RefreshError::Fetch(FetchError::Transport(_))));
    assert_eq!(engine.health(), Readiness::NotReady);
    assert!(engine.query("harbor", 10).is_err());
}

#[tokio::test]
async fn failed_refresh_keeps_last_good_snapshot() {
    let engine = engine(Duration::from_secs(300), Duration::from_secs(10));
    let source = ScriptedSource::new(vec![Ok(corpus(&["a"])), Err("503 from upstream".into())]);
    let refresher = Refresher::new(engine.clone(), source);

    refresher.refresh(true).await.unwrap();
    assert!(refresher.refresh(true).await.is_err());
    assert_eq!(engine.health(), Readiness::Ready);
    assert_eq!(engine.version(), Some(1));
    assert_eq!(engine.query("harbor", 10).unwrap().hits[0].id, "a");
}

#[tokio::test]
async fn unchanged_total_skips_rebuild() {
    let engine = engine(Duration::from_secs(300), Duration::from_secs(10));
    let source = ScriptedSource::new(vec![Ok(corpus(&["a", "b"])), Ok(corpus(&["a", "b", "c"]))]);
    let refresher = Refresher::new(engine.clone(), source.clone());

    refresher.refresh(true).await.unwrap();
    source.report_total(Some(2));
    assert_eq!(refresher.refresh(false).await.unwrap(), RefreshOutcome::Unchanged { total: 2 });
    assert_eq!(source.fetches(), 1);

    // forced refreshes ignore the reported total
    let outcome = refresher.refresh(true).await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Published { version: 2, documents: 3 });

    source.report_total(Some(4));
    assert!(matches!(refresher.refresh(false).await.unwrap(), RefreshOutcome::Published { version: 3, .. }));
}

#[tokio::test]
async fn unknown_total_always_refreshes() {
    let engine = engine(Duration::from_secs(300), Duration::from_secs(10));
    let source = ScriptedSource::new(vec![Ok(corpus(&["a"]))]);
    let refresher = Refresher::new(engine.clone(), source.clone());

    refresher.refresh(false).await.unwrap();
    refresher.refresh(false).await.unwrap();
    assert_eq!(source.fetches(), 2);
    assert_eq!(engine.version(), Some(2));
}

#[tokio::test]
async fn background_loop_recovers_and_republishes() {
    let engine = engine(Duration::from_millis(20), Duration::from_millis(10));
    let source = ScriptedSource::new(vec![
        Err("cold start failure".into()),
        Ok(corpus(&["a"])),
        Err("transient".into()),
        Ok(corpus(&["a", "b"])),
    ]);
    let handle = Arc::new(Refresher::new(engine.clone(), source.clone())).spawn();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while engine.version().unwrap_or(0) < 3 {
        assert!(tokio::time::Instant::now() < deadline, "refresh loop made no progress");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    handle.abort();

    assert_eq!(engine.health(), Readiness::Ready);
    assert!(source.fetches() >= 4);
    assert_eq!(engine.query("harbor", 10).unwrap().total_hits, 2);
}
