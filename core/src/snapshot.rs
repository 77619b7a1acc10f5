//! Versioned holder of the active index.
//!
//! Readers clone the `Arc` of the active [`Snapshot`] and release the lock
//! immediately, so scoring never runs under it. A replaced snapshot lives on
//! until its last reader drops the `Arc`.

use crate::index::InvertedIndex;
use parking_lot::RwLock;
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Debug)]
pub struct Snapshot {
    pub version: u64,
    pub built_at: OffsetDateTime,
    pub index: InvertedIndex,
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    active: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self { Self::default() }

    /// Make `index` the active snapshot under the next version number.
    pub fn publish(&self, index: InvertedIndex) -> u64 {
        let built_at = OffsetDateTime::now_utc();
        let mut active = self.active.write();
        let version = active.as_ref().map_or(1, |s| s.version + 1);
        *active = Some(Arc::new(Snapshot { version, built_at, index }));
        version
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.active.read().clone()
    }

    pub fn version(&self) -> Option<u64> {
        self.active.read().as_ref().map(|s| s.version)
    }

    pub fn is_published(&self) -> bool {
        self.active.read().is_some()
    }
}
