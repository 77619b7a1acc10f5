use serde::{Deserialize, Serialize};

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod refresh;
pub mod scorer;
pub mod snapshot;
pub mod tokenizer;

pub use cache::{CacheStats, ResultCache};
pub use config::{EngineConfig, StemmerKind, TfMode};
pub use engine::{EngineStats, Readiness, SearchEngine, SearchHit, SearchResults};
pub use error::{BuildError, ConfigError, FetchError, NotReady, RefreshError};
pub use index::{InvertedIndex, IndexBuilder};
pub use refresh::{DocumentSource, RefreshOutcome, Refresher};
pub use scorer::RankedDoc;
pub use snapshot::{Snapshot, SnapshotStore};
pub use tokenizer::{tokenize, Analyzer};

pub type TermId = u32;
pub type DocId = u32;
pub type Term = String;

/// A source record as handed to the index builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(alias = "body", alias = "message")]
    pub text: String,
    /// Secondary searchable field, e.g. the message author.
    #[serde(default, alias = "user_name", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Carried through for display; not indexed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), author: None, timestamp: None }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32, // raw count of the term within the document
}
