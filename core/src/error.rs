//! Error taxonomy of the search core.
//!
//! Fetch and build failures stay inside the refresh path. The only error a
//! query can observe is [`NotReady`].

use thiserror::Error;

/// The document source could not deliver a corpus.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed source data: {0}")]
    Malformed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum BuildError {
    /// Skipped by the builder; reported through the build log.
    #[error("document at position {position} has an empty identifier")]
    EmptyIdentifier { position: usize },

    /// Skipped by the builder; the first occurrence wins.
    #[error("duplicate document identifier {id:?}")]
    DuplicateIdentifier { id: String },

    /// Aborts the build; the previous snapshot stays active.
    #[error("corpus of {count} documents exceeds the addressable document range")]
    CorpusTooLarge { count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("index not ready")]
pub struct NotReady;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("index build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("unknown stemmer {0:?} (expected suffix, snowball or none)")]
    UnknownStemmer(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
