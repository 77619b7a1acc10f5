use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_STARTUP_RETRY_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_MAX_TOP_K: usize = 100;
pub const DEFAULT_MIN_STEM_LENGTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemmerKind {
    /// Ordered suffix-stripping rules.
    #[default]
    Suffix,
    /// Snowball English stemmer.
    Snowball,
    None,
}

impl FromStr for StemmerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suffix" => Ok(Self::Suffix),
            "snowball" | "porter" => Ok(Self::Snowball),
            "none" | "off" => Ok(Self::None),
            other => Err(ConfigError::UnknownStemmer(other.to_string())),
        }
    }
}

/// How the term-frequency factor of a score is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TfMode {
    /// Raw occurrence count.
    #[default]
    Raw,
    /// Occurrence count divided by the document's token count.
    LengthNormalized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub refresh_interval: Duration,
    /// Retry cadence while no index has been built yet.
    pub startup_retry_interval: Duration,
    /// Zero disables result caching.
    pub cache_capacity: usize,
    pub top_k_default: usize,
    pub max_top_k: usize,
    pub min_stem_length: usize,
    pub stemmer: StemmerKind,
    pub remove_stopwords: bool,
    pub tf_mode: TfMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            startup_retry_interval: DEFAULT_STARTUP_RETRY_INTERVAL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            top_k_default: DEFAULT_TOP_K,
            max_top_k: DEFAULT_MAX_TOP_K,
            min_stem_length: DEFAULT_MIN_STEM_LENGTH,
            stemmer: StemmerKind::default(),
            remove_stopwords: true,
            tf_mode: TfMode::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("refresh_interval"));
        }
        if self.startup_retry_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("startup_retry_interval"));
        }
        if self.max_top_k == 0 {
            return Err(ConfigError::Invalid("max_top_k must be at least 1".into()));
        }
        if self.top_k_default == 0 || self.top_k_default > self.max_top_k {
            return Err(ConfigError::Invalid(format!(
                "top_k_default must be within 1..={}, got {}",
                self.max_top_k, self.top_k_default
            )));
        }
        if self.min_stem_length == 0 {
            return Err(ConfigError::Invalid("min_stem_length must be at least 1".into()));
        }
        Ok(())
    }

    /// Clamp a caller-supplied result count into `1..=max_top_k`.
    pub fn clamp_top_k(&self, k: Option<usize>) -> usize {
        k.unwrap_or(self.top_k_default).clamp(1, self.max_top_k)
    }
}
