use crate::config::{EngineConfig, StemmerKind, DEFAULT_MIN_STEM_LENGTH};
use crate::Term;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{M}\p{N}]+").expect("valid regex");
    static ref SNOWBALL: Stemmer = Stemmer::create(Algorithm::English);
    static ref DEFAULT_ANALYZER: Analyzer = Analyzer::default();
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","after","all","also","am","an","and","any","are","as","at",
            "be","because","been","before","being","both","but","by",
            "can","could",
            "did","do","does","doing",
            "each","every",
            "few","for","from",
            "had","has","have","having","he","her","here","him","his","how",
            "i","if","in","into","is","it","its",
            "just",
            "may","me","might","more","most","must","my",
            "need","no","nor","not","now",
            "of","on","once","only","or","other","our","ours",
            "same","shall","she","should","so","some","such",
            "than","that","the","their","them","then","there","these","they","this","those","to","too",
            "us",
            "very",
            "was","we","were","what","when","where","which","while","who","whom","why","will","with","would",
            "you","your","yours",
        ];
        words.iter().copied().collect()
    };
}

// First matching rule wins, so longer suffixes precede the shorter ones they end with.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("lessness", "less"),
    ("ational", "ate"),
    ("isation", "ize"),
    ("ization", "ize"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("tional", "tion"),
    ("biliti", "ble"),
    ("ation", "ate"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("ousli", "ous"),
    ("entli", "ent"),
    ("alism", "al"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("ator", "ate"),
    ("alli", "al"),
    ("ness", ""),
    ("ment", ""),
    ("ings", ""),
    ("edly", "ed"),
    ("ing", ""),
    ("ied", "y"),
    ("ies", "y"),
    ("eli", "e"),
    ("ed", ""),
    ("ly", ""),
    ("es", ""),
    ("ss", "ss"),
    ("s", ""),
];

/// Words this short are never stemmed.
const MAX_UNSTEMMED_LEN: usize = 3;

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Text normalization pipeline shared by index builds and queries.
///
/// NFKC normalization, lowercasing, splitting on anything that is not a
/// Unicode letter, combining mark or digit, optional stop-word removal and
/// stemming. The output order follows the input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analyzer {
    stemmer: StemmerKind,
    min_stem_length: usize,
    remove_stopwords: bool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(StemmerKind::Suffix, DEFAULT_MIN_STEM_LENGTH, true)
    }
}

impl Analyzer {
    pub fn new(stemmer: StemmerKind, min_stem_length: usize, remove_stopwords: bool) -> Self {
        Self { stemmer, min_stem_length: min_stem_length.max(1), remove_stopwords }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(cfg.stemmer, cfg.min_stem_length, cfg.remove_stopwords)
    }

    pub fn stemmer(&self) -> StemmerKind { self.stemmer }

    pub fn analyze(&self, text: &str) -> Vec<Term> {
        // lowercase 'İ' is "i\u{307}"; fold it so it matches a typed 'i'
        let normalized = text.nfkc().collect::<String>().to_lowercase().replace("i\u{307}", "i");
        RE.find_iter(&normalized)
            .map(|m| m.as_str())
            .filter(|token| !(self.remove_stopwords && is_stopword(token)))
            .map(|token| self.stem(token))
            .collect()
    }

    pub fn stem(&self, word: &str) -> Term {
        if word.chars().count() <= MAX_UNSTEMMED_LEN {
            return word.to_string();
        }
        match self.stemmer {
            StemmerKind::Suffix => strip_suffix(word, self.min_stem_length),
            StemmerKind::Snowball => {
                let stemmed = SNOWBALL.stem(word);
                if stemmed.chars().count() >= self.min_stem_length {
                    stemmed.into_owned()
                } else {
                    word.to_string()
                }
            }
            StemmerKind::None => word.to_string(),
        }
    }
}

fn strip_suffix(word: &str, min_stem_length: usize) -> Term {
    for (suffix, replacement) in SUFFIX_RULES {
        let Some(stem) = word.strip_suffix(suffix) else { continue };
        // identity rule: the ending is protected from the shorter rules below it
        if suffix == replacement {
            break;
        }
        if stem.chars().count() >= min_stem_length {
            return format!("{stem}{replacement}");
        }
    }
    word.to_string()
}

/// Tokenize with the default analyzer (suffix stemming, stop words removed).
pub fn tokenize(text: &str) -> Vec<Term> {
    DEFAULT_ANALYZER.analyze(text)
}
