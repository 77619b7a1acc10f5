use crate::config::TfMode;
use crate::index::InvertedIndex;
use crate::{DocId, Term};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedDoc {
    pub doc_id: DocId,
    pub score: f64,
}

/// Score every document containing at least one of `terms`.
///
/// `score(d) = Σ tf(t, d) · idf(t)` over the query terms, a term repeated in
/// the query contributing once per occurrence. Results are ordered by
/// descending score, then ascending external document identifier.
pub fn rank(index: &InvertedIndex, terms: &[Term], tf_mode: TfMode) -> Vec<RankedDoc> {
    let mut scores: HashMap<DocId, f64> = HashMap::new();
    for term in terms {
        let Some(postings) = index.term_postings(term) else { continue };
        let idf = index.idf(term);
        for p in postings {
            let tf = match tf_mode {
                TfMode::Raw => f64::from(p.tf),
                TfMode::LengthNormalized => {
                    f64::from(p.tf) / f64::from(index.doc_length(p.doc_id).max(1))
                }
            };
            *scores.entry(p.doc_id).or_insert(0.0) += tf * idf;
        }
    }

    let mut ranked: Vec<RankedDoc> =
        scores.into_iter().map(|(doc_id, score)| RankedDoc { doc_id, score }).collect();
    ranked.sort_by(|a, b| {
        b.score.total_cmp(&a.score).then_with(|| external_id(index, a).cmp(external_id(index, b)))
    });
    ranked
}

fn external_id<'a>(index: &'a InvertedIndex, r: &RankedDoc) -> &'a str {
    index.document(r.doc_id).map_or("", |d| d.id.as_str())
}

/// Tokenize `query` with the index's own analyzer and rank.
pub fn search(index: &InvertedIndex, query: &str, top_k: usize, tf_mode: TfMode) -> Vec<RankedDoc> {
    let terms = index.analyzer().analyze(query);
    let mut ranked = rank(index, &terms, tf_mode);
    ranked.truncate(top_k);
    ranked
}
