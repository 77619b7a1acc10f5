use crate::error::BuildError;
use crate::tokenizer::Analyzer;
use crate::{DocId, Document, Posting, Term, TermId};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable inverted index over one corpus snapshot.
///
/// Postings are stored per term id in ascending `doc_id` order, which is the
/// order documents were handed to the builder.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    pub dictionary: HashMap<Term, TermId>,
    pub df: Vec<u32>,
    pub postings: Vec<Vec<Posting>>, // indexed by TermId
    pub docs: Vec<Arc<Document>>,    // indexed by DocId
    pub doc_lengths: Vec<u32>,
    pub doc_ids: HashMap<String, DocId>,
    pub num_docs: u32,
    /// Documents rejected during the build.
    pub skipped: usize,
    analyzer: Analyzer,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Build an index in one pass over `documents`.
    pub fn build<I>(analyzer: Analyzer, documents: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut builder = IndexBuilder::new(analyzer);
        for doc in documents {
            builder.add(doc)?;
        }
        Ok(builder.finish())
    }

    /// The analyzer this index was built with. Queries must use the same one.
    pub fn analyzer(&self) -> &Analyzer { &self.analyzer }

    pub fn num_terms(&self) -> usize { self.dictionary.len() }

    pub fn is_empty(&self) -> bool { self.num_docs == 0 }

    pub fn term_postings(&self, term: &str) -> Option<&[Posting]> {
        let tid = *self.dictionary.get(term)?;
        self.postings.get(tid as usize).map(Vec::as_slice)
    }

    pub fn doc_freq(&self, term: &str) -> u32 {
        self.dictionary
            .get(term)
            .and_then(|tid| self.df.get(*tid as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Smoothed inverse document frequency: `ln((N + 1) / (df + 1)) + 1`.
    ///
    /// Always positive, also for terms present in every document.
    pub fn idf(&self, term: &str) -> f64 {
        idf(self.num_docs, self.doc_freq(term))
    }

    pub fn document(&self, doc_id: DocId) -> Option<&Arc<Document>> {
        self.docs.get(doc_id as usize)
    }

    pub fn document_by_id(&self, id: &str) -> Option<&Arc<Document>> {
        self.doc_ids.get(id).and_then(|d| self.document(*d))
    }

    pub fn doc_length(&self, doc_id: DocId) -> u32 {
        self.doc_lengths.get(doc_id as usize).copied().unwrap_or(0)
    }
}

pub fn idf(num_docs: u32, df: u32) -> f64 {
    ((f64::from(num_docs) + 1.0) / (f64::from(df) + 1.0)).ln() + 1.0
}

/// Accumulates documents into a fresh [`InvertedIndex`].
///
/// Documents with an empty identifier or an identifier already seen in this
/// build are skipped and counted, they never abort the build.
pub struct IndexBuilder {
    index: InvertedIndex,
    position: usize,
}

impl IndexBuilder {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { index: InvertedIndex { analyzer, ..InvertedIndex::default() }, position: 0 }
    }

    pub fn add(&mut self, doc: Document) -> Result<(), BuildError> {
        let position = self.position;
        self.position += 1;

        if let Err(err) = self.validate(&doc, position) {
            tracing::warn!(%err, "skipping document");
            self.index.skipped += 1;
            return Ok(());
        }

        let doc_id = DocId::try_from(self.index.docs.len())
            .map_err(|_| BuildError::CorpusTooLarge { count: self.index.docs.len() + 1 })?;

        let idx = &mut self.index;
        let mut tokens = idx.analyzer.analyze(&doc.text);
        if let Some(author) = &doc.author {
            tokens.extend(idx.analyzer.analyze(author));
        }
        let doc_len = u32::try_from(tokens.len()).unwrap_or(u32::MAX);

        let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
        for term in tokens {
            let next_tid = idx.postings.len() as TermId;
            let tid = *idx.dictionary.entry(term).or_insert(next_tid);
            if tid == next_tid {
                idx.postings.push(Vec::new());
                idx.df.push(0);
            }
            *tf_counts.entry(tid).or_insert(0) += 1;
        }

        for (tid, tf) in tf_counts {
            idx.postings[tid as usize].push(Posting { doc_id, tf });
            idx.df[tid as usize] += 1;
        }

        idx.doc_ids.insert(doc.id.clone(), doc_id);
        idx.docs.push(Arc::new(doc));
        idx.doc_lengths.push(doc_len);
        idx.num_docs = doc_id + 1;
        Ok(())
    }

    fn validate(&self, doc: &Document, position: usize) -> Result<(), BuildError> {
        if doc.id.trim().is_empty() {
            return Err(BuildError::EmptyIdentifier { position });
        }
        if self.index.doc_ids.contains_key(&doc.id) {
            return Err(BuildError::DuplicateIdentifier { id: doc.id.clone() });
        }
        Ok(())
    }

    pub fn finish(self) -> InvertedIndex {
        let index = self.index;
        tracing::debug!(
            num_docs = index.num_docs,
            num_terms = index.num_terms(),
            skipped = index.skipped,
            "index built"
        );
        index
    }
}
