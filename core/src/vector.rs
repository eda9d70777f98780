use crate::config::SearchConfig;
use crate::index::DocId;
use crate::snippet::{best_window, TextSource};
use crate::stats::WeightVector;
use crate::tokenizer::query_terms;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

pub type TermVector = HashMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub snippet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedResults {
    /// Number of documents with a nonzero score, before truncation to `top_n`.
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Default)]
struct DocVector {
    weights: TermVector,
    norm: f64,
}

/// Euclidean norm.
pub fn norm(vector: &TermVector) -> f64 {
    vector.values().map(|w| w * w).sum::<f64>().sqrt()
}

fn dot(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum()
}

fn cosine_with_norms(a: &TermVector, a_norm: f64, b: &TermVector, b_norm: f64) -> f64 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    (dot(a, b) / (a_norm * b_norm)).clamp(0.0, 1.0)
}

/// Cosine similarity of two non-negative weight vectors, in `[0, 1]`.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    cosine_with_norms(a, norm(a), b, norm(b))
}

/// Per-document TF-IDF vectors plus the corpus-wide IDF table.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    idf: HashMap<String, f64>,
    docs: BTreeMap<DocId, DocVector>,
}

impl VectorIndex {
    /// IDF is constant per term within one snapshot; when it is read from several documents
    /// the value of the lowest document id is used.
    pub fn from_weight_vectors<I: IntoIterator<Item = WeightVector>>(vectors: I) -> Self {
        let mut sorted: Vec<WeightVector> = vectors.into_iter().collect();
        sorted.sort_by_key(|v| v.doc_id);

        let mut index = Self::default();
        for vector in sorted {
            let mut weights = TermVector::with_capacity(vector.terms.len());
            for (term, tw) in vector.terms {
                index.idf.entry(term.clone()).or_insert(tw.idf);
                weights.insert(term, tw.weight);
            }
            let norm = norm(&weights);
            index.docs.insert(vector.doc_id, DocVector { weights, norm });
        }
        index
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn num_terms(&self) -> usize { self.idf.len() }

    /// Query weight vector. Terms unknown to the corpus are dropped; tf is relative to the
    /// known terms only, which does not affect cosine ranking.
    pub fn vectorize(&self, query: &str) -> TermVector {
        let present: Vec<String> = query_terms(query)
            .into_iter()
            .filter(|t| self.idf.contains_key(t))
            .collect();
        if present.is_empty() {
            return TermVector::new();
        }
        let total = present.len() as f64;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for term in present {
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .filter_map(|(term, n)| {
                let idf = self.idf(&term)?;
                Some((term, (n as f64 / total) * idf))
            })
            .collect()
    }

    /// All documents with a nonzero cosine score, best first, ties by ascending id.
    pub fn rank(&self, query: &TermVector) -> Vec<(DocId, f64)> {
        let query_norm = norm(query);
        if query.is_empty() || query_norm == 0.0 {
            return Vec::new();
        }
        let mut scored: Vec<(DocId, f64)> = self
            .docs
            .iter()
            .filter(|(_, doc)| query.keys().any(|t| doc.weights.contains_key(t)))
            .map(|(&doc_id, doc)| (doc_id, cosine_with_norms(query, query_norm, &doc.weights, doc.norm)))
            .filter(|&(_, score)| score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        scored
    }
}

/// Ranked retrieval with snippets over a loaded [`VectorIndex`].
#[derive(Debug, Clone)]
pub struct VectorSearcher<S> {
    index: VectorIndex,
    texts: S,
    config: SearchConfig,
}

impl<S: TextSource> VectorSearcher<S> {
    pub fn new(index: VectorIndex, texts: S) -> Self {
        Self::with_config(index, texts, SearchConfig::default())
    }

    pub fn with_config(index: VectorIndex, texts: S, config: SearchConfig) -> Self {
        Self { index, texts, config }
    }

    pub fn index(&self) -> &VectorIndex { &self.index }

    pub fn texts(&self) -> &S { &self.texts }

    pub fn config(&self) -> &SearchConfig { &self.config }

    pub fn search(&self, query: &str, top_n: usize) -> Vec<SearchHit> {
        self.search_ranked(query, top_n).hits
    }

    pub fn search_ranked(&self, query: &str, top_n: usize) -> RankedResults {
        let query_vector = self.index.vectorize(query);
        let ranked = self.index.rank(&query_vector);
        let total_hits = ranked.len();

        let snippet_terms = query_terms(query);
        let hits = ranked
            .into_iter()
            .take(top_n)
            .map(|(doc_id, score)| {
                let snippet = self
                    .texts
                    .load_text(doc_id)
                    .map(|text| best_window(&text, &snippet_terms, self.config.snippet_window))
                    .unwrap_or_default();
                SearchHit { doc_id, score, snippet }
            })
            .collect();
        RankedResults { total_hits, hits }
    }
}
