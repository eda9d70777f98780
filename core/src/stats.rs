//! TF-IDF statistics over a whole corpus snapshot.
//!
//! Construction is split into a per-document fan-out (each document's counts are turned
//! into a weight vector independently) and a fan-in of document frequencies. Both passes
//! run on rayon and only touch the accumulators they are handed.

use crate::index::DocId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Occurrence counts of one document, keyed by term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentCounts {
    pub doc_id: DocId,
    pub counts: BTreeMap<String, u64>,
    /// Denominator for term frequency. For lemma-level counts this is still the number of
    /// surface token occurrences in the document.
    pub total: u64,
}

impl DocumentCounts {
    /// Counts whose denominator is their own sum.
    pub fn from_counts(doc_id: DocId, counts: BTreeMap<String, u64>) -> Self {
        let total = counts.values().sum();
        Self { doc_id, counts, total }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermWeight {
    pub idf: f64,
    /// tf * idf
    pub weight: f64,
}

/// Per-document TF-IDF vector. A term is present iff its count in the document is nonzero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightVector {
    pub doc_id: DocId,
    pub terms: BTreeMap<String, TermWeight>,
}

impl WeightVector {
    pub fn new(doc_id: DocId) -> Self {
        Self { doc_id, terms: BTreeMap::new() }
    }

    pub fn weight(&self, term: &str) -> Option<f64> {
        self.terms.get(term).map(|w| w.weight)
    }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}

/// Number of documents in which each term has a nonzero count.
pub fn document_frequencies(docs: &[DocumentCounts]) -> BTreeMap<String, u32> {
    docs.par_iter()
        .fold(BTreeMap::new, |mut acc: BTreeMap<String, u32>, doc| {
            for (term, &count) in &doc.counts {
                if count > 0 {
                    *acc.entry(term.clone()).or_insert(0) += 1;
                }
            }
            acc
        })
        .reduce(BTreeMap::new, |mut left, right| {
            for (term, df) in right {
                *left.entry(term).or_insert(0) += df;
            }
            left
        })
}

/// `ln(N / df)`
pub fn idf(num_docs: usize, df: u32) -> f64 {
    (num_docs as f64 / df as f64).ln()
}

/// Weight vector of a single document given corpus-wide document frequencies.
pub fn weigh_document(doc: &DocumentCounts, dfs: &BTreeMap<String, u32>, num_docs: usize) -> WeightVector {
    let mut vector = WeightVector::new(doc.doc_id);
    if doc.total == 0 {
        return vector;
    }
    for (term, &count) in &doc.counts {
        if count == 0 {
            continue;
        }
        let Some(&df) = dfs.get(term) else { continue };
        let tf = count as f64 / doc.total as f64;
        let idf = idf(num_docs, df);
        vector.terms.insert(term.clone(), TermWeight { idf, weight: tf * idf });
    }
    vector
}

/// Weight vectors for every document, in ascending document id order. `N` is the number of
/// documents passed in, including ones with no terms.
pub fn compute_weights(docs: &[DocumentCounts]) -> Vec<WeightVector> {
    let dfs = document_frequencies(docs);
    let num_docs = docs.len();
    let mut vectors: Vec<WeightVector> = docs
        .par_iter()
        .map(|doc| weigh_document(doc, &dfs, num_docs))
        .collect();
    vectors.sort_by_key(|v| v.doc_id);
    tracing::debug!(num_docs, num_terms = dfs.len(), "computed tf-idf weights");
    vectors
}

/// Aggregate surface-token counts into lemma counts. Lemmas none of whose surface forms
/// occur are left out.
pub fn aggregate_lemma_counts(
    token_counts: &BTreeMap<String, u64>,
    groups: &BTreeMap<String, Vec<String>>,
) -> BTreeMap<String, u64> {
    groups
        .iter()
        .filter_map(|(lemma, surfaces)| {
            let count: u64 = surfaces.iter().filter_map(|s| token_counts.get(s)).sum();
            (count > 0).then(|| (lemma.clone(), count))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(doc_id: DocId, pairs: &[(&str, u64)]) -> DocumentCounts {
        DocumentCounts::from_counts(doc_id, pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect())
    }

    #[test]
    fn tf_idf_matches_formula() {
        let docs = vec![
            counts(1, &[("bts", 2), ("music", 2)]),
            counts(2, &[("bts", 1), ("tour", 3)]),
            counts(3, &[("music", 5)]),
        ];
        let vectors = compute_weights(&docs);
        assert_eq!(vectors.len(), 3);

        let bts = vectors[0].terms["bts"];
        assert!((bts.idf - (3.0f64 / 2.0).ln()).abs() < 1e-12);
        assert!((bts.weight - 0.5 * (3.0f64 / 2.0).ln()).abs() < 1e-12);

        let tour = vectors[1].terms["tour"];
        assert!((tour.idf - 3.0f64.ln()).abs() < 1e-12);
        assert!((tour.weight - 0.75 * 3.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn idf_is_constant_across_documents() {
        let docs = vec![counts(1, &[("a", 1), ("b", 4)]), counts(2, &[("a", 7)]), counts(3, &[("c", 1)])];
        let vectors = compute_weights(&docs);
        assert_eq!(vectors[0].terms["a"].idf, vectors[1].terms["a"].idf);
    }

    #[test]
    fn empty_document_yields_empty_vector_but_counts_toward_n() {
        let docs = vec![counts(1, &[("a", 1)]), counts(2, &[])];
        let vectors = compute_weights(&docs);
        assert!(vectors[1].is_empty());
        assert!((vectors[0].terms["a"].idf - 2.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn zero_counts_are_not_terms() {
        let docs = vec![counts(1, &[("a", 0), ("b", 1)]), counts(2, &[("a", 1)])];
        let dfs = document_frequencies(&docs);
        assert_eq!(dfs["a"], 1);
        let vectors = compute_weights(&docs);
        assert!(!vectors[0].terms.contains_key("a"));
    }

    #[test]
    fn output_is_sorted_by_doc_id() {
        let docs = vec![counts(9, &[("a", 1)]), counts(2, &[("a", 1)]), counts(5, &[("b", 1)])];
        let ids: Vec<DocId> = compute_weights(&docs).iter().map(|v| v.doc_id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn lemma_counts_sum_surface_forms() {
        let tokens: BTreeMap<String, u64> =
            [("song", 2), ("songs", 3), ("tour", 1)].iter().map(|(t, c)| (t.to_string(), *c)).collect();
        let mut groups = BTreeMap::new();
        groups.insert("song".to_string(), vec!["song".to_string(), "songs".to_string()]);
        groups.insert("dance".to_string(), vec!["dancing".to_string()]);
        let lemmas = aggregate_lemma_counts(&tokens, &groups);
        assert_eq!(lemmas.get("song"), Some(&5));
        assert!(!lemmas.contains_key("dance"));
    }
}
