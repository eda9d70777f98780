use crate::corpus::Corpus;
use crate::persist::{
    save_inverted_index, save_lemma_table, save_meta, save_weight_vectors, IndexPaths, MetaFile, TermLevel,
    FORMAT_VERSION,
};
use crate::stats::compute_weights;
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub num_docs: usize,
    pub num_terms: usize,
    pub num_lemma_forms: usize,
}

/// Build every query-time artifact for `corpus` into `out`, replacing any previous build.
/// The output depends only on the corpus, so rebuilding is byte-for-byte reproducible.
pub fn build_artifacts(corpus: &Corpus, out: &IndexPaths) -> Result<BuildSummary> {
    let index = corpus.inverted_index();
    save_inverted_index(out, &index)?;
    tracing::info!(num_terms = index.num_terms(), "wrote inverted index");

    let lemma_vectors = compute_weights(&corpus.lemma_counts());
    save_weight_vectors(out, TermLevel::Lemma, &lemma_vectors)?;
    let token_vectors = compute_weights(&corpus.token_counts());
    save_weight_vectors(out, TermLevel::Token, &token_vectors)?;
    tracing::info!(num_docs = corpus.len(), "wrote tf-idf tables");

    let table = corpus.lemma_table();
    save_lemma_table(out, &table)?;

    let meta = MetaFile {
        num_docs: corpus.len() as u32,
        num_terms: index.num_terms() as u32,
        version: FORMAT_VERSION,
    };
    save_meta(out, &meta)?;

    Ok(BuildSummary { num_docs: corpus.len(), num_terms: index.num_terms(), num_lemma_forms: table.len() })
}
