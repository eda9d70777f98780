//! Reading the normalized corpus produced by the tokenizer/lemmatizer stage.
//!
//! ```text
//! <corpus>/tokens/tokens_<id>.txt   one surface token occurrence per line
//! <corpus>/lemmas/lemmas_<id>.txt   "<lemma> <surface> <surface> ..." per line
//! <corpus>/pages/page_<id>.txt      extracted text, only used for snippets
//! ```

use crate::index::{DocId, InvertedIndex};
use crate::lemma::{parse_lemma_groups, LemmaTable};
use crate::persist::{list_numbered_files, read_text_lines};
use crate::stats::{aggregate_lemma_counts, DocumentCounts};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const TOKENS_PREFIX: &str = "tokens_";
pub const LEMMAS_PREFIX: &str = "lemmas_";

pub struct CorpusPaths {
    pub root: PathBuf,
}

impl CorpusPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn tokens_dir(&self) -> PathBuf { self.root.join("tokens") }
    pub fn lemmas_dir(&self) -> PathBuf { self.root.join("lemmas") }
    pub fn pages_dir(&self) -> PathBuf { self.root.join("pages") }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusDocument {
    pub doc_id: DocId,
    /// Surface token -> occurrences.
    pub tokens: BTreeMap<String, u64>,
    /// Lemma -> surface forms, as grouped for this document.
    pub lemmas: BTreeMap<String, Vec<String>>,
}

impl CorpusDocument {
    pub fn total_tokens(&self) -> u64 {
        self.tokens.values().sum()
    }

    pub fn token_counts(&self) -> DocumentCounts {
        DocumentCounts::from_counts(self.doc_id, self.tokens.clone())
    }

    /// Lemma counts; the tf denominator stays the surface token total.
    pub fn lemma_counts(&self) -> DocumentCounts {
        DocumentCounts {
            doc_id: self.doc_id,
            counts: aggregate_lemma_counts(&self.tokens, &self.lemmas),
            total: self.total_tokens(),
        }
    }
}

/// All documents, ascending by id.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<CorpusDocument>,
}

impl Corpus {
    pub fn new(mut documents: Vec<CorpusDocument>) -> Self {
        documents.sort_by_key(|d| d.doc_id);
        Self { documents }
    }

    pub fn len(&self) -> usize { self.documents.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn token_counts(&self) -> Vec<DocumentCounts> {
        self.documents.iter().map(CorpusDocument::token_counts).collect()
    }

    pub fn lemma_counts(&self) -> Vec<DocumentCounts> {
        self.documents.iter().map(CorpusDocument::lemma_counts).collect()
    }

    /// Inverted index over the lemmas listed for each document.
    pub fn inverted_index(&self) -> InvertedIndex {
        InvertedIndex::build(self.documents.iter().map(|d| (d.doc_id, d.lemmas.keys())))
    }

    /// Surface form -> lemma over every document; lower ids win on conflicts.
    pub fn lemma_table(&self) -> LemmaTable {
        let mut table = LemmaTable::new();
        for doc in &self.documents {
            for (lemma, surfaces) in &doc.lemmas {
                table.add_group(lemma, surfaces.as_slice());
            }
        }
        table
    }
}

/// One token occurrence per line; blank lines are ignored.
pub fn parse_token_counts(text: &str) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for token in text.lines().map(str::trim).filter(|t| !t.is_empty()) {
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Load every document that has a token file or a lemma file.
pub fn load_corpus(paths: &CorpusPaths) -> Result<Corpus> {
    let token_files: BTreeMap<DocId, PathBuf> =
        list_numbered_files(&paths.tokens_dir(), TOKENS_PREFIX)?.into_iter().collect();
    let lemma_files: BTreeMap<DocId, PathBuf> =
        list_numbered_files(&paths.lemmas_dir(), LEMMAS_PREFIX)?.into_iter().collect();

    let ids: BTreeSet<DocId> = token_files.keys().chain(lemma_files.keys()).copied().collect();
    let mut documents = Vec::with_capacity(ids.len());
    for doc_id in ids {
        let mut doc = CorpusDocument { doc_id, ..Default::default() };
        match token_files.get(&doc_id) {
            Some(path) => {
                let text = read_text_lines(path)?;
                doc.tokens = parse_token_counts(&text);
            }
            None => tracing::warn!(doc_id, "no token file; document has no term statistics"),
        }
        match lemma_files.get(&doc_id) {
            Some(path) => {
                let text = read_text_lines(path)?;
                doc.lemmas = parse_lemma_groups(&text);
            }
            None => tracing::warn!(doc_id, "no lemma file; document is not in the inverted index"),
        }
        documents.push(doc);
    }
    tracing::info!(root = %paths.root.display(), num_docs = documents.len(), "loaded corpus");
    Ok(Corpus::new(documents))
}
