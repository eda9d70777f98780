use std::collections::{BTreeMap, BTreeSet};

pub type DocId = u32;

/// Ascending, duplicate-free set of documents containing a term.
pub type Posting = BTreeSet<DocId>;

/// Term -> posting. Built once per corpus snapshot and never patched afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Posting>,
    /// Every document id that appears in at least one posting; the complement base for NOT.
    universe: BTreeSet<DocId>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Build an index from per-document term lists. Repeated terms inside one document are
    /// irrelevant.
    pub fn build<I, T, S>(docs: I) -> Self
    where
        I: IntoIterator<Item = (DocId, T)>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::new();
        for (doc_id, terms) in docs {
            for term in terms {
                index.insert(term.as_ref(), doc_id);
            }
        }
        index
    }

    pub(crate) fn insert(&mut self, term: &str, doc_id: DocId) {
        match self.postings.get_mut(term) {
            Some(posting) => { posting.insert(doc_id); }
            None => { self.postings.insert(term.to_string(), BTreeSet::from([doc_id])); }
        }
        self.universe.insert(doc_id);
    }

    pub fn posting(&self, term: &str) -> Option<&Posting> {
        self.postings.get(term)
    }

    /// Number of documents containing `term`.
    pub fn doc_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map(|p| p.len()).unwrap_or(0)
    }

    pub fn universe(&self) -> &BTreeSet<DocId> {
        &self.universe
    }

    /// Terms in alphabetical order together with their postings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Posting)> {
        self.postings.iter().map(|(t, p)| (t.as_str(), p))
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn num_docs(&self) -> usize { self.universe.len() }

    pub fn is_empty(&self) -> bool { self.postings.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InvertedIndex {
        InvertedIndex::build([
            (1, vec!["bts", "music"]),
            (2, vec!["bts", "tour", "bts"]),
            (3, vec!["music"]),
        ])
    }

    #[test]
    fn postings_are_sorted_and_deduplicated() {
        let index = sample();
        let bts: Vec<DocId> = index.posting("bts").unwrap().iter().copied().collect();
        assert_eq!(bts, vec![1, 2]);
        let music: Vec<DocId> = index.posting("music").unwrap().iter().copied().collect();
        assert_eq!(music, vec![1, 3]);
        assert_eq!(index.doc_frequency("tour"), 1);
        assert_eq!(index.doc_frequency("missing"), 0);
    }

    #[test]
    fn universe_covers_every_posted_document() {
        let index = sample();
        assert_eq!(index.universe().iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(index.num_terms(), 3);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = InvertedIndex::build([(3, vec!["x"]), (1, vec!["x", "y"])]);
        let b = InvertedIndex::build([(1, vec!["y", "x"]), (3, vec!["x"])]);
        assert_eq!(a, b);
        let terms: Vec<&str> = a.iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["x", "y"]);
    }
}
