use crate::index::DocId;
use crate::tokenizer::words;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Full document text, used only for snippets. A missing document is `None`, never an error.
pub trait TextSource {
    fn load_text(&self, doc_id: DocId) -> Option<String>;
}

/// Directory of extracted page texts named `page_<id>.txt`.
#[derive(Debug, Clone)]
pub struct PagesDir {
    root: PathBuf,
}

impl PagesDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn page_path(&self, doc_id: DocId) -> PathBuf {
        self.root.join(format!("page_{doc_id}.txt"))
    }
}

impl TextSource for PagesDir {
    fn load_text(&self, doc_id: DocId) -> Option<String> {
        let path = self.page_path(doc_id);
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "page text unavailable");
                None
            }
        }
    }
}

impl TextSource for HashMap<DocId, String> {
    fn load_text(&self, doc_id: DocId) -> Option<String> {
        self.get(&doc_id).cloned()
    }
}

/// Pick the `window`-word excerpt with the most words containing a query term.
///
/// Terms are matched as case-insensitive substrings of each word. Ties go to the earliest
/// window, so a text without any hit yields its first `window` words, and a text shorter
/// than the window is returned whole. Every window is scored from scratch, which is
/// O(words * window); fine for page-sized texts, a rolling count would be needed for
/// book-sized ones.
pub fn best_window(text: &str, query_terms: &[String], window: usize) -> String {
    let words = words(text);
    if words.is_empty() || window == 0 {
        return String::new();
    }
    let terms: Vec<String> = query_terms
        .iter()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let hits: Vec<bool> = words
        .iter()
        .map(|w| {
            let lower = w.to_lowercase();
            terms.iter().any(|t| lower.contains(t.as_str()))
        })
        .collect();

    let width = window.min(words.len());
    let mut best_start = 0;
    let mut best_score = 0;
    for start in 0..=(words.len() - width) {
        let score = hits[start..start + width].iter().filter(|&&h| h).count();
        if score > best_score {
            best_score = score;
            best_start = start;
        }
    }
    words[best_start..best_start + width].join(" ")
}
