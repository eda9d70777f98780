use std::collections::{BTreeMap, HashMap};

/// Maps a lowercase surface form to the canonical term used as an index key.
pub trait Lemmatizer {
    fn lemmatize(&self, word: &str) -> String;
}

/// Leaves every word unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Lemmatizer for Identity {
    fn lemmatize(&self, word: &str) -> String { word.to_string() }
}

/// Reverse lookup surface form -> lemma, assembled from the per-document lemma groupings
/// written by the normalization stage. Unknown forms lemmatize to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LemmaTable {
    forms: HashMap<String, String>,
}

impl LemmaTable {
    pub fn new() -> Self { Self::default() }

    /// Record `surface -> lemma`. The first mapping seen for a surface form is kept.
    pub fn insert(&mut self, surface: &str, lemma: &str) -> bool {
        if self.forms.contains_key(surface) {
            return false;
        }
        self.forms.insert(surface.to_string(), lemma.to_string());
        true
    }

    /// Fold one lemma group (`lemma` plus its surface forms) into the table.
    pub fn add_group<S: AsRef<str>>(&mut self, lemma: &str, surfaces: &[S]) {
        for surface in surfaces {
            self.insert(surface.as_ref(), lemma);
        }
    }

    pub fn get(&self, surface: &str) -> Option<&str> {
        self.forms.get(surface).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize { self.forms.len() }

    pub fn is_empty(&self) -> bool { self.forms.is_empty() }

    /// Entries sorted by surface form.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self.forms.iter().map(|(s, l)| (s.as_str(), l.as_str())).collect();
        entries.sort_unstable();
        entries
    }
}

impl Lemmatizer for LemmaTable {
    fn lemmatize(&self, word: &str) -> String {
        self.get(word).unwrap_or(word).to_string()
    }
}

/// Parse `<lemma> <surface> <surface> ...`. Blank lines yield `None`.
pub fn parse_lemma_line(line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = line.split_whitespace();
    let lemma = parts.next()?;
    Some((lemma.to_string(), parts.map(str::to_string).collect()))
}

/// Parse a whole lemma file, merging repeated lemma lines.
pub fn parse_lemma_groups(text: &str) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (lemma, surfaces) in text.lines().filter_map(parse_lemma_line) {
        let entry = groups.entry(lemma).or_default();
        for surface in surfaces {
            if !entry.contains(&surface) {
                entry.push(surface);
            }
        }
    }
    groups
}
