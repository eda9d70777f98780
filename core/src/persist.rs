use crate::index::{DocId, InvertedIndex};
use crate::lemma::LemmaTable;
use crate::stats::{TermWeight, WeightVector};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const INDEX_HEADER: &str = "term\tfile_ids";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub version: u32,
}

/// Which vocabulary a TF-IDF table is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermLevel {
    Lemma,
    Token,
}

impl TermLevel {
    fn name(self) -> &'static str {
        match self {
            TermLevel::Lemma => "lemmas",
            TermLevel::Token => "tokens",
        }
    }

    /// File name prefix, e.g. `tfidf_lemmas_`.
    pub fn file_prefix(self) -> String {
        format!("tfidf_{}_", self.name())
    }
}

/// Layout of a built artifact directory.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn inverted_index(&self) -> PathBuf { self.root.join("inverted_index.tsv") }
    pub fn lemma_table(&self) -> PathBuf { self.root.join("lemma_table.tsv") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn tfidf_dir(&self, level: TermLevel) -> PathBuf { self.root.join(format!("tfidf_{}", level.name())) }
    pub fn tfidf_file(&self, level: TermLevel, doc_id: DocId) -> PathBuf {
        self.tfidf_dir(level).join(format!("{}{doc_id}.txt", level.file_prefix()))
    }
}

/// Replace `path` wholesale: write a sibling `.tmp` file, then rename it over the target.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
    Ok(())
}

/// Read a line-oriented text file. Lines that are not valid UTF-8 are logged and blanked,
/// so the rest of the file still loads and line numbers stay aligned.
pub fn read_text_lines(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut text = String::with_capacity(bytes.len());
    for (lineno, line) in bytes.split(|&b| b == b'\n').enumerate() {
        if lineno > 0 {
            text.push('\n');
        }
        match std::str::from_utf8(line) {
            Ok(line) => text.push_str(line),
            Err(err) => {
                tracing::warn!(path = %path.display(), line = lineno + 1, %err, "skipping line that is not valid UTF-8")
            }
        }
    }
    Ok(text)
}

/// `tokens_12.txt` with prefix `tokens_` -> 12.
pub fn parse_doc_id(file_name: &str, prefix: &str) -> Option<DocId> {
    file_name.strip_prefix(prefix)?.strip_suffix(".txt")?.parse().ok()
}

/// Files `<prefix><id>.txt` directly inside `dir`, sorted by id. Files that carry the prefix
/// but no parsable id are skipped with a warning; a missing directory yields nothing.
pub fn list_numbered_files(dir: &Path, prefix: &str) -> Result<Vec<(DocId, PathBuf)>> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "directory not found");
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::warn!(file = %entry.path().display(), "skipping file with non UTF-8 name");
            continue;
        };
        if !name.starts_with(prefix) || name.ends_with(".tmp") {
            continue;
        }
        match parse_doc_id(name, prefix) {
            Some(id) => files.push((id, entry.path().to_path_buf())),
            None => tracing::warn!(file = name, "skipping file with malformed name"),
        }
    }
    files.sort();
    Ok(files)
}

pub fn format_inverted_index(index: &InvertedIndex) -> String {
    let mut out = String::new();
    out.push_str(INDEX_HEADER);
    out.push('\n');
    for (term, posting) in index.iter() {
        let ids: Vec<String> = posting.iter().map(|id| id.to_string()).collect();
        let _ = writeln!(out, "{term}\t{}", ids.join(" "));
    }
    out
}

/// Parse the `term\tfile_ids` table. The first line is the header. Lines without exactly one
/// tab or with an unparsable id are skipped.
pub fn parse_inverted_index(text: &str, source: &str) -> InvertedIndex {
    let mut index = InvertedIndex::new();
    for (lineno, line) in text.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(term), Some(ids), None) = (fields.next(), fields.next(), fields.next()) else {
            tracing::warn!(source, line = lineno + 1, "skipping index line with wrong field count");
            continue;
        };
        let parsed: Result<Vec<DocId>, _> = ids.split_whitespace().map(str::parse).collect();
        match parsed {
            Ok(ids) => {
                for id in ids {
                    index.insert(term, id);
                }
            }
            Err(err) => tracing::warn!(source, line = lineno + 1, %err, "skipping index line with bad id"),
        }
    }
    index
}

pub fn save_inverted_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    write_atomic(&paths.inverted_index(), &format_inverted_index(index))
}

pub fn load_inverted_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let path = paths.inverted_index();
    let text = read_text_lines(&path)?;
    Ok(parse_inverted_index(&text, &path.to_string_lossy()))
}

/// `<term> <idf> <tfidf>` per line, terms sorted, six decimals.
pub fn format_weight_vector(vector: &WeightVector) -> String {
    let mut out = String::new();
    for (term, w) in &vector.terms {
        let _ = writeln!(out, "{term} {:.6} {:.6}", w.idf, w.weight);
    }
    out
}

pub fn parse_weight_vector(doc_id: DocId, text: &str, source: &str) -> WeightVector {
    let mut vector = WeightVector::new(doc_id);
    for (lineno, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let [term, idf, weight] = fields.as_slice() else {
            tracing::warn!(source, line = lineno + 1, fields = fields.len(), "skipping tf-idf line with wrong field count");
            continue;
        };
        match (idf.parse::<f64>(), weight.parse::<f64>()) {
            (Ok(idf), Ok(weight)) => {
                vector.terms.insert(term.to_string(), TermWeight { idf, weight });
            }
            _ => tracing::warn!(source, line = lineno + 1, "skipping tf-idf line with bad number"),
        }
    }
    vector
}

/// Write one table per document, removing tables left over from an earlier build.
pub fn save_weight_vectors(paths: &IndexPaths, level: TermLevel, vectors: &[WeightVector]) -> Result<()> {
    let dir = paths.tfidf_dir(level);
    create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let keep: std::collections::BTreeSet<DocId> = vectors.iter().map(|v| v.doc_id).collect();
    for (id, stale) in list_numbered_files(&dir, &level.file_prefix())? {
        if !keep.contains(&id) {
            fs::remove_file(&stale).with_context(|| format!("removing {}", stale.display()))?;
        }
    }
    for vector in vectors {
        write_atomic(&paths.tfidf_file(level, vector.doc_id), &format_weight_vector(vector))?;
    }
    Ok(())
}

pub fn load_weight_vectors(paths: &IndexPaths, level: TermLevel) -> Result<Vec<WeightVector>> {
    let dir = paths.tfidf_dir(level);
    let mut vectors = Vec::new();
    for (doc_id, path) in list_numbered_files(&dir, &level.file_prefix())? {
        let text = read_text_lines(&path)?;
        vectors.push(parse_weight_vector(doc_id, &text, &path.to_string_lossy()));
    }
    Ok(vectors)
}

pub fn save_lemma_table(paths: &IndexPaths, table: &LemmaTable) -> Result<()> {
    let mut out = String::new();
    for (surface, lemma) in table.sorted() {
        let _ = writeln!(out, "{surface}\t{lemma}");
    }
    write_atomic(&paths.lemma_table(), &out)
}

/// A missing table is not an error: query terms then match index keys verbatim.
pub fn load_lemma_table(paths: &IndexPaths) -> Result<LemmaTable> {
    let path = paths.lemma_table();
    let mut table = LemmaTable::new();
    if !path.exists() {
        tracing::warn!(path = %path.display(), "no lemma table; query terms are used as-is");
        return Ok(table);
    }
    let text = read_text_lines(&path)?;
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once('\t') {
            Some((surface, lemma)) if !surface.is_empty() && !lemma.is_empty() => {
                table.insert(surface, lemma);
            }
            _ => tracing::warn!(path = %path.display(), line = lineno + 1, "skipping malformed lemma table line"),
        }
    }
    Ok(table)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    write_atomic(&paths.meta(), &json)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let meta: MetaFile = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(meta)
}
