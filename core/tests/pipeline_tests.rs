use docsearch_core::build::build_artifacts;
use docsearch_core::corpus::{load_corpus, CorpusPaths};
use docsearch_core::persist::{
    load_inverted_index, load_lemma_table, load_meta, load_weight_vectors, IndexPaths, TermLevel,
};
use docsearch_core::{BooleanSearcher, DocId, PagesDir, VectorIndex, VectorSearcher};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use walkdir::WalkDir;

fn write_corpus(root: &Path) {
    for dir in ["tokens", "lemmas", "pages"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    let docs: [(DocId, &str, &str, &str); 3] = [
        (1, "bts\nmusic\nmusic\nsongs\n", "bts bts\nmusic music\nsong songs\n", "BTS release new music today"),
        (2, "bts\ntour\ntours\n", "bts bts\ntour tour tours\n", "BTS announce a world tour"),
        (3, "music\nsong\n", "music music\nsong song\n", "Classical music and song"),
    ];
    for (id, tokens, lemmas, page) in docs {
        fs::write(root.join(format!("tokens/tokens_{id}.txt")), tokens).unwrap();
        fs::write(root.join(format!("lemmas/lemmas_{id}.txt")), lemmas).unwrap();
        fs::write(root.join(format!("pages/page_{id}.txt")), page).unwrap();
    }
    // Not a document: the id cannot be parsed.
    fs::write(root.join("tokens/tokens_draft.txt"), "ignored\n").unwrap();
}

fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = files_under(root)
        .into_iter()
        .map(|p| (p.strip_prefix(root).unwrap().to_string_lossy().to_string(), fs::read(&p).unwrap()))
        .collect();
    files.sort();
    files
}

fn files_under(root: &Path) -> Vec<std::path::PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

#[test]
fn rebuild_is_byte_identical() {
    let corpus_dir = tempdir().unwrap();
    write_corpus(corpus_dir.path());
    let corpus = load_corpus(&CorpusPaths::new(corpus_dir.path())).unwrap();

    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    build_artifacts(&corpus, &IndexPaths::new(a.path())).unwrap();
    build_artifacts(&corpus, &IndexPaths::new(b.path())).unwrap();
    let first = snapshot(a.path());
    assert_eq!(first, snapshot(b.path()));

    // Building again over an existing output replaces it with the same bytes.
    build_artifacts(&corpus, &IndexPaths::new(a.path())).unwrap();
    assert_eq!(first, snapshot(a.path()));
}

#[test]
fn built_index_answers_boolean_queries() {
    let corpus_dir = tempdir().unwrap();
    write_corpus(corpus_dir.path());
    let corpus = load_corpus(&CorpusPaths::new(corpus_dir.path())).unwrap();
    assert_eq!(corpus.len(), 3);

    let out = tempdir().unwrap();
    let paths = IndexPaths::new(out.path());
    let summary = build_artifacts(&corpus, &paths).unwrap();
    assert_eq!(summary.num_docs, 3);

    let table = fs::read_to_string(paths.inverted_index()).unwrap();
    assert_eq!(table, "term\tfile_ids\nbts\t1 2\nmusic\t1 3\nsong\t1 3\ntour\t2\n");
    assert_eq!(load_meta(&paths).unwrap().num_terms, 4);

    let searcher = BooleanSearcher::new(load_inverted_index(&paths).unwrap(), load_lemma_table(&paths).unwrap());
    let hits: Vec<DocId> = searcher.boolean_search("songs AND NOT bts").unwrap().into_iter().collect();
    assert_eq!(hits, vec![3]);
    let hits: Vec<DocId> = searcher.boolean_search("tours").unwrap().into_iter().collect();
    assert_eq!(hits, vec![2]);
}

#[test]
fn lemma_and_token_tables_are_both_written() {
    let corpus_dir = tempdir().unwrap();
    write_corpus(corpus_dir.path());
    let corpus = load_corpus(&CorpusPaths::new(corpus_dir.path())).unwrap();
    let out = tempdir().unwrap();
    let paths = IndexPaths::new(out.path());
    build_artifacts(&corpus, &paths).unwrap();

    // doc 2: 3 tokens, "tour" lemma covers "tour" and "tours" -> tf 2/3, df 1 -> idf ln 3.
    let lemma_table = fs::read_to_string(paths.tfidf_file(TermLevel::Lemma, 2)).unwrap();
    let expected_idf = 3.0f64.ln();
    let expected = format!("tour {:.6} {:.6}", expected_idf, 2.0 / 3.0 * expected_idf);
    assert!(lemma_table.lines().any(|l| l == expected), "{lemma_table}");

    let token_vectors = load_weight_vectors(&paths, TermLevel::Token).unwrap();
    assert_eq!(token_vectors.len(), 3);
    assert!(token_vectors[1].terms.contains_key("tours"));
    assert_eq!(token_vectors[1].doc_id, 2);
}

#[test]
fn ranked_search_over_built_artifacts() {
    let corpus_dir = tempdir().unwrap();
    write_corpus(corpus_dir.path());
    let corpus = load_corpus(&CorpusPaths::new(corpus_dir.path())).unwrap();
    let out = tempdir().unwrap();
    let paths = IndexPaths::new(out.path());
    build_artifacts(&corpus, &paths).unwrap();

    let index = VectorIndex::from_weight_vectors(load_weight_vectors(&paths, TermLevel::Lemma).unwrap());
    let searcher = VectorSearcher::new(index, PagesDir::new(corpus_dir.path().join("pages")));
    let hits = searcher.search("bts", 10);
    let ids: Vec<DocId> = hits.iter().map(|h| h.doc_id).collect();
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&3));
    assert!(hits.iter().all(|h| h.score > 0.0 && h.score <= 1.0));
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(hits.iter().all(|h| h.snippet.contains("BTS")));

    assert!(searcher.search("nothing matches this", 10).is_empty());
}
