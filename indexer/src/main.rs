use anyhow::Result;
use clap::{Parser, Subcommand};
use docsearch_core::build::build_artifacts;
use docsearch_core::corpus::{load_corpus, CorpusPaths};
use docsearch_core::persist::{load_inverted_index, load_lemma_table, load_weight_vectors, IndexPaths, TermLevel};
use docsearch_core::{BooleanSearcher, LemmaTable, PagesDir, SearchConfig, VectorIndex, VectorSearcher};
use tracing_subscriber::{fmt, EnvFilter};

use std::io::{self, BufRead, Write};
use std::time::Instant;

/// Ends an interactive session.
const EXIT_SENTINEL: &str = "exit";

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the boolean index and TF-IDF tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every artifact from a normalized corpus directory (tokens/, lemmas/)
    Build {
        /// Corpus directory
        #[arg(long)]
        corpus: String,
        /// Output artifact directory
        #[arg(long, default_value = "./index")]
        output: String,
    },
    /// Boolean search with AND, OR, NOT and parentheses
    Boolean {
        /// Artifact directory written by `build`
        #[arg(long, default_value = "./index")]
        index: String,
        /// Run a single query instead of the interactive console
        #[arg(long)]
        query: Option<String>,
    },
    /// Ranked cosine-similarity search with snippets
    Search {
        /// Artifact directory written by `build`
        #[arg(long, default_value = "./index")]
        index: String,
        /// Directory of page_<id>.txt texts used for snippets
        #[arg(long)]
        pages: String,
        /// Run a single query instead of the interactive console
        #[arg(long)]
        query: Option<String>,
        /// Number of results
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Snippet window in words
        #[arg(long, default_value_t = 100)]
        window: usize,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { corpus, output } => build(&corpus, &output),
        Commands::Boolean { index, query } => boolean(&index, query),
        Commands::Search { index, pages, query, top, window, json } => {
            let config = SearchConfig { snippet_window: window, ..SearchConfig::default() };
            search(&index, &pages, query, top, config, json)
        }
    }
}

fn build(corpus: &str, output: &str) -> Result<()> {
    let start = Instant::now();
    let corpus = load_corpus(&CorpusPaths::new(corpus))?;
    let summary = build_artifacts(&corpus, &IndexPaths::new(output))?;
    tracing::info!(
        output,
        num_docs = summary.num_docs,
        num_terms = summary.num_terms,
        lemma_forms = summary.num_lemma_forms,
        took_s = start.elapsed().as_secs_f64(),
        "index build complete"
    );
    Ok(())
}

fn boolean(index_dir: &str, query: Option<String>) -> Result<()> {
    let paths = IndexPaths::new(index_dir);
    let searcher: BooleanSearcher<LemmaTable> =
        BooleanSearcher::new(load_inverted_index(&paths)?, load_lemma_table(&paths)?);
    tracing::info!(num_terms = searcher.index().num_terms(), num_docs = searcher.index().num_docs(), "index loaded");

    let run = |q: &str| match searcher.boolean_search(q) {
        Ok(ids) => {
            println!("found {} documents", ids.len());
            for id in ids {
                println!("{id}");
            }
        }
        Err(err) => eprintln!("query error: {err}"),
    };
    match query {
        Some(q) => run(&q),
        None => console("boolean> ", run)?,
    }
    Ok(())
}

fn search(index_dir: &str, pages: &str, query: Option<String>, top: usize, config: SearchConfig, json: bool) -> Result<()> {
    let paths = IndexPaths::new(index_dir);
    let index = VectorIndex::from_weight_vectors(load_weight_vectors(&paths, TermLevel::Lemma)?);
    tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), "tf-idf vectors loaded");
    let top = config.clamp_top_n(top);
    let searcher = VectorSearcher::with_config(index, PagesDir::new(pages), config);

    let run = |q: &str| {
        let results = searcher.search_ranked(q, top);
        if json {
            match serde_json::to_string_pretty(&results) {
                Ok(s) => println!("{s}"),
                Err(err) => eprintln!("serialization error: {err}"),
            }
            return;
        }
        println!("{} matching documents", results.total_hits);
        for (rank, hit) in results.hits.iter().enumerate() {
            println!("{}. doc {} ({:.4})", rank + 1, hit.doc_id, hit.score);
            println!("   {}", hit.snippet);
        }
    };
    match query {
        Some(q) => run(&q),
        None => console("search> ", run)?,
    }
    Ok(())
}

/// Read queries from stdin until EOF or the exit sentinel.
fn console<F: Fn(&str)>(prompt: &str, run: F) -> Result<()> {
    println!("Type '{EXIT_SENTINEL}' to quit.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{prompt}");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let q = line.trim();
        if q.eq_ignore_ascii_case(EXIT_SENTINEL) {
            break;
        }
        if q.is_empty() {
            continue;
        }
        run(q);
        println!();
    }
    Ok(())
}
