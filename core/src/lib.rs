pub mod boolean;
pub mod build;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod lemma;
pub mod persist;
pub mod snippet;
pub mod stats;
pub mod tokenizer;
pub mod vector;

pub use boolean::{BooleanSearcher, Operator, PostfixItem, Token};
pub use config::SearchConfig;
pub use error::QueryError;
pub use index::{DocId, InvertedIndex, Posting};
pub use lemma::{Identity, LemmaTable, Lemmatizer};
pub use snippet::{PagesDir, TextSource};
pub use stats::{DocumentCounts, TermWeight, WeightVector};
pub use vector::{RankedResults, SearchHit, VectorIndex, VectorSearcher};
