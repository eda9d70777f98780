//! Boolean retrieval: lexing, shunting-yard conversion to postfix, and set-algebra
//! evaluation against an [`InvertedIndex`].
//!
//! Grammar, loosely: terms separated by whitespace, the case-insensitive keywords
//! `AND`, `OR`, `NOT`, and parentheses. Precedence is `NOT` > `AND` > `OR`.
//! Unbalanced parentheses are tolerated: a stray `)` does nothing and an unclosed `(`
//! is dropped at the end of input.

use crate::error::QueryError;
use crate::index::{DocId, InvertedIndex};
use crate::lemma::Lemmatizer;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    pub fn from_keyword(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("AND") {
            Some(Operator::And)
        } else if word.eq_ignore_ascii_case("OR") {
            Some(Operator::Or)
        } else if word.eq_ignore_ascii_case("NOT") {
            Some(Operator::Not)
        } else {
            None
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            Operator::Not => 3,
            Operator::And => 2,
            Operator::Or => 1,
        }
    }

    /// Number of operands consumed during evaluation.
    pub fn arity(self) -> usize {
        match self {
            Operator::Not => 1,
            Operator::And | Operator::Or => 2,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Operator(Operator),
    LParen,
    RParen,
    /// Lowercased and lemmatized.
    Term(String),
}

/// Postfix sequences never contain parentheses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostfixItem {
    Term(String),
    Operator(Operator),
}

/// Split a query into tokens. Parentheses always stand alone; every other maximal run of
/// non-whitespace, non-parenthesis characters is a keyword or a term.
pub fn lex<L: Lemmatizer + ?Sized>(query: &str, lemmatizer: &L) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if word.is_empty() {
            return;
        }
        let token = match Operator::from_keyword(word.as_str()) {
            Some(op) => Token::Operator(op),
            None => Token::Term(lemmatizer.lemmatize(&word.to_lowercase())),
        };
        tokens.push(token);
        word.clear();
    };
    for c in query.chars() {
        match c {
            '(' | ')' => {
                flush(&mut word, &mut tokens);
                tokens.push(if c == '(' { Token::LParen } else { Token::RParen });
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

/// Shunting-yard conversion to postfix.
///
/// Binary operators pop every stacked operator of greater or equal precedence before being
/// pushed. `NOT` is a prefix operator and pops nothing, so `NOT NOT a` nests.
pub fn to_postfix(tokens: Vec<Token>) -> Vec<PostfixItem> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Term(term) => output.push(PostfixItem::Term(term)),
            Token::LParen => stack.push(Token::LParen),
            Token::RParen => {
                while let Some(top) = stack.pop() {
                    match top {
                        Token::LParen => break,
                        Token::Operator(op) => output.push(PostfixItem::Operator(op)),
                        _ => {}
                    }
                }
            }
            Token::Operator(op) => {
                if op != Operator::Not {
                    while let Some(&Token::Operator(top)) = stack.last() {
                        if top.precedence() < op.precedence() {
                            break;
                        }
                        output.push(PostfixItem::Operator(top));
                        stack.pop();
                    }
                }
                stack.push(Token::Operator(op));
            }
        }
    }

    while let Some(top) = stack.pop() {
        if let Token::Operator(op) = top {
            output.push(PostfixItem::Operator(op));
        }
    }
    output
}

/// Evaluate a postfix sequence. Terms missing from the index evaluate to the empty set.
/// If several operands are left over, the last one pushed is the result.
pub fn evaluate(postfix: &[PostfixItem], index: &InvertedIndex) -> Result<BTreeSet<DocId>, QueryError> {
    let mut stack: Vec<BTreeSet<DocId>> = Vec::new();

    for (position, item) in postfix.iter().enumerate() {
        match item {
            PostfixItem::Term(term) => {
                stack.push(index.posting(term).cloned().unwrap_or_default());
            }
            PostfixItem::Operator(op) => {
                if stack.len() < op.arity() {
                    return Err(QueryError::MissingOperand {
                        operator: *op,
                        position,
                        expected: op.arity(),
                        found: stack.len(),
                    });
                }
                let result = match op {
                    Operator::Not => {
                        let operand = stack.pop().unwrap_or_default();
                        index.universe().difference(&operand).copied().collect()
                    }
                    Operator::And => {
                        let right = stack.pop().unwrap_or_default();
                        let left = stack.pop().unwrap_or_default();
                        left.intersection(&right).copied().collect()
                    }
                    Operator::Or => {
                        let right = stack.pop().unwrap_or_default();
                        let mut left = stack.pop().unwrap_or_default();
                        left.extend(right);
                        left
                    }
                };
                stack.push(result);
            }
        }
    }

    if stack.len() > 1 {
        tracing::debug!(operands = stack.len(), "boolean query left unused operands");
    }
    Ok(stack.pop().unwrap_or_default())
}

/// A query word that is already an index key is kept as written; anything else goes through
/// the wrapped lemmatizer.
struct IndexKeysFirst<'a, L: ?Sized> {
    index: &'a InvertedIndex,
    lemmatizer: &'a L,
}

impl<L: Lemmatizer + ?Sized> Lemmatizer for IndexKeysFirst<'_, L> {
    fn lemmatize(&self, word: &str) -> String {
        if self.index.posting(word).is_some() {
            word.to_string()
        } else {
            self.lemmatizer.lemmatize(word)
        }
    }
}

/// Boolean search over a loaded inverted index. Read-only after construction.
#[derive(Debug, Clone)]
pub struct BooleanSearcher<L> {
    index: InvertedIndex,
    lemmatizer: L,
}

impl<L: Lemmatizer> BooleanSearcher<L> {
    pub fn new(index: InvertedIndex, lemmatizer: L) -> Self {
        Self { index, lemmatizer }
    }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn parse(&self, query: &str) -> Vec<PostfixItem> {
        let lemmatizer = IndexKeysFirst { index: &self.index, lemmatizer: &self.lemmatizer };
        to_postfix(lex(query, &lemmatizer))
    }

    /// Sorted ids of the documents matching `query`.
    pub fn boolean_search(&self, query: &str) -> Result<BTreeSet<DocId>, QueryError> {
        let postfix = self.parse(query);
        evaluate(&postfix, &self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lemma::{Identity, LemmaTable};

    fn term(t: &str) -> PostfixItem { PostfixItem::Term(t.to_string()) }
    fn op(o: Operator) -> PostfixItem { PostfixItem::Operator(o) }

    fn postfix(query: &str) -> Vec<PostfixItem> {
        to_postfix(lex(query, &Identity))
    }

    #[test]
    fn lexes_keywords_case_insensitively() {
        let tokens = lex("(Bts and Music) oR not Tour", &Identity);
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Term("bts".into()),
                Token::Operator(Operator::And),
                Token::Term("music".into()),
                Token::RParen,
                Token::Operator(Operator::Or),
                Token::Operator(Operator::Not),
                Token::Term("tour".into()),
            ]
        );
    }

    #[test]
    fn keyword_prefix_inside_a_word_is_a_term() {
        let tokens = lex("android ORANGE notes", &Identity);
        assert_eq!(
            tokens,
            vec![Token::Term("android".into()), Token::Term("orange".into()), Token::Term("notes".into())]
        );
    }

    #[test]
    fn terms_are_lemmatized() {
        let mut table = LemmaTable::new();
        table.add_group("song", &["songs"]);
        assert_eq!(lex("SONGS", &table), vec![Token::Term("song".into())]);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(postfix("a OR b AND c"), vec![term("a"), term("b"), term("c"), op(Operator::And), op(Operator::Or)]);
    }

    #[test]
    fn not_binds_tightest() {
        assert_eq!(postfix("NOT a AND b"), vec![term("a"), op(Operator::Not), term("b"), op(Operator::And)]);
    }

    #[test]
    fn left_associative_binary_operators() {
        assert_eq!(postfix("a AND b AND c"), vec![term("a"), term("b"), op(Operator::And), term("c"), op(Operator::And)]);
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(postfix("(a OR b) AND c"), vec![term("a"), term("b"), op(Operator::Or), term("c"), op(Operator::And)]);
    }

    #[test]
    fn double_negation_nests() {
        assert_eq!(postfix("NOT NOT a"), vec![term("a"), op(Operator::Not), op(Operator::Not)]);
    }

    #[test]
    fn unbalanced_parentheses_are_tolerated() {
        assert_eq!(postfix("a OR b)"), vec![term("a"), term("b"), op(Operator::Or)]);
        assert_eq!(postfix("((a AND b"), vec![term("a"), term("b"), op(Operator::And)]);
        assert_eq!(postfix(")"), vec![]);
    }

    #[test]
    fn underflow_is_a_query_error() {
        let index = InvertedIndex::build([(1, vec!["a"])]);
        let err = evaluate(&postfix("a AND"), &index).unwrap_err();
        assert_eq!(
            err,
            QueryError::MissingOperand { operator: Operator::And, position: 1, expected: 2, found: 1 }
        );
        assert!(evaluate(&postfix("NOT"), &index).is_err());
    }

    #[test]
    fn empty_query_matches_nothing() {
        let index = InvertedIndex::build([(1, vec!["a"])]);
        assert!(evaluate(&postfix("   "), &index).unwrap().is_empty());
    }

    #[test]
    fn unknown_term_is_empty_not_error() {
        let index = InvertedIndex::build([(1, vec!["a"]), (2, vec!["b"])]);
        assert!(evaluate(&postfix("zzz"), &index).unwrap().is_empty());
        let all: Vec<DocId> = evaluate(&postfix("NOT zzz"), &index).unwrap().into_iter().collect();
        assert_eq!(all, vec![1, 2]);
    }

    #[test]
    fn keyword_shaped_index_term_is_only_reachable_as_a_term() {
        let index = InvertedIndex::build([(1, vec!["and"]), (2, vec!["x"])]);
        let searcher = BooleanSearcher::new(index, Identity);
        // "and" lexes as the operator, so it underflows rather than matching document 1.
        assert!(searcher.boolean_search("and").is_err());
    }
}
