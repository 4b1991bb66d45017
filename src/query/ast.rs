use crate::core::config::PartialSearchOptions;

/// A query is a tagged sum rather than a dynamically-dispatched tree: a bare
/// string, the wildcard sentinel, or a nested boolean composition. Encoding
/// it as an enum keeps every combinator match exhaustive and lets the query
/// engine walk it without a visitor trait.
#[derive(Clone)]
pub enum Query<ID> {
    /// Tokenized and processed with the same pipeline used for indexing.
    Text(String),
    /// Matches every live document with score `0` plus any document boost.
    Wildcard,
    Composition(Composition<ID>),
}

/// A boolean composition node. `options` carries only the overrides this
/// node specifies; unset fields inherit the effective options of whichever
/// node (or the top-level call) contains it.
#[derive(Clone)]
pub struct Composition<ID> {
    pub queries: Vec<Query<ID>>,
    pub options: PartialSearchOptions<ID>,
}

impl<ID> Composition<ID> {
    pub fn new(queries: Vec<Query<ID>>) -> Self {
        Composition {
            queries,
            options: PartialSearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PartialSearchOptions<ID>) -> Self {
        self.options = options;
        self
    }
}

impl<ID> Query<ID> {
    pub fn text(s: impl Into<String>) -> Self {
        Query::Text(s.into())
    }

    pub fn and(queries: Vec<Query<ID>>) -> Self {
        Query::Composition(Composition::new(queries).with_options(PartialSearchOptions {
            combine_with: Some(crate::core::config::CombineWith::And),
            ..PartialSearchOptions::default()
        }))
    }

    pub fn or(queries: Vec<Query<ID>>) -> Self {
        Query::Composition(Composition::new(queries).with_options(PartialSearchOptions {
            combine_with: Some(crate::core::config::CombineWith::Or),
            ..PartialSearchOptions::default()
        }))
    }

    pub fn and_not(queries: Vec<Query<ID>>) -> Self {
        Query::Composition(Composition::new(queries).with_options(PartialSearchOptions {
            combine_with: Some(crate::core::config::CombineWith::AndNot),
            ..PartialSearchOptions::default()
        }))
    }
}
