use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::Hooks;
use crate::core::error::{Error, Result};
use crate::core::types::{Hit, StoredFields};

/// How per-term result maps are fused into a single query-level result map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineWith {
    Or,
    And,
    AndNot,
}

impl Default for CombineWith {
    fn default() -> Self {
        CombineWith::Or
    }
}

/// Per-strategy score weights applied to prefix/fuzzy candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub prefix: f32,
    pub fuzzy: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            prefix: 0.375,
            fuzzy: 0.45,
        }
    }
}

/// BM25+ tuning parameters: `k` controls term-frequency saturation, `b`
/// controls length normalization strength, `d` is the lower-bound additive
/// term that keeps long documents from scoring exactly zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k: f32,
    pub b: f32,
    pub d: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params {
            k: 1.2,
            b: 0.75,
            d: 0.5,
        }
    }
}

impl Bm25Params {
    pub fn is_valid(&self) -> bool {
        self.k.is_finite() && self.k >= 0.0 && self.b.is_finite() && self.b >= 0.0 && self.b <= 1.0 && self.d.is_finite() && self.d >= 0.0
    }
}

/// Thresholds that govern when `discard` schedules a background vacuum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoVacuumOptions {
    pub min_dirt_count: u32,
    pub min_dirt_factor: f32,
    pub batch_size: usize,
    pub batch_wait: Duration,
}

impl Default for AutoVacuumOptions {
    fn default() -> Self {
        AutoVacuumOptions {
            min_dirt_count: 20,
            min_dirt_factor: 0.1,
            batch_size: 1000,
            batch_wait: Duration::from_millis(10),
        }
    }
}

/// `(term, position, all query terms) -> bool`, deciding whether a query
/// term should also be expanded via prefix lookup.
pub type PrefixPredicate = Arc<dyn Fn(&str, usize, &[String]) -> bool + Send + Sync>;

/// `(term, position, all query terms) -> fuzziness`. Zero disables fuzzy
/// expansion for that term; values below 1 are a fraction of the term's
/// length, values >= 1 are an absolute max edit distance (pre-clamp by
/// `max_fuzzy`).
pub type FuzzyPredicate = Arc<dyn Fn(&str, usize, &[String]) -> f32 + Send + Sync>;

/// `(term, position, all query terms) -> multiplier` applied to a query
/// term's contribution across every document it matched.
pub type TermBoost = Arc<dyn Fn(&str, usize, &[String]) -> f32 + Send + Sync>;

/// `(id, query, stored fields) -> multiplier`; returning `0.0` drops the
/// document from the result set entirely.
pub type DocumentBoost<ID> = Arc<dyn Fn(&ID, &str, &StoredFields) -> f32 + Send + Sync>;

/// `(hit) -> bool`, applied last, after scoring and document boosting.
pub type ResultFilter<ID> = Arc<dyn Fn(&Hit<ID>) -> bool + Send + Sync>;

/// Options governing a single `search`/`auto_suggest` call. A composition
/// query node inherits its parent's effective options and may override any
/// subset of these fields.
#[derive(Clone)]
pub struct SearchOptions<ID> {
    pub combine_with: CombineWith,
    pub prefix: Option<PrefixPredicate>,
    pub fuzzy: Option<FuzzyPredicate>,
    pub weights: Weights,
    pub fields: Option<Vec<String>>,
    pub boost: HashMap<String, f32>,
    pub filter: Option<ResultFilter<ID>>,
    pub boost_document: Option<DocumentBoost<ID>>,
    pub boost_term: Option<TermBoost>,
    pub bm25: Bm25Params,
}

impl<ID> Default for SearchOptions<ID> {
    fn default() -> Self {
        SearchOptions {
            combine_with: CombineWith::default(),
            prefix: None,
            fuzzy: None,
            weights: Weights::default(),
            fields: None,
            boost: HashMap::new(),
            filter: None,
            boost_document: None,
            boost_term: None,
            bm25: Bm25Params::default(),
        }
    }
}

impl<ID> SearchOptions<ID> {
    /// Overlay `other`'s explicit overrides on top of `self`, used when a
    /// composition node inherits from its parent.
    pub fn merge(&self, other: &PartialSearchOptions<ID>) -> Self {
        SearchOptions {
            combine_with: other.combine_with.unwrap_or(self.combine_with),
            prefix: other.prefix.clone().or_else(|| self.prefix.clone()),
            fuzzy: other.fuzzy.clone().or_else(|| self.fuzzy.clone()),
            weights: other.weights.unwrap_or(self.weights),
            fields: other.fields.clone().or_else(|| self.fields.clone()),
            boost: if other.boost.is_empty() {
                self.boost.clone()
            } else {
                let mut merged = self.boost.clone();
                merged.extend(other.boost.clone());
                merged
            },
            filter: other.filter.clone().or_else(|| self.filter.clone()),
            boost_document: other.boost_document.clone().or_else(|| self.boost_document.clone()),
            boost_term: other.boost_term.clone().or_else(|| self.boost_term.clone()),
            bm25: other.bm25.unwrap_or(self.bm25),
        }
    }
}

/// Per-node overrides as they appear on a composition query; `None`/empty
/// means "inherit from the parent".
#[derive(Clone, Default)]
pub struct PartialSearchOptions<ID> {
    pub combine_with: Option<CombineWith>,
    pub prefix: Option<PrefixPredicate>,
    pub fuzzy: Option<FuzzyPredicate>,
    pub weights: Option<Weights>,
    pub fields: Option<Vec<String>>,
    pub boost: HashMap<String, f32>,
    pub filter: Option<ResultFilter<ID>>,
    pub boost_document: Option<DocumentBoost<ID>>,
    pub boost_term: Option<TermBoost>,
    pub bm25: Option<Bm25Params>,
}

/// Frozen configuration an `Engine` is built from: declared fields, the
/// host's collaborator hooks, and the scoring/vacuum defaults every
/// `search`/`discard` call falls back to unless overridden per-call.
pub struct EngineOptions<D, ID> {
    pub fields: Vec<String>,
    pub store_fields: Vec<String>,
    pub hooks: Hooks<D, ID>,
    /// Carries the default BM25+ params (`search_options.bm25`) that every
    /// `search`/`auto_suggest` call falls back to unless a query node
    /// overrides them; see `SearchOptions::merge`.
    pub search_options: SearchOptions<ID>,
    /// `None` disables the auto-vacuum trigger in `discard`; `vacuum()` can
    /// still be called explicitly.
    pub auto_vacuum: Option<AutoVacuumOptions>,
    pub max_fuzzy: u8,
}

impl<D, ID> EngineOptions<D, ID> {
    pub fn new(fields: Vec<String>, hooks: Hooks<D, ID>) -> Self {
        EngineOptions {
            fields,
            store_fields: Vec::new(),
            hooks,
            search_options: SearchOptions::default(),
            auto_vacuum: Some(AutoVacuumOptions::default()),
            max_fuzzy: 6,
        }
    }

    pub fn with_store_fields(mut self, fields: Vec<String>) -> Self {
        self.store_fields = fields;
        self
    }

    /// Sets the default BM25+ params used for scoring.
    pub fn with_bm25(mut self, bm25: Bm25Params) -> Self {
        self.search_options.bm25 = bm25;
        self
    }

    pub fn with_auto_vacuum(mut self, auto_vacuum: Option<AutoVacuumOptions>) -> Self {
        self.auto_vacuum = auto_vacuum;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::invalid_option("`fields` must declare at least one field"));
        }
        if !self.search_options.bm25.is_valid() {
            return Err(Error::invalid_option("bm25 parameters must be finite and non-negative, with 0 <= b <= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bm25_defaults_are_valid() {
        assert!(Bm25Params::default().is_valid());
    }

    #[test]
    fn negative_bm25_params_are_invalid() {
        let bad = Bm25Params { k: -1.0, ..Bm25Params::default() };
        assert!(!bad.is_valid());
    }

    #[test]
    fn merge_overrides_only_explicit_fields() {
        let base: SearchOptions<u32> = SearchOptions {
            combine_with: CombineWith::Or,
            weights: Weights { prefix: 0.1, fuzzy: 0.2 },
            ..SearchOptions::default()
        };
        let partial = PartialSearchOptions {
            combine_with: Some(CombineWith::And),
            ..PartialSearchOptions::default()
        };
        let merged = base.merge(&partial);
        assert_eq!(merged.combine_with, CombineWith::And);
        assert_eq!(merged.weights.prefix, 0.1);
    }

    #[test]
    fn with_bm25_updates_the_default_search_options() {
        use crate::analysis::Hooks;
        use std::sync::Arc;

        let hooks: Hooks<(), u32> = Hooks::standard_english(Arc::new(|_: &()| None), Arc::new(|_: &(), _: &str| None));
        let custom = Bm25Params { k: 2.0, b: 0.5, d: 1.0 };
        let options: EngineOptions<(), u32> = EngineOptions::new(vec!["title".to_string()], hooks).with_bm25(custom);
        assert_eq!(options.search_options.bm25, custom);
    }

    #[test]
    fn engine_options_reject_empty_fields() {
        use crate::analysis::Hooks;
        use std::sync::Arc;

        let hooks: Hooks<(), u32> = Hooks::standard_english(
            Arc::new(|_: &()| None),
            Arc::new(|_: &(), _: &str| None),
        );
        let options: EngineOptions<(), u32> = EngineOptions::new(Vec::new(), hooks);
        assert!(options.validate().is_err());
    }
}
