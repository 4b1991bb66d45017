use std::collections::HashMap;
use std::hash::Hash;

use crate::analysis::hooks::{ProcessTermFn, TokenizeFn};
use crate::core::config::SearchOptions;
use crate::core::error::{Error, Result};
use crate::core::types::ProcessedTerm;
use crate::index::store::{IndexStore, PostingsByField};
use crate::query::ast::{Composition, Query};
use crate::query::combinator::{combine, ResultMap};
use crate::query::scoring::{contribution, edit_weight};

/// Walks `query`, computing each node's effective (inherited-then-overridden)
/// options the same way `QueryEngine::evaluate` will, and fails with
/// `MissingField` the first time a node's `fields` restriction names
/// something outside `declared`. Run once, up front, so a bad field name
/// fails the whole call instead of silently scoring zero candidates.
pub fn validate_fields<ID>(query: &Query<ID>, options: &SearchOptions<ID>, declared: &[String]) -> Result<()> {
    if let Some(restrict) = &options.fields {
        for field in restrict {
            if !declared.iter().any(|f| f == field) {
                return Err(Error::missing_field(field));
            }
        }
    }
    if let Query::Composition(Composition { queries, options: overrides }) = query {
        let effective = options.merge(overrides);
        for child in queries {
            validate_fields(child, &effective, declared)?;
        }
    }
    Ok(())
}

/// Walks a `Query` tree against an `IndexStore`, expanding each text term
/// via exact/prefix/fuzzy lookup, scoring candidates with BM25+, and fusing
/// per-term maps per the node's (inherited or overridden) `combine_with`.
/// Everything here operates in short-id space; projecting into `Hit<ID>`s
/// (quality scaling, document boosting, filtering, sorting) is the caller's
/// job, since the wildcard query bypasses those term-combination semantics
/// entirely.
pub struct QueryEngine<'a, ID> {
    store: &'a IndexStore<ID>,
    field_names: &'a [String],
    tokenize: &'a TokenizeFn,
    process_term: &'a ProcessTermFn,
    max_fuzzy: u8,
}

impl<'a, ID: Eq + Hash + Clone> QueryEngine<'a, ID> {
    pub fn new(
        store: &'a IndexStore<ID>,
        field_names: &'a [String],
        tokenize: &'a TokenizeFn,
        process_term: &'a ProcessTermFn,
        max_fuzzy: u8,
    ) -> Self {
        QueryEngine {
            store,
            field_names,
            tokenize,
            process_term,
            max_fuzzy,
        }
    }

    /// Tokenizes and processes `text` with `field = None`, the same hooks
    /// used while indexing, yielding the effective query terms.
    pub fn effective_terms(&self, text: &str) -> Vec<String> {
        (self.tokenize)(text, None)
            .into_iter()
            .flat_map(|token| match (self.process_term)(&token, None) {
                ProcessedTerm::One(term) => vec![term],
                ProcessedTerm::Many(terms) => terms,
                ProcessedTerm::Drop => Vec::new(),
            })
            .collect()
    }

    pub fn evaluate(&self, query: &Query<ID>, options: &SearchOptions<ID>) -> ResultMap {
        match query {
            Query::Wildcard => {
                let mut map = ResultMap::new();
                for (short_id, _) in self.store.live_ids() {
                    map.insert(short_id, Default::default());
                }
                map
            }
            Query::Text(text) => {
                let terms = self.effective_terms(text);
                let per_term: Vec<ResultMap> = terms
                    .iter()
                    .enumerate()
                    .map(|(i, term)| self.score_term(term, i, &terms, options))
                    .collect();
                combine(options.combine_with, per_term)
            }
            Query::Composition(Composition { queries, options: overrides }) => {
                let effective = options.merge(overrides);
                let child_maps: Vec<ResultMap> = queries.iter().map(|q| self.evaluate(q, &effective)).collect();
                combine(effective.combine_with, child_maps)
            }
        }
    }

    /// Expands query term `term` (at position `i` among `terms`) into
    /// exact/prefix/fuzzy candidates and scores every (field, document)
    /// posting under each candidate, per §4.4.
    fn score_term(&self, term: &str, i: usize, terms: &[String], options: &SearchOptions<ID>) -> ResultMap {
        let candidates = self.expand_candidates(term, i, terms, options);
        let mut result: ResultMap = HashMap::new();
        let total_docs = self.store.document_count() as f32;

        for (dict_term, (edit_distance, weight)) in &candidates {
            let Some(by_field) = self.store.dictionary().get(dict_term) else {
                continue;
            };
            let doc_frequency = distinct_live_documents(by_field, self.store) as f32;

            for (&field_id, docs) in by_field {
                let field_name = &self.field_names[field_id.value() as usize];
                if let Some(restrict) = &options.fields {
                    if !restrict.iter().any(|f| f == field_name) {
                        continue;
                    }
                }
                let field_boost = options.boost.get(field_name).copied().unwrap_or(1.0);
                let avg_len = self.store.avg_field_length(field_id);

                for (&short_id, &tf) in docs {
                    if !self.store.is_live(short_id) {
                        continue;
                    }
                    let field_len = self.store.field_length_of(short_id, field_id) as f32;
                    let score = contribution(
                        tf as f32,
                        doc_frequency,
                        total_docs,
                        field_len,
                        avg_len,
                        &options.bm25,
                        field_boost,
                        *weight,
                        *edit_distance,
                    );
                    let entry = result.entry(short_id).or_default();
                    entry.score += score;
                    entry
                        .match_info
                        .entry(dict_term.clone())
                        .or_default()
                        .insert(field_name.clone());
                    entry.terms_matched.insert(i);
                }
            }
        }

        if let Some(boost_term) = &options.boost_term {
            let factor = boost_term(term, i, terms);
            for entry in result.values_mut() {
                entry.score *= factor;
            }
        }

        result
    }

    /// Exact/prefix/fuzzy candidate expansion. Each dictionary term found
    /// by more than one strategy keeps only the one whose
    /// `weight * editWeight` factor is highest, since that factor scales
    /// every document's contribution uniformly.
    fn expand_candidates(
        &self,
        term: &str,
        i: usize,
        terms: &[String],
        options: &SearchOptions<ID>,
    ) -> HashMap<String, (usize, f32)> {
        let mut candidates: HashMap<String, (usize, f32)> = HashMap::new();
        let mut consider = |key: String, distance: usize, weight: f32| {
            let quality = weight * edit_weight(distance);
            candidates
                .entry(key)
                .and_modify(|(existing_distance, existing_weight)| {
                    let existing_quality = *existing_weight * edit_weight(*existing_distance);
                    if quality > existing_quality {
                        *existing_distance = distance;
                        *existing_weight = weight;
                    }
                })
                .or_insert((distance, weight));
        };

        if self.store.dictionary().has(term) {
            consider(term.to_string(), 0, 1.0);
        }

        if let Some(prefix) = &options.prefix {
            if prefix(term, i, terms) {
                let term_len = term.chars().count();
                for (key, _) in self.store.dictionary().at_prefix(term) {
                    let distance = key.chars().count().saturating_sub(term_len);
                    consider(key, distance, options.weights.prefix);
                }
            }
        }

        if let Some(fuzzy) = &options.fuzzy {
            let f = fuzzy(term, i, terms);
            if f != 0.0 {
                let max_distance = if f < 1.0 {
                    ((f * term.chars().count() as f32).round() as usize).min(self.max_fuzzy as usize)
                } else {
                    (f.floor() as usize).min(self.max_fuzzy as usize)
                };
                for (key, (_, distance)) in self.store.dictionary().fuzzy_get(term, max_distance) {
                    consider(key, distance, options.weights.fuzzy);
                }
            }
        }

        candidates
    }
}

/// Distinct-document frequency (`df` in the BM25+ formula) counted only
/// over live short-ids: postings for a document tombstoned by `discard`
/// but not yet vacuumed must not inflate `df`, or `idf` skews low for
/// every candidate that still shares a dictionary term with it.
fn distinct_live_documents<ID>(by_field: &PostingsByField, store: &IndexStore<ID>) -> usize {
    let mut seen = std::collections::HashSet::new();
    for docs in by_field.values() {
        seen.extend(docs.keys().copied().filter(|&short_id| store.is_live(short_id)));
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FieldId;
    use std::sync::Arc;

    fn tokenize() -> TokenizeFn {
        Arc::new(|text: &str, _field: Option<&str>| text.split_whitespace().map(str::to_lowercase).collect())
    }

    fn process_term() -> ProcessTermFn {
        Arc::new(|term: &str, _field: Option<&str>| ProcessedTerm::One(term.to_string()))
    }

    #[test]
    fn doc_frequency_excludes_tombstoned_short_ids() {
        let field_names = vec!["text".to_string()];
        let field = FieldId(0);

        let mut store: IndexStore<u32> = IndexStore::new(1);
        let a = store.allocate_short_id(1).unwrap();
        let b = store.allocate_short_id(2).unwrap();
        let c = store.allocate_short_id(3).unwrap();
        for id in [a, b, c] {
            store.add_posting(id, field, "whale");
            store.record_field_length(id, field, 1);
        }

        let tokenize = tokenize();
        let process_term = process_term();
        let options = SearchOptions::default();

        let before = {
            let engine = QueryEngine::new(&store, &field_names, &tokenize, &process_term, 6);
            engine.score_term("whale", 0, &["whale".to_string()], &options)[&a].score
        };

        // Tombstone `c` without vacuuming: its posting is still physically
        // present in the dictionary, but must no longer count toward `df`.
        store.tombstone(c);

        let after = {
            let engine = QueryEngine::new(&store, &field_names, &tokenize, &process_term, 6);
            engine.score_term("whale", 0, &["whale".to_string()], &options)[&a].score
        };

        assert!(
            after > before,
            "discarding a doc that shared this term should raise idf for the remaining live docs"
        );
    }
}
