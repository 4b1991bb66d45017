use std::cmp::Ordering;
use std::hash::Hash;

use crate::core::config::SearchOptions;
use crate::core::types::{Hit, ShortId};
use crate::index::store::IndexStore;
use crate::query::combinator::ResultMap;

/// Turns a short-id-keyed result map into the sorted, boosted, filtered
/// `Hit<ID>` list the public API returns. Not used for wildcard queries,
/// which have their own (unscaled) projection — see `wildcard_hits`.
pub fn project<ID: Eq + Hash + Clone>(
    results: ResultMap,
    store: &IndexStore<ID>,
    options: &SearchOptions<ID>,
) -> Vec<Hit<ID>> {
    let mut hits: Vec<Hit<ID>> = Vec::with_capacity(results.len());

    for (short_id, result) in results {
        let Some(external_id) = store.external_id_of(short_id) else {
            continue;
        };
        let stored_fields = store.stored_fields_of(short_id).cloned().unwrap_or_default();

        // Result-quality scaling: reward matching more distinct query terms.
        let mut score = result.score * result.terms_matched.len().max(1) as f32;

        if let Some(boost_document) = &options.boost_document {
            // `match_info` iterates in arbitrary hash order; pick the
            // lexicographically smallest matched term so the callback sees a
            // deterministic label across runs with identical input.
            let term_label = result.match_info.keys().min().map(String::as_str).unwrap_or("");
            let factor = boost_document(external_id, term_label, &stored_fields);
            if factor == 0.0 {
                continue;
            }
            score *= factor;
        }

        let match_info = result
            .match_info
            .into_iter()
            .map(|(term, fields)| {
                let mut sorted: Vec<String> = fields.into_iter().collect();
                sorted.sort();
                (term, sorted)
            })
            .collect();

        let hit = Hit {
            id: external_id.clone(),
            score,
            stored_fields,
            match_info,
        };

        if let Some(filter) = &options.filter {
            if !filter(&hit) {
                continue;
            }
        }

        hits.push(hit);
    }

    sort_hits(&mut hits, store);
    hits
}

/// Wildcard semantics bypass term combination entirely: one result per
/// live short-id, score = `boost_document(...)` (default `1.0`), empty
/// match info.
pub fn wildcard_hits<ID: Eq + Hash + Clone>(store: &IndexStore<ID>, options: &SearchOptions<ID>) -> Vec<Hit<ID>> {
    let mut hits = Vec::new();
    for (short_id, external_id) in store.live_ids() {
        let stored_fields = store.stored_fields_of(short_id).cloned().unwrap_or_default();
        let mut score = 1.0;
        if let Some(boost_document) = &options.boost_document {
            let factor = boost_document(external_id, "", &stored_fields);
            if factor == 0.0 {
                continue;
            }
            score = factor;
        }

        let hit = Hit {
            id: external_id.clone(),
            score,
            stored_fields,
            match_info: Default::default(),
        };

        if let Some(filter) = &options.filter {
            if !filter(&hit) {
                continue;
            }
        }

        hits.push(hit);
    }
    sort_hits(&mut hits, store);
    hits
}

fn sort_hits<ID: Eq + Hash + Clone>(hits: &mut [Hit<ID>], store: &IndexStore<ID>) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                let short_a = store.short_id_of(&a.id).unwrap_or(ShortId(u32::MAX));
                let short_b = store.short_id_of(&b.id).unwrap_or(ShortId(u32::MAX));
                short_a.cmp(&short_b)
            })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FieldId;
    use crate::query::combinator::TermResult;
    use std::collections::{HashMap, HashSet};

    fn seeded_store() -> IndexStore<u32> {
        let mut store: IndexStore<u32> = IndexStore::new(1);
        let a = store.allocate_short_id(1).unwrap();
        let b = store.allocate_short_id(2).unwrap();
        store.record_field_length(a, FieldId(0), 3);
        store.record_field_length(b, FieldId(0), 3);
        store
    }

    #[test]
    fn ties_break_on_ascending_short_id() {
        let store = seeded_store();
        let mut results: ResultMap = HashMap::new();
        for id in [1u32, 2u32] {
            results.insert(
                ShortId(id - 1),
                TermResult {
                    score: 1.0,
                    match_info: HashMap::new(),
                    terms_matched: HashSet::from([0]),
                },
            );
        }
        let hits = project(results, &store, &SearchOptions::default());
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[1].id, 2);
    }

    #[test]
    fn quality_scaling_rewards_matching_more_terms() {
        let store = seeded_store();
        let mut results: ResultMap = HashMap::new();
        results.insert(
            ShortId(0),
            TermResult {
                score: 1.0,
                match_info: HashMap::new(),
                terms_matched: HashSet::from([0, 1]),
            },
        );
        results.insert(
            ShortId(1),
            TermResult {
                score: 1.0,
                match_info: HashMap::new(),
                terms_matched: HashSet::from([0]),
            },
        );
        let hits = project(results, &store, &SearchOptions::default());
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[0].score, 2.0);
        assert_eq!(hits[1].score, 1.0);
    }

    #[test]
    fn wildcard_matches_every_live_document_with_score_one() {
        let store = seeded_store();
        let hits = wildcard_hits(&store, &SearchOptions::default());
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.score == 1.0));
        assert!(hits.iter().all(|h| h.match_info.is_empty()));
    }
}
