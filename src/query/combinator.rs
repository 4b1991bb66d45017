use std::collections::{HashMap, HashSet};

use crate::core::config::CombineWith;
use crate::core::types::ShortId;

/// Accumulated state for one document across the query terms scored so
/// far: the summed contribution, which dictionary terms matched in which
/// fields, and which query-term positions contributed to it (used for the
/// recall-rewarding quality scale applied once the whole query is
/// combined).
#[derive(Debug, Clone, Default)]
pub struct TermResult {
    pub score: f32,
    pub match_info: HashMap<String, HashSet<String>>,
    pub terms_matched: HashSet<usize>,
}

impl TermResult {
    pub fn merge(&mut self, other: &TermResult) {
        self.score += other.score;
        for (term, fields) in &other.match_info {
            self.match_info.entry(term.clone()).or_default().extend(fields.iter().cloned());
        }
        self.terms_matched.extend(other.terms_matched.iter().copied());
    }
}

pub type ResultMap = HashMap<ShortId, TermResult>;

/// Fuses the per-query-term (or per-child-query) result maps produced
/// while walking a `Query` tree into one result map, per §4.4's term
/// combination rules.
pub fn combine(op: CombineWith, maps: Vec<ResultMap>) -> ResultMap {
    match op {
        CombineWith::Or => combine_or(maps),
        CombineWith::And => combine_and(maps),
        CombineWith::AndNot => combine_and_not(maps),
    }
}

fn combine_or(maps: Vec<ResultMap>) -> ResultMap {
    let mut acc: ResultMap = HashMap::new();
    for map in maps {
        for (id, result) in map {
            acc.entry(id).and_modify(|existing| existing.merge(&result)).or_insert(result);
        }
    }
    acc
}

fn combine_and(maps: Vec<ResultMap>) -> ResultMap {
    let mut iter = maps.into_iter();
    let Some(mut acc) = iter.next() else {
        return HashMap::new();
    };
    for map in iter {
        let mut next: ResultMap = HashMap::new();
        for (id, mut result) in acc {
            if let Some(other) = map.get(&id) {
                result.merge(other);
                next.insert(id, result);
            }
        }
        acc = next;
    }
    acc
}

fn combine_and_not(maps: Vec<ResultMap>) -> ResultMap {
    let mut iter = maps.into_iter();
    let Some(mut acc) = iter.next() else {
        return HashMap::new();
    };
    for excluded in iter {
        acc.retain(|id, _| !excluded.contains_key(id));
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(id: u32, score: f32) -> ResultMap {
        let mut map = HashMap::new();
        map.insert(
            ShortId(id),
            TermResult {
                score,
                match_info: HashMap::new(),
                terms_matched: HashSet::from([0]),
            },
        );
        map
    }

    #[test]
    fn or_unions_and_adds_scores() {
        let mut a = single(1, 1.0);
        a.extend(single(2, 2.0));
        let b = single(1, 0.5);
        let combined = combine(CombineWith::Or, vec![a, b]);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[&ShortId(1)].score, 1.5);
        assert_eq!(combined[&ShortId(2)].score, 2.0);
    }

    #[test]
    fn and_keeps_only_the_intersection() {
        let mut a = single(1, 1.0);
        a.extend(single(2, 2.0));
        let b = single(1, 0.5);
        let combined = combine(CombineWith::And, vec![a, b]);
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[&ShortId(1)].score, 1.5);
    }

    #[test]
    fn and_not_drops_anything_in_the_later_operands() {
        let mut a = single(1, 1.0);
        a.extend(single(2, 2.0));
        let b = single(2, 9.0);
        let combined = combine(CombineWith::AndNot, vec![a, b]);
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[&ShortId(1)].score, 1.0);
    }

    #[test]
    fn empty_operand_list_produces_no_results() {
        assert!(combine(CombineWith::Or, vec![]).is_empty());
        assert!(combine(CombineWith::And, vec![]).is_empty());
    }
}
