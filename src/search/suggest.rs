use std::cmp::Ordering;
use std::collections::HashMap;

use crate::core::types::Hit;

/// One ranked auto-suggestion: the concatenated dictionary terms a group of
/// search hits shared, and that group's averaged score.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub suggestion: String,
    pub terms: Vec<String>,
    pub score: f32,
}

/// Groups `hits` (typically the result of a prefix+fuzzy search) by the
/// sorted set of dictionary terms each matched, joins each group's terms
/// into a phrase, and averages the score across the hits that matched it.
/// Ties the output to the structure of a completed search rather than a
/// per-query-term token stream, so it inherits the same candidate
/// expansion and scoring the caller already ran.
pub fn group_into_suggestions<ID>(hits: &[Hit<ID>]) -> Vec<Suggestion> {
    struct Group {
        terms: Vec<String>,
        total_score: f32,
        count: u32,
    }

    let mut groups: HashMap<String, Group> = HashMap::new();

    for hit in hits {
        if hit.match_info.is_empty() {
            continue;
        }
        let mut terms: Vec<String> = hit.match_info.keys().cloned().collect();
        terms.sort();
        let phrase = terms.join(" ");

        let group = groups.entry(phrase).or_insert_with(|| Group {
            terms,
            total_score: 0.0,
            count: 0,
        });
        group.total_score += hit.score;
        group.count += 1;
    }

    let mut suggestions: Vec<Suggestion> = groups
        .into_iter()
        .map(|(phrase, group)| Suggestion {
            suggestion: phrase,
            terms: group.terms,
            score: group.total_score / group.count as f32,
        })
        .collect();

    suggestions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn hit(id: u32, score: f32, terms: &[&str]) -> Hit<u32> {
        let mut match_info = Map::new();
        for t in terms {
            match_info.insert(t.to_string(), vec!["title".to_string()]);
        }
        Hit {
            id,
            score,
            stored_fields: Map::new(),
            match_info,
        }
    }

    #[test]
    fn groups_by_shared_matched_terms_and_averages_score() {
        let hits = vec![
            hit(1, 2.0, &["zen", "archery"]),
            hit(2, 4.0, &["zen", "archery"]),
            hit(3, 1.0, &["motorcycle"]),
        ];
        let suggestions = group_into_suggestions(&hits);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].suggestion, "archery zen");
        assert_eq!(suggestions[0].score, 3.0);
        assert_eq!(suggestions[1].suggestion, "motorcycle");
    }

    #[test]
    fn hits_with_no_match_info_are_excluded() {
        let hits = vec![hit(1, 1.0, &[])];
        assert!(group_into_suggestions(&hits).is_empty());
    }

    #[test]
    fn results_are_sorted_by_descending_score() {
        let hits = vec![hit(1, 1.0, &["a"]), hit(2, 5.0, &["b"])];
        let suggestions = group_into_suggestions(&hits);
        assert_eq!(suggestions[0].terms, vec!["b".to_string()]);
    }
}
