use crate::core::config::Bm25Params;

/// Floor under `idf` so a term appearing in (almost) every document still
/// contributes a small positive weight instead of going negative.
const IDF_EPSILON: f32 = 1e-6;

/// BM25+ inverse document frequency: `ln((N - df + 0.5) / (df + 0.5))`,
/// floored at `IDF_EPSILON`.
pub fn idf(total_docs: f32, doc_frequency: f32) -> f32 {
    let raw = ((total_docs - doc_frequency + 0.5) / (doc_frequency + 0.5)).ln();
    raw.max(IDF_EPSILON)
}

/// BM25+ term-frequency normalization with the `d` floor that keeps long
/// documents from scoring exactly zero.
pub fn tf_norm(tf: f32, field_length: f32, avg_field_length: f32, bm25: &Bm25Params) -> f32 {
    let length_norm = if avg_field_length > 0.0 {
        1.0 - bm25.b + bm25.b * (field_length / avg_field_length)
    } else {
        1.0 - bm25.b
    };
    tf * (bm25.k + 1.0) / (bm25.k + tf * length_norm) + bm25.d
}

/// `1 / (1 + 0.333 * editDistance)`, the decay applied to prefix/fuzzy
/// candidates in proportion to how far they strayed from the query term.
pub fn edit_weight(edit_distance: usize) -> f32 {
    1.0 / (1.0 + 0.333 * edit_distance as f32)
}

/// One (document, field, candidate-term) contribution to a query term's
/// score, per §4.4's BM25+ formula.
#[allow(clippy::too_many_arguments)]
pub fn contribution(
    tf: f32,
    doc_frequency: f32,
    total_docs: f32,
    field_length: f32,
    avg_field_length: f32,
    bm25: &Bm25Params,
    field_boost: f32,
    distance_weight: f32,
    edit_distance: usize,
) -> f32 {
    idf(total_docs, doc_frequency)
        * tf_norm(tf, field_length, avg_field_length, bm25)
        * field_boost
        * distance_weight
        * edit_weight(edit_distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idf_is_floored_when_a_term_is_nearly_ubiquitous() {
        assert!(idf(10.0, 10.0) >= IDF_EPSILON);
    }

    #[test]
    fn rarer_terms_score_a_higher_idf() {
        assert!(idf(100.0, 1.0) > idf(100.0, 50.0));
    }

    #[test]
    fn edit_weight_decays_with_distance() {
        assert_eq!(edit_weight(0), 1.0);
        assert!(edit_weight(1) < edit_weight(0));
        assert!(edit_weight(2) < edit_weight(1));
    }

    #[test]
    fn tf_norm_saturates_with_a_floor_of_d() {
        let bm25 = Bm25Params::default();
        let low = tf_norm(1.0, 10.0, 10.0, &bm25);
        let high = tf_norm(100.0, 10.0, 10.0, &bm25);
        assert!(high > low);
        assert!(high < 100.0);
    }

    #[test]
    fn contribution_is_non_negative_and_finite() {
        let bm25 = Bm25Params::default();
        let score = contribution(3.0, 2.0, 50.0, 12.0, 10.0, &bm25, 1.0, 1.0, 0);
        assert!(score.is_finite());
        assert!(score >= 0.0);
    }
}
