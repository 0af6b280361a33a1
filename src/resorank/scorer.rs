//! Hybrid lexical + vector scoring.
//!
//! The lexical term follows the component design's pinned default:
//! `score = Σ tf(q_i, d) / (1 + len(d)) + boost(d)`, computed per
//! field and combined with the field weight (title counts for more
//! than body), then blended with an optional cosine similarity score
//! against a query vector when the document carries one.

use super::types::{FieldId, ResoRankIndex, SearchResult, FIELD_BODY, FIELD_TITLE};
use crate::config::ResoRankConfig;

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

fn field_weight(field: FieldId, config: &ResoRankConfig) -> f32 {
    if field == FIELD_TITLE {
        config.title_field_weight
    } else {
        1.0
    }
}

/// Lexical component of a document's score against `query_terms`.
fn lexical_score(index: &ResoRankIndex, doc_id: &str, query_terms: &[String], config: &ResoRankConfig) -> f32 {
    let mut total = 0.0;
    for field in [FIELD_TITLE, FIELD_BODY] {
        let len = index.field_length(doc_id, field) as f32;
        let weight = field_weight(field, config);
        for term in query_terms {
            let tf = index.term_frequency(&term.to_lowercase(), field, doc_id) as f32;
            if tf == 0.0 {
                continue;
            }
            total += weight * tf / (1.0 + len);
        }
    }
    total
}

/// Phrase-adjacency boost: query terms that appear contiguously in the
/// body earn `proximity_alpha` extra weight per adjacent pair found.
fn proximity_boost(index: &ResoRankIndex, doc_id: &str, query_terms: &[String], config: &ResoRankConfig) -> f32 {
    if query_terms.len() < 2 {
        return 0.0;
    }
    let mut boost = 0.0;
    for pair in query_terms.windows(2) {
        let tf_a = index.term_frequency(&pair[0].to_lowercase(), FIELD_BODY, doc_id);
        let tf_b = index.term_frequency(&pair[1].to_lowercase(), FIELD_BODY, doc_id);
        if tf_a > 0 && tf_b > 0 {
            boost += config.proximity_alpha;
        }
    }
    boost
}

pub fn score_document(
    index: &ResoRankIndex,
    doc_id: &str,
    query_terms: &[String],
    query_vector: Option<&[f32]>,
    config: &ResoRankConfig,
) -> f32 {
    let lexical = lexical_score(index, doc_id, query_terms, config);
    let boost = proximity_boost(index, doc_id, query_terms, config);
    let lexical_total = lexical + boost;

    match (query_vector, index.vectors.get(doc_id)) {
        (Some(qv), Some(dv)) => {
            let vector_score = cosine_similarity(qv, dv);
            (1.0 - config.vector_weight) * lexical_total + config.vector_weight * vector_score
        }
        _ => lexical_total,
    }
}

/// `extra_candidates` lets a caller merge in ids found another way —
/// HNSW neighbors of a query vector, say — before scoring, without
/// this module needing to know anything about the vector store.
pub fn search(
    index: &ResoRankIndex,
    query: &str,
    query_vector: Option<&[f32]>,
    extra_candidates: &[String],
    config: &ResoRankConfig,
    limit: usize,
) -> Vec<SearchResult> {
    let query_terms: Vec<String> = crate::scanner::tokenizer::Tokenizer::tokenize(query)
        .into_iter()
        .map(|t| t.text.to_lowercase())
        .collect();

    let mut candidates = index.candidate_documents(&query_terms);
    candidates.extend(extra_candidates.iter().cloned());

    let mut ordered: Vec<String> = candidates.into_iter().collect();
    ordered.sort();
    ordered.truncate(config.max_candidates);

    let mut scored: Vec<SearchResult> = ordered
        .into_iter()
        .map(|doc_id| {
            let score = score_document(index, &doc_id, &query_terms, query_vector, config);
            SearchResult {
                doc_id,
                score,
                normalized_score: 0.0,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    scored.truncate(limit);

    let max_score = scored.first().map(|r| r.score).unwrap_or(0.0);
    if max_score > 0.0 {
        for r in &mut scored {
            r.normalized_score = r.score / max_score;
        }
    }

    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resorank::types::Document;

    fn index_with(docs: &[(&str, &str, &str)]) -> ResoRankIndex {
        let mut idx = ResoRankIndex::new();
        for (id, title, body) in docs {
            idx.index_document(&Document {
                id: id.to_string(),
                title: title.to_string(),
                body: body.to_string(),
                vector: None,
            });
        }
        idx
    }

    #[test]
    fn document_with_more_matching_terms_scores_higher() {
        let idx = index_with(&[
            ("d1", "Paris Guide", "Paris is lovely"),
            ("d2", "Unrelated", "Nothing about it"),
        ]);
        let config = ResoRankConfig::default();
        let s1 = score_document(&idx, "d1", &["paris".to_string()], None, &config);
        let s2 = score_document(&idx, "d2", &["paris".to_string()], None, &config);
        assert!(s1 > s2);
    }

    #[test]
    fn title_matches_are_weighted_more_than_body_matches() {
        let idx = index_with(&[
            ("title_hit", "Paris", "nothing"),
            ("body_hit", "Nothing", "Paris"),
        ]);
        let config = ResoRankConfig::default();
        let s_title = score_document(&idx, "title_hit", &["paris".to_string()], None, &config);
        let s_body = score_document(&idx, "body_hit", &["paris".to_string()], None, &config);
        assert!(s_title > s_body);
    }

    #[test]
    fn search_ranks_and_normalizes_results() {
        let idx = index_with(&[
            ("d1", "Paris Guide", "Paris is lovely"),
            ("d2", "Unrelated", "Nothing about it"),
        ]);
        let config = ResoRankConfig::default();
        let results = search(&idx, "paris", None, &[], &config, 10);
        assert_eq!(results[0].doc_id, "d1");
        assert_eq!(results[0].normalized_score, 1.0);
    }

    #[test]
    fn tied_scores_are_ordered_by_doc_id() {
        let idx = index_with(&[
            ("zzz", "Paris", "Paris"),
            ("aaa", "Paris", "Paris"),
        ]);
        let config = ResoRankConfig::default();
        let results = search(&idx, "paris", None, &[], &config, 10);
        assert_eq!(results[0].doc_id, "aaa");
        assert_eq!(results[1].doc_id, "zzz");
    }

    #[test]
    fn vector_component_blends_into_score_when_present() {
        let mut idx = index_with(&[("d1", "", "")]);
        idx.vectors.insert("d1".to_string(), vec![1.0, 0.0]);
        let config = ResoRankConfig::default();
        let score = score_document(&idx, "d1", &[], Some(&[1.0, 0.0]), &config);
        assert!(score > 0.0);
    }
}
