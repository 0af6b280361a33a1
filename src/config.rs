//! Typed, serde-deserializable tunables for every configurable knob
//! named across the component design. Each config bundles its own
//! `Default`, mirroring the teacher's `ResoRankConfig::default()` /
//! `::production()` preset pattern.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcstConfig {
    pub beta: f64,
    pub epsilon: f64,
    pub max_depth: u32,
}

impl Default for PcstConfig {
    fn default() -> Self {
        Self {
            beta: 2.0,
            epsilon: 1e-10,
            max_depth: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Mentions required before a candidate enters "watching".
    pub watch_min_frequency: u32,
    /// Mentions required, alongside a high capitalization ratio, to reach "promoted".
    pub promote_min_frequency: u32,
    /// Fraction of mentions that must be capitalized for promotion.
    pub promote_min_capitalization_ratio: f32,
    /// Token window used to accumulate co-occurrence counts between candidates.
    pub cooccurrence_window: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            watch_min_frequency: 2,
            promote_min_frequency: 5,
            promote_min_capitalization_ratio: 0.7,
            cooccurrence_window: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResoRankConfig {
    /// Weight applied to an adjacent-query-term hit in the body field.
    pub proximity_alpha: f32,
    /// Multiplier applied to title-field term frequency over body-field.
    pub title_field_weight: f32,
    /// Blend factor between the lexical score and the cosine vector score.
    pub vector_weight: f32,
    /// Upper bound on how many posting-list/HNSW candidates get scored per search.
    pub max_candidates: usize,
    /// How many HNSW neighbors to pull into the candidate pool for a vector query.
    pub vector_candidate_k: usize,
}

impl Default for ResoRankConfig {
    fn default() -> Self {
        Self {
            proximity_alpha: 0.5,
            title_field_weight: 2.0,
            vector_weight: 0.5,
            max_candidates: 1000,
            vector_candidate_k: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnswConfig {
    pub m: usize,
    pub ef_construction: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    pub pcst: PcstConfig,
    pub discovery: DiscoveryConfig,
    pub resorank: ResoRankConfig,
    pub hnsw: HnswConfig,
}
