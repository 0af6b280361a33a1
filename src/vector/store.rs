//! Thin persistence wrapper around [`Hnsw`]: owns the in-memory index,
//! tracks id-to-label bookkeeping, and round-trips it through the
//! binary format for save/load.

use std::collections::HashMap;

use super::hnsw::{Hnsw, HnswError, Metric};
use crate::config::HnswConfig;
use crate::error::{CoreError, CoreResult};

pub struct VectorStore {
    index: Hnsw,
    labels: HashMap<u32, String>,
    next_id: u32,
}

impl VectorStore {
    pub fn new(config: &HnswConfig) -> Self {
        Self {
            index: Hnsw::new(config.m, config.ef_construction, Metric::Cosine),
            labels: HashMap::new(),
            next_id: 0,
        }
    }

    fn uid_for(&self, label: &str) -> Option<u32> {
        self.labels
            .iter()
            .find(|(_, existing)| existing.as_str() == label)
            .map(|(&id, _)| id)
    }

    /// Assigns a fresh `uint32` for a label seen for the first time, or
    /// reuses (replaces) the existing one if `label` was already
    /// indexed — the HNSW structure itself has no in-place update, so
    /// reuse deletes the old point before adding the new vector under
    /// the same id.
    pub fn insert(&mut self, label: &str, vector: Vec<f32>) -> CoreResult<u32> {
        if let Some(existing_id) = self.uid_for(label) {
            self.index.delete_point(existing_id);
            self.labels.remove(&existing_id);
        }
        let id = self.next_id;
        self.index
            .add_point(id, vector)
            .map_err(|e| CoreError::Validation(hnsw_error_message(e)))?;
        self.labels.insert(id, label.to_string());
        self.next_id += 1;
        Ok(id)
    }

    pub fn search(&self, query: &[f32], k: usize) -> Vec<(String, f32)> {
        self.index
            .search_knn(query, k)
            .into_iter()
            .filter_map(|(id, score)| self.labels.get(&id).map(|l| (l.clone(), score)))
            .collect()
    }

    pub fn remove(&mut self, id: u32) -> bool {
        self.labels.remove(&id);
        self.index.delete_point(id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn save(&self) -> Vec<u8> {
        self.index.serialize()
    }

    pub fn load(bytes: &[u8], labels: HashMap<u32, String>) -> CoreResult<Self> {
        let index = Hnsw::deserialize(bytes).map_err(|e| CoreError::Io(hnsw_error_message(e)))?;
        let next_id = labels.keys().copied().max().map(|m| m + 1).unwrap_or(0);
        Ok(Self { index, labels, next_id })
    }

    pub fn labels(&self) -> &HashMap<u32, String> {
        &self.labels
    }
}

fn hnsw_error_message(e: HnswError) -> String {
    e.to_string()
}
