//! Hierarchical Navigable Small World index: multi-layer greedy
//! descent to a good entry point in the upper layers, then a beam
//! search at layer 0, with neighbor lists capped at `m`/`m_max0` and a
//! custom little-endian binary format for persistence.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cosine,
    Euclidean,
}

#[derive(Debug)]
pub enum HnswError {
    DuplicateId(u32),
    DimensionMismatch { expected: usize, got: usize },
    EmptyVector,
    SerializationError(String),
}

impl fmt::Display for HnswError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HnswError::DuplicateId(id) => write!(f, "duplicate point id {id}"),
            HnswError::DimensionMismatch { expected, got } => {
                write!(f, "dimension mismatch: expected {expected}, got {got}")
            }
            HnswError::EmptyVector => write!(f, "vector is empty"),
            HnswError::SerializationError(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for HnswError {}

fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn cosine_similarity(a: &[f32], b: &[f32], mag_a: f32, mag_b: f32) -> f32 {
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (mag_a * mag_b)
}

struct HnswNode {
    id: u32,
    level: u8,
    vector: Vec<f32>,
    neighbors: Vec<Vec<i32>>,
    deleted: bool,
    magnitude: Cell<Option<f32>>,
}

impl HnswNode {
    fn new(id: u32, level: u8, vector: Vec<f32>, max_layers: usize) -> Self {
        Self {
            id,
            level,
            vector,
            neighbors: vec![Vec::new(); max_layers],
            deleted: false,
            magnitude: Cell::new(None),
        }
    }

    fn get_magnitude(&self) -> f32 {
        if let Some(m) = self.magnitude.get() {
            return m;
        }
        let m = magnitude(&self.vector);
        self.magnitude.set(Some(m));
        m
    }

    fn add_neighbor(&mut self, layer: usize, neighbor_id: i32) {
        if layer < self.neighbors.len() {
            self.neighbors[layer].push(neighbor_id);
        }
    }
}

struct ScoredItem {
    score: f32,
    item: u32,
}

impl PartialEq for ScoredItem {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}
impl Eq for ScoredItem {}
impl PartialOrd for ScoredItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScoredItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.partial_cmp(&other.score).unwrap_or(Ordering::Equal)
    }
}

const MAGIC: u32 = 0x48534e57; // "HSNW"

pub struct Hnsw {
    m: usize,
    m_max0: usize,
    ef_construction: usize,
    level_mult: f64,
    metric: Metric,
    nodes: HashMap<u32, HnswNode>,
    entry_point_id: Option<u32>,
    level_max: u8,
    dimension: Option<usize>,
    rng_state: RefCell<u64>,
}

impl Hnsw {
    pub fn new(m: usize, ef_construction: usize, metric: Metric) -> Self {
        Self {
            m,
            m_max0: m * 2,
            ef_construction,
            level_mult: 1.0 / (m as f64).ln(),
            metric,
            nodes: HashMap::new(),
            entry_point_id: None,
            level_max: 0,
            dimension: None,
            rng_state: RefCell::new(42),
        }
    }

    fn next_random(&self) -> f64 {
        let mut state = self.rng_state.borrow_mut();
        *state ^= *state << 13;
        *state ^= *state >> 7;
        *state ^= *state << 17;
        (*state as f64) / (u64::MAX as f64)
    }

    fn random_level(&self) -> u8 {
        let r = self.next_random().max(1e-12);
        (-r.ln() * self.level_mult).floor() as u8
    }

    fn distance(&self, a: &HnswNode, b: &[f32]) -> f32 {
        match self.metric {
            Metric::Euclidean => euclidean_distance_squared(&a.vector, b),
            Metric::Cosine => {
                let mag_b = magnitude(b);
                1.0 - cosine_similarity(&a.vector, b, a.get_magnitude(), mag_b)
            }
        }
    }

    pub fn add_point(&mut self, id: u32, vector: Vec<f32>) -> Result<(), HnswError> {
        if vector.is_empty() {
            return Err(HnswError::EmptyVector);
        }
        if let Some(dim) = self.dimension {
            if dim != vector.len() {
                return Err(HnswError::DimensionMismatch { expected: dim, got: vector.len() });
            }
        } else {
            self.dimension = Some(vector.len());
        }
        if self.nodes.contains_key(&id) {
            return Err(HnswError::DuplicateId(id));
        }

        let level = self.random_level();
        let max_layers = level as usize + 1;
        let node = HnswNode::new(id, level, vector.clone(), max_layers);

        if self.nodes.is_empty() {
            self.nodes.insert(id, node);
            self.entry_point_id = Some(id);
            self.level_max = level;
            return Ok(());
        }

        let mut entry = self.entry_point_id.unwrap();
        let mut cur_level = self.level_max;

        while cur_level > level {
            entry = self.greedy_descend(entry, &vector, cur_level);
            if cur_level == 0 {
                break;
            }
            cur_level -= 1;
        }

        self.nodes.insert(id, node);

        for l in (0..=level.min(self.level_max)).rev() {
            let candidates = self.search_layer(entry, &vector, self.ef_construction, l);
            let m_max = if l == 0 { self.m_max0 } else { self.m };
            let selected: Vec<u32> = candidates.into_iter().take(m_max).collect();

            for &neighbor_id in &selected {
                if let Some(n) = self.nodes.get_mut(&id) {
                    n.add_neighbor(l as usize, neighbor_id as i32);
                }
                if let Some(n) = self.nodes.get_mut(&neighbor_id) {
                    n.add_neighbor(l as usize, id as i32);
                    if n.neighbors[l as usize].len() > m_max {
                        n.neighbors[l as usize].truncate(m_max);
                    }
                }
            }
            if let Some(&first) = selected.first() {
                entry = first;
            }
        }

        if level > self.level_max {
            self.level_max = level;
            self.entry_point_id = Some(id);
        }

        Ok(())
    }

    fn greedy_descend(&self, mut current: u32, query: &[f32], level: u8) -> u32 {
        loop {
            let Some(node) = self.nodes.get(&current) else { return current };
            let mut best_dist = self.distance(node, query);
            let mut improved = false;
            if (level as usize) < node.neighbors.len() {
                for &n_id in &node.neighbors[level as usize] {
                    if n_id < 0 {
                        continue;
                    }
                    let n_id = n_id as u32;
                    if let Some(n) = self.nodes.get(&n_id) {
                        if n.deleted {
                            continue;
                        }
                        let d = self.distance(n, query);
                        if d < best_dist {
                            best_dist = d;
                            current = n_id;
                            improved = true;
                        }
                    }
                }
            }
            if !improved {
                return current;
            }
        }
    }

    fn search_layer(&self, entry: u32, query: &[f32], ef: usize, level: u8) -> Vec<u32> {
        let mut visited = std::collections::HashSet::new();
        visited.insert(entry);

        let mut candidates = BinaryHeap::new();
        let mut results = BinaryHeap::new();

        if let Some(entry_node) = self.nodes.get(&entry) {
            let d = self.distance(entry_node, query);
            candidates.push(ScoredItem { score: -d, item: entry });
            results.push(ScoredItem { score: d, item: entry });
        }

        while let Some(ScoredItem { score: neg_dist, item: current }) = candidates.pop() {
            let dist = -neg_dist;
            if let Some(worst) = results.peek() {
                if results.len() >= ef && dist > worst.score {
                    break;
                }
            }
            let Some(node) = self.nodes.get(&current) else { continue };
            if (level as usize) >= node.neighbors.len() {
                continue;
            }
            for &n_id in &node.neighbors[level as usize] {
                if n_id < 0 {
                    continue;
                }
                let n_id = n_id as u32;
                if !visited.insert(n_id) {
                    continue;
                }
                let Some(n) = self.nodes.get(&n_id) else { continue };
                if n.deleted {
                    continue;
                }
                let d = self.distance(n, query);
                if results.len() < ef {
                    candidates.push(ScoredItem { score: -d, item: n_id });
                    results.push(ScoredItem { score: d, item: n_id });
                } else if let Some(worst) = results.peek() {
                    if d < worst.score {
                        candidates.push(ScoredItem { score: -d, item: n_id });
                        results.push(ScoredItem { score: d, item: n_id });
                        results.pop();
                    }
                }
            }
        }

        let mut out: Vec<(f32, u32)> = results.into_iter().map(|s| (s.score, s.item)).collect();
        out.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        out.into_iter().map(|(_, id)| id).collect()
    }

    pub fn search_knn(&self, query: &[f32], k: usize) -> Vec<(u32, f32)> {
        let Some(mut entry) = self.entry_point_id else { return Vec::new() };

        let mut cur_level = self.level_max;
        while cur_level > 0 {
            entry = self.greedy_descend(entry, query, cur_level);
            cur_level -= 1;
        }

        let ef = (2 * k).max(100);
        let candidates = self.search_layer(entry, query, ef, 0);

        candidates
            .into_iter()
            .filter(|id| !self.nodes.get(id).map(|n| n.deleted).unwrap_or(true))
            .take(k)
            .map(|id| {
                let node = &self.nodes[&id];
                let d = self.distance(node, query);
                let score = match self.metric {
                    Metric::Cosine => 1.0 - d,
                    Metric::Euclidean => d,
                };
                (id, score)
            })
            .collect()
    }

    pub fn delete_point(&mut self, id: u32) -> bool {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.deleted = true;
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.values().filter(|n| !n.deleted).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_vector(&self, id: u32) -> Option<&[f32]> {
        self.nodes.get(&id).map(|n| n.vector.as_slice())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let dim = self.dimension.unwrap_or(0) as u16;
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&dim.to_le_bytes());
        out.extend_from_slice(&(self.m as u16).to_le_bytes());
        out.extend_from_slice(&(self.nodes.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.level_max as u16).to_le_bytes());
        out.extend_from_slice(&self.entry_point_id.unwrap_or(0).to_le_bytes());
        out.push(match self.metric {
            Metric::Cosine => 0,
            Metric::Euclidean => 1,
        });

        let mut ids: Vec<&u32> = self.nodes.keys().collect();
        ids.sort();

        for id in ids {
            let node = &self.nodes[id];
            out.extend_from_slice(&node.id.to_le_bytes());
            out.push(node.level);
            out.push(if node.deleted { 1 } else { 0 });
            for v in &node.vector {
                out.extend_from_slice(&v.to_le_bytes());
            }
            for layer in &node.neighbors {
                out.extend_from_slice(&(layer.len() as u16).to_le_bytes());
                for &n in layer {
                    out.extend_from_slice(&n.to_le_bytes());
                }
            }
        }

        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, HnswError> {
        if bytes.len() < 19 {
            return Err(HnswError::SerializationError("buffer too short".into()));
        }
        let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if magic != MAGIC {
            return Err(HnswError::SerializationError("bad magic number".into()));
        }
        let dim = u16::from_le_bytes(bytes[4..6].try_into().unwrap()) as usize;
        let m = u16::from_le_bytes(bytes[6..8].try_into().unwrap()) as usize;
        let node_count = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        let level_max = u16::from_le_bytes(bytes[12..14].try_into().unwrap()) as u8;
        let entry_point = u32::from_le_bytes(bytes[14..18].try_into().unwrap());
        let metric = match bytes[18] {
            1 => Metric::Euclidean,
            _ => Metric::Cosine,
        };

        // The distance function is re-bound fresh here rather than
        // carried over from whatever process wrote the bytes.
        let mut hnsw = Hnsw::new(m.max(1), 200, metric);
        hnsw.dimension = if dim > 0 { Some(dim) } else { None };
        hnsw.level_max = level_max;
        hnsw.entry_point_id = Some(entry_point);

        let mut cursor = 19usize;
        for _ in 0..node_count {
            if cursor + 4 + 1 + 1 > bytes.len() {
                return Err(HnswError::SerializationError("truncated node header".into()));
            }
            let id = u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap());
            cursor += 4;
            let level = bytes[cursor];
            cursor += 1;
            let deleted = bytes[cursor] == 1;
            cursor += 1;

            let mut vector = Vec::with_capacity(dim);
            for _ in 0..dim {
                if cursor + 4 > bytes.len() {
                    return Err(HnswError::SerializationError("truncated vector".into()));
                }
                vector.push(f32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap()));
                cursor += 4;
            }

            let max_layers = level as usize + 1;
            let mut node = HnswNode::new(id, level, vector, max_layers);
            node.deleted = deleted;

            for layer in node.neighbors.iter_mut() {
                if cursor + 2 > bytes.len() {
                    return Err(HnswError::SerializationError("truncated neighbor count".into()));
                }
                let count = u16::from_le_bytes(bytes[cursor..cursor + 2].try_into().unwrap()) as usize;
                cursor += 2;
                for _ in 0..count {
                    if cursor + 4 > bytes.len() {
                        return Err(HnswError::SerializationError("truncated neighbor id".into()));
                    }
                    layer.push(i32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap()));
                    cursor += 4;
                }
            }

            hnsw.nodes.insert(id, node);
        }

        Ok(hnsw)
    }
}
