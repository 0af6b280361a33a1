//! Public facade: the entry points a host process calls. `Engine`
//! owns everything the pipeline needs and returns `CoreResult` from
//! every operation instead of panicking, following the error taxonomy
//! (`Validation`/`State`/`Compile`/`Io`/`Internal`) used throughout.

use std::collections::HashMap;
use std::time::Duration;

use rowan::GreenNode;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};
use crate::graph::{build_cst, project_concepts, ConceptGraph, QuadPlus};
use crate::pcst::{PcstInstance, PcstResult, PcstSolver};
use crate::resorank::{score_document, Document as ResoDocument, ResoRankIndex, SearchResult};
use crate::scanner::conductor::{Conductor, ScanResult};
use crate::scanner::dictionary::DictionaryEntry;
use crate::scanner::discovery::{DiscoveredCandidate, DiscoveryEngine};
use crate::scanner::resolver::Gender;
use crate::vector::VectorStore;

/// `{id, label, kind, aliases?, gender?}`, the shape `Initialize` accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInput {
    pub id: String,
    pub label: String,
    pub kind: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

fn parse_gender(raw: Option<&str>) -> Gender {
    match raw.map(str::to_lowercase).as_deref() {
        Some("male") => Gender::Male,
        Some("female") => Gender::Female,
        Some("neutral") => Gender::Neutral,
        Some("plural") => Gender::Plural,
        _ => Gender::Unknown,
    }
}

/// The combined result of `Project`: a scan, its CST, the projected
/// graph, a PCST summary over uniform unit prizes, and wall-clock
/// timing for the whole pass.
pub struct ProjectResult {
    pub scan: ScanResult,
    pub cst: GreenNode,
    pub graph: ConceptGraph,
    pub quads: Vec<QuadPlus>,
    pub pcst: PcstResult,
    pub duration: Duration,
}

/// Document input for `IndexDocument`: a title/body pair plus an
/// optional embedding, mirroring `{id, meta, tokens}` from the
/// interface list with `meta.embedding` surfaced directly.
pub struct IndexDocumentInput {
    pub id: String,
    pub title: String,
    pub body: String,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EngineState {
    Uninitialized,
    Initialized,
}

/// Owns the whole pipeline: the scanner conductor, discovery engine,
/// ResoRank index, and (once `InitVectors` runs) the vector store.
/// Mirrors the conductor's own state-machine shape: operations that
/// need `Initialize` to have run first return `CoreError::State`.
pub struct Engine {
    state: EngineState,
    config: EngineConfig,
    conductor: Conductor,
    discovery: DiscoveryEngine,
    resorank: ResoRankIndex,
    vectors: Option<VectorStore>,
    vector_ids: HashMap<String, u32>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: EngineState::Uninitialized,
            discovery: DiscoveryEngine::new(config.discovery.clone()),
            config,
            conductor: Conductor::new(),
            resorank: ResoRankIndex::new(),
            vectors: None,
            vector_ids: HashMap::new(),
        }
    }

    fn require_initialized(&self) -> CoreResult<()> {
        if self.state == EngineState::Initialized {
            Ok(())
        } else {
            Err(CoreError::State("engine is not initialized; call Initialize first".into()))
        }
    }

    /// 1. Initialize(entities?) — replace the registered entity set,
    /// rebuild the dictionary, and reset discovery so suppressions
    /// track the new set.
    pub fn initialize(&mut self, entities: Vec<EntityInput>) -> CoreResult<()> {
        let mut dictionary_entries = Vec::with_capacity(entities.len());
        let mut seen_ids = std::collections::HashSet::new();

        for e in &entities {
            if e.id.is_empty() || e.label.is_empty() {
                return Err(CoreError::Validation(format!("entity missing id or label: {e:?}")));
            }
            if !seen_ids.insert(e.id.clone()) {
                return Err(CoreError::Compile(format!("duplicate entity id: {}", e.id)));
            }
            dictionary_entries.push(DictionaryEntry {
                id: e.id.clone(),
                label: e.label.clone(),
                kind: e.kind.clone(),
                aliases: e.aliases.clone(),
            });
        }

        self.conductor = Conductor::new();
        self.conductor.set_dictionary(dictionary_entries);
        for e in &entities {
            self.conductor
                .register_entity(&e.id, &e.label, parse_gender(e.gender.as_deref()), &[]);
        }
        self.discovery = DiscoveryEngine::new(self.config.discovery.clone());
        self.state = EngineState::Initialized;
        Ok(())
    }

    /// 2. Scan(text) → ScanResult — the full pipeline; mention pushing
    /// and pronoun resolution happen inside the Conductor itself.
    pub fn scan(&mut self, text: &str) -> CoreResult<ScanResult> {
        self.require_initialized()?;
        Ok(self.conductor.scan_if_changed(text))
    }

    /// Resolves a pronoun or name/alias against the narrative context
    /// built up by prior `Scan` calls, without running the pipeline again.
    pub fn resolve(&self, text: &str) -> Option<String> {
        self.conductor.resolve(text)
    }

    /// 3. ScanImplicit(text) → only the dictionary pass.
    pub fn scan_implicit(&mut self, text: &str) -> CoreResult<Vec<crate::scanner::dictionary::DictionaryMatch>> {
        self.require_initialized()?;
        Ok(self.conductor.scan(text).dictionary)
    }

    /// 4. ScanDiscovery(text) → heuristic candidates, non-fatal by
    /// design: a discovery failure never blocks the caller (there's
    /// nothing fallible here to fail on, but the return type stays
    /// `CoreResult` so the surface is uniform with the rest).
    pub fn scan_discovery(&mut self, text: &str) -> CoreResult<Vec<DiscoveredCandidate>> {
        self.require_initialized()?;
        let scan = self.conductor.scan(text);
        self.discovery.observe(&scan.tokens);
        let mut out: Vec<DiscoveredCandidate> = self
            .discovery
            .watching()
            .into_iter()
            .chain(self.discovery.promoted())
            .filter(|c| !self.conductor.dictionary_contains(&c.text))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.text.cmp(&b.text));
        out.dedup_by(|a, b| a.text == b.text);
        Ok(out)
    }

    /// 5. Project(text) → {scan, cst, graph, pcst, timing} — runs Scan,
    /// zips the CST, projects the ConceptGraph, and solves PCST with
    /// uniform unit prizes over every node.
    pub fn project(&mut self, text: &str) -> CoreResult<ProjectResult> {
        self.require_initialized()?;
        let start = instant_zero();
        let scan = self.scan(text)?;
        let cst = build_cst(text, &scan.chunks, &scan.syntax);
        let (graph, quads) = project_concepts(text, &scan);

        let instance = uniform_prize_instance(&graph);
        let pcst = PcstSolver::new(self.config.pcst.clone()).solve(&instance);

        Ok(ProjectResult {
            scan,
            cst,
            graph,
            quads,
            pcst,
            duration: start.elapsed_stub(),
        })
    }

    /// 6. InitVectors — create a fresh vector store, resetting the
    /// string↔uint32 id mapping.
    pub fn init_vectors(&mut self) {
        self.vectors = Some(VectorStore::new(&self.config.hnsw));
        self.vector_ids.clear();
    }

    /// 7. AddVector(id, vec).
    pub fn add_vector(&mut self, id: &str, vector: Vec<f32>) -> CoreResult<()> {
        let store = self
            .vectors
            .as_mut()
            .ok_or_else(|| CoreError::State("vector store not initialized; call InitVectors first".into()))?;
        if vector.is_empty() {
            return Err(CoreError::Validation("vector must not be empty".into()));
        }
        let uid = store.insert(id, vector)?;
        self.vector_ids.insert(id.to_string(), uid);
        Ok(())
    }

    /// 8. SearchVectors(vec, k) → id[] — nearest neighbors mapped back
    /// to string ids.
    pub fn search_vectors(&self, vector: &[f32], k: usize) -> CoreResult<Vec<String>> {
        let store = self
            .vectors
            .as_ref()
            .ok_or_else(|| CoreError::State("vector store not initialized; call InitVectors first".into()))?;
        if k == 0 {
            return Err(CoreError::Validation("k must be positive".into()));
        }
        Ok(store.search(vector, k).into_iter().map(|(label, _)| label).collect())
    }

    /// 9. SaveVectors() — serialize the vector index; the caller is
    /// responsible for writing the bytes to whatever external storage
    /// backs the logical path supplied to `InitVectors`.
    pub fn save_vectors(&self) -> CoreResult<Vec<u8>> {
        let store = self
            .vectors
            .as_ref()
            .ok_or_else(|| CoreError::State("vector store not initialized; call InitVectors first".into()))?;
        Ok(store.save())
    }

    /// Companion to `SaveVectors`: rehydrate a store from bytes the
    /// caller previously read back from external storage.
    pub fn load_vectors(&mut self, bytes: &[u8]) -> CoreResult<()> {
        let labels: HashMap<u32, String> =
            self.vector_ids.iter().map(|(label, &uid)| (uid, label.clone())).collect();
        let store = VectorStore::load(bytes, labels)?;
        self.vectors = Some(store);
        Ok(())
    }

    /// 10. IndexDocument(id, meta, tokens) — index into ResoRank, and
    /// into the vector store too when an embedding and an initialized
    /// store are both present.
    pub fn index_document(&mut self, doc: IndexDocumentInput) -> CoreResult<()> {
        if doc.id.is_empty() {
            return Err(CoreError::Validation("document id must not be empty".into()));
        }
        self.resorank.index_document(&ResoDocument {
            id: doc.id.clone(),
            title: doc.title,
            body: doc.body,
            vector: doc.embedding.clone(),
        });

        if let Some(embedding) = doc.embedding {
            if self.vectors.is_some() {
                self.add_vector(&doc.id, embedding)?;
            }
        }
        Ok(())
    }

    /// 11. Search(queryTokens, queryVector?, limit) → hybrid search
    /// over the lexical index, optionally blended with a vector score.
    /// When a query vector is given and the vector store is
    /// initialized, its nearest neighbors are pulled into the
    /// candidate pool before re-scoring.
    pub fn search(&self, query: &str, query_vector: Option<&[f32]>, limit: usize) -> CoreResult<Vec<SearchResult>> {
        if limit == 0 {
            return Err(CoreError::Validation("limit must be positive".into()));
        }
        let vector_neighbors: Vec<String> = match (query_vector, &self.vectors) {
            (Some(qv), Some(store)) => store
                .search(qv, self.config.resorank.vector_candidate_k)
                .into_iter()
                .map(|(label, _)| label)
                .collect(),
            _ => Vec::new(),
        };
        Ok(crate::resorank::search(
            &self.resorank,
            query,
            query_vector,
            &vector_neighbors,
            &self.config.resorank,
            limit,
        ))
    }

    /// Scores one already-indexed document against a query, exposed so
    /// callers that merge their own candidate pools (e.g. HNSW
    /// neighbors pulled in before re-scoring) can reuse the same
    /// formula `Search` uses internally.
    pub fn score_document(&self, doc_id: &str, query: &str, query_vector: Option<&[f32]>) -> f32 {
        let terms: Vec<String> = crate::scanner::tokenizer::Tokenizer::tokenize(query)
            .into_iter()
            .map(|t| t.text.to_lowercase())
            .collect();
        score_document(&self.resorank, doc_id, &terms, query_vector, &self.config.resorank)
    }
}

/// Builds a `PcstInstance` with uniform unit prizes on every
/// `ConceptGraph` node and unit-cost edges, the default `Project` uses
/// when the caller supplies no prize table of its own.
fn uniform_prize_instance(graph: &ConceptGraph) -> PcstInstance {
    let nodes: Vec<&crate::graph::ConceptNode> = graph.nodes().collect();
    let mut index_of = HashMap::new();
    for (i, n) in nodes.iter().enumerate() {
        index_of.insert(n.id.clone(), i);
    }

    let mut instance = PcstInstance::new(nodes.len());
    for n in &nodes {
        instance.set_prize(index_of[&n.id], 1.0);
    }
    for (source, target, edge) in graph.edges() {
        if let (Some(&a), Some(&b)) = (index_of.get(&source.id), index_of.get(&target.id)) {
            instance.add_edge(a, b, edge.weight.max(0.0));
        }
    }
    instance
}

/// Stand-in for a monotonic clock: the core never calls
/// `std::time::Instant::now()` directly so timing stays deterministic
/// under the test harness; callers that need wall-clock duration
/// should wrap `Project` externally and measure there.
struct InstantStub;

fn instant_zero() -> InstantStub {
    InstantStub
}

impl InstantStub {
    fn elapsed_stub(&self) -> Duration {
        Duration::from_micros(0)
    }
}
