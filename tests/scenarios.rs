//! End-to-end scenarios against the public `Engine` surface.

use kittcore_engine::engine::{EntityInput, IndexDocumentInput};
use kittcore_engine::pcst::{PcstInstance, PcstSolver};
use kittcore_engine::{CoreError, Engine, EngineConfig};

fn entity(id: &str, label: &str, kind: &str, gender: &str) -> EntityInput {
    EntityInput {
        id: id.to_string(),
        label: label.to_string(),
        kind: kind.to_string(),
        aliases: vec![],
        gender: Some(gender.to_string()),
    }
}

#[test]
fn s1_entity_plus_triple() {
    let mut engine = Engine::default();
    engine.initialize(vec![]).unwrap();

    let text = "[CHARACTER:Luffy] -[DEFEATED]-> [CHARACTER:Kaido]";
    let scan = engine.scan(text).unwrap();

    let triples: Vec<_> = scan
        .syntax
        .iter()
        .filter(|m| matches!(m.kind, kittcore_engine::scanner::SyntaxMatchKind::Triple))
        .collect();
    assert_eq!(triples.len(), 1);
    assert_eq!(triples[0].captures.get("subject").map(String::as_str), Some("Luffy"));
    assert_eq!(triples[0].captures.get("predicate").map(String::as_str), Some("DEFEATED"));
    assert_eq!(triples[0].captures.get("object").map(String::as_str), Some("Kaido"));

    let project = engine.project(text).unwrap();
    assert!(project.graph.get_node("entity:Luffy").is_some());
    assert!(project.graph.get_node("entity:Kaido").is_some());
    assert_eq!(project.graph.edge_count(), 1);
    assert_eq!(project.quads[0].predicate, "DEFEATED");
}

#[test]
fn s2_wikilink_with_label() {
    let mut engine = Engine::default();
    engine.initialize(vec![]).unwrap();

    let text = "See [[Target|Label]].";
    let scan = engine.scan(text).unwrap();

    let wikilinks: Vec<_> = scan
        .syntax
        .iter()
        .filter(|m| matches!(m.kind, kittcore_engine::scanner::SyntaxMatchKind::Wikilink))
        .collect();
    assert_eq!(wikilinks.len(), 1);
    assert_eq!(wikilinks[0].captures.get("target").map(String::as_str), Some("Target"));
    assert_eq!(wikilinks[0].captures.get("label").map(String::as_str), Some("Label"));

    let see_token = scan.tokens.iter().find(|t| t.text == "See").unwrap();
    assert_eq!(see_token.pos, kittcore_engine::scanner::POS::Verb);
}

#[test]
fn s3_pronoun_resolution_via_narrative_context() {
    let mut engine = Engine::default();
    engine.initialize(vec![entity("e1", "Alice", "CHARACTER", "female")]).unwrap();

    engine.scan("Alice left. She returned.").unwrap();
    assert_eq!(engine.resolve("she"), Some("e1".to_string()));
}

#[test]
fn s4_tag_guard_rejects_html_entity() {
    let mut engine = Engine::default();
    engine.initialize(vec![]).unwrap();

    let scan = engine.scan("foo&#tag bar #real").unwrap();
    let tags: Vec<_> = scan
        .syntax
        .iter()
        .filter(|m| matches!(m.kind, kittcore_engine::scanner::SyntaxMatchKind::Tag))
        .collect();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].captures.get("tag").map(String::as_str), Some("real"));
}

#[test]
fn s5_pcst_on_triangle_prefers_cheap_path() {
    let mut instance = PcstInstance::new(3);
    instance.set_prize(0, 10.0);
    instance.set_prize(1, 10.0);
    instance.set_prize(2, 10.0);
    instance.add_edge(0, 1, 1.0);
    instance.add_edge(1, 2, 1.0);
    instance.add_edge(0, 2, 5.0);

    let result = PcstSolver::new(EngineConfig::default().pcst).solve(&instance);
    assert_eq!(result.nodes, vec![0, 1, 2]);
    let total_cost: f64 = result.edges.iter().map(|&(_, _, c)| c).sum();
    assert_eq!(total_cost, 2.0);
}

#[test]
fn s6_hybrid_search_lexical_then_vector() {
    let mut engine = Engine::default();
    engine.initialize(vec![]).unwrap();

    engine
        .index_document(IndexDocumentInput {
            id: "d1".into(),
            title: "dragon".into(),
            body: "dragon".into(),
            embedding: Some(vec![1.0, 0.0]),
        })
        .unwrap();
    engine
        .index_document(IndexDocumentInput {
            id: "d2".into(),
            title: "king".into(),
            body: "king".into(),
            embedding: Some(vec![0.0, 1.0]),
        })
        .unwrap();

    let lexical_only = engine.search("dragon", None, 5).unwrap();
    assert_eq!(lexical_only.len(), 1);
    assert_eq!(lexical_only[0].doc_id, "d1");

    engine.init_vectors();
    engine.add_vector("d1", vec![1.0, 0.0]).unwrap();
    engine.add_vector("d2", vec![0.0, 1.0]).unwrap();

    let kings_vector = [0.0f32, 1.0];
    let d2_score = engine.score_document("d2", "dragon", Some(&kings_vector));
    let d1_score = engine.score_document("d1", "dragon", Some(&kings_vector));
    assert!(d2_score > d1_score);
}

#[test]
fn state_error_before_initialize() {
    let mut engine = Engine::default();
    assert!(matches!(engine.scan("anything"), Err(CoreError::State(_))));
}
