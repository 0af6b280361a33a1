//! Projects scan events into the `ConceptGraph`: every Triple/
//! InlineRelation syntax match becomes a subject→predicate→object
//! edge, and any PrepPhrase chunk immediately trailing the object is
//! attached as a manner/location/time/recipient modifier based on its
//! preposition head — `in`/`on`/`at` attach as location, `with` as
//! manner, `to`/`for` as recipient, everything else is left
//! unattached. This is the same "closest trailing PP, classified by
//! its head" rule the component design's Open Questions section
//! defaults to.

use crate::graph::concept::{ConceptEdge, ConceptGraph, ConceptNode};
use crate::scanner::chunker::{Chunk, ChunkKind};
use crate::scanner::conductor::ScanResult;
use crate::scanner::syntax::SyntaxMatchKind;

#[derive(Debug, Clone)]
pub struct QuadPlus {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub manner: Option<String>,
    pub location: Option<String>,
    pub time: Option<String>,
    pub recipient: Option<String>,
}

const PP_ATTACH_DISTANCE: usize = 3;

pub fn project_concepts(text: &str, scan: &ScanResult) -> (ConceptGraph, Vec<QuadPlus>) {
    let mut graph = ConceptGraph::new();
    let mut quads = Vec::new();

    for m in &scan.syntax {
        if !matches!(m.kind, SyntaxMatchKind::Triple | SyntaxMatchKind::InlineRelation) {
            continue;
        }
        let Some(subject) = m.captures.get("subject") else { continue };
        let Some(predicate) = m.captures.get("predicate") else { continue };
        let Some(object) = m.captures.get("object") else { continue };

        let subject_id = format!("entity:{subject}");
        let object_id = format!("entity:{object}");
        graph.ensure_node(ConceptNode::new(&subject_id, subject, "entity"));
        graph.ensure_node(ConceptNode::new(&object_id, object, "entity"));

        let modifier = nearest_trailing_modifier(&scan.chunks, m.range.end, text);
        let edge = if modifier.manner.is_some()
            || modifier.location.is_some()
            || modifier.time.is_some()
            || modifier.recipient.is_some()
        {
            ConceptEdge::modified_relation(
                predicate,
                modifier.manner.clone(),
                modifier.location.clone(),
                modifier.time.clone(),
                modifier.recipient.clone(),
            )
        } else {
            ConceptEdge::unweighted(predicate)
        }
        .with_span((m.range.start as u32, m.range.end as u32));

        graph.add_edge(&subject_id, &object_id, edge);

        quads.push(QuadPlus {
            subject: subject.clone(),
            predicate: predicate.clone(),
            object: object.clone(),
            manner: modifier.manner,
            location: modifier.location,
            time: modifier.time,
            recipient: modifier.recipient,
        });
    }

    // Every other syntax-match kind still surfaces its own node, even
    // with no relation attached, so OrphanNodes() reflects every
    // mentioned entity, tag, mention, and wikilink target.
    for m in &scan.syntax {
        match m.kind {
            SyntaxMatchKind::Triple | SyntaxMatchKind::InlineRelation => continue,
            SyntaxMatchKind::Entity => {
                if let Some(label) = m.captures.get("label") {
                    let kind = m.captures.get("kind").cloned().unwrap_or_else(|| "entity".to_string());
                    let id = format!("entity:{label}");
                    graph.ensure_node(ConceptNode::new(&id, label, &kind));
                }
            }
            SyntaxMatchKind::Wikilink | SyntaxMatchKind::Backlink => {
                if let Some(target) = m.captures.get("target") {
                    let id = format!("wikilink:{target}");
                    graph.ensure_node(ConceptNode::new(&id, target, "wikilink"));
                }
            }
            SyntaxMatchKind::Tag => {
                if let Some(tag) = m.captures.get("tag") {
                    let id = format!("tag:{tag}");
                    graph.ensure_node(ConceptNode::new(&id, tag, "tag"));
                }
            }
            SyntaxMatchKind::Mention => {
                if let Some(handle) = m.captures.get("handle") {
                    let id = format!("mention:{handle}");
                    graph.ensure_node(ConceptNode::new(&id, handle, "mention"));
                }
            }
        }
    }

    // Dictionary-matched entities not already part of a triple still
    // become nodes, so OrphanNodes() reflects every mentioned entity.
    for d in &scan.dictionary {
        let id = format!("entity:{}", d.entity_label);
        graph.ensure_node(ConceptNode::new(&id, &d.entity_label, &d.entity_kind));
    }

    (graph, quads)
}

#[derive(Default)]
struct Modifier {
    manner: Option<String>,
    location: Option<String>,
    time: Option<String>,
    recipient: Option<String>,
}

fn nearest_trailing_modifier(chunks: &[Chunk], after: usize, text: &str) -> Modifier {
    let mut modifier = Modifier::default();
    for c in chunks {
        if c.kind != ChunkKind::PrepPhrase {
            continue;
        }
        if c.range.start < after || c.range.start - after > PP_ATTACH_DISTANCE {
            continue;
        }
        let head = c.head_text(text).to_lowercase();
        let object_text = c
            .modifiers
            .first()
            .map(|r| r.slice(text).to_string())
            .unwrap_or_else(|| c.text(text).to_string());
        match head.as_str() {
            "in" | "on" | "at" => modifier.location = Some(object_text),
            "with" => modifier.manner = Some(object_text),
            "to" | "for" => modifier.recipient = Some(object_text),
            "during" | "before" | "after" => modifier.time = Some(object_text),
            _ => {}
        }
    }
    modifier
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::conductor::Conductor;

    #[test]
    fn triple_becomes_an_edge_between_two_entity_nodes() {
        let mut conductor = Conductor::new();
        let text = "[Alice]-[knows]->[Bob]";
        let scan = conductor.scan(text);
        let (graph, quads) = project_concepts(text, &scan);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].predicate, "knows");
    }

    #[test]
    fn standalone_entity_wikilink_tag_and_mention_all_become_nodes() {
        let mut conductor = Conductor::new();
        let text = "[CHARACTER:Luffy] sailed to [[East Blue]] #adventure @narrator";
        let scan = conductor.scan(text);
        let (graph, _quads) = project_concepts(text, &scan);
        assert!(graph.get_node("entity:Luffy").is_some());
        assert!(graph.get_node("wikilink:East Blue").is_some());
        assert!(graph.get_node("tag:adventure").is_some());
        assert!(graph.get_node("mention:narrator").is_some());
    }

    #[test]
    fn trailing_location_pp_attaches_as_location_modifier() {
        let mut conductor = Conductor::new();
        let text = "[Alice]-[knows]->[Bob] in Paris";
        let scan = conductor.scan(text);
        let (_graph, quads) = project_concepts(text, &scan);
        assert_eq!(quads[0].location.as_deref(), Some("Paris"));
    }
}
