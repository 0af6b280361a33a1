//! The directed semantic graph produced by one `Scan`+`Project` pass.
//! Built over `petgraph::DiGraph` so node/edge identity is an arena
//! index, never a pointer or a deep copy.

use std::collections::HashMap;

use rustworkx_core::petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use rustworkx_core::petgraph::visit::EdgeRef;
use rustworkx_core::petgraph::Direction;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConceptNode {
    pub id: String,
    pub label: String,
    pub kind: String,
}

impl ConceptNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeKind {
    Relation,
    Attribution { verb: String },
    StateTransition { trigger: Option<String> },
    ModifiedRelation {
        manner: Option<String>,
        location: Option<String>,
        time: Option<String>,
        recipient: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptEdge {
    pub relation: String,
    pub weight: f64,
    pub edge_kind: EdgeKind,
    pub source_span: Option<(u32, u32)>,
}

impl ConceptEdge {
    /// `relation` is always stored upper-cased, matching the rest of
    /// the graph's predicate vocabulary.
    pub fn new(relation: impl Into<String>, weight: f64) -> Self {
        Self {
            relation: relation.into().to_uppercase(),
            weight,
            edge_kind: EdgeKind::Relation,
            source_span: None,
        }
    }

    pub fn unweighted(relation: impl Into<String>) -> Self {
        Self::new(relation, 1.0)
    }

    pub fn with_span(mut self, span: (u32, u32)) -> Self {
        self.source_span = Some(span);
        self
    }

    pub fn with_kind(mut self, kind: EdgeKind) -> Self {
        self.edge_kind = kind;
        self
    }

    pub fn attribution(relation: impl Into<String>, verb: impl Into<String>) -> Self {
        Self::new(relation, 1.0).with_kind(EdgeKind::Attribution { verb: verb.into() })
    }

    pub fn modified_relation(
        relation: impl Into<String>,
        manner: Option<String>,
        location: Option<String>,
        time: Option<String>,
        recipient: Option<String>,
    ) -> Self {
        Self::new(relation, 1.0).with_kind(EdgeKind::ModifiedRelation {
            manner,
            location,
            time,
            recipient,
        })
    }
}

#[derive(Default)]
pub struct ConceptGraph {
    graph: DiGraph<ConceptNode, ConceptEdge>,
    index: HashMap<String, NodeIndex>,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_node(&mut self, node: ConceptNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    pub fn add_edge(&mut self, source_id: &str, target_id: &str, edge: ConceptEdge) -> Option<EdgeIndex> {
        let source = *self.index.get(source_id)?;
        let target = *self.index.get(target_id)?;
        Some(self.graph.add_edge(source, target, edge))
    }

    pub fn get_node(&self, id: &str) -> Option<&ConceptNode> {
        self.index.get(id).and_then(|&idx| self.graph.node_weight(idx))
    }

    pub fn get_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ConceptNode> {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&ConceptNode, &ConceptNode, &ConceptEdge)> {
        self.graph.edge_references().map(move |e| {
            (
                &self.graph[e.source()],
                &self.graph[e.target()],
                e.weight(),
            )
        })
    }

    pub fn outgoing_edges(&self, id: &str) -> Vec<(&ConceptNode, &ConceptEdge)> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (&self.graph[e.target()], e.weight()))
            .collect()
    }

    pub fn incoming_edges(&self, id: &str) -> Vec<(&ConceptNode, &ConceptEdge)> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (&self.graph[e.source()], e.weight()))
            .collect()
    }

    /// Nodes with neither an incoming nor an outgoing edge.
    pub fn orphan_nodes(&self) -> Vec<&ConceptNode> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph.edges_directed(idx, Direction::Outgoing).next().is_none()
                    && self.graph.edges_directed(idx, Direction::Incoming).next().is_none()
            })
            .map(|idx| &self.graph[idx])
            .collect()
    }

    pub fn connected_component_count(&self) -> usize {
        let mut uf = rustworkx_core::petgraph::unionfind::UnionFind::new(self.graph.node_count());
        for edge in self.graph.edge_references() {
            uf.union(edge.source().index(), edge.target().index());
        }
        let mut roots = std::collections::HashSet::new();
        for idx in self.graph.node_indices() {
            roots.insert(uf.find(idx.index()));
        }
        roots.len()
    }

    pub fn centrality_degree(&self) -> Vec<(String, f64)> {
        self.graph
            .node_indices()
            .map(|idx| {
                let degree = self.graph.edges_directed(idx, Direction::Outgoing).count()
                    + self.graph.edges_directed(idx, Direction::Incoming).count();
                (self.graph[idx].id.clone(), degree as f64)
            })
            .collect()
    }

    pub fn raw_graph(&self) -> &DiGraph<ConceptNode, ConceptEdge> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_node_is_idempotent() {
        let mut g = ConceptGraph::new();
        let a = g.ensure_node(ConceptNode::new("a", "Alice", "person"));
        let a2 = g.ensure_node(ConceptNode::new("a", "Alice", "person"));
        assert_eq!(a, a2);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn add_edge_links_existing_nodes() {
        let mut g = ConceptGraph::new();
        g.ensure_node(ConceptNode::new("a", "Alice", "person"));
        g.ensure_node(ConceptNode::new("b", "Bob", "person"));
        assert!(g.add_edge("a", "b", ConceptEdge::unweighted("knows")).is_some());
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn edge_relation_is_stored_uppercased() {
        let edge = ConceptEdge::unweighted("knows");
        assert_eq!(edge.relation, "KNOWS");
    }

    #[test]
    fn orphan_nodes_union_touched_nodes_equals_all_nodes() {
        let mut g = ConceptGraph::new();
        g.ensure_node(ConceptNode::new("a", "Alice", "person"));
        g.ensure_node(ConceptNode::new("b", "Bob", "person"));
        g.ensure_node(ConceptNode::new("c", "Carol", "person"));
        g.add_edge("a", "b", ConceptEdge::unweighted("knows"));

        let orphans: std::collections::HashSet<_> =
            g.orphan_nodes().into_iter().map(|n| n.id.clone()).collect();
        let touched: std::collections::HashSet<_> =
            g.edges().flat_map(|(s, t, _)| [s.id.clone(), t.id.clone()]).collect();
        let all: std::collections::HashSet<_> = g.nodes().map(|n| n.id.clone()).collect();

        let union: std::collections::HashSet<_> = orphans.union(&touched).cloned().collect();
        assert_eq!(union, all);
    }

    #[test]
    fn connected_components_counts_isolated_groups() {
        let mut g = ConceptGraph::new();
        g.ensure_node(ConceptNode::new("a", "A", "x"));
        g.ensure_node(ConceptNode::new("b", "B", "x"));
        g.ensure_node(ConceptNode::new("c", "C", "x"));
        g.add_edge("a", "b", ConceptEdge::unweighted("r"));
        assert_eq!(g.connected_component_count(), 2);
    }
}
