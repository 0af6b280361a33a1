//! The undirected, edge-weighted, node-prized graph a PCST solve runs
//! over — built from a `ConceptGraph` by collapsing direction and
//! assigning a prize per node and a cost per edge.

#[derive(Debug, Clone)]
pub struct PcstInstance {
    pub node_count: usize,
    /// `f64::INFINITY` marks a node that must be included (a distinguished root).
    pub prizes: Vec<f64>,
    pub edges: Vec<(usize, usize, f64)>,
    pub root: Option<usize>,
}

impl PcstInstance {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            prizes: vec![0.0; node_count],
            edges: Vec::new(),
            root: None,
        }
    }

    pub fn set_prize(&mut self, node: usize, prize: f64) {
        self.prizes[node] = prize;
    }

    /// Self-loops are dropped. A parallel edge (same unordered pair
    /// already present) is collapsed into the cheaper of the two costs
    /// rather than kept as a second edge.
    pub fn add_edge(&mut self, a: usize, b: usize, cost: f64) {
        if a == b {
            return;
        }
        let existing = self.edges.iter_mut().find(|(ea, eb, _)| {
            (*ea == a && *eb == b) || (*ea == b && *eb == a)
        });
        match existing {
            Some(edge) => edge.2 = edge.2.min(cost),
            None => self.edges.push((a, b, cost)),
        }
    }

    pub fn set_root(&mut self, root: usize) {
        self.root = Some(root);
        self.prizes[root] = f64::INFINITY;
    }

    pub fn adjacency(&self) -> Vec<Vec<(usize, f64)>> {
        let mut adj = vec![Vec::new(); self.node_count];
        for &(a, b, cost) in &self.edges {
            adj[a].push((b, cost));
            adj[b].push((a, cost));
        }
        adj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_loop_is_dropped() {
        let mut inst = PcstInstance::new(2);
        inst.add_edge(0, 0, 5.0);
        assert!(inst.edges.is_empty());
    }

    #[test]
    fn parallel_edge_collapses_to_cheaper_cost() {
        let mut inst = PcstInstance::new(2);
        inst.add_edge(0, 1, 5.0);
        inst.add_edge(1, 0, 2.0);
        assert_eq!(inst.edges.len(), 1);
        assert_eq!(inst.edges[0].2, 2.0);
    }

    #[test]
    fn root_gets_infinite_prize() {
        let mut inst = PcstInstance::new(2);
        inst.set_root(0);
        assert!(inst.prizes[0].is_infinite());
    }
}
