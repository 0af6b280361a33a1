//! Kruskal's MST over the complete distance graph induced on a set of
//! terminal nodes, using union-find for the cycle check.

use rustworkx_core::petgraph::unionfind::UnionFind;

use super::gw::dijkstra;
use super::instance::PcstInstance;

#[derive(Debug, Clone, Copy)]
pub struct TerminalEdge {
    pub a: usize,
    pub b: usize,
    pub cost: f64,
}

/// Builds the complete distance graph over `terminals` and returns its
/// Kruskal MST edges.
pub fn mst_steiner(instance: &PcstInstance, terminals: &[usize]) -> Vec<TerminalEdge> {
    if terminals.len() < 2 {
        return Vec::new();
    }

    let mut complete = Vec::new();
    for (i, &t) in terminals.iter().enumerate() {
        let (dist, _) = dijkstra(instance, t);
        for &other in &terminals[i + 1..] {
            if dist[other].is_finite() {
                complete.push(TerminalEdge {
                    a: t,
                    b: other,
                    cost: dist[other],
                });
            }
        }
    }

    complete.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(std::cmp::Ordering::Equal));

    let mut uf = UnionFind::new(instance.node_count);
    let mut mst = Vec::new();
    for edge in complete {
        if uf.find(edge.a) != uf.find(edge.b) {
            uf.union(edge.a, edge.b);
            mst.push(edge);
        }
    }
    mst
}

/// Expands a terminal-level MST edge back into the full node path it
/// represents in the original graph.
pub fn expand_edge(instance: &PcstInstance, edge: TerminalEdge) -> Vec<usize> {
    super::gw::shortest_path(instance, edge.a, edge.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mst_connects_all_terminals_with_no_cycles() {
        let mut inst = PcstInstance::new(4);
        inst.add_edge(0, 1, 1.0);
        inst.add_edge(1, 2, 1.0);
        inst.add_edge(2, 3, 1.0);
        inst.add_edge(0, 3, 10.0);
        let mst = mst_steiner(&inst, &[0, 1, 2, 3]);
        assert_eq!(mst.len(), 3);
    }

    #[test]
    fn single_terminal_yields_empty_mst() {
        let inst = PcstInstance::new(4);
        assert!(mst_steiner(&inst, &[0]).is_empty());
    }

    #[test]
    fn expand_edge_reconstructs_full_path() {
        let mut inst = PcstInstance::new(3);
        inst.add_edge(0, 1, 1.0);
        inst.add_edge(1, 2, 1.0);
        let path = expand_edge(&inst, TerminalEdge { a: 0, b: 2, cost: 2.0 });
        assert_eq!(path, vec![0, 1, 2]);
    }
}
