//! Iterative Prize-Collecting Steiner Tree solver. At every recursion
//! depth, three independent strategies each propose a solution and the
//! cheapest wins, ties broken in favor of the earlier strategy:
//!
//! 1. **Goemans-Williamson primal-dual** (`gw::primal_dual`) on a
//!    β-scaled instance, with dead one-edge-connected subtrees pruned
//!    and the result re-costed against the original penalties.
//! 2. **MST-Steiner**: Dijkstra metric closure over the live terminals,
//!    Kruskal's MST on that closure, edges expanded back to full paths.
//! 3. **Recursive call** with the penalties of nodes GW declared dead
//!    zeroed out, one depth deeper, stopping at `max_depth` or when GW
//!    found no dead nodes to zero.
//!
//! A single terminal or an empty terminal set are handled directly
//! without invoking any strategy.

use std::collections::{HashMap, HashSet};

use crate::config::PcstConfig;

use super::gw::primal_dual;
use super::instance::PcstInstance;
use super::mst::{expand_edge, mst_steiner};

#[derive(Debug, Clone)]
pub struct PcstResult {
    pub nodes: Vec<usize>,
    pub edges: Vec<(usize, usize, f64)>,
    /// `sum(cost(e) for e in edges) + sum(penalty(v) for v not in nodes)`,
    /// matching the solution's defining cost exactly.
    pub total_cost: f64,
}

pub struct PcstSolver {
    config: PcstConfig,
}

impl PcstSolver {
    pub fn new(config: PcstConfig) -> Self {
        Self { config }
    }

    pub fn solve(&self, instance: &PcstInstance) -> PcstResult {
        self.solve_depth(instance, 0)
    }

    fn solve_depth(&self, instance: &PcstInstance, depth: u32) -> PcstResult {
        let terminals: Vec<usize> = (0..instance.node_count)
            .filter(|&n| instance.prizes[n] > 0.0)
            .collect();

        if terminals.is_empty() {
            return PcstResult {
                nodes: Vec::new(),
                edges: Vec::new(),
                total_cost: 0.0,
            };
        }
        if terminals.len() == 1 {
            let n = terminals[0];
            let nodes: HashSet<usize> = std::iter::once(n).collect();
            return PcstResult {
                total_cost: self.total_cost(instance, &nodes, &[]),
                nodes: vec![n],
                edges: Vec::new(),
            };
        }

        let cost_lookup = build_cost_lookup(instance);

        // Strategy 1: Goemans-Williamson primal-dual, pruned and re-costed.
        let gw_outcome = primal_dual(instance, self.config.beta, self.config.epsilon);
        let mut gw_edges = gw_outcome.edges.clone();
        self.prune_low_value_leaves(instance, &mut gw_edges);
        let gw_result = self.finalize(instance, &terminals, gw_edges);

        // Strategy 2: MST-Steiner over the metric closure of terminals.
        let mut mst_edges = self.expand_mst(instance, &terminals, &cost_lookup);
        self.prune_low_value_leaves(instance, &mut mst_edges);
        let mst_result = self.finalize(instance, &terminals, mst_edges);

        // Strategy 3: recurse with GW's dead nodes zeroed, one depth deeper.
        let dead_nodes: Vec<usize> = gw_outcome
            .dead_components
            .iter()
            .flatten()
            .copied()
            .filter(|&n| instance.prizes[n].is_finite())
            .collect();
        let recursive_result = if depth < self.config.max_depth && !dead_nodes.is_empty() {
            let mut zeroed = instance.clone();
            for &n in &dead_nodes {
                zeroed.prizes[n] = 0.0;
            }
            let sub = self.solve_depth(&zeroed, depth + 1);
            // Re-cost the sub-solution's edge set against the ORIGINAL
            // penalties, since the comparison across strategies must
            // use the real instance, not the zeroed-out one.
            Some(self.finalize(instance, &terminals, sub.edges))
        } else {
            None
        };

        let mut candidates = vec![gw_result, mst_result];
        if let Some(r) = recursive_result {
            candidates.push(r);
        }

        // `min_by` returns the first minimal element on ties, which is
        // exactly the 1 (GW) -> 2 (MST) -> 3 (recursive) tie-break order.
        candidates
            .into_iter()
            .min_by(|a, b| a.total_cost.partial_cmp(&b.total_cost).unwrap_or(std::cmp::Ordering::Equal))
            .expect("at least the GW and MST candidates are always present")
    }

    fn expand_mst(
        &self,
        instance: &PcstInstance,
        terminals: &[usize],
        cost_lookup: &HashMap<(usize, usize), f64>,
    ) -> Vec<(usize, usize, f64)> {
        let mst = mst_steiner(instance, terminals);
        let mut edge_set: HashSet<(usize, usize)> = HashSet::new();
        for &te in &mst {
            let path = expand_edge(instance, te);
            for pair in path.windows(2) {
                edge_set.insert(normalize(pair[0], pair[1]));
            }
        }
        edge_set
            .into_iter()
            .map(|(a, b)| {
                let cost = *cost_lookup.get(&(a, b)).unwrap_or(&0.0);
                (a, b, cost)
            })
            .collect()
    }

    /// Builds the final node/edge/cost result from a candidate edge
    /// set: every edge endpoint is in, every infinite-prize ("must
    /// include") terminal is forced in even if unconnected, and if
    /// nothing survives at all the single best-prize terminal is kept
    /// so the result is never spuriously empty.
    fn finalize(&self, instance: &PcstInstance, terminals: &[usize], edges: Vec<(usize, usize, f64)>) -> PcstResult {
        let mut nodes: HashSet<usize> = HashSet::new();
        for &(a, b, _) in &edges {
            nodes.insert(a);
            nodes.insert(b);
        }
        for &t in terminals {
            if instance.prizes[t].is_infinite() {
                nodes.insert(t);
            }
        }
        if nodes.is_empty() {
            if let Some(&best) = terminals
                .iter()
                .max_by(|&&a, &&b| instance.prizes[a].partial_cmp(&instance.prizes[b]).unwrap())
            {
                nodes.insert(best);
            }
        }

        let total_cost = self.total_cost(instance, &nodes, &edges);
        let mut node_list: Vec<usize> = nodes.into_iter().collect();
        node_list.sort_unstable();

        PcstResult {
            nodes: node_list,
            edges,
            total_cost,
        }
    }

    /// `sum(edge costs) + sum(penalty(v) for v not in nodes)`, the
    /// defining cost of a PCST solution.
    fn total_cost(&self, instance: &PcstInstance, nodes: &HashSet<usize>, edges: &[(usize, usize, f64)]) -> f64 {
        let edge_cost: f64 = edges.iter().map(|&(_, _, c)| c).sum();
        let excluded_penalty: f64 = (0..instance.node_count)
            .filter(|n| !nodes.contains(n))
            .map(|n| instance.prizes[n])
            .sum();
        edge_cost + excluded_penalty
    }

    /// Iteratively removes any leaf whose prize fails to clear
    /// `cost / beta` (within `epsilon`), unless its prize is infinite —
    /// the "prune a dead subtree hanging off the rest by exactly one
    /// edge" step, generalized to apply to either strategy's raw edge
    /// set. Runs until nothing more is prunable.
    fn prune_low_value_leaves(&self, instance: &PcstInstance, edges: &mut Vec<(usize, usize, f64)>) {
        loop {
            if !self.prune_round(instance, edges) {
                break;
            }
        }
    }

    fn prune_round(&self, instance: &PcstInstance, edges: &mut Vec<(usize, usize, f64)>) -> bool {
        let mut degree: HashMap<usize, usize> = HashMap::new();
        for &(a, b, _) in edges.iter() {
            *degree.entry(a).or_insert(0) += 1;
            *degree.entry(b).or_insert(0) += 1;
        }

        let mut to_remove = Vec::new();
        for (idx, &(a, b, cost)) in edges.iter().enumerate() {
            for (leaf, _other) in [(a, b), (b, a)] {
                if degree.get(&leaf).copied().unwrap_or(0) != 1 {
                    continue;
                }
                if instance.prizes[leaf].is_infinite() {
                    continue;
                }
                let threshold = cost / self.config.beta;
                if instance.prizes[leaf] + self.config.epsilon < threshold {
                    to_remove.push(idx);
                }
            }
        }

        if to_remove.is_empty() {
            return false;
        }
        to_remove.sort_unstable();
        to_remove.dedup();
        for &idx in to_remove.iter().rev() {
            edges.remove(idx);
        }
        true
    }
}

fn normalize(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn build_cost_lookup(instance: &PcstInstance) -> HashMap<(usize, usize), f64> {
    let mut lookup = HashMap::new();
    for &(a, b, cost) in &instance.edges {
        lookup.insert(normalize(a, b), cost);
    }
    lookup
}
