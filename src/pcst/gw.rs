//! Shortest-path distances between terminal pairs (plain Dijkstra over
//! the instance's adjacency list), and the Goemans-Williamson
//! primal-dual moat-growing approximation for Prize-Collecting Steiner
//! Tree: every component with remaining prize budget grows a dual
//! "moat" at unit rate; an edge is selected when the moats of the two
//! components it joins sum to its cost, merging them; a component
//! whose moat consumes its whole budget goes dead without merging.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use super::instance::PcstInstance;

#[derive(PartialEq)]
struct HeapItem {
    dist: f64,
    node: usize,
}

impl Eq for HeapItem {}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other.dist.partial_cmp(&self.dist).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra shortest-path distances from `source` to every node, along
/// with the predecessor used to reconstruct the path.
pub fn dijkstra(instance: &PcstInstance, source: usize) -> (Vec<f64>, Vec<Option<usize>>) {
    let adj = instance.adjacency();
    let mut dist = vec![f64::INFINITY; instance.node_count];
    let mut prev = vec![None; instance.node_count];
    let mut heap = BinaryHeap::new();

    dist[source] = 0.0;
    heap.push(HeapItem { dist: 0.0, node: source });

    while let Some(HeapItem { dist: d, node: u }) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        for &(v, cost) in &adj[u] {
            let candidate = d + cost;
            if candidate < dist[v] - 1e-12 {
                dist[v] = candidate;
                prev[v] = Some(u);
                heap.push(HeapItem { dist: candidate, node: v });
            }
        }
    }

    (dist, prev)
}

pub fn shortest_path(instance: &PcstInstance, source: usize, target: usize) -> Vec<usize> {
    let (dist, prev) = dijkstra(instance, source);
    if dist[target].is_infinite() {
        return Vec::new();
    }
    let mut path = vec![target];
    let mut cur = target;
    while let Some(p) = prev[cur] {
        path.push(p);
        cur = p;
    }
    path.reverse();
    path
}

/// One moat-growing component: the original node ids it has absorbed,
/// whether it is still growing, and how much budget (`prize / beta`)
/// it has left. A root or infinite-prize node gets an infinite budget
/// so it is never starved into `dead`.
struct Cluster {
    members: HashSet<usize>,
    active: bool,
    budget: f64,
}

/// Edges selected by the moat growth (each merged two distinct
/// components) and the node sets of every component that went dead
/// before the growth stopped, captured at the moment of death.
pub struct GwOutcome {
    pub edges: Vec<(usize, usize, f64)>,
    pub dead_components: Vec<HashSet<usize>>,
}

/// Runs the primal-dual moat-growing simulation to convergence: at
/// each step every edge spanning two distinct components and every
/// still-active component's remaining budget are candidate "events";
/// time advances to the nearest one, moats and budgets update for that
/// span, and every event sitting at that exact time (within `epsilon`)
/// is then applied — ties are processed together so simultaneous
/// deaths and merges never get ordered arbitrarily.
pub fn primal_dual(instance: &PcstInstance, beta: f64, epsilon: f64) -> GwOutcome {
    let n = instance.node_count;
    let mut owner: Vec<usize> = (0..n).collect();
    let mut clusters: Vec<Option<Cluster>> = (0..n)
        .map(|v| {
            let infinite_budget = instance.root == Some(v) || instance.prizes[v].is_infinite();
            let budget = if infinite_budget {
                f64::INFINITY
            } else {
                instance.prizes[v] / beta
            };
            Some(Cluster {
                members: std::iter::once(v).collect(),
                active: budget > epsilon,
                budget,
            })
        })
        .collect();

    let mut edge_moat: Vec<f64> = vec![0.0; instance.edges.len()];
    let mut selected = Vec::new();
    let mut dead_components = Vec::new();

    loop {
        let live_cluster_count = clusters.iter().filter(|c| c.is_some()).count();
        if live_cluster_count <= 1 {
            break;
        }

        let edge_rate = |owner: &[usize], clusters: &[Option<Cluster>], idx: usize| -> (usize, usize, f64) {
            let (a, b, _) = instance.edges[idx];
            let ca = owner[a];
            let cb = owner[b];
            if ca == cb {
                return (ca, cb, 0.0);
            }
            let active_a = clusters[ca].as_ref().map(|c| c.active).unwrap_or(false) as u8 as f64;
            let active_b = clusters[cb].as_ref().map(|c| c.active).unwrap_or(false) as u8 as f64;
            (ca, cb, active_a + active_b)
        };

        let mut best_time = f64::INFINITY;
        for (idx, &(_, _, cost)) in instance.edges.iter().enumerate() {
            let (ca, cb, rate) = edge_rate(&owner, &clusters, idx);
            if ca == cb || rate <= 0.0 {
                continue;
            }
            let remaining = (cost - edge_moat[idx]).max(0.0);
            best_time = best_time.min(remaining / rate);
        }
        for slot in clusters.iter() {
            if let Some(c) = slot {
                if c.active && c.budget.is_finite() {
                    best_time = best_time.min(c.budget);
                }
            }
        }

        if !best_time.is_finite() {
            break;
        }

        for (idx, &(_, _, _cost)) in instance.edges.iter().enumerate() {
            let (ca, cb, rate) = edge_rate(&owner, &clusters, idx);
            if ca == cb || rate <= 0.0 {
                continue;
            }
            edge_moat[idx] += rate * best_time;
        }
        for slot in clusters.iter_mut() {
            if let Some(c) = slot {
                if c.active && c.budget.is_finite() {
                    c.budget -= best_time;
                }
            }
        }

        let mut any_event = false;

        for slot in clusters.iter_mut() {
            if let Some(c) = slot {
                if c.active && c.budget <= epsilon {
                    c.active = false;
                    c.budget = 0.0;
                    dead_components.push(c.members.clone());
                    any_event = true;
                }
            }
        }

        for (idx, &(a, b, cost)) in instance.edges.iter().enumerate() {
            let ca = owner[a];
            let cb = owner[b];
            if ca == cb {
                continue;
            }
            if edge_moat[idx] + epsilon < cost {
                continue;
            }
            let cluster_b = match clusters[cb].take() {
                Some(c) => c,
                None => continue,
            };
            let cluster_a = clusters[ca].as_mut().expect("owner always points at a live cluster");
            cluster_a.budget = match (cluster_a.active, cluster_b.active) {
                (true, true) => cluster_a.budget + cluster_b.budget,
                (true, false) => cluster_a.budget,
                (false, true) => cluster_b.budget,
                (false, false) => 0.0,
            };
            cluster_a.active = cluster_a.active || cluster_b.active;
            for &m in &cluster_b.members {
                owner[m] = ca;
            }
            cluster_a.members.extend(cluster_b.members);
            selected.push((a, b, cost));
            any_event = true;
        }

        if !any_event {
            break;
        }
    }

    GwOutcome {
        edges: selected,
        dead_components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dijkstra_finds_shortest_distance() {
        let mut inst = PcstInstance::new(3);
        inst.add_edge(0, 1, 1.0);
        inst.add_edge(1, 2, 1.0);
        inst.add_edge(0, 2, 5.0);
        let (dist, _) = dijkstra(&inst, 0);
        assert!((dist[2] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn shortest_path_reconstructs_node_sequence() {
        let mut inst = PcstInstance::new(3);
        inst.add_edge(0, 1, 1.0);
        inst.add_edge(1, 2, 1.0);
        inst.add_edge(0, 2, 5.0);
        assert_eq!(shortest_path(&inst, 0, 2), vec![0, 1, 2]);
    }

    #[test]
    fn unreachable_target_yields_empty_path() {
        let mut inst = PcstInstance::new(3);
        inst.add_edge(0, 1, 1.0);
        assert!(shortest_path(&inst, 0, 2).is_empty());
    }

    #[test]
    fn primal_dual_connects_a_cheap_triangle() {
        let mut inst = PcstInstance::new(3);
        inst.set_prize(0, 10.0);
        inst.set_prize(1, 10.0);
        inst.set_prize(2, 10.0);
        inst.add_edge(0, 1, 1.0);
        inst.add_edge(1, 2, 1.0);
        inst.add_edge(0, 2, 5.0);
        let outcome = primal_dual(&inst, 2.0, 1e-10);
        assert_eq!(outcome.edges.len(), 2);
        let total: f64 = outcome.edges.iter().map(|&(_, _, c)| c).sum();
        assert!((total - 2.0).abs() < 1e-6);
    }

    #[test]
    fn primal_dual_lets_a_low_prize_leaf_die_unmerged() {
        let mut inst = PcstInstance::new(3);
        inst.set_prize(0, 10.0);
        inst.set_prize(1, 10.0);
        inst.set_prize(2, 0.001);
        inst.add_edge(0, 1, 1.0);
        inst.add_edge(1, 2, 1000.0);
        let outcome = primal_dual(&inst, 2.0, 1e-10);
        assert!(!outcome.dead_components.is_empty());
        assert!(outcome
            .dead_components
            .iter()
            .any(|c| c.contains(&2)));
    }

    #[test]
    fn root_node_gets_infinite_budget_and_is_never_marked_dead() {
        let mut inst = PcstInstance::new(2);
        inst.set_root(0);
        inst.set_prize(1, 0.001);
        inst.add_edge(0, 1, 100.0);
        let outcome = primal_dual(&inst, 2.0, 1e-10);
        assert!(!outcome.dead_components.iter().any(|c| c.contains(&0)));
    }
}
