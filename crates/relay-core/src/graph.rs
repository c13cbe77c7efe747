//! Proximity graph over a request's node set.
//!
//! Nodes live in an arena indexed by position; every other planning structure refers to
//! them by `usize` index. The graph is built once per request and never mutated.

use crate::models::Node;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct NetworkGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
    link_range_km: f64,
}

impl NetworkGraph {
    /// Connect every pair of nodes within `link_range_km` of each other.
    ///
    /// Pairwise O(n²); node counts per request are in the tens to low hundreds.
    /// A node whose id was already seen is skipped so ids stay unique in the arena.
    pub fn build(nodes: Vec<Node>, link_range_km: f64) -> Self {
        let mut arena: Vec<Node> = Vec::with_capacity(nodes.len());
        let mut index = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if index.contains_key(&node.id) {
                tracing::warn!(node_id = %node.id, "duplicate node id skipped");
                continue;
            }
            index.insert(node.id.clone(), arena.len());
            arena.push(node);
        }

        let mut adjacency = vec![Vec::new(); arena.len()];
        for i in 0..arena.len() {
            for j in (i + 1)..arena.len() {
                if arena[i].distance_km(&arena[j]) <= link_range_km {
                    adjacency[i].push(j);
                    adjacency[j].push(i);
                }
            }
        }

        Self {
            nodes: arena,
            index,
            adjacency,
            link_range_km,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn link_range_km(&self) -> f64 {
        self.link_range_km
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Neighbor indices in ascending order.
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.adjacency[idx]
    }

    pub fn are_linked(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].binary_search(&b).is_ok()
    }

    /// Edge weight, recomputed on demand.
    pub fn distance_km(&self, a: usize, b: usize) -> f64 {
        self.nodes[a].distance_km(&self.nodes[b])
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Materialize an index path into owned nodes.
    pub fn to_nodes(&self, path: &[usize]) -> Vec<Node> {
        path.iter().map(|&idx| self.nodes[idx].clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination_point;
    use crate::models::NodeKind;

    fn node(id: &str, lat: f64, lon: f64) -> Node {
        Node::virtual_node(id, NodeKind::Destination, lat, lon)
    }

    fn east_of(id: &str, km: f64) -> Node {
        let (lat, lon) = destination_point(25.0, 49.0, 90.0, km);
        node(id, lat, lon)
    }

    #[test]
    fn connects_pairs_within_range_only() {
        let graph = NetworkGraph::build(
            vec![east_of("a", 0.0), east_of("b", 8.0), east_of("c", 16.0)],
            10.1,
        );
        assert_eq!(graph.len(), 3);
        assert!(graph.are_linked(0, 1));
        assert!(graph.are_linked(1, 2));
        assert!(!graph.are_linked(0, 2));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn edges_are_symmetric() {
        let graph = NetworkGraph::build(
            vec![east_of("a", 0.0), east_of("b", 3.0), east_of("c", 6.0)],
            10.1,
        );
        for a in 0..graph.len() {
            for &b in graph.neighbors(a) {
                assert!(graph.neighbors(b).contains(&a));
            }
        }
    }

    #[test]
    fn link_exactly_at_range_is_kept() {
        let graph = NetworkGraph::build(vec![east_of("a", 0.0), east_of("b", 10.0)], 10.0 + 1e-9);
        assert!(graph.are_linked(0, 1));
    }

    #[test]
    fn duplicate_ids_are_skipped() {
        let graph = NetworkGraph::build(
            vec![east_of("a", 0.0), east_of("a", 1.0), east_of("b", 2.0)],
            10.1,
        );
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.index_of("b"), Some(1));
        assert_eq!(graph.node(0).id, "a");
    }

    #[test]
    fn empty_graph() {
        let graph = NetworkGraph::build(Vec::new(), 10.1);
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }
}
