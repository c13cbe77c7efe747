//! Bridging over-long hops with real towers before final validation.

use crate::config::RepairConfig;
use crate::graph::NetworkGraph;
use crate::models::{Node, NodeKind};
use std::collections::HashSet;

pub struct SegmentRepairer<'g> {
    graph: &'g NetworkGraph,
    config: &'g RepairConfig,
}

impl<'g> SegmentRepairer<'g> {
    pub fn new(graph: &'g NetworkGraph, config: &'g RepairConfig) -> Self {
        Self { graph, config }
    }

    /// Insert towers into every hop longer than the link range where possible.
    ///
    /// Hops that cannot be bridged are kept as they are; validation rejects them.
    pub fn repair(&self, path: Vec<Node>) -> Vec<Node> {
        let range = self.graph.link_range_km();
        if path.windows(2).all(|pair| pair[0].distance_km(&pair[1]) <= range) {
            return path;
        }

        let mut used: HashSet<String> = path.iter().map(|node| node.id.clone()).collect();
        let mut repaired = Vec::with_capacity(path.len());
        let mut nodes = path.into_iter();
        let Some(first) = nodes.next() else {
            return repaired;
        };
        repaired.push(first);

        for next in nodes {
            let from = repaired.last().cloned();
            if let Some(from) = from {
                if from.distance_km(&next) > range {
                    let before = repaired.len();
                    self.bridge(&from, &next, 0, &mut repaired, &mut used);
                    tracing::debug!(
                        from = %from.id,
                        to = %next.id,
                        inserted = repaired.len() - before,
                        "repaired long segment"
                    );
                }
            }
            repaired.push(next);
        }
        repaired
    }

    /// Step to the in-range tower closest to `to`, as long as it is strictly closer than
    /// `from`, and recurse until the hop fits or the depth limit is reached.
    fn bridge(
        &self,
        from: &Node,
        to: &Node,
        depth: usize,
        out: &mut Vec<Node>,
        used: &mut HashSet<String>,
    ) {
        let range = self.graph.link_range_km();
        let span = from.distance_km(to);
        if span <= range || depth >= self.config.max_depth {
            return;
        }

        let relay = self
            .graph
            .nodes()
            .iter()
            .filter(|node| node.kind == NodeKind::Tower && !used.contains(&node.id))
            .filter(|node| from.distance_km(node) <= range)
            .map(|node| (node, node.distance_km(to)))
            .filter(|(_, to_end)| *to_end < span)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(node, _)| node.clone());

        if let Some(relay) = relay {
            used.insert(relay.id.clone());
            out.push(relay.clone());
            self.bridge(&relay, to, depth + 1, out, used);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination_point;

    fn at(id: &str, kind: NodeKind, east_km: f64) -> Node {
        let (lat, lon) = destination_point(25.0, 49.0, 90.0, east_km);
        Node::virtual_node(id, kind, lat, lon)
    }

    #[test]
    fn bridges_gap_with_towers() {
        let graph = NetworkGraph::build(
            vec![
                at("s", NodeKind::Start, 0.0),
                at("g", NodeKind::End, 24.0),
                at("t1", NodeKind::Tower, 8.0),
                at("t2", NodeKind::Tower, 16.0),
            ],
            10.1,
        );
        let config = RepairConfig::default();
        let repaired = SegmentRepairer::new(&graph, &config)
            .repair(vec![graph.node(0).clone(), graph.node(1).clone()]);
        let ids: Vec<&str> = repaired.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids, vec!["s", "t1", "t2", "g"]);
    }

    #[test]
    fn valid_path_is_returned_unchanged() {
        let graph = NetworkGraph::build(
            vec![at("s", NodeKind::Start, 0.0), at("g", NodeKind::End, 5.0)],
            10.1,
        );
        let config = RepairConfig::default();
        let path = vec![graph.node(0).clone(), graph.node(1).clone()];
        assert_eq!(SegmentRepairer::new(&graph, &config).repair(path.clone()), path);
    }

    #[test]
    fn unbridgeable_gap_is_left_for_validation() {
        let graph = NetworkGraph::build(
            vec![
                at("s", NodeKind::Start, 0.0),
                at("g", NodeKind::End, 40.0),
                at("t1", NodeKind::Tower, 9.0),
            ],
            10.1,
        );
        let config = RepairConfig::default();
        let repaired = SegmentRepairer::new(&graph, &config)
            .repair(vec![graph.node(0).clone(), graph.node(1).clone()]);
        let ids: Vec<&str> = repaired.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids, vec!["s", "t1", "g"]);
        assert!(repaired[1].distance_km(&repaired[2]) > 10.1);
    }

    #[test]
    fn depth_limit_bounds_insertions() {
        let graph = NetworkGraph::build(
            vec![
                at("s", NodeKind::Start, 0.0),
                at("g", NodeKind::End, 50.0),
                at("t1", NodeKind::Tower, 9.0),
                at("t2", NodeKind::Tower, 18.0),
                at("t3", NodeKind::Tower, 27.0),
            ],
            10.1,
        );
        let config = RepairConfig { max_depth: 2 };
        let repaired = SegmentRepairer::new(&graph, &config)
            .repair(vec![graph.node(0).clone(), graph.node(1).clone()]);
        assert_eq!(repaired.len(), 4);
    }
}
