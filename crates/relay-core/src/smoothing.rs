//! Path post-processing: drop redundant relays and straighten sharp turns.

use crate::config::SmoothingConfig;
use crate::geo::{bearing_deg, bearing_delta_deg, haversine_km, midpoint};
use crate::graph::NetworkGraph;
use crate::models::NodeKind;
use std::collections::HashSet;

pub struct PathSmoother<'g> {
    graph: &'g NetworkGraph,
    config: &'g SmoothingConfig,
}

impl<'g> PathSmoother<'g> {
    pub fn new(graph: &'g NetworkGraph, config: &'g SmoothingConfig) -> Self {
        Self { graph, config }
    }

    /// Smooth an index path without ever lengthening it.
    ///
    /// Paths of three nodes or fewer come back unchanged. If the smoothed result has a
    /// hop beyond the link range the input is returned as-is.
    pub fn smooth(&self, path: &[usize]) -> Vec<usize> {
        if path.len() <= 3 {
            return path.to_vec();
        }

        let mut current = path.to_vec();
        for pass in 0..self.config.max_passes {
            let (next, changed) = self.smooth_pass(&current);
            current = next;
            tracing::debug!(pass, nodes = current.len(), changed, "smoothing pass");
            if !changed || current.len() <= 2 {
                break;
            }
        }

        if !self.is_connected(&current) {
            tracing::warn!(
                original = path.len(),
                smoothed = current.len(),
                "smoothed path broke link range, keeping original"
            );
            return path.to_vec();
        }
        current
    }

    fn smooth_pass(&self, path: &[usize]) -> (Vec<usize>, bool) {
        let range = self.graph.link_range_km();
        let mut in_path: HashSet<usize> = path.iter().copied().collect();
        let mut result = Vec::with_capacity(path.len());
        let mut changed = false;
        result.push(path[0]);

        for i in 1..path.len() - 1 {
            let a = *result.last().unwrap_or(&path[0]);
            let b = path[i];
            let c = path[i + 1];

            if self.graph.distance_km(a, c) <= range {
                in_path.remove(&b);
                changed = true;
                continue;
            }

            let turn = bearing_delta_deg(
                self.graph.node(a).bearing_to(self.graph.node(b)),
                self.graph.node(b).bearing_to(self.graph.node(c)),
            );
            if turn > self.config.turn_threshold_deg {
                if let Some(better) = self.better_middle(a, b, c, &in_path) {
                    tracing::debug!(
                        replaced = %self.graph.node(b).id,
                        with = %self.graph.node(better).id,
                        turn,
                        "straightened relay"
                    );
                    in_path.remove(&b);
                    in_path.insert(better);
                    result.push(better);
                    changed = true;
                    continue;
                }
            }
            result.push(b);
        }

        result.push(path[path.len() - 1]);
        (result, changed)
    }

    /// A real tower in range of both `a` and `c` that sits closer to their midpoint and
    /// bearing than `b` does.
    fn better_middle(
        &self,
        a: usize,
        b: usize,
        c: usize,
        in_path: &HashSet<usize>,
    ) -> Option<usize> {
        let range = self.graph.link_range_km();
        let current_score = self.middle_score(a, b, c);

        (0..self.graph.len())
            .filter(|idx| !in_path.contains(idx))
            .filter(|&idx| self.graph.node(idx).kind == NodeKind::Tower)
            .filter(|&idx| {
                self.graph.distance_km(a, idx) <= range && self.graph.distance_km(idx, c) <= range
            })
            .map(|idx| (idx, self.middle_score(a, idx, c)))
            .filter(|(_, score)| *score < current_score)
            .min_by(|x, y| x.1.total_cmp(&y.1).then_with(|| x.0.cmp(&y.0)))
            .map(|(idx, _)| idx)
    }

    fn middle_score(&self, a: usize, candidate: usize, c: usize) -> f64 {
        let (a, m, c) = (
            self.graph.node(a),
            self.graph.node(candidate),
            self.graph.node(c),
        );
        let (mid_lat, mid_lon) = midpoint(a.lat, a.lon, c.lat, c.lon);
        let direct = bearing_deg(a.lat, a.lon, c.lat, c.lon);
        let inbound = bearing_delta_deg(a.bearing_to(m), direct);
        let outbound = bearing_delta_deg(m.bearing_to(c), direct);
        haversine_km(m.lat, m.lon, mid_lat, mid_lon)
            + self.config.bearing_weight * (inbound + outbound)
    }

    fn is_connected(&self, path: &[usize]) -> bool {
        let range = self.graph.link_range_km();
        path.windows(2)
            .all(|pair| self.graph.distance_km(pair[0], pair[1]) <= range)
    }
}
