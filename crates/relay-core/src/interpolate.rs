//! Fallback path construction when the real tower set has no connected route.
//!
//! Walks from the origin toward the goal in fixed steps, taking the best real tower near
//! each ideal step point and otherwise placing a virtual relay exactly at that point.

use crate::config::InterpolationConfig;
use crate::geo::{bearing_deg, bearing_delta_deg, destination_point, haversine_km};
use crate::graph::NetworkGraph;
use crate::models::{Node, NodeKind};
use std::collections::HashSet;

/// Largest step, as a fraction of the link range, a synthetic relay may be placed at.
/// Keeps the round trip through `destination_point` and `haversine_km` under the range.
const MAX_SYNTHETIC_STEP_FRACTION: f64 = 1.0 - 1e-6;

/// Current walk position plus what the candidate scoring needs about it.
struct Step {
    lat: f64,
    lon: f64,
    ideal: (f64, f64),
    remaining_km: f64,
}

pub struct Interpolator<'g> {
    graph: &'g NetworkGraph,
    config: &'g InterpolationConfig,
}

impl<'g> Interpolator<'g> {
    pub fn new(graph: &'g NetworkGraph, config: &'g InterpolationConfig) -> Self {
        Self { graph, config }
    }

    fn step_km(&self) -> f64 {
        self.graph.link_range_km() * self.config.step_fraction.min(MAX_SYNTHETIC_STEP_FRACTION)
    }

    /// Build a chain from `start` to `goal`. Always succeeds and always ends on the goal
    /// node itself.
    pub fn interpolate(&self, start: usize, goal: usize) -> Vec<Node> {
        let range = self.graph.link_range_km();
        let step_km = self.step_km();
        let start_node = self.graph.node(start);
        let goal_node = self.graph.node(goal);
        let direct_bearing = start_node.bearing_to(goal_node);

        let mut path = vec![start_node.clone()];
        let mut used: HashSet<usize> = HashSet::from([start, goal]);
        let (mut lat, mut lon) = (start_node.lat, start_node.lon);
        let mut virtual_count = 0usize;

        // Real towers each buy at least the minimum progress; past this cap only
        // synthetic steps remain, which advance a full step each.
        let min_progress = step_km * self.config.min_progress_fraction;
        let tower_step_cap = (start_node.distance_km(goal_node) / min_progress).ceil() as usize + 1;
        let mut steps = 0usize;

        loop {
            let remaining_km = haversine_km(lat, lon, goal_node.lat, goal_node.lon);
            if remaining_km <= range {
                break;
            }

            let heading = bearing_deg(lat, lon, goal_node.lat, goal_node.lon);
            let step = Step {
                lat,
                lon,
                ideal: destination_point(lat, lon, heading, step_km),
                remaining_km,
            };

            let tower = if steps < tower_step_cap {
                self.best_tower(&step, goal_node, direct_bearing, &used)
            } else {
                None
            };

            match tower {
                Some(idx) => {
                    let node = self.graph.node(idx);
                    lat = node.lat;
                    lon = node.lon;
                    used.insert(idx);
                    path.push(node.clone());
                }
                None => {
                    (lat, lon) = step.ideal;
                    path.push(Node::interpolated(virtual_count, lat, lon));
                    virtual_count += 1;
                }
            }
            steps += 1;
        }

        path.push(goal_node.clone());
        tracing::debug!(
            nodes = path.len(),
            virtual_nodes = virtual_count,
            "interpolated path"
        );
        path
    }

    fn best_tower(
        &self,
        step: &Step,
        goal: &Node,
        direct_bearing: f64,
        used: &HashSet<usize>,
    ) -> Option<usize> {
        let range = self.graph.link_range_km();
        let min_progress = self.step_km() * self.config.min_progress_fraction;
        let (ideal_lat, ideal_lon) = step.ideal;

        self.graph
            .nodes()
            .iter()
            .enumerate()
            .filter(|(idx, node)| node.kind == NodeKind::Tower && !used.contains(idx))
            .filter_map(|(idx, node)| {
                if haversine_km(step.lat, step.lon, node.lat, node.lon) > range {
                    return None;
                }
                let to_goal = node.distance_km(goal);
                if step.remaining_km - to_goal < min_progress {
                    return None;
                }
                let off_ideal = haversine_km(node.lat, node.lon, ideal_lat, ideal_lon);
                let deviation = bearing_delta_deg(
                    bearing_deg(step.lat, step.lon, node.lat, node.lon),
                    direct_bearing,
                );
                let score = self.config.ideal_weight * off_ideal
                    + self.config.bearing_weight * deviation
                    + self.config.remaining_weight * to_goal;
                Some((idx, score))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
            .map(|(idx, _)| idx)
    }
}
