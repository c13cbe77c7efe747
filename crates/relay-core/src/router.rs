//! Route search over a [`NetworkGraph`].
//!
//! One router, three interchangeable strategies sharing the same contract: an index
//! path from `start` to `goal`, or `None` when the goal is not reachable through
//! in-range hops.

use crate::config::SearchWeights;
use crate::geo::bearing_delta_deg;
use crate::graph::NetworkGraph;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Breadth-first: fewest hops, straighter branch on ties
    MinHop,
    /// Dijkstra: least total geodesic distance
    MinCost,
    /// A*-like search favouring a visually direct route
    DirectionBiased,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    idx: usize,
    g_score: FloatOrd,
    f_score: FloatOrd,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| self.idx.cmp(&other.idx))
    }
}

pub struct Router<'g> {
    graph: &'g NetworkGraph,
    weights: &'g SearchWeights,
    allowed: Option<&'g [bool]>,
}

impl<'g> Router<'g> {
    pub fn new(graph: &'g NetworkGraph, weights: &'g SearchWeights) -> Self {
        Self {
            graph,
            weights,
            allowed: None,
        }
    }

    /// Confine intermediate hops to nodes flagged in `allowed`.
    ///
    /// The start and goal of a query are always usable regardless of the mask.
    pub fn restricted_to(mut self, allowed: &'g [bool]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn route(&self, strategy: Strategy, start: usize, goal: usize) -> Option<Vec<usize>> {
        if start == goal {
            return Some(vec![start]);
        }
        match strategy {
            Strategy::MinHop => self.min_hop(start, goal),
            Strategy::MinCost => self.min_cost(start, goal),
            Strategy::DirectionBiased => self.direction_biased(start, goal),
        }
    }

    /// Total geodesic length of an index path.
    pub fn path_cost(&self, path: &[usize]) -> f64 {
        path.windows(2)
            .map(|pair| self.graph.distance_km(pair[0], pair[1]))
            .sum()
    }

    fn usable(&self, idx: usize, start: usize, goal: usize) -> bool {
        idx == start
            || idx == goal
            || self
                .allowed
                .map_or(true, |mask| mask.get(idx).copied().unwrap_or(false))
    }

    fn min_hop(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        let n = self.graph.len();
        let mut visited = vec![false; n];
        let mut previous: Vec<Option<usize>> = vec![None; n];
        let mut queue = VecDeque::new();
        visited[start] = true;
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                break;
            }
            let mut next: Vec<usize> = self
                .graph
                .neighbors(current)
                .iter()
                .copied()
                .filter(|&idx| !visited[idx] && self.usable(idx, start, goal))
                .collect();
            // Straighter branches first so equal-length paths lean toward the goal.
            next.sort_by(|&a, &b| {
                self.graph
                    .distance_km(a, goal)
                    .total_cmp(&self.graph.distance_km(b, goal))
                    .then_with(|| a.cmp(&b))
            });
            for idx in next {
                visited[idx] = true;
                previous[idx] = Some(current);
                queue.push_back(idx);
            }
        }

        if !visited[goal] {
            return None;
        }
        Some(reconstruct(&previous, goal))
    }

    fn min_cost(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        let n = self.graph.len();
        let mut distance = vec![f64::INFINITY; n];
        let mut previous: Vec<Option<usize>> = vec![None; n];
        let mut settled = vec![false; n];
        let mut heap: BinaryHeap<Reverse<(FloatOrd, usize)>> = BinaryHeap::new();
        distance[start] = 0.0;
        heap.push(Reverse((FloatOrd(0.0), start)));

        while let Some(Reverse((FloatOrd(cost), current))) = heap.pop() {
            if settled[current] {
                continue;
            }
            if current == goal {
                break;
            }
            settled[current] = true;

            for &next in self.graph.neighbors(current) {
                if settled[next] || !self.usable(next, start, goal) {
                    continue;
                }
                let candidate = cost + self.graph.distance_km(current, next);
                if candidate < distance[next] {
                    distance[next] = candidate;
                    previous[next] = Some(current);
                    heap.push(Reverse((FloatOrd(candidate), next)));
                }
            }
        }

        if !distance[goal].is_finite() {
            return None;
        }
        Some(reconstruct(&previous, goal))
    }

    fn direction_biased(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        let n = self.graph.len();
        let weights = self.weights;
        let ideal_bearing = self
            .graph
            .node(start)
            .bearing_to(self.graph.node(goal));

        let mut g_score = vec![f64::INFINITY; n];
        let mut came_from: Vec<Option<usize>> = vec![None; n];
        let mut closed = vec![false; n];
        let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();

        g_score[start] = 0.0;
        open_set.push(Reverse(OpenNode {
            idx: start,
            g_score: FloatOrd(0.0),
            f_score: FloatOrd(weights.goal_weight * self.graph.distance_km(start, goal)),
        }));

        let mut found = false;
        while let Some(Reverse(current)) = open_set.pop() {
            let idx = current.idx;
            if closed[idx] || current.g_score.0 > g_score[idx] + 1e-9 {
                continue;
            }
            if idx == goal {
                found = true;
                break;
            }
            closed[idx] = true;

            let current_node = self.graph.node(idx);
            let current_to_goal = self.graph.distance_km(idx, goal);
            for &next in self.graph.neighbors(idx) {
                if closed[next] || !self.usable(next, start, goal) {
                    continue;
                }
                let next_to_goal = self.graph.distance_km(next, goal);
                // Prune excursions that wander away from the goal.
                if next_to_goal > current_to_goal + weights.excursion_allowance_km {
                    continue;
                }

                let tentative_g = g_score[idx] + self.graph.distance_km(idx, next);
                if tentative_g < g_score[next] {
                    g_score[next] = tentative_g;
                    came_from[next] = Some(idx);
                    let hop_bearing = current_node.bearing_to(self.graph.node(next));
                    let deviation = bearing_delta_deg(hop_bearing, ideal_bearing);
                    let f_score = tentative_g
                        + weights.goal_weight * next_to_goal
                        + weights.bearing_weight * deviation;
                    open_set.push(Reverse(OpenNode {
                        idx: next,
                        g_score: FloatOrd(tentative_g),
                        f_score: FloatOrd(f_score),
                    }));
                }
            }
        }

        if !found {
            return None;
        }
        Some(reconstruct(&came_from, goal))
    }
}

fn reconstruct(previous: &[Option<usize>], goal: usize) -> Vec<usize> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(prev) = previous[current] {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
