//! Shared relay backbone from one hub (POP) to many destinations.
//!
//! Destinations are first classified by how they can be reached, then a backbone is
//! selected either greedily as a tree or as an MST-based ring (see [`crate::ring`]),
//! and finally each destination gets its own validated path through that backbone.

use crate::config::PlannerConfig;
use crate::graph::NetworkGraph;
use crate::models::{path_distance_km, Coordinate, Node, NodeKind, TowerRecord};
use crate::repair::SegmentRepairer;
use crate::ring;
use crate::router::{Router, Strategy};
use crate::validate::validate_path;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

pub const NO_TOWER_IN_RANGE: &str = "destination is not within range of any available tower";
pub const NO_RELAY_CHAIN: &str = "no relay chain connects the POP to this destination";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    #[default]
    Tree,
    Ring,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Tree => write!(f, "tree"),
            Topology::Ring => write!(f, "ring"),
        }
    }
}

impl FromStr for Topology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tree" => Ok(Topology::Tree),
            "ring" => Ok(Topology::Ring),
            other => Err(format!("unknown topology '{other}', expected tree or ring")),
        }
    }
}

/// How a destination was found to be reachable from the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReachabilityTier {
    /// Within link range of the hub itself
    Direct,
    /// One tower is in range of both the hub and the destination
    SingleRelay,
    /// Needs a multi-tower chain found by search
    FullSearch,
}

/// One decision taken while building the backbone, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ConnectionMethod {
    /// Destinations that came within range of the current selection
    DirectReach { destinations: Vec<String> },
    /// Candidate that brought the most new destinations in range
    BestCandidate { node: String, new_connections: usize },
    /// No candidate reached a new destination; moved toward the nearest one instead
    ClosestToUnconnected { node: String, distance_km: f64 },
    /// Selection could not grow any further
    GaveUp { dropped: Vec<String> },
    /// Nodes added to join a disconnected part of the selection to the hub
    Bridge { nodes: Vec<String> },
    /// Edge kept by the ring builder
    RingLink {
        from: String,
        to: String,
        distance_km: f64,
        redundant: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationPath {
    /// Position of the destination in the request
    pub index: usize,
    pub destination: Coordinate,
    pub path: Vec<Node>,
    pub tower_count: usize,
    pub distance_km: f64,
    pub tier: ReachabilityTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreachableDestination {
    pub index: usize,
    pub destination: Coordinate,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackboneStats {
    /// Distinct real towers across all returned paths
    pub unique_towers: usize,
    pub total_distance_km: f64,
    pub total_destinations: usize,
    pub reachable_destinations: usize,
    pub unreachable_destinations: usize,
    /// Real towers in the selected backbone, used or not
    pub backbone_size: usize,
    pub topology: Topology,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackboneReport {
    pub paths: Vec<DestinationPath>,
    pub unreachable: Vec<UnreachableDestination>,
    pub stats: BackboneStats,
    pub decisions: Vec<ConnectionMethod>,
}

/// Request-scoped graph and lookups shared by the tree and ring builders.
pub(crate) struct BackboneContext<'a> {
    pub graph: NetworkGraph,
    pub config: &'a PlannerConfig,
    pub hub: usize,
    /// Graph index of each requested destination, in request order
    pub destinations: Vec<usize>,
    /// Nodes usable as intermediate relays (real towers only)
    pub relays: Vec<bool>,
}

impl<'a> BackboneContext<'a> {
    pub fn new(
        hub: Coordinate,
        destinations: &[Coordinate],
        towers: &[TowerRecord],
        config: &'a PlannerConfig,
    ) -> Self {
        let mut nodes = Vec::with_capacity(1 + towers.len() + destinations.len());
        nodes.push(Node::pop(hub));
        nodes.extend(towers.iter().map(Node::from));
        nodes.extend(
            destinations
                .iter()
                .enumerate()
                .map(|(i, at)| Node::destination(i, *at)),
        );

        let graph = NetworkGraph::build(nodes, config.link_range_km);
        let relays = graph
            .nodes()
            .iter()
            .map(|node| node.kind == NodeKind::Tower)
            .collect();
        // Virtual ids cannot collide with each other, so every destination is present.
        let destinations = (0..destinations.len())
            .filter_map(|i| graph.index_of(&format!("DEST_{i}_VIRTUAL")))
            .collect();

        Self {
            graph,
            config,
            hub: 0,
            destinations,
            relays,
        }
    }

    pub fn router(&self) -> Router<'_> {
        Router::new(&self.graph, &self.config.search)
    }

    pub fn id(&self, idx: usize) -> String {
        self.graph.node(idx).id.clone()
    }

    fn classify(&self, dest: usize) -> Result<ReachabilityTier, &'static str> {
        let graph = &self.graph;
        if graph.are_linked(self.hub, dest) {
            return Ok(ReachabilityTier::Direct);
        }

        let towers_in_range: Vec<usize> = graph
            .neighbors(dest)
            .iter()
            .copied()
            .filter(|&idx| self.relays[idx])
            .collect();
        if towers_in_range.is_empty() {
            return Err(NO_TOWER_IN_RANGE);
        }
        if towers_in_range
            .iter()
            .any(|&tower| graph.are_linked(self.hub, tower))
        {
            return Ok(ReachabilityTier::SingleRelay);
        }

        self.router()
            .restricted_to(&self.relays)
            .route(Strategy::MinHop, self.hub, dest)
            .map(|_| ReachabilityTier::FullSearch)
            .ok_or(NO_RELAY_CHAIN)
    }

    /// Min-cost route through real towers only, ignoring any backbone selection.
    pub fn route_through_towers(&self, dest: usize) -> Option<Vec<usize>> {
        self.router()
            .restricted_to(&self.relays)
            .route(Strategy::MinCost, self.hub, dest)
    }

    /// Shortest link from `idx` to any member of `set` it is in range of.
    fn nearest_linked(&self, idx: usize, set: &[bool]) -> Option<f64> {
        self.graph
            .neighbors(idx)
            .iter()
            .filter(|&&n| set[n])
            .map(|&n| self.graph.distance_km(idx, n))
            .min_by(f64::total_cmp)
    }
}

/// Plan paths from `hub` to every destination over the given tower snapshot.
pub(crate) fn plan(
    hub: Coordinate,
    destinations: &[Coordinate],
    towers: &[TowerRecord],
    config: &PlannerConfig,
    topology: Topology,
) -> BackboneReport {
    let ctx = BackboneContext::new(hub, destinations, towers, config);
    let mut unreachable = Vec::new();
    let mut targets = Vec::new();

    for (index, &dest) in ctx.destinations.iter().enumerate() {
        match ctx.classify(dest) {
            Ok(tier) => targets.push((index, dest, tier)),
            Err(reason) => {
                tracing::debug!(destination = index, reason, "destination unreachable");
                unreachable.push(UnreachableDestination {
                    index,
                    destination: destinations[index],
                    reason: reason.to_string(),
                });
            }
        }
    }

    let target_nodes: Vec<usize> = targets.iter().map(|&(_, dest, _)| dest).collect();
    let mut decisions = Vec::new();
    let selection = match topology {
        Topology::Tree => {
            let (mut selected, dropped) = select_tree(&ctx, &target_nodes, &mut decisions);
            ensure_connected(&ctx, &mut selected, &mut decisions);
            if !dropped.is_empty() {
                tracing::warn!(
                    dropped = dropped.len(),
                    "greedy backbone left destinations unconnected"
                );
            }
            selected
        }
        Topology::Ring => ring::select_ring(&ctx, &target_nodes, &mut decisions),
    };

    let repairer = SegmentRepairer::new(&ctx.graph, &config.repair);
    let mut paths = Vec::with_capacity(targets.len());
    for (index, dest, tier) in targets {
        let route = match topology {
            Topology::Tree => route_tree(&ctx, dest, &selection),
            Topology::Ring => ring::route_ring(&ctx, dest, &selection),
        };
        let Some(route) = route else {
            unreachable.push(UnreachableDestination {
                index,
                destination: destinations[index],
                reason: NO_RELAY_CHAIN.to_string(),
            });
            continue;
        };

        let path = repairer.repair(ctx.graph.to_nodes(&route));
        if let Err(err) = validate_path(&path, config.link_range_km) {
            unreachable.push(UnreachableDestination {
                index,
                destination: destinations[index],
                reason: err.to_string(),
            });
            continue;
        }

        paths.push(DestinationPath {
            index,
            destination: destinations[index],
            tower_count: path.iter().filter(|node| node.kind == NodeKind::Tower).count(),
            distance_km: path_distance_km(&path),
            path,
            tier,
        });
    }
    unreachable.sort_by_key(|entry| entry.index);

    let unique_towers = paths
        .iter()
        .flat_map(|entry| entry.path.iter())
        .filter(|node| node.kind == NodeKind::Tower)
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let backbone_size = selection
        .iter()
        .enumerate()
        .filter(|&(idx, &selected)| selected && ctx.relays[idx])
        .count();
    let stats = BackboneStats {
        unique_towers,
        total_distance_km: paths.iter().map(|entry| entry.distance_km).sum(),
        total_destinations: destinations.len(),
        reachable_destinations: paths.len(),
        unreachable_destinations: unreachable.len(),
        backbone_size,
        topology,
    };

    tracing::info!(
        %topology,
        destinations = stats.total_destinations,
        reachable = stats.reachable_destinations,
        unique_towers = stats.unique_towers,
        total_distance_km = stats.total_distance_km,
        "backbone planned"
    );

    BackboneReport {
        paths,
        unreachable,
        stats,
        decisions,
    }
}

/// Greedy set-cover growth of the selection from the hub.
///
/// Returns the selection mask and any targets that could not be brought in range.
fn select_tree(
    ctx: &BackboneContext<'_>,
    targets: &[usize],
    log: &mut Vec<ConnectionMethod>,
) -> (Vec<bool>, Vec<usize>) {
    let graph = &ctx.graph;
    let mut selected = vec![false; graph.len()];
    selected[ctx.hub] = true;
    let mut pending: Vec<usize> = targets.to_vec();

    loop {
        let reached: Vec<usize> = pending
            .iter()
            .copied()
            .filter(|&dest| graph.neighbors(dest).iter().any(|&n| selected[n]))
            .collect();
        if !reached.is_empty() {
            pending.retain(|dest| !reached.contains(dest));
            log.push(ConnectionMethod::DirectReach {
                destinations: reached.iter().map(|&idx| ctx.id(idx)).collect(),
            });
        }
        if pending.is_empty() {
            return (selected, pending);
        }

        let candidates: Vec<usize> = (0..graph.len())
            .filter(|&idx| ctx.relays[idx] && !selected[idx])
            .filter(|&idx| graph.neighbors(idx).iter().any(|&n| selected[n]))
            .collect();
        // Only hit for targets the tier check would have rejected; `plan` never passes those.
        if candidates.is_empty() {
            log.push(ConnectionMethod::GaveUp {
                dropped: pending.iter().map(|&idx| ctx.id(idx)).collect(),
            });
            return (selected, pending);
        }

        // Most new destinations in range; shortest edge into the selection on ties.
        let best = candidates
            .iter()
            .filter_map(|&candidate| {
                let gain = pending
                    .iter()
                    .filter(|&&dest| graph.are_linked(candidate, dest))
                    .count();
                let edge = ctx.nearest_linked(candidate, &selected)?;
                (gain > 0).then_some((candidate, gain, edge))
            })
            .max_by(|a, b| {
                a.1.cmp(&b.1)
                    .then_with(|| b.2.total_cmp(&a.2))
                    .then_with(|| b.0.cmp(&a.0))
            });
        if let Some((node, gain, _)) = best {
            selected[node] = true;
            tracing::debug!(node = %graph.node(node).id, gain, "backbone candidate selected");
            log.push(ConnectionMethod::BestCandidate {
                node: ctx.id(node),
                new_connections: gain,
            });
            continue;
        }

        let closest = candidates
            .iter()
            .map(|&candidate| {
                let distance = pending
                    .iter()
                    .map(|&dest| graph.distance_km(candidate, dest))
                    .fold(f64::INFINITY, f64::min);
                (candidate, distance)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        if let Some((node, distance_km)) = closest {
            selected[node] = true;
            tracing::debug!(
                node = %graph.node(node).id,
                distance_km,
                "backbone advanced toward destination"
            );
            log.push(ConnectionMethod::ClosestToUnconnected {
                node: ctx.id(node),
                distance_km,
            });
        }
    }
}

/// Join every component of the selection to the hub's component.
///
/// Each round bridges one outlying component with the cheapest single unselected tower,
/// or failing that the cheapest pair of linked towers. Components that cannot be
/// bridged are left as they are.
pub(crate) fn ensure_connected(
    ctx: &BackboneContext<'_>,
    selected: &mut [bool],
    log: &mut Vec<ConnectionMethod>,
) {
    let mut unbridgeable: HashSet<usize> = HashSet::new();

    loop {
        let parts = components(ctx, selected);
        let Some(hub_component) = parts.first() else {
            return;
        };
        let Some(target) = parts[1..]
            .iter()
            .find(|component| !unbridgeable.contains(&component[0]))
        else {
            return;
        };

        let mut in_hub = vec![false; ctx.graph.len()];
        hub_component.iter().for_each(|&idx| in_hub[idx] = true);
        let mut in_target = vec![false; ctx.graph.len()];
        target.iter().for_each(|&idx| in_target[idx] = true);

        match cheapest_bridge(ctx, selected, &in_hub, &in_target) {
            Some(bridge) => {
                for &idx in &bridge {
                    selected[idx] = true;
                }
                log.push(ConnectionMethod::Bridge {
                    nodes: bridge.iter().map(|&idx| ctx.id(idx)).collect(),
                });
            }
            None => {
                tracing::warn!(
                    component_size = target.len(),
                    "backbone component cannot be bridged to the hub"
                );
                unbridgeable.insert(target[0]);
            }
        }
    }
}

/// Connected components of the selection, hub component first, each sorted ascending.
fn components(ctx: &BackboneContext<'_>, selected: &[bool]) -> Vec<Vec<usize>> {
    let graph = &ctx.graph;
    let mut seen = vec![false; graph.len()];
    let mut result = Vec::new();
    let roots = std::iter::once(ctx.hub).chain(0..graph.len());

    for root in roots {
        if !selected[root] || seen[root] {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = VecDeque::from([root]);
        seen[root] = true;
        while let Some(current) = queue.pop_front() {
            component.push(current);
            for &next in graph.neighbors(current) {
                if selected[next] && !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        component.sort_unstable();
        result.push(component);
    }
    result
}

fn cheapest_bridge(
    ctx: &BackboneContext<'_>,
    selected: &[bool],
    in_hub: &[bool],
    in_target: &[bool],
) -> Option<Vec<usize>> {
    let graph = &ctx.graph;
    let free: Vec<usize> = (0..graph.len())
        .filter(|&idx| ctx.relays[idx] && !selected[idx])
        .collect();

    let single = free
        .iter()
        .filter_map(|&idx| {
            let to_hub = ctx.nearest_linked(idx, in_hub)?;
            let to_target = ctx.nearest_linked(idx, in_target)?;
            Some((idx, to_hub + to_target))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    if let Some((idx, _)) = single {
        return Some(vec![idx]);
    }

    let mut best: Option<(usize, usize, f64)> = None;
    for &first in &free {
        let Some(to_hub) = ctx.nearest_linked(first, in_hub) else {
            continue;
        };
        for &second in graph.neighbors(first) {
            if !ctx.relays[second] || selected[second] {
                continue;
            }
            let Some(to_target) = ctx.nearest_linked(second, in_target) else {
                continue;
            };
            let cost = to_hub + graph.distance_km(first, second) + to_target;
            if best.map_or(true, |(_, _, current)| cost < current) {
                best = Some((first, second, cost));
            }
        }
    }
    best.map(|(first, second, _)| vec![first, second])
}

/// Hub → nearest selected node in range of the destination → destination.
fn route_tree(ctx: &BackboneContext<'_>, dest: usize, selected: &[bool]) -> Option<Vec<usize>> {
    let graph = &ctx.graph;
    if graph.are_linked(ctx.hub, dest) {
        return Some(vec![ctx.hub, dest]);
    }

    let anchor = graph
        .neighbors(dest)
        .iter()
        .copied()
        .filter(|&idx| selected[idx])
        .min_by(|&a, &b| {
            graph
                .distance_km(a, dest)
                .total_cmp(&graph.distance_km(b, dest))
        });
    if let Some(anchor) = anchor {
        let through_backbone = ctx
            .router()
            .restricted_to(selected)
            .route(Strategy::MinCost, ctx.hub, anchor);
        if let Some(mut route) = through_backbone {
            route.push(dest);
            return Some(route);
        }
    }

    ctx.route_through_towers(dest)
}
