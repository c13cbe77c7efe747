//! Ring topology: minimum spanning tree over hub and destinations, plus a few
//! redundant destination-to-destination links.

use crate::backbone::{BackboneContext, ConnectionMethod};
use crate::router::Strategy;

/// Candidate ring edge between two terminals, with the relay path that realizes it.
struct TerminalLink {
    a: usize,
    b: usize,
    cost_km: f64,
    route: Vec<usize>,
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Merge the sets of `a` and `b`; false when they were already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Select the ring network and return its membership mask over the context graph.
///
/// Terminal 0 is the hub; terminals 1.. are the reachable destinations.
pub(crate) fn select_ring(
    ctx: &BackboneContext<'_>,
    targets: &[usize],
    log: &mut Vec<ConnectionMethod>,
) -> Vec<bool> {
    let terminals: Vec<usize> = std::iter::once(ctx.hub)
        .chain(targets.iter().copied())
        .collect();

    let mut links = Vec::new();
    for a in 0..terminals.len() {
        for b in (a + 1)..terminals.len() {
            let route = ctx
                .router()
                .restricted_to(&ctx.relays)
                .route(Strategy::MinCost, terminals[a], terminals[b]);
            if let Some(route) = route {
                let cost_km = ctx.router().path_cost(&route);
                links.push(TerminalLink {
                    a,
                    b,
                    cost_km,
                    route,
                });
            }
        }
    }
    links.sort_by(|x, y| {
        x.cost_km
            .total_cmp(&y.cost_km)
            .then_with(|| (x.a, x.b).cmp(&(y.a, y.b)))
    });

    let mut sets = DisjointSet::new(terminals.len());
    let mut in_tree = vec![false; links.len()];
    let mut tree_edges = 0;
    for (i, link) in links.iter().enumerate() {
        if tree_edges + 1 >= terminals.len() {
            break;
        }
        if sets.union(link.a, link.b) {
            in_tree[i] = true;
            tree_edges += 1;
        }
    }

    let extra = ctx.config.ring.extra_edges(targets.len());
    let redundant: Vec<usize> = (0..links.len())
        .filter(|&i| !in_tree[i] && links[i].a != 0)
        .take(extra)
        .collect();
    tracing::debug!(
        terminals = terminals.len(),
        tree_edges,
        redundant = redundant.len(),
        "ring edges chosen"
    );

    let mut selected = vec![false; ctx.graph.len()];
    selected[ctx.hub] = true;
    let kept = (0..links.len())
        .filter(|&i| in_tree[i])
        .map(|i| (i, false))
        .chain(redundant.into_iter().map(|i| (i, true)));
    for (i, is_redundant) in kept {
        let link = &links[i];
        for &idx in &link.route {
            selected[idx] = true;
        }
        log.push(ConnectionMethod::RingLink {
            from: ctx.id(terminals[link.a]),
            to: ctx.id(terminals[link.b]),
            distance_km: link.cost_km,
            redundant: is_redundant,
        });
    }
    selected
}

/// Min-cost hub-to-destination route confined to the ring's node set.
pub(crate) fn route_ring(
    ctx: &BackboneContext<'_>,
    dest: usize,
    selected: &[bool],
) -> Option<Vec<usize>> {
    if selected[dest] {
        let confined = ctx
            .router()
            .restricted_to(selected)
            .route(Strategy::MinCost, ctx.hub, dest);
        if confined.is_some() {
            return confined;
        }
    }
    ctx.route_through_towers(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backbone::{plan, Topology};
    use crate::config::PlannerConfig;
    use crate::geo::destination_point;
    use crate::models::{Coordinate, TowerRecord};

    fn offset(east_km: f64, north_km: f64) -> Coordinate {
        let (lat, lon) = destination_point(25.0, 49.0, 90.0, east_km);
        let (lat, lon) = destination_point(lat, lon, 0.0, north_km);
        Coordinate::new(lat, lon)
    }

    fn tower(id: i64, east_km: f64, north_km: f64) -> TowerRecord {
        let at = offset(east_km, north_km);
        TowerRecord {
            id,
            site_id: None,
            site_name: None,
            latitude: at.latitude,
            longitude: at.longitude,
            total_height_m: None,
            power: None,
            clutter: None,
        }
    }

    fn ring_links(decisions: &[ConnectionMethod]) -> Vec<(&str, &str, bool)> {
        decisions
            .iter()
            .filter_map(|decision| match decision {
                ConnectionMethod::RingLink {
                    from,
                    to,
                    redundant,
                    ..
                } => Some((from.as_str(), to.as_str(), *redundant)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn disjoint_set_merges_once() {
        let mut sets = DisjointSet::new(4);
        assert!(sets.union(0, 1));
        assert!(sets.union(2, 3));
        assert!(sets.union(1, 3));
        assert!(!sets.union(0, 2));
        assert_eq!(sets.find(0), sets.find(3));
    }

    #[test]
    fn spanning_tree_plus_one_redundant_link() {
        let config = PlannerConfig::default();
        let destinations = vec![offset(6.0, 0.0), offset(0.0, 6.0), offset(-7.0, 0.0)];
        let report = plan(offset(0.0, 0.0), &destinations, &[], &config, Topology::Ring);

        let links = ring_links(&report.decisions);
        assert_eq!(links.iter().filter(|link| !link.2).count(), 3);
        assert_eq!(
            links.iter().filter(|link| link.2).collect::<Vec<_>>(),
            vec![&("DEST_0_VIRTUAL", "DEST_1_VIRTUAL", true)]
        );
        assert_eq!(report.paths.len(), 3);
        assert!(report.paths.iter().all(|entry| entry.path.len() == 2));
        assert_eq!(report.stats.topology, Topology::Ring);
    }

    #[test]
    fn ring_paths_run_through_relay_towers() {
        let config = PlannerConfig::default();
        let towers = vec![tower(1, 10.0, 0.0), tower(2, 0.0, 10.0)];
        let destinations = vec![offset(20.0, 0.0), offset(0.0, 20.0)];
        let report = plan(offset(0.0, 0.0), &destinations, &towers, &config, Topology::Ring);

        assert!(report.unreachable.is_empty());
        let ids: Vec<Vec<&str>> = report
            .paths
            .iter()
            .map(|entry| entry.path.iter().map(|node| node.id.as_str()).collect())
            .collect();
        assert_eq!(ids[0], vec!["POP_VIRTUAL", "1", "DEST_0_VIRTUAL"]);
        assert_eq!(ids[1], vec!["POP_VIRTUAL", "2", "DEST_1_VIRTUAL"]);
        assert_eq!(report.stats.unique_towers, 2);
        assert_eq!(report.stats.backbone_size, 2);
        assert!(ring_links(&report.decisions).iter().all(|link| !link.2));
    }
}
