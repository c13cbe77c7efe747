//! Entry points: point-to-point paths and hub-to-many backbones.

use crate::backbone::{self, BackboneReport, Topology};
use crate::config::PlannerConfig;
use crate::error::{PlanError, Result};
use crate::graph::NetworkGraph;
use crate::interpolate::Interpolator;
use crate::inventory::TowerInventory;
use crate::models::{path_distance_km, Coordinate, Node, NodeKind};
use crate::repair::SegmentRepairer;
use crate::router::{Router, Strategy};
use crate::smoothing::PathSmoother;
use crate::validate::validate_path;
use serde::{Deserialize, Serialize};

/// Which stage produced a point-to-point path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    /// Endpoints within link range of each other
    Direct,
    MinHop,
    /// Direction-biased search followed by smoothing
    DirectionBiased,
    /// No connected tower route; interpolated fallback
    Interpolated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPlan {
    pub path: Vec<Node>,
    pub strategy: RouteSource,
    pub hop_count: usize,
    pub total_distance_km: f64,
    /// Synthetic relays the operator would still need to build
    pub virtual_relays: usize,
}

impl PathPlan {
    fn new(path: Vec<Node>, strategy: RouteSource) -> Self {
        Self {
            hop_count: path.len().saturating_sub(1),
            total_distance_km: path_distance_km(&path),
            virtual_relays: path
                .iter()
                .filter(|node| node.kind == NodeKind::Interpolated)
                .count(),
            path,
            strategy,
        }
    }
}

/// Stateless planner over a read-only tower inventory.
///
/// Every call takes one fresh inventory snapshot and builds its own graph, so a single
/// planner can serve any number of concurrent callers.
pub struct Planner<I> {
    inventory: I,
    config: PlannerConfig,
}

impl<I: TowerInventory> Planner<I> {
    pub fn new(inventory: I) -> Self {
        Self::with_config(inventory, PlannerConfig::default())
    }

    pub fn with_config(inventory: I, config: PlannerConfig) -> Self {
        Self { inventory, config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Plan a relay chain between two points.
    pub fn find_path(&self, start: Coordinate, end: Coordinate) -> Result<PathPlan> {
        self.config.validate()?;
        check_coordinate("start", start)?;
        check_coordinate("end", end)?;

        let range = self.config.link_range_km;
        let start_node = Node::start(start);
        let end_node = Node::end(end);
        let direct_km = start.distance_km(&end);
        if direct_km <= range {
            tracing::info!(distance_km = direct_km, "endpoints within direct range");
            return Ok(PathPlan::new(vec![start_node, end_node], RouteSource::Direct));
        }

        let towers = self.inventory.list_towers()?;
        if towers.is_empty() {
            return Err(PlanError::NoInventory {
                distance_km: direct_km,
                max_km: range,
            });
        }

        let mut nodes = Vec::with_capacity(towers.len() + 2);
        nodes.push(start_node);
        nodes.push(end_node);
        nodes.extend(towers.iter().map(Node::from));
        let graph = NetworkGraph::build(nodes, range);
        let (start_idx, end_idx) = (0, 1);
        tracing::debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            "path graph built"
        );

        let router = Router::new(&graph, &self.config.search);
        let min_hop = router.route(Strategy::MinHop, start_idx, end_idx);
        let biased = router
            .route(Strategy::DirectionBiased, start_idx, end_idx)
            .map(|route| PathSmoother::new(&graph, &self.config.smoothing).smooth(&route));

        let (path, strategy) = match (min_hop, biased) {
            // The straighter route wins unless it needs more relays.
            (Some(hop), Some(biased)) if biased.len() <= hop.len() => {
                (graph.to_nodes(&biased), RouteSource::DirectionBiased)
            }
            (Some(hop), _) => (graph.to_nodes(&hop), RouteSource::MinHop),
            (None, Some(biased)) => (graph.to_nodes(&biased), RouteSource::DirectionBiased),
            (None, None) => {
                tracing::debug!("no connected tower route, interpolating");
                let path = Interpolator::new(&graph, &self.config.interpolation)
                    .interpolate(start_idx, end_idx);
                (path, RouteSource::Interpolated)
            }
        };

        let path = SegmentRepairer::new(&graph, &self.config.repair).repair(path);
        validate_path(&path, range)?;

        let plan = PathPlan::new(path, strategy);
        tracing::info!(
            strategy = ?plan.strategy,
            hops = plan.hop_count,
            virtual_relays = plan.virtual_relays,
            distance_km = plan.total_distance_km,
            "path planned"
        );
        Ok(plan)
    }

    /// Connect every destination to the hub through a shared set of towers.
    ///
    /// Destinations that cannot be reached are listed in the report rather than
    /// failing the call.
    pub fn find_backbone_network(
        &self,
        hub: Coordinate,
        destinations: &[Coordinate],
        topology: Topology,
    ) -> Result<BackboneReport> {
        self.config.validate()?;
        check_coordinate("POP", hub)?;
        if destinations.is_empty() {
            return Err(PlanError::NoDestinations);
        }
        for destination in destinations {
            check_coordinate("destination", *destination)?;
        }

        let towers = self.inventory.list_towers()?;
        Ok(backbone::plan(
            hub,
            destinations,
            &towers,
            &self.config,
            topology,
        ))
    }
}

fn check_coordinate(label: &'static str, at: Coordinate) -> Result<()> {
    if at.is_valid() {
        Ok(())
    } else {
        Err(PlanError::InvalidCoordinate {
            label,
            lat: at.latitude,
            lon: at.longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InventoryError;
    use crate::geo::destination_point;
    use crate::inventory::StaticInventory;
    use crate::models::TowerRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ORIGIN: (f64, f64) = (25.3790, 49.5883);

    fn east(km: f64) -> Coordinate {
        let (lat, lon) = destination_point(ORIGIN.0, ORIGIN.1, 90.0, km);
        Coordinate::new(lat, lon)
    }

    fn tower(id: i64, at: Coordinate) -> TowerRecord {
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

    struct CountingInventory {
        calls: AtomicUsize,
    }

    impl TowerInventory for CountingInventory {
        fn list_towers(&self) -> std::result::Result<Vec<TowerRecord>, InventoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct FailingInventory;

    impl TowerInventory for FailingInventory {
        fn list_towers(&self) -> std::result::Result<Vec<TowerRecord>, InventoryError> {
            Err(InventoryError::UnsupportedFormat("offline".to_string()))
        }
    }

    #[test]
    fn direct_path_skips_inventory() {
        let inventory = CountingInventory {
            calls: AtomicUsize::new(0),
        };
        let planner = Planner::new(&inventory);
        let plan = planner.find_path(east(0.0), east(3.0)).unwrap();
        assert_eq!(plan.strategy, RouteSource::Direct);
        assert_eq!(plan.hop_count, 1);
        assert_eq!(inventory.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn straight_tower_line_is_used() {
        let towers = vec![tower(1, east(8.0)), tower(2, east(16.0))];
        let planner = Planner::new(StaticInventory::new(towers));
        let plan = planner.find_path(east(0.0), east(24.0)).unwrap();
        let ids: Vec<&str> = plan.path.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids, vec!["START_VIRTUAL", "1", "2", "END_VIRTUAL"]);
        assert_eq!(plan.strategy, RouteSource::DirectionBiased);
        assert_eq!(plan.virtual_relays, 0);
        assert!((plan.total_distance_km - 24.0).abs() < 0.01);
    }

    #[test]
    fn disconnected_towers_fall_back_to_interpolation() {
        let towers = vec![tower(1, east(40.0))];
        let planner = Planner::new(StaticInventory::new(towers));
        let plan = planner.find_path(east(0.0), east(20.0)).unwrap();
        assert_eq!(plan.strategy, RouteSource::Interpolated);
        assert!(plan.virtual_relays >= 1);
        for pair in plan.path.windows(2) {
            assert!(pair[0].distance_km(&pair[1]) <= 10.1);
        }
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        let planner = Planner::new(StaticInventory::empty());
        let err = planner
            .find_path(Coordinate::new(95.0, 0.0), east(1.0))
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidCoordinate { label: "start", .. }));
    }

    #[test]
    fn inventory_failure_surfaces_as_error() {
        let planner = Planner::new(FailingInventory);
        let err = planner.find_path(east(0.0), east(30.0)).unwrap_err();
        assert!(matches!(err, PlanError::Inventory(_)));
    }

    #[test]
    fn backbone_requires_destinations() {
        let planner = Planner::new(StaticInventory::empty());
        let err = planner
            .find_backbone_network(east(0.0), &[], Topology::Tree)
            .unwrap_err();
        assert!(matches!(err, PlanError::NoDestinations));
    }

    #[test]
    fn custom_link_range_is_respected() {
        let towers = vec![tower(1, east(6.0))];
        let config = PlannerConfig::default().with_link_range(7.0);
        let planner = Planner::with_config(StaticInventory::new(towers), config);
        let plan = planner.find_path(east(0.0), east(12.0)).unwrap();
        assert_eq!(plan.path.len(), 3);
        assert_eq!(plan.path[1].id, "1");
    }
}
