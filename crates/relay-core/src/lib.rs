pub mod backbone;
pub mod config;
pub mod error;
pub mod geo;
pub mod graph;
pub mod interpolate;
pub mod inventory;
pub mod models;
pub mod planner;
pub mod repair;
pub mod ring;
pub mod router;
pub mod smoothing;
pub mod validate;

pub use backbone::{
    BackboneReport, BackboneStats, ConnectionMethod, DestinationPath, ReachabilityTier, Topology,
    UnreachableDestination,
};
pub use config::{
    InterpolationConfig, PlannerConfig, RepairConfig, RingConfig, SearchWeights, SmoothingConfig,
    DEFAULT_LINK_RANGE_KM,
};
pub use error::{InventoryError, PlanError, Result};
pub use geo::{bearing_deg, destination_point, haversine_km};
pub use graph::NetworkGraph;
pub use inventory::{parse_towers, StaticInventory, TowerInventory};
pub use models::{Coordinate, Node, NodeKind, TowerMetadata, TowerRecord};
pub use planner::{PathPlan, Planner, RouteSource};
pub use router::{Router, Strategy};
