//! Error types for relay-core.

use thiserror::Error;

/// Result type for planning operations.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Terminal failures of a planning request.
///
/// Per-destination failures in backbone planning are not errors; they are reported as
/// [`crate::backbone::UnreachableDestination`] values alongside the successful paths.
#[derive(Debug, Error)]
pub enum PlanError {
    /// No towers are available and the endpoints are too far apart for a direct link.
    #[error(
        "cannot create path: the direct distance between start and end points \
         ({distance_km:.2} km) exceeds the maximum allowed distance of {max_km} km, \
         and no towers are available"
    )]
    NoInventory { distance_km: f64, max_km: f64 },

    /// A produced path still contains an over-long hop after every repair attempt.
    #[error(
        "cannot complete the path: the distance between {from} and {to} ({distance_km:.2} km) \
         exceeds the maximum allowed distance of {max_km} km"
    )]
    SegmentTooLong {
        from: String,
        to: String,
        distance_km: f64,
        max_km: f64,
    },

    #[error("invalid {label} coordinate ({lat}, {lon})")]
    InvalidCoordinate {
        label: &'static str,
        lat: f64,
        lon: f64,
    },

    #[error("at least one destination is required")]
    NoDestinations,

    #[error("invalid planner configuration: {0}")]
    InvalidConfig(String),

    #[error("tower inventory unavailable: {0}")]
    Inventory(#[from] InventoryError),
}

/// Failures while loading or reading the tower inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to read tower file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse tower data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("feature {feature} has no usable coordinates")]
    MissingCoordinates { feature: usize },

    #[error("duplicate tower id {0}")]
    DuplicateId(i64),

    #[error("unsupported tower document: {0}")]
    UnsupportedFormat(String),
}
