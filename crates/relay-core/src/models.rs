//! Core data models for the relay planner.

use crate::geo::{bearing_deg, haversine_km};
use serde::{Deserialize, Serialize};

pub const START_ID: &str = "START_VIRTUAL";
pub const END_ID: &str = "END_VIRTUAL";
pub const POP_ID: &str = "POP_VIRTUAL";

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// A persisted relay tower as supplied by the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerRecord {
    pub id: i64,
    /// Operator site code
    #[serde(default)]
    pub site_id: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Structure height in meters
    #[serde(default)]
    pub total_height_m: Option<i32>,
    #[serde(default)]
    pub power: Option<String>,
    #[serde(default)]
    pub clutter: Option<String>,
}

impl TowerRecord {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Descriptive tower attributes carried on real nodes. The planner never reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TowerMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_height_m: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clutter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Persisted tower from the inventory
    Tower,
    /// Virtual origin of a point-to-point request
    Start,
    /// Virtual destination of a point-to-point request
    End,
    /// Virtual hub of a backbone request
    Pop,
    /// Virtual destination of a backbone request
    Destination,
    /// Synthetic relay placed by the interpolator
    Interpolated,
}

impl NodeKind {
    pub fn is_virtual(self) -> bool {
        !matches!(self, NodeKind::Tower)
    }
}

/// A graph vertex: a real tower or a virtual endpoint/relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tower: Option<TowerMetadata>,
}

impl Node {
    pub fn virtual_node(id: impl Into<String>, kind: NodeKind, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            kind,
            tower: None,
        }
    }

    pub fn start(at: Coordinate) -> Self {
        Self::virtual_node(START_ID, NodeKind::Start, at.latitude, at.longitude)
    }

    pub fn end(at: Coordinate) -> Self {
        Self::virtual_node(END_ID, NodeKind::End, at.latitude, at.longitude)
    }

    pub fn pop(at: Coordinate) -> Self {
        Self::virtual_node(POP_ID, NodeKind::Pop, at.latitude, at.longitude)
    }

    pub fn destination(index: usize, at: Coordinate) -> Self {
        Self::virtual_node(
            format!("DEST_{index}_VIRTUAL"),
            NodeKind::Destination,
            at.latitude,
            at.longitude,
        )
    }

    pub fn interpolated(index: usize, lat: f64, lon: f64) -> Self {
        Self::virtual_node(format!("VIRTUAL_{index}"), NodeKind::Interpolated, lat, lon)
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    pub fn is_virtual(&self) -> bool {
        self.kind.is_virtual()
    }

    pub fn distance_km(&self, other: &Node) -> f64 {
        haversine_km(self.lat, self.lon, other.lat, other.lon)
    }

    pub fn bearing_to(&self, other: &Node) -> f64 {
        bearing_deg(self.lat, self.lon, other.lat, other.lon)
    }

    /// Human-readable label used in validation errors.
    pub fn describe(&self) -> String {
        match self.kind {
            NodeKind::Start => "start".to_string(),
            NodeKind::End | NodeKind::Destination => "destination".to_string(),
            NodeKind::Pop => "POP".to_string(),
            NodeKind::Interpolated => format!("virtual relay {}", self.id),
            NodeKind::Tower => {
                let label = self
                    .tower
                    .as_ref()
                    .and_then(|meta| meta.site_id.as_deref())
                    .unwrap_or(&self.id);
                format!("tower {label}")
            }
        }
    }
}

impl From<&TowerRecord> for Node {
    fn from(record: &TowerRecord) -> Self {
        Self {
            id: record.id.to_string(),
            lat: record.latitude,
            lon: record.longitude,
            kind: NodeKind::Tower,
            tower: Some(TowerMetadata {
                site_id: record.site_id.clone(),
                site_name: record.site_name.clone(),
                total_height_m: record.total_height_m,
                power: record.power.clone(),
                clutter: record.clutter.clone(),
            }),
        }
    }
}

/// Total length of a node sequence, summing consecutive hops.
pub fn path_distance_km(path: &[Node]) -> f64 {
    crate::geo::path_distance_km(path.iter().map(|node| (node.lat, node.lon)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tower(id: i64, site_id: Option<&str>) -> TowerRecord {
        TowerRecord {
            id,
            site_id: site_id.map(str::to_string),
            site_name: Some("Site".to_string()),
            latitude: 25.38,
            longitude: 49.59,
            total_height_m: Some(42),
            power: Some("AC".to_string()),
            clutter: Some("Urban".to_string()),
        }
    }

    #[test]
    fn tower_nodes_keep_metadata() {
        let node = Node::from(&tower(7, Some("HOF-0007")));
        assert_eq!(node.id, "7");
        assert_eq!(node.kind, NodeKind::Tower);
        assert!(!node.is_virtual());
        assert_eq!(node.tower.as_ref().and_then(|m| m.total_height_m), Some(42));
    }

    #[test]
    fn describe_labels_by_kind() {
        let at = Coordinate::new(25.0, 49.0);
        assert_eq!(Node::start(at).describe(), "start");
        assert_eq!(Node::end(at).describe(), "destination");
        assert_eq!(Node::destination(2, at).describe(), "destination");
        assert_eq!(Node::pop(at).describe(), "POP");
        assert_eq!(Node::from(&tower(7, Some("HOF-0007"))).describe(), "tower HOF-0007");
        assert_eq!(Node::from(&tower(9, None)).describe(), "tower 9");
    }

    #[test]
    fn coordinate_validation() {
        assert!(Coordinate::new(25.379, 49.5883).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn coordinate_accepts_short_field_names() {
        let parsed: Coordinate = serde_json::from_str(r#"{"lat": 25.1, "lng": 49.2}"#).unwrap();
        assert_eq!(parsed, Coordinate::new(25.1, 49.2));
        let parsed: Coordinate =
            serde_json::from_str(r#"{"latitude": 25.1, "longitude": 49.2}"#).unwrap();
        assert_eq!(parsed, Coordinate::new(25.1, 49.2));
    }

    #[test]
    fn virtual_ids_are_distinct() {
        let at = Coordinate::new(25.0, 49.0);
        assert_ne!(Node::destination(0, at).id, Node::destination(1, at).id);
        assert_ne!(Node::interpolated(0, 25.0, 49.0).id, Node::start(at).id);
    }
}
