//! Read-only tower inventory and the file formats it loads from.
//!
//! The planner takes a single snapshot per request through [`TowerInventory`]; any
//! store that can list its towers can back it.

use crate::error::InventoryError;
use crate::models::TowerRecord;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Source of real towers. Must tolerate concurrent readers.
pub trait TowerInventory: Send + Sync {
    fn list_towers(&self) -> Result<Vec<TowerRecord>, InventoryError>;
}

impl<T: TowerInventory + ?Sized> TowerInventory for Arc<T> {
    fn list_towers(&self) -> Result<Vec<TowerRecord>, InventoryError> {
        (**self).list_towers()
    }
}

impl<T: TowerInventory + ?Sized> TowerInventory for &T {
    fn list_towers(&self) -> Result<Vec<TowerRecord>, InventoryError> {
        (**self).list_towers()
    }
}

/// Fixed tower list held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    towers: Vec<TowerRecord>,
}

impl StaticInventory {
    pub fn new(towers: Vec<TowerRecord>) -> Self {
        Self { towers }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a GeoJSON `FeatureCollection` or a JSON array of tower records.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let towers = parse_towers(&raw)?;
        tracing::info!(
            path = %path.as_ref().display(),
            towers = towers.len(),
            "loaded tower inventory"
        );
        Ok(Self::new(towers))
    }

    pub fn towers(&self) -> &[TowerRecord] {
        &self.towers
    }

    pub fn len(&self) -> usize {
        self.towers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.towers.is_empty()
    }
}

impl TowerInventory for StaticInventory {
    fn list_towers(&self) -> Result<Vec<TowerRecord>, InventoryError> {
        Ok(self.towers.clone())
    }
}

/// Parse either supported document shape, detected from the top-level JSON value.
pub fn parse_towers(raw: &str) -> Result<Vec<TowerRecord>, InventoryError> {
    let value: Value = serde_json::from_str(raw)?;
    if value.is_array() {
        return parse_record_array(value);
    }
    if value.get("features").is_some() {
        return parse_geojson(value);
    }
    if value.is_object() {
        return Err(InventoryError::UnsupportedFormat(
            "expected a FeatureCollection or an array of towers".to_string(),
        ));
    }
    Err(InventoryError::UnsupportedFormat(format!(
        "unexpected top-level value {value}"
    )))
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: SiteProperties,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Default, Deserialize)]
struct SiteProperties {
    #[serde(rename = "Tawal_ID")]
    site_id: Option<String>,
    #[serde(rename = "Site_Name")]
    site_name: Option<String>,
    #[serde(rename = "Lat")]
    lat: Option<f64>,
    #[serde(rename = "Long")]
    lon: Option<f64>,
    #[serde(rename = "Total_Height")]
    total_height: Option<f64>,
    #[serde(rename = "Power")]
    power: Option<String>,
    #[serde(rename = "Clutter")]
    clutter: Option<String>,
}

/// GeoJSON positions are `[lon, lat]` or `[lon, lat, elevation]`.
#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

fn parse_geojson(value: Value) -> Result<Vec<TowerRecord>, InventoryError> {
    let collection: FeatureCollection = serde_json::from_value(value)?;
    let mut towers = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let position = feature
            .geometry
            .as_ref()
            .filter(|geometry| geometry.coordinates.len() >= 2)
            .map(|geometry| (geometry.coordinates[1], geometry.coordinates[0]));
        let props = feature.properties;
        let latitude = props.lat.or(position.map(|(lat, _)| lat));
        let longitude = props.lon.or(position.map(|(_, lon)| lon));
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err(InventoryError::MissingCoordinates { feature: index });
        };

        towers.push(TowerRecord {
            id: index as i64 + 1,
            site_id: props.site_id,
            site_name: props.site_name,
            latitude,
            longitude,
            total_height_m: props.total_height.map(|height| height.round() as i32),
            power: props.power,
            clutter: props.clutter,
        });
    }
    Ok(towers)
}

#[derive(Debug, Deserialize)]
struct TowerEntry {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    site_id: Option<String>,
    #[serde(default)]
    site_name: Option<String>,
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    longitude: f64,
    #[serde(default)]
    total_height_m: Option<i32>,
    #[serde(default)]
    power: Option<String>,
    #[serde(default)]
    clutter: Option<String>,
}

fn parse_record_array(value: Value) -> Result<Vec<TowerRecord>, InventoryError> {
    let entries: Vec<TowerEntry> = serde_json::from_value(value)?;
    let mut seen = HashSet::with_capacity(entries.len());
    let mut towers = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let id = entry.id.unwrap_or(index as i64 + 1);
        if !seen.insert(id) {
            return Err(InventoryError::DuplicateId(id));
        }
        towers.push(TowerRecord {
            id,
            site_id: entry.site_id,
            site_name: entry.site_name,
            latitude: entry.latitude,
            longitude: entry.longitude,
            total_height_m: entry.total_height_m,
            power: entry.power,
            clutter: entry.clutter,
        });
    }
    Ok(towers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {
                    "Tawal_ID": "HOF-0001",
                    "Site_Name": "Al Mubarraz North",
                    "Lat": 25.4101,
                    "Long": 49.5802,
                    "Total_Height": 42.4,
                    "Power": "Grid",
                    "Clutter": "Urban"
                },
                "geometry": {"type": "Point", "coordinates": [49.58, 25.41, 160.0]}
            },
            {
                "type": "Feature",
                "properties": {"Tawal_ID": "HOF-0002"},
                "geometry": {"type": "Point", "coordinates": [49.61, 25.35, 150.0]}
            }
        ]
    }"#;

    #[test]
    fn parses_geojson_properties_and_geometry_fallback() {
        let towers = parse_towers(GEOJSON).unwrap();
        assert_eq!(towers.len(), 2);

        assert_eq!(towers[0].id, 1);
        assert_eq!(towers[0].site_id.as_deref(), Some("HOF-0001"));
        assert_eq!(towers[0].latitude, 25.4101);
        assert_eq!(towers[0].longitude, 49.5802);
        assert_eq!(towers[0].total_height_m, Some(42));

        assert_eq!(towers[1].id, 2);
        assert_eq!(towers[1].latitude, 25.35);
        assert_eq!(towers[1].longitude, 49.61);
        assert_eq!(towers[1].site_name, None);
    }

    #[test]
    fn feature_without_position_is_rejected() {
        let raw =
            r#"{"type": "FeatureCollection", "features": [{"properties": {"Tawal_ID": "X"}}]}"#;
        assert!(matches!(
            parse_towers(raw),
            Err(InventoryError::MissingCoordinates { feature: 0 })
        ));
    }

    #[test]
    fn parses_record_array_with_optional_ids() {
        let raw = r#"[
            {"id": 10, "latitude": 25.38, "longitude": 49.59, "site_name": "Hub"},
            {"lat": 25.36, "lng": 49.60}
        ]"#;
        let towers = parse_towers(raw).unwrap();
        assert_eq!(towers[0].id, 10);
        assert_eq!(towers[0].site_name.as_deref(), Some("Hub"));
        assert_eq!(towers[1].id, 2);
        assert_eq!(towers[1].longitude, 49.60);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = r#"[
            {"id": 3, "latitude": 25.0, "longitude": 49.0},
            {"id": 3, "latitude": 25.1, "longitude": 49.1}
        ]"#;
        assert!(matches!(parse_towers(raw), Err(InventoryError::DuplicateId(3))));
    }

    #[test]
    fn unsupported_documents_are_rejected() {
        assert!(matches!(
            parse_towers(r#"{"towers": []}"#),
            Err(InventoryError::UnsupportedFormat(_))
        ));
        assert!(matches!(parse_towers("42"), Err(InventoryError::UnsupportedFormat(_))));
        assert!(matches!(parse_towers("not json"), Err(InventoryError::Parse(_))));
    }

    #[test]
    fn shared_inventory_lists_through_arc() {
        let inventory: Arc<dyn TowerInventory> = Arc::new(StaticInventory::new(
            parse_towers(GEOJSON).unwrap(),
        ));
        assert_eq!(inventory.list_towers().unwrap().len(), 2);
        assert!(StaticInventory::empty().list_towers().unwrap().is_empty());
    }

    #[test]
    fn loads_inventory_file() {
        let path =
            std::env::temp_dir().join(format!("relay-towers-{}.geojson", std::process::id()));
        std::fs::write(&path, GEOJSON).unwrap();
        let inventory = StaticInventory::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(inventory.len(), 2);
        assert!(matches!(
            StaticInventory::load_from_path(path.with_extension("missing")),
            Err(InventoryError::Io(_))
        ));
    }
}
