//! Relay CLI - offline planning against a tower file.
//!
//! Provides the argument parsing shared by the `relay-plan` binary.

use relay_core::{Coordinate, PlannerConfig, StaticInventory};
use std::path::Path;

/// Parse a `lat,lon` pair as given on the command line.
pub fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected 'lat,lon', got '{raw}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;
    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(format!("coordinate out of range: {lat},{lon}"));
    }
    Ok(coordinate)
}

/// Load towers from `path`, or an empty inventory when no file is given.
pub fn load_inventory(path: Option<&Path>) -> anyhow::Result<StaticInventory> {
    match path {
        Some(path) => Ok(StaticInventory::load_from_path(path)?),
        None => Ok(StaticInventory::empty()),
    }
}

pub fn planner_config(link_range_km: Option<f64>) -> PlannerConfig {
    match link_range_km {
        Some(range) => PlannerConfig::default().with_link_range(range),
        None => PlannerConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lon_pairs() {
        let at = parse_coordinate("25.3790, 49.5883").unwrap();
        assert_eq!(at, Coordinate::new(25.3790, 49.5883));
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(parse_coordinate("25.3790").is_err());
        assert!(parse_coordinate("north,49.5").is_err());
        assert!(parse_coordinate("95.0,49.5").is_err());
    }

    #[test]
    fn link_range_override() {
        assert_eq!(planner_config(Some(8.0)).link_range_km, 8.0);
        assert_eq!(planner_config(None).link_range_km, 10.1);
    }
}
