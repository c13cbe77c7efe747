//! Great-circle math used by graph construction, routing and interpolation.
//!
//! Everything here works on a spherical earth of radius [`EARTH_RADIUS_KM`].
//! Distances are kilometers, bearings are compass degrees (0 = north, 90 = east).

/// Mean earth radius used by every distance and projection in the planner.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Calculate distance between two points in kilometers using the Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in kilometers
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial compass bearing from point 1 to point 2, in degrees within `[0, 360)`.
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    normalize_bearing(x.atan2(y).to_degrees())
}

/// Smallest absolute angle between two bearings, in degrees within `[0, 180]`.
pub fn bearing_delta_deg(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs().rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Project a point along a bearing for a given distance.
///
/// # Arguments
/// * `lat`, `lon` - Starting position in degrees
/// * `bearing` - Compass bearing in degrees
/// * `distance_km` - Distance in kilometers
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn destination_point(lat: f64, lon: f64, bearing: f64, distance_km: f64) -> (f64, f64) {
    if distance_km.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let bearing_rad = bearing.to_radians();
    let angular_distance = distance_km / EARTH_RADIUS_KM;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}

/// Great-circle midpoint between two points.
pub fn midpoint(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> (f64, f64) {
    let distance = haversine_km(lat1, lon1, lat2, lon2);
    let heading = bearing_deg(lat1, lon1, lat2, lon2);
    destination_point(lat1, lon1, heading, distance / 2.0)
}

/// Sum of consecutive great-circle hops over a coordinate sequence.
pub fn path_distance_km<I>(points: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut total = 0.0;
    let mut previous: Option<(f64, f64)> = None;
    for (lat, lon) in points {
        if let Some((prev_lat, prev_lon)) = previous {
            total += haversine_km(prev_lat, prev_lon, lat, lon);
        }
        previous = Some((lat, lon));
    }
    total
}

fn normalize_bearing(deg: f64) -> f64 {
    let value = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if value >= 360.0 {
        0.0
    } else {
        value
    }
}
