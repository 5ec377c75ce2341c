//! Great-circle distance math.
//!
//! The haversine distance below is the single distance computation used by
//! the whole engine. Radius comparisons always run on the full-precision
//! value; [`display_km`] exists only for notification payloads.

use crate::models::Position;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two positions in kilometers.
///
/// Pure and total: identical points yield exactly 0.0.
pub fn distance_km(a: Position, b: Position) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Distance in meters, for the vendor move threshold.
pub fn distance_meters(a: Position, b: Position) -> f64 {
    distance_km(a, b) * 1000.0
}

/// Round a distance to one decimal for display in notification payloads.
pub fn display_km(d: f64) -> f64 {
    (d * 10.0).round() / 10.0
}
