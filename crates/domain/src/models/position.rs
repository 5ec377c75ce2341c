//! Geographic position.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair.
///
/// A position is either fully present or fully absent; partial coordinates
/// never exist in the domain. Construction validates the ranges, so any
/// `Position` value carries usable coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    /// Build a validated position. Returns `None` for out-of-range or
    /// non-finite coordinates.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }

    /// Build a position from optional coordinates, treating a missing half
    /// as a missing whole.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Self::new(lat, lng),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_position() {
        let p = Position::new(48.15, 17.11).unwrap();
        assert_eq!(p.lat, 48.15);
        assert_eq!(p.lng, 17.11);
    }

    #[test]
    fn test_range_bounds_inclusive() {
        assert!(Position::new(90.0, 180.0).is_some());
        assert!(Position::new(-90.0, -180.0).is_some());
        assert!(Position::new(90.01, 0.0).is_none());
        assert!(Position::new(0.0, -180.01).is_none());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(Position::new(f64::NAN, 0.0).is_none());
        assert!(Position::new(0.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_from_parts_requires_both() {
        assert!(Position::from_parts(Some(1.0), Some(2.0)).is_some());
        assert!(Position::from_parts(Some(1.0), None).is_none());
        assert!(Position::from_parts(None, Some(2.0)).is_none());
        assert!(Position::from_parts(None, None).is_none());
    }

    #[test]
    fn test_serde_round_trip() {
        let p = Position::new(-33.86, 151.21).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
