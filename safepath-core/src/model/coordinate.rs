//! Coordinate validation and the `{lat, lng}` exchange record

use geo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is not a finite value in [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is not a finite value in [-180, 180]")]
    Longitude(f64),
}

/// Builds a `geo` point (`x` = longitude, `y` = latitude) after checking
/// that both values are finite and inside their valid ranges.
pub fn checked_point(lat: f64, lon: f64) -> Result<Point<f64>, CoordinateError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(CoordinateError::Latitude(lat));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(CoordinateError::Longitude(lon));
    }
    Ok(Point::new(lon, lat))
}

/// Coordinate record consumed directly by map front-ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<Point<f64>> for LatLng {
    fn from(point: Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lng: point.x(),
        }
    }
}

impl From<LatLng> for Point<f64> {
    fn from(value: LatLng) -> Self {
        Point::new(value.lng, value.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundaries() {
        assert!(checked_point(90.0, 180.0).is_ok());
        assert!(checked_point(-90.0, -180.0).is_ok());
    }

    #[test]
    fn point_uses_lon_lat_order() {
        let p = checked_point(43.65, -79.38).unwrap();
        assert_eq!(p.x(), -79.38);
        assert_eq!(p.y(), 43.65);
    }

    #[test]
    fn rejects_out_of_range_and_non_finite() {
        assert_eq!(checked_point(90.5, 0.0), Err(CoordinateError::Latitude(90.5)));
        assert_eq!(
            checked_point(0.0, -180.1),
            Err(CoordinateError::Longitude(-180.1))
        );
        assert!(checked_point(f64::NAN, 0.0).is_err());
        assert!(checked_point(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn lat_lng_round_trips_through_point() {
        let record = LatLng {
            lat: 43.6534,
            lng: -79.3832,
        };
        let point: Point<f64> = record.into();
        assert_eq!(LatLng::from(point), record);
    }
}
