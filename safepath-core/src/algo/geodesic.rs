//! Great-circle distance on a spherical Earth

use geo::Point;

/// Earth radius in meters used by every distance in the crate
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two points.
///
/// Points follow the `geo` convention: `x` is longitude and `y` is latitude,
/// both in degrees. The result is symmetric, never negative and zero for
/// identical points.
pub fn haversine_distance(a: &Point<f64>, b: &Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let dlat = (b.y() - a.y()).to_radians();
    let dlon = (b.x() - a.x()).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    // rounding may push h slightly above 1 for near-antipodal points
    2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Position of `point` on the unit sphere (earth-centered, earth-fixed axes).
///
/// Chord length between two such vectors grows strictly with the
/// great-circle distance, so Euclidean nearest-neighbor queries over them
/// agree with [`haversine_distance`].
pub fn unit_vector(point: &Point<f64>) -> [f64; 3] {
    let lat = point.y().to_radians();
    let lon = point.x().to_radians();
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}
