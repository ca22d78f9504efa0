use geo::LineString;
use geojson::{Feature, Geometry, Value as GeoJsonValue};
use serde_json::json;

use super::RoutePath;
use crate::Error;

impl RoutePath {
    /// `LineString` of the node coordinates, `[lng, lat]` per position
    pub fn line_string(&self) -> LineString<f64> {
        self.coordinates.iter().map(|point| point.0).collect()
    }

    /// Converts the route to a `GeoJSON` `Feature` with a `LineString`
    /// geometry and the route summary as properties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GeoJsonError`] if the feature cannot be assembled.
    pub fn to_geojson(&self) -> Result<Feature, Error> {
        let geometry = Geometry::new(GeoJsonValue::from(&self.line_string()));
        let summary = self.summary();

        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {
                "description": "Safety-weighted walking route",
                "node_count": summary.node_count,
                "coordinate_count": summary.coordinate_count,
                "total_weight": summary.total_weight,
                "length_m": summary.length_m,
            }
        });

        serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
    }

    /// Serialized form of [`RoutePath::to_geojson`]
    ///
    /// # Errors
    ///
    /// See [`RoutePath::to_geojson`].
    pub fn to_geojson_string(&self) -> Result<String, Error> {
        Ok(self.to_geojson()?.to_string())
    }
}
