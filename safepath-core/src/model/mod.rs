//! Data model for safety-weighted routing
//!
//! Contains the street network, the point features that bias it and the
//! immutable context a route request runs against.

pub mod context;
pub mod coordinate;
pub mod features;
pub mod streets;

pub use context::RoutingContext;
pub use coordinate::{CoordinateError, LatLng, checked_point};
pub use features::{FeatureCategory, FeatureRecord, FeatureSet, PointFeature};
pub use streets::{StreetEdge, StreetNode, WeightedGraph};
