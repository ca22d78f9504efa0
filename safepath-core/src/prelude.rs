// Re-export key components
pub use crate::algo::geodesic::{EARTH_RADIUS_M, haversine_distance};
pub use crate::algo::safety::{
    EdgeScore, FeatureIndex, LinearScan, ProximityIndex, SafetyScorer, ScoringReport,
};
pub use crate::loading::{
    FeatureLoadReport, FeatureSummary, GraphData, RoutingModelConfig, create_routing_context,
    load_feature_set, load_graph_data, reload_features,
};
pub use crate::model::{
    FeatureCategory, FeatureSet, LatLng, PointFeature, RoutingContext, StreetEdge, StreetNode,
    WeightedGraph,
};
pub use crate::routing::{RoutePath, RouteSummary, RoutingGraph, compute_route};
pub use crate::{Error, SafetyConfig, SearchConfig};

// Core types for the street network
pub use crate::NodeId;
