//! Safety-weighted walking routes over a street network.
//!
//! Edges of the street graph are scored by their proximity to cycling
//! infrastructure (a bonus) and to recorded traffic accidents (a penalty).
//! The resulting custom weight drives an A* search whose heuristic is the
//! great-circle distance to the goal.
//!
//! ```text
//! graph + feature datasets -> SafetyScorer -> WeightedGraph -> A* -> RoutePath -> GeoJSON
//! ```

pub mod algo;
pub mod config;
pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use config::{SafetyConfig, SearchConfig};
pub use error::Error;
pub use loading::{RoutingModelConfig, create_routing_context, reload_features};
pub use model::{FeatureSet, RoutingContext, WeightedGraph};
pub use routing::{RoutePath, compute_route, route_between_nodes};

/// Identifier of a street network node as delivered by the graph provider
pub type NodeId = i64;
