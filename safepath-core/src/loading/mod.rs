//! This module is responsible for loading the street network and the safety
//! feature datasets and building an immutable routing context.

mod builder;
mod config;
mod features;
mod graph;

pub use builder::{create_routing_context, reload_features};
pub use config::RoutingModelConfig;
pub use features::{
    FeatureFormat, FeatureLoadReport, FeatureSummary, load_feature_set, load_features,
    read_features,
};
pub use graph::{GraphData, RawEdge, RawNode, load_graph_data, read_graph_data};
