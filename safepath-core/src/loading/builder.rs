use geo::{ConvexHull, Intersects, MultiPoint};
use log::info;

use super::{RoutingModelConfig, graph::load_graph_data, features::load_feature_set};
use crate::{
    Error,
    model::{FeatureSet, RoutingContext, WeightedGraph},
};

/// Loads the street network and feature files named in `config` and builds
/// the scored routing context.
///
/// The graph document is parsed on a separate thread while the feature files
/// are read.
///
/// # Errors
///
/// Returns an error if a file is missing or unreadable, or if the data
/// violates the graph invariants.
pub fn create_routing_context(config: &RoutingModelConfig) -> Result<RoutingContext, Error> {
    config.validate()?;

    let graph_path = config.graph_path.clone();
    let graph_handle = std::thread::spawn(move || load_graph_data(graph_path));

    let (features, summary) = load_feature_set(config)?;

    let data = graph_handle
        .join()
        .map_err(|_| Error::UnrecoverableError("graph loading thread panicked"))??;

    let graph = WeightedGraph::build(&data, &features, config.safety)?;
    validate_feature_coverage(&graph, &features);

    info!("Routing context created successfully");
    Ok(RoutingContext::new(graph, config.search).with_feature_summary(summary))
}

/// Re-reads the feature files and returns a new context whose graph is
/// rescored from scratch. `context` itself is left untouched so that
/// in-flight searches keep a consistent view.
///
/// # Errors
///
/// Same as [`create_routing_context`], minus graph loading.
pub fn reload_features(
    context: &RoutingContext,
    config: &RoutingModelConfig,
) -> Result<RoutingContext, Error> {
    config.safety.validate()?;
    config.search.validate()?;

    let (features, summary) = load_feature_set(config)?;
    let graph = context.graph().rescored(&features, config.safety)?;
    validate_feature_coverage(&graph, &features);

    info!(
        "Reloaded {} features ({} skipped)",
        features.len(),
        summary.skipped()
    );
    Ok(RoutingContext::new(graph, config.search).with_feature_summary(summary))
}

#[allow(clippy::cast_precision_loss)]
fn validate_feature_coverage(graph: &WeightedGraph, features: &FeatureSet) {
    if features.is_empty() || graph.node_count() == 0 {
        return;
    }

    let nodes: MultiPoint = graph.nodes().map(|node| node.geometry).collect();
    let hull = nodes.convex_hull();

    let outside = features
        .iter()
        .filter(|feature| !feature.geometry.intersects(&hull))
        .count();

    if outside > 0 {
        let total = features.len();
        let percentage = (outside as f64 / total as f64) * 100.0;
        log::warn!(
            "{outside} of {total} features ({percentage:.1}%) are outside the street network \
        coverage area. They can only affect edges near the boundary."
        );
    }
}
