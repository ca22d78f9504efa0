use crate::{SearchConfig, loading::FeatureSummary, model::WeightedGraph};

/// Everything a route request reads: the scored graph and the search limits.
///
/// Immutable once built. Feature updates produce a new context (see
/// [`reload_features`](crate::reload_features)); callers share contexts
/// behind an `Arc` and swap the reference.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    graph: WeightedGraph,
    search: SearchConfig,
    features: FeatureSummary,
}

impl RoutingContext {
    pub fn new(graph: WeightedGraph, search: SearchConfig) -> Self {
        Self {
            graph,
            search,
            features: FeatureSummary::default(),
        }
    }

    #[must_use]
    pub fn with_feature_summary(mut self, features: FeatureSummary) -> Self {
        self.features = features;
        self
    }

    pub fn graph(&self) -> &WeightedGraph {
        &self.graph
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Counts of loaded and skipped feature records
    pub fn feature_summary(&self) -> &FeatureSummary {
        &self.features
    }
}
