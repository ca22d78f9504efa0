//! Route result and its output formats

mod to_geojson;

use geo::Point;
use serde::Serialize;

use crate::{NodeId, model::LatLng};

/// Node path produced by a successful route request
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    nodes: Vec<NodeId>,
    coordinates: Vec<Point<f64>>,
    total_weight: f64,
    length_m: f64,
    iterations: usize,
}

/// Route metadata for API payloads
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSummary {
    pub node_count: usize,
    /// Equals `node_count`; no points are interpolated between nodes
    pub coordinate_count: usize,
    pub total_weight: f64,
    pub length_m: f64,
}

impl RoutePath {
    pub(crate) fn new(
        nodes: Vec<NodeId>,
        coordinates: Vec<Point<f64>>,
        total_weight: f64,
        length_m: f64,
        iterations: usize,
    ) -> Self {
        debug_assert_eq!(nodes.len(), coordinates.len());
        Self {
            nodes,
            coordinates,
            total_weight,
            length_m,
            iterations,
        }
    }

    /// Provider ids of the visited nodes, start to goal
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Node coordinates in path order, `x` = longitude
    pub fn coordinates(&self) -> &[Point<f64>] {
        &self.coordinates
    }

    /// Sum of custom weights along the path
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Sum of physical edge lengths in meters
    pub fn length_m(&self) -> f64 {
        self.length_m
    }

    /// Nodes expanded by the search
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Ordered `{lat, lng}` records
    pub fn lat_lng(&self) -> Vec<LatLng> {
        self.coordinates.iter().copied().map(LatLng::from).collect()
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            node_count: self.nodes.len(),
            coordinate_count: self.coordinates.len(),
            total_weight: self.total_weight,
            length_m: self.length_m,
        }
    }
}
