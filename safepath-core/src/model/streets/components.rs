//! Street network components - nodes and scored edges

use geo::Point;

use crate::{NodeId, algo::safety::custom_weight};

/// Street graph node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreetNode {
    /// Identifier assigned by the graph provider
    pub id: NodeId,
    /// Node coordinates, `x` = longitude
    pub geometry: Point<f64>,
}

/// Directed street segment.
///
/// `weight` is derived from `length` and `divisor` on construction and never
/// changes afterwards; rescoring builds new edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreetEdge {
    length: f64,
    divisor: f64,
    weight: f64,
}

impl StreetEdge {
    pub(crate) fn new(length: f64, divisor: f64) -> Self {
        Self {
            length,
            divisor,
            weight: custom_weight(length, divisor),
        }
    }

    /// Physical length in meters
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn divisor(&self) -> f64 {
        self.divisor
    }

    /// Cost used by the route search
    pub fn weight(&self) -> f64 {
        self.weight
    }
}
