//! Per-edge safety divisor derived from proximity to point features.
//!
//! Every edge is represented by the arithmetic midpoint of its endpoints
//! (plain coordinate averaging, not a geodesic midpoint; accuracy degrades on
//! very long edges). A cycling lane within range adds the bonus once, an
//! accident within range subtracts the penalty once, and the result is
//! clamped to the configured minimum before the weight is derived.
//!
//! Proximity tests go through [`ProximityIndex`] so that the naive scan and
//! the R-tree are interchangeable without changing the per-edge contract.

use std::f64::consts::FRAC_PI_2;

use geo::Point;
use rayon::prelude::*;
use rstar::{AABB, RTree};
use serde::Serialize;

use super::geodesic::{EARTH_RADIUS_M, haversine_distance};
use crate::{SafetyConfig, model::FeatureSet};

/// Floor applied to the divisor inside the weight formula
pub const DIVISOR_EPSILON: f64 = 1e-6;

/// Answers "is any feature within `radius_m` meters of this point?"
pub trait ProximityIndex: Send + Sync {
    fn from_points(points: &[Point<f64>]) -> Self
    where
        Self: Sized;

    fn any_within(&self, center: &Point<f64>, radius_m: f64) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checks every feature; O(n) per query
#[derive(Debug, Clone, Default)]
pub struct LinearScan {
    points: Vec<Point<f64>>,
}

impl ProximityIndex for LinearScan {
    fn from_points(points: &[Point<f64>]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }

    fn any_within(&self, center: &Point<f64>, radius_m: f64) -> bool {
        self.points
            .iter()
            .any(|p| haversine_distance(center, p) <= radius_m)
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

/// R-tree over feature coordinates stored as `[lon, lat]`.
///
/// Queries select candidates with a spherical bounding box that contains the
/// whole search circle and confirm them with the haversine distance, so the
/// answer is identical to [`LinearScan`].
#[derive(Debug, Clone)]
pub struct FeatureIndex {
    tree: RTree<[f64; 2]>,
}

impl ProximityIndex for FeatureIndex {
    fn from_points(points: &[Point<f64>]) -> Self {
        let entries = points.iter().map(|p| [p.x(), p.y()]).collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    fn any_within(&self, center: &Point<f64>, radius_m: f64) -> bool {
        if self.tree.size() == 0 {
            return false;
        }
        let envelope = search_envelope(center, radius_m);
        self.tree
            .locate_in_envelope(&envelope)
            .any(|p| haversine_distance(center, &Point::new(p[0], p[1])) <= radius_m)
    }

    fn len(&self) -> usize {
        self.tree.size()
    }
}

/// Degree envelope enclosing every point within `radius_m` of `center`.
fn search_envelope(center: &Point<f64>, radius_m: f64) -> AABB<[f64; 2]> {
    // absorbs rounding in the degree conversion
    const MARGIN_DEG: f64 = 1e-9;

    let angular = radius_m / EARTH_RADIUS_M;
    let lat = center.y().to_radians();
    let min_lat = lat - angular;
    let max_lat = lat + angular;

    let (min_lon, max_lon) = if min_lat <= -FRAC_PI_2 || max_lat >= FRAC_PI_2 {
        // the circle contains a pole
        (-180.0, 180.0)
    } else {
        let ratio = (angular.sin() / lat.cos()).min(1.0);
        let dlon = ratio.asin().to_degrees();
        let (west, east) = (center.x() - dlon, center.x() + dlon);
        if west < -180.0 || east > 180.0 {
            // crossing the antimeridian; keep all longitudes
            (-180.0, 180.0)
        } else {
            (west - MARGIN_DEG, east + MARGIN_DEG)
        }
    };

    AABB::from_corners(
        [min_lon, min_lat.to_degrees().max(-90.0) - MARGIN_DEG],
        [max_lon, max_lat.to_degrees().min(90.0) + MARGIN_DEG],
    )
}

/// Arithmetic midpoint of the two endpoints
pub fn edge_midpoint(a: &Point<f64>, b: &Point<f64>) -> Point<f64> {
    Point::new((a.x() + b.x()) / 2.0, (a.y() + b.y()) / 2.0)
}

/// `length / max(divisor, DIVISOR_EPSILON)`
pub fn custom_weight(length: f64, divisor: f64) -> f64 {
    length / divisor.max(DIVISOR_EPSILON)
}

/// Outcome of scoring one edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeScore {
    pub divisor: f64,
    pub near_cycling_lane: bool,
    pub near_accident: bool,
    /// The raw divisor fell below the minimum and was raised to it
    pub clamped: bool,
}

/// Aggregate counts for one scoring pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoringReport {
    pub edges: usize,
    pub near_cycling_lane: usize,
    pub near_accident: usize,
    pub clamped: usize,
}

impl ScoringReport {
    pub fn record(&mut self, score: &EdgeScore) {
        self.edges += 1;
        self.near_cycling_lane += usize::from(score.near_cycling_lane);
        self.near_accident += usize::from(score.near_accident);
        self.clamped += usize::from(score.clamped);
    }
}

/// Converts feature proximity into per-edge divisors
#[derive(Debug, Clone)]
pub struct SafetyScorer<I = FeatureIndex> {
    cycling_lanes: I,
    accidents: I,
    config: SafetyConfig,
}

impl<I: ProximityIndex> SafetyScorer<I> {
    pub fn new(features: &FeatureSet, config: SafetyConfig) -> Self {
        Self {
            cycling_lanes: I::from_points(features.cycling_lanes()),
            accidents: I::from_points(features.accidents()),
            config,
        }
    }

    /// Divisor for an edge whose representative point is `point`
    pub fn score_point(&self, point: &Point<f64>) -> EdgeScore {
        let config = &self.config;
        let near_cycling_lane = self
            .cycling_lanes
            .any_within(point, config.cycling_lane_radius_m);
        let near_accident = self.accidents.any_within(point, config.accident_radius_m);

        let mut divisor = config.base_divisor;
        if near_cycling_lane {
            divisor += config.cycling_lane_bonus;
        }
        if near_accident {
            divisor -= config.accident_penalty;
        }

        let clamped = divisor < config.min_divisor;
        EdgeScore {
            divisor: divisor.max(config.min_divisor),
            near_cycling_lane,
            near_accident,
            clamped,
        }
    }

    pub fn score_segment(&self, from: &Point<f64>, to: &Point<f64>) -> EdgeScore {
        self.score_point(&edge_midpoint(from, to))
    }

    /// Scores all segments in parallel; output order matches input order.
    pub fn score_segments(&self, segments: &[(Point<f64>, Point<f64>)]) -> Vec<EdgeScore> {
        segments
            .par_iter()
            .map(|(from, to)| self.score_segment(from, to))
            .collect()
    }
}
