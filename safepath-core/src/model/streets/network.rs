//! Street graph with safety-weighted edges and a node snapping index

use geo::Point;
use hashbrown::HashMap;
use log::{debug, info};
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use rstar::{RTree, primitives::GeomWithData};

use super::components::{StreetEdge, StreetNode};
use crate::{
    Error, NodeId, SafetyConfig,
    algo::{
        geodesic::{haversine_distance, unit_vector},
        safety::{FeatureIndex, ProximityIndex, SafetyScorer, ScoringReport},
    },
    loading::GraphData,
    model::{FeatureSet, checked_point},
    routing::RoutingGraph,
};

/// Edges shorter than this are lifted to it so that weights stay positive
pub const MIN_EDGE_LENGTH_M: f64 = 0.01;

/// R-tree entry: unit-sphere position of a node plus its graph index
type IndexedPoint = GeomWithData<[f64; 3], NodeIndex>;

/// Immutable street graph whose edge weights already include the safety
/// divisor.
///
/// A graph is a snapshot: feature changes produce a new graph through
/// [`WeightedGraph::rescored`], so searches running on the old one never see
/// a mix of divisors.
#[derive(Debug, Clone)]
pub struct WeightedGraph {
    graph: DiGraph<StreetNode, StreetEdge>,
    ids: HashMap<NodeId, NodeIndex>,
    rtree: RTree<IndexedPoint>,
    safety: SafetyConfig,
    report: ScoringReport,
}

impl WeightedGraph {
    /// Builds and scores the graph using the R-tree feature index.
    ///
    /// # Errors
    ///
    /// [`Error::DataInconsistency`] for duplicate node ids, invalid node
    /// coordinates, edges referencing unknown nodes, or negative or
    /// non-finite edge lengths. [`Error::InvalidConfig`] for an invalid
    /// `config`.
    pub fn build(
        data: &GraphData,
        features: &FeatureSet,
        config: SafetyConfig,
    ) -> Result<Self, Error> {
        Self::build_with::<FeatureIndex>(data, features, config)
    }

    /// Same as [`WeightedGraph::build`] with an explicit proximity index.
    ///
    /// # Errors
    ///
    /// See [`WeightedGraph::build`].
    pub fn build_with<I: ProximityIndex>(
        data: &GraphData,
        features: &FeatureSet,
        config: SafetyConfig,
    ) -> Result<Self, Error> {
        config.validate()?;

        let mut graph = DiGraph::with_capacity(data.nodes.len(), data.directed_edge_count());
        let mut ids = HashMap::with_capacity(data.nodes.len());

        for raw in &data.nodes {
            let geometry = checked_point(raw.lat, raw.lon).map_err(|e| {
                Error::DataInconsistency(format!("node {} has invalid coordinates: {e}", raw.id))
            })?;
            let index = graph.add_node(StreetNode {
                id: raw.id,
                geometry,
            });
            if ids.insert(raw.id, index).is_some() {
                return Err(Error::DataInconsistency(format!(
                    "duplicate node id {}",
                    raw.id
                )));
            }
        }

        // (from, to, length) per directed edge
        let mut directed = Vec::with_capacity(data.directed_edge_count());
        for raw in &data.edges {
            let resolve = |id: NodeId| {
                ids.get(&id).copied().ok_or_else(|| {
                    Error::DataInconsistency(format!(
                        "edge {} -> {} references unknown node {id}",
                        raw.from, raw.to
                    ))
                })
            };
            let from = resolve(raw.from)?;
            let to = resolve(raw.to)?;

            if !raw.length_m.is_finite() || raw.length_m < 0.0 {
                return Err(Error::DataInconsistency(format!(
                    "edge {} -> {} has invalid length {}",
                    raw.from, raw.to, raw.length_m
                )));
            }
            let length = raw.length_m.max(MIN_EDGE_LENGTH_M);

            directed.push((from, to, length));
            if raw.bidirectional {
                directed.push((to, from, length));
            }
        }

        let segments = geometries(&graph, &directed);
        let scores = SafetyScorer::<I>::new(features, config).score_segments(&segments);

        let mut report = ScoringReport::default();
        for (&(from, to, length), score) in directed.iter().zip(&scores) {
            report.record(score);
            graph.add_edge(from, to, StreetEdge::new(length, score.divisor));
        }

        let rtree = build_rtree(&graph);

        info!(
            "Built weighted graph: {} nodes, {} edges ({} near cycling lanes, {} near accidents, {} clamped)",
            graph.node_count(),
            graph.edge_count(),
            report.near_cycling_lane,
            report.near_accident,
            report.clamped
        );

        Ok(Self {
            graph,
            ids,
            rtree,
            safety: config,
            report,
        })
    }

    /// New snapshot with every divisor recomputed from `features`.
    ///
    /// Topology, lengths and the snapping index are shared in value with
    /// `self`, which stays untouched.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] for an invalid `config`.
    pub fn rescored(&self, features: &FeatureSet, config: SafetyConfig) -> Result<Self, Error> {
        self.rescored_with::<FeatureIndex>(features, config)
    }

    /// # Errors
    ///
    /// See [`WeightedGraph::rescored`].
    pub fn rescored_with<I: ProximityIndex>(
        &self,
        features: &FeatureSet,
        config: SafetyConfig,
    ) -> Result<Self, Error> {
        config.validate()?;

        let segments: Vec<_> = self
            .graph
            .edge_references()
            .map(|edge| {
                (
                    self.graph[edge.source()].geometry,
                    self.graph[edge.target()].geometry,
                )
            })
            .collect();
        let scores = SafetyScorer::<I>::new(features, config).score_segments(&segments);

        let mut report = ScoringReport::default();
        let mut graph = self.graph.clone();
        // edge_references and edge_weights_mut both walk edges in index order
        for (edge, score) in graph.edge_weights_mut().zip(&scores) {
            report.record(score);
            *edge = StreetEdge::new(edge.length(), score.divisor);
        }

        debug!(
            "Rescored {} edges ({} near cycling lanes, {} near accidents)",
            report.edges, report.near_cycling_lane, report.near_accident
        );

        Ok(Self {
            graph,
            ids: self.ids.clone(),
            rtree: self.rtree.clone(),
            safety: config,
            report,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn report(&self) -> &ScoringReport {
        &self.report
    }

    pub fn safety_config(&self) -> &SafetyConfig {
        &self.safety
    }

    /// Graph index of a provider node id
    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.ids.get(&id).copied()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&StreetNode> {
        self.graph.node_weight(index)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StreetNode> {
        self.graph.node_weights()
    }

    /// Outgoing edges of `index` as `(neighbor, edge)`
    pub fn outgoing(&self, index: NodeIndex) -> impl Iterator<Item = (NodeIndex, &StreetEdge)> {
        self.graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| (edge.target(), edge.weight()))
    }

    /// Cheapest edge `from -> to`, if any
    pub fn edge_between(&self, from: NodeIndex, to: NodeIndex) -> Option<&StreetEdge> {
        self.graph
            .edges_connecting(from, to)
            .map(|edge| edge.weight())
            .min_by(|a, b| a.weight().total_cmp(&b.weight()))
    }

    pub fn edges(&self) -> impl Iterator<Item = &StreetEdge> {
        self.graph.edge_weights()
    }

    /// Nearest node to `point` and its great-circle distance in meters.
    ///
    /// Nodes are indexed by their unit-sphere position, so the chord-nearest
    /// node is also the great-circle nearest one.
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, f64)> {
        let nearest = self.rtree.nearest_neighbor(&unit_vector(point))?;
        let node = self.graph.node_weight(nearest.data)?;
        Some((nearest.data, haversine_distance(point, &node.geometry)))
    }
}

impl RoutingGraph for WeightedGraph {
    type Node = NodeIndex;
    type Edge = StreetEdge;

    fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, &StreetEdge)> {
        self.outgoing(node)
    }

    fn coordinate_of(&self, node: NodeIndex) -> Option<Point<f64>> {
        self.node(node).map(|node| node.geometry)
    }

    fn contains(&self, node: NodeIndex) -> bool {
        node.index() < self.graph.node_count()
    }
}

fn geometries(
    graph: &DiGraph<StreetNode, StreetEdge>,
    directed: &[(NodeIndex, NodeIndex, f64)],
) -> Vec<(Point<f64>, Point<f64>)> {
    directed
        .iter()
        .map(|&(from, to, _)| (graph[from].geometry, graph[to].geometry))
        .collect()
}

fn build_rtree(graph: &DiGraph<StreetNode, StreetEdge>) -> RTree<IndexedPoint> {
    let points = graph
        .node_indices()
        .map(|index| IndexedPoint::new(unit_vector(&graph[index].geometry), index))
        .collect();
    RTree::bulk_load(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algo::safety::LinearScan,
        model::{FeatureCategory, PointFeature},
    };

    fn triangle() -> GraphData {
        let mut data = GraphData::new();
        data.add_node(1, 43.6500, -79.3800)
            .add_node(2, 43.6510, -79.3800)
            .add_node(3, 43.6510, -79.3790)
            .add_street(1, 2, 111.2)
            .add_edge(2, 3, 80.5)
            .add_edge(3, 1, 0.0);
        data
    }

    fn build(data: &GraphData, features: &FeatureSet) -> WeightedGraph {
        WeightedGraph::build(data, features, SafetyConfig::default()).unwrap()
    }

    #[test]
    fn builds_directed_edges_with_positive_weights() {
        let graph = build(&triangle(), &FeatureSet::new());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 4);
        for edge in graph.edges() {
            assert!(edge.divisor() > 0.0);
            assert!(edge.weight() > 0.0 && edge.weight().is_finite());
        }
        assert_eq!(graph.report().edges, 4);
    }

    #[test]
    fn zero_length_edge_is_lifted() {
        let graph = build(&triangle(), &FeatureSet::new());
        let from = graph.node_index(3).unwrap();
        let to = graph.node_index(1).unwrap();
        let edge = graph.edge_between(from, to).unwrap();
        assert_eq!(edge.length(), MIN_EDGE_LENGTH_M);
    }

    #[test]
    fn both_directions_share_the_divisor() {
        let lane =
            PointFeature::new(FeatureCategory::CyclingLane, Point::new(-79.3800, 43.6505));
        let features: FeatureSet = std::iter::once(lane).collect();
        let graph = build(&triangle(), &features);
        let a = graph.node_index(1).unwrap();
        let b = graph.node_index(2).unwrap();
        let forward = graph.edge_between(a, b).unwrap();
        let backward = graph.edge_between(b, a).unwrap();
        assert_eq!(forward.divisor(), backward.divisor());
        assert!((forward.divisor() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let mut data = triangle();
        data.add_edge(3, 99, 10.0);
        let err =
            WeightedGraph::build(&data, &FeatureSet::new(), SafetyConfig::default()).unwrap_err();
        assert!(matches!(err, Error::DataInconsistency(msg) if msg.contains("99")));
    }

    #[test]
    fn duplicate_ids_and_bad_lengths_are_rejected() {
        let mut duplicate = triangle();
        duplicate.add_node(2, 43.0, -79.0);
        assert!(matches!(
            WeightedGraph::build(&duplicate, &FeatureSet::new(), SafetyConfig::default()),
            Err(Error::DataInconsistency(_))
        ));

        let mut negative = triangle();
        negative.add_edge(1, 3, -5.0);
        assert!(matches!(
            WeightedGraph::build(&negative, &FeatureSet::new(), SafetyConfig::default()),
            Err(Error::DataInconsistency(_))
        ));

        let mut bad_node = triangle();
        bad_node.add_node(7, f64::NAN, 0.0);
        assert!(matches!(
            WeightedGraph::build(&bad_node, &FeatureSet::new(), SafetyConfig::default()),
            Err(Error::DataInconsistency(_))
        ));
    }

    #[test]
    fn rescoring_leaves_original_untouched() {
        let graph = build(&triangle(), &FeatureSet::new());
        let accident =
            PointFeature::new(FeatureCategory::Accident, Point::new(-79.3800, 43.6505));
        let features: FeatureSet = std::iter::once(accident).collect();

        let rescored = graph.rescored(&features, SafetyConfig::default()).unwrap();
        assert!(graph.edges().all(|edge| edge.divisor() == 1.0));
        assert!(rescored.edges().all(|edge| (edge.divisor() - 0.8).abs() < 1e-12));
        assert_eq!(rescored.report().near_accident, 4);

        let lengths: Vec<_> = graph.edges().map(StreetEdge::length).collect();
        let rescored_lengths: Vec<_> = rescored.edges().map(StreetEdge::length).collect();
        assert_eq!(lengths, rescored_lengths);
    }

    #[test]
    fn index_choice_does_not_change_divisors() {
        let features: FeatureSet = [
            PointFeature::new(FeatureCategory::CyclingLane, Point::new(-79.3795, 43.6510)),
            PointFeature::new(FeatureCategory::Accident, Point::new(-79.3700, 43.6500)),
        ]
        .into_iter()
        .collect();
        let fast = build(&triangle(), &features);
        let slow =
            WeightedGraph::build_with::<LinearScan>(&triangle(), &features, SafetyConfig::default())
                .unwrap();
        let a: Vec<_> = fast.edges().map(StreetEdge::divisor).collect();
        let b: Vec<_> = slow.edges().map(StreetEdge::divisor).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn nearest_node_snaps_to_closest() {
        let graph = build(&triangle(), &FeatureSet::new());
        let (index, distance) = graph.nearest_node(&Point::new(-79.37905, 43.65098)).unwrap();
        assert_eq!(graph.node(index).unwrap().id, 3);
        assert!(distance < 10.0);

        let empty = build(&GraphData::new(), &FeatureSet::new());
        assert!(empty.nearest_node(&Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn nearest_node_ranks_by_ground_distance() {
        // 0.0008 deg north is about 89 m, 0.001 deg east only about 80 m here
        let mut data = GraphData::new();
        data.add_node(1, 43.6508, -79.4000)
            .add_node(2, 43.6500, -79.3990)
            .add_street(1, 2, 150.0);
        let graph = build(&data, &FeatureSet::new());

        let (index, distance) = graph.nearest_node(&Point::new(-79.4000, 43.6500)).unwrap();
        assert_eq!(graph.node(index).unwrap().id, 2);
        assert!((distance - 80.46).abs() < 0.1, "{distance}");
    }
}
