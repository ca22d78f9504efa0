use log::debug;
use petgraph::graph::NodeIndex;

use super::{
    RoutePath,
    astar::{RoutingGraph, SearchFailure, astar},
};
use crate::{
    Error, NodeId,
    algo::geodesic::haversine_distance,
    model::{LatLng, RoutingContext, StreetEdge, WeightedGraph, checked_point},
};

/// Computes the safety-weighted route between two coordinates.
///
/// Both coordinates are validated, then snapped to their nearest graph
/// nodes, then connected by an A* search over the custom edge weights with
/// the great-circle distance to the goal as heuristic.
///
/// # Errors
///
/// - [`Error::InvalidInput`] for non-finite or out-of-range coordinates
/// - [`Error::NodeResolution`] when no node lies within the snapping distance
/// - [`Error::NoPathFound`] when the goal is not reachable from the start
/// - [`Error::SearchLimitExceeded`] when the iteration cap is hit
pub fn compute_route(
    context: &RoutingContext,
    start: LatLng,
    end: LatLng,
) -> Result<RoutePath, Error> {
    let start_point = checked_point(start.lat, start.lng)
        .map_err(|e| Error::InvalidInput(format!("start: {e}")))?;
    let end_point = checked_point(end.lat, end.lng)
        .map_err(|e| Error::InvalidInput(format!("end: {e}")))?;

    let graph = context.graph();
    let max_snap = context.search_config().max_snap_distance_m;
    let resolve = |point: &geo::Point<f64>, requested: LatLng| {
        graph
            .nearest_node(point)
            .filter(|&(_, distance)| max_snap.is_none_or(|max| distance <= max))
            .map(|(index, _)| index)
            .ok_or(Error::NodeResolution {
                lat: requested.lat,
                lon: requested.lng,
            })
    };
    let source = resolve(&start_point, start)?;
    let target = resolve(&end_point, end)?;

    search(context, source, target)
}

/// Routes between two provider node ids without snapping.
///
/// # Errors
///
/// [`Error::InvalidInput`] for an id that is not part of the graph, otherwise
/// as [`compute_route`].
pub fn route_between_nodes(
    context: &RoutingContext,
    start: NodeId,
    goal: NodeId,
) -> Result<RoutePath, Error> {
    let graph = context.graph();
    let index = |id: NodeId| {
        graph
            .node_index(id)
            .ok_or_else(|| Error::InvalidInput(format!("unknown node id {id}")))
    };
    let source = index(start)?;
    let target = index(goal)?;
    search(context, source, target)
}

fn search(
    context: &RoutingContext,
    source: NodeIndex,
    target: NodeIndex,
) -> Result<RoutePath, Error> {
    let graph = context.graph();
    let goal = graph
        .coordinate_of(target)
        .ok_or(Error::UnrecoverableError("resolved goal node missing from graph"))?;

    let heuristic = |node: NodeIndex| {
        graph
            .coordinate_of(node)
            .map_or(0.0, |point| haversine_distance(&point, &goal))
    };

    match astar(
        graph,
        source,
        target,
        StreetEdge::weight,
        heuristic,
        context.search_config().max_iterations,
    ) {
        Ok(path) => {
            debug!(
                "Route with {} nodes found after {} iterations",
                path.nodes.len(),
                path.iterations
            );
            assemble(graph, &path.nodes, path.cost, path.iterations)
        }
        Err(SearchFailure::Exhausted { iterations }) => {
            debug!("Search exhausted after {iterations} iterations");
            Err(Error::NoPathFound {
                start: node_id(graph, source)?,
                goal: node_id(graph, target)?,
            })
        }
        Err(SearchFailure::LimitReached { iterations }) => {
            Err(Error::SearchLimitExceeded { iterations })
        }
        Err(SearchFailure::UnknownNode) => {
            Err(Error::UnrecoverableError("resolved node missing from graph"))
        }
    }
}

fn node_id(graph: &WeightedGraph, index: NodeIndex) -> Result<NodeId, Error> {
    graph
        .node(index)
        .map(|node| node.id)
        .ok_or(Error::UnrecoverableError("node index out of bounds"))
}

fn assemble(
    graph: &WeightedGraph,
    indices: &[NodeIndex],
    total_weight: f64,
    iterations: usize,
) -> Result<RoutePath, Error> {
    let mut nodes = Vec::with_capacity(indices.len());
    let mut coordinates = Vec::with_capacity(indices.len());
    for &index in indices {
        let node = graph
            .node(index)
            .ok_or(Error::UnrecoverableError("path node missing from graph"))?;
        nodes.push(node.id);
        coordinates.push(node.geometry);
    }

    let length_m = indices
        .windows(2)
        .map(|pair| {
            graph
                .edge_between(pair[0], pair[1])
                .map(StreetEdge::length)
                .ok_or(Error::UnrecoverableError("path edge missing from graph"))
        })
        .sum::<Result<f64, Error>>()?;

    Ok(RoutePath::new(
        nodes,
        coordinates,
        total_weight,
        length_m,
        iterations,
    ))
}
