//! A* search over any graph exposing [`RoutingGraph`]
//!
//! Edge cost and remaining-cost estimate are injected, so the search can be
//! driven against synthetic graphs as well as the street network.

mod state;

use std::{collections::BinaryHeap, hash::Hash};

use geo::Point;
use hashbrown::HashMap;
use log::trace;

use state::State;

/// Read access the search needs from a graph
pub trait RoutingGraph {
    type Node: Copy + Eq + Hash;
    type Edge;

    /// Outgoing edges of `node` as `(neighbor, edge)`
    fn neighbors(&self, node: Self::Node) -> impl Iterator<Item = (Self::Node, &Self::Edge)>;

    fn coordinate_of(&self, node: Self::Node) -> Option<Point<f64>>;

    fn contains(&self, node: Self::Node) -> bool;
}

/// Successful search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPath<N> {
    /// Sum of edge costs along `nodes`
    pub cost: f64,
    /// Start to goal, inclusive
    pub nodes: Vec<N>,
    /// Number of nodes expanded
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFailure {
    /// Start or goal is not part of the graph
    UnknownNode,
    /// Every reachable node was expanded without reaching the goal
    Exhausted { iterations: usize },
    /// The expansion cap was hit first
    LimitReached { iterations: usize },
}

/// Finds the cheapest path from `start` to `goal`.
///
/// The open set is ordered by `cost + estimate_cost(node)`; ties go to the
/// entry inserted first. Relaxation requires a strict improvement. Outdated
/// open set entries are skipped when popped and are not counted against
/// `max_iterations`.
///
/// The result is optimal whenever `estimate_cost` never overestimates the
/// remaining cost.
///
/// # Errors
///
/// See [`SearchFailure`].
pub fn astar<G, C, H>(
    graph: &G,
    start: G::Node,
    goal: G::Node,
    mut edge_cost: C,
    mut estimate_cost: H,
    max_iterations: Option<usize>,
) -> Result<SearchPath<G::Node>, SearchFailure>
where
    G: RoutingGraph,
    C: FnMut(&G::Edge) -> f64,
    H: FnMut(G::Node) -> f64,
{
    if !graph.contains(start) || !graph.contains(goal) {
        return Err(SearchFailure::UnknownNode);
    }

    if start == goal {
        return Ok(SearchPath {
            cost: 0.0,
            nodes: vec![start],
            iterations: 0,
        });
    }

    let mut g_score: HashMap<G::Node, f64> = HashMap::new();
    let mut came_from: HashMap<G::Node, G::Node> = HashMap::new();
    let mut heap = BinaryHeap::new();
    let mut sequence = 0_u64;
    let mut iterations = 0_usize;

    g_score.insert(start, 0.0);
    heap.push(State {
        estimate: estimate_cost(start),
        cost: 0.0,
        sequence,
        node: start,
    });

    while let Some(State { cost, node, .. }) = heap.pop() {
        // Skip if we've found a better path
        if g_score.get(&node).is_some_and(|&best| cost > best) {
            continue;
        }

        iterations += 1;
        if let Some(limit) = max_iterations
            && iterations > limit
        {
            return Err(SearchFailure::LimitReached { iterations: limit });
        }

        if node == goal {
            trace!("A* reached the goal after {iterations} iterations");
            return Ok(SearchPath {
                cost,
                nodes: reconstruct_path(&came_from, start, goal),
                iterations,
            });
        }

        for (next, edge) in graph.neighbors(node) {
            let tentative = cost + edge_cost(edge);
            let improves = g_score.get(&next).is_none_or(|&known| tentative < known);
            if improves {
                g_score.insert(next, tentative);
                came_from.insert(next, node);
                sequence += 1;
                heap.push(State {
                    estimate: tentative + estimate_cost(next),
                    cost: tentative,
                    sequence,
                    node: next,
                });
            }
        }
    }

    Err(SearchFailure::Exhausted { iterations })
}

fn reconstruct_path<N>(came_from: &HashMap<N, N>, start: N, goal: N) -> Vec<N>
where
    N: Copy + Eq + Hash,
{
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        if let Some(&prev) = came_from.get(&current) {
            path.push(prev);
            current = prev;
        } else {
            break;
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Adjacency-list graph with node positions, for driving the search directly
    struct TestGraph {
        positions: Vec<Point<f64>>,
        adjacency: Vec<Vec<(usize, f64)>>,
    }

    impl TestGraph {
        fn new(size: usize) -> Self {
            Self {
                positions: (0..size).map(|_| Point::new(0.0, 0.0)).collect(),
                adjacency: vec![Vec::new(); size],
            }
        }

        fn edge(mut self, from: usize, to: usize, cost: f64) -> Self {
            self.adjacency[from].push((to, cost));
            self
        }
    }

    impl RoutingGraph for TestGraph {
        type Node = usize;
        type Edge = f64;

        fn neighbors(&self, node: usize) -> impl Iterator<Item = (usize, &f64)> {
            self.adjacency[node].iter().map(|(to, cost)| (*to, cost))
        }

        fn coordinate_of(&self, node: usize) -> Option<Point<f64>> {
            self.positions.get(node).copied()
        }

        fn contains(&self, node: usize) -> bool {
            node < self.adjacency.len()
        }
    }

    fn dijkstra_like(
        graph: &TestGraph,
        start: usize,
        goal: usize,
    ) -> Result<SearchPath<usize>, SearchFailure> {
        astar(graph, start, goal, |cost| *cost, |_| 0.0, None)
    }

    #[test]
    fn finds_cheapest_of_two_routes() {
        let graph = TestGraph::new(4)
            .edge(0, 1, 1.0)
            .edge(1, 3, 5.0)
            .edge(0, 2, 2.0)
            .edge(2, 3, 2.0);
        let path = dijkstra_like(&graph, 0, 3).unwrap();
        assert_eq!(path.nodes, vec![0, 2, 3]);
        assert_eq!(path.cost, 4.0);
    }

    #[test]
    fn start_equals_goal_needs_no_search() {
        let graph = TestGraph::new(2).edge(0, 1, 1.0);
        let path = dijkstra_like(&graph, 1, 1).unwrap();
        assert_eq!(path.nodes, vec![1]);
        assert_eq!(path.cost, 0.0);
        assert_eq!(path.iterations, 0);
    }

    #[test]
    fn unreachable_goal_exhausts_the_component() {
        let graph = TestGraph::new(4).edge(0, 1, 1.0).edge(1, 0, 1.0).edge(2, 3, 1.0);
        assert_eq!(
            dijkstra_like(&graph, 0, 3),
            Err(SearchFailure::Exhausted { iterations: 2 })
        );
    }

    #[test]
    fn unknown_nodes_are_rejected() {
        let graph = TestGraph::new(2);
        assert_eq!(dijkstra_like(&graph, 0, 7), Err(SearchFailure::UnknownNode));
    }

    #[test]
    fn iteration_cap_stops_the_search() {
        let mut graph = TestGraph::new(10);
        for i in 0..9 {
            graph = graph.edge(i, i + 1, 1.0);
        }
        let result = astar(&graph, 0, 9, |cost| *cost, |_| 0.0, Some(3));
        assert_eq!(result, Err(SearchFailure::LimitReached { iterations: 3 }));

        let path = astar(&graph, 0, 9, |cost| *cost, |_| 0.0, Some(10)).unwrap();
        assert_eq!(path.iterations, 10);
    }

    #[test]
    fn equal_cost_ties_follow_insertion_order() {
        // 0 -> 1 -> 3 and 0 -> 2 -> 3 cost the same; 1 is discovered first
        let graph = TestGraph::new(4)
            .edge(0, 1, 1.0)
            .edge(0, 2, 1.0)
            .edge(1, 3, 1.0)
            .edge(2, 3, 1.0);
        for _ in 0..5 {
            assert_eq!(dijkstra_like(&graph, 0, 3).unwrap().nodes, vec![0, 1, 3]);
        }

        // Reversing the insertion order flips the choice
        let graph = TestGraph::new(4)
            .edge(0, 2, 1.0)
            .edge(0, 1, 1.0)
            .edge(1, 3, 1.0)
            .edge(2, 3, 1.0);
        assert_eq!(dijkstra_like(&graph, 0, 3).unwrap().nodes, vec![0, 2, 3]);
    }

    #[test]
    fn parallel_edges_use_the_cheapest() {
        let graph = TestGraph::new(2).edge(0, 1, 4.0).edge(0, 1, 1.5);
        let path = dijkstra_like(&graph, 0, 1).unwrap();
        assert_eq!(path.cost, 1.5);
    }

    #[test]
    fn heuristic_guides_expansion() {
        // a long chain away from the goal and a direct edge towards it
        let mut graph = TestGraph::new(8).edge(0, 7, 10.0);
        for i in 0..6 {
            graph = graph.edge(i, i + 1, 1.0);
        }
        let blind = dijkstra_like(&graph, 0, 7).unwrap();
        // remaining estimate: 10 for the start, 100 for the chain, 0 at the goal
        let guided = astar(
            &graph,
            0,
            7,
            |cost| *cost,
            |node| match node {
                0 => 10.0,
                7 => 0.0,
                _ => 100.0,
            },
            None,
        )
        .unwrap();
        assert_eq!(blind.nodes, guided.nodes);
        assert!(guided.iterations < blind.iterations);
    }
}
