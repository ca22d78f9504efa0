//! Route search over the weighted street graph

pub mod astar;
mod itinerary;
mod route;

pub use astar::{RoutingGraph, SearchFailure, SearchPath, astar};
pub use itinerary::{RoutePath, RouteSummary};
pub use route::{compute_route, route_between_nodes};
