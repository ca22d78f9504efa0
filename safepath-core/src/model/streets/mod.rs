//! Walkable street network with safety-weighted edges

pub mod components;
pub mod network;

pub use components::{StreetEdge, StreetNode};
pub use network::WeightedGraph;
