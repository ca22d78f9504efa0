//! Street network as delivered by the graph provider

use std::{fs::File, io::BufReader, io::Read, path::Path};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{Error, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: NodeId,
    pub lat: f64,
    #[serde(alias = "lng")]
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(alias = "length")]
    pub length_m: f64,
    /// Street walkable in both directions; expanded into two directed edges
    #[serde(default)]
    pub bidirectional: bool,
}

/// Unvalidated nodes and edges; checked by [`WeightedGraph::build`]
///
/// [`WeightedGraph::build`]: crate::WeightedGraph::build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

impl GraphData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: NodeId, lat: f64, lon: f64) -> &mut Self {
        self.nodes.push(RawNode { id, lat, lon });
        self
    }

    /// One-way segment `from -> to`
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, length_m: f64) -> &mut Self {
        self.edges.push(RawEdge {
            from,
            to,
            length_m,
            bidirectional: false,
        });
        self
    }

    /// Two-way segment
    pub fn add_street(&mut self, from: NodeId, to: NodeId, length_m: f64) -> &mut Self {
        self.edges.push(RawEdge {
            from,
            to,
            length_m,
            bidirectional: true,
        });
        self
    }

    /// Number of directed edges after expanding bidirectional streets
    pub fn directed_edge_count(&self) -> usize {
        self.edges
            .iter()
            .map(|edge| if edge.bidirectional { 2 } else { 1 })
            .sum()
    }
}

/// Reads a graph document `{"nodes": [...], "edges": [...]}`.
///
/// # Errors
///
/// I/O failures are returned as is; a document with the wrong shape is
/// reported as [`Error::DataInconsistency`].
pub fn load_graph_data(path: impl AsRef<Path>) -> Result<GraphData, Error> {
    let path = path.as_ref();
    info!("Reading street network: {}", path.display());
    let file = File::open(path)?;
    let data = read_graph_data(BufReader::new(file))?;
    info!(
        "Read {} nodes and {} edges",
        data.nodes.len(),
        data.edges.len()
    );
    Ok(data)
}

/// # Errors
///
/// See [`load_graph_data`].
pub fn read_graph_data(reader: impl Read) -> Result<GraphData, Error> {
    serde_json::from_reader(reader).map_err(|e| match e.classify() {
        serde_json::error::Category::Io => Error::JsonError(e),
        _ => Error::DataInconsistency(format!("malformed graph document: {e}")),
    })
}
