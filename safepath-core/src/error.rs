use thiserror::Error;

use crate::NodeId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No street node found near ({lat}, {lon})")]
    NodeResolution { lat: f64, lon: f64 },
    #[error("Inconsistent data: {0}")]
    DataInconsistency(String),
    #[error("No path found from node {start} to node {goal}")]
    NoPathFound { start: NodeId, goal: NodeId },
    #[error("Search stopped after {iterations} iterations without reaching the goal")]
    SearchLimitExceeded { iterations: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
    #[error("Unrecoverable error: {0}")]
    UnrecoverableError(&'static str),
}

impl Error {
    /// Stable machine-readable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::NodeResolution { .. } => "node_resolution",
            Error::DataInconsistency(_) => "data_inconsistency",
            Error::NoPathFound { .. } => "no_path_found",
            Error::SearchLimitExceeded { .. } => "search_limit_exceeded",
            Error::InvalidConfig(_) => "invalid_config",
            Error::IoError(_) => "io",
            Error::CsvError(_) => "csv",
            Error::JsonError(_) => "json",
            Error::GeoJsonError(_) => "geojson",
            Error::UnrecoverableError(_) => "unrecoverable",
        }
    }
}
