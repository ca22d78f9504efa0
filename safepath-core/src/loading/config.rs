use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, SafetyConfig, SearchConfig};

/// Location of the data set and the tunables applied to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingModelConfig {
    /// Street network document (see [`GraphData`](super::GraphData))
    pub graph_path: PathBuf,
    /// `.csv`, `.json` or `.geojson` file with cycling lane locations
    #[serde(default)]
    pub cycling_lanes_path: Option<PathBuf>,
    /// `.csv`, `.json` or `.geojson` file with accident locations
    #[serde(default)]
    pub accidents_path: Option<PathBuf>,
    /// Fail on the first malformed feature record instead of skipping it
    #[serde(default)]
    pub strict_features: bool,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl RoutingModelConfig {
    pub fn new(graph_path: impl Into<PathBuf>) -> Self {
        Self {
            graph_path: graph_path.into(),
            cycling_lanes_path: None,
            accidents_path: None,
            strict_features: false,
            safety: SafetyConfig::default(),
            search: SearchConfig::default(),
        }
    }

    #[must_use]
    pub fn with_cycling_lanes(mut self, path: impl Into<PathBuf>) -> Self {
        self.cycling_lanes_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_accidents(mut self, path: impl Into<PathBuf>) -> Self {
        self.accidents_path = Some(path.into());
        self
    }

    /// Checks that every referenced file exists and that the tunables are
    /// usable.
    ///
    /// # Errors
    ///
    /// [`Error::IoError`] with `NotFound` for a missing file,
    /// [`Error::InvalidConfig`] for invalid tunables.
    pub fn validate(&self) -> Result<(), Error> {
        let files = std::iter::once(("street network", Some(&self.graph_path)))
            .chain([
                ("cycling lane", self.cycling_lanes_path.as_ref()),
                ("accident", self.accidents_path.as_ref()),
            ])
            .filter_map(|(label, path)| path.map(|path| (label, path)));

        for (label, path) in files {
            if !path.exists() {
                return Err(Error::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{label} file not found: {}", path.display()),
                )));
            }
        }

        self.safety.validate()?;
        self.search.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_graph_file_is_not_found() {
        let config = RoutingModelConfig::new("/nonexistent/streets.json");
        match config.validate() {
            Err(Error::IoError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn deserializes_with_nested_defaults() {
        let config: RoutingModelConfig = serde_json::from_str(
            r#"{"graph_path": "streets.json", "safety": {"accident_radius_m": 300.0}}"#,
        )
        .unwrap();
        assert_eq!(config.safety.accident_radius_m, 300.0);
        assert_eq!(config.safety.cycling_lane_radius_m, 50.0);
        assert!(config.cycling_lanes_path.is_none());
        assert!(!config.strict_features);
        assert_eq!(config.search, SearchConfig::default());
    }
}
