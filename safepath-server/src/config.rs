use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::Context;
use safepath_core::RoutingModelConfig;
use serde::Deserialize;

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_requests() -> usize {
    64
}

/// Expansion cap applied to searches when `[model.search]` sets none.
///
/// The request timeout only abandons the response; the search itself keeps
/// running on the blocking pool until it finishes or hits this cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 1_000_000;

/// Server configuration, read from a TOML file.
///
/// ```toml
/// bind = "0.0.0.0:8000"
///
/// [model]
/// graph_path = "streets.json"
/// accidents_path = "collisions.csv"
///
/// [model.safety]
/// accident_radius_m = 500.0
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    pub model: RoutingModelConfig,
}

impl ServerConfig {
    /// Reads the file and resolves relative data paths against its directory.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid configuration.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        let mut config = Self::from_toml(&text)
            .with_context(|| format!("parsing configuration {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Fails on invalid TOML or a missing `[model]` table.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(text)?;
        config
            .model
            .search
            .max_iterations
            .get_or_insert(DEFAULT_MAX_ITERATIONS);
        anyhow::ensure!(
            config.max_concurrent_requests > 0,
            "max_concurrent_requests must be greater than zero"
        );
        anyhow::ensure!(
            config.request_timeout_secs > 0,
            "request_timeout_secs must be greater than zero"
        );
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        let model = &mut self.model;
        resolve(&mut model.graph_path);
        if let Some(path) = model.cycling_lanes_path.as_mut() {
            resolve(path);
        }
        if let Some(path) = model.accidents_path.as_mut() {
            resolve(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            [model]
            graph_path = "streets.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, default_bind());
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.model.safety.cycling_lane_radius_m, 50.0);
        assert_eq!(
            config.model.search.max_iterations,
            Some(DEFAULT_MAX_ITERATIONS)
        );
    }

    #[test]
    fn parses_nested_tunables() {
        let config = ServerConfig::from_toml(
            r#"
            bind = "0.0.0.0:9000"
            max_concurrent_requests = 8

            [model]
            graph_path = "streets.json"
            accidents_path = "collisions.csv"
            strict_features = true

            [model.safety]
            accident_radius_m = 250.0

            [model.search]
            max_iterations = 5000
            "#,
        )
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.max_concurrent_requests, 8);
        assert!(config.model.strict_features);
        assert_eq!(config.model.safety.accident_radius_m, 250.0);
        assert_eq!(config.model.search.max_iterations, Some(5000));
    }

    #[test]
    fn rejects_zero_concurrency_and_missing_model() {
        assert!(
            ServerConfig::from_toml("max_concurrent_requests = 0\n[model]\ngraph_path = \"g\"")
                .is_err()
        );
        assert!(ServerConfig::from_toml("bind = \"127.0.0.1:1\"").is_err());
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let mut config = ServerConfig::from_toml(
            "[model]\ngraph_path = \"streets.json\"\naccidents_path = \"/abs/collisions.csv\"",
        )
        .unwrap();
        config.resolve_paths(Path::new("/srv/safepath"));
        assert_eq!(
            config.model.graph_path,
            PathBuf::from("/srv/safepath/streets.json")
        );
        assert_eq!(
            config.model.accidents_path,
            Some(PathBuf::from("/abs/collisions.csv"))
        );
    }
}
