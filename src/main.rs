//! One-shot route computation from the command line.
//!
//! Loads the street network and feature files, computes a single route and
//! writes it as a GeoJSON `Feature`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use safepath_core::{RoutingModelConfig, compute_route, create_routing_context, model::LatLng};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Compute a safety-weighted walking route")]
struct Args {
    /// Street network JSON document
    #[arg(long)]
    graph: PathBuf,

    /// Cycling lane locations (.csv, .json or .geojson)
    #[arg(long)]
    cycling_lanes: Option<PathBuf>,

    /// Accident locations (.csv, .json or .geojson)
    #[arg(long)]
    accidents: Option<PathBuf>,

    /// Start coordinate as LAT,LON
    #[arg(long, value_parser = parse_lat_lng, allow_hyphen_values = true)]
    start: LatLng,

    /// End coordinate as LAT,LON
    #[arg(long, value_parser = parse_lat_lng, allow_hyphen_values = true)]
    end: LatLng,

    /// Where to write the route document
    #[arg(short, long, default_value = "path_coordinates.json")]
    output: PathBuf,

    /// Abort the search after expanding this many nodes
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Reject request points farther than this from the network, in meters
    #[arg(long)]
    max_snap_distance: Option<f64>,

    /// Fail on malformed feature records instead of skipping them
    #[arg(long)]
    strict_features: bool,
}

fn parse_lat_lng(value: &str) -> Result<LatLng, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{value}'"))?;
    let lat = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{lat}'"))?;
    let lng = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{lng}'"))?;
    Ok(LatLng { lat, lng })
}

impl Args {
    fn model_config(&self) -> RoutingModelConfig {
        let mut config = RoutingModelConfig::new(&self.graph);
        config.cycling_lanes_path.clone_from(&self.cycling_lanes);
        config.accidents_path.clone_from(&self.accidents);
        config.strict_features = self.strict_features;
        config.search.max_iterations = self.max_iterations;
        config.search.max_snap_distance_m = self.max_snap_distance;
        config
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let context =
        create_routing_context(&args.model_config()).context("loading routing data")?;

    let route = compute_route(&context, args.start, args.end).context("computing route")?;
    info!(
        nodes = route.node_count(),
        iterations = route.iterations(),
        "route computed"
    );

    let document = serde_json::to_string_pretty(&route.to_geojson()?)?;
    std::fs::write(&args.output, document)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let summary = route.summary();
    println!("Nodes:        {}", summary.node_count);
    println!("Length:       {:.1} m", summary.length_m);
    println!("Total weight: {:.1}", summary.total_weight);
    println!("Written to:   {}", args.output.display());
    Ok(())
}
