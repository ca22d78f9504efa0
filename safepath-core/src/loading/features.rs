//! Feature providers: cycling lanes and accidents from CSV, JSON or GeoJSON
//!
//! Malformed records are skipped and counted unless strict mode is on, in
//! which case the first one aborts the load.

use std::{fs::File, io::BufReader, io::Read, path::Path};

use geojson::GeoJson;
use itertools::{Either, Itertools};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::RoutingModelConfig;
use crate::{
    Error,
    model::{FeatureCategory, FeatureRecord, FeatureSet, PointFeature, checked_point},
};

/// Number of individual skipped records written to the log per file
const MAX_LOGGED_REJECTIONS: usize = 10;

/// Outcome of loading one feature file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeatureLoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Load outcome per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeatureSummary {
    pub cycling_lanes: FeatureLoadReport,
    pub accidents: FeatureLoadReport,
}

impl FeatureSummary {
    pub fn skipped(&self) -> usize {
        self.cycling_lanes.skipped + self.accidents.skipped
    }
}

/// Supported feature file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureFormat {
    Csv,
    Json,
    GeoJson,
}

impl FeatureFormat {
    /// Detects the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "geojson" => Some(Self::GeoJson),
            _ => None,
        }
    }
}

/// CSV row of a preprocessed collision or lane export. Cells are read as
/// text so that empty or garbled coordinates reject only their row.
///
/// Raw collision exports carry a `BICYCLE` column; when it is present only
/// rows marked `YES` are features.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CsvFeatureRow {
    #[serde(alias = "lat", alias = "LAT_WGS84")]
    latitude: String,
    #[serde(alias = "lon", alias = "lng", alias = "LONG_WGS84")]
    longitude: String,
    #[serde(rename = "BICYCLE")]
    bicycle: String,
}

impl CsvFeatureRow {
    fn involves_bicycle(&self) -> bool {
        self.bicycle.trim().eq_ignore_ascii_case("yes")
    }

    fn to_feature(&self, category: FeatureCategory) -> Result<PointFeature, String> {
        let lat = parse_cell(&self.latitude, "latitude")?;
        let lon = parse_cell(&self.longitude, "longitude")?;
        checked_point(lat, lon)
            .map(|geometry| PointFeature::new(category, geometry))
            .map_err(|e| e.to_string())
    }
}

fn parse_cell(cell: &str, name: &str) -> Result<f64, String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Err(format!("missing {name}"));
    }
    cell.parse().map_err(|_| format!("unparsable {name} '{cell}'"))
}

/// Loads one feature file, dispatching on its extension.
///
/// `category` is assigned to records that do not carry their own.
///
/// # Errors
///
/// I/O and document-level parse errors, [`Error::InvalidConfig`] for an
/// unknown extension, and [`Error::DataInconsistency`] for a malformed record
/// when `strict` is set.
pub fn load_features(
    path: impl AsRef<Path>,
    category: FeatureCategory,
    strict: bool,
) -> Result<(Vec<PointFeature>, FeatureLoadReport), Error> {
    let path = path.as_ref();
    let format = FeatureFormat::from_path(path).ok_or_else(|| {
        Error::InvalidConfig(format!(
            "unsupported feature file {}; expected .csv, .json or .geojson",
            path.display()
        ))
    })?;

    info!(
        "Loading {} features from {}",
        category.as_str(),
        path.display()
    );
    let reader = BufReader::new(File::open(path)?);
    let source = path.display().to_string();
    read_features(reader, format, category, strict, &source)
}

/// Reader-based counterpart of [`load_features`]; `source` names the input
/// in log messages and errors.
///
/// # Errors
///
/// See [`load_features`].
pub fn read_features(
    reader: impl Read,
    format: FeatureFormat,
    category: FeatureCategory,
    strict: bool,
    source: &str,
) -> Result<(Vec<PointFeature>, FeatureLoadReport), Error> {
    let records = match format {
        FeatureFormat::Csv => csv_records(reader, category)?,
        FeatureFormat::Json => json_records(reader, category)?,
        FeatureFormat::GeoJson => geojson_records(reader, category)?,
    };
    collect_features(records, strict, source)
}

fn csv_records(
    reader: impl Read,
    category: FeatureCategory,
) -> Result<Vec<Result<PointFeature, String>>, Error> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    let has = |names: &[&str]| headers.iter().any(|h| names.contains(&h.trim()));
    let has_lat = has(&["latitude", "lat", "LAT_WGS84"]);
    let has_lon = has(&["longitude", "lon", "lng", "LONG_WGS84"]);
    if !has_lat || !has_lon {
        return Err(Error::DataInconsistency(
            "feature CSV has no latitude/longitude columns".to_string(),
        ));
    }

    let bicycle_only = has(&["BICYCLE"]);

    let mut excluded = 0_usize;
    let records = reader
        .deserialize::<CsvFeatureRow>()
        .filter_map(|row| match row {
            Ok(row) if bicycle_only && !row.involves_bicycle() => {
                excluded += 1;
                None
            }
            Ok(row) => Some(row.to_feature(category)),
            Err(e) => Some(Err(e.to_string())),
        })
        .collect();
    if excluded > 0 {
        info!("Ignored {excluded} collision rows without bicycle involvement");
    }
    Ok(records)
}

fn json_records(
    reader: impl Read,
    category: FeatureCategory,
) -> Result<Vec<Result<PointFeature, String>>, Error> {
    // Elements are decoded one by one so that a bad record does not reject
    // the whole array.
    let values: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
    Ok(values
        .into_iter()
        .map(|value| {
            serde_json::from_value::<FeatureRecord>(value)
                .map_err(|e| e.to_string())
                .and_then(|record| record.to_feature(category))
        })
        .collect())
}

fn geojson_records(
    mut reader: impl Read,
    category: FeatureCategory,
) -> Result<Vec<Result<PointFeature, String>>, Error> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let document: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| Error::GeoJsonError(e.to_string()))?;

    let geometries: Vec<Option<geojson::Geometry>> = match document {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .map(|feature| feature.geometry)
            .collect(),
        GeoJson::Feature(feature) => vec![feature.geometry],
        GeoJson::Geometry(geometry) => vec![Some(geometry)],
    };

    Ok(geometries
        .into_iter()
        .flat_map(|geometry| match geometry {
            Some(geometry) => geometry_features(geometry, category),
            None => vec![Err("feature without geometry".to_string())],
        })
        .collect())
}

/// Points become one feature; line vertices each become a feature.
fn geometry_features(
    geometry: geojson::Geometry,
    category: FeatureCategory,
) -> Vec<Result<PointFeature, String>> {
    let geometry = match geo::Geometry::<f64>::try_from(geometry) {
        Ok(geometry) => geometry,
        Err(e) => return vec![Err(e.to_string())],
    };

    let coords: Vec<geo::Coord<f64>> = match geometry {
        geo::Geometry::Point(point) => vec![point.0],
        geo::Geometry::MultiPoint(points) => points.iter().map(|p| p.0).collect(),
        geo::Geometry::LineString(line) => line.0,
        geo::Geometry::MultiLineString(lines) => {
            lines.into_iter().flat_map(|line| line.0).collect()
        }
        _ => return vec![Err("unsupported geometry type".to_string())],
    };

    coords
        .into_iter()
        .map(|coord| {
            checked_point(coord.y, coord.x)
                .map(|geometry| PointFeature::new(category, geometry))
                .map_err(|e| e.to_string())
        })
        .collect()
}

fn collect_features(
    records: Vec<Result<PointFeature, String>>,
    strict: bool,
    source: &str,
) -> Result<(Vec<PointFeature>, FeatureLoadReport), Error> {
    let (features, rejected): (Vec<_>, Vec<_>) = records
        .into_iter()
        .enumerate()
        .partition_map(|(index, record)| match record {
            Ok(feature) => Either::Left(feature),
            Err(reason) => Either::Right((index, reason)),
        });

    if strict && let Some((index, reason)) = rejected.first() {
        return Err(Error::DataInconsistency(format!(
            "{source}: record {index}: {reason}"
        )));
    }

    for (index, reason) in rejected.iter().take(MAX_LOGGED_REJECTIONS) {
        warn!("{source}: skipping record {index}: {reason}");
    }
    if rejected.len() > MAX_LOGGED_REJECTIONS {
        warn!(
            "{source}: {} more malformed records skipped",
            rejected.len() - MAX_LOGGED_REJECTIONS
        );
    }

    let report = FeatureLoadReport {
        loaded: features.len(),
        skipped: rejected.len(),
    };
    info!(
        "{source}: loaded {} features, skipped {}",
        report.loaded, report.skipped
    );
    Ok((features, report))
}

/// Loads both feature files named in `config`; absent files contribute no
/// features.
///
/// # Errors
///
/// See [`load_features`].
pub fn load_feature_set(
    config: &RoutingModelConfig,
) -> Result<(FeatureSet, FeatureSummary), Error> {
    let mut set = FeatureSet::new();
    let mut summary = FeatureSummary::default();

    if let Some(path) = &config.cycling_lanes_path {
        let (features, report) =
            load_features(path, FeatureCategory::CyclingLane, config.strict_features)?;
        set.extend(features);
        summary.cycling_lanes = report;
    }
    if let Some(path) = &config.accidents_path {
        let (features, report) =
            load_features(path, FeatureCategory::Accident, config.strict_features)?;
        set.extend(features);
        summary.accidents = report;
    }

    Ok((set, summary))
}
