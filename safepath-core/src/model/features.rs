//! Point features that bias edge weights

use geo::Point;
use serde::{Deserialize, Serialize};

use super::coordinate::checked_point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    CyclingLane,
    Accident,
}

impl FeatureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureCategory::CyclingLane => "cycling_lane",
            FeatureCategory::Accident => "accident",
        }
    }
}

/// A single cycling-lane or accident location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointFeature {
    pub category: FeatureCategory,
    /// `x` = longitude, `y` = latitude
    pub geometry: Point<f64>,
}

impl PointFeature {
    pub fn new(category: FeatureCategory, geometry: Point<f64>) -> Self {
        Self { category, geometry }
    }
}

/// Feature record as delivered by a provider.
///
/// Coordinates are optional so that incomplete records can be detected and
/// reported instead of failing the whole dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "lng", alias = "longitude")]
    pub lon: Option<f64>,
    #[serde(default)]
    pub category: Option<FeatureCategory>,
}

impl FeatureRecord {
    /// Validates the record, using `fallback` when it carries no category.
    ///
    /// The error is a human readable reason suitable for load reports.
    pub fn to_feature(&self, fallback: FeatureCategory) -> Result<PointFeature, String> {
        let lat = self.lat.ok_or_else(|| "missing latitude".to_string())?;
        let lon = self.lon.ok_or_else(|| "missing longitude".to_string())?;
        let geometry = checked_point(lat, lon).map_err(|e| e.to_string())?;
        Ok(PointFeature::new(self.category.unwrap_or(fallback), geometry))
    }
}

/// Immutable reference dataset split by category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    cycling_lanes: Vec<Point<f64>>,
    accidents: Vec<Point<f64>>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: PointFeature) {
        match feature.category {
            FeatureCategory::CyclingLane => self.cycling_lanes.push(feature.geometry),
            FeatureCategory::Accident => self.accidents.push(feature.geometry),
        }
    }

    pub fn cycling_lanes(&self) -> &[Point<f64>] {
        &self.cycling_lanes
    }

    pub fn accidents(&self) -> &[Point<f64>] {
        &self.accidents
    }

    pub fn len(&self) -> usize {
        self.cycling_lanes.len() + self.accidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycling_lanes.is_empty() && self.accidents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PointFeature> + '_ {
        let lanes = self
            .cycling_lanes
            .iter()
            .map(|&p| PointFeature::new(FeatureCategory::CyclingLane, p));
        let accidents = self
            .accidents
            .iter()
            .map(|&p| PointFeature::new(FeatureCategory::Accident, p));
        lanes.chain(accidents)
    }
}

impl Extend<PointFeature> for FeatureSet {
    fn extend<T: IntoIterator<Item = PointFeature>>(&mut self, iter: T) {
        for feature in iter {
            self.push(feature);
        }
    }
}

impl FromIterator<PointFeature> for FeatureSet {
    fn from_iter<T: IntoIterator<Item = PointFeature>>(iter: T) -> Self {
        let mut set = FeatureSet::new();
        set.extend(iter);
        set
    }
}
