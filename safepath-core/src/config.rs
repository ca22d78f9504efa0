//! Tunables for edge scoring and route search

use serde::{Deserialize, Serialize};

use crate::Error;

/// Cycling lanes closer than this to an edge earn the bonus
pub const DEFAULT_CYCLING_LANE_RADIUS_M: f64 = 50.0;
/// Accidents closer than this to an edge apply the penalty
pub const DEFAULT_ACCIDENT_RADIUS_M: f64 = 500.0;
pub const DEFAULT_CYCLING_LANE_BONUS: f64 = 0.10;
pub const DEFAULT_ACCIDENT_PENALTY: f64 = 0.20;
pub const DEFAULT_BASE_DIVISOR: f64 = 1.0;
/// Lower clamp of the divisor; keeps weights finite and positive
pub const DEFAULT_MIN_DIVISOR: f64 = 0.05;

/// Parameters of the per-edge safety divisor.
///
/// The divisor starts at `base_divisor`, gains `cycling_lane_bonus` when any
/// cycling lane lies within `cycling_lane_radius_m` of the edge midpoint,
/// loses `accident_penalty` when any accident lies within
/// `accident_radius_m`, and is finally clamped to `min_divisor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub cycling_lane_radius_m: f64,
    pub accident_radius_m: f64,
    pub cycling_lane_bonus: f64,
    /// Magnitude of the decrement, stored as a non-negative number
    pub accident_penalty: f64,
    pub base_divisor: f64,
    pub min_divisor: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            cycling_lane_radius_m: DEFAULT_CYCLING_LANE_RADIUS_M,
            accident_radius_m: DEFAULT_ACCIDENT_RADIUS_M,
            cycling_lane_bonus: DEFAULT_CYCLING_LANE_BONUS,
            accident_penalty: DEFAULT_ACCIDENT_PENALTY,
            base_divisor: DEFAULT_BASE_DIVISOR,
            min_divisor: DEFAULT_MIN_DIVISOR,
        }
    }
}

impl SafetyConfig {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for negative or non-finite radii and
    /// deltas, or a non-positive base or minimum divisor.
    pub fn validate(&self) -> Result<(), Error> {
        let non_negative = [
            ("cycling_lane_radius_m", self.cycling_lane_radius_m),
            ("accident_radius_m", self.accident_radius_m),
            ("cycling_lane_bonus", self.cycling_lane_bonus),
            ("accident_penalty", self.accident_penalty),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("base_divisor", self.base_divisor),
            ("min_divisor", self.min_divisor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a finite positive number, got {value}"
                )));
            }
        }

        Ok(())
    }
}

/// Limits applied to a single route request
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of nodes the search may expand; unbounded when `None`
    pub max_iterations: Option<usize>,
    /// Request points farther than this from every node fail to resolve
    pub max_snap_distance_m: Option<f64>,
}

impl SearchConfig {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a zero iteration cap or a
    /// non-positive snap distance.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_iterations == Some(0) {
            return Err(Error::InvalidConfig(
                "max_iterations must be greater than zero".to_string(),
            ));
        }
        if let Some(distance) = self.max_snap_distance_m
            && (!distance.is_finite() || distance <= 0.0)
        {
            return Err(Error::InvalidConfig(format!(
                "max_snap_distance_m must be a finite positive number, got {distance}"
            )));
        }
        Ok(())
    }
}
