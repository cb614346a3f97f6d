//! Tunable thresholds for the marker locator.
//!
//! Every constant the locator consumes lives here so a deployment can adjust
//! them for its camera and print size without touching the algorithm. The
//! defaults are the values the front desk ships with.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inclusive HSV window a pixel must fall in to count as marker paper.
///
/// Uses the 8-bit convention: hue in `0..=180`, saturation and value in `0..=255`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskBounds {
    /// Hue range (unconstrained by default).
    pub hue: [u8; 2],
    /// Saturation range; printed white paper is nearly colorless.
    pub saturation: [u8; 2],
    /// Value range; printed white paper is bright.
    pub value: [u8; 2],
}

impl Default for MaskBounds {
    fn default() -> Self {
        Self {
            hue: [0, 180],
            saturation: [0, 30],
            value: [200, 255],
        }
    }
}

impl MaskBounds {
    /// Check whether an HSV triple lies inside all three ranges.
    #[inline]
    pub fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        (self.hue[0]..=self.hue[1]).contains(&h)
            && (self.saturation[0]..=self.saturation[1]).contains(&s)
            && (self.value[0]..=self.value[1]).contains(&v)
    }
}

/// Locator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Color window selecting marker pixels.
    pub mask: MaskBounds,
    /// Side of the square structuring element used for closing and opening.
    pub kernel_size: u8,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_frac: f64,
    /// Lower bound of the bounding-box width/height ratio (inclusive).
    pub aspect_min: f32,
    /// Upper bound of the bounding-box width/height ratio (inclusive).
    pub aspect_max: f32,
    /// Candidate polygon area must exceed this many square pixels.
    pub min_area: f64,
    /// Discard candidates with a vertex on the outermost row or column of the frame.
    pub reject_border_contacts: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mask: MaskBounds::default(),
            kernel_size: 5,
            approx_epsilon_frac: 0.1,
            aspect_min: 0.8,
            aspect_max: 1.2,
            min_area: 1000.0,
            reject_border_contacts: true,
        }
    }
}

impl ScanConfig {
    /// Parse a (possibly partial) JSON document over the defaults and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Radius of the structuring element in the L-infinity norm.
    pub fn kernel_radius(&self) -> u8 {
        self.kernel_size / 2
    }

    /// Reject values the locator cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("hue", self.mask.hue),
            ("saturation", self.mask.saturation),
            ("value", self.mask.value),
        ];
        for (name, [lo, hi]) in ranges {
            if lo > hi {
                return Err(ConfigError::Invalid(format!(
                    "{name} range is inverted ({lo} > {hi})"
                )));
            }
        }
        if self.mask.hue[1] > 180 {
            return Err(ConfigError::Invalid(format!(
                "hue upper bound {} exceeds 180",
                self.mask.hue[1]
            )));
        }
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "kernel_size must be odd and positive, got {}",
                self.kernel_size
            )));
        }
        if !(self.approx_epsilon_frac > 0.0 && self.approx_epsilon_frac < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "approx_epsilon_frac must be in (0, 1), got {}",
                self.approx_epsilon_frac
            )));
        }
        if !(self.aspect_min > 0.0 && self.aspect_min <= self.aspect_max) {
            return Err(ConfigError::Invalid(format!(
                "aspect window [{}, {}] is empty or non-positive",
                self.aspect_min, self.aspect_max
            )));
        }
        if !(self.min_area >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "min_area must be non-negative, got {}",
                self.min_area
            )));
        }
        Ok(())
    }
}
