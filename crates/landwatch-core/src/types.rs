//! Domain types shared by the tabular and image models.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of tabular features per sample
pub const NUM_FEATURES: usize = 7;

/// Feature names in column order
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "ndvi",
    "soil_moisture",
    "temperature",
    "precipitation",
    "slope",
    "elevation",
    "land_use_code",
];

/// Upper bucket edges for degradation scores (none < 0.2 <= low < 0.4 ...)
pub const DEGRADATION_THRESHOLDS: [f64; 4] = [0.2, 0.4, 0.6, 0.8];

/// Environmental features sampled at a single point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    /// Normalized Difference Vegetation Index (0-1)
    pub ndvi: f64,
    /// Soil moisture in percent (0-100)
    pub soil_moisture: f64,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Precipitation in millimetres
    pub precipitation: f64,
    /// Terrain slope in degrees
    pub slope: f64,
    /// Elevation in metres
    pub elevation: f64,
    /// Land-use category code (1-5)
    pub land_use_code: f64,
}

impl FeatureVector {
    /// Creates a feature vector from its fields in column order
    pub fn new(
        ndvi: f64,
        soil_moisture: f64,
        temperature: f64,
        precipitation: f64,
        slope: f64,
        elevation: f64,
        land_use_code: f64,
    ) -> Self {
        Self {
            ndvi,
            soil_moisture,
            temperature,
            precipitation,
            slope,
            elevation,
            land_use_code,
        }
    }

    /// Builds a feature vector from a row, rejecting the wrong column count
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        if values.len() != NUM_FEATURES {
            return Err(Error::InvalidArgument(format!(
                "expected {} features, got {}",
                NUM_FEATURES,
                values.len()
            )));
        }

        Ok(Self::new(
            values[0], values[1], values[2], values[3], values[4], values[5], values[6],
        ))
    }

    /// Returns the features in column order
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.ndvi,
            self.soil_moisture,
            self.temperature,
            self.precipitation,
            self.slope,
            self.elevation,
            self.land_use_code,
        ]
    }
}

/// Ordinal land degradation severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DegradationLevel {
    None,
    Low,
    Moderate,
    High,
    Severe,
}

impl DegradationLevel {
    /// All levels in class-index order
    pub const ALL: [DegradationLevel; 5] = [
        DegradationLevel::None,
        DegradationLevel::Low,
        DegradationLevel::Moderate,
        DegradationLevel::High,
        DegradationLevel::Severe,
    ];

    /// Class index (0 = none ... 4 = severe)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Level for a class index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Buckets a weighted degradation score.
    ///
    /// Scores at or above the last threshold are severe, including scores of
    /// 1.0 and above.
    pub fn from_score(score: f64) -> Self {
        let bucket = DEGRADATION_THRESHOLDS
            .iter()
            .take_while(|&&edge| score >= edge)
            .count();
        Self::ALL[bucket]
    }

    pub fn name(self) -> &'static str {
        match self {
            DegradationLevel::None => "none",
            DegradationLevel::Low => "low",
            DegradationLevel::Moderate => "moderate",
            DegradationLevel::High => "high",
            DegradationLevel::Severe => "severe",
        }
    }
}

impl std::fmt::Display for DegradationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Erosion severity predicted from satellite imagery
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ErosionLevel {
    None,
    Minimal,
    Moderate,
    Severe,
    Critical,
}

impl ErosionLevel {
    /// All levels in class-index order
    pub const ALL: [ErosionLevel; 5] = [
        ErosionLevel::None,
        ErosionLevel::Minimal,
        ErosionLevel::Moderate,
        ErosionLevel::Severe,
        ErosionLevel::Critical,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Any class above `None` counts as detected erosion
    pub fn is_erosion(self) -> bool {
        self != ErosionLevel::None
    }

    pub fn name(self) -> &'static str {
        match self {
            ErosionLevel::None => "none",
            ErosionLevel::Minimal => "minimal",
            ErosionLevel::Moderate => "moderate",
            ErosionLevel::Severe => "severe",
            ErosionLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ErosionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Severity bucket for an image-level vegetation loss percentage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VegetationSeverity {
    Minimal,
    Moderate,
    Significant,
    Severe,
}

impl VegetationSeverity {
    pub fn from_loss_percentage(loss: f64) -> Self {
        if loss < 10.0 {
            VegetationSeverity::Minimal
        } else if loss < 30.0 {
            VegetationSeverity::Moderate
        } else if loss < 60.0 {
            VegetationSeverity::Significant
        } else {
            VegetationSeverity::Severe
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VegetationSeverity::Minimal => "minimal",
            VegetationSeverity::Moderate => "moderate",
            VegetationSeverity::Significant => "significant",
            VegetationSeverity::Severe => "severe",
        }
    }
}

impl std::fmt::Display for VegetationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Coarse vegetation health derived from the loss percentage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

impl HealthStatus {
    /// Healthy below 20% loss
    pub fn from_loss_percentage(loss: f64) -> Self {
        if loss < 20.0 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
        }
    }
}

/// Probability assigned to one class of a prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClassProbability<L> {
    pub level: L,
    pub probability: f64,
}

/// Lower/upper band around a regression output
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Image dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDimensions {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of channels (3 for RGB)
    pub channels: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Number of values in a CHW tensor of these dimensions
    pub fn total_values(&self) -> usize {
        (self.width * self.height * self.channels) as usize
    }
}

/// Rounds to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
