//! Rule-based assessment for callers that only have some observations.

use landwatch_core::{round_to, DegradationLevel};
use serde::{Deserialize, Serialize};

use crate::synthetic::degradation_score;

const DEFAULT_NDVI: f64 = 0.5;
const DEFAULT_SOIL_MOISTURE: f64 = 50.0;
const DEFAULT_TEMPERATURE: f64 = 25.0;
const DEFAULT_PRECIPITATION: f64 = 100.0;

/// Fixed confidence reported by the rule-based path
pub const QUICK_ASSESSMENT_CONFIDENCE: f64 = 0.85;

/// Weights of the score terms, in the order ndvi, soil, temperature, precipitation
pub const SCORE_WEIGHTS: [(&str, f64); 4] = [
    ("ndvi", 0.4),
    ("soil_moisture", 0.3),
    ("temperature", 0.2),
    ("precipitation", 0.1),
];

/// Observations where any field may be missing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PartialFeatures {
    pub ndvi: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuickAssessment {
    pub degradation_level: DegradationLevel,
    /// Raw weighted score, 0 = pristine and 1 = fully degraded
    pub degradation_score: f64,
    /// Score times 100, rounded to 2 decimals
    pub vegetation_loss_percentage: f64,
    pub confidence: f64,
    pub feature_weights: Vec<(String, f64)>,
}

impl QuickAssessment {
    /// Scores the observations, filling missing fields with neutral defaults
    ///
    /// Only `None` is missing; a reading of zero is scored as observed.
    pub fn from_partial(features: &PartialFeatures) -> Self {
        let score = degradation_score(
            features.ndvi.unwrap_or(DEFAULT_NDVI),
            features.soil_moisture.unwrap_or(DEFAULT_SOIL_MOISTURE),
            features.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            features.precipitation.unwrap_or(DEFAULT_PRECIPITATION),
        );

        Self {
            degradation_level: DegradationLevel::from_score(score),
            degradation_score: score,
            vegetation_loss_percentage: round_to(score * 100.0, 2),
            confidence: QUICK_ASSESSMENT_CONFIDENCE,
            feature_weights: SCORE_WEIGHTS
                .iter()
                .map(|(name, weight)| (name.to_string(), *weight))
                .collect(),
        }
    }
}
