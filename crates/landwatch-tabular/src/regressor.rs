//! Vegetation loss regressor.

use landwatch_core::{
    ConfidenceInterval, Error, FeatureVector, ForestParams, Result, NUM_FEATURES,
};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::criterion::Mse;
use crate::forest::RandomForest;
use crate::scaler::StandardScaler;

/// Half-width of the reported interval, in percentage points
const INTERVAL_HALF_WIDTH: f64 = 5.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VegetationLossEstimate {
    /// Predicted loss clamped to [0, 100]
    pub vegetation_loss_percentage: f64,
    pub confidence_interval: ConfidenceInterval,
}

impl VegetationLossEstimate {
    /// The interval is taken around the unclamped prediction and then clamped
    /// to the valid range on each side.
    fn from_raw(raw: f64) -> Self {
        Self {
            vegetation_loss_percentage: raw.clamp(0.0, 100.0),
            confidence_interval: ConfidenceInterval {
                lower: (raw - INTERVAL_HALF_WIDTH).max(0.0),
                upper: (raw + INTERVAL_HALF_WIDTH).min(100.0),
            },
        }
    }
}

/// Standard scaler followed by a regression forest predicting loss percentage
#[derive(Debug, Clone)]
pub struct VegetationLossRegressor {
    scaler: StandardScaler,
    forest: RandomForest<Mse>,
}

impl Default for VegetationLossRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl VegetationLossRegressor {
    pub fn new() -> Self {
        Self::with_params(ForestParams::regressor())
    }

    pub fn with_params(params: ForestParams) -> Self {
        Self {
            scaler: StandardScaler::new(),
            forest: RandomForest::new(Mse, params),
        }
    }

    pub fn train(&mut self, x: ArrayView2<'_, f64>, y: &[f64]) -> Result<()> {
        if x.ncols() != NUM_FEATURES {
            return Err(Error::InvalidArgument(format!(
                "expected {} feature columns, got {}",
                NUM_FEATURES,
                x.ncols()
            )));
        }

        let scaled = self.scaler.fit_transform(x)?;
        self.forest.fit(scaled.view(), y)?;
        info!("Trained vegetation loss regressor on {} samples", x.nrows());
        Ok(())
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<VegetationLossEstimate> {
        self.predict_row(&features.to_array())
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<VegetationLossEstimate> {
        if !self.is_trained() {
            return Err(Error::Model("regressor has not been trained".to_string()));
        }
        let scaled = self.scaler.transform_row(row)?;
        let raw = self.forest.predict_row(&scaled)?;
        Ok(VegetationLossEstimate::from_raw(raw))
    }

    pub fn is_trained(&self) -> bool {
        self.forest.is_fitted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::generate_synthetic_training_data;

    #[test]
    fn test_interval_from_raw() {
        let estimate = VegetationLossEstimate::from_raw(42.0);
        assert_eq!(estimate.vegetation_loss_percentage, 42.0);
        assert_eq!(estimate.confidence_interval.lower, 37.0);
        assert_eq!(estimate.confidence_interval.upper, 47.0);
    }

    #[test]
    fn test_interval_clamped_at_edges() {
        let low = VegetationLossEstimate::from_raw(2.0);
        assert_eq!(low.confidence_interval.lower, 0.0);
        assert_eq!(low.confidence_interval.upper, 7.0);

        let high = VegetationLossEstimate::from_raw(103.0);
        assert_eq!(high.vegetation_loss_percentage, 100.0);
        assert_eq!(high.confidence_interval.lower, 98.0);
        assert_eq!(high.confidence_interval.upper, 100.0);

        let negative = VegetationLossEstimate::from_raw(-4.0);
        assert_eq!(negative.vegetation_loss_percentage, 0.0);
        assert_eq!(negative.confidence_interval.lower, 0.0);
        assert_eq!(negative.confidence_interval.upper, 1.0);
    }

    #[test]
    fn test_predict_in_range() {
        let data = generate_synthetic_training_data(200, 42);
        let mut regressor = VegetationLossRegressor::with_params(ForestParams {
            n_estimators: 10,
            ..ForestParams::regressor()
        });
        regressor
            .train(data.features.view(), &data.vegetation_loss)
            .unwrap();

        let features = FeatureVector::new(0.3, 20.0, 35.0, 50.0, 15.0, 500.0, 2.0);
        let estimate = regressor.predict(&features).unwrap();
        let loss = estimate.vegetation_loss_percentage;
        assert!((0.0..=100.0).contains(&loss));
        assert!(estimate.confidence_interval.lower <= loss);
        assert!(estimate.confidence_interval.upper >= loss);
        // target for this row is 77
        assert!(loss > 50.0);
    }

    #[test]
    fn test_untrained_regressor_errors() {
        let regressor = VegetationLossRegressor::new();
        assert!(matches!(
            regressor.predict_row(&[0.0; 7]),
            Err(Error::Model(_))
        ));
    }
}
