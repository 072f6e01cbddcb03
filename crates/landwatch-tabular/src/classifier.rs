//! Degradation level classifier.

use landwatch_core::{
    ClassProbability, DegradationLevel, Error, FeatureVector, ForestParams, Result, FEATURE_NAMES,
    NUM_FEATURES,
};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::criterion::Gini;
use crate::forest::{argmax, RandomForest};
use crate::scaler::StandardScaler;
use crate::NUM_DEGRADATION_CLASSES;

/// Result of a degradation prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradationPrediction {
    /// Most probable level
    pub degradation_level: DegradationLevel,
    /// Probability of the predicted level
    pub confidence: f64,
    /// Probability of every level, none..severe
    pub probabilities: Vec<ClassProbability<DegradationLevel>>,
}

impl DegradationPrediction {
    fn from_probabilities(probabilities: &[f64]) -> Result<Self> {
        let index = argmax(probabilities);
        let degradation_level = DegradationLevel::from_index(index)
            .ok_or_else(|| Error::Model(format!("class index {} has no level", index)))?;

        Ok(Self {
            degradation_level,
            confidence: probabilities[index],
            probabilities: DegradationLevel::ALL
                .iter()
                .zip(probabilities)
                .map(|(&level, &probability)| ClassProbability { level, probability })
                .collect(),
        })
    }

    /// Class index of the predicted level (0 = none ... 4 = severe)
    pub fn class_index(&self) -> usize {
        self.degradation_level.index()
    }
}

/// Importance of one input feature
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Standard scaler followed by a random forest over the 5 degradation levels
#[derive(Debug, Clone)]
pub struct LandDegradationClassifier {
    scaler: StandardScaler,
    forest: RandomForest<Gini>,
}

impl Default for LandDegradationClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LandDegradationClassifier {
    /// 100 trees, depth 10, seed 42
    pub fn new() -> Self {
        Self::with_params(ForestParams::classifier())
    }

    pub fn with_params(params: ForestParams) -> Self {
        Self {
            scaler: StandardScaler::new(),
            forest: RandomForest::new(Gini::new(NUM_DEGRADATION_CLASSES), params),
        }
    }

    /// Fits the scaler, then the forest on the scaled features.
    ///
    /// `x` must have one column per feature in [`FEATURE_NAMES`] order and
    /// `y` must hold class indices 0..=4.
    pub fn train(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<()> {
        if x.ncols() != NUM_FEATURES {
            return Err(Error::InvalidArgument(format!(
                "expected {} feature columns, got {}",
                NUM_FEATURES,
                x.ncols()
            )));
        }

        let scaled = self.scaler.fit_transform(x)?;
        self.forest.fit(scaled.view(), y)?;
        info!("Trained degradation classifier on {} samples", x.nrows());
        Ok(())
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<DegradationPrediction> {
        self.predict_row(&features.to_array())
    }

    /// Predicts from a raw feature row; the wrong column count is an error
    pub fn predict_row(&self, row: &[f64]) -> Result<DegradationPrediction> {
        self.check_trained()?;
        let scaled = self.scaler.transform_row(row)?;
        let probabilities = self.forest.predict_proba_row(&scaled)?;
        DegradationPrediction::from_probabilities(&probabilities)
    }

    pub fn predict_batch(&self, x: ArrayView2<'_, f64>) -> Result<Vec<DegradationPrediction>> {
        x.rows()
            .into_iter()
            .map(|row| self.predict_row(&row.to_vec()))
            .collect()
    }

    /// Named impurity-based importances, in feature order
    pub fn feature_importance(&self) -> Result<Vec<FeatureImportance>> {
        self.check_trained()?;
        Ok(FEATURE_NAMES
            .iter()
            .zip(self.forest.feature_importances()?)
            .map(|(name, importance)| FeatureImportance {
                feature: name.to_string(),
                importance,
            })
            .collect())
    }

    pub fn is_trained(&self) -> bool {
        self.forest.is_fitted()
    }

    fn check_trained(&self) -> Result<()> {
        if self.is_trained() {
            Ok(())
        } else {
            Err(Error::Model("classifier has not been trained".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::generate_synthetic_training_data;

    fn quick_classifier() -> LandDegradationClassifier {
        let data = generate_synthetic_training_data(300, 42);
        let mut classifier = LandDegradationClassifier::with_params(ForestParams {
            n_estimators: 20,
            ..ForestParams::classifier()
        });
        classifier
            .train(data.features.view(), &data.degradation_levels)
            .unwrap();
        classifier
    }

    #[test]
    fn test_predict_returns_full_distribution() {
        let classifier = quick_classifier();
        let features = FeatureVector::new(0.3, 20.0, 35.0, 50.0, 15.0, 500.0, 2.0);
        let prediction = classifier.predict(&features).unwrap();

        assert_eq!(prediction.probabilities.len(), 5);
        assert_eq!(prediction.probabilities[0].level, DegradationLevel::None);
        assert_eq!(prediction.probabilities[4].level, DegradationLevel::Severe);
        let max = prediction
            .probabilities
            .iter()
            .map(|p| p.probability)
            .fold(0.0, f64::max);
        assert_eq!(prediction.confidence, max);
    }

    #[test]
    fn test_degraded_site_scores_high() {
        let classifier = quick_classifier();
        // score = 0.7*0.4 + 0.8*0.3 + 0.875*0.2 + 0.75*0.1 = 0.77
        let features = FeatureVector::new(0.3, 20.0, 35.0, 50.0, 15.0, 500.0, 2.0);
        let prediction = classifier.predict(&features).unwrap();
        assert!(prediction.degradation_level >= DegradationLevel::Moderate);
    }

    #[test]
    fn test_untrained_classifier_errors() {
        let classifier = LandDegradationClassifier::new();
        let features = FeatureVector::new(0.5, 50.0, 25.0, 100.0, 10.0, 200.0, 1.0);
        assert!(matches!(classifier.predict(&features), Err(Error::Model(_))));
        assert!(classifier.feature_importance().is_err());
    }

    #[test]
    fn test_wrong_column_count() {
        let classifier = quick_classifier();
        assert!(matches!(
            classifier.predict_row(&[0.3, 20.0, 35.0]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_train_rejects_wrong_width() {
        let x = ndarray::Array2::<f64>::zeros((10, 3));
        let mut classifier = LandDegradationClassifier::new();
        assert!(matches!(
            classifier.train(x.view(), &[0; 10]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_feature_importance_names_and_sum() {
        let classifier = quick_classifier();
        let importance = classifier.feature_importance().unwrap();

        assert_eq!(importance.len(), 7);
        assert_eq!(importance[0].feature, "ndvi");
        assert_eq!(importance[6].feature, "land_use_code");
        let total: f64 = importance.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-9);
        // NDVI carries the largest weight in the synthetic label
        let ndvi = importance[0].importance;
        assert!(importance[4..].iter().all(|f| f.importance < ndvi));
    }

    #[test]
    fn test_predict_batch() {
        let classifier = quick_classifier();
        let data = generate_synthetic_training_data(5, 1);
        let predictions = classifier.predict_batch(data.features.view()).unwrap();
        assert_eq!(predictions.len(), 5);
    }

    #[test]
    fn test_prediction_serializes_lowercase_levels() {
        let prediction =
            DegradationPrediction::from_probabilities(&[0.1, 0.2, 0.5, 0.1, 0.1]).unwrap();
        assert_eq!(prediction.degradation_level, DegradationLevel::Moderate);
        assert_eq!(prediction.class_index(), 2);

        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(json["degradation_level"], "moderate");
        assert_eq!(json["probabilities"][4]["level"], "severe");
    }
}
