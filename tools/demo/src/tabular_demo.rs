//! Tabular models on synthetic observations.

use anyhow::Result;
use colored::Colorize;
use landwatch_core::{FeatureVector, LandwatchConfig};
use landwatch_tabular::{
    generate_synthetic_training_data, DegradationPrediction, FeatureImportance,
    LandDegradationClassifier, PartialFeatures, QuickAssessment, VegetationLossEstimate,
    VegetationLossRegressor,
};
use serde::Serialize;
use tracing::info;

/// A degraded site: sparse vegetation, dry soil, hot, little rain
const TEST_FEATURES: [f64; 7] = [0.3, 20.0, 35.0, 50.0, 15.0, 500.0, 2.0];

#[derive(Debug, Serialize)]
pub struct TabularReport {
    pub features: FeatureVector,
    pub degradation: DegradationPrediction,
    pub vegetation_loss: VegetationLossEstimate,
    pub feature_importance: Vec<FeatureImportance>,
    pub quick_assessment: QuickAssessment,
}

pub fn run(config: &LandwatchConfig) -> Result<TabularReport> {
    info!(
        "Generating {} synthetic samples (seed {})",
        config.synthetic.n_samples, config.synthetic.seed
    );
    let data = generate_synthetic_training_data(config.synthetic.n_samples, config.synthetic.seed);

    info!("Training land degradation classifier");
    let mut classifier = LandDegradationClassifier::with_params(config.classifier.clone());
    classifier.train(data.features.view(), &data.degradation_levels)?;

    info!("Training vegetation loss regressor");
    let mut regressor = VegetationLossRegressor::with_params(config.regressor.clone());
    regressor.train(data.features.view(), &data.vegetation_loss)?;

    let features = FeatureVector::from_slice(&TEST_FEATURES)?;
    let quick_assessment = QuickAssessment::from_partial(&PartialFeatures {
        ndvi: Some(features.ndvi),
        soil_moisture: Some(features.soil_moisture),
        temperature: Some(features.temperature),
        precipitation: Some(features.precipitation),
    });

    Ok(TabularReport {
        features,
        degradation: classifier.predict(&features)?,
        vegetation_loss: regressor.predict(&features)?,
        feature_importance: classifier.feature_importance()?,
        quick_assessment,
    })
}

impl TabularReport {
    pub fn print(&self) {
        println!();
        println!("{}", "Land Degradation Prediction".cyan().bold());
        println!(
            "  Degradation Level: {}",
            self.degradation.degradation_level.name().yellow().bold()
        );
        println!("  Confidence:        {:.2}%", self.degradation.confidence * 100.0);
        println!("  Probabilities:");
        for p in &self.degradation.probabilities {
            println!("    {:<9} {:>6.2}%", p.level.name(), p.probability * 100.0);
        }

        println!();
        println!("{}", "Vegetation Loss Prediction".cyan().bold());
        println!(
            "  Vegetation Loss:     {:.2}%",
            self.vegetation_loss.vegetation_loss_percentage
        );
        println!(
            "  Confidence Interval: {:.2}% - {:.2}%",
            self.vegetation_loss.confidence_interval.lower,
            self.vegetation_loss.confidence_interval.upper
        );

        println!();
        println!("{}", "Feature Importance".cyan().bold());
        let mut ranked = self.feature_importance.clone();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        for f in &ranked {
            println!("  {:<15} {:.4}", f.feature, f.importance);
        }

        println!();
        println!("{}", "Rule-based Assessment".cyan().bold());
        println!(
            "  Level: {}  Score: {:.3}  Vegetation Loss: {:.2}%",
            self.quick_assessment.degradation_level.name(),
            self.quick_assessment.degradation_score,
            self.quick_assessment.vegetation_loss_percentage
        );
    }
}
