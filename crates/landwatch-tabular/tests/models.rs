//! End-to-end checks for the tabular models trained on synthetic data.

use landwatch_core::{DegradationLevel, Error, FeatureVector, ForestParams};
use landwatch_tabular::{
    generate_synthetic_training_data, LandDegradationClassifier, VegetationLossRegressor,
};

fn small_params() -> ForestParams {
    ForestParams {
        n_estimators: 25,
        ..ForestParams::classifier()
    }
}

fn test_rows() -> Vec<FeatureVector> {
    vec![
        FeatureVector::new(0.3, 20.0, 35.0, 50.0, 15.0, 500.0, 2.0),
        FeatureVector::new(0.9, 85.0, 18.0, 180.0, 2.0, 100.0, 1.0),
        FeatureVector::new(0.05, 5.0, 39.0, 10.0, 40.0, 2500.0, 5.0),
        FeatureVector::new(0.5, 50.0, 25.0, 100.0, 10.0, 1200.0, 3.0),
    ]
}

#[test]
fn classifier_probabilities_form_a_distribution() {
    let data = generate_synthetic_training_data(400, 42);
    let mut classifier = LandDegradationClassifier::with_params(small_params());
    classifier
        .train(data.features.view(), &data.degradation_levels)
        .unwrap();

    for row in test_rows() {
        let prediction = classifier.predict(&row).unwrap();
        let total: f64 = prediction.probabilities.iter().map(|p| p.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(prediction
            .probabilities
            .iter()
            .all(|p| (0.0..=1.0).contains(&p.probability)));
        assert!(prediction.confidence > 0.0);
    }
}

#[test]
fn classifier_separates_extremes() {
    let data = generate_synthetic_training_data(600, 42);
    let mut classifier = LandDegradationClassifier::with_params(small_params());
    classifier
        .train(data.features.view(), &data.degradation_levels)
        .unwrap();

    let healthy = classifier.predict(&test_rows()[1]).unwrap();
    let degraded = classifier.predict(&test_rows()[2]).unwrap();
    assert!(healthy.degradation_level <= DegradationLevel::Low);
    assert!(degraded.degradation_level >= DegradationLevel::High);
}

#[test]
fn training_is_reproducible_for_a_seed() {
    let data = generate_synthetic_training_data(300, 42);

    let mut first = LandDegradationClassifier::with_params(small_params());
    first
        .train(data.features.view(), &data.degradation_levels)
        .unwrap();
    let mut second = LandDegradationClassifier::with_params(small_params());
    second
        .train(data.features.view(), &data.degradation_levels)
        .unwrap();

    for row in test_rows() {
        let a = first.predict(&row).unwrap();
        let b = second.predict(&row).unwrap();
        assert_eq!(a.degradation_level, b.degradation_level);
        for (pa, pb) in a.probabilities.iter().zip(&b.probabilities) {
            assert_eq!(pa.probability, pb.probability);
        }
    }
}

#[test]
fn regressor_output_stays_in_range() {
    let data = generate_synthetic_training_data(300, 42);
    let mut regressor = VegetationLossRegressor::with_params(ForestParams {
        n_estimators: 15,
        ..ForestParams::regressor()
    });
    regressor
        .train(data.features.view(), &data.vegetation_loss)
        .unwrap();

    for row in test_rows() {
        let estimate = regressor.predict(&row).unwrap();
        let loss = estimate.vegetation_loss_percentage;
        assert!((0.0..=100.0).contains(&loss));
        assert!(estimate.confidence_interval.lower >= 0.0);
        assert!(estimate.confidence_interval.upper <= 100.0);
        assert!(estimate.confidence_interval.lower <= estimate.confidence_interval.upper);
    }

    // Out-of-range inputs still produce a clamped estimate
    let extreme = regressor
        .predict_row(&[-5.0, -100.0, 90.0, -50.0, 0.0, 0.0, 1.0])
        .unwrap();
    assert!((0.0..=100.0).contains(&extreme.vegetation_loss_percentage));
}

#[test]
fn wrong_feature_count_is_rejected() {
    let data = generate_synthetic_training_data(100, 42);
    let mut classifier = LandDegradationClassifier::with_params(small_params());
    classifier
        .train(data.features.view(), &data.degradation_levels)
        .unwrap();

    for len in [0, 6, 8] {
        let row = vec![1.0; len];
        assert!(matches!(
            classifier.predict_row(&row),
            Err(Error::InvalidArgument(_))
        ));
    }
}
