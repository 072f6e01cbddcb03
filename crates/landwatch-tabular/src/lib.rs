//! Tabular land-degradation models.
//!
//! A standard scaler in front of a random forest, used twice:
//! - [`LandDegradationClassifier`] predicts a degradation level (none..severe)
//! - [`VegetationLossRegressor`] predicts a vegetation loss percentage
//!
//! The forests are hand-rolled CART ensembles trained in parallel with rayon.
//! Every tree is seeded from the forest seed, so training is reproducible.

pub mod assessment;
pub mod classifier;
pub mod criterion;
pub mod forest;
pub mod regressor;
pub mod scaler;
pub mod synthetic;
pub mod tree;

pub use assessment::{PartialFeatures, QuickAssessment};
pub use classifier::{DegradationPrediction, FeatureImportance, LandDegradationClassifier};
pub use criterion::{Gini, Mse, SplitCriterion};
pub use forest::RandomForest;
pub use regressor::{VegetationLossEstimate, VegetationLossRegressor};
pub use scaler::StandardScaler;
pub use synthetic::{degradation_score, generate_synthetic_training_data, SyntheticDataset};
pub use tree::{DecisionTree, Node, TreeParams};

/// Number of degradation classes predicted by the classifier
pub const NUM_DEGRADATION_CLASSES: usize = 5;
