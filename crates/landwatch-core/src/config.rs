//! Configuration structures for the landwatch models and demos.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result, DEFAULT_SEED};

/// Top-level configuration, loadable from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandwatchConfig {
    /// Synthetic tabular data
    pub synthetic: SyntheticDataConfig,
    /// Degradation classifier forest
    #[serde(deserialize_with = "classifier_params")]
    pub classifier: ForestParams,
    /// Vegetation-loss regressor forest; omitted keys fall back to the regressor preset
    #[serde(deserialize_with = "regressor_params")]
    pub regressor: ForestParams,
    /// Erosion CNN training on synthetic imagery
    pub erosion_training: CnnTrainingParams,
    /// Device selection
    pub device: DeviceConfig,
}

impl Default for LandwatchConfig {
    fn default() -> Self {
        Self {
            synthetic: SyntheticDataConfig::default(),
            classifier: ForestParams::classifier(),
            regressor: ForestParams::regressor(),
            erosion_training: CnnTrainingParams::default(),
            device: DeviceConfig::default(),
        }
    }
}

impl LandwatchConfig {
    /// Sets one seed on every seeded component
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.synthetic.seed = seed;
        self.classifier.seed = seed;
        self.regressor.seed = seed;
        self.erosion_training.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.synthetic.validate()?;
        self.classifier.validate()?;
        self.regressor.validate()?;
        self.erosion_training.validate()
    }
}

/// A `[classifier]` or `[regressor]` table where every key is optional
#[derive(Debug, Deserialize)]
struct ForestOverrides {
    n_estimators: Option<usize>,
    max_depth: Option<usize>,
    min_samples_split: Option<usize>,
    min_samples_leaf: Option<usize>,
    max_features: Option<MaxFeatures>,
    bootstrap: Option<bool>,
    seed: Option<u64>,
}

impl ForestOverrides {
    fn apply(self, base: ForestParams) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators.unwrap_or(base.n_estimators),
            max_depth: self.max_depth.or(base.max_depth),
            min_samples_split: self.min_samples_split.unwrap_or(base.min_samples_split),
            min_samples_leaf: self.min_samples_leaf.unwrap_or(base.min_samples_leaf),
            max_features: self.max_features.unwrap_or(base.max_features),
            bootstrap: self.bootstrap.unwrap_or(base.bootstrap),
            seed: self.seed.unwrap_or(base.seed),
        }
    }
}

fn classifier_params<'de, D>(deserializer: D) -> std::result::Result<ForestParams, D::Error>
where
    D: Deserializer<'de>,
{
    ForestOverrides::deserialize(deserializer).map(|o| o.apply(ForestParams::classifier()))
}

fn regressor_params<'de, D>(deserializer: D) -> std::result::Result<ForestParams, D::Error>
where
    D: Deserializer<'de>,
{
    ForestOverrides::deserialize(deserializer).map(|o| o.apply(ForestParams::regressor()))
}

/// Number of features considered at each split
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    /// floor(sqrt(n_features))
    Sqrt,
    /// floor(log2(n_features))
    Log2,
    /// Every feature
    All,
    /// A fixed count, clamped to the feature count
    Count(usize),
}

impl MaxFeatures {
    /// Resolves to a concrete count in `1..=n_features`
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features.max(1);
        let count = match self {
            MaxFeatures::Sqrt => (n as f64).sqrt().floor() as usize,
            MaxFeatures::Log2 => (n as f64).log2().floor() as usize,
            MaxFeatures::All => n,
            MaxFeatures::Count(k) => k,
        };
        count.clamp(1, n)
    }
}

/// Random forest hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum tree depth (None for unlimited)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each leaf
    pub min_samples_leaf: usize,
    /// Features considered per split
    pub max_features: MaxFeatures,
    /// Whether each tree sees a bootstrap sample
    pub bootstrap: bool,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::classifier()
    }
}

impl ForestParams {
    /// 100 trees of depth 10, sqrt features per split
    pub fn classifier() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: DEFAULT_SEED,
        }
    }

    /// 100 trees of depth 10, all features per split
    pub fn regressor() -> Self {
        Self {
            max_features: MaxFeatures::All,
            ..Self::classifier()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(Error::Config("n_estimators must be greater than 0".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(Error::Config("max_depth must be greater than 0".to_string()));
        }
        if self.min_samples_split < 2 {
            return Err(Error::Config("min_samples_split must be at least 2".to_string()));
        }
        if self.min_samples_leaf == 0 {
            return Err(Error::Config("min_samples_leaf must be at least 1".to_string()));
        }
        if self.max_features == MaxFeatures::Count(0) {
            return Err(Error::Config("max_features count must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Synthetic tabular data generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticDataConfig {
    /// Number of samples to generate
    pub n_samples: usize,
    /// Random seed
    pub seed: u64,
}

impl Default for SyntheticDataConfig {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            seed: DEFAULT_SEED,
        }
    }
}

impl SyntheticDataConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_samples == 0 {
            return Err(Error::Config("n_samples must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Hyperparameters for the CNN training loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CnnTrainingParams {
    /// Number of training epochs
    pub epochs: usize,
    /// Mini-batch size
    pub batch_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Number of synthetic training images
    pub num_samples: usize,
    /// Seed for shuffling and synthetic images
    pub seed: u64,
}

impl Default for CnnTrainingParams {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 8,
            learning_rate: 0.001,
            num_samples: 32,
            seed: DEFAULT_SEED,
        }
    }
}

impl CnnTrainingParams {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be greater than 0".to_string()));
        }
        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return Err(Error::Config("learning_rate must be positive".to_string()));
        }
        Ok(())
    }
}

/// Device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Use a GPU backend when one is compiled in and detected
    pub prefer_gpu: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self { prefer_gpu: true }
    }
}
