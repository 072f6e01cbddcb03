//! Image models for land-degradation analysis.
//!
//! Two Burn CNNs run on RGB satellite imagery:
//! - [`ErosionDetector`] classifies erosion severity (none..critical)
//! - [`VegetationLossDetector`] estimates vegetation loss and a pseudo-NDVI
//!
//! Both share one preprocessing path (224x224, ImageNet normalization, CHW).
//! Weights are randomly initialized unless a model is trained with
//! [`train_erosion_model`] first; nothing is loaded from or saved to disk.

pub mod backend;
pub mod block;
pub mod erosion;
pub mod ndvi;
pub mod preprocess;
pub mod synthetic;
pub mod training;
pub mod vegetation;

pub use backend::{backend_name, burn_device, default_device, InferenceBackend, TrainingBackend};
pub use block::ConvBlock;
pub use erosion::{ErosionDetector, ErosionDetectorCnn, ErosionDetectorConfig, ErosionPrediction};
pub use ndvi::{pseudo_ndvi, pseudo_ndvi_rgb};
pub use preprocess::{ImagePreprocessor, IMAGENET_MEAN, IMAGENET_STD};
pub use synthetic::{create_synthetic_image, synthetic_erosion_dataset};
pub use training::{train_erosion_model, ErosionBatch, ErosionBatcher, ErosionItem};
pub use vegetation::{
    VegetationLossCnn, VegetationLossConfig, VegetationLossDetector, VegetationPrediction,
};

/// Side length of the square model input
pub const IMAGE_SIZE: usize = 224;

/// Number of erosion severity classes
pub const NUM_EROSION_CLASSES: usize = 5;
