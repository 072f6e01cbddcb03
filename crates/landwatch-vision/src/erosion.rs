//! Erosion severity CNN and detector.

use burn::{
    config::Config,
    module::Module,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig, Relu},
    tensor::{activation::softmax, backend::Backend, Tensor},
};
use landwatch_core::{ClassProbability, Error, ErosionLevel, ImageDimensions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::block::ConvBlock;
use crate::preprocess::ImagePreprocessor;
use crate::NUM_EROSION_CLASSES;

/// Channel widths of the four conv blocks
const CHANNELS: [usize; 5] = [3, 32, 64, 128, 256];

/// Configuration for the erosion CNN
#[derive(Config, Debug)]
pub struct ErosionDetectorConfig {
    /// Number of severity classes
    #[config(default = "5")]
    pub num_classes: usize,

    /// Square input size; must be divisible by 16
    #[config(default = "224")]
    pub input_size: usize,

    /// Dropout after the first fully connected layer
    #[config(default = "0.5")]
    pub dropout1: f64,

    /// Dropout after the second fully connected layer
    #[config(default = "0.3")]
    pub dropout2: f64,
}

impl ErosionDetectorConfig {
    /// Spatial side after the four 2x pools
    pub fn feature_size(&self) -> usize {
        self.input_size / 16
    }

    pub fn flattened_features(&self) -> usize {
        CHANNELS[4] * self.feature_size() * self.feature_size()
    }

    pub fn validate(&self) -> landwatch_core::Result<()> {
        if self.input_size < 16 || self.input_size % 16 != 0 {
            return Err(Error::Config(format!(
                "input_size must be a positive multiple of 16, got {}",
                self.input_size
            )));
        }
        if self.num_classes != NUM_EROSION_CLASSES {
            return Err(Error::Config(format!(
                "erosion model predicts {} classes, got {}",
                NUM_EROSION_CLASSES, self.num_classes
            )));
        }
        Ok(())
    }

    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> landwatch_core::Result<ErosionDetectorCnn<B>> {
        self.validate()?;
        Ok(ErosionDetectorCnn::new(self, device))
    }
}

/// Erosion severity classifier
///
/// Architecture:
/// - 4 conv blocks, 3 -> 32 -> 64 -> 128 -> 256, each halving the resolution
/// - flatten (256 x 14 x 14 at 224 input)
/// - fc 512, dropout 0.5, fc 128, dropout 0.3, fc 5
#[derive(Module, Debug)]
pub struct ErosionDetectorCnn<B: Backend> {
    pub conv1: ConvBlock<B>,
    pub conv2: ConvBlock<B>,
    pub conv3: ConvBlock<B>,
    pub conv4: ConvBlock<B>,

    pub fc1: Linear<B>,
    pub dropout1: Dropout,
    pub fc2: Linear<B>,
    pub dropout2: Dropout,
    pub fc3: Linear<B>,

    input_size: usize,
}

impl<B: Backend> ErosionDetectorCnn<B> {
    fn new(config: &ErosionDetectorConfig, device: &B::Device) -> Self {
        Self {
            conv1: ConvBlock::new(CHANNELS[0], CHANNELS[1], device),
            conv2: ConvBlock::new(CHANNELS[1], CHANNELS[2], device),
            conv3: ConvBlock::new(CHANNELS[2], CHANNELS[3], device),
            conv4: ConvBlock::new(CHANNELS[3], CHANNELS[4], device),
            fc1: LinearConfig::new(config.flattened_features(), 512).init(device),
            dropout1: DropoutConfig::new(config.dropout1).init(),
            fc2: LinearConfig::new(512, 128).init(device),
            dropout2: DropoutConfig::new(config.dropout2).init(),
            fc3: LinearConfig::new(128, config.num_classes).init(device),
            input_size: config.input_size,
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, input_size, input_size]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);
        let x = self.conv4.forward(x);

        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        let x = Relu::new().forward(self.fc1.forward(x));
        let x = self.dropout1.forward(x);
        let x = Relu::new().forward(self.fc2.forward(x));
        let x = self.dropout2.forward(x);
        self.fc3.forward(x)
    }

    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(x), 1)
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }
}

/// Result of an erosion prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErosionPrediction {
    /// Any class other than `none`
    pub erosion_detected: bool,
    pub erosion_level: ErosionLevel,
    /// Probability of the predicted class
    pub confidence: f64,
    /// Probability of every class, none..critical
    pub probabilities: Vec<ClassProbability<ErosionLevel>>,
}

impl ErosionPrediction {
    pub fn from_probabilities(probabilities: &[f32]) -> landwatch_core::Result<Self> {
        if probabilities.len() != NUM_EROSION_CLASSES {
            return Err(Error::Model(format!(
                "expected {} class probabilities, got {}",
                NUM_EROSION_CLASSES,
                probabilities.len()
            )));
        }

        let (index, confidence) = probabilities
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &p)| {
                if p > best.1 {
                    (i, p)
                } else {
                    best
                }
            });
        let erosion_level = ErosionLevel::from_index(index)
            .ok_or_else(|| Error::Model(format!("class index {} has no level", index)))?;

        Ok(Self {
            erosion_detected: erosion_level.is_erosion(),
            erosion_level,
            confidence: confidence as f64,
            probabilities: ErosionLevel::ALL
                .iter()
                .zip(probabilities)
                .map(|(&level, &p)| ClassProbability {
                    level,
                    probability: p as f64,
                })
                .collect(),
        })
    }
}

/// Runs the erosion CNN on encoded images
pub struct ErosionDetector<B: Backend> {
    model: ErosionDetectorCnn<B>,
    preprocessor: ImagePreprocessor,
    device: B::Device,
}

impl<B: Backend> ErosionDetector<B> {
    /// Detector with freshly initialized weights at 224x224
    pub fn new(device: &B::Device) -> landwatch_core::Result<Self> {
        let model = ErosionDetectorConfig::new().init(device)?;
        Ok(Self::with_model(model, device))
    }

    /// Wraps an existing (for example freshly trained) model
    pub fn with_model(model: ErosionDetectorCnn<B>, device: &B::Device) -> Self {
        info!(
            "Erosion detector ready ({}x{} input)",
            model.input_size(),
            model.input_size()
        );
        Self {
            preprocessor: ImagePreprocessor::with_size(model.input_size()),
            model,
            device: device.clone(),
        }
    }

    pub fn predict(&self, image_bytes: &[u8]) -> landwatch_core::Result<ErosionPrediction> {
        let input = self.preprocessor.bytes_to_tensor::<B>(image_bytes, &self.device)?;
        let probabilities = self
            .model
            .forward_softmax(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| Error::Model(format!("failed to read probabilities: {:?}", e)))?;

        let prediction = ErosionPrediction::from_probabilities(&probabilities)?;
        debug!(
            "Erosion prediction: {} ({:.3})",
            prediction.erosion_level, prediction.confidence
        );
        Ok(prediction)
    }

    /// Size the input images are resized to
    pub fn input_dimensions(&self) -> ImageDimensions {
        self.preprocessor.output_dimensions()
    }

    pub fn model(&self) -> &ErosionDetectorCnn<B> {
        &self.model
    }
}
