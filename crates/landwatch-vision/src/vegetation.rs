//! Vegetation loss CNN and detector.

use burn::{
    config::Config,
    module::Module,
    nn::{
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, Relu,
    },
    tensor::{activation::sigmoid, backend::Backend, Tensor},
};
use landwatch_core::{round_to, Error, HealthStatus, ImageDimensions, VegetationSeverity};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::block::ConvBlock;
use crate::ndvi::pseudo_ndvi;
use crate::preprocess::ImagePreprocessor;

/// Confidence reported with every estimate; the model has no calibrated score
pub const VEGETATION_CONFIDENCE: f64 = 0.85;

#[derive(Config, Debug)]
pub struct VegetationLossConfig {
    /// Square input size; any size of at least 8 works thanks to global pooling
    #[config(default = "224")]
    pub input_size: usize,

    #[config(default = "0.3")]
    pub dropout: f64,
}

impl VegetationLossConfig {
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> landwatch_core::Result<VegetationLossCnn<B>> {
        if self.input_size < 8 {
            return Err(Error::Config(format!(
                "input_size must be at least 8, got {}",
                self.input_size
            )));
        }
        Ok(VegetationLossCnn::new(self, device))
    }
}

/// Vegetation loss regressor
///
/// Three conv blocks (3 -> 64 -> 128 -> 256), global average pooling,
/// then fc 128, dropout, fc 1 and a sigmoid scaled to 0..100.
#[derive(Module, Debug)]
pub struct VegetationLossCnn<B: Backend> {
    pub conv1: ConvBlock<B>,
    pub conv2: ConvBlock<B>,
    pub conv3: ConvBlock<B>,

    pub global_pool: AdaptiveAvgPool2d,

    pub fc1: Linear<B>,
    pub dropout: Dropout,
    pub fc2: Linear<B>,

    input_size: usize,
}

impl<B: Backend> VegetationLossCnn<B> {
    fn new(config: &VegetationLossConfig, device: &B::Device) -> Self {
        Self {
            conv1: ConvBlock::new(3, 64, device),
            conv2: ConvBlock::new(64, 128, device),
            conv3: ConvBlock::new(128, 256, device),
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc1: LinearConfig::new(256, 128).init(device),
            dropout: DropoutConfig::new(config.dropout).init(),
            fc2: LinearConfig::new(128, 1).init(device),
            input_size: config.input_size,
        }
    }

    /// Returns loss percentages of shape [batch_size, 1], each in [0, 100]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);

        // [B, C, H, W] -> [B, C, 1, 1] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = Relu::new().forward(self.fc1.forward(x));
        let x = self.dropout.forward(x);
        sigmoid(self.fc2.forward(x)) * 100.0
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }
}

/// Result of a vegetation loss prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VegetationPrediction {
    /// Rounded to 2 decimals
    pub vegetation_loss_percentage: f64,
    /// Pseudo-NDVI of the original image, rounded to 3 decimals
    pub ndvi: f64,
    pub severity: VegetationSeverity,
    pub health_status: HealthStatus,
    pub confidence: f64,
}

impl VegetationPrediction {
    /// Severity and health are derived from the unrounded loss
    pub fn new(loss_percentage: f64, ndvi: f64) -> Self {
        Self {
            vegetation_loss_percentage: round_to(loss_percentage, 2),
            ndvi: round_to(ndvi, 3),
            severity: VegetationSeverity::from_loss_percentage(loss_percentage),
            health_status: HealthStatus::from_loss_percentage(loss_percentage),
            confidence: VEGETATION_CONFIDENCE,
        }
    }
}

/// Runs the vegetation loss CNN and the pseudo-NDVI on encoded images
pub struct VegetationLossDetector<B: Backend> {
    model: VegetationLossCnn<B>,
    preprocessor: ImagePreprocessor,
    device: B::Device,
}

impl<B: Backend> VegetationLossDetector<B> {
    /// Detector with freshly initialized weights at 224x224
    pub fn new(device: &B::Device) -> landwatch_core::Result<Self> {
        let model = VegetationLossConfig::new().init(device)?;
        Ok(Self::with_model(model, device))
    }

    pub fn with_model(model: VegetationLossCnn<B>, device: &B::Device) -> Self {
        info!(
            "Vegetation loss detector ready ({}x{} input)",
            model.input_size(),
            model.input_size()
        );
        Self {
            preprocessor: ImagePreprocessor::with_size(model.input_size()),
            model,
            device: device.clone(),
        }
    }

    /// Size the input images are resized to
    pub fn input_dimensions(&self) -> ImageDimensions {
        self.preprocessor.output_dimensions()
    }

    pub fn predict(&self, image_bytes: &[u8]) -> landwatch_core::Result<VegetationPrediction> {
        let input = self.preprocessor.bytes_to_tensor::<B>(image_bytes, &self.device)?;
        let output = self
            .model
            .forward(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| Error::Model(format!("failed to read model output: {:?}", e)))?;
        let loss = output
            .first()
            .copied()
            .ok_or_else(|| Error::Model("model produced no output".to_string()))?;

        let ndvi = pseudo_ndvi(image_bytes)?;
        let prediction = VegetationPrediction::new(loss as f64, ndvi);
        debug!(
            "Vegetation prediction: {:.2}% loss, NDVI {:.3}",
            prediction.vegetation_loss_percentage, prediction.ndvi
        );
        Ok(prediction)
    }

    pub fn model(&self) -> &VegetationLossCnn<B> {
        &self.model
    }
}
