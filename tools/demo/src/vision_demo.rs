//! Image models on synthetic imagery.

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use landwatch_core::{ImageDimensions, LandwatchConfig, TrainingHistory};
use landwatch_vision::{
    backend_name, burn_device, create_synthetic_image, synthetic_erosion_dataset,
    train_erosion_model, ErosionDetector, ErosionDetectorConfig, ErosionPrediction,
    InferenceBackend, TrainingBackend, VegetationLossDetector, VegetationPrediction, IMAGE_SIZE,
};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct ErosionReport {
    pub backend: String,
    pub input: ImageDimensions,
    pub epochs_trained: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<TrainingHistory>,
    pub prediction: ErosionPrediction,
}

#[derive(Debug, Serialize)]
pub struct VegetationReport {
    pub backend: String,
    pub input: ImageDimensions,
    pub prediction: VegetationPrediction,
}

pub fn run_erosion(config: &LandwatchConfig, quiet: bool) -> Result<ErosionReport> {
    let device = burn_device(&config.device);
    let params = &config.erosion_training;

    let (detector, history) = if params.epochs == 0 {
        (ErosionDetector::<InferenceBackend>::new(&device)?, None)
    } else {
        info!(
            "Training erosion CNN on {} synthetic images for {} epochs",
            params.num_samples, params.epochs
        );
        let items = synthetic_erosion_dataset(params.num_samples, IMAGE_SIZE, params.seed)?;
        let model = ErosionDetectorConfig::new().init::<TrainingBackend>(&device)?;

        let progress = epoch_progress(params.epochs as u64, quiet);
        let (model, history) = train_erosion_model(model, &items, params, &device, |_, loss, acc| {
            progress.set_message(format!("loss {:.4}, acc {:.1}%", loss, acc));
            progress.inc(1);
        })?;
        progress.finish_and_clear();

        (
            ErosionDetector::<InferenceBackend>::with_model(model, &device),
            Some(history),
        )
    };

    let image = create_synthetic_image(config.synthetic.seed).context("Failed to create test image")?;
    let prediction = detector.predict(&image)?;

    Ok(ErosionReport {
        backend: backend_name().to_string(),
        input: detector.input_dimensions(),
        epochs_trained: history.as_ref().map_or(0, TrainingHistory::len),
        history,
        prediction,
    })
}

pub fn run_vegetation(config: &LandwatchConfig) -> Result<VegetationReport> {
    let device = burn_device(&config.device);
    let detector = VegetationLossDetector::<InferenceBackend>::new(&device)?;

    let image = create_synthetic_image(config.synthetic.seed).context("Failed to create test image")?;
    let prediction = detector.predict(&image)?;

    Ok(VegetationReport {
        backend: backend_name().to_string(),
        input: detector.input_dimensions(),
        prediction,
    })
}

fn epoch_progress(epochs: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new(epochs);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} epochs {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    progress.set_style(style);
    progress
}

fn format_dimensions(dims: &ImageDimensions) -> String {
    format!(
        "{}x{}x{} ({} values)",
        dims.width,
        dims.height,
        dims.channels,
        dims.total_values()
    )
}

impl ErosionReport {
    pub fn print(&self) {
        println!();
        println!("{}", "Erosion Detection Results".cyan().bold());
        println!("  Backend:          {}", self.backend);
        println!("  Input:            {}", format_dimensions(&self.input));
        if let Some(history) = &self.history {
            if let Some(loss) = history.final_loss() {
                println!(
                    "  Trained:          {} epochs, final loss {:.4}",
                    self.epochs_trained, loss
                );
            }
            if let (Some(loss), Some(accuracy)) = (history.best_loss(), history.best_accuracy()) {
                println!("  Best Epoch:       loss {:.4}, accuracy {:.1}%", loss, accuracy);
            }
        } else {
            println!("  Trained:          {}", "no (random weights)".dimmed());
        }
        println!("  Erosion Detected: {}", self.prediction.erosion_detected);
        println!(
            "  Erosion Level:    {}",
            self.prediction.erosion_level.name().yellow().bold()
        );
        println!("  Confidence:       {:.2}%", self.prediction.confidence * 100.0);
        println!("  Probabilities:");
        for p in &self.prediction.probabilities {
            println!("    {:<9} {:>6.2}%", p.level.name(), p.probability * 100.0);
        }
    }
}

impl VegetationReport {
    pub fn print(&self) {
        let p = &self.prediction;
        println!();
        println!("{}", "Vegetation Loss Detection Results".cyan().bold());
        println!("  Backend:         {}", self.backend);
        println!("  Input:           {}", format_dimensions(&self.input));
        println!("  Vegetation Loss: {}%", p.vegetation_loss_percentage);
        println!("  NDVI:            {}", p.ndvi);
        println!("  Severity:        {}", p.severity.name().yellow().bold());
        println!("  Health Status:   {}", p.health_status);
    }
}
