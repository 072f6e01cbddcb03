//! Training loop for the erosion CNN.
//!
//! A plain custom loop rather than burn's `Learner`: Adam, cross-entropy,
//! seeded shuffling each epoch, batches built on demand.

use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use landwatch_core::{CnnTrainingParams, Error, Result, TrainingHistory};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::erosion::ErosionDetectorCnn;

/// A preprocessed image with its erosion class
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErosionItem {
    /// Normalized CHW values, `3 * size * size`
    pub image: Vec<f32>,
    /// Class index 0..=4
    pub label: usize,
}

impl ErosionItem {
    pub fn new(image: Vec<f32>, label: usize) -> Self {
        Self { image, label }
    }
}

#[derive(Clone, Debug)]
pub struct ErosionBatch<B: Backend> {
    /// [batch_size, 3, size, size]
    pub images: Tensor<B, 4>,
    /// [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Stacks preprocessed items into tensors
#[derive(Clone, Debug)]
pub struct ErosionBatcher {
    image_size: usize,
}

impl ErosionBatcher {
    pub fn new(image_size: usize) -> Self {
        Self { image_size }
    }
}

impl<B: Backend> Batcher<B, ErosionItem, ErosionBatch<B>> for ErosionBatcher {
    fn batch(&self, items: Vec<ErosionItem>, device: &B::Device) -> ErosionBatch<B> {
        let batch_size = items.len();
        let size = self.image_size;

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.iter().copied()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, size, size]),
            device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        ErosionBatch { images, targets }
    }
}

/// Trains `model` on `items` and returns it in inference mode.
///
/// `on_epoch` is called after every epoch with the 1-based epoch number, the
/// mean batch loss and the training accuracy in percent. With zero epochs the
/// model comes back untouched.
pub fn train_erosion_model<B, F>(
    mut model: ErosionDetectorCnn<B>,
    items: &[ErosionItem],
    params: &CnnTrainingParams,
    device: &B::Device,
    mut on_epoch: F,
) -> Result<(ErosionDetectorCnn<B::InnerBackend>, TrainingHistory)>
where
    B: AutodiffBackend,
    F: FnMut(usize, f64, f64),
{
    params.validate()?;
    if items.is_empty() {
        return Err(Error::Training("no training samples".to_string()));
    }

    let image_size = model.input_size();
    let expected = 3 * image_size * image_size;
    if let Some(item) = items.iter().find(|item| item.image.len() != expected) {
        return Err(Error::Data(format!(
            "training image has {} values, model expects {}",
            item.image.len(),
            expected
        )));
    }
    if let Some(item) = items.iter().find(|item| item.label >= crate::NUM_EROSION_CLASSES) {
        return Err(Error::Data(format!("label {} out of range", item.label)));
    }

    let batcher = ErosionBatcher::new(image_size);
    let mut optimizer = AdamConfig::new().init();
    let loss_fn = CrossEntropyLossConfig::new().init(device);
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut history = TrainingHistory::new();

    let mut indices: Vec<usize> = (0..items.len()).collect();
    let num_batches = items.len().div_ceil(params.batch_size);

    info!(
        "Training erosion model: {} samples, {} epochs, batch size {}",
        items.len(),
        params.epochs,
        params.batch_size
    );

    for epoch in 0..params.epochs {
        indices.shuffle(&mut rng);

        let mut epoch_loss = 0.0f64;
        let mut correct = 0usize;

        for (batch_idx, chunk) in indices.chunks(params.batch_size).enumerate() {
            let batch_items: Vec<ErosionItem> = chunk.iter().map(|&i| items[i].clone()).collect();
            let batch: ErosionBatch<B> = batcher.batch(batch_items, device);

            let output = model.forward(batch.images);
            let loss = loss_fn.forward(output.clone(), batch.targets.clone());

            let loss_value: f64 = loss.clone().into_scalar().elem();
            epoch_loss += loss_value;

            let batch_correct: i64 = output
                .argmax(1)
                .squeeze::<1>(1)
                .equal(batch.targets)
                .int()
                .sum()
                .into_scalar()
                .elem();
            correct += batch_correct as usize;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(params.learning_rate, model, grads);

            debug!(
                "Epoch {} batch {}/{}: loss = {:.4}",
                epoch + 1,
                batch_idx + 1,
                num_batches,
                loss_value
            );
        }

        let avg_loss = epoch_loss / num_batches as f64;
        let accuracy = 100.0 * correct as f64 / items.len() as f64;
        history.add_epoch(epoch + 1, avg_loss, accuracy);
        info!("Epoch {}/{}, Loss: {:.4}", epoch + 1, params.epochs, avg_loss);
        on_epoch(epoch + 1, avg_loss, accuracy);
    }

    if !history.is_empty() {
        info!("Training complete!");
    }

    Ok((model.valid(), history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erosion::ErosionDetectorConfig;
    use crate::synthetic::synthetic_erosion_dataset;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn small_params(epochs: usize) -> CnnTrainingParams {
        CnnTrainingParams {
            epochs,
            batch_size: 4,
            learning_rate: 0.001,
            num_samples: 10,
            seed: 42,
        }
    }

    #[test]
    fn test_batcher_shapes() {
        let device = Default::default();
        let items = synthetic_erosion_dataset(3, 16, 1).unwrap();
        let batch: ErosionBatch<NdArray> = ErosionBatcher::new(16).batch(items, &device);

        assert_eq!(batch.images.dims(), [3, 3, 16, 16]);
        assert_eq!(
            batch.targets.into_data().to_vec::<i64>().unwrap(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_training_records_history() {
        let device = Default::default();
        let model = ErosionDetectorConfig::new()
            .with_input_size(16)
            .init::<TestBackend>(&device)
            .unwrap();
        let items = synthetic_erosion_dataset(10, 16, 42).unwrap();

        let mut seen = Vec::new();
        let (trained, history) =
            train_erosion_model(model, &items, &small_params(2), &device, |epoch, loss, _| {
                seen.push((epoch, loss))
            })
            .unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(seen.iter().map(|(e, _)| *e).collect::<Vec<_>>(), vec![1, 2]);
        assert!(history.train_loss.iter().all(|l| l.is_finite() && *l > 0.0));
        assert!(history
            .train_accuracy
            .iter()
            .all(|a| (0.0..=100.0).contains(a)));
        assert_eq!(trained.input_size(), 16);
    }

    #[test]
    fn test_zero_epochs_returns_model() {
        let device = Default::default();
        let model = ErosionDetectorConfig::new()
            .with_input_size(16)
            .init::<TestBackend>(&device)
            .unwrap();
        let items = synthetic_erosion_dataset(2, 16, 42).unwrap();

        let (_, history) =
            train_erosion_model(model, &items, &small_params(0), &device, |_, _, _| {}).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_rejects_bad_data() {
        let device = Default::default();
        let config = ErosionDetectorConfig::new().with_input_size(16);

        let empty = train_erosion_model(
            config.init::<TestBackend>(&device).unwrap(),
            &[],
            &small_params(1),
            &device,
            |_, _, _| {},
        );
        assert!(matches!(empty, Err(Error::Training(_))));

        let wrong_size = synthetic_erosion_dataset(2, 32, 42).unwrap();
        let result = train_erosion_model(
            config.init::<TestBackend>(&device).unwrap(),
            &wrong_size,
            &small_params(1),
            &device,
            |_, _, _| {},
        );
        assert!(matches!(result, Err(Error::Data(_))));
    }
}
