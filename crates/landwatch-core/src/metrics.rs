//! Training history recorded by the CNN training loop.

use serde::{Deserialize, Serialize};

/// Per-epoch training metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Epoch numbers (1-based)
    pub epochs: Vec<usize>,
    /// Mean mini-batch loss per epoch
    pub train_loss: Vec<f64>,
    /// Training accuracy per epoch, in percent
    pub train_accuracy: Vec<f64>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds metrics for an epoch
    pub fn add_epoch(&mut self, epoch: usize, train_loss: f64, train_accuracy: f64) {
        self.epochs.push(epoch);
        self.train_loss.push(train_loss);
        self.train_accuracy.push(train_accuracy);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Loss of the last recorded epoch
    pub fn final_loss(&self) -> Option<f64> {
        self.train_loss.last().copied()
    }

    /// Lowest epoch loss
    pub fn best_loss(&self) -> Option<f64> {
        self.train_loss.iter().copied().reduce(f64::min)
    }

    /// Highest epoch accuracy
    pub fn best_accuracy(&self) -> Option<f64> {
        self.train_accuracy.iter().copied().reduce(f64::max)
    }
}
