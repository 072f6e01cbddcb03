//! Split criteria for CART trees.
//!
//! A criterion knows how to measure node impurity, what a leaf stores, and
//! how to find the best threshold along one feature.

use landwatch_core::{Error, Result};

/// Best threshold found along one feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    /// Samples with `value <= threshold` go left
    pub threshold: f64,
    /// Sample-weighted mean impurity of the two children
    pub impurity: f64,
}

pub trait SplitCriterion: Send + Sync {
    /// Training target type
    type Target: Copy + Send + Sync;
    /// Value stored in a leaf
    type Leaf: Clone + Send + Sync + std::fmt::Debug;

    /// Rejects targets the criterion cannot handle
    fn validate_targets(&self, _targets: &[Self::Target]) -> Result<()> {
        Ok(())
    }

    fn impurity(&self, targets: &[Self::Target]) -> f64;

    fn leaf(&self, targets: &[Self::Target]) -> Self::Leaf;

    /// Scans `(value, target)` pairs sorted by value.
    ///
    /// Only positions between two distinct values with at least `min_leaf`
    /// samples on each side are candidates.
    fn best_split(&self, sorted: &[(f64, Self::Target)], min_leaf: usize) -> Option<SplitCandidate>;
}

/// Threshold halfway between two distinct sorted values.
///
/// Falls back to the lower value when the midpoint rounds up to the upper
/// one, so the upper sample always goes right.
fn midpoint(lower: f64, upper: f64) -> f64 {
    let mid = lower + (upper - lower) / 2.0;
    if mid >= upper {
        lower
    } else {
        mid
    }
}

/// Gini impurity over `n_classes` labels; leaves hold class distributions
#[derive(Debug, Clone, Copy)]
pub struct Gini {
    pub n_classes: usize,
}

impl Gini {
    pub fn new(n_classes: usize) -> Self {
        Self { n_classes }
    }

    fn counts(&self, targets: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &label in targets {
            counts[label] += 1.0;
        }
        counts
    }
}

fn gini_from_counts(counts: &[f64], n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = counts.iter().map(|c| c * c).sum();
    1.0 - sum_sq / (n * n)
}

impl SplitCriterion for Gini {
    type Target = usize;
    type Leaf = Vec<f64>;

    fn validate_targets(&self, targets: &[usize]) -> Result<()> {
        match targets.iter().find(|&&label| label >= self.n_classes) {
            Some(label) => Err(Error::Data(format!(
                "label {} outside 0..{}",
                label, self.n_classes
            ))),
            None => Ok(()),
        }
    }

    fn impurity(&self, targets: &[usize]) -> f64 {
        gini_from_counts(&self.counts(targets), targets.len() as f64)
    }

    fn leaf(&self, targets: &[usize]) -> Vec<f64> {
        let n = targets.len() as f64;
        let counts = self.counts(targets);
        if n == 0.0 {
            return vec![1.0 / self.n_classes as f64; self.n_classes];
        }
        counts.into_iter().map(|c| c / n).collect()
    }

    fn best_split(&self, sorted: &[(f64, usize)], min_leaf: usize) -> Option<SplitCandidate> {
        let n = sorted.len();
        let mut left = vec![0.0; self.n_classes];
        let mut right = vec![0.0; self.n_classes];
        for &(_, label) in sorted {
            right[label] += 1.0;
        }

        let mut best: Option<SplitCandidate> = None;
        for i in 0..n.saturating_sub(1) {
            let label = sorted[i].1;
            left[label] += 1.0;
            right[label] -= 1.0;

            let n_left = i + 1;
            let n_right = n - n_left;
            if sorted[i].0 == sorted[i + 1].0 || n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let impurity = (n_left as f64 * gini_from_counts(&left, n_left as f64)
                + n_right as f64 * gini_from_counts(&right, n_right as f64))
                / n as f64;

            if best.map_or(true, |b| impurity < b.impurity) {
                best = Some(SplitCandidate {
                    threshold: midpoint(sorted[i].0, sorted[i + 1].0),
                    impurity,
                });
            }
        }

        best
    }
}

/// Mean squared error; leaves hold the mean target
#[derive(Debug, Clone, Copy, Default)]
pub struct Mse;

impl SplitCriterion for Mse {
    type Target = f64;
    type Leaf = f64;

    fn validate_targets(&self, targets: &[f64]) -> Result<()> {
        if targets.iter().all(|t| t.is_finite()) {
            Ok(())
        } else {
            Err(Error::Data("regression targets must be finite".to_string()))
        }
    }

    fn impurity(&self, targets: &[f64]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        let n = targets.len() as f64;
        let mean = targets.iter().sum::<f64>() / n;
        targets.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n
    }

    fn leaf(&self, targets: &[f64]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        targets.iter().sum::<f64>() / targets.len() as f64
    }

    fn best_split(&self, sorted: &[(f64, f64)], min_leaf: usize) -> Option<SplitCandidate> {
        let n = sorted.len();
        let total_sum: f64 = sorted.iter().map(|(_, t)| t).sum();
        let total_sq: f64 = sorted.iter().map(|(_, t)| t * t).sum();

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for i in 0..n.saturating_sub(1) {
            let target = sorted[i].1;
            left_sum += target;
            left_sq += target * target;

            let n_left = i + 1;
            let n_right = n - n_left;
            if sorted[i].0 == sorted[i + 1].0 || n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse_left = left_sq - left_sum * left_sum / n_left as f64;
            let sse_right = right_sq - right_sum * right_sum / n_right as f64;
            let impurity = ((sse_left + sse_right) / n as f64).max(0.0);

            if best.map_or(true, |b| impurity < b.impurity) {
                best = Some(SplitCandidate {
                    threshold: midpoint(sorted[i].0, sorted[i + 1].0),
                    impurity,
                });
            }
        }

        best
    }
}
