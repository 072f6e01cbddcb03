//! Bagged ensembles of CART trees.

use landwatch_core::{Error, ForestParams, Result};
use ndarray::ArrayView2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::criterion::{Gini, Mse, SplitCriterion};
use crate::tree::{DecisionTree, TreeParams};

/// Random forest over a split criterion.
///
/// Tree `i` draws its bootstrap sample and split features from a ChaCha
/// stream seeded with `seed + i`, so results do not depend on how rayon
/// schedules the trees.
#[derive(Debug, Clone)]
pub struct RandomForest<C: SplitCriterion> {
    criterion: C,
    params: ForestParams,
    trees: Vec<DecisionTree<C>>,
    n_features: usize,
}

impl<C: SplitCriterion> RandomForest<C> {
    pub fn new(criterion: C, params: ForestParams) -> Self {
        Self {
            criterion,
            params,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    /// Fits `n_estimators` trees on `x` / `y`, replacing any previous fit
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[C::Target]) -> Result<()> {
        self.params.validate()?;
        let n_samples = x.nrows();
        if n_samples == 0 || x.ncols() == 0 {
            return Err(Error::Data("cannot fit a forest on empty data".to_string()));
        }
        if y.len() != n_samples {
            return Err(Error::Data(format!(
                "{} rows but {} targets",
                n_samples,
                y.len()
            )));
        }
        self.criterion.validate_targets(y)?;

        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: self.params.max_features.resolve(x.ncols()),
        };
        let seed = self.params.seed;
        let bootstrap = self.params.bootstrap;
        let criterion = &self.criterion;

        let trees: Vec<DecisionTree<C>> = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                let indices: Vec<usize> = if bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                let tree = DecisionTree::fit(criterion, x, y, &indices, &tree_params, &mut rng);
                debug!(
                    tree = i,
                    depth = tree.depth(),
                    leaves = tree.n_leaves(),
                    "Grew tree"
                );
                tree
            })
            .collect();

        info!(
            "Fitted {} trees on {} samples x {} features (max_features={})",
            trees.len(),
            n_samples,
            x.ncols(),
            tree_params.max_features
        );

        self.trees = trees;
        self.n_features = x.ncols();
        Ok(())
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn trees(&self) -> &[DecisionTree<C>] {
        &self.trees
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Mean of the per-tree importances, normalized to sum to 1
    pub fn feature_importances(&self) -> Result<Vec<f64>> {
        self.check_fitted()?;
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (total, value) in totals.iter_mut().zip(tree.feature_importances()) {
                *total += value;
            }
        }

        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        Ok(totals)
    }

    fn check_row(&self, row: &[f64]) -> Result<()> {
        self.check_fitted()?;
        if row.len() != self.n_features {
            return Err(Error::InvalidArgument(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        Ok(())
    }

    fn check_fitted(&self) -> Result<()> {
        if self.is_fitted() {
            Ok(())
        } else {
            Err(Error::Model("forest has not been fitted".to_string()))
        }
    }
}

impl RandomForest<Gini> {
    pub fn n_classes(&self) -> usize {
        self.criterion.n_classes
    }

    /// Mean of the tree leaf distributions
    pub fn predict_proba_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_row(row)?;
        let mut probabilities = vec![0.0; self.criterion.n_classes];
        for tree in &self.trees {
            for (p, leaf) in probabilities.iter_mut().zip(tree.predict_row(row)) {
                *p += leaf;
            }
        }

        let n_trees = self.trees.len() as f64;
        probabilities.iter_mut().for_each(|p| *p /= n_trees);
        Ok(probabilities)
    }

    /// Most probable class; ties go to the lowest class index
    pub fn predict_row(&self, row: &[f64]) -> Result<usize> {
        let probabilities = self.predict_proba_row(row)?;
        Ok(argmax(&probabilities))
    }
}

impl RandomForest<Mse> {
    /// Mean of the tree leaf means
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        self.check_row(row)?;
        let sum: f64 = self.trees.iter().map(|tree| *tree.predict_row(row)).sum();
        Ok(sum / self.trees.len() as f64)
    }
}

/// Index of the largest value, first one on ties
pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
            if v > best_v {
                (i, v)
            } else {
                (best_i, best_v)
            }
        })
        .0
}
