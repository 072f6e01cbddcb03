//! CART decision tree stored as a flat node arena.

use ndarray::ArrayView2;
use rand::Rng;

use crate::criterion::{SplitCandidate, SplitCriterion};

/// Impurity below which a node is treated as pure
const PURE_EPSILON: f64 = 1e-12;

/// Tree growth limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn (without replacement) at every split
    pub max_features: usize,
}

#[derive(Debug, Clone)]
pub enum Node<L> {
    Leaf {
        value: L,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
    },
}

#[derive(Debug, Clone)]
pub struct DecisionTree<C: SplitCriterion> {
    nodes: Vec<Node<C::Leaf>>,
    feature_importances: Vec<f64>,
    depth: usize,
}

impl<C: SplitCriterion> DecisionTree<C> {
    /// Grows a tree on the rows of `x` listed in `indices`.
    ///
    /// `indices` may contain repeats (bootstrap samples).
    pub fn fit<R: Rng + ?Sized>(
        criterion: &C,
        x: ArrayView2<'_, f64>,
        y: &[C::Target],
        indices: &[usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut builder = TreeBuilder {
            criterion,
            x,
            y,
            params,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; x.ncols()],
            depth: 0,
        };
        builder.build(indices.to_vec(), 0);

        let total: f64 = builder.importances.iter().sum();
        let feature_importances = if total > 0.0 {
            builder.importances.iter().map(|v| v / total).collect()
        } else {
            builder.importances
        };

        Self {
            nodes: builder.nodes,
            feature_importances,
            depth: builder.depth,
        }
    }

    /// Leaf value reached by `row`
    pub fn predict_row(&self, row: &[f64]) -> &C::Leaf {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value, .. } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Impurity decrease per feature, normalized to sum to 1 (all zero for a stump)
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn nodes(&self) -> &[Node<C::Leaf>] {
        &self.nodes
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf (a single leaf has depth 0)
    pub fn depth(&self) -> usize {
        self.depth
    }
}

struct TreeBuilder<'a, C: SplitCriterion, R: Rng + ?Sized> {
    criterion: &'a C,
    x: ArrayView2<'a, f64>,
    y: &'a [C::Target],
    params: &'a TreeParams,
    rng: &'a mut R,
    nodes: Vec<Node<C::Leaf>>,
    importances: Vec<f64>,
    depth: usize,
}

struct FeatureSplit {
    feature: usize,
    candidate: SplitCandidate,
}

impl<'a, C: SplitCriterion, R: Rng + ?Sized> TreeBuilder<'a, C, R> {
    fn build(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        self.depth = self.depth.max(depth);
        let targets: Vec<C::Target> = indices.iter().map(|&i| self.y[i]).collect();
        let n_samples = indices.len();
        let impurity = self.criterion.impurity(&targets);

        let depth_ok = self.params.max_depth.map_or(true, |max| depth < max);
        let can_split = depth_ok
            && n_samples >= self.params.min_samples_split
            && n_samples >= 2 * self.params.min_samples_leaf
            && impurity > PURE_EPSILON;

        if can_split {
            if let Some(split) = self.find_split(&indices) {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|&i| self.x[[i, split.feature]] <= split.candidate.threshold);

                if !left_idx.is_empty() && !right_idx.is_empty() {
                    self.importances[split.feature] +=
                        n_samples as f64 * (impurity - split.candidate.impurity).max(0.0);

                    let id = self.nodes.len();
                    self.nodes.push(Node::Split {
                        feature: split.feature,
                        threshold: split.candidate.threshold,
                        left: usize::MAX,
                        right: usize::MAX,
                        n_samples,
                    });

                    let left_id = self.build(left_idx, depth + 1);
                    let right_id = self.build(right_idx, depth + 1);
                    if let Node::Split { left, right, .. } = &mut self.nodes[id] {
                        *left = left_id;
                        *right = right_id;
                    }
                    return id;
                }
            }
        }

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: self.criterion.leaf(&targets),
            n_samples,
        });
        id
    }

    fn find_split(&mut self, indices: &[usize]) -> Option<FeatureSplit> {
        let n_features = self.x.ncols();
        let k = self.params.max_features.clamp(1, n_features);
        let features = rand::seq::index::sample(&mut *self.rng, n_features, k);

        let mut best: Option<FeatureSplit> = None;
        let mut pairs: Vec<(f64, C::Target)> = Vec::with_capacity(indices.len());
        for feature in features.iter() {
            pairs.clear();
            pairs.extend(indices.iter().map(|&i| (self.x[[i, feature]], self.y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            if let Some(candidate) = self
                .criterion
                .best_split(&pairs, self.params.min_samples_leaf)
            {
                if best
                    .as_ref()
                    .map_or(true, |b| candidate.impurity < b.candidate.impurity)
                {
                    best = Some(FeatureSplit { feature, candidate });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::{Gini, Mse};
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params(max_depth: Option<usize>, max_features: usize) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features,
        }
    }

    #[test]
    fn test_classification_tree_separates_classes() {
        let x = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [10.0, 5.0], [11.0, 5.0], [12.0, 5.0]];
        let y = [0usize, 0, 0, 1, 1, 1];
        let indices: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let tree = DecisionTree::fit(&Gini::new(2), x.view(), &y, &indices, &params(None, 2), &mut rng);

        assert_eq!(tree.predict_row(&[0.5, 5.0]), &vec![1.0, 0.0]);
        assert_eq!(tree.predict_row(&[11.5, 5.0]), &vec![0.0, 1.0]);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.feature_importances(), &[1.0, 0.0]);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = [2usize, 2, 2];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let tree = DecisionTree::fit(&Gini::new(3), x.view(), &y, &[0, 1, 2], &params(None, 1), &mut rng);

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.feature_importances(), &[0.0]);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0]];
        let y = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0];
        let indices: Vec<usize> = (0..8).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let tree = DecisionTree::fit(&Mse, x.view(), &y, &indices, &params(Some(2), 1), &mut rng);

        assert!(tree.depth() <= 2);
        assert!(tree.n_leaves() <= 4);
    }

    #[test]
    fn test_regression_leaf_means() {
        let x = array![[0.0], [1.0], [10.0], [11.0]];
        let y = [1.0, 3.0, 20.0, 22.0];
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let tree = DecisionTree::fit(&Mse, x.view(), &y, &[0, 1, 2, 3], &params(Some(1), 1), &mut rng);

        assert_eq!(*tree.predict_row(&[0.2]), 2.0);
        assert_eq!(*tree.predict_row(&[10.7]), 21.0);
    }

    #[test]
    fn test_bootstrap_indices_with_repeats() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = [0usize, 1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let tree = DecisionTree::fit(&Gini::new(2), x.view(), &y, &[0, 0, 2, 2], &params(None, 1), &mut rng);

        assert_eq!(tree.predict_row(&[0.0]), &vec![1.0, 0.0]);
        assert_eq!(tree.predict_row(&[2.0]), &vec![0.0, 1.0]);
    }
}
