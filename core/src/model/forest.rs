//! Bagged ensemble of Gini trees for the binary high-risk target.

use super::tree::{Criterion, DecisionTree, TreeParams};
use crate::{config::ForestParams, rng::StageRng, types::RowIndex};
use ndarray::{ArrayView1, ArrayView2};

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees:      Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Each tree sees a bootstrap sample of `rows` and a random subset
    /// of sqrt(n_features) candidate features per split, unless
    /// `params.max_features` overrides it.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[f64],
        rows: &[RowIndex],
        params: &ForestParams,
        rng: &mut StageRng,
    ) -> Self {
        let n_features = x.ncols();
        let max_features = params
            .max_features
            .unwrap_or_else(|| ((n_features as f64).sqrt().floor() as usize).max(1));
        let tree_params = TreeParams {
            max_depth:         params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf:  params.min_samples_leaf,
            max_features:      Some(max_features),
        };

        let trees = (0..params.n_trees)
            .map(|_| {
                let sample: Vec<RowIndex> = (0..rows.len())
                    .map(|_| rows[rng.next_u64_below(rows.len() as u64) as usize])
                    .collect();
                DecisionTree::fit(x, y, &sample, Criterion::Gini, &tree_params, rng)
            })
            .collect();

        Self { trees, n_features }
    }

    /// Mean positive-class probability across trees.
    pub fn predict_proba_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<bool> {
        x.rows()
            .into_iter()
            .map(|row| self.predict_proba_row(row) >= 0.5)
            .collect()
    }

    /// Mean of per-tree normalised impurity decreases, summing to 1
    /// (all zeros when no tree ever split).
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            let tree_total: f64 = tree.importances().iter().sum();
            if tree_total <= 0.0 {
                continue;
            }
            for (acc, imp) in totals.iter_mut().zip(tree.importances()) {
                *acc += imp / tree_total;
            }
        }
        let grand_total: f64 = totals.iter().sum();
        if grand_total > 0.0 {
            totals.iter_mut().for_each(|v| *v /= grand_total);
        }
        totals
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
