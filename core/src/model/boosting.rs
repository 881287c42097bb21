//! Least-squares gradient boosting of shallow regression trees.

use super::tree::{Criterion, DecisionTree, TreeParams};
use crate::{config::BoostingParams, rng::StageRng, types::RowIndex};
use ndarray::{ArrayView1, ArrayView2};

#[derive(Debug, Clone)]
pub struct GradientBoostedRegressor {
    init:          f64,
    learning_rate: f64,
    trees:         Vec<DecisionTree>,
}

impl GradientBoostedRegressor {
    /// Start from the training mean and fit each stage to the current
    /// residuals. With `subsample < 1.0` every stage draws its own row
    /// subset without replacement.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[f64],
        rows: &[RowIndex],
        params: &BoostingParams,
        rng: &mut StageRng,
    ) -> Self {
        let init = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|&r| y[r]).sum::<f64>() / rows.len() as f64
        };
        let tree_params = TreeParams {
            max_depth:         params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf:  params.min_samples_leaf,
            max_features:      None,
        };

        let mut current = vec![init; x.nrows()];
        let mut residuals = vec![0.0; x.nrows()];
        let mut trees = Vec::with_capacity(params.n_estimators);
        let sample_size = ((rows.len() as f64) * params.subsample).ceil() as usize;

        for _ in 0..params.n_estimators {
            for &r in rows {
                residuals[r] = y[r] - current[r];
            }
            let sample: Vec<RowIndex> = if sample_size < rows.len() {
                let mut shuffled = rows.to_vec();
                rng.shuffle(&mut shuffled);
                shuffled.truncate(sample_size.max(1));
                shuffled
            } else {
                rows.to_vec()
            };
            let tree = DecisionTree::fit(
                x,
                &residuals,
                &sample,
                Criterion::SquaredError,
                &tree_params,
                rng,
            );
            for &r in rows {
                current[r] += params.learning_rate * tree.predict_row(x.row(r));
            }
            trees.push(tree);
        }

        Self {
            init,
            learning_rate: params.learning_rate,
            trees,
        }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.init
            + self
                .trees
                .iter()
                .map(|t| self.learning_rate * t.predict_row(row))
                .sum::<f64>()
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<f64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn n_stages(&self) -> usize {
        self.trees.len()
    }
}
