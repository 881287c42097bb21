//! Model plumbing shared by the risk classifier and balance regressor:
//! feature matrices, the train/test split, and the tree ensembles.

pub mod boosting;
pub mod forest;
pub mod metrics;
pub mod tree;

use crate::{rng::StageRng, types::RowIndex};
use ndarray::{Array2, ArrayView2, Axis};

/// Named feature columns laid out as an (n_loans, n_features) matrix.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub names:  Vec<&'static str>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    /// Build from column vectors. Every column must have the same length.
    pub fn from_columns(columns: Vec<(&'static str, Vec<f64>)>) -> Self {
        let n_rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut values = Array2::<f64>::zeros((n_rows, columns.len()));
        let mut names = Vec::with_capacity(columns.len());
        for (j, (name, column)) in columns.into_iter().enumerate() {
            assert_eq!(column.len(), n_rows, "column '{name}' has mismatched length");
            for (i, v) in column.into_iter().enumerate() {
                values[[i, j]] = v;
            }
            names.push(name);
        }
        Self { names, values }
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Copy of the selected rows, in the given order.
    pub fn select_rows(&self, rows: &[RowIndex]) -> Array2<f64> {
        self.values.select(Axis(0), rows)
    }
}

/// Row indices of the training and held-out partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Vec<RowIndex>,
    pub test:  Vec<RowIndex>,
}

impl TrainTestSplit {
    pub fn is_degenerate(&self) -> bool {
        self.train.is_empty() || self.test.is_empty()
    }
}

/// Shuffle 0..n and hold out ceil(n * test_fraction) rows.
pub fn train_test_split(n: usize, test_fraction: f64, rng: &mut StageRng) -> TrainTestSplit {
    let mut rows: Vec<RowIndex> = (0..n).collect();
    rng.shuffle(&mut rows);
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.min(n);
    let test = rows[..n_test].to_vec();
    let train = rows[n_test..].to_vec();
    TrainTestSplit { train, test }
}
