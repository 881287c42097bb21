//! CART decision trees over an ndarray feature matrix.
//!
//! Trees are fitted on a list of row indices into a shared matrix, so
//! bootstrap samples and boosting subsamples never copy feature data.
//! Duplicate indices are allowed and count as repeated samples.

use crate::{rng::StageRng, types::RowIndex};
use ndarray::{ArrayView1, ArrayView2};

/// Minimum impurity decrease for a split to be taken.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Binary 0/1 targets; leaves hold the positive-class fraction.
    Gini,
    /// Continuous targets; leaves hold the mean.
    SquaredError,
}

impl Criterion {
    fn impurity(&self, n: f64, sum: f64, sum_sq: f64) -> f64 {
        if n <= 0.0 {
            return 0.0;
        }
        let mean = sum / n;
        match self {
            Self::Gini => 2.0 * mean * (1.0 - mean),
            Self::SquaredError => (sum_sq / n - mean * mean).max(0.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth:         usize,
    pub min_samples_split: usize,
    pub min_samples_leaf:  usize,
    /// Features considered per split; `None` means all of them.
    pub max_features:      Option<usize>,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes:       Vec<Node>,
    /// Total weighted impurity decrease per feature, unnormalised.
    importances: Vec<f64>,
}

struct SplitCandidate {
    feature:   usize,
    threshold: f64,
    gain:      f64,
}

struct Builder<'a> {
    x:           ArrayView2<'a, f64>,
    y:           &'a [f64],
    criterion:   Criterion,
    params:      &'a TreeParams,
    rng:         &'a mut StageRng,
    nodes:       Vec<Node>,
    importances: Vec<f64>,
}

impl<'a> Builder<'a> {
    fn build(&mut self, rows: &mut [RowIndex], depth: usize) -> usize {
        let n = rows.len() as f64;
        let (sum, sum_sq) = rows.iter().fold((0.0, 0.0), |(s, sq), &r| {
            let v = self.y[r];
            (s + v, sq + v * v)
        });
        let value = if rows.is_empty() { 0.0 } else { sum / n };
        let impurity = self.criterion.impurity(n, sum, sum_sq);

        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { value });

        if depth >= self.params.max_depth
            || rows.len() < self.params.min_samples_split.max(2)
            || impurity <= MIN_GAIN
        {
            return node_id;
        }

        let Some(split) = self.best_split(rows, impurity) else {
            return node_id;
        };

        let mut mid = 0;
        for i in 0..rows.len() {
            if self.x[[rows[i], split.feature]] <= split.threshold {
                rows.swap(i, mid);
                mid += 1;
            }
        }
        if mid == 0 || mid == rows.len() {
            return node_id;
        }

        self.importances[split.feature] += split.gain;
        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        let k = self.params.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));
        if k < n_features {
            self.rng.shuffle(&mut features);
            features.truncate(k);
            features.sort_unstable();
        }
        features
    }

    fn best_split(&mut self, rows: &[RowIndex], parent_impurity: f64) -> Option<SplitCandidate> {
        let n = rows.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let (total_sum, total_sq) = rows.iter().fold((0.0, 0.0), |(s, sq), &r| {
            let v = self.y[r];
            (s + v, sq + v * v)
        });
        let parent_score = n as f64 * parent_impurity;

        let mut best: Option<SplitCandidate> = None;
        for feature in self.candidate_features() {
            let mut pairs: Vec<(f64, f64)> =
                rows.iter().map(|&r| (self.x[[r, feature]], self.y[r])).collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (mut left_sum, mut left_sq) = (0.0, 0.0);
            for i in 0..n - 1 {
                let (xv, yv) = pairs[i];
                left_sum += yv;
                left_sq += yv * yv;
                let left_n = i + 1;
                let right_n = n - left_n;
                let next_x = pairs[i + 1].0;
                if xv == next_x || left_n < min_leaf || right_n < min_leaf {
                    continue;
                }
                let left_imp = self.criterion.impurity(left_n as f64, left_sum, left_sq);
                let right_imp = self.criterion.impurity(
                    right_n as f64,
                    total_sum - left_sum,
                    total_sq - left_sq,
                );
                let gain = parent_score - left_n as f64 * left_imp - right_n as f64 * right_imp;
                if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mut threshold = xv + (next_x - xv) / 2.0;
                    // Adjacent floats can round the midpoint up onto the right value.
                    if threshold >= next_x {
                        threshold = xv;
                    }
                    best = Some(SplitCandidate { feature, threshold, gain });
                }
            }
        }
        best
    }
}

impl DecisionTree {
    /// Fit on `rows` of `x` against targets `y` (indexed by row).
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[f64],
        rows: &[RowIndex],
        criterion: Criterion,
        params: &TreeParams,
        rng: &mut StageRng,
    ) -> Self {
        let mut rows = rows.to_vec();
        let mut builder = Builder {
            x: x.reborrow(),
            y,
            criterion,
            params,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; x.ncols()],
        };
        builder.build(&mut rows, 0);
        Self {
            nodes: builder.nodes,
            importances: builder.importances,
        }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
