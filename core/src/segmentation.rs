//! Segmentation — k-means over standardized financial features.
//!
//! Features: loan amount, interest rate, loan-to-value, payment-to-income.
//! Missing (NaN) values are replaced by their column mean, then every
//! column is scaled to zero mean and unit variance.
//!
//! Cluster indices carry no meaning, so labels are assigned from the
//! clusters' raw means: the largest mean loan amount is High-Value, and
//! the other three are Conservative, Standard, Aggressive by ascending
//! mean interest rate. The same portfolio gets the same labels under
//! any seed that finds the same partition.

use crate::{
    config::{ClusteringParams, SEGMENT_COUNT},
    error::{AnalysisError, AnalysisResult},
    features::DerivedLoan,
    rng::StageRng,
};
use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use linfa_preprocessing::linear_scaling::LinearScaler;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use std::collections::BTreeSet;

pub const SEGMENT_FEATURES: [&str; 4] =
    ["loan_amount", "interest_rate", "loan_to_value", "payment_to_income"];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SegmentLabel {
    Conservative,
    Standard,
    Aggressive,
    #[serde(rename = "High-Value")]
    HighValue,
}

impl SegmentLabel {
    pub const ALL: [SegmentLabel; SEGMENT_COUNT] = [
        SegmentLabel::Conservative,
        SegmentLabel::Standard,
        SegmentLabel::Aggressive,
        SegmentLabel::HighValue,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Conservative => "Conservative",
            Self::Standard     => "Standard",
            Self::Aggressive   => "Aggressive",
            Self::HighValue    => "High-Value",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SegmentSummary {
    pub label:              SegmentLabel,
    pub cluster_index:      usize,
    pub member_count:       usize,
    pub share:              f64,
    pub mean_loan_amount:   f64,
    pub mean_interest_rate: f64,
    pub mean_loan_to_value: f64,
    pub high_risk_rate:     f64,
    /// Centroid in standardized feature space, SEGMENT_FEATURES order.
    pub centroid:           Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Segmentation {
    /// One label per loan, in input order.
    pub assignments: Vec<SegmentLabel>,
    /// One summary per label, in `SegmentLabel::ALL` order.
    pub summaries:   Vec<SegmentSummary>,
}

/// Replace NaNs in each column with the mean of its finite values.
/// An all-NaN column becomes zeros.
pub fn fill_missing_with_column_mean(matrix: &mut Array2<f64>) {
    for mut column in matrix.columns_mut() {
        let present: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
        let mean = if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        };
        column.iter_mut().filter(|v| v.is_nan()).for_each(|v| *v = mean);
    }
}

/// Zero mean, unit (population) variance per column via linfa's
/// standard scaler. Constant columns are centred only.
pub fn scale_features(matrix: &Array2<f64>) -> AnalysisResult<Array2<f64>> {
    let dataset = DatasetBase::from(matrix.clone());
    let scaler = LinearScaler::<f64>::standard()
        .fit(&dataset)
        .map_err(|e| AnalysisError::Clustering(format!("standard scaling failed: {e}")))?;
    Ok(scaler.transform(matrix.clone()))
}

fn distinct_rows(matrix: &Array2<f64>) -> usize {
    matrix
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| v.to_bits()).collect::<Vec<u64>>())
        .collect::<BTreeSet<_>>()
        .len()
}

fn ensure_distinct(matrix: &Array2<f64>, k: usize) -> AnalysisResult<()> {
    let distinct = distinct_rows(matrix);
    if distinct < k {
        return Err(AnalysisError::Configuration(format!(
            "segment count ({k}) exceeds the number of distinct records ({distinct})"
        )));
    }
    Ok(())
}

/// Fail with `Configuration` when the loans cannot form `k` segments.
/// Scaling is per-column affine, so distinctness is decided on the
/// mean-filled raw features.
pub fn check_segmentable(loans: &[DerivedLoan], k: usize) -> AnalysisResult<()> {
    let mut raw = segment_features(loans);
    fill_missing_with_column_mean(&mut raw);
    ensure_distinct(&raw, k)
}

/// Cluster already-standardized rows into `k` groups.
/// Returns (cluster index per row, centroids).
pub fn cluster_rows(
    standardized: &Array2<f64>,
    k: usize,
    params: &ClusteringParams,
    rng: &mut StageRng,
) -> AnalysisResult<(Array1<usize>, Array2<f64>)> {
    ensure_distinct(standardized, k)?;

    let dataset = DatasetBase::from(standardized.clone());
    let model = KMeans::params_with(k, rng.fork_pcg(), L2Dist)
        .max_n_iterations(params.max_iterations)
        .tolerance(params.tolerance)
        .n_runs(params.n_runs)
        .fit(&dataset)
        .map_err(|e| AnalysisError::Clustering(e.to_string()))?;

    let labels: Array1<usize> = model.predict(standardized);
    Ok((labels, model.centroids().clone()))
}

/// Raw per-cluster means used for labelling and reporting.
struct ClusterStats {
    count:      usize,
    amount_sum: f64,
    rate_sum:   f64,
    ltv_sum:    f64,
    high_risk:  usize,
}

impl ClusterStats {
    fn mean(&self, sum: f64) -> f64 {
        if self.count == 0 { 0.0 } else { sum / self.count as f64 }
    }
}

/// Map cluster index → label from raw cluster means.
fn label_clusters(stats: &[ClusterStats]) -> Vec<SegmentLabel> {
    let mut labels = vec![SegmentLabel::Conservative; stats.len()];
    let high_value = (0..stats.len())
        .max_by(|&a, &b| {
            stats[a]
                .mean(stats[a].amount_sum)
                .total_cmp(&stats[b].mean(stats[b].amount_sum))
                // Prefer the lower index on ties.
                .then(b.cmp(&a))
        })
        .unwrap_or(0);

    let mut rest: Vec<usize> = (0..stats.len()).filter(|&c| c != high_value).collect();
    rest.sort_by(|&a, &b| {
        stats[a]
            .mean(stats[a].rate_sum)
            .total_cmp(&stats[b].mean(stats[b].rate_sum))
            .then(a.cmp(&b))
    });

    labels[high_value] = SegmentLabel::HighValue;
    let ordered = [SegmentLabel::Conservative, SegmentLabel::Standard, SegmentLabel::Aggressive];
    for (cluster, label) in rest.into_iter().zip(ordered) {
        labels[cluster] = label;
    }
    labels
}

pub fn segment_features(loans: &[DerivedLoan]) -> Array2<f64> {
    Array2::from_shape_fn((loans.len(), SEGMENT_FEATURES.len()), |(i, j)| {
        let loan = &loans[i];
        match j {
            0 => loan.record.loan_amount,
            1 => loan.record.interest_rate,
            2 => loan.features.loan_to_value,
            _ => loan.features.payment_to_income,
        }
    })
}

/// Segment the portfolio into the four named groups.
pub fn segment(
    loans: &[DerivedLoan],
    params: &ClusteringParams,
    rng: &mut StageRng,
) -> AnalysisResult<Segmentation> {
    let mut raw = segment_features(loans);
    fill_missing_with_column_mean(&mut raw);
    let standardized = scale_features(&raw)?;
    let (clusters, centroids) = cluster_rows(&standardized, SEGMENT_COUNT, params, rng)?;

    let mut stats: Vec<ClusterStats> = (0..SEGMENT_COUNT)
        .map(|_| ClusterStats { count: 0, amount_sum: 0.0, rate_sum: 0.0, ltv_sum: 0.0, high_risk: 0 })
        .collect();
    for (i, &cluster) in clusters.iter().enumerate() {
        let s = &mut stats[cluster];
        s.count += 1;
        s.amount_sum += raw[[i, 0]];
        s.rate_sum += raw[[i, 1]];
        s.ltv_sum += raw[[i, 2]];
        if loans[i].features.high_risk {
            s.high_risk += 1;
        }
    }

    let cluster_labels = label_clusters(&stats);
    let total = loans.len();

    let mut summaries: Vec<SegmentSummary> = stats
        .iter()
        .enumerate()
        .map(|(cluster, s)| SegmentSummary {
            label:              cluster_labels[cluster],
            cluster_index:      cluster,
            member_count:       s.count,
            share:              if total == 0 { 0.0 } else { s.count as f64 / total as f64 },
            mean_loan_amount:   s.mean(s.amount_sum),
            mean_interest_rate: s.mean(s.rate_sum),
            mean_loan_to_value: s.mean(s.ltv_sum),
            high_risk_rate:     s.mean(s.high_risk as f64),
            centroid:           centroids.index_axis(Axis(0), cluster).to_vec(),
        })
        .collect();
    summaries.sort_by_key(|s| s.label);

    for s in &summaries {
        log::debug!(
            "segmenter: {} = cluster {} ({} loans, mean amount {:.0}, mean rate {:.2})",
            s.label.name(),
            s.cluster_index,
            s.member_count,
            s.mean_loan_amount,
            s.mean_interest_rate
        );
    }
    log::info!("segmenter: {} loans into {} segments", total, summaries.len());

    Ok(Segmentation {
        assignments: clusters.iter().map(|&c| cluster_labels[c]).collect(),
        summaries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn missing_values_take_the_column_mean() {
        let mut m = array![[1.0, f64::NAN], [3.0, 4.0], [f64::NAN, 8.0]];
        fill_missing_with_column_mean(&mut m);
        assert_eq!(m[[2, 0]], 2.0);
        assert_eq!(m[[0, 1]], 6.0);
    }

    #[test]
    fn standardized_columns_have_zero_mean_unit_variance() {
        let m = array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0], [4.0, 10.0]];
        let s = scale_features(&m).unwrap();
        let col0 = s.column(0);
        let mean = col0.sum() / 4.0;
        let var = col0.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
        assert!(s.column(1).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn labels_follow_amount_then_rate() {
        let mk = |amount: f64, rate: f64| ClusterStats {
            count: 1,
            amount_sum: amount,
            rate_sum: rate,
            ltv_sum: 0.5,
            high_risk: 0,
        };
        let stats = vec![mk(200.0, 7.0), mk(900.0, 5.0), mk(150.0, 3.0), mk(180.0, 5.5)];
        let labels = label_clusters(&stats);
        assert_eq!(
            labels,
            vec![
                SegmentLabel::Aggressive,
                SegmentLabel::HighValue,
                SegmentLabel::Conservative,
                SegmentLabel::Standard,
            ]
        );
    }

    #[test]
    fn too_few_distinct_rows_is_a_configuration_error() {
        let m = array![[0.0, 0.0], [0.0, 0.0], [1.0, 1.0], [1.0, 1.0]];
        let mut rng = StageRng::new(1, 4);
        let err = cluster_rows(&m, 4, &ClusteringParams::default(), &mut rng).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }
}
