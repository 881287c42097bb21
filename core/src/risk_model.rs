//! Risk classifier — predicts the high-risk flag from loan attributes.
//!
//! Inputs: six numeric features plus the encoded product name, product
//! type and servicer. Target: the rule-derived high-risk flag. The flag
//! is known exactly from the rule; the model exists to rank which
//! attributes carry the signal and to validate the modelling wiring.

use crate::{
    config::ForestParams,
    encoding::{CategoricalColumn, EncodingTable},
    error::{AnalysisError, AnalysisResult, Warning},
    features::DerivedLoan,
    model::{
        forest::RandomForest,
        metrics::{classification_metrics, ClassificationMetrics},
        FeatureMatrix, TrainTestSplit,
    },
    rng::StageRng,
};
use serde::Serialize;

const STAGE: &str = "risk_classifier";
pub const TOP_FEATURE_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureImportance {
    pub feature:    String,
    pub importance: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RiskModelReport {
    pub train_size:   usize,
    pub test_size:    usize,
    pub metrics:      ClassificationMetrics,
    /// The five most important features, descending.
    pub top_features: Vec<FeatureImportance>,
}

pub struct RiskClassifier {
    forest: RandomForest,
    report: RiskModelReport,
}

/// Build the classifier's feature matrix, encoding categoricals through
/// the shared table.
pub fn risk_features(
    loans: &[DerivedLoan],
    encodings: &mut EncodingTable,
    warnings: &mut Vec<Warning>,
) -> FeatureMatrix {
    let mut columns: Vec<(&'static str, Vec<f64>)> = vec![
        ("loan_amount", loans.iter().map(|l| l.record.loan_amount).collect()),
        ("interest_rate", loans.iter().map(|l| l.record.interest_rate).collect()),
        ("loan_age_days", loans.iter().map(|l| l.features.loan_age_days as f64).collect()),
        (
            "time_to_maturity_days",
            loans.iter().map(|l| l.features.time_to_maturity_days as f64).collect(),
        ),
        ("loan_to_value", loans.iter().map(|l| l.features.loan_to_value).collect()),
        ("payment_to_income", loans.iter().map(|l| l.features.payment_to_income).collect()),
    ];
    for column in CategoricalColumn::ALL {
        columns.push((column.feature_name(), encodings.encode_column(column, loans, STAGE, warnings)));
    }
    FeatureMatrix::from_columns(columns)
}

/// Rank importances descending; ties keep column order.
pub fn rank_importances(names: &[&str], importances: &[f64], top: usize) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = names
        .iter()
        .zip(importances)
        .map(|(name, imp)| FeatureImportance {
            feature: name.to_string(),
            importance: *imp,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked.truncate(top);
    ranked
}

impl RiskClassifier {
    /// Fit on the training partition and evaluate on the held-out rows.
    ///
    /// Returns `DegenerateModelInput` when either partition is empty.
    /// A one-sided training target is only a warning: the forest then
    /// predicts that single class and the missing class's metrics are
    /// undefined.
    pub fn fit(
        loans: &[DerivedLoan],
        split: &TrainTestSplit,
        encodings: &mut EncodingTable,
        params: &ForestParams,
        rng: &mut StageRng,
        warnings: &mut Vec<Warning>,
    ) -> AnalysisResult<Self> {
        if split.is_degenerate() {
            return Err(AnalysisError::DegenerateModelInput {
                stage: STAGE,
                reason: format!(
                    "train/test partition sizes {}/{} leave nothing to fit or evaluate",
                    split.train.len(),
                    split.test.len()
                ),
            });
        }

        let matrix = risk_features(loans, encodings, warnings);
        let target: Vec<f64> = loans
            .iter()
            .map(|l| if l.features.high_risk { 1.0 } else { 0.0 })
            .collect();

        let positives = split.train.iter().filter(|&&r| target[r] > 0.5).count();
        if positives == 0 || positives == split.train.len() {
            let err = AnalysisError::DegenerateModelInput {
                stage: STAGE,
                reason: format!(
                    "training target is one-sided ({positives} of {} high risk)",
                    split.train.len()
                ),
            };
            log::warn!("{err}");
            warnings.push(Warning::from_error(STAGE, &err));
        }

        let forest = RandomForest::fit(matrix.view(), &target, &split.train, params, rng);

        let test_x = matrix.select_rows(&split.test);
        let predicted = forest.predict(test_x.view());
        let actual: Vec<bool> = split.test.iter().map(|&r| loans[r].features.high_risk).collect();
        let metrics = classification_metrics(&actual, &predicted);

        let top_features =
            rank_importances(&matrix.names, &forest.feature_importances(), TOP_FEATURE_COUNT);

        log::info!(
            "risk_classifier: {} trees, accuracy {}",
            forest.n_trees(),
            metrics.accuracy.map_or("n/a".to_string(), |a| format!("{a:.3}"))
        );

        Ok(Self {
            forest,
            report: RiskModelReport {
                train_size: split.train.len(),
                test_size: split.test.len(),
                metrics,
                top_features,
            },
        })
    }

    pub fn report(&self) -> &RiskModelReport {
        &self.report
    }

    pub fn into_report(self) -> RiskModelReport {
        self.report
    }

    /// Predict the flag for rows of a matrix built by `risk_features`.
    pub fn predict(&self, matrix: &FeatureMatrix) -> Vec<bool> {
        self.forest.predict(matrix.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking_is_descending_and_truncated() {
        let names = ["a", "b", "c", "d", "e", "f"];
        let imps = [0.1, 0.4, 0.05, 0.2, 0.15, 0.1];
        let ranked = rank_importances(&names, &imps, 5);
        let order: Vec<&str> = ranked.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(order, ["b", "d", "e", "a", "f"]);
    }
}
