//! Balance regressor — forecasts remaining balance.

use crate::{
    config::BoostingParams,
    encoding::{CategoricalColumn, EncodingTable},
    error::{AnalysisError, AnalysisResult, Warning},
    features::DerivedLoan,
    model::{
        boosting::GradientBoostedRegressor,
        metrics::{regression_metrics, RegressionMetrics},
        FeatureMatrix, TrainTestSplit,
    },
    rng::StageRng,
};
use serde::Serialize;

const STAGE: &str = "balance_regressor";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BalanceModelReport {
    pub train_size: usize,
    pub test_size:  usize,
    pub metrics:    RegressionMetrics,
}

pub struct BalanceRegressor {
    model:  GradientBoostedRegressor,
    report: BalanceModelReport,
}

/// Loan amount, rate, age and payment plus the shared categorical codes.
pub fn balance_features(
    loans: &[DerivedLoan],
    encodings: &mut EncodingTable,
    warnings: &mut Vec<Warning>,
) -> FeatureMatrix {
    let mut columns: Vec<(&'static str, Vec<f64>)> = vec![
        ("loan_amount", loans.iter().map(|l| l.record.loan_amount).collect()),
        ("interest_rate", loans.iter().map(|l| l.record.interest_rate).collect()),
        ("loan_age_days", loans.iter().map(|l| l.features.loan_age_days as f64).collect()),
        ("monthly_payment", loans.iter().map(|l| l.record.monthly_payment).collect()),
    ];
    for column in CategoricalColumn::ALL {
        columns.push((column.feature_name(), encodings.encode_column(column, loans, STAGE, warnings)));
    }
    FeatureMatrix::from_columns(columns)
}

impl BalanceRegressor {
    pub fn fit(
        loans: &[DerivedLoan],
        split: &TrainTestSplit,
        encodings: &mut EncodingTable,
        params: &BoostingParams,
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

        let matrix = balance_features(loans, encodings, warnings);
        let target: Vec<f64> = loans.iter().map(|l| l.record.remaining_balance).collect();
        let model = GradientBoostedRegressor::fit(matrix.view(), &target, &split.train, params, rng);

        let test_x = matrix.select_rows(&split.test);
        let predicted = model.predict(test_x.view());
        let actual: Vec<f64> = split.test.iter().map(|&r| target[r]).collect();
        let metrics = regression_metrics(&actual, &predicted);

        if metrics.r2.is_none() {
            let err = AnalysisError::DegenerateModelInput {
                stage: STAGE,
                reason: "held-out balances are constant; R² is undefined".into(),
            };
            log::warn!("{err}");
            warnings.push(Warning::from_error(STAGE, &err));
        }

        log::info!(
            "balance_regressor: {} stages, MAE {:.2}, R² {}",
            model.n_stages(),
            metrics.mean_absolute_error.unwrap_or(0.0),
            metrics.r2.map_or("n/a".to_string(), |r| format!("{r:.3}"))
        );

        Ok(Self {
            model,
            report: BalanceModelReport {
                train_size: split.train.len(),
                test_size: split.test.len(),
                metrics,
            },
        })
    }

    pub fn report(&self) -> &BalanceModelReport {
        &self.report
    }

    pub fn into_report(self) -> BalanceModelReport {
        self.report
    }

    pub fn predict(&self, matrix: &FeatureMatrix) -> Vec<f64> {
        self.model.predict(matrix.view())
    }
}
