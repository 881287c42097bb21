//! Feature derivation — per-loan derived fields and the high-risk rule.
//!
//! Pure and stateless. The analysis date is an explicit input, never the
//! wall clock, so the same records and date always yield the same features.

use crate::{
    error::{AnalysisError, AnalysisResult, Warning},
    loan::{LoanRecord, LoanStatus},
    types::{Days, LoanId},
};
use chrono::NaiveDate;
use serde::Serialize;

pub const HIGH_RISK_RATE_THRESHOLD: f64 = 6.0;
pub const HIGH_RISK_LTV_THRESHOLD: f64 = 0.8;
/// Income is proxied as 1% of the original amount.
pub const INCOME_PROXY_FACTOR: f64 = 0.01;

/// The minimal inputs the high-risk rule looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    pub status:        LoanStatus,
    pub interest_rate: f64,
    pub loan_to_value: f64,
}

impl RiskInputs {
    /// High risk iff distressed, priced above 6%, or LTV above 0.8.
    pub fn is_high_risk(&self) -> bool {
        self.status.is_distressed()
            || self.interest_rate > HIGH_RISK_RATE_THRESHOLD
            || self.loan_to_value > HIGH_RISK_LTV_THRESHOLD
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DerivedFeatures {
    pub loan_age_days:         Days,
    pub time_to_maturity_days: Days,
    pub loan_to_value:         f64,
    pub payment_to_income:     f64,
    pub high_risk:             bool,
}

/// A loan record with its derived fields attached.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DerivedLoan {
    pub record:   LoanRecord,
    pub features: DerivedFeatures,
}

impl DerivedLoan {
    pub fn risk_inputs(&self) -> RiskInputs {
        RiskInputs {
            status:        self.record.status,
            interest_rate: self.record.interest_rate,
            loan_to_value: self.features.loan_to_value,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RejectedRecord {
    pub loan_id: LoanId,
    pub reason:  String,
}

/// Output of deriving a whole batch: usable loans plus what was skipped.
#[derive(Debug, Clone, Default)]
pub struct DerivedDataset {
    pub loans:    Vec<DerivedLoan>,
    pub rejected: Vec<RejectedRecord>,
}

impl DerivedDataset {
    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.rejected
            .iter()
            .map(|r| Warning {
                stage:   "features".into(),
                message: format!("skipped loan '{}': {}", r.loan_id, r.reason),
            })
            .collect()
    }
}

/// Derive features for one record. Fails with `DataQuality` for a
/// non-positive original amount or a maturity before origination.
pub fn derive(record: &LoanRecord, analysis_date: NaiveDate) -> AnalysisResult<DerivedLoan> {
    if !(record.loan_amount > 0.0) {
        return Err(AnalysisError::DataQuality {
            loan_id: record.loan_id.clone(),
            reason:  format!("original loan amount must be positive, got {}", record.loan_amount),
        });
    }
    if record.maturity_date < record.origination_date {
        return Err(AnalysisError::DataQuality {
            loan_id: record.loan_id.clone(),
            reason:  format!(
                "maturity date {} precedes origination date {}",
                record.maturity_date, record.origination_date
            ),
        });
    }

    let loan_to_value = record.remaining_balance / record.loan_amount;
    let payment_to_income = record.monthly_payment / (record.loan_amount * INCOME_PROXY_FACTOR);
    let high_risk = RiskInputs {
        status: record.status,
        interest_rate: record.interest_rate,
        loan_to_value,
    }
    .is_high_risk();

    Ok(DerivedLoan {
        record: record.clone(),
        features: DerivedFeatures {
            loan_age_days: (analysis_date - record.origination_date).num_days(),
            time_to_maturity_days: (record.maturity_date - analysis_date).num_days(),
            loan_to_value,
            payment_to_income,
            high_risk,
        },
    })
}

/// Derive a whole batch. Bad records are skipped and listed, not fatal.
pub fn derive_all(records: &[LoanRecord], analysis_date: NaiveDate) -> DerivedDataset {
    let mut dataset = DerivedDataset::default();
    for record in records {
        match derive(record, analysis_date) {
            Ok(loan) => dataset.loans.push(loan),
            Err(err) => {
                log::warn!("features: skipping loan '{}': {err}", record.loan_id);
                dataset.rejected.push(RejectedRecord {
                    loan_id: record.loan_id.clone(),
                    reason:  err.to_string(),
                });
            }
        }
    }
    log::debug!(
        "features: derived {} loans, rejected {}",
        dataset.loans.len(),
        dataset.rejected.len()
    );
    dataset
}
