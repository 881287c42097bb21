//! The structured result of one analysis run.

use crate::{
    balance_model::BalanceModelReport,
    descriptive::PortfolioSummary,
    error::{AnalysisResult, Warning},
    features::RejectedRecord,
    recommendation::Recommendation,
    risk_model::RiskModelReport,
    segmentation::SegmentSummary,
};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub seed:            u64,
    pub analysis_date:   NaiveDate,
    pub records_in:      usize,
    pub records_used:    usize,
    pub rejected:        Vec<RejectedRecord>,
    pub summary:         PortfolioSummary,
    /// `None` when the model stage was skipped on degenerate input.
    pub risk_model:      Option<RiskModelReport>,
    pub balance_model:   Option<BalanceModelReport>,
    /// In Conservative, Standard, Aggressive, High-Value order.
    pub segments:        Vec<SegmentSummary>,
    pub recommendations: Vec<Recommendation>,
    pub monitoring:      Vec<Recommendation>,
    pub warnings:        Vec<Warning>,
}

impl PortfolioReport {
    pub fn to_json(&self) -> AnalysisResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
