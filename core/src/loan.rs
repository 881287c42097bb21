//! The loan record schema and external portfolio loading.

use crate::{error::AnalysisResult, types::LoanId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LoanStatus {
    Active,
    #[serde(rename = "Paid Off", alias = "PaidOff")]
    PaidOff,
    Default,
    Delinquent,
}

impl LoanStatus {
    /// Every status in reporting order.
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Active,
        LoanStatus::PaidOff,
        LoanStatus::Default,
        LoanStatus::Delinquent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active     => "Active",
            Self::PaidOff    => "Paid Off",
            Self::Default    => "Default",
            Self::Delinquent => "Delinquent",
        }
    }

    /// Default and Delinquent loans are in distress regardless of pricing.
    pub fn is_distressed(&self) -> bool {
        matches!(self, Self::Default | Self::Delinquent)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanRecord {
    pub loan_id:           LoanId,
    pub customer_name:     String,
    pub property_address:  String,
    pub origination_date:  NaiveDate,
    pub maturity_date:     NaiveDate,
    pub loan_amount:       f64,
    pub remaining_balance: f64,
    /// Annual rate in percent, e.g. 6.25.
    pub interest_rate:     f64,
    pub monthly_payment:   f64,
    pub status:            LoanStatus,
    pub product_name:      String,
    pub product_type:      String,
    pub security_name:     String,
    pub servicer_name:     String,
    pub current_status:    LoanStatus,
}

/// Load a portfolio from a JSON array of loan records.
pub fn load_records(path: &str) -> AnalysisResult<Vec<LoanRecord>> {
    let content = std::fs::read_to_string(path)?;
    parse_records(&content)
}

pub fn parse_records(json: &str) -> AnalysisResult<Vec<LoanRecord>> {
    let records: Vec<LoanRecord> = serde_json::from_str(json)?;
    log::info!("loaded {} loan records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paid_off_with_space_or_camel_case() {
        let a: LoanStatus = serde_json::from_str(r#""Paid Off""#).unwrap();
        let b: LoanStatus = serde_json::from_str(r#""PaidOff""#).unwrap();
        assert_eq!(a, LoanStatus::PaidOff);
        assert_eq!(b, LoanStatus::PaidOff);
    }

    #[test]
    fn malformed_json_is_a_fatal_serialization_error() {
        let err = parse_records("[{ \"loan_id\": 1 }]").unwrap_err();
        assert!(err.is_fatal());
    }
}
