//! Descriptive aggregation over the derived dataset.
//!
//! Never mutates records. Every percentage uses the total loan count as
//! its denominator; an empty dataset yields zeros and `None` for the
//! conditional means instead of dividing by zero.

use crate::{features::DerivedLoan, loan::LoanStatus};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusShare {
    pub status:     LoanStatus,
    pub count:      usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductSummary {
    pub product_name:       String,
    pub count:              usize,
    pub total_loan_amount:  f64,
    pub mean_loan_amount:   f64,
    pub mean_interest_rate: f64,
    pub high_risk_rate:     f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServicerShare {
    pub servicer_name: String,
    pub count:         usize,
    pub share:         f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PortfolioSummary {
    pub total_loans:               usize,
    pub total_loan_amount:         f64,
    pub mean_loan_amount:          f64,
    pub total_remaining_balance:   f64,
    pub mean_remaining_balance:    f64,
    pub mean_interest_rate:        f64,
    pub mean_monthly_payment:      f64,
    pub status_breakdown:          Vec<StatusShare>,
    pub high_risk_count:           usize,
    pub high_risk_percentage:      f64,
    pub mean_rate_high_risk:       Option<f64>,
    pub mean_rate_low_risk:        Option<f64>,
    /// Sorted by product name.
    pub products:                  Vec<ProductSummary>,
    /// Sorted by descending count, then name.
    pub servicers:                 Vec<ServicerShare>,
}

impl PortfolioSummary {
    /// Fraction of loans flagged high risk, in [0, 1].
    pub fn high_risk_rate(&self) -> f64 {
        mean(self.high_risk_count as f64, self.total_loans)
    }

    /// Share of the largest servicer, 0.0 for an empty book.
    pub fn top_servicer_share(&self) -> f64 {
        self.servicers.first().map(|s| s.share).unwrap_or(0.0)
    }

    pub fn status_count(&self, status: LoanStatus) -> usize {
        self.status_breakdown
            .iter()
            .find(|s| s.status == status)
            .map(|s| s.count)
            .unwrap_or(0)
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn pct(count: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { count as f64 / total as f64 * 100.0 }
}

#[derive(Default)]
struct ProductAccumulator {
    count:      usize,
    amount_sum: f64,
    rate_sum:   f64,
    high_risk:  usize,
}

pub fn summarize(loans: &[DerivedLoan]) -> PortfolioSummary {
    let total = loans.len();

    let total_loan_amount: f64 = loans.iter().map(|l| l.record.loan_amount).sum();
    let total_remaining_balance: f64 = loans.iter().map(|l| l.record.remaining_balance).sum();
    let rate_sum: f64 = loans.iter().map(|l| l.record.interest_rate).sum();
    let payment_sum: f64 = loans.iter().map(|l| l.record.monthly_payment).sum();

    let status_breakdown = LoanStatus::ALL
        .iter()
        .map(|&status| {
            let count = loans.iter().filter(|l| l.record.status == status).count();
            StatusShare { status, count, percentage: pct(count, total) }
        })
        .collect();

    let (high, low): (Vec<&DerivedLoan>, Vec<&DerivedLoan>) =
        loans.iter().partition(|l| l.features.high_risk);
    let conditional_rate = |group: &[&DerivedLoan]| {
        if group.is_empty() {
            None
        } else {
            Some(group.iter().map(|l| l.record.interest_rate).sum::<f64>() / group.len() as f64)
        }
    };

    let mut by_product: BTreeMap<&str, ProductAccumulator> = BTreeMap::new();
    let mut by_servicer: BTreeMap<&str, usize> = BTreeMap::new();
    for loan in loans {
        let acc = by_product.entry(loan.record.product_name.as_str()).or_default();
        acc.count += 1;
        acc.amount_sum += loan.record.loan_amount;
        acc.rate_sum += loan.record.interest_rate;
        if loan.features.high_risk {
            acc.high_risk += 1;
        }
        *by_servicer.entry(loan.record.servicer_name.as_str()).or_default() += 1;
    }

    let products = by_product
        .into_iter()
        .map(|(name, acc)| ProductSummary {
            product_name:       name.to_string(),
            count:              acc.count,
            total_loan_amount:  acc.amount_sum,
            mean_loan_amount:   mean(acc.amount_sum, acc.count),
            mean_interest_rate: mean(acc.rate_sum, acc.count),
            high_risk_rate:     mean(acc.high_risk as f64, acc.count),
        })
        .collect();

    let mut servicers: Vec<ServicerShare> = by_servicer
        .into_iter()
        .map(|(name, count)| ServicerShare {
            servicer_name: name.to_string(),
            count,
            share: mean(count as f64, total),
        })
        .collect();
    // Stable sort keeps name order among ties.
    servicers.sort_by(|a, b| b.count.cmp(&a.count));

    let summary = PortfolioSummary {
        total_loans: total,
        total_loan_amount,
        mean_loan_amount: mean(total_loan_amount, total),
        total_remaining_balance,
        mean_remaining_balance: mean(total_remaining_balance, total),
        mean_interest_rate: mean(rate_sum, total),
        mean_monthly_payment: mean(payment_sum, total),
        status_breakdown,
        high_risk_count: high.len(),
        high_risk_percentage: pct(high.len(), total),
        mean_rate_high_risk: conditional_rate(&high[..]),
        mean_rate_low_risk: conditional_rate(&low[..]),
        products,
        servicers,
    };

    log::info!(
        "descriptive: {} loans, total amount {:.2}, high risk {:.1}%",
        summary.total_loans,
        summary.total_loan_amount,
        summary.high_risk_percentage
    );
    summary
}
