//! Recommendation engine — fixed threshold rules over portfolio aggregates.
//!
//! Rules are independent and evaluated in a fixed order; each yields at
//! most one line and no rule suppresses another. The monitoring cadence
//! list is appended unconditionally.

use crate::{config::RecommendationThresholds, descriptive::PortfolioSummary};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Opportunity,
    Risk,
    Review,
    Monitoring,
}

impl Priority {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::High        => "HIGH PRIORITY",
            Self::Opportunity => "OPPORTUNITY",
            Self::Risk        => "RISK",
            Self::Review      => "REVIEW",
            Self::Monitoring  => "MONITORING",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub priority: Priority,
    pub message:  String,
}

impl Recommendation {
    fn new(priority: Priority, message: impl Into<String>) -> Self {
        Self { priority, message: message.into() }
    }
}

/// Everything the rules look at, detached from the report types so the
/// rules can be exercised on hand-built numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationInputs {
    pub high_risk_rate:     f64,
    pub mean_interest_rate: f64,
    pub top_servicer:       Option<(String, f64)>,
    /// (product name, high-risk rate) in product-name order.
    pub product_risk:       Vec<(String, f64)>,
}

impl RecommendationInputs {
    pub fn from_summary(summary: &PortfolioSummary) -> Self {
        Self {
            high_risk_rate:     summary.high_risk_rate(),
            mean_interest_rate: summary.mean_interest_rate,
            top_servicer:       summary
                .servicers
                .first()
                .map(|s| (s.servicer_name.clone(), s.share)),
            product_risk:       summary
                .products
                .iter()
                .map(|p| (p.product_name.clone(), p.high_risk_rate))
                .collect(),
        }
    }
}

pub fn evaluate(
    inputs: &RecommendationInputs,
    thresholds: &RecommendationThresholds,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if inputs.high_risk_rate > thresholds.max_high_risk_rate {
        out.push(Recommendation::new(
            Priority::High,
            format!(
                "risk exposure above {:.0}% ({:.1}% of loans), tighten underwriting",
                thresholds.max_high_risk_rate * 100.0,
                inputs.high_risk_rate * 100.0
            ),
        ));
    }

    if inputs.mean_interest_rate < thresholds.market_rate {
        out.push(Recommendation::new(
            Priority::Opportunity,
            format!(
                "average rate below market ({:.2}% vs {:.2}%), consider rate adjustment",
                inputs.mean_interest_rate, thresholds.market_rate
            ),
        ));
    }

    if let Some((servicer, share)) = &inputs.top_servicer {
        if *share > thresholds.max_servicer_share {
            out.push(Recommendation::new(
                Priority::Risk,
                format!(
                    "servicer concentration risk ({:.1}% with {servicer}), diversify",
                    share * 100.0
                ),
            ));
        }
    }

    let flagged: Vec<&str> = inputs
        .product_risk
        .iter()
        .filter(|(_, rate)| *rate > thresholds.max_product_high_risk_rate)
        .map(|(name, _)| name.as_str())
        .collect();
    if !flagged.is_empty() {
        out.push(Recommendation::new(
            Priority::Review,
            format!("flag high-risk products: {}", flagged.join(", ")),
        ));
    }

    log::info!("recommendations: {} rule(s) fired", out.len());
    out
}

/// The standing monitoring cadence, independent of the data.
pub fn monitoring_recommendations() -> Vec<Recommendation> {
    [
        "Implement monthly risk scoring updates",
        "Monitor interest rate sensitivity",
        "Track servicer performance metrics",
        "Review product mix quarterly",
    ]
    .into_iter()
    .map(|m| Recommendation::new(Priority::Monitoring, m))
    .collect()
}
