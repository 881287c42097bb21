use chrono::NaiveDate;
use portfolio_core::{
    config::RecommendationThresholds,
    descriptive::summarize,
    features::derive_all,
    recommendation::{evaluate, Priority, RecommendationInputs},
    LoanRecord, LoanStatus,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 100 healthy 6% loans spread over five products and four servicers,
/// with the first `distressed` of them marked Default.
fn book(distressed: usize) -> Vec<LoanRecord> {
    let products = ["Conventional", "FHA Loan", "Jumbo Loan", "Prime Mortgage", "VA Loan"];
    let servicers = ["ServiceCorp A", "ServiceCorp B", "ServiceCorp C", "ServiceCorp D"];
    (0..100)
        .map(|i| {
            let status = if i < distressed { LoanStatus::Default } else { LoanStatus::Active };
            LoanRecord {
                loan_id:           format!("LOAN_{i:06}"),
                customer_name:     format!("Customer_{i}"),
                property_address:  "100 Main St, CA".into(),
                origination_date:  date(2021, 1, 1),
                maturity_date:     date(2051, 1, 1),
                loan_amount:       200_000.0,
                remaining_balance: 100_000.0,
                interest_rate:     6.0,
                monthly_payment:   1199.10,
                status,
                product_name:      products[i % 5].into(),
                product_type:      "Fixed Rate".into(),
                security_name:     "SEC_0001".into(),
                servicer_name:     servicers[i % 4].into(),
                current_status:    status,
            }
        })
        .collect()
}

fn recommendations_for(records: &[LoanRecord]) -> Vec<portfolio_core::recommendation::Recommendation> {
    let loans = derive_all(records, date(2025, 1, 1)).loans;
    let inputs = RecommendationInputs::from_summary(&summarize(&loans));
    evaluate(&inputs, &RecommendationThresholds::default())
}

#[test]
fn twenty_percent_high_risk_triggers_exposure_warning() {
    let recs = recommendations_for(&book(20));
    assert!(
        recs.iter().any(|r| r.message.contains("risk exposure above 15%")),
        "missing exposure line: {recs:?}"
    );
}

#[test]
fn five_percent_high_risk_does_not_trigger_exposure_warning() {
    let recs = recommendations_for(&book(5));
    assert!(
        !recs.iter().any(|r| r.priority == Priority::High),
        "unexpected exposure line: {recs:?}"
    );
}

/// Default loans are the first 20 (i % 5 spread evenly), so every product
/// sits at exactly 20%, which is not above the 20% threshold.
#[test]
fn product_rule_is_strictly_above_threshold() {
    let recs = recommendations_for(&book(20));
    assert!(!recs.iter().any(|r| r.priority == Priority::Review), "{recs:?}");
}

#[test]
fn concentrated_risky_product_is_flagged_by_name() {
    let mut records = book(0);
    for r in records.iter_mut().filter(|r| r.product_name == "Jumbo Loan").take(10) {
        r.status = LoanStatus::Delinquent;
    }
    let recs = recommendations_for(&records);
    let review = recs.iter().find(|r| r.priority == Priority::Review).expect("review line");
    assert_eq!(review.message, "flag high-risk products: Jumbo Loan");
}

#[test]
fn balanced_servicers_and_market_rate_stay_quiet() {
    let recs = recommendations_for(&book(0));
    assert!(recs.is_empty(), "{recs:?}");
}
