use chrono::NaiveDate;
use portfolio_core::{
    features::{derive, derive_all},
    generator::PortfolioGenerator,
    rng::{RngBank, StageSlot},
    AnalysisError, LoanRecord, LoanStatus, Severity,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn loan(id: &str, amount: f64, balance: f64, rate: f64, status: LoanStatus) -> LoanRecord {
    LoanRecord {
        loan_id:           id.into(),
        customer_name:     "Customer_1".into(),
        property_address:  "100 Main St, CA".into(),
        origination_date:  date(2021, 1, 1),
        maturity_date:     date(2051, 1, 1),
        loan_amount:       amount,
        remaining_balance: balance,
        interest_rate:     rate,
        monthly_payment:   1200.0,
        status,
        product_name:      "FHA Loan".into(),
        product_type:      "Fixed Rate".into(),
        security_name:     "SEC_0001".into(),
        servicer_name:     "ServiceCorp A".into(),
        current_status:    status,
    }
}

#[test]
fn derived_fields_use_the_explicit_analysis_date() {
    let record = loan("L1", 200_000.0, 100_000.0, 4.0, LoanStatus::Active);
    let derived = derive(&record, date(2022, 1, 1)).unwrap();

    assert_eq!(derived.features.loan_age_days, 365);
    assert_eq!(derived.features.time_to_maturity_days, (date(2051, 1, 1) - date(2022, 1, 1)).num_days());
    assert_eq!(derived.features.loan_to_value, 0.5);
    assert_eq!(derived.features.payment_to_income, 1200.0 / 2000.0);
    assert!(!derived.features.high_risk);
}

#[test]
fn matured_loans_have_negative_time_to_maturity() {
    let mut record = loan("L1", 200_000.0, 100_000.0, 4.0, LoanStatus::PaidOff);
    record.maturity_date = date(2021, 6, 1);
    let derived = derive(&record, date(2022, 1, 1)).unwrap();
    assert!(derived.features.time_to_maturity_days < 0);
}

/// A Default loan at 3% is high risk regardless of other fields.
#[test]
fn default_status_forces_high_risk() {
    let record = loan("L1", 200_000.0, 20_000.0, 3.0, LoanStatus::Default);
    assert!(derive(&record, date(2022, 1, 1)).unwrap().features.high_risk);
}

#[test]
fn zero_amount_is_a_data_quality_error_not_infinity() {
    let record = loan("L0", 0.0, 1000.0, 4.0, LoanStatus::Active);
    let err = derive(&record, date(2022, 1, 1)).unwrap_err();
    assert!(matches!(err, AnalysisError::DataQuality { .. }), "got {err:?}");
    assert_eq!(err.severity(), Severity::Advisory);
}

#[test]
fn maturity_before_origination_is_rejected() {
    let mut record = loan("L2", 100_000.0, 50_000.0, 4.0, LoanStatus::Active);
    record.maturity_date = date(2020, 1, 1);
    assert!(matches!(
        derive(&record, date(2022, 1, 1)),
        Err(AnalysisError::DataQuality { .. })
    ));
}

#[test]
fn batch_derivation_skips_bad_records_and_keeps_the_rest() {
    let records = vec![
        loan("good-1", 100_000.0, 50_000.0, 4.0, LoanStatus::Active),
        loan("bad", 0.0, 50_000.0, 4.0, LoanStatus::Active),
        loan("good-2", 100_000.0, 90_000.0, 4.0, LoanStatus::Active),
    ];
    let dataset = derive_all(&records, date(2022, 1, 1));
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.rejected.len(), 1);
    assert_eq!(dataset.rejected[0].loan_id, "bad");
    assert_eq!(dataset.warnings().len(), 1);
    assert!(dataset.loans.iter().all(|l| l.features.loan_to_value.is_finite()));
}

#[test]
fn rejected_record_carries_the_derivation_error_text() {
    let mut late = loan("late", 100_000.0, 50_000.0, 4.0, LoanStatus::Active);
    late.maturity_date = date(2020, 1, 1);
    let expected = derive(&late, date(2022, 1, 1)).unwrap_err().to_string();

    let dataset = derive_all(&[late], date(2022, 1, 1));
    assert!(dataset.is_empty());
    assert_eq!(dataset.rejected[0].loan_id, "late");
    assert_eq!(dataset.rejected[0].reason, expected);
    assert!(expected.contains("precedes origination"), "{expected}");
}

/// The flag is exactly recomputable from status, rate and LTV for every
/// generated loan, and LTV is exactly balance / amount.
#[test]
fn high_risk_flag_matches_rule_for_all_generated_loans() {
    let mut rng = RngBank::new(42).for_stage(StageSlot::Generator);
    let records = PortfolioGenerator::generate(1000, &mut rng);
    let dataset = derive_all(&records, date(2025, 1, 1));
    assert_eq!(dataset.len(), 1000);

    for l in &dataset.loans {
        let ltv = l.record.remaining_balance / l.record.loan_amount;
        assert_eq!(l.features.loan_to_value, ltv);
        let expected = matches!(l.record.status, LoanStatus::Default | LoanStatus::Delinquent)
            || l.record.interest_rate > 6.0
            || ltv > 0.8;
        assert_eq!(l.features.high_risk, expected, "loan {}", l.record.loan_id);
        assert_eq!(l.risk_inputs().is_high_risk(), expected);
    }
}
