//! Synthetic portfolio generation.
//!
//! Draws are made column by column in a fixed order so that a given
//! (sample_count, seed) always reproduces the same portfolio:
//!   1. property addresses   (house number, street, state per loan)
//!   2. origination offsets  (0..1095 days from 2020-01-01)
//!   3. term lengths         (3650..10950 days)
//!   4. loan amounts         (Normal(250k, 100k) clipped to [50k, 1M])
//!   5. balance fractions    (Uniform(0.1, 0.95))
//!   6. interest rates       (Uniform(2.5, 8.5))
//!   7. statuses             (70/20/5/5)
//!   8. product names, 9. product types, 10. security ids, 11. servicers
//!
//! NEVER reorder the draws. Reordering changes every generated portfolio.

use crate::{
    loan::{LoanRecord, LoanStatus},
    rng::StageRng,
};
use chrono::{Duration, NaiveDate};

pub const LOAN_AMOUNT_MEAN: f64 = 250_000.0;
pub const LOAN_AMOUNT_SD:   f64 = 100_000.0;
pub const LOAN_AMOUNT_MIN:  f64 = 50_000.0;
pub const LOAN_AMOUNT_MAX:  f64 = 1_000_000.0;
pub const AMORTIZATION_PERIODS: i32 = 360;

const ORIGINATION_WINDOW_DAYS: i64 = 1095;
const MIN_TERM_DAYS: i64 = 3650;
const MAX_TERM_DAYS: i64 = 10950;

const STREETS: [&str; 4] = ["Main St", "Oak Ave", "Park Blvd", "First St"];
const STATES: [&str; 10] = ["CA", "TX", "FL", "NY", "IL", "PA", "OH", "GA", "NC", "MI"];
const STATUS_WEIGHTS: [f64; 4] = [0.70, 0.20, 0.05, 0.05];

pub const PRODUCT_NAMES: [&str; 5] = [
    "Prime Mortgage",
    "Jumbo Loan",
    "FHA Loan",
    "VA Loan",
    "Conventional",
];
pub const PRODUCT_TYPES: [&str; 3] = ["Fixed Rate", "Adjustable Rate", "Interest Only"];
pub const SERVICERS: [&str; 4] = [
    "ServiceCorp A",
    "ServiceCorp B",
    "ServiceCorp C",
    "ServiceCorp D",
];

/// Base date for origination draws.
pub fn generation_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

/// Level payment for a fixed-rate loan over `periods` months.
/// A zero rate degenerates to straight-line principal.
pub fn amortized_payment(principal: f64, annual_rate_pct: f64, periods: i32) -> f64 {
    let r = annual_rate_pct / 100.0 / 12.0;
    if r == 0.0 {
        return principal / periods as f64;
    }
    principal * r / (1.0 - (1.0 + r).powi(-periods))
}

/// Produces batches of synthetic loan records.
pub struct PortfolioGenerator;

impl PortfolioGenerator {
    /// Generate exactly `n` records from the given stream.
    pub fn generate(n: usize, rng: &mut StageRng) -> Vec<LoanRecord> {
        let addresses: Vec<String> = (0..n)
            .map(|_| {
                let number = rng.range_i64(100, 9999);
                let street = rng.choose(&STREETS);
                let state = rng.choose(&STATES);
                format!("{number} {street}, {state}")
            })
            .collect();

        let epoch = generation_epoch();
        let originations: Vec<NaiveDate> = (0..n)
            .map(|_| epoch + Duration::days(rng.range_i64(0, ORIGINATION_WINDOW_DAYS)))
            .collect();
        let maturities: Vec<NaiveDate> = originations
            .iter()
            .map(|orig| *orig + Duration::days(rng.range_i64(MIN_TERM_DAYS, MAX_TERM_DAYS)))
            .collect();

        let amounts: Vec<f64> = (0..n)
            .map(|_| {
                rng.normal(LOAN_AMOUNT_MEAN, LOAN_AMOUNT_SD)
                    .clamp(LOAN_AMOUNT_MIN, LOAN_AMOUNT_MAX)
            })
            .collect();
        let balance_fractions: Vec<f64> = (0..n).map(|_| rng.uniform(0.1, 0.95)).collect();
        let rates: Vec<f64> = (0..n).map(|_| rng.uniform(2.5, 8.5)).collect();
        let statuses: Vec<LoanStatus> = (0..n)
            .map(|_| LoanStatus::ALL[rng.weighted_index(&STATUS_WEIGHTS)])
            .collect();
        let product_names: Vec<&str> = (0..n).map(|_| *rng.choose(&PRODUCT_NAMES)).collect();
        let product_types: Vec<&str> = (0..n).map(|_| *rng.choose(&PRODUCT_TYPES)).collect();
        let securities: Vec<i64> = (0..n).map(|_| rng.range_i64(1, 100)).collect();
        let servicers: Vec<&str> = (0..n).map(|_| *rng.choose(&SERVICERS)).collect();

        let records: Vec<LoanRecord> = (0..n)
            .map(|i| LoanRecord {
                loan_id:           format!("LOAN_{:06}", i + 1),
                customer_name:     format!("Customer_{}", i + 1),
                property_address:  addresses[i].clone(),
                origination_date:  originations[i],
                maturity_date:     maturities[i],
                loan_amount:       amounts[i],
                remaining_balance: amounts[i] * balance_fractions[i],
                interest_rate:     rates[i],
                monthly_payment:   amortized_payment(amounts[i], rates[i], AMORTIZATION_PERIODS),
                status:            statuses[i],
                product_name:      product_names[i].to_string(),
                product_type:      product_types[i].to_string(),
                security_name:     format!("SEC_{:04}", securities[i]),
                servicer_name:     servicers[i].to_string(),
                current_status:    statuses[i],
            })
            .collect();

        log::info!("generator: produced {} loan records", records.len());
        records
    }
}
