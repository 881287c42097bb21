//! portfolio-runner: headless loan-portfolio analysis.
//!
//! Usage:
//!   portfolio-runner --seed 42 --samples 1000
//!   portfolio-runner --config analysis.json --analysis-date 2025-06-30
//!   portfolio-runner --input loans.json --json report.json

use anyhow::{Context, Result};
use chrono::NaiveDate;
use portfolio_core::{
    loan::load_records, model::metrics::ClassificationMetrics, AnalysisConfig, AnalysisPipeline,
    PortfolioReport,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json_path = string_arg(&args, "--json");

    let mut config = match string_arg(&args, "--config") {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.sample_count = parse_arg(&args, "--samples", config.sample_count);
    config.analysis_date = parse_arg::<NaiveDate>(&args, "--analysis-date", config.analysis_date);

    let input = string_arg(&args, "--input");

    println!("Loan Portfolio Analysis");
    println!("  seed:          {}", config.seed);
    match input {
        Some(path) => println!("  input:         {path}"),
        None => println!("  samples:       {}", config.sample_count),
    }
    println!("  analysis date: {}", config.analysis_date);
    println!();

    let mut pipeline = AnalysisPipeline::new(config);
    let report = match input {
        Some(path) => {
            let records =
                load_records(path).with_context(|| format!("Cannot load records from {path}"))?;
            pipeline.analyze(&records)?
        }
        None => pipeline.run()?,
    };

    log::info!(
        "analysis complete: {} loans, {} warning(s)",
        report.records_used,
        report.warnings.len()
    );

    print_summary(&report);

    if let Some(path) = json_path {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("Cannot write report to {path}"))?;
        println!();
        println!("Report written to {path}");
    }
    Ok(())
}

fn print_summary(report: &PortfolioReport) {
    let s = &report.summary;
    println!("=== PORTFOLIO SUMMARY ===");
    println!("  loans:              {} ({} rejected)", s.total_loans, report.rejected.len());
    println!("  total amount:       ${:.0}", s.total_loan_amount);
    println!("  mean amount:        ${:.0}", s.mean_loan_amount);
    println!("  total balance:      ${:.0}", s.total_remaining_balance);
    println!("  mean rate:          {:.2}%", s.mean_interest_rate);
    println!("  mean payment:       ${:.2}", s.mean_monthly_payment);
    println!(
        "  high risk:          {} ({:.1}%)",
        s.high_risk_count, s.high_risk_percentage
    );
    if let (Some(hi), Some(lo)) = (s.mean_rate_high_risk, s.mean_rate_low_risk) {
        println!("  rate high/low risk: {hi:.2}% / {lo:.2}%");
    }

    println!();
    println!("=== STATUS ===");
    for st in &s.status_breakdown {
        println!("  {:<12} {:>6} ({:.1}%)", st.status.label(), st.count, st.percentage);
    }

    println!();
    println!("=== PRODUCTS ===");
    for p in &s.products {
        println!(
            "  {:<16} {:>5} | mean ${:.0} | rate {:.2}% | high risk {:.1}%",
            p.product_name,
            p.count,
            p.mean_loan_amount,
            p.mean_interest_rate,
            p.high_risk_rate * 100.0
        );
    }

    println!();
    println!("=== SERVICERS ===");
    for sv in &s.servicers {
        println!("  {:<16} {:>5} ({:.1}%)", sv.servicer_name, sv.count, sv.share * 100.0);
    }

    println!();
    println!("=== RISK CLASSIFIER ===");
    match &report.risk_model {
        Some(risk) => {
            println!("  train/test: {}/{}", risk.train_size, risk.test_size);
            print_classification(&risk.metrics);
            println!("  top features:");
            for f in &risk.top_features {
                println!("    {:<22} {:.4}", f.feature, f.importance);
            }
        }
        None => println!("  (skipped)"),
    }

    println!();
    println!("=== BALANCE REGRESSOR ===");
    match &report.balance_model {
        Some(balance) => {
            println!("  train/test: {}/{}", balance.train_size, balance.test_size);
            println!("  MAE:        {}", fmt_opt(balance.metrics.mean_absolute_error, 2));
            println!("  R²:         {}", fmt_opt(balance.metrics.r2, 4));
        }
        None => println!("  (skipped)"),
    }

    println!();
    println!("=== SEGMENTS ===");
    for seg in &report.segments {
        println!(
            "  {:<12} {:>5} ({:.1}%) | mean ${:.0} | rate {:.2}% | LTV {:.2} | high risk {:.1}%",
            seg.label.name(),
            seg.member_count,
            seg.share * 100.0,
            seg.mean_loan_amount,
            seg.mean_interest_rate,
            seg.mean_loan_to_value,
            seg.high_risk_rate * 100.0
        );
    }

    println!();
    println!("=== RECOMMENDATIONS ===");
    if report.recommendations.is_empty() {
        println!("  (no rules fired)");
    }
    for r in report.recommendations.iter().chain(&report.monitoring) {
        println!("  [{}] {}", r.priority.tag(), r.message);
    }

    if report.has_warnings() {
        println!();
        println!("=== WARNINGS ===");
        for w in &report.warnings {
            println!("  {}: {}", w.stage, w.message);
        }
    }
}

fn print_classification(m: &ClassificationMetrics) {
    println!("  accuracy:   {}", fmt_opt(m.accuracy, 4));
    for c in &m.classes {
        println!(
            "  {:<10} precision {} | recall {} | f1 {} | support {}",
            c.label,
            fmt_opt(c.precision, 3),
            fmt_opt(c.recall, 3),
            fmt_opt(c.f1, 3),
            c.support
        );
    }
    println!(
        "  macro avg  precision {} | recall {} | f1 {}",
        fmt_opt(m.macro_precision, 3),
        fmt_opt(m.macro_recall, 3),
        fmt_opt(m.macro_f1, 3)
    );
}

fn fmt_opt(value: Option<f64>, digits: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.digits$}"))
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
