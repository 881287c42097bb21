//! Loan portfolio analytics: synthetic generation, feature derivation,
//! descriptive aggregation, risk classification, balance regression,
//! segmentation and rule-based recommendations over one static batch.

pub mod balance_model;
pub mod config;
pub mod descriptive;
pub mod encoding;
pub mod error;
pub mod features;
pub mod generator;
pub mod loan;
pub mod model;
pub mod pipeline;
pub mod recommendation;
pub mod report;
pub mod risk_model;
pub mod rng;
pub mod segmentation;
pub mod types;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, AnalysisResult, Severity, Warning};
pub use loan::{LoanRecord, LoanStatus};
pub use pipeline::{analyze_records, run_analysis, AnalysisPipeline};
pub use report::PortfolioReport;
