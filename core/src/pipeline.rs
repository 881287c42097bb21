//! The analysis pipeline — one static batch, start to finish.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Generator           (skipped for externally loaded records)
//!   2. Feature deriver
//!   3. Descriptive reporter
//!   4. Train/test split    (shared by both models)
//!   5. Risk classifier
//!   6. Balance regressor
//!   7. Segmenter
//!   8. Recommendation engine
//!
//! RULES:
//!   - Configuration is validated before any stage runs. The distinct
//!     record count is checked against the segment count right after
//!     feature derivation, before any model is fitted.
//!   - Each stage runs to completion before the next begins.
//!   - All randomness flows through the RngBank, one stream per stage.
//!   - The encoding table is the only state shared between stages.
//!   - Advisory errors become report warnings; fatal errors abort.

use crate::{
    balance_model::BalanceRegressor,
    config::{AnalysisConfig, SEGMENT_COUNT},
    descriptive,
    encoding::EncodingTable,
    error::{AnalysisError, AnalysisResult, Warning},
    features,
    generator::PortfolioGenerator,
    loan::LoanRecord,
    model::train_test_split,
    recommendation::{self, RecommendationInputs},
    report::PortfolioReport,
    risk_model::RiskClassifier,
    rng::{RngBank, StageSlot},
    segmentation,
};

pub struct AnalysisPipeline {
    config:    AnalysisConfig,
    rng_bank:  RngBank,
    encodings: EncodingTable,
}

/// Keep an advisory failure as a warning, propagate a fatal one.
fn advisory<T>(
    stage: &str,
    outcome: AnalysisResult<T>,
    warnings: &mut Vec<Warning>,
) -> AnalysisResult<Option<T>> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(err) if !err.is_fatal() => {
            log::warn!("{stage}: {err}");
            warnings.push(Warning::from_error(stage, &err));
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            rng_bank:  RngBank::new(config.seed),
            encodings: EncodingTable::new(),
            config,
        }
    }

    pub fn encodings(&self) -> &EncodingTable {
        &self.encodings
    }

    /// Generate `sample_count` synthetic loans and analyse them.
    pub fn run(&mut self) -> AnalysisResult<PortfolioReport> {
        self.config.validate()?;
        let mut rng = self.rng_bank.for_stage(StageSlot::Generator);
        let records = PortfolioGenerator::generate(self.config.sample_count, &mut rng);
        self.analyze(&records)
    }

    /// Analyse caller-provided records (stages 2–8).
    pub fn analyze(&mut self, records: &[LoanRecord]) -> AnalysisResult<PortfolioReport> {
        self.config
            .clone()
            .with_sample_count(records.len())
            .validate()?;
        let config = &self.config;
        let mut warnings: Vec<Warning> = Vec::new();

        let dataset = features::derive_all(records, config.analysis_date);
        warnings.extend(dataset.warnings());
        if dataset.is_empty() {
            return Err(AnalysisError::EmptyDataset(format!(
                "all {} records failed validation",
                records.len()
            )));
        }
        let loans = &dataset.loans;
        segmentation::check_segmentable(loans, SEGMENT_COUNT)?;

        let summary = descriptive::summarize(loans);

        let mut split_rng = self.rng_bank.for_stage(StageSlot::Split);
        let split = train_test_split(loans.len(), config.test_fraction, &mut split_rng);

        let mut classifier_rng = self.rng_bank.for_stage(StageSlot::Classifier);
        let risk_model = advisory(
            "risk_classifier",
            RiskClassifier::fit(
                loans,
                &split,
                &mut self.encodings,
                &config.forest,
                &mut classifier_rng,
                &mut warnings,
            ),
            &mut warnings,
        )?
        .map(RiskClassifier::into_report);

        let mut regressor_rng = self.rng_bank.for_stage(StageSlot::Regressor);
        let balance_model = advisory(
            "balance_regressor",
            BalanceRegressor::fit(
                loans,
                &split,
                &mut self.encodings,
                &config.boosting,
                &mut regressor_rng,
                &mut warnings,
            ),
            &mut warnings,
        )?
        .map(BalanceRegressor::into_report);

        let mut segmenter_rng = self.rng_bank.for_stage(StageSlot::Segmenter);
        let segmentation = segmentation::segment(loans, &config.clustering, &mut segmenter_rng)?;

        let inputs = RecommendationInputs::from_summary(&summary);
        let recommendations = recommendation::evaluate(&inputs, &config.thresholds);

        log::info!(
            "pipeline: analysed {} of {} records with {} warning(s)",
            loans.len(),
            records.len(),
            warnings.len()
        );

        Ok(PortfolioReport {
            seed: config.seed,
            analysis_date: config.analysis_date,
            records_in: records.len(),
            records_used: loans.len(),
            rejected: dataset.rejected.clone(),
            summary,
            risk_model,
            balance_model,
            segments: segmentation.summaries,
            recommendations,
            monitoring: recommendation::monitoring_recommendations(),
            warnings,
        })
    }
}

/// Run the full pipeline on a synthetic portfolio.
pub fn run_analysis(config: &AnalysisConfig) -> AnalysisResult<PortfolioReport> {
    AnalysisPipeline::new(config.clone()).run()
}

/// Run every stage after generation on externally loaded records.
pub fn analyze_records(
    records: &[LoanRecord],
    config: &AnalysisConfig,
) -> AnalysisResult<PortfolioReport> {
    AnalysisPipeline::new(config.clone()).analyze(records)
}
