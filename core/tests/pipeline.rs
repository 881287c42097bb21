use portfolio_core::{
    analyze_records,
    encoding::CategoricalColumn,
    error::Severity,
    generator::PortfolioGenerator,
    loan::parse_records,
    recommendation::Priority,
    rng::{RngBank, StageSlot},
    run_analysis,
    segmentation::SegmentLabel,
    AnalysisConfig, AnalysisError, AnalysisPipeline, LoanRecord,
};

fn generate(n: usize, seed: u64) -> Vec<LoanRecord> {
    let mut rng = RngBank::new(seed).for_stage(StageSlot::Generator);
    PortfolioGenerator::generate(n, &mut rng)
}

#[test]
fn full_run_produces_every_section() {
    let _ = env_logger::builder().is_test(true).try_init();
    let report = run_analysis(&AnalysisConfig::default_test()).expect("pipeline run");

    assert_eq!(report.records_in, 300);
    assert_eq!(report.records_used, 300);
    assert!(report.rejected.is_empty());
    assert_eq!(report.summary.total_loans, 300);

    let risk = report.risk_model.as_ref().expect("risk model");
    assert_eq!(risk.test_size, 60);
    assert_eq!(risk.train_size + risk.test_size, 300);
    assert!(!risk.top_features.is_empty() && risk.top_features.len() <= 5);

    let balance = report.balance_model.as_ref().expect("balance model");
    assert_eq!(balance.test_size, risk.test_size);

    let labels: Vec<SegmentLabel> = report.segments.iter().map(|s| s.label).collect();
    assert_eq!(labels, SegmentLabel::ALL.to_vec());
    let members: usize = report.segments.iter().map(|s| s.member_count).sum();
    assert_eq!(members, 300);

    assert_eq!(report.monitoring.len(), 4);
    assert!(report.monitoring.iter().all(|r| r.priority == Priority::Monitoring));
    assert!(report.recommendations.iter().all(|r| r.priority != Priority::Monitoring));
}

#[test]
fn zero_samples_is_rejected_before_any_stage() {
    let config = AnalysisConfig::default_test().with_sample_count(0);
    let err = run_analysis(&config).unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration(_)));
    assert_eq!(err.severity(), Severity::Fatal);
}

#[test]
fn fewer_samples_than_segments_is_a_configuration_error() {
    let config = AnalysisConfig::default_test().with_sample_count(3);
    assert!(matches!(run_analysis(&config), Err(AnalysisError::Configuration(_))));
}

#[test]
fn invalid_record_is_skipped_with_a_warning() {
    let mut records = generate(200, 11);
    records[17].loan_amount = 0.0;
    let bad_id = records[17].loan_id.clone();

    let report = analyze_records(&records, &AnalysisConfig::default_test()).expect("analysis");

    assert_eq!(report.records_in, 200);
    assert_eq!(report.records_used, 199);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].loan_id, bad_id);
    assert!(report.has_warnings());
    assert!(report.warnings.iter().any(|w| w.message.contains(&bad_id)));
    assert_eq!(report.summary.total_loans, 199);
}

#[test]
fn all_records_invalid_is_an_empty_dataset() {
    let mut records = generate(10, 3);
    for r in &mut records {
        r.loan_amount = -1.0;
    }
    let err = analyze_records(&records, &AnalysisConfig::default_test()).unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyDataset(_)));
    assert!(err.is_fatal());
}

/// 200 copies of two loans cannot form four segments.
#[test]
fn duplicate_batch_fails_before_model_stages() {
    let _ = env_logger::builder().is_test(true).try_init();
    let distinct = generate(2, 21);
    let records: Vec<LoanRecord> = (0..200).map(|i| distinct[i % 2].clone()).collect();

    let err = analyze_records(&records, &AnalysisConfig::default_test()).unwrap_err();
    match &err {
        AnalysisError::Configuration(msg) => {
            assert!(msg.contains("distinct records (2)"), "unexpected message: {msg}")
        }
        other => panic!("expected Configuration, got {other:?}"),
    }
    assert!(err.is_fatal());
}

#[test]
fn rejections_leaving_fewer_loans_than_segments_are_fatal() {
    let mut records = generate(10, 4);
    for r in records.iter_mut().skip(3) {
        r.loan_amount = 0.0;
    }
    let err = analyze_records(&records, &AnalysisConfig::default_test()).unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration(_)), "got {err:?}");
}

#[test]
fn loaded_records_analyse_like_generated_ones() {
    let records = generate(250, 5);
    let json = serde_json::to_string(&records).unwrap();
    let loaded = parse_records(&json).unwrap();
    assert_eq!(loaded, records);

    let config = AnalysisConfig::default_test();
    let from_memory = analyze_records(&records, &config).unwrap();
    let from_json = analyze_records(&loaded, &config).unwrap();
    assert_eq!(from_memory.to_json().unwrap(), from_json.to_json().unwrap());
}

#[test]
fn malformed_json_is_a_serialization_error() {
    let err = parse_records(r#"[{"loan_id": "LOAN_000001"}]"#).unwrap_err();
    assert!(matches!(err, AnalysisError::Serialization(_)));
}

fn map_sizes(pipeline: &AnalysisPipeline) -> Vec<usize> {
    CategoricalColumn::ALL
        .iter()
        .map(|c| pipeline.encodings().map(*c).map(|m| m.len()).unwrap_or(0))
        .collect()
}

#[test]
fn encodings_grow_only_by_appending() {
    let config = AnalysisConfig::default_test();
    let mut pipeline = AnalysisPipeline::new(config);
    pipeline.run().expect("first run");
    let before = map_sizes(&pipeline);

    let mut records = generate(200, 8);
    records[0].product_name = "Bridge Loan".into();
    pipeline.analyze(&records).expect("second run");
    let after = map_sizes(&pipeline);

    assert_eq!(before.len(), after.len());
    assert!(before.iter().zip(&after).all(|(b, a)| a >= b));
    assert!(after.iter().sum::<usize>() > before.iter().sum::<usize>());
}
