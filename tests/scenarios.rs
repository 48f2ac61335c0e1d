//! End-to-end scenarios through the public library API.

use std::sync::Arc;

use fh_score::data::{SampleConfig, generate_records};
use fh_score::domain::{Decision, FinancialRecord, LoanType, RiskBucket, ScoringPolicy, SmaStatus};
use fh_score::explain::explain;
use fh_score::features::engineer_dataset;
use fh_score::io::export::{save_records_csv, write_assessments_json};
use fh_score::io::ingest::{IngestReport, load_records};
use fh_score::score::classify;
use fh_score::{Dataset, FhError, ScoringContext};

/// Working-capital borrower with no banking-conduct data: behavior scores 70.
fn scenario_a(company: &str, fy: i32) -> FinancialRecord {
    FinancialRecord {
        total_debt: Some(100.0),
        net_worth: Some(100.0),
        current_ratio: Some(1.0),
        dscr: Some(1.2),
        roce: Some(10.0),
        roe: Some(10.0),
        loan_type: LoanType::WorkingCapital,
        ..FinancialRecord::new(company, fy)
    }
}

fn sample_context(seed: u64) -> ScoringContext {
    let config = SampleConfig {
        companies: 12,
        years: 4,
        last_year: 2024,
        seed,
    };
    let records = generate_records(&config).unwrap();
    let dataset = Dataset::from_records(records, IngestReport::default(), ScoringPolicy::default()).unwrap();
    ScoringContext::new(dataset)
}

#[test]
fn scenario_a_is_satisfactory_review() {
    let policy = ScoringPolicy::default();
    let histories = engineer_dataset(vec![scenario_a("Acme", 2024)], &policy).unwrap();
    let latest = histories[0].latest();

    assert_eq!(latest.loan_type_behavior_score, 70.0);
    assert!((latest.fh_score() - 73.5).abs() < 1e-4);

    let c = classify(latest.fh_score(), &policy).unwrap();
    assert_eq!(c.sb_code, "SB5");
    assert_eq!(c.sb_label, "Satisfactory");
    assert_eq!(c.sb_range, "70–74");
    assert_eq!(c.risk_band, RiskBucket::Moderate);
    assert_eq!(c.decision, Decision::Review);
}

#[test]
fn scenario_b_dpd_90_is_poor_reject() {
    let policy = ScoringPolicy::default();
    let record = FinancialRecord {
        max_dpd: Some(90.0),
        ..scenario_a("Acme", 2024)
    };
    let histories = engineer_dataset(vec![record], &policy).unwrap();
    let latest = histories[0].latest();

    assert_eq!(latest.score.dpd_penalty, 40.0);
    assert!((latest.fh_score() - 33.5).abs() < 1e-4);

    let c = classify(latest.fh_score(), &policy).unwrap();
    assert_eq!(c.sb_code, "SB13");
    assert_eq!(c.sb_label, "Poor");
    assert_eq!(c.risk_band, RiskBucket::High);
    assert_eq!(c.decision, Decision::Reject);
}

#[test]
fn stacked_penalties_floor_at_zero() {
    let policy = ScoringPolicy::default();
    let record = FinancialRecord {
        max_dpd: Some(95.0),
        sma: Some(SmaStatus::Sma2),
        cross_bank_npa: Some(true),
        ..scenario_a("Acme", 2024)
    };
    let histories = engineer_dataset(vec![record], &policy).unwrap();
    let s = histories[0].latest().score;
    assert_eq!(s.total_penalty(), 105.0);
    assert_eq!(s.fh_score, 0.0);
    assert_eq!(classify(s.fh_score, &policy).unwrap().sb_code, "SB16");
}

#[test]
fn scenario_c_single_record_company_is_scored_and_forecast() {
    let config = SampleConfig {
        companies: 10,
        years: 3,
        last_year: 2024,
        seed: 11,
    };
    let mut records = generate_records(&config).unwrap();
    records.push(scenario_a("Newco", 2024));

    let dataset = Dataset::from_records(records, IngestReport::default(), ScoringPolicy::default()).unwrap();
    let newco = dataset.find("newco").unwrap();
    assert_eq!(newco.records().len(), 1);
    assert_eq!(newco.latest().trend_slope, 0.0);
    assert_eq!(newco.latest().revenue_growth_yoy, None);
    assert_eq!(newco.labeled_pairs().count(), 0);

    let ctx = ScoringContext::new(dataset);
    // 10 companies × 2 labeled years; Newco contributes nothing.
    assert_eq!(ctx.model().unwrap().training_rows, 20);

    let a = ctx.assess("Newco", 2).unwrap();
    assert!((a.fh_score - 73.5).abs() < 1e-4);
    let forecast = a.forecast.unwrap();
    assert_eq!(forecast.steps.len(), 2);
    assert_eq!(forecast.steps[0].fiscal_year, 2025);
    assert!(forecast.steps.iter().all(|s| (0.0..=100.0).contains(&s.score)));
    assert!(forecast.steps[1].uncertainty > forecast.steps[0].uncertainty);
}

#[test]
fn unknown_company_is_not_found() {
    let ctx = sample_context(3);
    let err = ctx.assess("Nonexistent Traders", 1).unwrap_err();
    assert_eq!(
        err,
        FhError::NotFound {
            company: "Nonexistent Traders".to_string()
        }
    );
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn small_dataset_falls_back_to_deterministic_score() {
    let records = vec![scenario_a("Acme", 2023), scenario_a("Acme", 2024)];
    let dataset = Dataset::from_records(records, IngestReport::default(), ScoringPolicy::default()).unwrap();
    let ctx = ScoringContext::new(dataset);

    assert!(matches!(ctx.model(), Err(FhError::InsufficientData { rows: 1, required: 8 })));

    let a = ctx.assess("Acme", 1).unwrap();
    assert!((a.fh_score - 73.5).abs() < 1e-4);
    assert_eq!(a.classification.decision, Decision::Review);
    assert!(a.forecast.is_none());
    assert!(a.forecast_unavailable.is_some());
}

#[test]
fn forecasts_are_deterministic_across_contexts() {
    let a = sample_context(5);
    let b = sample_context(5);
    assert_eq!(*a.model().unwrap(), *b.model().unwrap());

    let company = a.dataset().histories()[0].company().to_string();
    let fa = a.assess(&company, 3).unwrap();
    let fb = b.assess(&company, 3).unwrap();
    assert_eq!(fa.forecast, fb.forecast);
    assert_eq!(fa.drivers, fb.drivers);
}

#[test]
fn attribution_sums_to_prediction_minus_intercept() {
    let ctx = sample_context(9);
    let model = ctx.model().unwrap();
    let policy = ctx.dataset().policy();

    for history in ctx.dataset().histories() {
        let e = explain(&model, history.latest(), &policy.drivers);
        let feature_sum: f64 = e.features.iter().map(|f| f.impact).sum();
        let driver_sum: f64 = e.drivers.iter().map(|d| d.impact).sum();
        assert!((feature_sum - (e.prediction - model.intercept)).abs() < 1e-8);
        assert!((driver_sum - feature_sum).abs() < 1e-8);
    }
}

#[test]
fn concurrent_first_requests_share_one_model() {
    let ctx = sample_context(13);
    let models: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8).map(|_| s.spawn(|| ctx.model().unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for m in &models[1..] {
        assert!(Arc::ptr_eq(&models[0], m));
    }
}

#[test]
fn applicant_history_uses_dataset_model() {
    let ctx = sample_context(17);
    let applicant = vec![
        scenario_a("Applicant Pvt Ltd", 2023),
        FinancialRecord {
            dscr: Some(1.6),
            ..scenario_a("Applicant Pvt Ltd", 2024)
        },
    ];
    let out = ctx.assess_history(applicant, 1).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].history.len(), 2);
    assert!(out[0].trend_slope > 0.0);
    assert!(out[0].forecast.is_some());
    assert!(matches!(ctx.dataset().find("Applicant Pvt Ltd"), Err(FhError::NotFound { .. })));
}

#[test]
fn sample_csv_round_trips_through_ingest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.csv");

    let config = SampleConfig {
        companies: 6,
        years: 3,
        last_year: 2024,
        seed: 21,
    };
    let records = generate_records(&config).unwrap();
    save_records_csv(&path, &records).unwrap();

    let ingested = load_records(&path).unwrap();
    assert_eq!(ingested.report.rows_read, 18);
    assert_eq!(ingested.report.rows_dropped, 0);
    assert_eq!(ingested.records.len(), records.len());
    for (orig, back) in records.iter().zip(&ingested.records) {
        assert_eq!(back.company, orig.company);
        assert_eq!(back.fiscal_year, orig.fiscal_year);
        assert_eq!(back.turnover, orig.turnover);
        assert_eq!(back.dscr, orig.dscr);
        assert_eq!(back.max_dpd, orig.max_dpd);
        assert_eq!(back.sma, orig.sma);
        assert_eq!(back.loan_type, orig.loan_type);
        assert_eq!(back.documents.len(), orig.documents.len());
    }

    // Scores survive the trip through text.
    let policy = ScoringPolicy::default();
    let direct = engineer_dataset(records, &policy).unwrap();
    let reread = engineer_dataset(ingested.records, &policy).unwrap();
    for (a, b) in direct.iter().zip(&reread) {
        assert!((a.latest().fh_score() - b.latest().fh_score()).abs() < 1e-9);
    }
}

#[test]
fn dirty_csv_is_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dirty.csv");
    std::fs::write(
        &path,
        "\u{feff}Company Name, FY ,Total Debt (₹ Crore),Net Worth (₹ Crore),DSCR,Current Ratio,ROCE (%),ROE (%),Loan Type\n\
         Acme,FY2024,\"₹ 1,000\",\"1,000\",1.2,1.0,10%,10 %,Working Capital\n\
         ,2024,1,1,1,1,1,1,\n\
         Acme,2024,5,5,5,5,5,5,\n",
    )
    .unwrap();

    let ingested = load_records(&path).unwrap();
    assert_eq!(ingested.report.rows_read, 3);
    assert_eq!(ingested.report.rows_kept, 1);
    assert_eq!(ingested.report.rows_dropped, 2);

    let dataset =
        Dataset::from_records(ingested.records, ingested.report, ScoringPolicy::default()).unwrap();
    let acme = dataset.find("ACME").unwrap();
    assert!((acme.latest().fh_score() - 73.5).abs() < 1e-4);
}

#[test]
fn assessment_export_is_valid_json() {
    let ctx = sample_context(23);
    let company = ctx.dataset().histories()[1].company().to_string();
    let a = ctx.assess(&company, 2).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assessment.json");
    write_assessments_json(
        &path,
        std::slice::from_ref(&a),
        &ctx.dataset().policy().version,
        ctx.dataset().fingerprint(),
    )
    .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    let first = &v["assessments"][0];
    assert_eq!(first["company"], company.as_str());
    assert!(first["sb_code"].as_str().unwrap().starts_with("SB"));
    assert_eq!(first["forecast"]["steps"].as_array().unwrap().len(), 2);
    assert!(v["generated_at"].as_str().is_some());

    let history = first["history"].as_array().unwrap();
    assert_eq!(history.len(), 4);
    assert!(history[0]["revenue_growth_yoy"].is_null());
    assert!(history[1]["revenue_growth_yoy"].is_f64());
    assert!(history.iter().all(|h| h.get("ebitda_margin").is_some()));
}

#[test]
fn assessment_history_reports_margin_and_growth_per_year() {
    let ctx = sample_context(29);
    let applicant = vec![
        FinancialRecord {
            turnover: Some(500.0),
            ebitda: Some(60.0),
            ..scenario_a("Applicant Pvt Ltd", 2022)
        },
        FinancialRecord {
            turnover: Some(550.0),
            ebitda: Some(77.0),
            ..scenario_a("Applicant Pvt Ltd", 2023)
        },
        FinancialRecord {
            turnover: None,
            ebitda: Some(70.0),
            ..scenario_a("Applicant Pvt Ltd", 2024)
        },
    ];
    let a = &ctx.assess_history(applicant, 1).unwrap()[0];

    let years: Vec<i32> = a.history.iter().map(|h| h.fiscal_year).collect();
    assert_eq!(years, vec![2022, 2023, 2024]);
    assert!((a.history[0].ebitda_margin.unwrap() - 0.12).abs() < 1e-6);
    assert!((a.history[1].ebitda_margin.unwrap() - 0.14).abs() < 1e-6);
    assert_eq!(a.history[2].ebitda_margin, None);
    assert_eq!(a.history[0].revenue_growth_yoy, None);
    assert!((a.history[1].revenue_growth_yoy.unwrap() - 0.10).abs() < 1e-12);
    assert_eq!(a.history[2].revenue_growth_yoy, None);
}

#[test]
fn invalid_policies_are_rejected_with_every_problem() {
    let mut overlapping = ScoringPolicy::default();
    overlapping.bands[1].max = 90;
    assert!(matches!(overlapping.checked(), Err(FhError::Policy(_))));

    let mut gapped = ScoringPolicy::default();
    gapped.bands[2].min = 81;
    assert!(gapped.validate().is_err());

    let mut broken = ScoringPolicy::default();
    broken.weights.leverage += 0.1;
    broken.bands[2].min = 81;
    let problems = broken.validate().unwrap_err();
    assert!(problems.len() >= 2);
    assert!(problems.iter().any(|p| p.starts_with("weights")));

    assert!(ScoringPolicy::default().checked().is_ok());
}
