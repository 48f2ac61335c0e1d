//! Per-company feature engineering.
//!
//! For each company the records are sorted by fiscal year first; growth and
//! slope are only meaningful relative to that ordering. Then each record gets:
//!
//! - document score and loan-type behavior score
//! - the FH score breakdown
//! - EBITDA margin and YoY revenue growth
//! - the company-wide FH trend slope (least squares against each record's
//!   position in the ordered history, one step per observed year)

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{CompanyHistory, EngineeredRecord, FinancialRecord, ScoringPolicy};
use crate::error::FhError;
use crate::features::behavior::{document_score, loan_type_behavior_score};
use crate::math::least_squares_slope;
use crate::score::score_record;

/// Engineer one company's records into an ordered history.
///
/// Fails if two records share a fiscal year.
pub fn engineer_history(
    company: &str,
    mut records: Vec<FinancialRecord>,
    policy: &ScoringPolicy,
) -> Result<CompanyHistory, FhError> {
    records.sort_by_key(|r| r.fiscal_year);

    let mut engineered: Vec<EngineeredRecord> = Vec::with_capacity(records.len());
    let mut prev_turnover: Option<Option<f64>> = None;

    for record in records {
        let document_score = document_score(&record, policy.neutral_document_score);
        let behavior = loan_type_behavior_score(&record, &policy.behavior);
        let score = score_record(&record, behavior, policy);
        let ebitda_margin = ebitda_margin(&record, policy.epsilon);
        let revenue_growth_yoy = prev_turnover.and_then(|prev| revenue_growth(prev, record.turnover));
        prev_turnover = Some(record.turnover);

        engineered.push(EngineeredRecord {
            record,
            document_score,
            loan_type_behavior_score: behavior,
            score,
            ebitda_margin,
            revenue_growth_yoy,
            trend_slope: 0.0,
        });
    }

    // Regressed on position, so a gap year does not flatten the trend.
    let points: Vec<(f64, f64)> = engineered
        .iter()
        .enumerate()
        .map(|(i, r)| (i as f64, r.fh_score()))
        .collect();
    let slope = least_squares_slope(&points);
    for r in &mut engineered {
        r.trend_slope = slope;
    }

    CompanyHistory::new(company, engineered)
}

/// Group records by company and engineer every history.
///
/// Companies are independent, so they are processed in parallel; the output
/// is ordered by company name regardless of scheduling.
pub fn engineer_dataset(
    records: Vec<FinancialRecord>,
    policy: &ScoringPolicy,
) -> Result<Vec<CompanyHistory>, FhError> {
    let mut groups: BTreeMap<String, Vec<FinancialRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.company.clone()).or_default().push(record);
    }
    debug!(companies = groups.len(), "engineering company histories");

    groups
        .into_par_iter()
        .map(|(company, records)| engineer_history(&company, records, policy))
        .collect()
}

/// `EBITDA / (turnover + ε)`.
pub fn ebitda_margin(record: &FinancialRecord, epsilon: f64) -> Option<f64> {
    let ebitda = record.ebitda?;
    let turnover = record.turnover?;
    Some(ebitda / (turnover + epsilon))
}

/// Fractional change from `prev` to `current`; undefined when either side is
/// missing or the base is zero.
pub fn revenue_growth(prev: Option<f64>, current: Option<f64>) -> Option<f64> {
    let prev = prev?;
    let current = current?;
    if prev == 0.0 {
        return None;
    }
    Some((current - prev) / prev)
}
