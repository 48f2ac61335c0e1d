//! Reporting: assessment/ranking output types and terminal formatting.

use std::cmp::Ordering;

use serde::Serialize;

use crate::domain::{
    CompanyHistory, Decision, EngineeredRecord, RiskBucket, ScoreBreakdown, ScoringPolicy,
};
use crate::error::FhError;
use crate::explain::DriverImpact;
use crate::forecast::Forecast;
use crate::score::{Classification, classify};

pub mod format;

pub use format::*;

/// One fiscal year of a company's history as reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub fiscal_year: i32,
    pub fh_score: f64,
    pub ebitda_margin: Option<f64>,
    /// Fractional change in turnover vs. the previous observed year.
    pub revenue_growth_yoy: Option<f64>,
}

impl HistoryPoint {
    pub fn from_record(record: &EngineeredRecord) -> Self {
        Self {
            fiscal_year: record.fiscal_year(),
            fh_score: record.fh_score(),
            ebitda_margin: record.ebitda_margin,
            revenue_growth_yoy: record.revenue_growth_yoy,
        }
    }
}

/// Everything reported for one company at its latest fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub company: String,
    pub fiscal_year: i32,
    pub fh_score: f64,
    #[serde(flatten)]
    pub classification: Classification,
    pub breakdown: ScoreBreakdown,
    pub history: Vec<HistoryPoint>,
    pub trend_slope: f64,
    pub forecast: Option<Forecast>,
    /// Why `forecast` is missing, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_unavailable: Option<String>,
    pub drivers: Vec<DriverImpact>,
}

impl Assessment {
    pub fn positive_factors(&self) -> impl Iterator<Item = &DriverImpact> {
        self.drivers.iter().filter(|d| d.impact > 0.0)
    }

    pub fn risk_concerns(&self) -> impl Iterator<Item = &DriverImpact> {
        self.drivers.iter().filter(|d| d.impact < 0.0)
    }
}

/// Latest score per company, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub rank: usize,
    pub company: String,
    pub fiscal_year: i32,
    pub fh_score: f64,
    pub sb_code: String,
    pub sb_label: String,
    pub risk_band: RiskBucket,
    pub decision: Decision,
}

/// Rank companies by their latest FH score (ties broken by name).
pub fn rank_companies(
    histories: &[CompanyHistory],
    policy: &ScoringPolicy,
) -> Result<Vec<RankingRow>, FhError> {
    let mut latest: Vec<_> = histories.iter().map(|h| (h.company(), h.latest())).collect();
    latest.sort_by(|a, b| {
        b.1.fh_score()
            .partial_cmp(&a.1.fh_score())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    latest
        .into_iter()
        .enumerate()
        .map(|(i, (company, record))| {
            let c = classify(record.fh_score(), policy)?;
            Ok(RankingRow {
                rank: i + 1,
                company: company.to_string(),
                fiscal_year: record.fiscal_year(),
                fh_score: record.fh_score(),
                sb_code: c.sb_code,
                sb_label: c.sb_label,
                risk_band: c.risk_band,
                decision: c.decision,
            })
        })
        .collect()
}
