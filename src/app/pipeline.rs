//! Shared scoring pipeline used by every CLI command and by library callers.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> feature engineering -> scoring -> (train once) -> forecast/explain
//!
//! A `Dataset` is an immutable snapshot of engineered histories. A
//! `ScoringContext` wraps one snapshot together with the forecast model trained
//! on it; the model is built on first use and then shared. Loading a different
//! dataset means building a new context, so a stale model is never reused.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::domain::{CompanyHistory, DriverDef, EngineeredRecord, FinancialRecord, ScoringPolicy};
use crate::error::FhError;
use crate::explain::{DriverImpact, explain};
use crate::features::engineer_dataset;
use crate::forecast::{Forecast, ForecastModel};
use crate::io::ingest::{IngestReport, load_records};
use crate::report::{Assessment, HistoryPoint, RankingRow, rank_companies};
use crate::score::classify;

/// Engineered company histories for one loaded dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    policy: ScoringPolicy,
    histories: Vec<CompanyHistory>,
    report: IngestReport,
    fingerprint: u64,
}

impl Dataset {
    /// Ingest a CSV file and engineer every company.
    pub fn load(path: &Path, policy: ScoringPolicy) -> Result<Self, FhError> {
        let ingested = load_records(path)?;
        info!(
            path = %path.display(),
            rows_read = ingested.report.rows_read,
            rows_kept = ingested.report.rows_kept,
            rows_dropped = ingested.report.rows_dropped,
            "dataset ingested"
        );
        Self::from_records(ingested.records, ingested.report, policy)
    }

    pub fn from_records(
        records: Vec<FinancialRecord>,
        report: IngestReport,
        policy: ScoringPolicy,
    ) -> Result<Self, FhError> {
        let policy = policy.checked()?;
        if records.is_empty() {
            return Err(FhError::EmptyDataset);
        }
        let histories = engineer_dataset(records, &policy)?;
        let fingerprint = fingerprint(&histories, &policy);
        debug!(companies = histories.len(), fingerprint, "dataset engineered");
        Ok(Self {
            policy,
            histories,
            report,
            fingerprint,
        })
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn histories(&self) -> &[CompanyHistory] {
        &self.histories
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    /// Content hash of the engineered snapshot and the policy version.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Case-insensitive company lookup.
    pub fn find(&self, company: &str) -> Result<&CompanyHistory, FhError> {
        let wanted = company.trim().to_lowercase();
        self.histories
            .iter()
            .find(|h| h.company().to_lowercase() == wanted)
            .ok_or_else(|| FhError::NotFound {
                company: company.trim().to_string(),
            })
    }
}

fn fingerprint(histories: &[CompanyHistory], policy: &ScoringPolicy) -> u64 {
    let mut hasher = DefaultHasher::new();
    policy.version.hash(&mut hasher);
    for h in histories {
        h.company().hash(&mut hasher);
        for r in h.records() {
            r.fiscal_year().hash(&mut hasher);
            r.fh_score().to_bits().hash(&mut hasher);
            for v in r.feature_vector() {
                v.map(f64::to_bits).hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}

/// A dataset snapshot plus its lazily trained forecast model.
#[derive(Debug)]
pub struct ScoringContext {
    dataset: Arc<Dataset>,
    model: OnceLock<Result<Arc<ForecastModel>, FhError>>,
}

impl ScoringContext {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            model: OnceLock::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The forecast model for this snapshot, trained on first request.
    ///
    /// Concurrent first callers block on a single training run; a failed
    /// training is cached too, so every caller sees the same outcome.
    pub fn model(&self) -> Result<Arc<ForecastModel>, FhError> {
        self.model
            .get_or_init(|| {
                let settings = &self.dataset.policy.forecast;
                let result = ForecastModel::train(&self.dataset.histories, settings).map(Arc::new);
                match &result {
                    Ok(m) => info!(
                        rows = m.training_rows,
                        rmse = m.rmse,
                        fingerprint = self.dataset.fingerprint,
                        "forecast model trained"
                    ),
                    Err(e) => warn!(error = %e, "forecast model unavailable"),
                }
                result
            })
            .clone()
    }

    /// Assess a company from the loaded dataset at its latest fiscal year.
    pub fn assess(&self, company: &str, horizon: usize) -> Result<Assessment, FhError> {
        let history = self.dataset.find(company)?;
        self.build_assessment(history, horizon)
    }

    /// Assess applicant records that are not part of the training dataset.
    ///
    /// The records are engineered with the same policy and scored with the
    /// dataset's model; one assessment per company, in company order.
    pub fn assess_history(
        &self,
        records: Vec<FinancialRecord>,
        horizon: usize,
    ) -> Result<Vec<Assessment>, FhError> {
        if records.is_empty() {
            return Err(FhError::EmptyDataset);
        }
        let histories = engineer_dataset(records, &self.dataset.policy)?;
        histories
            .iter()
            .map(|h| self.build_assessment(h, horizon))
            .collect()
    }

    /// Latest score per company, best first.
    pub fn rankings(&self) -> Result<Vec<RankingRow>, FhError> {
        rank_companies(&self.dataset.histories, &self.dataset.policy)
    }

    fn build_assessment(&self, history: &CompanyHistory, horizon: usize) -> Result<Assessment, FhError> {
        let policy = &self.dataset.policy;
        let latest = history.latest();
        let classification = classify(latest.fh_score(), policy)?;
        let horizon = self.clamp_horizon(horizon);

        let outlook = forecast_outlook(self.model(), latest, horizon, &policy.drivers);
        if let Some(reason) = &outlook.unavailable {
            warn!(company = history.company(), reason = %reason, "forecast skipped");
        }

        Ok(Assessment {
            company: history.company().to_string(),
            fiscal_year: latest.fiscal_year(),
            fh_score: latest.fh_score(),
            classification,
            breakdown: latest.score,
            history: history.records().iter().map(HistoryPoint::from_record).collect(),
            trend_slope: latest.trend_slope,
            forecast: outlook.forecast,
            forecast_unavailable: outlook.unavailable,
            drivers: outlook.drivers,
        })
    }

    fn clamp_horizon(&self, horizon: usize) -> usize {
        let max = self.dataset.policy.forecast.max_horizon;
        let clamped = horizon.clamp(1, max);
        if clamped != horizon {
            warn!(requested = horizon, used = clamped, "forecast horizon clamped");
        }
        clamped
    }
}

/// Forecast and driver attribution for one record, or the reason there is none.
#[derive(Debug)]
struct Outlook {
    forecast: Option<Forecast>,
    unavailable: Option<String>,
    drivers: Vec<DriverImpact>,
}

/// Any model failure leaves the deterministic score, band and decision intact.
fn forecast_outlook(
    model: Result<Arc<ForecastModel>, FhError>,
    latest: &EngineeredRecord,
    horizon: usize,
    drivers: &[DriverDef],
) -> Outlook {
    match model {
        Ok(model) => Outlook {
            forecast: Some(model.forecast(latest, horizon)),
            unavailable: None,
            drivers: explain(&model, latest, drivers).drivers,
        },
        Err(e) => Outlook {
            forecast: None,
            unavailable: Some(e.to_string()),
            drivers: Vec::new(),
        },
    }
}
