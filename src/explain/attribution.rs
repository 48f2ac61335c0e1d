//! Per-feature and per-driver impacts.
//!
//! Impact of feature `j` for a record is `z_j × β_j`, where `z_j` is the
//! imputed and standardized value and `β_j` the coefficient fitted on the
//! standardized design. The impacts sum to `prediction − intercept`, so a
//! driver's impact is the number of score points it moves the forecast away
//! from the average company.

use serde::{Deserialize, Serialize};

use crate::domain::{DriverDef, EngineeredRecord, Feature};
use crate::forecast::{FeatureRow, ForecastModel};

/// Sign class of an impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorClass {
    PositiveFactor,
    RiskConcern,
    Neutral,
}

impl FactorClass {
    pub fn of(impact: f64) -> Self {
        if impact > 0.0 {
            FactorClass::PositiveFactor
        } else if impact < 0.0 {
            FactorClass::RiskConcern
        } else {
            FactorClass::Neutral
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FactorClass::PositiveFactor => "Positive Factor",
            FactorClass::RiskConcern => "Risk Concern",
            FactorClass::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
    pub feature: Feature,
    /// Value after median imputation.
    pub value: f64,
    pub z: f64,
    pub coefficient: f64,
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverImpact {
    pub name: String,
    pub impact: f64,
    pub classification: FactorClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Prediction for an all-average record.
    pub base_value: f64,
    /// Unclipped model output for this record.
    pub prediction: f64,
    pub features: Vec<FeatureImpact>,
    pub drivers: Vec<DriverImpact>,
}

impl Explanation {
    /// Positive drivers, largest first.
    pub fn positive_factors(&self) -> Vec<&DriverImpact> {
        let mut out: Vec<&DriverImpact> = self
            .drivers
            .iter()
            .filter(|d| d.classification == FactorClass::PositiveFactor)
            .collect();
        out.sort_by(|a, b| b.impact.total_cmp(&a.impact));
        out
    }

    /// Negative drivers, most harmful first.
    pub fn risk_concerns(&self) -> Vec<&DriverImpact> {
        let mut out: Vec<&DriverImpact> = self
            .drivers
            .iter()
            .filter(|d| d.classification == FactorClass::RiskConcern)
            .collect();
        out.sort_by(|a, b| a.impact.total_cmp(&b.impact));
        out
    }

    pub fn total_impact(&self) -> f64 {
        self.features.iter().map(|f| f.impact).sum()
    }
}

pub fn feature_impacts(model: &ForecastModel, row: &FeatureRow) -> Vec<FeatureImpact> {
    let x = model.impute(row);
    let z = model.standardize(row);
    Feature::ALL
        .iter()
        .map(|&feature| {
            let j = feature.index();
            FeatureImpact {
                feature,
                value: x[j],
                z: z[j],
                coefficient: model.coefficients[j],
                impact: z[j] * model.coefficients[j],
            }
        })
        .collect()
}

/// Sum feature impacts into the named drivers, in driver order.
///
/// Features that no driver claims are collected into a trailing
/// "Other Factors" entry so the driver total still matches the feature total.
pub fn aggregate_drivers(impacts: &[FeatureImpact], drivers: &[DriverDef]) -> Vec<DriverImpact> {
    let mut out: Vec<DriverImpact> = drivers
        .iter()
        .map(|d| {
            let impact: f64 = impacts
                .iter()
                .filter(|fi| d.features.contains(&fi.feature))
                .map(|fi| fi.impact)
                .sum();
            DriverImpact {
                name: d.name.clone(),
                impact,
                classification: FactorClass::of(impact),
            }
        })
        .collect();

    let unclaimed: Vec<f64> = impacts
        .iter()
        .filter(|fi| !drivers.iter().any(|d| d.features.contains(&fi.feature)))
        .map(|fi| fi.impact)
        .collect();
    if !unclaimed.is_empty() {
        let impact: f64 = unclaimed.iter().sum();
        out.push(DriverImpact {
            name: "Other Factors".to_string(),
            impact,
            classification: FactorClass::of(impact),
        });
    }
    out
}

pub fn explain(model: &ForecastModel, record: &EngineeredRecord, drivers: &[DriverDef]) -> Explanation {
    explain_row(model, &record.feature_vector(), drivers)
}

pub fn explain_row(model: &ForecastModel, row: &FeatureRow, drivers: &[DriverDef]) -> Explanation {
    let features = feature_impacts(model, row);
    let drivers = aggregate_drivers(&features, drivers);
    Explanation {
        base_value: model.intercept,
        prediction: model.predict_raw(row),
        features,
        drivers,
    }
}
