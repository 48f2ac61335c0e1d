//! Next-period FH score forecaster.
//!
//! Training rows are every engineered record that has a later record for the
//! same company; the label is that later record's FH score. The pipeline is:
//!
//! 1. median-impute missing feature values (per feature, training set)
//! 2. standardize with the training mean and sample std (std 0 → 1)
//! 3. ridge regression on the standardized design with a free intercept
//!
//! Fitting on standardized columns means the coefficients are directly the
//! per-unit-z effects used by attribution, and the intercept is the mean
//! training prediction.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CompanyHistory, EngineeredRecord, Feature, ForecastSettings};
use crate::error::FhError;
use crate::math::{mean, median, sample_std, solve_ridge};

pub type FeatureRow = [Option<f64>; Feature::COUNT];

/// Labeled design rows gathered across all companies.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub rows: Vec<FeatureRow>,
    pub labels: Vec<f64>,
}

impl TrainingSet {
    pub fn from_histories(histories: &[CompanyHistory]) -> Self {
        let mut set = TrainingSet::default();
        for history in histories {
            for (record, next_score) in history.labeled_pairs() {
                set.rows.push(record.feature_vector());
                set.labels.push(next_score);
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Trained artifact: read-only after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastModel {
    pub intercept: f64,
    /// Coefficients on standardized features, in `Feature::ALL` order.
    pub coefficients: Vec<f64>,
    pub medians: Vec<f64>,
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
    pub training_rows: usize,
    /// In-sample root mean squared error of the next-period prediction.
    pub rmse: f64,
    pub alpha: f64,
}

impl ForecastModel {
    pub fn train(histories: &[CompanyHistory], settings: &ForecastSettings) -> Result<Self, FhError> {
        Self::fit(&TrainingSet::from_histories(histories), settings)
    }

    pub fn fit(set: &TrainingSet, settings: &ForecastSettings) -> Result<Self, FhError> {
        let n = set.len();
        if n < settings.min_training_rows {
            return Err(FhError::InsufficientData {
                rows: n,
                required: settings.min_training_rows,
            });
        }

        let p = Feature::COUNT;
        let medians: Vec<f64> = (0..p)
            .map(|j| {
                let observed: Vec<f64> = set.rows.iter().filter_map(|r| r[j]).collect();
                median(&observed).unwrap_or(0.0)
            })
            .collect();

        let imputed: Vec<[f64; Feature::COUNT]> = set
            .rows
            .iter()
            .map(|r| impute_row(r, &medians))
            .collect();

        let mut means = Vec::with_capacity(p);
        let mut stds = Vec::with_capacity(p);
        for j in 0..p {
            let col: Vec<f64> = imputed.iter().map(|r| r[j]).collect();
            means.push(mean(&col).unwrap_or(0.0));
            let s = sample_std(&col);
            stds.push(if s > 0.0 && s.is_finite() { s } else { 1.0 });
        }

        let z = DMatrix::from_fn(n, p, |i, j| (imputed[i][j] - means[j]) / stds[j]);
        let y = DVector::from_column_slice(&set.labels);

        let fit = solve_ridge(&z, &y, settings.ridge_alpha)
            .ok_or_else(|| FhError::Numerical("ridge system could not be solved".to_string()))?;

        let mut model = ForecastModel {
            intercept: fit.intercept,
            coefficients: fit.coefficients.iter().copied().collect(),
            medians,
            means,
            stds,
            training_rows: n,
            rmse: 0.0,
            alpha: settings.ridge_alpha,
        };

        let sse: f64 = set
            .rows
            .iter()
            .zip(&set.labels)
            .map(|(row, y)| {
                let e = y - model.predict_raw(row);
                e * e
            })
            .sum();
        model.rmse = (sse / n as f64).sqrt();

        debug!(
            rows = n,
            rmse = model.rmse,
            intercept = model.intercept,
            "forecast model fitted"
        );
        Ok(model)
    }

    /// Replace missing values with training medians.
    pub fn impute(&self, row: &FeatureRow) -> [f64; Feature::COUNT] {
        impute_row(row, &self.medians)
    }

    /// Standardized (z-scored) feature values after imputation.
    pub fn standardize(&self, row: &FeatureRow) -> [f64; Feature::COUNT] {
        let x = self.impute(row);
        std::array::from_fn(|j| (x[j] - self.means[j]) / self.stds[j])
    }

    /// Unclipped model output.
    pub fn predict_raw(&self, row: &FeatureRow) -> f64 {
        let z = self.standardize(row);
        self.intercept
            + z.iter()
                .zip(&self.coefficients)
                .map(|(z, b)| z * b)
                .sum::<f64>()
    }

    /// Next-period FH score for a record, clipped to [0, 100].
    pub fn predict_next(&self, record: &EngineeredRecord) -> f64 {
        self.predict_raw(&record.feature_vector()).clamp(0.0, 100.0)
    }

    /// Recursive multi-step forecast.
    ///
    /// Each step's prediction becomes the FH-score input of the next step; all
    /// other features are held at the query record's values.
    pub fn forecast(&self, record: &EngineeredRecord, horizon: usize) -> Forecast {
        let mut row = record.feature_vector();
        let mut steps = Vec::with_capacity(horizon);
        for k in 1..=horizon {
            let score = self.predict_raw(&row).clamp(0.0, 100.0);
            steps.push(ForecastStep {
                step: k,
                fiscal_year: record.fiscal_year() + k as i32,
                score,
                uncertainty: self.rmse * (k as f64).sqrt(),
                confidence: Confidence::for_step(k),
            });
            row[Feature::FhScore.index()] = Some(score);
        }
        Forecast {
            base_fiscal_year: record.fiscal_year(),
            steps,
        }
    }
}

fn impute_row(row: &FeatureRow, medians: &[f64]) -> [f64; Feature::COUNT] {
    std::array::from_fn(|j| match row[j] {
        Some(v) if v.is_finite() => v,
        _ => medians[j],
    })
}

/// Confidence of a forecast step; only the one-step prediction is direct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn for_step(step: usize) -> Self {
        match step {
            0 | 1 => Confidence::High,
            2 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastStep {
    pub step: usize,
    pub fiscal_year: i32,
    pub score: f64,
    /// Half-width of a ±1σ band around `score`, growing with √step.
    pub uncertainty: f64,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub base_fiscal_year: i32,
    pub steps: Vec<ForecastStep>,
}

impl Forecast {
    pub fn next(&self) -> Option<&ForecastStep> {
        self.steps.first()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.score).collect()
    }
}
