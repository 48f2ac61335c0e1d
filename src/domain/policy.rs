//! The scoring policy: every tunable constant of the FH pipeline as data.
//!
//! Weights, interpolation control points, penalty tiers, behavior bands, the
//! 16-band SB table, bucket/decision thresholds, forecast settings and the
//! driver map all live in one versioned object. The defaults are the
//! canonical policy; a JSON file can override any subset of it.
//!
//! Example JSON override:
//! ```json
//! {
//!   "version": "fh-2024.2",
//!   "forecast": { "ridge_alpha": 2.0 },
//!   "thresholds": { "review_min": 65 }
//! }
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Feature;
use crate::error::FhError;

/// `(input, output)` control points, inputs strictly ascending.
pub type ControlPoints = Vec<(f64, f64)>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringPolicy {
    pub version: String,
    /// Added to denominators that may be zero.
    pub epsilon: f64,
    pub weights: ScoreWeights,
    pub curves: ScoreCurves,
    pub penalties: PenaltyTable,
    pub behavior: BehaviorBands,
    /// Document score used when a record carries no document indicators.
    pub neutral_document_score: f64,
    /// SB bands, best first.
    pub bands: Vec<BandDef>,
    pub thresholds: RiskThresholds,
    pub forecast: ForecastSettings,
    pub drivers: Vec<DriverDef>,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            version: "fh-2024.1".to_string(),
            epsilon: 1e-6,
            weights: ScoreWeights::default(),
            curves: ScoreCurves::default(),
            penalties: PenaltyTable::default(),
            behavior: BehaviorBands::default(),
            neutral_document_score: 50.0,
            bands: default_bands(),
            thresholds: RiskThresholds::default(),
            forecast: ForecastSettings::default(),
            drivers: default_drivers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreWeights {
    pub leverage: f64,
    pub liquidity: f64,
    pub coverage: f64,
    pub profitability: f64,
    pub behavior: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            leverage: 0.35,
            liquidity: 0.20,
            coverage: 0.20,
            profitability: 0.15,
            behavior: 0.10,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.leverage + self.liquidity + self.coverage + self.profitability + self.behavior
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreCurves {
    /// Input: total debt / net worth.
    pub leverage: ControlPoints,
    /// Input: current ratio.
    pub liquidity: ControlPoints,
    /// Input: DSCR.
    pub coverage: ControlPoints,
    /// Input: ROCE and ROE (percent), each mapped separately and averaged.
    pub profitability: ControlPoints,
}

impl Default for ScoreCurves {
    fn default() -> Self {
        Self {
            leverage: vec![(0.0, 100.0), (1.0, 80.0), (3.0, 40.0)],
            liquidity: vec![(0.5, 40.0), (1.0, 70.0), (2.0, 100.0)],
            coverage: vec![(0.8, 40.0), (1.2, 70.0), (2.0, 100.0)],
            profitability: vec![(5.0, 40.0), (10.0, 70.0), (20.0, 100.0)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DpdTier {
    /// Lowest DPD (inclusive) at which this tier applies.
    pub min_days: f64,
    pub penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PenaltyTable {
    /// Ascending by `min_days`; only applies to DPD > 0.
    pub dpd_tiers: Vec<DpdTier>,
    pub sma1: f64,
    pub sma2: f64,
    pub npa: f64,
}

impl Default for PenaltyTable {
    fn default() -> Self {
        Self {
            dpd_tiers: vec![
                DpdTier { min_days: 0.0, penalty: 5.0 },
                DpdTier { min_days: 30.0, penalty: 15.0 },
                DpdTier { min_days: 60.0, penalty: 25.0 },
                DpdTier { min_days: 90.0, penalty: 40.0 },
            ],
            sma1: 15.0,
            sma2: 25.0,
            npa: 40.0,
        }
    }
}

/// `score_behavior` thresholds: `value <= good`, `<= mid`, `<= bad`, else worst.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BehaviorThresholds {
    pub good: f64,
    pub mid: f64,
    pub bad: f64,
}

impl BehaviorThresholds {
    pub const fn new(good: f64, mid: f64, bad: f64) -> Self {
        Self { good, mid, bad }
    }
}

/// Scores awarded per behavior band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorScores {
    pub good: f64,
    pub mid: f64,
    pub bad: f64,
    pub worst: f64,
}

impl Default for BehaviorScores {
    fn default() -> Self {
        Self {
            good: 100.0,
            mid: 70.0,
            bad: 40.0,
            worst: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorBands {
    pub scores: BehaviorScores,
    pub credit_utilization: BehaviorThresholds,
    pub bounced_cheques: BehaviorThresholds,
    pub overdrafts: BehaviorThresholds,
    pub ltv: BehaviorThresholds,
    pub tenure_months: BehaviorThresholds,
    pub group_risk: BehaviorThresholds,
    pub npa: BehaviorThresholds,
}

impl Default for BehaviorBands {
    fn default() -> Self {
        Self {
            scores: BehaviorScores::default(),
            credit_utilization: BehaviorThresholds::new(70.0, 90.0, 110.0),
            bounced_cheques: BehaviorThresholds::new(0.0, 1.0, 2.0),
            overdrafts: BehaviorThresholds::new(0.0, 1.0, 2.0),
            ltv: BehaviorThresholds::new(60.0, 70.0, 80.0),
            tenure_months: BehaviorThresholds::new(36.0, 60.0, 84.0),
            group_risk: BehaviorThresholds::new(1.0, 2.0, 3.0),
            npa: BehaviorThresholds::new(0.0, 1.0, 1.0),
        }
    }
}

/// One SB band: inclusive integer range `[min, max]` and its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BandDef {
    pub code: String,
    pub label: String,
    pub min: u8,
    pub max: u8,
}

impl BandDef {
    fn new(code: &str, label: &str, min: u8, max: u8) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
            min,
            max,
        }
    }

    /// Continuous membership: `min <= score < max + 1`.
    pub fn contains(&self, score: f64) -> bool {
        score >= f64::from(self.min) && score < f64::from(self.max) + 1.0
    }

    pub fn range_label(&self) -> String {
        format!("{}–{}", self.min, self.max)
    }
}

fn default_bands() -> Vec<BandDef> {
    vec![
        BandDef::new("SB1", "Excellent", 90, 100),
        BandDef::new("SB2", "Very Good", 85, 89),
        BandDef::new("SB3", "Good", 80, 84),
        BandDef::new("SB4", "Good", 75, 79),
        BandDef::new("SB5", "Satisfactory", 70, 74),
        BandDef::new("SB6", "Satisfactory", 65, 69),
        BandDef::new("SB7", "Acceptable", 60, 64),
        BandDef::new("SB8", "Acceptable", 55, 59),
        BandDef::new("SB9", "Marginal", 50, 54),
        BandDef::new("SB10", "Marginal", 45, 49),
        BandDef::new("SB11", "Weak", 40, 44),
        BandDef::new("SB12", "Weak", 35, 39),
        BandDef::new("SB13", "Poor", 30, 34),
        BandDef::new("SB14", "Poor", 25, 29),
        BandDef::new("SB15", "Very Poor", 20, 24),
        BandDef::new("SB16", "Critical", 0, 19),
    ]
}

/// Lower bounds of the coarse risk buckets and of the decision tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskThresholds {
    pub low_risk_min: f64,
    pub moderate_risk_min: f64,
    pub approve_min: f64,
    pub review_min: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_risk_min: 75.0,
            moderate_risk_min: 50.0,
            approve_min: 75.0,
            review_min: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastSettings {
    /// L2 penalty on the standardized coefficients.
    pub ridge_alpha: f64,
    /// Fewer labeled rows than this and training reports `InsufficientData`.
    pub min_training_rows: usize,
    pub default_horizon: usize,
    pub max_horizon: usize,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            ridge_alpha: 1.2,
            min_training_rows: 8,
            default_horizon: 1,
            max_horizon: 5,
        }
    }
}

/// A named business driver and the model features that roll into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverDef {
    pub name: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl DriverDef {
    fn new(name: &str, features: &[Feature]) -> Self {
        Self {
            name: name.to_string(),
            features: features.to_vec(),
        }
    }
}

fn default_drivers() -> Vec<DriverDef> {
    vec![
        DriverDef::new("Financial Health", &[Feature::FhScore]),
        DriverDef::new("Score Trend", &[Feature::TrendSlope]),
        DriverDef::new("Revenue Growth", &[Feature::RevenueGrowth]),
        DriverDef::new("Profitability", &[Feature::EbitdaMargin]),
        DriverDef::new("Banking Conduct", &[Feature::LoanTypeBehavior, Feature::MaxDpd]),
        DriverDef::new("Documentation", &[Feature::DocumentScore]),
        // Qualitative drivers with no model feature behind them yet.
        DriverDef::new("Industry Risk", &[]),
        DriverDef::new("Management Quality", &[]),
    ]
}

impl ScoringPolicy {
    /// Load a policy from JSON; fields not present keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, FhError> {
        let file = File::open(path).map_err(|e| FhError::io(path.display(), e))?;
        let policy: ScoringPolicy = serde_json::from_reader(file)
            .map_err(|e| FhError::Policy(vec![format!("{}: {e}", path.display())]))?;
        policy.checked()
    }

    /// Default policy, or the JSON file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self, FhError> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn checked(self) -> Result<Self, FhError> {
        self.validate().map_err(FhError::Policy)?;
        Ok(self)
    }

    /// Validate the policy. Returns all problems at once (not just the first).
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            errors.push("epsilon: must be finite and > 0".to_string());
        }

        let w = &self.weights;
        for (name, v) in [
            ("leverage", w.leverage),
            ("liquidity", w.liquidity),
            ("coverage", w.coverage),
            ("profitability", w.profitability),
            ("behavior", w.behavior),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                errors.push(format!("weights.{name}: must be finite and non-negative"));
            }
        }
        if (w.sum() - 1.0).abs() > 1e-9 {
            errors.push(format!("weights: must sum to 1 (got {:.6})", w.sum()));
        }

        for (name, points) in [
            ("leverage", &self.curves.leverage),
            ("liquidity", &self.curves.liquidity),
            ("coverage", &self.curves.coverage),
            ("profitability", &self.curves.profitability),
        ] {
            validate_curve(name, points, &mut errors);
        }

        let tiers = &self.penalties.dpd_tiers;
        if tiers.windows(2).any(|t| t[0].min_days >= t[1].min_days) {
            errors.push("penalties.dpd_tiers: min_days must be strictly ascending".to_string());
        }
        if tiers.iter().any(|t| !(t.penalty.is_finite() && t.penalty >= 0.0)) {
            errors.push("penalties.dpd_tiers: penalties must be finite and non-negative".to_string());
        }

        let b = &self.behavior;
        for (name, t) in [
            ("credit_utilization", b.credit_utilization),
            ("bounced_cheques", b.bounced_cheques),
            ("overdrafts", b.overdrafts),
            ("ltv", b.ltv),
            ("tenure_months", b.tenure_months),
            ("group_risk", b.group_risk),
            ("npa", b.npa),
        ] {
            if !(t.good <= t.mid && t.mid <= t.bad) {
                errors.push(format!("behavior.{name}: thresholds must satisfy good <= mid <= bad"));
            }
        }

        validate_bands(&self.bands, &mut errors);

        let t = &self.thresholds;
        for (name, v) in [
            ("low_risk_min", t.low_risk_min),
            ("moderate_risk_min", t.moderate_risk_min),
            ("approve_min", t.approve_min),
            ("review_min", t.review_min),
        ] {
            if !(0.0..=100.0).contains(&v) {
                errors.push(format!("thresholds.{name}: must be within [0, 100]"));
            }
        }
        if t.moderate_risk_min > t.low_risk_min {
            errors.push("thresholds: moderate_risk_min must not exceed low_risk_min".to_string());
        }
        if t.review_min > t.approve_min {
            errors.push("thresholds: review_min must not exceed approve_min".to_string());
        }

        let f = &self.forecast;
        if !(f.ridge_alpha.is_finite() && f.ridge_alpha > 0.0) {
            errors.push("forecast.ridge_alpha: must be finite and > 0".to_string());
        }
        if f.min_training_rows < 2 {
            errors.push("forecast.min_training_rows: must be at least 2".to_string());
        }
        if f.max_horizon == 0 {
            errors.push("forecast.max_horizon: must be at least 1".to_string());
        }
        if f.default_horizon == 0 || f.default_horizon > f.max_horizon {
            errors.push("forecast.default_horizon: must be within 1..=max_horizon".to_string());
        }

        let mut driver_names = HashSet::new();
        let mut seen_features = HashSet::new();
        for (i, d) in self.drivers.iter().enumerate() {
            if !driver_names.insert(d.name.as_str()) {
                errors.push(format!("drivers[{i}]: duplicate driver name '{}'", d.name));
            }
            for feature in &d.features {
                if !seen_features.insert(*feature) {
                    errors.push(format!(
                        "drivers[{i}]: feature '{}' already belongs to another driver",
                        feature.display_name()
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_curve(name: &str, points: &[(f64, f64)], errors: &mut Vec<String>) {
    if points.len() < 2 {
        errors.push(format!("curves.{name}: needs at least two control points"));
        return;
    }
    if points.iter().any(|(x, y)| !(x.is_finite() && y.is_finite())) {
        errors.push(format!("curves.{name}: control points must be finite"));
    }
    if points.windows(2).any(|p| p[0].0 >= p[1].0) {
        errors.push(format!("curves.{name}: inputs must be strictly ascending"));
    }
}

fn validate_bands(bands: &[BandDef], errors: &mut Vec<String>) {
    let Some(first) = bands.first() else {
        errors.push("bands: table is empty".to_string());
        return;
    };
    if first.max != 100 {
        errors.push(format!("bands[0]: best band must end at 100 (got {})", first.max));
    }
    if let Some(last) = bands.last() {
        if last.min != 0 {
            errors.push(format!("bands: worst band must start at 0 (got {})", last.min));
        }
    }

    let mut codes = HashSet::new();
    for (i, band) in bands.iter().enumerate() {
        if band.min > band.max {
            errors.push(format!("bands[{i}] {}: min {} > max {}", band.code, band.min, band.max));
        }
        if !codes.insert(band.code.as_str()) {
            errors.push(format!("bands[{i}]: duplicate code '{}'", band.code));
        }
    }

    for (i, pair) in bands.windows(2).enumerate() {
        let (better, worse) = (&pair[0], &pair[1]);
        if u16::from(worse.max) + 1 != u16::from(better.min) {
            let kind = if worse.max >= better.min { "overlaps" } else { "leaves a gap after" };
            errors.push(format!(
                "bands[{}] {} ({}) {kind} {} ({})",
                i + 1,
                worse.code,
                worse.range_label(),
                better.code,
                better.range_label()
            ));
        }
    }
}
