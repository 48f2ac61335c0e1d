//! Shared domain types.
//!
//! These types are intentionally kept plain and serializable so they can be:
//!
//! - produced by ingest from CSV rows or built directly by an intake layer
//! - passed between the feature, scoring and forecast stages
//! - exported to JSON alongside an assessment

use serde::{Deserialize, Serialize};

use crate::error::FhError;

/// Lending product the record was captured for.
///
/// Only working-capital and term loans have dedicated behavior bands; every
/// other product (CC, OD, unspecified) falls back to the group-risk bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    WorkingCapital,
    TermLoan,
    #[default]
    Other,
}

impl LoanType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "WORKING CAPITAL" | "WORKING_CAPITAL" | "WC" => LoanType::WorkingCapital,
            "TERM LOAN" | "TERM_LOAN" | "TL" => LoanType::TermLoan,
            _ => LoanType::Other,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LoanType::WorkingCapital => "Working Capital",
            LoanType::TermLoan => "Term Loan",
            LoanType::Other => "Other",
        }
    }
}

/// Special Mention Account stage reported by the lender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmaStatus {
    Standard,
    Sma0,
    Sma1,
    Sma2,
}

impl SmaStatus {
    /// Parse labels such as `SMA-2`, `sma 1`, `SMA_0` or `Standard`.
    pub fn parse(s: &str) -> Option<Self> {
        let compact: String = s
            .trim()
            .to_ascii_uppercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match compact.as_str() {
            "SMA2" => Some(SmaStatus::Sma2),
            "SMA1" => Some(SmaStatus::Sma1),
            "SMA0" => Some(SmaStatus::Sma0),
            "STANDARD" | "STD" | "NONE" | "REGULAR" => Some(SmaStatus::Standard),
            _ => None,
        }
    }
}

/// One "document uploaded" indicator from the checklist provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIndicator {
    pub name: String,
    pub present: bool,
}

/// One company × fiscal-year observation as supplied by the intake layer.
///
/// Every metric is optional: an unparsable cell is `None`, never an error.
/// Defaults for missing values are applied in exactly one place each
/// (feature engineering or the score calculator).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub company: String,
    pub fiscal_year: i32,

    pub turnover: Option<f64>,
    pub ebitda: Option<f64>,
    pub net_profit: Option<f64>,
    pub net_worth: Option<f64>,
    pub total_debt: Option<f64>,

    pub dscr: Option<f64>,
    pub current_ratio: Option<f64>,
    /// Return on capital employed, in percent.
    pub roce: Option<f64>,
    /// Return on equity, in percent.
    pub roe: Option<f64>,

    pub loan_type: LoanType,
    pub loan_amount: Option<f64>,
    pub collateral_value: Option<f64>,
    /// Loan-to-value, in percent.
    pub ltv: Option<f64>,
    pub tenure_months: Option<f64>,

    /// Credit utilization, in percent.
    pub credit_utilization: Option<f64>,
    pub bounced_cheques: Option<f64>,
    pub overdrafts: Option<f64>,
    /// 1 = low, 2 = medium, 3 = high.
    pub group_risk_level: Option<f64>,

    /// Maximum days past due observed across accounts.
    pub max_dpd: Option<f64>,
    pub sma: Option<SmaStatus>,
    pub cross_bank_npa: Option<bool>,

    pub documents: Vec<DocumentIndicator>,
}

impl FinancialRecord {
    pub fn new(company: impl Into<String>, fiscal_year: i32) -> Self {
        Self {
            company: company.into(),
            fiscal_year,
            ..Default::default()
        }
    }

    pub fn npa_tagged(&self) -> bool {
        self.cross_bank_npa.unwrap_or(false)
    }
}

/// Intermediate values of the deterministic FH formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub leverage: f64,
    pub liquidity: f64,
    pub coverage: f64,
    pub profitability: f64,
    pub behavior: f64,
    /// Weighted sum before penalties.
    pub raw: f64,
    pub dpd_penalty: f64,
    pub sma_penalty: f64,
    pub npa_penalty: f64,
    /// `clip(raw - penalties, 0, 100)`.
    pub fh_score: f64,
}

impl ScoreBreakdown {
    pub fn total_penalty(&self) -> f64 {
        self.dpd_penalty + self.sma_penalty + self.npa_penalty
    }
}

/// A `FinancialRecord` plus everything derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredRecord {
    pub record: FinancialRecord,
    pub document_score: f64,
    pub loan_type_behavior_score: f64,
    pub score: ScoreBreakdown,
    pub ebitda_margin: Option<f64>,
    /// Fractional change in turnover vs. the previous observed year.
    pub revenue_growth_yoy: Option<f64>,
    pub trend_slope: f64,
}

impl EngineeredRecord {
    pub fn fiscal_year(&self) -> i32 {
        self.record.fiscal_year
    }

    pub fn fh_score(&self) -> f64 {
        self.score.fh_score
    }

    /// Value of a forecast feature for this record (`None` = missing).
    pub fn feature(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::FhScore => Some(self.score.fh_score),
            Feature::TrendSlope => Some(self.trend_slope),
            Feature::RevenueGrowth => self.revenue_growth_yoy,
            Feature::EbitdaMargin => self.ebitda_margin,
            Feature::LoanTypeBehavior => Some(self.loan_type_behavior_score),
            Feature::DocumentScore => Some(self.document_score),
            Feature::MaxDpd => self.record.max_dpd,
        }
    }

    pub fn feature_vector(&self) -> [Option<f64>; Feature::COUNT] {
        Feature::ALL.map(|f| self.feature(f))
    }
}

/// Inputs of the forecast model, in design-matrix column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    FhScore,
    TrendSlope,
    RevenueGrowth,
    EbitdaMargin,
    LoanTypeBehavior,
    DocumentScore,
    MaxDpd,
}

impl Feature {
    pub const COUNT: usize = 7;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::FhScore,
        Feature::TrendSlope,
        Feature::RevenueGrowth,
        Feature::EbitdaMargin,
        Feature::LoanTypeBehavior,
        Feature::DocumentScore,
        Feature::MaxDpd,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Feature::FhScore => "FH score",
            Feature::TrendSlope => "Trend slope",
            Feature::RevenueGrowth => "Revenue growth (YoY)",
            Feature::EbitdaMargin => "EBITDA margin",
            Feature::LoanTypeBehavior => "Loan-type behavior",
            Feature::DocumentScore => "Document score",
            Feature::MaxDpd => "Max DPD",
        }
    }
}

/// Fiscal-year-ordered engineered records for a single company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyHistory {
    company: String,
    records: Vec<EngineeredRecord>,
}

impl CompanyHistory {
    /// Build a history, rejecting empty input and non-ascending fiscal years.
    pub fn new(company: impl Into<String>, records: Vec<EngineeredRecord>) -> Result<Self, FhError> {
        let company = company.into();
        if records.is_empty() {
            return Err(FhError::Schema(format!("history for '{company}' has no records")));
        }
        if let Some(w) = records
            .windows(2)
            .find(|w| w[0].fiscal_year() >= w[1].fiscal_year())
        {
            return Err(FhError::Schema(format!(
                "history for '{company}' is not strictly ascending: FY{} then FY{}",
                w[0].fiscal_year(),
                w[1].fiscal_year()
            )));
        }
        Ok(Self { company, records })
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn records(&self) -> &[EngineeredRecord] {
        &self.records
    }

    pub fn latest(&self) -> &EngineeredRecord {
        // Non-empty by construction.
        &self.records[self.records.len() - 1]
    }

    /// `(record, next period's FH score)` pairs; the latest record has no label.
    pub fn labeled_pairs(&self) -> impl Iterator<Item = (&EngineeredRecord, f64)> {
        self.records
            .windows(2)
            .map(|w| (&w[0], w[1].fh_score()))
    }
}

/// Coarse risk bucket reported next to the SB band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBucket {
    Low,
    Moderate,
    High,
}

impl RiskBucket {
    pub fn display_name(self) -> &'static str {
        match self {
            RiskBucket::Low => "Low",
            RiskBucket::Moderate => "Moderate",
            RiskBucket::High => "High",
        }
    }
}

/// Lending recommendation derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Review,
    Reject,
}

impl Decision {
    pub fn display_name(self) -> &'static str {
        match self {
            Decision::Approve => "Approve",
            Decision::Review => "Review",
            Decision::Reject => "Reject",
        }
    }
}
