//! Risk classification: SB band, coarse bucket and decision recommendation.

use serde::Serialize;

use crate::domain::{BandDef, Decision, RiskBucket, RiskThresholds, ScoringPolicy};
use crate::error::FhError;

/// Band, bucket and decision for one score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub sb_code: String,
    pub sb_label: String,
    pub sb_range: String,
    pub risk_band: RiskBucket,
    pub decision: Decision,
}

/// Find the SB band containing `score` (clamped to [0, 100]).
pub fn classify_band(score: f64, bands: &[BandDef]) -> Option<&BandDef> {
    let s = score.clamp(0.0, 100.0);
    bands.iter().find(|b| b.contains(s))
}

pub fn risk_bucket(score: f64, t: &RiskThresholds) -> RiskBucket {
    if score >= t.low_risk_min {
        RiskBucket::Low
    } else if score >= t.moderate_risk_min {
        RiskBucket::Moderate
    } else {
        RiskBucket::High
    }
}

pub fn decision(score: f64, t: &RiskThresholds) -> Decision {
    if score >= t.approve_min {
        Decision::Approve
    } else if score >= t.review_min {
        Decision::Review
    } else {
        Decision::Reject
    }
}

/// Decision policy attached to a band: the decision at its lower bound.
pub fn band_decision(band: &BandDef, t: &RiskThresholds) -> Decision {
    decision(f64::from(band.min), t)
}

pub fn classify(score: f64, policy: &ScoringPolicy) -> Result<Classification, FhError> {
    let band = classify_band(score, &policy.bands)
        .ok_or_else(|| FhError::Numerical(format!("no SB band covers score {score:.4}")))?;
    Ok(Classification {
        sb_code: band.code.clone(),
        sb_label: band.label.clone(),
        sb_range: band.range_label(),
        risk_band: risk_bucket(score, &policy.thresholds),
        decision: decision(score, &policy.thresholds),
    })
}
