//! Deterministic FH score: weighted sub-scores minus delinquency penalties.
//!
//! ```text
//! FH_raw = w_lev·leverage + w_liq·liquidity + w_cov·coverage + w_prof·profitability + w_beh·behavior
//! FH     = clip(FH_raw − (dpd + sma + npa penalties), 0, 100)
//! ```
//!
//! Penalties are stacked before the single final clip, so a heavily delinquent
//! borrower bottoms out at 0 regardless of balance-sheet strength.

use crate::domain::{FinancialRecord, PenaltyTable, ScoreBreakdown, ScoringPolicy, SmaStatus};
use crate::score::interp::interpolate_or_mid;

/// Score one record given its already-engineered behavior score.
pub fn score_record(record: &FinancialRecord, behavior: f64, policy: &ScoringPolicy) -> ScoreBreakdown {
    let curves = &policy.curves;
    let w = &policy.weights;

    let leverage = interpolate_or_mid(leverage_ratio(record, policy.epsilon), &curves.leverage);
    let liquidity = interpolate_or_mid(record.current_ratio, &curves.liquidity);
    let coverage = interpolate_or_mid(record.dscr, &curves.coverage);
    let profitability = 0.5
        * (interpolate_or_mid(record.roce, &curves.profitability)
            + interpolate_or_mid(record.roe, &curves.profitability));

    let raw = w.leverage * leverage
        + w.liquidity * liquidity
        + w.coverage * coverage
        + w.profitability * profitability
        + w.behavior * behavior;

    let dpd_penalty = dpd_penalty(record.max_dpd, &policy.penalties);
    let sma_penalty = sma_penalty(record.sma, &policy.penalties);
    let npa_penalty = npa_penalty(record.npa_tagged(), &policy.penalties);

    let fh_score = (raw - dpd_penalty - sma_penalty - npa_penalty).clamp(0.0, 100.0);

    ScoreBreakdown {
        leverage,
        liquidity,
        coverage,
        profitability,
        behavior,
        raw,
        dpd_penalty,
        sma_penalty,
        npa_penalty,
        fh_score,
    }
}

/// `total_debt / (net_worth + ε)`.
///
/// A non-positive net worth carrying debt is treated as unbounded leverage,
/// which lands on the curve's worst output.
pub fn leverage_ratio(record: &FinancialRecord, epsilon: f64) -> Option<f64> {
    let debt = record.total_debt?;
    let worth = record.net_worth?;
    if worth <= 0.0 && debt > 0.0 {
        return Some(f64::INFINITY);
    }
    Some(debt / (worth + epsilon))
}

/// Highest DPD tier reached; zero, negative or missing DPD carries no penalty.
pub fn dpd_penalty(dpd: Option<f64>, table: &PenaltyTable) -> f64 {
    let Some(dpd) = dpd.filter(|d| d.is_finite() && *d > 0.0) else {
        return 0.0;
    };
    table
        .dpd_tiers
        .iter()
        .rev()
        .find(|tier| dpd >= tier.min_days)
        .map(|tier| tier.penalty)
        .unwrap_or(0.0)
}

pub fn sma_penalty(sma: Option<SmaStatus>, table: &PenaltyTable) -> f64 {
    match sma {
        Some(SmaStatus::Sma2) => table.sma2,
        Some(SmaStatus::Sma1) => table.sma1,
        _ => 0.0,
    }
}

pub fn npa_penalty(tagged: bool, table: &PenaltyTable) -> f64 {
    if tagged { table.npa } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> FinancialRecord {
        FinancialRecord {
            total_debt: Some(100.0),
            net_worth: Some(100.0),
            current_ratio: Some(1.0),
            dscr: Some(1.2),
            roce: Some(10.0),
            roe: Some(10.0),
            ..FinancialRecord::new("Acme", 2024)
        }
    }

    #[test]
    fn scenario_a_breakdown() {
        let s = score_record(&scenario_a(), 70.0, &ScoringPolicy::default());
        assert!((s.leverage - 80.0).abs() < 1e-4);
        assert_eq!(s.liquidity, 70.0);
        assert_eq!(s.coverage, 70.0);
        assert_eq!(s.profitability, 70.0);
        assert!((s.fh_score - 73.5).abs() < 1e-4);
        assert_eq!(s.total_penalty(), 0.0);
    }

    #[test]
    fn dpd_tiers() {
        let t = PenaltyTable::default();
        assert_eq!(dpd_penalty(None, &t), 0.0);
        assert_eq!(dpd_penalty(Some(0.0), &t), 0.0);
        assert_eq!(dpd_penalty(Some(1.0), &t), 5.0);
        assert_eq!(dpd_penalty(Some(29.9), &t), 5.0);
        assert_eq!(dpd_penalty(Some(30.0), &t), 15.0);
        assert_eq!(dpd_penalty(Some(59.0), &t), 15.0);
        assert_eq!(dpd_penalty(Some(60.0), &t), 25.0);
        assert_eq!(dpd_penalty(Some(89.0), &t), 25.0);
        assert_eq!(dpd_penalty(Some(90.0), &t), 40.0);
        assert_eq!(dpd_penalty(Some(400.0), &t), 40.0);
    }

    #[test]
    fn sma_and_npa_penalties() {
        let t = PenaltyTable::default();
        assert_eq!(sma_penalty(Some(SmaStatus::Sma2), &t), 25.0);
        assert_eq!(sma_penalty(Some(SmaStatus::Sma1), &t), 15.0);
        assert_eq!(sma_penalty(Some(SmaStatus::Sma0), &t), 0.0);
        assert_eq!(sma_penalty(None, &t), 0.0);
        assert_eq!(npa_penalty(true, &t), 40.0);
        assert_eq!(npa_penalty(false, &t), 0.0);
    }

    #[test]
    fn stacked_penalties_clip_to_zero() {
        let record = FinancialRecord {
            max_dpd: Some(95.0),
            sma: Some(SmaStatus::Sma2),
            cross_bank_npa: Some(true),
            ..scenario_a()
        };
        let s = score_record(&record, 100.0, &ScoringPolicy::default());
        assert_eq!(s.total_penalty(), 105.0);
        assert_eq!(s.fh_score, 0.0);
    }

    #[test]
    fn missing_metrics_use_curve_midpoints() {
        let record = FinancialRecord::new("Blank", 2024);
        let s = score_record(&record, 70.0, &ScoringPolicy::default());
        assert_eq!(s.leverage, 80.0);
        assert_eq!(s.liquidity, 70.0);
        assert_eq!(s.coverage, 70.0);
        assert_eq!(s.profitability, 70.0);
        assert!((s.fh_score - 73.5).abs() < 1e-9);
    }

    #[test]
    fn zero_net_worth_does_not_divide_by_zero() {
        let record = FinancialRecord {
            net_worth: Some(0.0),
            total_debt: Some(0.0),
            ..scenario_a()
        };
        assert_eq!(leverage_ratio(&record, 1e-6), Some(0.0));

        let negative = FinancialRecord {
            net_worth: Some(-50.0),
            ..scenario_a()
        };
        let s = score_record(&negative, 70.0, &ScoringPolicy::default());
        assert_eq!(s.leverage, 40.0);
    }

    #[test]
    fn scoring_is_idempotent() {
        let policy = ScoringPolicy::default();
        let r = scenario_a();
        assert_eq!(score_record(&r, 70.0, &policy), score_record(&r, 70.0, &policy));
    }
}
