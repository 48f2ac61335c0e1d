//! Banking-behavior and document-completeness features.
//!
//! The behavior score picks a set of banded sub-scores by loan category and
//! averages them. Each band follows the same rule:
//!
//! ```text
//! value <= good → good score (100)
//! value <= mid  → mid score  (70)
//! value <= bad  → bad score  (40)
//! otherwise     → worst      (20)
//! ```
//!
//! A missing value is scored as if it sat exactly on the `mid` threshold.

use crate::domain::{
    BehaviorBands, BehaviorScores, BehaviorThresholds, FinancialRecord, LoanType,
};

pub fn score_behavior(value: Option<f64>, t: BehaviorThresholds, scores: &BehaviorScores) -> f64 {
    let v = match value {
        Some(v) if !v.is_nan() => v,
        _ => t.mid,
    };
    if v <= t.good {
        scores.good
    } else if v <= t.mid {
        scores.mid
    } else if v <= t.bad {
        scores.bad
    } else {
        scores.worst
    }
}

/// Category-specific behavior score for one record.
pub fn loan_type_behavior_score(record: &FinancialRecord, bands: &BehaviorBands) -> f64 {
    let s = &bands.scores;
    let parts: Vec<f64> = match record.loan_type {
        LoanType::WorkingCapital => vec![
            score_behavior(record.credit_utilization, bands.credit_utilization, s),
            score_behavior(record.bounced_cheques, bands.bounced_cheques, s),
            score_behavior(record.overdrafts, bands.overdrafts, s),
        ],
        LoanType::TermLoan => vec![
            score_behavior(record.ltv, bands.ltv, s),
            score_behavior(record.tenure_months, bands.tenure_months, s),
        ],
        LoanType::Other => {
            // The NPA tag is a yes/no flag; an absent tag reads as "No".
            let npa = if record.npa_tagged() { 1.0 } else { 0.0 };
            vec![
                score_behavior(record.group_risk_level, bands.group_risk, s),
                score_behavior(Some(npa), bands.npa, s),
            ]
        }
    };
    parts.iter().sum::<f64>() / parts.len() as f64
}

/// Share of uploaded documents × 100, or `neutral` with no indicators.
pub fn document_score(record: &FinancialRecord, neutral: f64) -> f64 {
    if record.documents.is_empty() {
        return neutral;
    }
    let present = record.documents.iter().filter(|d| d.present).count();
    present as f64 / record.documents.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentIndicator;

    fn bands() -> BehaviorBands {
        BehaviorBands::default()
    }

    #[test]
    fn banding_rule() {
        let t = BehaviorThresholds::new(70.0, 90.0, 110.0);
        let s = BehaviorScores::default();
        assert_eq!(score_behavior(Some(50.0), t, &s), 100.0);
        assert_eq!(score_behavior(Some(70.0), t, &s), 100.0);
        assert_eq!(score_behavior(Some(85.0), t, &s), 70.0);
        assert_eq!(score_behavior(Some(105.0), t, &s), 40.0);
        assert_eq!(score_behavior(Some(130.0), t, &s), 20.0);
        assert_eq!(score_behavior(None, t, &s), 70.0);
    }

    #[test]
    fn working_capital_averages_three_bands() {
        let record = FinancialRecord {
            loan_type: LoanType::WorkingCapital,
            credit_utilization: Some(60.0),
            bounced_cheques: Some(2.0),
            overdrafts: Some(5.0),
            ..FinancialRecord::new("Acme", 2024)
        };
        let score = loan_type_behavior_score(&record, &bands());
        assert!((score - (100.0 + 40.0 + 20.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn term_loan_uses_ltv_and_tenure() {
        let record = FinancialRecord {
            loan_type: LoanType::TermLoan,
            ltv: Some(75.0),
            tenure_months: Some(36.0),
            ..FinancialRecord::new("Acme", 2024)
        };
        assert_eq!(loan_type_behavior_score(&record, &bands()), 70.0);
    }

    #[test]
    fn other_loans_use_group_risk_and_npa() {
        let clean = FinancialRecord {
            group_risk_level: Some(1.0),
            ..FinancialRecord::new("Acme", 2024)
        };
        assert_eq!(loan_type_behavior_score(&clean, &bands()), 100.0);

        let tagged = FinancialRecord {
            group_risk_level: Some(3.0),
            cross_bank_npa: Some(true),
            ..FinancialRecord::new("Acme", 2024)
        };
        assert_eq!(loan_type_behavior_score(&tagged, &bands()), 55.0);
    }

    #[test]
    fn missing_everything_scores_mid() {
        let record = FinancialRecord {
            loan_type: LoanType::WorkingCapital,
            ..FinancialRecord::new("Acme", 2024)
        };
        assert_eq!(loan_type_behavior_score(&record, &bands()), 70.0);
    }

    #[test]
    fn document_score_is_share_present() {
        let mut record = FinancialRecord::new("Acme", 2024);
        assert_eq!(document_score(&record, 50.0), 50.0);

        record.documents = vec![
            DocumentIndicator { name: "pan".into(), present: true },
            DocumentIndicator { name: "gst".into(), present: true },
            DocumentIndicator { name: "itr".into(), present: false },
            DocumentIndicator { name: "audit".into(), present: true },
        ];
        assert_eq!(document_score(&record, 50.0), 75.0);
    }
}
