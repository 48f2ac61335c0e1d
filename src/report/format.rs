//! Formatted terminal output.
//!
//! Formatting lives here so the scoring code stays free of presentation and
//! output changes are localized.

use crate::domain::ScoringPolicy;
use crate::io::ingest::IngestReport;
use crate::report::{Assessment, RankingRow};
use crate::score::band_decision;

/// Full single-company report: score, band, breakdown, history, forecast, drivers.
pub fn format_assessment(a: &Assessment) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== fh - Financial Health Assessment: {} ===\n", a.company));
    out.push_str(&format!("Fiscal year : FY{}\n", a.fiscal_year));
    out.push_str(&format!("FH score    : {:.2}\n", a.fh_score));
    out.push_str(&format!(
        "Band        : {} {} ({})\n",
        a.classification.sb_code, a.classification.sb_label, a.classification.sb_range
    ));
    out.push_str(&format!(
        "Risk / call : {} risk, {}\n",
        a.classification.risk_band.display_name(),
        a.classification.decision.display_name()
    ));

    let b = &a.breakdown;
    out.push_str("\nScore breakdown:\n");
    out.push_str(&format!(
        "  leverage {:.1} | liquidity {:.1} | coverage {:.1} | profitability {:.1} | behavior {:.1}\n",
        b.leverage, b.liquidity, b.coverage, b.profitability, b.behavior
    ));
    out.push_str(&format!(
        "  raw {:.2} - penalties {:.1} (DPD {:.0}, SMA {:.0}, NPA {:.0}) = {:.2}\n",
        b.raw,
        b.total_penalty(),
        b.dpd_penalty,
        b.sma_penalty,
        b.npa_penalty,
        b.fh_score
    ));

    out.push_str("\nHistory:\n");
    out.push_str(&format!("  {:<6} {:>6}  {:>8}  {:>8}\n", "FY", "FH", "EBITDA%", "Growth%"));
    for h in &a.history {
        out.push_str(&format!(
            "  FY{:<4} {:>6.2}  {:>8}  {:>8}\n",
            h.fiscal_year,
            h.fh_score,
            percent(h.ebitda_margin),
            percent(h.revenue_growth_yoy)
        ));
    }
    out.push_str(&format!("  trend slope {:+.2} pts/yr\n", a.trend_slope));

    out.push_str("\nForecast:\n");
    match (&a.forecast, &a.forecast_unavailable) {
        (Some(f), _) => {
            for s in &f.steps {
                out.push_str(&format!(
                    "  FY{}  {:>6.2} ± {:.2}  ({} confidence)\n",
                    s.fiscal_year,
                    s.score,
                    s.uncertainty,
                    s.confidence.display_name()
                ));
            }
        }
        (None, Some(reason)) => out.push_str(&format!("  unavailable: {reason}\n")),
        (None, None) => out.push_str("  unavailable\n"),
    }

    if !a.drivers.is_empty() {
        out.push_str("\nDrivers (points vs. average borrower):\n");
        for d in &a.drivers {
            out.push_str(&format!(
                "  {:<20} {:>+7.2}  {}\n",
                truncate(&d.name, 20),
                d.impact,
                d.classification.display_name()
            ));
        }
    }

    out
}

pub fn format_rankings(rows: &[RankingRow]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>4} {:<32} {:>6} {:>8} {:<6} {:<14} {:<9} {:<8}",
            "rank", "company", "fy", "fh", "band", "label", "risk", "decision"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<4} {:-<32} {:-<6} {:-<8} {:-<6} {:-<14} {:-<9} {:-<8}",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:>4} {:<32} {:>6} {:>8.2} {:<6} {:<14} {:<9} {:<8}",
                r.rank,
                truncate(&r.company, 32),
                r.fiscal_year,
                r.fh_score,
                r.sb_code,
                r.sb_label,
                r.risk_band.display_name(),
                r.decision.display_name(),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// The SB band table with each band's decision policy.
pub fn format_bands(policy: &ScoringPolicy) -> String {
    let mut out = format!("Scoring policy {}\n\n", policy.version);
    out.push_str(&format!("{:<6} {:<14} {:<8} {:<8}\n", "band", "label", "range", "decision"));
    out.push_str(&format!("{:-<6} {:-<14} {:-<8} {:-<8}\n", "", "", "", ""));
    for band in &policy.bands {
        out.push_str(&format!(
            "{:<6} {:<14} {:<8} {:<8}\n",
            band.code,
            band.label,
            band.range_label(),
            band_decision(band, &policy.thresholds).display_name()
        ));
    }
    out
}

pub fn format_ingest_summary(report: &IngestReport) -> String {
    let mut out = format!(
        "Rows: read={} kept={} dropped={}\n",
        report.rows_read, report.rows_kept, report.rows_dropped
    );
    for e in report.row_errors.iter().take(10) {
        let who = e.company.as_deref().unwrap_or("?");
        out.push_str(&format!("  line {} ({who}): {}\n", e.line, e.message));
    }
    if report.row_errors.len() > 10 {
        out.push_str(&format!("  ... {} more\n", report.row_errors.len() - 10));
    }
    out
}

/// Fraction as a signed percentage; `-` when missing.
fn percent(v: Option<f64>) -> String {
    v.map(|x| format!("{:+.1}", x * 100.0)).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::RowError;

    #[test]
    fn band_table_lists_all_bands() {
        let text = format_bands(&ScoringPolicy::default());
        assert!(text.contains("SB1    Excellent"));
        assert!(text.contains("SB16   Critical       0–19"));
        assert_eq!(text.lines().filter(|l| l.starts_with("SB")).count(), 16);
    }

    #[test]
    fn ingest_summary_caps_row_errors() {
        let report = IngestReport {
            rows_read: 20,
            rows_kept: 8,
            rows_dropped: 12,
            row_errors: (0..12)
                .map(|i| RowError {
                    line: i + 2,
                    company: None,
                    message: "missing fiscal year".into(),
                })
                .collect(),
        };
        let text = format_ingest_summary(&report);
        assert!(text.contains("dropped=12"));
        assert!(text.contains("... 2 more"));
    }

    #[test]
    fn history_shows_margin_and_growth() {
        use crate::domain::{Decision, RiskBucket, ScoreBreakdown};
        use crate::report::HistoryPoint;
        use crate::score::Classification;

        let a = Assessment {
            company: "Acme".into(),
            fiscal_year: 2024,
            fh_score: 73.5,
            classification: Classification {
                sb_code: "SB5".into(),
                sb_label: "Satisfactory".into(),
                sb_range: "70–74".into(),
                risk_band: RiskBucket::Moderate,
                decision: Decision::Review,
            },
            breakdown: ScoreBreakdown {
                leverage: 80.0,
                liquidity: 70.0,
                coverage: 70.0,
                profitability: 70.0,
                behavior: 70.0,
                raw: 73.5,
                dpd_penalty: 0.0,
                sma_penalty: 0.0,
                npa_penalty: 0.0,
                fh_score: 73.5,
            },
            history: vec![
                HistoryPoint {
                    fiscal_year: 2023,
                    fh_score: 70.0,
                    ebitda_margin: Some(0.125),
                    revenue_growth_yoy: None,
                },
                HistoryPoint {
                    fiscal_year: 2024,
                    fh_score: 73.5,
                    ebitda_margin: None,
                    revenue_growth_yoy: Some(-0.05),
                },
            ],
            trend_slope: 3.5,
            forecast: None,
            forecast_unavailable: Some("not enough history".into()),
            drivers: Vec::new(),
        };
        let text = format_assessment(&a);
        assert!(text.contains("EBITDA%"));
        assert!(text.contains("+12.5"));
        assert!(text.contains("-5.0"));
        assert!(text.contains("unavailable: not enough history"));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("Coromandel Engineering", 10), "Coromande.");
        assert_eq!(truncate("Acme", 10), "Acme");
    }
}
