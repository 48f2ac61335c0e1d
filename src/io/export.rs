//! Exports: assessment JSON, rankings CSV and dataset CSV.
//!
//! The dataset writer uses the same column labels the intake spreadsheets
//! use, so its output can be read straight back by `ingest`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::domain::{FinancialRecord, LoanType, SmaStatus};
use crate::error::FhError;
use crate::report::{Assessment, RankingRow};

const TOOL: &str = "fh";

/// JSON envelope around one or more assessments.
#[derive(Debug, Serialize)]
struct AssessmentFile<'a> {
    tool: &'static str,
    generated_at: String,
    policy_version: &'a str,
    dataset_fingerprint: String,
    assessments: &'a [Assessment],
}

pub fn write_assessments_json(
    path: &Path,
    assessments: &[Assessment],
    policy_version: &str,
    dataset_fingerprint: u64,
) -> Result<(), FhError> {
    let file = File::create(path)
        .map_err(|e| FhError::Export(format!("failed to create '{}': {e}", path.display())))?;
    let doc = AssessmentFile {
        tool: TOOL,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        policy_version,
        dataset_fingerprint: format!("{dataset_fingerprint:016x}"),
        assessments,
    };
    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| FhError::Export(format!("failed to write assessment JSON: {e}")))
}

pub fn write_rankings_csv(path: &Path, rows: &[RankingRow]) -> Result<(), FhError> {
    let file = File::create(path)
        .map_err(|e| FhError::Export(format!("failed to create '{}': {e}", path.display())))?;
    let mut w = csv::Writer::from_writer(file);
    w.write_record([
        "rank", "company", "fiscal_year", "fh_score", "sb_code", "sb_label", "risk_band", "decision",
    ])
    .map_err(csv_err)?;
    for r in rows {
        w.write_record([
            r.rank.to_string(),
            r.company.clone(),
            r.fiscal_year.to_string(),
            format!("{:.4}", r.fh_score),
            r.sb_code.clone(),
            r.sb_label.clone(),
            r.risk_band.display_name().to_string(),
            r.decision.display_name().to_string(),
        ])
        .map_err(csv_err)?;
    }
    w.flush()
        .map_err(|e| FhError::Export(format!("failed to flush rankings CSV: {e}")))
}

const RECORD_HEADERS: [&str; 23] = [
    "Company Name",
    "FY",
    "Turnover (₹ Crore)",
    "EBITDA (₹ Crore)",
    "Net Profit (₹ Crore)",
    "Net Worth (₹ Crore)",
    "Total Debt (₹ Crore)",
    "DSCR",
    "Current Ratio",
    "ROCE (%)",
    "ROE (%)",
    "Loan Type",
    "Loan Amount",
    "Collateral Value",
    "LTV Ratio",
    "Tenure (Months)",
    "Credit Utilization (%)",
    "Bounced Cheques (Count)",
    "Overdrafts (Count)",
    "Group Risk Level",
    "Maximum DPD Observed",
    "SMA Classification",
    "Cross-Bank NPA Tag",
];

pub fn save_records_csv(path: &Path, records: &[FinancialRecord]) -> Result<(), FhError> {
    let file = File::create(path)
        .map_err(|e| FhError::Export(format!("failed to create '{}': {e}", path.display())))?;
    write_records_csv(file, records)
}

/// Write records with intake-style labels; money columns carry `₹` and
/// thousands separators the way spreadsheet exports do.
pub fn write_records_csv<W: Write>(writer: W, records: &[FinancialRecord]) -> Result<(), FhError> {
    let mut doc_names: Vec<&str> = Vec::new();
    for r in records {
        for d in &r.documents {
            if !doc_names.contains(&d.name.as_str()) {
                doc_names.push(&d.name);
            }
        }
    }

    let mut w = csv::Writer::from_writer(writer);
    let mut header: Vec<String> = RECORD_HEADERS.iter().map(|s| s.to_string()).collect();
    header.extend(doc_names.iter().map(|n| format!("{n} Uploaded")));
    w.write_record(&header).map_err(csv_err)?;

    for r in records {
        let mut row = vec![
            r.company.clone(),
            r.fiscal_year.to_string(),
            rupees(r.turnover),
            rupees(r.ebitda),
            rupees(r.net_profit),
            rupees(r.net_worth),
            rupees(r.total_debt),
            plain(r.dscr),
            plain(r.current_ratio),
            plain(r.roce),
            plain(r.roe),
            loan_type_label(r.loan_type).to_string(),
            grouped(r.loan_amount),
            grouped(r.collateral_value),
            plain(r.ltv),
            plain(r.tenure_months),
            plain(r.credit_utilization),
            plain(r.bounced_cheques),
            plain(r.overdrafts),
            group_risk_label(r.group_risk_level),
            plain(r.max_dpd),
            r.sma.map(sma_label).unwrap_or_default().to_string(),
            match r.cross_bank_npa {
                Some(true) => "Yes",
                Some(false) => "No",
                None => "",
            }
            .to_string(),
        ];
        for name in &doc_names {
            let present = r.documents.iter().any(|d| d.name == *name && d.present);
            row.push(if present { "Yes" } else { "No" }.to_string());
        }
        w.write_record(&row).map_err(csv_err)?;
    }
    w.flush()
        .map_err(|e| FhError::Export(format!("failed to flush dataset CSV: {e}")))
}

fn csv_err(e: csv::Error) -> FhError {
    FhError::Export(format!("CSV write failed: {e}"))
}

fn plain(v: Option<f64>) -> String {
    v.map(|x| format!("{x}")).unwrap_or_default()
}

fn rupees(v: Option<f64>) -> String {
    v.map(|x| format!("₹ {}", group_thousands(x))).unwrap_or_default()
}

fn grouped(v: Option<f64>) -> String {
    v.map(group_thousands).unwrap_or_default()
}

/// `1234567.891` → `1,234,567.89`.
fn group_thousands(v: f64) -> String {
    let s = format!("{:.2}", v.abs());
    let (int, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

fn loan_type_label(t: LoanType) -> &'static str {
    match t {
        LoanType::Other => "",
        other => other.display_name(),
    }
}

fn group_risk_label(v: Option<f64>) -> String {
    match v {
        Some(x) if x == 1.0 => "Low".to_string(),
        Some(x) if x == 2.0 => "Medium".to_string(),
        Some(x) if x == 3.0 => "High".to_string(),
        other => plain(other),
    }
}

fn sma_label(s: SmaStatus) -> &'static str {
    match s {
        SmaStatus::Standard => "Standard",
        SmaStatus::Sma0 => "SMA-0",
        SmaStatus::Sma1 => "SMA-1",
        SmaStatus::Sma2 => "SMA-2",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentIndicator;
    use crate::io::ingest::read_records;

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(1234567.891), "1,234,567.89");
        assert_eq!(group_thousands(999.0), "999.00");
        assert_eq!(group_thousands(-1500.5), "-1,500.50");
    }

    #[test]
    fn dataset_csv_reads_back() {
        let record = FinancialRecord {
            turnover: Some(12_500.75),
            total_debt: Some(3_000.0),
            dscr: Some(1.35),
            loan_type: LoanType::WorkingCapital,
            group_risk_level: Some(2.0),
            max_dpd: Some(45.0),
            sma: Some(SmaStatus::Sma1),
            cross_bank_npa: Some(false),
            documents: vec![
                DocumentIndicator { name: "PAN".into(), present: true },
                DocumentIndicator { name: "GST Returns".into(), present: false },
            ],
            ..FinancialRecord::new("Deccan Polymers Ltd", 2023)
        };

        let mut buf = Vec::new();
        write_records_csv(&mut buf, std::slice::from_ref(&record)).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("\"₹ 12,500.75\""));

        let back = read_records(buf.as_slice()).unwrap();
        let r = &back.records[0];
        assert_eq!(r.company, record.company);
        assert_eq!(r.turnover, Some(12_500.75));
        assert_eq!(r.dscr, Some(1.35));
        assert_eq!(r.loan_type, LoanType::WorkingCapital);
        assert_eq!(r.group_risk_level, Some(2.0));
        assert_eq!(r.sma, Some(SmaStatus::Sma1));
        assert_eq!(r.cross_bank_npa, Some(false));
        assert_eq!(r.documents.len(), 2);
        assert!(r.documents[0].present);
        assert!(!r.documents[1].present);
    }
}
