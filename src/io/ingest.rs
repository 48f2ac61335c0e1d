//! CSV ingest and normalization.
//!
//! This module turns a borrower-dataset CSV (as exported from spreadsheets or
//! the intake forms) into clean `FinancialRecord`s.
//!
//! - Column labels are matched loosely: case, surrounding whitespace, a BOM and
//!   a trailing unit suffix such as `(₹ Crore)` or `(%)` are ignored.
//! - Numeric cells tolerate currency markers, thousands separators and `%`;
//!   anything unparsable becomes `None` rather than an error.
//! - Rows without an identity (company, fiscal year) are dropped and reported,
//!   as are repeated (company, fiscal year) rows after the first.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, StringRecord};
use serde::Serialize;

use crate::domain::{DocumentIndicator, FinancialRecord, LoanType, SmaStatus};
use crate::error::FhError;

/// A row that was read but not kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based line number in the file (header is line 1).
    pub line: usize,
    pub company: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    pub row_errors: Vec<RowError>,
}

/// Ingest output: normalized records + what happened to the rest.
#[derive(Debug, Clone)]
pub struct IngestedRecords {
    pub records: Vec<FinancialRecord>,
    pub report: IngestReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Company,
    FiscalYear,
    Turnover,
    Ebitda,
    NetProfit,
    NetWorth,
    TotalDebt,
    Dscr,
    CurrentRatio,
    Roce,
    Roe,
    LoanType,
    LoanAmount,
    CollateralValue,
    Ltv,
    Tenure,
    CreditUtilization,
    BouncedCheques,
    Overdrafts,
    GroupRisk,
    MaxDpd,
    Sma,
    CrossBankNpa,
}

/// Normalized labels accepted for each column.
const ALIASES: &[(Column, &[&str])] = &[
    (Column::Company, &["company_name", "company", "borrower", "borrower_name"]),
    (Column::FiscalYear, &["fy", "fiscal_year", "financial_year", "year"]),
    (Column::Turnover, &["turnover", "revenue", "sales"]),
    (Column::Ebitda, &["ebitda"]),
    (Column::NetProfit, &["net_profit", "pat"]),
    (Column::NetWorth, &["net_worth", "tangible_net_worth"]),
    (Column::TotalDebt, &["total_debt", "debt"]),
    (Column::Dscr, &["dscr"]),
    (Column::CurrentRatio, &["current_ratio"]),
    (Column::Roce, &["roce"]),
    (Column::Roe, &["roe"]),
    (Column::LoanType, &["loan_type", "facility_type"]),
    (Column::LoanAmount, &["loan_amount"]),
    (Column::CollateralValue, &["collateral_value"]),
    (Column::Ltv, &["ltv_ratio", "ltv"]),
    (Column::Tenure, &["tenure", "tenure_months"]),
    (Column::CreditUtilization, &["credit_utilization", "credit_utilisation"]),
    (Column::BouncedCheques, &["bounced_cheques", "cheque_bounces"]),
    (Column::Overdrafts, &["overdrafts"]),
    (Column::GroupRisk, &["group_risk_level", "group_risk"]),
    (Column::MaxDpd, &["maximum_dpd_observed", "max_dpd", "dpd"]),
    (Column::Sma, &["sma_classification", "sma", "sma_status"]),
    (Column::CrossBankNpa, &["cross_bank_npa_tag", "cross_bank_npa", "npa_tag"]),
];

/// Resolved column positions for one header row.
#[derive(Debug, Clone)]
struct ColumnMap {
    columns: HashMap<Column, usize>,
    documents: Vec<(String, usize)>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, FhError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header_name).collect();

        let mut columns = HashMap::new();
        for (column, aliases) in ALIASES {
            // First alias wins over later ones, then first matching position.
            let found = aliases
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h.as_str() == *alias));
            if let Some(idx) = found {
                columns.insert(*column, idx);
            }
        }

        for (column, label) in [(Column::Company, "Company Name"), (Column::FiscalYear, "FY")] {
            if !columns.contains_key(&column) {
                return Err(FhError::Schema(format!("missing required column: `{label}`")));
            }
        }

        let documents = normalized
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| {
                h.strip_suffix("_uploaded")
                    .map(|name| (name.trim_end_matches('_').to_string(), idx))
            })
            .collect();

        Ok(Self { columns, documents })
    }

    fn get<'a>(&self, record: &'a StringRecord, column: Column) -> Option<&'a str> {
        let idx = self.columns.get(&column)?;
        record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
    }

    fn amount(&self, record: &StringRecord, column: Column) -> Option<f64> {
        self.get(record, column).and_then(parse_amount)
    }
}

/// Load and normalize a dataset CSV from disk.
pub fn load_records(path: &Path) -> Result<IngestedRecords, FhError> {
    let file = File::open(path).map_err(|e| FhError::io(path.display(), e))?;
    read_records(file)
}

/// Normalize CSV from any reader (files, in-memory buffers in tests).
pub fn read_records<R: Read>(reader: R) -> Result<IngestedRecords, FhError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .byte_headers()
        .map_err(|e| FhError::Csv(format!("failed to read headers: {e}")))?;
    let map = ColumnMap::from_headers(&decode_lossy(headers))?;

    let mut records = Vec::new();
    let mut report = IngestReport::default();
    let mut seen: HashSet<(String, i32)> = HashSet::new();
    // Lowercased name → first spelling seen, so "ACME" rows join "Acme".
    let mut spellings: HashMap<String, String> = HashMap::new();

    // Byte records so a stray non-UTF-8 cell (e.g. a Windows-1252 `£`) only
    // spoils that cell, not the whole row.
    for (idx, result) in reader.byte_records().enumerate() {
        let line = idx + 2;
        report.rows_read += 1;

        let row = match result {
            Ok(r) => decode_lossy(&r),
            // The reader keeps failing after an I/O error; stop rather than spin.
            Err(e) if e.is_io_error() => {
                return Err(FhError::Csv(format!("read failed at line {line}: {e}")));
            }
            Err(e) => {
                report.row_errors.push(RowError {
                    line,
                    company: None,
                    message: e.to_string(),
                });
                continue;
            }
        };

        match parse_row(&row, &map) {
            Ok(mut record) => {
                let folded = record.company.to_lowercase();
                record.company = spellings
                    .entry(folded.clone())
                    .or_insert_with(|| record.company.clone())
                    .clone();
                let key = (folded, record.fiscal_year);
                if seen.insert(key) {
                    records.push(record);
                } else {
                    report.row_errors.push(RowError {
                        line,
                        message: format!(
                            "duplicate record for FY{}; keeping the first occurrence",
                            record.fiscal_year
                        ),
                        company: Some(record.company),
                    });
                }
            }
            Err(e) => report.row_errors.push(RowError {
                line,
                company: map.get(&row, Column::Company).map(str::to_string),
                message: e,
            }),
        }
    }

    report.rows_kept = records.len();
    report.rows_dropped = report.rows_read - report.rows_kept;
    Ok(IngestedRecords { records, report })
}

fn decode_lossy(record: &ByteRecord) -> StringRecord {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect::<Vec<_>>()
        .into()
}

fn parse_row(row: &StringRecord, map: &ColumnMap) -> Result<FinancialRecord, String> {
    let company = map
        .get(row, Column::Company)
        .ok_or_else(|| "missing company name".to_string())?
        .to_string();
    let fy_cell = map
        .get(row, Column::FiscalYear)
        .ok_or_else(|| "missing fiscal year".to_string())?;
    let fiscal_year =
        parse_fiscal_year(fy_cell).ok_or_else(|| format!("invalid fiscal year '{fy_cell}'"))?;

    let documents = map
        .documents
        .iter()
        .map(|(name, idx)| DocumentIndicator {
            name: name.clone(),
            present: row.get(*idx).is_some_and(parse_present),
        })
        .collect();

    Ok(FinancialRecord {
        company,
        fiscal_year,
        turnover: map.amount(row, Column::Turnover),
        ebitda: map.amount(row, Column::Ebitda),
        net_profit: map.amount(row, Column::NetProfit),
        net_worth: map.amount(row, Column::NetWorth),
        total_debt: map.amount(row, Column::TotalDebt),
        dscr: map.amount(row, Column::Dscr),
        current_ratio: map.amount(row, Column::CurrentRatio),
        roce: map.amount(row, Column::Roce),
        roe: map.amount(row, Column::Roe),
        loan_type: map
            .get(row, Column::LoanType)
            .map(LoanType::parse)
            .unwrap_or_default(),
        loan_amount: map.amount(row, Column::LoanAmount),
        collateral_value: map.amount(row, Column::CollateralValue),
        ltv: map.amount(row, Column::Ltv),
        tenure_months: map.amount(row, Column::Tenure),
        credit_utilization: map.amount(row, Column::CreditUtilization),
        bounced_cheques: map.amount(row, Column::BouncedCheques),
        overdrafts: map.amount(row, Column::Overdrafts),
        group_risk_level: map.get(row, Column::GroupRisk).and_then(parse_group_risk),
        max_dpd: map.amount(row, Column::MaxDpd),
        sma: map.get(row, Column::Sma).and_then(SmaStatus::parse),
        cross_bank_npa: map.get(row, Column::CrossBankNpa).and_then(parse_flag),
        documents,
    })
}

/// Lowercase, drop a trailing `( … )` unit suffix and fold punctuation to `_`.
pub fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    let name = match name.find('(') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    };

    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Parse a numeric cell such as `₹ 1,250.5`, `Rs. 300`, `12.5%` or `INR 40`.
pub fn parse_amount(cell: &str) -> Option<f64> {
    let mut s: String = cell
        .chars()
        .filter(|c| !matches!(c, ',' | '₹' | '$' | '€' | '£') && !c.is_whitespace())
        .collect();

    for marker in ["INR", "Rs.", "Rs", "rs.", "rs"] {
        if let Some(rest) = s.strip_prefix(marker) {
            s = rest.to_string();
            break;
        }
        if let Some(rest) = s.strip_suffix(marker) {
            s = rest.to_string();
            break;
        }
    }
    let s = s.strip_suffix('%').unwrap_or(&s);

    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Accepts `2023`, `2023.0`, `FY2023` and `FY 2023`.
pub fn parse_fiscal_year(cell: &str) -> Option<i32> {
    let s = cell.trim();
    let s = s
        .strip_prefix("FY")
        .or_else(|| s.strip_prefix("fy"))
        .or_else(|| s.strip_prefix("Fy"))
        .unwrap_or(s)
        .trim_start_matches([' ', '-', '_']);
    let v = s.parse::<f64>().ok()?;
    if !v.is_finite() || v.fract() != 0.0 || !(1900.0..=2200.0).contains(&v) {
        return None;
    }
    Some(v as i32)
}

fn parse_group_risk(cell: &str) -> Option<f64> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "low" => Some(1.0),
        "medium" | "moderate" => Some(2.0),
        "high" => Some(3.0),
        _ => parse_amount(cell),
    }
}

fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_present(cell: &str) -> bool {
    matches!(
        cell.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "true" | "1" | "uploaded"
    )
}
