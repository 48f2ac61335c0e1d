//! Seeded synthetic borrower datasets.
//!
//! Each company carries a latent credit quality `q` that drifts year to year
//! as a random walk. Every metric is a noisy function of `q`, so better
//! companies tend to have higher coverage, lower leverage and cleaner banking
//! conduct, and the forecast model has a real signal to learn.
//!
//! The same `(config, seed)` always produces the same records.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DocumentIndicator, FinancialRecord, LoanType, SmaStatus};
use crate::error::FhError;

const NAME_STEMS: [&str; 12] = [
    "Aarav", "Bharat", "Coromandel", "Deccan", "Everest", "Ganga", "Himalaya", "Indus",
    "Kaveri", "Malabar", "Narmada", "Sahyadri",
];
const NAME_TRADES: [&str; 6] = [
    "Textiles", "Engineering", "Agro Foods", "Pharma", "Logistics", "Polymers",
];
const DOCUMENTS: [&str; 5] = [
    "PAN",
    "GST Returns",
    "Audited Financials",
    "Bank Statements",
    "ITR",
];
const TENURES: [f64; 6] = [24.0, 36.0, 48.0, 60.0, 84.0, 96.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleConfig {
    pub companies: usize,
    pub years: usize,
    /// Fiscal year of each company's last record.
    pub last_year: i32,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            companies: 24,
            years: 5,
            last_year: 2024,
            seed: 42,
        }
    }
}

pub fn generate_records(config: &SampleConfig) -> Result<Vec<FinancialRecord>, FhError> {
    if config.companies == 0 {
        return Err(FhError::Schema("sample company count must be > 0".to_string()));
    }
    if config.years == 0 {
        return Err(FhError::Schema("sample year count must be > 0".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| FhError::Numerical(format!("noise distribution error: {e}")))?;

    let first_year = config.last_year - config.years as i32 + 1;
    let mut out = Vec::with_capacity(config.companies * config.years);

    for i in 0..config.companies {
        let name = company_name(i);
        let loan_type = match rng.gen_range(0..3) {
            0 => LoanType::WorkingCapital,
            1 => LoanType::TermLoan,
            _ => LoanType::Other,
        };
        let tenure = TENURES[rng.gen_range(0..TENURES.len())];
        let mut q: f64 = normal.sample(&mut rng);
        let mut turnover = (6.2 + 0.8 * normal.sample(&mut rng)).exp();

        for y in 0..config.years {
            if y > 0 {
                q = (q + 0.35 * normal.sample(&mut rng)).clamp(-3.0, 3.0);
                turnover *= (1.0 + 0.08 + 0.05 * q + 0.06 * normal.sample(&mut rng)).max(0.5);
            }
            let fy = first_year + y as i32;
            out.push(company_year(&mut rng, &normal, &name, fy, q, turnover, loan_type, tenure));
        }
    }

    Ok(out)
}

fn company_name(i: usize) -> String {
    let stem = NAME_STEMS[i % NAME_STEMS.len()];
    let trade = NAME_TRADES[(i / NAME_STEMS.len()) % NAME_TRADES.len()];
    let round = i / (NAME_STEMS.len() * NAME_TRADES.len());
    if round == 0 {
        format!("{stem} {trade} Ltd")
    } else {
        format!("{stem} {trade} {} Ltd", round + 1)
    }
}

#[allow(clippy::too_many_arguments)]
fn company_year(
    rng: &mut StdRng,
    normal: &Normal<f64>,
    company: &str,
    fiscal_year: i32,
    q: f64,
    turnover: f64,
    loan_type: LoanType,
    tenure: f64,
) -> FinancialRecord {
    let z: [f64; 13] = std::array::from_fn(|_| normal.sample(&mut *rng));

    let margin = (0.12 + 0.04 * q + 0.02 * z[0]).clamp(-0.1, 0.4);
    let ebitda = turnover * margin;
    let net_worth = turnover * (0.35 + 0.10 * q + 0.05 * z[1]);
    let gearing = (0.3 - 0.5 * q + 0.2 * z[2]).exp();
    let total_debt = net_worth.abs().max(1.0) * gearing;
    let loan_amount = total_debt * (0.3 + 0.05 * z[3]).abs();

    let dscr = (1.4 + 0.35 * q + 0.1 * z[4]).max(0.2);
    let current_ratio = (1.3 + 0.3 * q + 0.1 * z[5]).max(0.2);
    let roce = 12.0 + 4.0 * q + 1.5 * z[6];
    let roe = 14.0 + 5.0 * q + 2.0 * z[7];

    let credit_utilization = (75.0 - 12.0 * q + 8.0 * z[8]).clamp(10.0, 140.0);
    let bounced = (1.0 - q + 0.7 * z[9]).round().max(0.0);
    let overdrafts = (0.8 - q + 0.7 * z[10]).round().max(0.0);
    let ltv = (65.0 - 8.0 * q + 5.0 * z[11]).clamp(20.0, 100.0);
    let group_risk = if q > 0.5 {
        1.0
    } else if q > -0.5 {
        2.0
    } else {
        3.0
    };

    let p_late = 1.0 / (1.0 + (1.5 + 1.2 * q).exp());
    let max_dpd = if rng.gen_bool(p_late.clamp(0.0, 1.0)) {
        (15.0 - 25.0 * q + 20.0 * z[12]).clamp(1.0, 120.0).round()
    } else {
        0.0
    };
    let sma = if max_dpd >= 60.0 {
        SmaStatus::Sma2
    } else if max_dpd >= 30.0 {
        SmaStatus::Sma1
    } else if max_dpd > 0.0 {
        SmaStatus::Sma0
    } else {
        SmaStatus::Standard
    };
    let npa = rng.gen_bool(if q > -1.0 { 0.02 } else { 0.15 });

    let p_doc = (0.75 + 0.1 * q).clamp(0.3, 0.98);
    let documents = DOCUMENTS
        .iter()
        .map(|name| DocumentIndicator {
            name: name.to_string(),
            present: rng.gen_bool(p_doc),
        })
        .collect();

    // A few gaps so downstream imputation is exercised.
    let mut gap = |v: f64| if rng.r#gen::<f64>() < 0.04 { None } else { Some(v) };

    FinancialRecord {
        company: company.to_string(),
        fiscal_year,
        turnover: Some(round2(turnover)),
        ebitda: Some(round2(ebitda)),
        net_profit: Some(round2(ebitda * 0.45)),
        net_worth: Some(round2(net_worth)),
        total_debt: Some(round2(total_debt)),
        dscr: Some(round2(dscr)),
        current_ratio: gap(round2(current_ratio)),
        roce: gap(round2(roce)),
        roe: gap(round2(roe)),
        loan_type,
        loan_amount: Some(round2(loan_amount)),
        collateral_value: Some(round2(loan_amount / (ltv / 100.0))),
        ltv: gap(round2(ltv)),
        tenure_months: Some(tenure),
        credit_utilization: Some(round2(credit_utilization)),
        bounced_cheques: Some(bounced),
        overdrafts: Some(overdrafts),
        group_risk_level: Some(group_risk),
        max_dpd: Some(max_dpd),
        sma: Some(sma),
        cross_bank_npa: Some(npa),
        documents,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_records() {
        let config = SampleConfig::default();
        assert_eq!(generate_records(&config).unwrap(), generate_records(&config).unwrap());
    }

    #[test]
    fn shape_follows_config() {
        let config = SampleConfig {
            companies: 3,
            years: 4,
            last_year: 2024,
            seed: 7,
        };
        let records = generate_records(&config).unwrap();
        assert_eq!(records.len(), 12);
        assert_eq!(records[0].fiscal_year, 2021);
        assert_eq!(records[3].fiscal_year, 2024);
        assert_eq!(records[0].documents.len(), DOCUMENTS.len());
    }

    #[test]
    fn company_names_are_unique() {
        let names: std::collections::HashSet<String> = (0..200).map(company_name).collect();
        assert_eq!(names.len(), 200);
    }

    #[test]
    fn empty_config_is_rejected() {
        let config = SampleConfig {
            companies: 0,
            ..SampleConfig::default()
        };
        assert!(generate_records(&config).is_err());
    }
}
