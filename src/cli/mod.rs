//! Command-line parsing for the financial-health scorer.
//!
//! Parsing and dispatch are kept apart from the scoring code; `app` turns these
//! structs into pipeline calls.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fh", version, about = "Financial Health scoring, banding and forecasting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score one company (or an applicant file), forecast it and explain the drivers.
    Assess(AssessArgs),
    /// Rank every company in the dataset by its latest FH score.
    Rank(RankArgs),
    /// Print the SB band table of the active policy.
    Bands(PolicyArgs),
    /// Write a seeded synthetic dataset CSV.
    Sample(SampleArgs),
}

/// Options shared by every command that reads a scoring policy.
#[derive(Debug, Args, Clone)]
pub struct PolicyArgs {
    /// Scoring policy JSON; built-in defaults when omitted.
    #[arg(long, env = "FH_POLICY", value_name = "JSON")]
    pub policy: Option<PathBuf>,
}

/// Options for commands that need the historical dataset.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Historical dataset CSV (all companies, all fiscal years).
    #[arg(long, env = "FH_DATA", value_name = "CSV")]
    pub data: PathBuf,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Debug, Args, Clone)]
pub struct AssessArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Company name to assess (case-insensitive).
    #[arg(long, required_unless_present = "input", conflicts_with = "input")]
    pub company: Option<String>,

    /// Applicant CSV scored with the dataset's model instead of a dataset company.
    #[arg(long, value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Forecast steps ahead; defaults to the policy's default horizon.
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Write the assessment(s) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Print the ingest summary (rows kept/dropped and why).
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RankArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Show only the top N companies.
    #[arg(long)]
    pub top: Option<usize>,

    /// Write the full ranking to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Number of companies to generate.
    #[arg(long, default_value_t = 24)]
    pub companies: usize,

    /// Fiscal years per company.
    #[arg(long, default_value_t = 5)]
    pub years: usize,

    /// Fiscal year of the last record.
    #[arg(long, default_value_t = 2024)]
    pub last_year: i32,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
