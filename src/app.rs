//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that parses the
//! CLI, builds the scoring context, prints reports and writes exports.

use clap::Parser;
use tracing::info;

use crate::cli::{AssessArgs, Cli, Command, DataArgs, PolicyArgs, RankArgs, SampleArgs};
use crate::data::{SampleConfig, generate_records};
use crate::domain::ScoringPolicy;
use crate::error::FhError;
use crate::io::export::{save_records_csv, write_assessments_json, write_rankings_csv};
use crate::io::ingest::load_records;
use crate::report::{format_assessment, format_bands, format_ingest_summary, format_rankings};

pub mod pipeline;

pub use pipeline::{Dataset, ScoringContext};

/// Entry point for the `fh` binary.
pub fn run() -> Result<(), FhError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Assess(args) => handle_assess(args),
        Command::Rank(args) => handle_rank(args),
        Command::Bands(args) => handle_bands(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn load_policy(args: &PolicyArgs) -> Result<ScoringPolicy, FhError> {
    let policy = ScoringPolicy::load(args.policy.as_deref())?;
    info!(version = %policy.version, "scoring policy loaded");
    Ok(policy)
}

fn load_context(args: &DataArgs) -> Result<ScoringContext, FhError> {
    let policy = load_policy(&args.policy)?;
    let dataset = Dataset::load(&args.data, policy)?;
    Ok(ScoringContext::new(dataset))
}

fn handle_assess(args: AssessArgs) -> Result<(), FhError> {
    let ctx = load_context(&args.data)?;
    if args.verbose {
        println!("{}", format_ingest_summary(ctx.dataset().report()));
    }
    let horizon = args
        .horizon
        .unwrap_or(ctx.dataset().policy().forecast.default_horizon);

    let assessments = match (&args.company, &args.input) {
        (_, Some(input)) => {
            let applicant = load_records(input)?;
            if args.verbose {
                println!("{}", format_ingest_summary(&applicant.report));
            }
            ctx.assess_history(applicant.records, horizon)?
        }
        (Some(company), None) => vec![ctx.assess(company, horizon)?],
        (None, None) => {
            return Err(FhError::Schema("either --company or --input is required".to_string()));
        }
    };

    for a in &assessments {
        println!("{}", format_assessment(a));
    }

    if let Some(path) = &args.export {
        write_assessments_json(
            path,
            &assessments,
            &ctx.dataset().policy().version,
            ctx.dataset().fingerprint(),
        )?;
        info!(path = %path.display(), count = assessments.len(), "assessments exported");
    }
    Ok(())
}

fn handle_rank(args: RankArgs) -> Result<(), FhError> {
    let ctx = load_context(&args.data)?;
    let rows = ctx.rankings()?;
    let shown = args.top.map_or(rows.len(), |n| n.min(rows.len()));
    println!("{}", format_rankings(&rows[..shown]));

    if let Some(path) = &args.export {
        write_rankings_csv(path, &rows)?;
        info!(path = %path.display(), rows = rows.len(), "rankings exported");
    }
    Ok(())
}

fn handle_bands(args: PolicyArgs) -> Result<(), FhError> {
    let policy = load_policy(&args)?;
    println!("{}", format_bands(&policy));
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), FhError> {
    let config = SampleConfig {
        companies: args.companies,
        years: args.years,
        last_year: args.last_year,
        seed: args.seed,
    };
    let records = generate_records(&config)?;
    save_records_csv(&args.out, &records)?;
    println!(
        "Wrote {} records ({} companies × {} years) to {}",
        records.len(),
        config.companies,
        config.years,
        args.out.display()
    );
    Ok(())
}
