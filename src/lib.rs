//! `fh-score` library crate.
//!
//! Financial Health scoring for corporate borrowers: normalize raw records,
//! engineer features, compute the deterministic FH score and its SB band,
//! forecast the next period with a ridge model, and attribute the forecast to
//! business drivers.
//!
//! The binary (`fh`) is a thin wrapper around this library so the pipeline is
//! testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod explain;
pub mod features;
pub mod forecast;
pub mod io;
pub mod math;
pub mod report;
pub mod score;

pub use app::{Dataset, ScoringContext};
pub use error::FhError;
