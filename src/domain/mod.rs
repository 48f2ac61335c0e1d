//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and engineered records (`FinancialRecord`, `EngineeredRecord`)
//! - per-company histories (`CompanyHistory`)
//! - classification outputs (`RiskBucket`, `Decision`)
//! - the canonical scoring policy (`ScoringPolicy`)

pub mod policy;
pub mod types;

pub use policy::*;
pub use types::*;
