//! Input/output helpers.
//!
//! - CSV ingest + normalization (`ingest`)
//! - assessment / ranking / dataset exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
