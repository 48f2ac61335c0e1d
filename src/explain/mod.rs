//! Coefficient-based attribution of forecast predictions.

pub mod attribution;

pub use attribution::*;
