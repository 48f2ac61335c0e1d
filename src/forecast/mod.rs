//! Next-period FH score forecasting.

pub mod model;

pub use model::*;
