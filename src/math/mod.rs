//! Mathematical utilities: ridge least squares and descriptive statistics.

pub mod ridge;
pub mod stats;

pub use ridge::*;
pub use stats::*;
