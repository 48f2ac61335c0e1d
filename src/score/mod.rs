//! Deterministic scoring: interpolation curves, the FH formula and risk
//! classification.

pub mod bands;
pub mod calculator;
pub mod interp;

pub use bands::*;
pub use calculator::*;
pub use interp::*;
