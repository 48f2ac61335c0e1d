//! Feature engineering: behavior bands, document completeness, ratios,
//! growth and trend per company.

pub mod behavior;
pub mod engineer;

pub use behavior::*;
pub use engineer::*;
