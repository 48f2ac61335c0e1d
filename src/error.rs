//! Crate-wide error type.
//!
//! Every failure maps to a process exit code so the binary can stay a thin
//! wrapper around the library:
//!
//! - `2`: bad input files, schema or policy configuration
//! - `3`: the data cannot answer the question (unknown company, too few rows)
//! - `4`: numerical failure inside the model

/// Errors produced by ingest, scoring, forecasting and export.
///
/// The type is `Clone` so a failed model build can be cached and handed to
/// every caller that asks for the model afterwards.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FhError {
    #[error("failed to read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("invalid scoring policy:\n  - {}", .0.join("\n  - "))]
    Policy(Vec<String>),

    #[error("company '{company}' not found in dataset")]
    NotFound { company: String },

    #[error("insufficient data to train forecast model: {rows} labeled rows, need at least {required}")]
    InsufficientData { rows: usize, required: usize },

    #[error("no usable records remain after normalization")]
    EmptyDataset,

    #[error("numerical failure: {0}")]
    Numerical(String),

    #[error("export failed: {0}")]
    Export(String),
}

impl FhError {
    pub fn io(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        FhError::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            FhError::Io { .. } | FhError::Csv(_) | FhError::Schema(_) | FhError::Policy(_) => 2,
            FhError::NotFound { .. } | FhError::InsufficientData { .. } | FhError::EmptyDataset => 3,
            FhError::Numerical(_) | FhError::Export(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_group_by_cause() {
        assert_eq!(FhError::Schema("x".into()).exit_code(), 2);
        assert_eq!(
            FhError::NotFound {
                company: "Acme".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(FhError::Numerical("singular".into()).exit_code(), 4);
    }

    #[test]
    fn policy_error_lists_every_problem() {
        let err = FhError::Policy(vec!["a".into(), "b".into()]);
        let msg = err.to_string();
        assert!(msg.contains("- a"));
        assert!(msg.contains("- b"));
    }
}
