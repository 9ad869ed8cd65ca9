use thiserror::Error;

/// Every way a calculation can refuse its input.
///
/// Errors are raised before any arithmetic runs, so a caller never sees a
/// half-computed result. Ratio computations do not have an error variant:
/// a zero divisor yields 0 (see [`crate::validation::percent_of`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaxError {
    #[error("Invalid input for `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Unknown {kind} code: {code}")]
    UnknownCategory { kind: &'static str, code: String },

    #[error("Invalid rate table configuration: {0}")]
    InvalidConfiguration(String),
}

impl TaxError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        TaxError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn unknown(kind: &'static str, code: impl Into<String>) -> Self {
        TaxError::UnknownCategory {
            kind,
            code: code.into(),
        }
    }
}

pub type TaxResult<T> = Result<T, TaxError>;
