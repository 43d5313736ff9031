//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! data integrity failures, dataset loading, invalid configuration, colors, IO,
//! and generic errors.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// Active and reserved values of a marker do not add up to the configured total.
    #[error(
        "data integrity error for '{measure}'/'{comparison}': total value is {total}, expected {expected}"
    )]
    DataIntegrity {
        measure: String,
        comparison: String,
        total: f64,
        expected: f64,
    },

    #[error("failed to load dataset (line {line}): {message}")]
    Load { line: usize, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid color '{0}'")]
    InvalidColor(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns `true` when the error rejected an update because of inconsistent totals.
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Error::DataIntegrity { .. })
    }

    pub(crate) fn load(line: usize, message: impl Into<String>) -> Self {
        Error::Load {
            line,
            message: message.into(),
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn data_integrity_message_names_marker_and_totals() {
        let err = Error::DataIntegrity {
            measure: "income".into(),
            comparison: "age".into(),
            total: 98.0,
            expected: 100.0,
        };
        assert!(err.is_data_integrity());
        let msg = err.to_string();
        assert!(msg.contains("'income'/'age'"));
        assert!(msg.contains("98"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn load_error_reports_line() {
        let err = Error::load(3, "missing column");
        assert_eq!(
            err.to_string(),
            "failed to load dataset (line 3): missing column"
        );
        assert!(!err.is_data_integrity());
    }
}
