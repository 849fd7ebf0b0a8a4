//! Error types for the key and tempo analysis engine

use std::fmt;

/// Errors that can occur during audio analysis
///
/// A recording with no usable signal is not an error: it is reported as
/// [`crate::AnalysisOutcome::NoUsableSignal`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid input parameters or configuration
    InvalidInput(String),

    /// Audio decoding error (malformed or unsupported input)
    DecodingError(String),

    /// Processing error during analysis
    ProcessingError(String),

    /// Numerical error (overflow, underflow, etc.)
    NumericalError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<symphonia::core::errors::Error> for AnalysisError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AnalysisError::DecodingError(err.to_string())
    }
}
