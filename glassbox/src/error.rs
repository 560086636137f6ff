//! Error types for glassbox

use thiserror::Error;

/// Result type for instrumentation setup
pub type InstrumentResult<T> = Result<T, InstrumentError>;

/// Configuration errors raised while setting up instrumentation
///
/// Failures of the observed program are never reported here: they travel as
/// [`Thrown`](crate::model::Thrown) values exactly as they would without
/// instrumentation.
#[derive(Error, Debug)]
pub enum InstrumentError {
    /// No observer was supplied
    #[error("No observer configured. Call observer() before build().")]
    MissingObserver,

    /// A filter pattern failed to compile
    #[error("Invalid filter pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
