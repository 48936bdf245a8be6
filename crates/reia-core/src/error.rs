use thiserror::Error;

/// Errors raised at the validation and serialization boundary.
///
/// The analysis pipeline itself is infallible; these only surface from the
/// validated entry points used by the CLI and bindings.
#[derive(Debug, Error)]
pub enum ReiaError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ReiaError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ReiaError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ReiaError {
    fn from(e: serde_json::Error) -> Self {
        ReiaError::SerializationError(e.to_string())
    }
}
