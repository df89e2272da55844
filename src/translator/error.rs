//! Error definitions for the translator

use thiserror::Error;

/// Reasons a single upload cannot be translated.
///
/// Any of these rejects the whole request: no intent of that request is
/// handed to the publisher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// Body is not JSON, lacks `sensordatavalues`, or a header needed for
    /// naming is missing
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A discovery config could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<serde_json::Error> for TranslateError {
    fn from(e: serde_json::Error) -> Self {
        TranslateError::Encoding(e.to_string())
    }
}
