//! Error types for the aura-edit-core library.
//!
//! This module provides granular error variants for different failure modes,
//! and classifies them into the coarse categories the editor surfaces to users.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur within the aura-edit-core library.
///
/// Each variant represents a specific failure mode with contextual information
/// to help diagnose and handle errors appropriately.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// No API key is configured, so no request can ever succeed.
    #[error("API key not configured: set GEMINI_API_KEY in environment or .env file")]
    MissingCredential,

    /// The file's MIME type is not one of the accepted image types.
    #[error("Unsupported file type: {0}")]
    UnsupportedMediaType(String),

    /// No photos are selected.
    #[error("No photos selected")]
    EmptySelection,

    /// The edit instruction is empty.
    #[error("Edit instruction is empty")]
    EmptyPrompt,

    /// The model answered but returned no image content.
    #[error("No image was generated. The model may have refused the request.")]
    NoImageProduced,

    /// General Gemini API error.
    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    /// Image decoding or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// A data URI could not be parsed.
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Category of a failed generation attempt, as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Empty selection or empty instruction at trigger time.
    Validation,
    /// The credential is missing.
    Configuration,
    /// The service completed but declined to produce an image.
    SoftRefusal,
    /// Any other fault: network, encoding, malformed response.
    Transport,
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a Gemini API error with the given message.
    pub fn gemini(msg: impl Into<String>) -> Self {
        Self::GeminiApi(msg.into())
    }

    /// Maps this error onto the user-facing failure taxonomy.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::EmptySelection | Self::EmptyPrompt => FailureKind::Validation,
            Self::MissingCredential | Self::Config(_) => FailureKind::Configuration,
            Self::NoImageProduced => FailureKind::SoftRefusal,
            _ => FailureKind::Transport,
        }
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert_eq!(AppError::EmptyPrompt.failure_kind(), FailureKind::Validation);
        assert_eq!(AppError::MissingCredential.failure_kind(), FailureKind::Configuration);
        assert_eq!(AppError::NoImageProduced.failure_kind(), FailureKind::SoftRefusal);
        assert_eq!(AppError::gemini("503").failure_kind(), FailureKind::Transport);
        assert_eq!(AppError::image("bad").failure_kind(), FailureKind::Transport);
    }
}
