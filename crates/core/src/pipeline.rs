//! The edit generation pipeline.
//!
//! [`EditPipeline::generate`] turns an [`EditRequest`] into exactly one call
//! to an [`ImageBackend`] and folds every outcome, including errors, into an
//! [`EditResult`]. Callers are responsible for never running two generations
//! at once; see [`crate::ui::Session`].

use crate::config::Config;
use crate::error::{AppError, FailureKind, Result};
use crate::image_processing::ImageProcessor;
use crate::prompt::{compose_instruction, PREAMBLE_VERSION};
use crate::upload::SourceFile;
use futures::future::BoxFuture;
use log::{debug, error, info, warn};
use serde::Serialize;

/// Output modalities requested from the model.
pub const RESPONSE_MODALITIES: &[&str] = &["IMAGE"];

/// Shown when a generation is triggered without photos or without an instruction.
pub const VALIDATION_MESSAGE: &str = "Please upload at least one photo and provide a prompt.";

/// Shown for every transport-level failure; details go to the log.
pub const TRANSPORT_MESSAGE: &str =
    "Failed to generate image. Please check your prompt and uploaded files.";

/// Base64 bytes plus MIME type, as carried by an inline-data part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// Everything sent to the image service for one attempt.
#[derive(Debug, Clone)]
pub struct EditPayload {
    pub model: String,
    /// System preamble followed by the user's instruction.
    pub text: String,
    /// Encoded photos in selection order.
    pub images: Vec<InlineImage>,
}

/// One content part of the service's first candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPart {
    Text(String),
    InlineData(InlineImage),
    Other,
}

/// The external image-generation service.
pub trait ImageBackend: Send + Sync {
    /// Issues one generation call and returns the first candidate's parts
    /// (empty if the service returned no candidates).
    fn generate<'a>(
        &'a self,
        api_key: &'a str,
        payload: &'a EditPayload,
    ) -> BoxFuture<'a, Result<Vec<ReplyPart>>>;
}

/// Photos and instruction for a single generation attempt.
#[derive(Debug, Clone)]
pub struct EditRequest {
    images: Vec<SourceFile>,
    instruction: String,
}

impl EditRequest {
    /// # Errors
    ///
    /// [`AppError::EmptySelection`] if `images` is empty,
    /// [`AppError::EmptyPrompt`] if `instruction` is empty.
    pub fn new(images: Vec<SourceFile>, instruction: impl Into<String>) -> Result<Self> {
        let instruction = instruction.into();
        if images.is_empty() {
            return Err(AppError::EmptySelection);
        }
        if instruction.is_empty() {
            return Err(AppError::EmptyPrompt);
        }
        Ok(Self {
            images,
            instruction,
        })
    }

    pub fn images(&self) -> &[SourceFile] {
        &self.images
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

/// Outcome of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditResult {
    Success { image_data_uri: String },
    Failure { failure: FailureKind, message: String },
}

impl EditResult {
    /// Converts an error into the message the user sees.
    pub fn from_error(err: &AppError) -> Self {
        let failure = err.failure_kind();
        let message = match failure {
            FailureKind::Validation => VALIDATION_MESSAGE.to_string(),
            FailureKind::Configuration | FailureKind::SoftRefusal => err.to_string(),
            FailureKind::Transport => TRANSPORT_MESSAGE.to_string(),
        };
        Self::Failure { failure, message }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn image_data_uri(&self) -> Option<&str> {
        match self {
            Self::Success { image_data_uri } => Some(image_data_uri),
            Self::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message, .. } => Some(message),
        }
    }
}

/// Runs edit requests against an [`ImageBackend`].
pub struct EditPipeline<B> {
    config: Config,
    backend: B,
}

impl<B: ImageBackend> EditPipeline<B> {
    pub fn new(config: Config, backend: B) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Encodes the request's photos and prepends the system preamble.
    pub fn build_payload(&self, request: &EditRequest) -> EditPayload {
        EditPayload {
            model: self.config.model_name.clone(),
            text: compose_instruction(request.instruction()),
            images: request
                .images()
                .iter()
                .map(ImageProcessor::encode_inline)
                .collect(),
        }
    }

    /// Runs one attempt to completion. Never fails: errors become [`EditResult::Failure`].
    pub async fn generate(&self, request: &EditRequest) -> EditResult {
        match self.try_generate(request).await {
            Ok(image_data_uri) => {
                info!("generated image from {} photo(s)", request.images().len());
                EditResult::Success { image_data_uri }
            }
            Err(err) => {
                match err.failure_kind() {
                    FailureKind::Transport => error!("edit generation failed: {err}"),
                    _ => warn!("edit generation failed: {err}"),
                }
                EditResult::from_error(&err)
            }
        }
    }

    async fn try_generate(&self, request: &EditRequest) -> Result<String> {
        let api_key = self.config.api_key()?;
        let payload = self.build_payload(request);
        debug!(
            "requesting edit: model={} images={} preamble=v{}",
            payload.model,
            payload.images.len(),
            PREAMBLE_VERSION
        );

        let parts = self.backend.generate(api_key, &payload).await?;
        interpret_reply(&parts)
    }
}

/// Returns a data URI for the first inline image among `parts`.
///
/// # Errors
///
/// [`AppError::NoImageProduced`] if no part carries image bytes.
pub fn interpret_reply(parts: &[ReplyPart]) -> Result<String> {
    parts
        .iter()
        .find_map(|part| match part {
            ReplyPart::InlineData(image) => {
                Some(ImageProcessor::data_uri(&image.mime_type, &image.data))
            }
            _ => None,
        })
        .ok_or(AppError::NoImageProduced)
}
