//! AURA Edit Core Library
//!
//! This library provides the core of the AURA photo editor: selecting up to
//! ten photos, suggesting an edit instruction, and asking Google's Gemini
//! image model for a single edited composite.
//!
//! # Overview
//!
//! The library handles:
//!
//! - **Selection**: Photo selection and preview handle lifetimes via [`upload`]
//! - **Prompts**: Suggested instructions and the fixed system preamble via [`prompt`]
//! - **Generation**: The single-call edit pipeline via [`pipeline`] and [`gemini`]
//! - **Session state**: Single-flight coordination and the result slot via [`ui`]
//! - **Image Processing**: Base64 encoding and PNG download via [`image_processing`]
//!
//! # Quick Start
//!
//! ```ignore
//! use aura_edit_core::{AuraEdit, SourceFile};
//!
//! let app = AuraEdit::new()?;
//! let mut session = app.session();
//! session.select_files(vec![SourceFile::from_path("us.jpg")?]);
//! session.generate()?;
//! if let Some(uri) = session.wait().await.and_then(|r| r.image_data_uri()) {
//!     println!("{}", uri);
//! }
//! ```
//!
//! # Module Structure
//!
//! - [`config`]: Configuration loading and management
//! - [`error`]: Error types and result aliases
//! - [`gemini`]: Gemini API backend
//! - [`image_processing`]: Encoding and download utilities
//! - [`pipeline`]: Edit request pipeline
//! - [`prompt`]: Prompt suggestions and system preamble
//! - [`ui`]: Session coordinator
//! - [`upload`]: Selection and preview handles

pub mod config;
pub mod error;
pub mod gemini;
pub mod image_processing;
pub mod pipeline;
pub mod prompt;
pub mod ui;
pub mod upload;

// Re-export primary types for convenience
pub use config::Config;
pub use error::{AppError, FailureKind, Result};
pub use gemini::{GeminiBackend, GeminiClient};
pub use pipeline::{EditPipeline, EditRequest, EditResult};
pub use ui::{GenerationStatus, Session};
pub use upload::{SourceFile, UploadSet, MAX_FILES};

/// Main entry point for the AURA editor.
///
/// Holds the configuration and hands out sessions wired to the Gemini backend.
pub struct AuraEdit {
    config: Config,
}

impl AuraEdit {
    /// Creates an instance from environment configuration (including `.env` files).
    ///
    /// A missing API key is not an error here; it is reported when a
    /// generation is attempted.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
        })
    }

    /// Creates an instance with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Starts a new editing session.
    pub fn session(&self) -> Session<GeminiBackend> {
        let backend = GeminiBackend::new(&self.config);
        Session::new(EditPipeline::new(self.config.clone(), backend))
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup. This loads `.env` files if present.
pub fn init() {
    let _ = dotenvy::dotenv();
}
