use std::env;
use crate::error::{AppError, Result};
use dotenvy::dotenv;

/// Model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Gemini REST endpoint used when `GEMINI_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

#[derive(Clone, Debug)]
pub struct Config {
    /// Absent until the user provides one; checked at call time.
    pub gemini_api_key: Option<String>,
    pub model_name: String,
    pub base_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let api_key = ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .find_map(|name| env::var(name).ok())
            .filter(|key| !key.trim().is_empty());

        let model_name = env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self::builder()
            .with_model(model_name)
            .with_base_url(base_url)
            .with_optional_api_key(api_key)
            .build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Returns the API key, or [`AppError::MissingCredential`] when none is configured.
    pub fn api_key(&self) -> Result<&str> {
        self.gemini_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(AppError::MissingCredential)
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

impl ConfigBuilder {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_optional_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn build(self) -> Result<Config> {
        let model_name = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if model_name.trim().is_empty() {
            return Err(AppError::config("model name must not be empty"));
        }

        let mut base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Config {
            gemini_api_key: self.api_key,
            model_name,
            base_url,
        })
    }
}
