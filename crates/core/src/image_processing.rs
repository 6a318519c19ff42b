//! Image encoding utilities.
//!
//! This module converts selected files into the base64 inline parts sent to
//! the Gemini API, and turns the data URI that comes back into a PNG file on
//! disk for the "download" action.

use crate::error::{AppError, Result};
use crate::pipeline::InlineImage;
use crate::upload::SourceFile;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use image::ImageFormat;
use std::path::{Path, PathBuf};

/// Image processing utilities for the edit workflow.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Encodes a selected file as an inline part, keeping its declared MIME type.
    pub fn encode_inline(file: &SourceFile) -> InlineImage {
        InlineImage {
            mime_type: file.mime_type().to_string(),
            data: BASE64.encode(file.bytes()),
        }
    }

    /// Builds a `data:<mime>;base64,<data>` URI from already-encoded bytes.
    pub fn data_uri(mime_type: &str, base64_data: &str) -> String {
        format!("data:{mime_type};base64,{base64_data}")
    }

    /// File name offered when downloading a result, e.g. `aura-x-edit-1700000000000.png`.
    pub fn download_file_name(now: DateTime<Utc>) -> String {
        format!("aura-x-edit-{}.png", now.timestamp_millis())
    }

    /// Saves a result into `dir` under a name stamped with the current time.
    pub fn save_download(data_uri: &str, dir: &Path) -> Result<PathBuf> {
        Self::save_as_png(data_uri, dir, Utc::now())
    }

    /// Decodes `data_uri`, re-encodes it as PNG and writes it into `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidDataUri`] if the URI is malformed,
    /// [`AppError::ImageProcessing`] if the bytes are not a decodable image,
    /// and [`AppError::Io`] if the directory cannot be written.
    pub fn save_as_png(data_uri: &str, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
        let uri = DataUri::parse(data_uri)?;
        let decoded = image::load_from_memory(&uri.data)
            .map_err(|e| AppError::image(format!("Failed to decode {}: {}", uri.mime_type, e)))?;

        std::fs::create_dir_all(dir)?;
        let path = dir.join(Self::download_file_name(now));
        decoded
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| AppError::image(format!("Failed to encode PNG: {}", e)))?;
        Ok(path)
    }
}

/// A parsed base64 data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl DataUri {
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| AppError::InvalidDataUri("missing data: prefix".into()))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| AppError::InvalidDataUri("not base64 encoded".into()))?;
        let data = BASE64
            .decode(payload)
            .map_err(|e| AppError::InvalidDataUri(e.to_string()))?;
        Ok(Self {
            mime_type: mime_type.to_string(),
            data,
        })
    }
}
