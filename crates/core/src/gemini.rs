use crate::config::Config;
use crate::error::{AppError, Result};
use crate::pipeline::{EditPayload, ImageBackend, InlineImage, ReplyPart, RESPONSE_MODALITIES};
use futures::future::BoxFuture;
use gemini_rust::{
    Blob, Content, Gemini, GenerationConfig, GenerationResponse, Message, Part, Role,
};

pub struct GeminiClient {
    client: Gemini,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self> {
        // Set the base URL explicitly to avoid a BadScheme error
        let base = url::Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid base URL: {}", e)))?;

        let model_name = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        let model_url = format!("{}{}", base, model_name);

        let client = Gemini::with_model_and_base_url(api_key, model_url, base)
            .map_err(|e| AppError::Config(format!("Failed to create Gemini client: {}", e)))?;

        Ok(Self { client })
    }

    /// Sends the instruction and photos, asking for an image back.
    ///
    /// Returns the parts of the first candidate in order.
    pub async fn edit_images(&self, payload: &EditPayload) -> Result<Vec<ReplyPart>> {
        // Text part first, then the photos in selection order
        let mut parts = Vec::with_capacity(payload.images.len() + 1);
        parts.push(Part::Text {
            text: payload.text.clone(),
            thought: None,
            thought_signature: None,
        });
        parts.extend(payload.images.iter().map(|image| Part::InlineData {
            inline_data: Blob {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        }));

        let message = Message {
            role: Role::User,
            content: Content {
                role: Some(Role::User),
                parts: Some(parts),
            },
        };

        let generation_config = GenerationConfig {
            response_modalities: Some(
                RESPONSE_MODALITIES.iter().map(|m| m.to_string()).collect(),
            ),
            ..Default::default()
        };

        let response = self
            .client
            .generate_content()
            .with_messages(vec![message])
            .with_generation_config(generation_config)
            .execute()
            .await
            .map_err(|e| AppError::GeminiApi(format!("API request failed: {:?}", e)))?;

        Ok(reply_parts(&response))
    }
}

/// Maps the first candidate's parts, in order; empty if there is no candidate or no parts.
pub fn reply_parts(response: &GenerationResponse) -> Vec<ReplyPart> {
    let Some(candidate) = response.candidates.first() else {
        return Vec::new();
    };

    candidate
        .content
        .parts
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|part| match part {
            Part::Text { text, .. } => ReplyPart::Text(text.clone()),
            Part::InlineData { inline_data } => ReplyPart::InlineData(InlineImage {
                mime_type: inline_data.mime_type.clone(),
                data: inline_data.data.clone(),
            }),
            _ => ReplyPart::Other,
        })
        .collect()
}

/// [`ImageBackend`] that talks to the Gemini REST API.
///
/// A client is built per call so the API key is read at call time.
#[derive(Clone, Debug)]
pub struct GeminiBackend {
    base_url: String,
}

impl GeminiBackend {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
        }
    }
}

impl ImageBackend for GeminiBackend {
    fn generate<'a>(
        &'a self,
        api_key: &'a str,
        payload: &'a EditPayload,
    ) -> BoxFuture<'a, Result<Vec<ReplyPart>>> {
        Box::pin(async move {
            let client = GeminiClient::new(api_key, &payload.model, &self.base_url)?;
            client.edit_images(payload).await
        })
    }
}
