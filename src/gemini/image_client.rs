use crate::{
    batch::ImageGenerator,
    config::GeminiConfig,
    error::{GenerationError, MoodwallError, Result},
    models::{
        gemini::{
            ApiErrorEnvelope, Content, GenerateContentRequest, GenerateContentResponse,
            GenerationConfig, ImageConfig, Part,
        },
        sniff_mime_type, GeneratedArtifact, GenerationRequest, WALLPAPER_ASPECT_RATIO,
    },
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{Client, StatusCode};
use std::sync::Arc;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Arc<str>,
}

impl ImageClient {
    pub fn new(client: Client, config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                MoodwallError::ConfigError(
                    "GEMINI_API_KEY (or API_KEY / GOOGLE_API_KEY) is not set".into(),
                )
            })?;

        let model = config.model().to_string();
        Ok(Self {
            client,
            endpoint: endpoint_for_model(&config.api_base(), &model),
            model,
            api_key: Arc::from(api_key),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<GeneratedArtifact, GenerationError> {
        if request.prompt.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "prompt must not be empty".into(),
            ));
        }

        let payload = build_payload(request);
        log::debug!(
            "Invoking {} ({}, reference: {})",
            self.model,
            request.mode(),
            request
                .reference
                .as_ref()
                .map(|r| format!("{} bytes {}", r.data.len(), r.mime_type))
                .unwrap_or_else(|| "none".to_string())
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.as_ref())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        extract_artifact(status, &body)
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<GeneratedArtifact, GenerationError> {
        ImageClient::generate(self, request).await
    }

    fn name(&self) -> &str {
        &self.model
    }
}

pub fn endpoint_for_model(api_base: &str, model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") {
        format!("{}/{}:generateContent", api_base, model)
    } else {
        format!("{}/models/{}:generateContent", api_base, model)
    }
}

/// Reference image first (remix only), then the instruction text.
pub fn build_payload(request: &GenerationRequest) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(2);
    if let Some(reference) = &request.reference {
        parts.push(Part::inline(
            reference.mime_type.clone(),
            reference.to_base64(),
        ));
    }
    parts.push(Part::text(request.instruction()));

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE".to_string()],
            image_config: ImageConfig {
                aspect_ratio: WALLPAPER_ASPECT_RATIO.to_string(),
            },
        },
    }
}

/// Turn a raw `generateContent` response into exactly one artifact.
pub fn extract_artifact(
    status: StatusCode,
    body: &str,
) -> std::result::Result<GeneratedArtifact, GenerationError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .ok()
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| truncate(body, 300));
        return Err(GenerationError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Parse(e.to_string()))?;

    let parts = response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or_default();

    for part in parts {
        let Some(inline) = &part.inline_data else {
            continue;
        };
        if inline.data.is_empty() {
            continue;
        }
        let bytes = BASE64
            .decode(inline.data.as_bytes())
            .map_err(|e| GenerationError::Decode(format!("base64: {}", e)))?;
        if sniff_mime_type(&bytes).is_none() {
            return Err(GenerationError::Decode(
                "payload is not a recognised image format".into(),
            ));
        }
        return Ok(GeneratedArtifact::from_bytes(
            bytes,
            inline.mime_type.as_deref(),
        ));
    }

    Err(GenerationError::NoImage(no_image_reason(&response)))
}

fn no_image_reason(response: &GenerateContentResponse) -> String {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        return format!("prompt blocked ({})", reason);
    }

    let Some(candidate) = response.candidates.first() else {
        return "no candidates returned".to_string();
    };

    let text: Vec<&str> = candidate
        .content
        .iter()
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect();
    if !text.is_empty() {
        return format!("model answered with text only: {}", truncate(&text.join(" "), 200));
    }

    match candidate.finish_reason.as_deref() {
        Some(reason) => format!("finish reason {}", reason),
        None => "no inline image part".to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
