//! OpenAI images API client.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ImageGenerator, ProviderError, truncate_body};
use crate::config::OpenAiConfig;

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

pub struct OpenAiImageClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiImageClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http, config })
    }

    fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref().filter(|key| !key.is_empty())
    }
}

#[async_trait::async_trait]
impl ImageGenerator for OpenAiImageClient {
    fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    #[instrument(skip_all, fields(model = %self.config.model), err)]
    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key().ok_or(ProviderError::NotConfigured { provider: "OpenAI" })?;

        let body = ImageGenerationRequest {
            model: &self.config.model,
            prompt,
            size: &self.config.size,
            quality: &self.config.quality,
            n: 1,
        };

        let response = self
            .http
            .post(format!("{}/v1/images/generations", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: ImageGenerationResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .find_map(|image| image.url.filter(|url| !url.is_empty()))
            .ok_or_else(|| ProviderError::InvalidResponse("no image URL in response".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
