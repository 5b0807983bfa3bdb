//! External AI collaborators and the clients built on them.
//!
//! Providers sit behind three traits so the pipeline can run against mocks:
//!
//! - [`TextGenerator`]: prompt → text and token count ([`gemini::GeminiClient`])
//! - [`ImageGenerator`]: prompt → image URL ([`openai::OpenAiImageClient`])
//! - [`StockPhotoSearch`]: query → ranked photos ([`unsplash::UnsplashClient`])
//!
//! On top of them:
//!
//! - [`analysis::AnalysisClient`] builds the etymology prompt, calls the text generator and
//!   repairs its output into an [`analysis::EtymologyRecord`], falling back to a placeholder
//!   record when the output cannot be parsed
//! - [`images::ImageResolver`] walks the image tiers (generated, stock photo, static table)
//!   and always produces a URL
//! - [`usage`] records every external call in the API usage audit table
//!
//! Nothing here retries. A failed call is reported once and the caller decides on the
//! fallback.

pub mod analysis;
pub mod gemini;
pub mod images;
#[cfg(test)]
pub mod mock;
pub mod openai;
pub mod unsplash;
pub mod usage;

use thiserror::Error;

/// Failure talking to an external provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} API key not configured")]
    NotConfigured { provider: &'static str },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Output of one text generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedText {
    pub text: String,
    pub tokens_used: i32,
}

#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedText, ProviderError>;

    /// Model identifier recorded on each analysis
    fn model_name(&self) -> &str;
}

#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Whether credentials are present; unconfigured generators are skipped
    fn is_configured(&self) -> bool;

    /// Returns the URL of one generated image
    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError>;

    fn model_name(&self) -> &str;
}

/// A stock photo search hit with the attribution the provider requires
#[derive(Debug, Clone, PartialEq)]
pub struct StockPhoto {
    pub url: String,
    pub thumbnail_url: String,
    pub photographer: String,
    pub username: String,
    pub profile_url: String,
}

#[async_trait::async_trait]
pub trait StockPhotoSearch: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Best matches first
    async fn search(&self, query: &str) -> Result<Vec<StockPhoto>, ProviderError>;
}

/// Keep error bodies short enough to log and store
pub(crate) fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 500;
    match body.char_indices().nth(LIMIT) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");
        let long = "é".repeat(600);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.chars().count(), 503);
        assert!(truncated.ends_with("..."));
    }
}
