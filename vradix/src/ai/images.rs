//! Illustration lookup across three tiers.
//!
//! 1. generated image (only when the generator has credentials)
//! 2. stock photo search (only when the search client has credentials)
//! 3. static URL table, which always answers
//!
//! A failing tier falls through to the next one; callers only see the final result.

use std::{sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};
use url::Url;
use utoipa::ToSchema;

use super::{
    ImageGenerator, StockPhotoSearch,
    usage::{UsageEntry, record_usage},
};
use crate::db::handlers::Store;

const DEFAULT_STATIC_IMAGE: &str = "https://images.unsplash.com/photo-1481627834876-b7833e8f5570?w=400&h=300&fit=crop&auto=format&q=80";

const STATIC_IMAGES: &[(&str, &str)] = &[
    ("filosofia", DEFAULT_STATIC_IMAGE),
    (
        "democracia",
        "https://images.unsplash.com/photo-1541872703-74c34d2846b5?w=400&h=300&fit=crop&auto=format&q=80",
    ),
    (
        "biblioteca",
        "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400&h=300&fit=crop&auto=format&q=80",
    ),
];

const STOCK_QUERIES: &[(&str, &str)] = &[
    ("filosofia", "ancient greek philosophy marble statue"),
    ("democracia", "ancient greek agora columns democracy"),
    ("biblioteca", "ancient library alexandria scrolls books"),
    ("psicologia", "human brain psychology mind consciousness"),
    ("tecnologia", "ancient tools craftsmanship engineering"),
    ("nostalgia", "vintage sepia memories old photographs"),
];

/// Where a resolved image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    Dalle,
    Unsplash,
    Fallback,
}

/// Photographer credit required by the stock photo provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Attribution {
    pub photographer: String,
    pub username: String,
    pub profile_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub source: ImageSource,
    pub attribution: Option<Attribution>,
    /// Prompt sent to the image generator, for generated images
    pub prompt: Option<String>,
    pub metadata: Value,
}

/// Illustrated manuscript prompt for `word`, with the etymology appended when known
pub fn build_image_prompt(word: &str, etymology: Option<&str>) -> String {
    let mut prompt = format!(
        "Create an elegant medieval illuminated manuscript illustration representing the etymology of the word \"{word}\". \
         Style: ancient manuscript with gold leaf details, rich colors (deep blues, burgundy, gold), \
         ornate decorative borders and classical typography. Include symbolic elements related to the word's \
         meaning and origin, in the manner of a scholarly medieval text about language and wisdom. \
         No modern elements, no readable text in the image."
    );
    if let Some(context) = etymology.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("\n\nEtymological context: ");
        prompt.push_str(context);
    }
    prompt
}

/// Stock photo query for `word`: a curated query for known words, a generic one otherwise
pub fn stock_query(word: &str) -> String {
    let word = word.to_lowercase();
    STOCK_QUERIES
        .iter()
        .find(|(known, _)| *known == word)
        .map(|(_, query)| query.to_string())
        .unwrap_or_else(|| format!("ancient manuscript {word}"))
}

pub fn static_image_url(word: &str) -> &'static str {
    let word = word.to_lowercase();
    STATIC_IMAGES
        .iter()
        .find(|(known, _)| *known == word)
        .map(|(_, url)| *url)
        .unwrap_or(DEFAULT_STATIC_IMAGE)
}

pub fn static_image(word: &str) -> ResolvedImage {
    ResolvedImage {
        image_url: static_image_url(word).to_string(),
        thumbnail_url: None,
        source: ImageSource::Fallback,
        attribution: None,
        prompt: None,
        metadata: json!({ "word": word, "type": "static_fallback" }),
    }
}

fn is_well_formed(url: &str) -> bool {
    Url::parse(url).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

pub struct ImageResolver {
    generator: Arc<dyn ImageGenerator>,
    stock: Arc<dyn StockPhotoSearch>,
    store: Arc<dyn Store>,
}

impl ImageResolver {
    pub fn new(generator: Arc<dyn ImageGenerator>, stock: Arc<dyn StockPhotoSearch>, store: Arc<dyn Store>) -> Self {
        Self { generator, stock, store }
    }

    #[instrument(skip(self, etymology))]
    pub async fn resolve(&self, word: &str, etymology: Option<&str>) -> ResolvedImage {
        if self.generator.is_configured()
            && let Some(image) = self.generated(word, etymology).await
        {
            return image;
        }

        if self.stock.is_configured()
            && let Some(image) = self.stock_photo(word).await
        {
            return image;
        }

        debug!(word, "Using static fallback image");
        static_image(word)
    }

    async fn generated(&self, word: &str, etymology: Option<&str>) -> Option<ResolvedImage> {
        let prompt = build_image_prompt(word, etymology);
        let started = Instant::now();

        let url = match self.generator.generate_image(&prompt).await {
            Ok(url) if is_well_formed(&url) => url,
            Ok(url) => {
                warn!(word, url, "Image generator returned a malformed URL");
                return None;
            }
            Err(e) => {
                warn!(word, error = %e, "Image generation failed");
                return None;
            }
        };

        let model = self.generator.model_name().to_string();
        record_usage(
            self.store.as_ref(),
            UsageEntry {
                service: "openai",
                endpoint: "image_generation",
                request_data: json!({ "word": word, "prompt": prompt }),
                response_data: json!({ "url": url }),
                tokens_used: 0,
                cost_usd: 0.0,
                response_time_ms: i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX),
                error: None,
            },
        )
        .await;

        Some(ResolvedImage {
            image_url: url,
            thumbnail_url: None,
            source: ImageSource::Dalle,
            attribution: None,
            metadata: json!({ "prompt": prompt, "model": model }),
            prompt: Some(prompt),
        })
    }

    async fn stock_photo(&self, word: &str) -> Option<ResolvedImage> {
        let query = stock_query(word);

        let photo = match self.stock.search(&query).await {
            Ok(photos) => photos.into_iter().find(|photo| is_well_formed(&photo.url)),
            Err(e) => {
                warn!(word, error = %e, "Stock photo search failed");
                return None;
            }
        };

        let Some(photo) = photo else {
            debug!(word, query, "Stock photo search returned no usable results");
            return None;
        };

        Some(ResolvedImage {
            image_url: photo.url,
            thumbnail_url: Some(photo.thumbnail_url).filter(|url| !url.is_empty()),
            source: ImageSource::Unsplash,
            attribution: Some(Attribution {
                photographer: photo.photographer,
                username: photo.username,
                profile_url: photo.profile_url,
            }),
            prompt: None,
            metadata: json!({ "query": query }),
        })
    }
}
