//! API request/response models for etymology analyses, images and featured words.

use crate::ai::analysis::{EtymologyRecord, RelatedWord};
use crate::ai::images::{Attribution, ImageSource, ResolvedImage};
use crate::db::models::analyses::{AnalysisDBResponse, AnalysisStatus};
use crate::db::models::searches::{FeaturedWordDBResponse, PopularSearchDBResponse};
use crate::types::{AnalysisId, UserId, WordOriginId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub word: Option<String>,
    /// Attach an illustration; defaults to `analysis.include_images`
    pub include_images: Option<bool>,
    /// Skip stored results and ask the provider again
    pub refresh: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub data: AnalysisData,
    pub raw_response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    pub word: String,
    #[schema(value_type = String, format = "uuid")]
    pub analysis_id: AnalysisId,
    pub status: AnalysisStatus,
    pub confidence_score: f64,
    pub etymology: EtymologySection,
    pub morphology: MorphologySection,
    pub related_words: Vec<RelatedWordResponse>,
    pub historical_context: String,
    pub curiosities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtymologySection {
    pub origin: String,
    pub original_form: String,
    pub meaning: String,
    pub evolution: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MorphologySection {
    pub prefix: String,
    pub root: String,
    pub suffix: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RelatedWordResponse {
    pub word: String,
    pub relationship: String,
    pub explanation: String,
}

impl From<RelatedWord> for RelatedWordResponse {
    fn from(related: RelatedWord) -> Self {
        Self {
            word: related.word,
            relationship: related.relationship,
            explanation: related.explanation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub source: ImageSource,
    pub attribution: Option<Attribution>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

impl From<ResolvedImage> for ImageResponse {
    fn from(image: ResolvedImage) -> Self {
        Self {
            image_url: image.image_url,
            thumbnail_url: image.thumbnail_url,
            source: image.source,
            attribution: image.attribution,
            metadata: image.metadata,
        }
    }
}

fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// "part (meaning)" for each morphological piece present, joined with " + "
fn describe_morphology(record: &EtymologyRecord) -> String {
    [
        (&record.prefix, &record.prefix_meaning),
        (&record.root, &record.root_meaning),
        (&record.suffix, &record.suffix_meaning),
    ]
    .into_iter()
    .filter(|(part, _)| !part.trim().is_empty())
    .map(|(part, meaning)| {
        if meaning.trim().is_empty() {
            part.trim().to_string()
        } else {
            format!("{} ({})", part.trim(), meaning.trim())
        }
    })
    .collect::<Vec<_>>()
    .join(" + ")
}

impl EtymologySection {
    pub fn from_record(record: &EtymologyRecord) -> Self {
        Self {
            origin: first_non_empty([Some(record.etymology_explanation.as_str()), record.origem.as_deref()]),
            original_form: first_non_empty([Some(record.original_form.as_str()), record.raizes.as_deref()]),
            meaning: first_non_empty([Some(record.root_meaning.as_str()), record.significado.as_deref()]),
            evolution: first_non_empty([Some(record.modern_usage.as_str()), record.origem.as_deref()]),
        }
    }
}

impl MorphologySection {
    pub fn from_record(record: &EtymologyRecord) -> Self {
        let explanation = first_non_empty([record.morfologia.as_deref()]);
        Self {
            prefix: record.prefix.clone(),
            root: first_non_empty([Some(record.root.as_str()), record.raizes.as_deref()]),
            suffix: record.suffix.clone(),
            explanation: if explanation.is_empty() { describe_morphology(record) } else { explanation },
        }
    }
}

impl AnalysisData {
    /// Shape a stored analysis and its normalized record into the response schema
    pub fn from_record(word: &str, analysis: &AnalysisDBResponse, record: &EtymologyRecord, status: AnalysisStatus) -> Self {
        let curiosity = first_non_empty([Some(record.modern_usage.as_str()), record.significado.as_deref()]);
        Self {
            word: word.to_string(),
            analysis_id: analysis.id,
            status,
            confidence_score: analysis.confidence_score,
            etymology: EtymologySection::from_record(record),
            morphology: MorphologySection::from_record(record),
            related_words: record.related_words.iter().cloned().map(Into::into).collect(),
            historical_context: first_non_empty([Some(record.historical_context.as_str()), record.origem.as_deref()]),
            curiosities: if curiosity.is_empty() { Vec::new() } else { vec![curiosity] },
            image: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GenerateImageRequest {
    pub word: Option<String>,
    pub etymology: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub success: bool,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub source: ImageSource,
    pub prompt: Option<String>,
    pub attribution: Option<Attribution>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

impl From<ResolvedImage> for GenerateImageResponse {
    fn from(image: ResolvedImage) -> Self {
        Self {
            success: true,
            image_url: image.image_url,
            thumbnail_url: image.thumbnail_url,
            source: image.source,
            prompt: image.prompt,
            attribution: image.attribution,
            metadata: image.metadata,
        }
    }
}

/// Full stored analysis, as returned by the listing and detail endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AnalysisId,
    pub word: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub word_origin_id: Option<WordOriginId>,
    pub status: AnalysisStatus,
    pub original_language: String,
    pub original_form: String,
    pub transliteration: String,
    pub prefix: String,
    pub prefix_meaning: String,
    pub root: String,
    pub root_meaning: String,
    pub suffix: String,
    pub suffix_meaning: String,
    pub etymology_explanation: String,
    pub historical_context: String,
    pub modern_usage: String,
    pub related_words: Vec<String>,
    pub model_used: String,
    pub tokens_used: i32,
    pub processing_time_ms: i64,
    pub cost_usd: f64,
    pub confidence_score: f64,
    pub is_validated: bool,
    pub validation_notes: String,
    pub view_count: i64,
    pub last_viewed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only present on the detail endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bookmarked: Option<bool>,
}

impl From<AnalysisDBResponse> for AnalysisResponse {
    fn from(db: AnalysisDBResponse) -> Self {
        Self {
            id: db.id,
            word: db.word,
            user_id: db.user_id,
            word_origin_id: db.word_origin_id,
            status: db.status,
            original_language: db.original_language,
            original_form: db.original_form,
            transliteration: db.transliteration,
            prefix: db.prefix,
            prefix_meaning: db.prefix_meaning,
            root: db.root,
            root_meaning: db.root_meaning,
            suffix: db.suffix,
            suffix_meaning: db.suffix_meaning,
            etymology_explanation: db.etymology_explanation,
            historical_context: db.historical_context,
            modern_usage: db.modern_usage,
            related_words: db.related_words,
            model_used: db.model_used,
            tokens_used: db.tokens_used,
            processing_time_ms: db.processing_time_ms,
            cost_usd: db.cost_usd,
            confidence_score: db.confidence_score,
            is_validated: db.is_validated,
            validation_notes: db.validation_notes,
            view_count: db.view_count,
            last_viewed: db.last_viewed,
            created_at: db.created_at,
            updated_at: db.updated_at,
            is_bookmarked: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeaturedWordSummary {
    pub word: String,
    pub origin: String,
    pub meaning: String,
}

impl From<FeaturedWordDBResponse> for FeaturedWordSummary {
    fn from(db: FeaturedWordDBResponse) -> Self {
        Self {
            word: db.word,
            origin: db.language,
            meaning: if db.custom_description.is_empty() { db.meaning } else { db.custom_description },
        }
    }
}

impl FeaturedWordSummary {
    /// Shown when nothing has been curated yet
    pub fn built_in() -> Vec<Self> {
        [
            ("filosofia", "Grego", "amor à sabedoria"),
            ("democracia", "Grego", "governo do povo"),
            ("biblioteca", "Grego", "depósito de livros"),
        ]
        .into_iter()
        .map(|(word, origin, meaning)| Self {
            word: word.to_string(),
            origin: origin.to_string(),
            meaning: meaning.to_string(),
        })
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeaturedWordsResponse {
    pub featured_words: Vec<FeaturedWordSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeatureWordRequest {
    pub word: String,
    pub display_order: Option<i32>,
    pub custom_title: Option<String>,
    pub custom_description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeaturedWordResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub word_origin_id: WordOriginId,
    pub word: String,
    pub language: String,
    pub original_form: String,
    pub meaning: String,
    pub display_order: i32,
    pub custom_title: String,
    pub custom_description: String,
}

impl From<FeaturedWordDBResponse> for FeaturedWordResponse {
    fn from(db: FeaturedWordDBResponse) -> Self {
        Self {
            id: db.id,
            word_origin_id: db.word_origin_id,
            word: db.word,
            language: db.language,
            original_form: db.original_form,
            meaning: db.meaning,
            display_order: db.display_order,
            custom_title: db.custom_title,
            custom_description: db.custom_description,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PopularQuery {
    /// Number of words to return (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
}

impl PopularQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PopularSearchResponse {
    pub word: String,
    pub search_count: i64,
    pub daily_searches: i64,
    pub weekly_searches: i64,
    pub monthly_searches: i64,
    pub difficulty_level: i32,
    pub categories: Vec<String>,
    pub last_searched: DateTime<Utc>,
}

impl From<PopularSearchDBResponse> for PopularSearchResponse {
    fn from(db: PopularSearchDBResponse) -> Self {
        Self {
            word: db.word,
            search_count: db.search_count,
            daily_searches: db.daily_searches,
            weekly_searches: db.weekly_searches,
            monthly_searches: db.monthly_searches,
            difficulty_level: db.difficulty_level,
            categories: db.categories,
            last_searched: db.last_searched,
        }
    }
}
