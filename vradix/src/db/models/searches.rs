//! Database models for popular searches and featured words.

use crate::types::WordOriginId;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Running search counters for a word
#[derive(Debug, Clone)]
pub struct PopularSearchDBResponse {
    pub id: Uuid,
    pub word: String,
    pub search_count: i64,
    pub daily_searches: i64,
    pub weekly_searches: i64,
    pub monthly_searches: i64,
    pub difficulty_level: i32,
    pub categories: Vec<String>,
    pub last_searched: DateTime<Utc>,
}

/// A featured word joined with its word origin
#[derive(Debug, Clone)]
pub struct FeaturedWordDBResponse {
    pub id: Uuid,
    pub word_origin_id: WordOriginId,
    pub word: String,
    pub language: String,
    pub original_form: String,
    pub meaning: String,
    pub display_order: i32,
    pub custom_title: String,
    pub custom_description: String,
}

/// Database request for featuring a word
#[derive(Debug, Clone)]
pub struct FeaturedWordCreateDBRequest {
    pub word_origin_id: WordOriginId,
    pub display_order: i32,
    pub custom_title: String,
    pub custom_description: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}
