//! Database models for canonical word origins.

use crate::types::WordOriginId;
use chrono::{DateTime, Utc};

/// Database request for creating a word origin from a completed analysis
#[derive(Debug, Clone, Default)]
pub struct WordOriginCreateDBRequest {
    pub word: String,
    pub language: String,
    pub original_form: String,
    pub transliteration: String,
    pub meaning: String,
    pub definition: String,
    pub prefix: String,
    pub prefix_meaning: String,
    pub root: String,
    pub root_meaning: String,
    pub suffix: String,
    pub suffix_meaning: String,
    pub historical_context: String,
}

/// Database response for a word origin
#[derive(Debug, Clone)]
pub struct WordOriginDBResponse {
    pub id: WordOriginId,
    pub word: String,
    pub language: String,
    pub original_form: String,
    pub transliteration: String,
    pub meaning: String,
    pub definition: String,
    pub prefix: String,
    pub prefix_meaning: String,
    pub root: String,
    pub root_meaning: String,
    pub suffix: String,
    pub suffix_meaning: String,
    pub historical_context: String,
    pub difficulty_level: i32,
    pub search_count: i64,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
