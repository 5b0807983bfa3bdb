//! Database models for etymology analyses.

use crate::types::{AnalysisId, UserId, WordOriginId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// Lifecycle of an analysis record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    /// Provider output parsed into the structured schema
    Completed,
    /// Provider unavailable or unparseable; the stored record is the placeholder
    Failed,
    /// Served from a previously completed record
    Cached,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
            AnalysisStatus::Cached => "cached",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AnalysisStatus::Pending),
            "processing" => Ok(AnalysisStatus::Processing),
            "completed" => Ok(AnalysisStatus::Completed),
            "failed" => Ok(AnalysisStatus::Failed),
            "cached" => Ok(AnalysisStatus::Cached),
            other => Err(format!("unknown analysis status '{other}'")),
        }
    }
}

/// Database request for writing an analysis; replaces any existing record for (word, user).
#[derive(Debug, Clone)]
pub struct AnalysisUpsertDBRequest {
    pub word: String,
    pub user_id: Option<UserId>,
    pub status: AnalysisStatus,
    pub raw_response: String,
    pub processed_data: serde_json::Value,
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
}

/// Database response for an analysis
#[derive(Debug, Clone)]
pub struct AnalysisDBResponse {
    pub id: AnalysisId,
    pub word: String,
    pub user_id: Option<UserId>,
    pub word_origin_id: Option<WordOriginId>,
    pub status: AnalysisStatus,
    pub raw_response: String,
    pub processed_data: serde_json::Value,
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
}

/// Filter for listing analyses
#[derive(Debug, Clone)]
pub struct AnalysisFilter {
    pub user_id: UserId,
    pub skip: i64,
    pub limit: i64,
}

impl AnalysisFilter {
    pub fn new(user_id: UserId, skip: i64, limit: i64) -> Self {
        Self { user_id, skip, limit }
    }
}
