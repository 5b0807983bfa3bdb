//! Database models for the external API audit trail.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Database request for recording one external API call
#[derive(Debug, Clone)]
pub struct ApiUsageCreateDBRequest {
    pub service: String,
    pub endpoint: String,
    pub request_data: serde_json::Value,
    pub response_data: serde_json::Value,
    pub tokens_used: i32,
    pub cost_usd: f64,
    pub response_time_ms: i64,
    pub success: bool,
    pub error_message: String,
}

/// Database response for a recorded call
#[derive(Debug, Clone)]
pub struct ApiUsageDBResponse {
    pub id: Uuid,
    pub service: String,
    pub endpoint: String,
    pub request_data: serde_json::Value,
    pub response_data: serde_json::Value,
    pub tokens_used: i32,
    pub cost_usd: f64,
    pub response_time_ms: i64,
    pub success: bool,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counts reported by the statistics endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemCounts {
    pub users: i64,
    pub word_origins: i64,
    pub analyses: i64,
    pub featured_words: i64,
    pub challenges: i64,
    pub completed_challenges: i64,
    pub api_calls_total: i64,
    pub api_calls_today: i64,
}
