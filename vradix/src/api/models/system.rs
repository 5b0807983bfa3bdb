//! API response models for health and statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::usage::SystemCounts;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub environment: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthChecks {
    /// `healthy` or `unhealthy: <reason>`
    pub database: String,
    pub database_backend: String,
    pub cache: String,
    pub external_apis: ExternalApiChecks,
}

/// `configured` or `not_configured` per provider
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExternalApiChecks {
    pub gemini: String,
    pub openai: String,
    pub unsplash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub users: i64,
    pub word_origins: i64,
    pub analyses: i64,
    pub featured_words: i64,
    pub challenges: i64,
    pub completed_challenges: i64,
    pub api_calls_total: i64,
    pub api_calls_today: i64,
}

impl From<SystemCounts> for StatsResponse {
    fn from(counts: SystemCounts) -> Self {
        Self {
            users: counts.users,
            word_origins: counts.word_origins,
            analyses: counts.analyses,
            featured_words: counts.featured_words,
            challenges: counts.challenges,
            completed_challenges: counts.completed_challenges,
            api_calls_total: counts.api_calls_total,
            api_calls_today: counts.api_calls_today,
        }
    }
}
