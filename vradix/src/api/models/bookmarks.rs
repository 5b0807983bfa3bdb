//! API request/response models for bookmarks.

use crate::db::models::bookmarks::BookmarkDBResponse;
use crate::types::{AnalysisId, BookmarkId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookmarkCreate {
    #[schema(value_type = String, format = "uuid")]
    pub analysis_id: AnalysisId,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookmarkUpdate {
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookmarkResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BookmarkId,
    #[schema(value_type = String, format = "uuid")]
    pub analysis_id: AnalysisId,
    /// The bookmarked word, when the analysis still exists
    pub word: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl BookmarkResponse {
    pub fn new(db: BookmarkDBResponse, word: Option<String>) -> Self {
        Self {
            id: db.id,
            analysis_id: db.analysis_id,
            word,
            notes: db.notes,
            created_at: db.created_at,
        }
    }
}
