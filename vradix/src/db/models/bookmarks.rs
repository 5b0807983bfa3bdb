//! Database models for bookmarks.

use crate::types::{AnalysisId, BookmarkId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a bookmark
#[derive(Debug, Clone)]
pub struct BookmarkCreateDBRequest {
    pub user_id: UserId,
    pub analysis_id: AnalysisId,
    pub notes: String,
}

/// Database response for a bookmark
#[derive(Debug, Clone)]
pub struct BookmarkDBResponse {
    pub id: BookmarkId,
    pub user_id: UserId,
    pub analysis_id: AnalysisId,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}
