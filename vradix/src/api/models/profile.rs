//! API response models for the caller's profile.

use crate::api::models::users::UserResponse;
use crate::db::models::users::AchievementDBResponse;
use crate::gamification::LevelProgress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AchievementResponse {
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub xp: i32,
    pub earned_at: DateTime<Utc>,
}

impl From<AchievementDBResponse> for AchievementResponse {
    fn from(db: AchievementDBResponse) -> Self {
        Self {
            code: db.code,
            title: db.title,
            description: db.description,
            icon: db.icon,
            xp: db.xp,
            earned_at: db.earned_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub streak_days: i32,
    pub last_activity: Option<DateTime<Utc>>,
    pub institution: Option<String>,
    pub level_progress: LevelProgress,
    pub achievements: Vec<AchievementResponse>,
    pub completed_challenges: i64,
}
