//! API request/response models for challenges.

use crate::api::models::users::UserResponse;
use crate::db::models::challenges::{ChallengeDBResponse, ChallengeType, ChallengeWithProgress, Difficulty};
use crate::gamification::LevelProgress;
use crate::types::ChallengeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::profile::AchievementResponse;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChallengeCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub challenge_type: ChallengeType,
    pub difficulty: Difficulty,
    /// Defaults to 50
    pub xp_reward: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChallengeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ChallengeId,
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    pub difficulty: Difficulty,
    pub xp_reward: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// Whether the requesting user has completed it
    pub completed: bool,
    pub score: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<ChallengeDBResponse> for ChallengeResponse {
    fn from(db: ChallengeDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            challenge_type: db.challenge_type,
            difficulty: db.difficulty,
            xp_reward: db.xp_reward,
            is_active: db.is_active,
            created_at: db.created_at,
            completed: false,
            score: None,
            completed_at: None,
        }
    }
}

impl From<ChallengeWithProgress> for ChallengeResponse {
    fn from(item: ChallengeWithProgress) -> Self {
        let mut response = ChallengeResponse::from(item.challenge);
        if let Some(progress) = item.progress {
            response.completed = progress.completed;
            response.score = Some(progress.score);
            response.completed_at = progress.completed_at;
        }
        response
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompleteChallengeRequest {
    #[serde(default)]
    pub score: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompleteChallengeResponse {
    pub xp_awarded: i32,
    pub leveled_up: bool,
    pub user: UserResponse,
    pub level_progress: LevelProgress,
    pub achievements_unlocked: Vec<AchievementResponse>,
}
