//! Database models for challenges and per-user completion.

use crate::types::{ChallengeId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeType {
    Etymology,
    Morphology,
    Quiz,
    Creative,
}

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::Etymology => "etymology",
            ChallengeType::Morphology => "morphology",
            ChallengeType::Quiz => "quiz",
            ChallengeType::Creative => "creative",
        }
    }
}

impl FromStr for ChallengeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "etymology" => Ok(ChallengeType::Etymology),
            "morphology" => Ok(ChallengeType::Morphology),
            "quiz" => Ok(ChallengeType::Quiz),
            "creative" => Ok(ChallengeType::Creative),
            other => Err(format!("unknown challenge type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

/// Database request for creating a challenge
#[derive(Debug, Clone)]
pub struct ChallengeCreateDBRequest {
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    pub difficulty: Difficulty,
    pub xp_reward: i32,
}

/// Database response for a challenge
#[derive(Debug, Clone)]
pub struct ChallengeDBResponse {
    pub id: ChallengeId,
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    pub difficulty: Difficulty,
    pub xp_reward: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A user's completion of a challenge
#[derive(Debug, Clone)]
pub struct UserChallengeDBResponse {
    pub id: Uuid,
    pub user_id: UserId,
    pub challenge_id: ChallengeId,
    pub completed: bool,
    pub score: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

/// An active challenge with the requesting user's progress, if any
#[derive(Debug, Clone)]
pub struct ChallengeWithProgress {
    pub challenge: ChallengeDBResponse,
    pub progress: Option<UserChallengeDBResponse>,
}
