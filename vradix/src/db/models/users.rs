//! Database models for users and achievements.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of account, chosen at registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Student,
    Teacher,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Student => "student",
            UserType::Teacher => "teacher",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(UserType::Student),
            "teacher" => Ok(UserType::Teacher),
            other => Err(format!("unknown user type '{other}'")),
        }
    }
}

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub user_type: UserType,
    pub is_staff: bool,
    pub institution: Option<String>,
}

/// Database response for a user
#[derive(Debug, Clone)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub user_type: UserType,
    pub is_staff: bool,
    pub xp: i32,
    pub level: i32,
    pub streak_days: i32,
    pub last_activity: Option<DateTime<Utc>>,
    pub institution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Progress fields written after XP has been awarded
#[derive(Debug, Clone)]
pub struct UserProgressUpdateDBRequest {
    pub level: i32,
    pub streak_days: i32,
    pub last_activity: DateTime<Utc>,
}

/// Database request for granting an achievement
#[derive(Debug, Clone)]
pub struct AchievementCreateDBRequest {
    pub user_id: UserId,
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub xp: i32,
}

/// Database response for an achievement
#[derive(Debug, Clone)]
pub struct AchievementDBResponse {
    pub id: Uuid,
    pub user_id: UserId,
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub xp: i32,
    pub earned_at: DateTime<Utc>,
}
