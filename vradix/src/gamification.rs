//! XP, levels, streaks and achievements.
//!
//! XP is the only stored quantity that matters; the level is derived from it with
//! [`level_for_xp`] and written back after each award so that listings can sort on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::db::{
    errors::Result,
    handlers::{Store, UserStore},
    models::users::{AchievementCreateDBRequest, AchievementDBResponse, UserDBResponse, UserProgressUpdateDBRequest},
};
use crate::types::{UserId, abbrev_uuid};

/// Position on the level curve for a given XP total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LevelProgress {
    pub level: i32,
    /// XP still needed to reach the next level
    pub xp_to_next: i32,
    /// Total XP at which the current level started
    pub level_start_xp: i32,
    /// Total XP at which the next level starts
    pub next_level_xp: i32,
}

/// Level 1 needs 100 XP; after each level-up the requirement grows by `50 + level * 25`.
pub fn level_for_xp(xp: i32) -> LevelProgress {
    let xp = xp.max(0);
    let mut level = 1;
    let mut required: i32 = 100;
    let mut total: i32 = 0;

    // A boundary past i32::MAX is unreachable, so the loop ends there
    while let Some(next) = total.checked_add(required)
        && xp >= next
    {
        total = next;
        level += 1;
        required = required.saturating_add(50 + level * 25);
    }

    let next_level_xp = total.saturating_add(required);
    LevelProgress {
        level,
        xp_to_next: next_level_xp - xp,
        level_start_xp: total,
        next_level_xp,
    }
}

/// Streak after activity at `now`: unchanged on the same day, extended on the next day,
/// restarted otherwise.
pub fn next_streak(streak_days: i32, last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i32 {
    let Some(last) = last_activity else {
        return 1;
    };
    match (now.date_naive() - last.date_naive()).num_days() {
        0 => streak_days.max(1),
        1 => streak_days + 1,
        _ => 1,
    }
}

/// A built-in achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementDef {
    pub code: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    /// Bonus XP granted with the achievement
    pub xp: i32,
}

pub const ETYMOLOGY_EXPLORER: AchievementDef = AchievementDef {
    code: "etymology_explorer",
    title: "Explorador Etimológico",
    description: "Realizou sua primeira análise etimológica",
    icon: "scroll",
    xp: 200,
};

pub const CHALLENGE_BEGINNER: AchievementDef = AchievementDef {
    code: "challenge_beginner",
    title: "Primeiro Desafio",
    description: "Completou seu primeiro desafio",
    icon: "target",
    xp: 75,
};

/// Result of an XP award
#[derive(Debug, Clone)]
pub struct XpAward {
    pub user: UserDBResponse,
    pub previous_level: i32,
    pub achievements: Vec<AchievementDBResponse>,
}

impl XpAward {
    pub fn leveled_up(&self) -> bool {
        self.user.level > self.previous_level
    }
}

/// Add XP, refresh level and streak, and grant `unlocks` the user does not hold yet.
///
/// Achievement bonus XP lands in the same award.
#[instrument(skip(store, unlocks), fields(user_id = %abbrev_uuid(&user_id)), err)]
pub async fn award_xp(store: &dyn Store, user_id: UserId, amount: i32, unlocks: &[AchievementDef]) -> Result<XpAward> {
    let before = store.add_xp(user_id, amount).await?;
    let previous_level = before.level;

    let mut achievements = Vec::new();
    let mut bonus: i32 = 0;
    for def in unlocks {
        let granted = store
            .grant_achievement(&AchievementCreateDBRequest {
                user_id,
                code: def.code.to_string(),
                title: def.title.to_string(),
                description: def.description.to_string(),
                icon: def.icon.to_string(),
                xp: def.xp,
            })
            .await?;
        if let Some(achievement) = granted {
            info!(code = def.code, "Achievement unlocked");
            bonus = bonus.saturating_add(achievement.xp);
            achievements.push(achievement);
        }
    }

    let user = if bonus > 0 { store.add_xp(user_id, bonus).await? } else { before };

    let now = Utc::now();
    let user = store
        .update_progress(
            user_id,
            &UserProgressUpdateDBRequest {
                level: level_for_xp(user.xp).level,
                streak_days: next_streak(user.streak_days, user.last_activity, now),
                last_activity: now,
            },
        )
        .await?;

    Ok(XpAward {
        user,
        previous_level,
        achievements,
    })
}
