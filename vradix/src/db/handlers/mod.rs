//! Store traits for database access.
//!
//! Each trait covers one table family. [`Store`] ties them together so that request handlers
//! hold a single `Arc<dyn Store>`, and is implemented by:
//!
//! - [`postgres::PgStore`]: PostgreSQL over an `sqlx` pool (production)
//! - [`in_memory::InMemoryStore`]: process-local maps (tests, `database.type: memory`)
//!
//! Both implementations report constraint failures with the same
//! [`DbError`](crate::db::errors::DbError) variants.

pub mod in_memory;
pub mod postgres;

use chrono::{DateTime, Utc};

use crate::db::{
    errors::Result,
    models::{
        analyses::{AnalysisDBResponse, AnalysisFilter, AnalysisUpsertDBRequest},
        bookmarks::{BookmarkCreateDBRequest, BookmarkDBResponse},
        challenges::{ChallengeCreateDBRequest, ChallengeDBResponse, ChallengeWithProgress, UserChallengeDBResponse},
        corrections::{CorrectionCreateDBRequest, CorrectionDBResponse},
        searches::{FeaturedWordCreateDBRequest, FeaturedWordDBResponse, PopularSearchDBResponse},
        usage::{ApiUsageCreateDBRequest, SystemCounts},
        users::{AchievementCreateDBRequest, AchievementDBResponse, UserCreateDBRequest, UserDBResponse, UserProgressUpdateDBRequest},
        words::{WordOriginCreateDBRequest, WordOriginDBResponse},
    },
};
use crate::types::{AnalysisId, BookmarkId, ChallengeId, CorrectionId, UserId, WordOriginId};

pub use in_memory::InMemoryStore;
pub use postgres::PgStore;

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;

    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserDBResponse>>;

    /// Atomically add to the user's XP, returning the updated user
    async fn add_xp(&self, id: UserId, amount: i32) -> Result<UserDBResponse>;

    /// Write derived progress fields (level, streak) after an XP change
    async fn update_progress(&self, id: UserId, request: &UserProgressUpdateDBRequest) -> Result<UserDBResponse>;

    /// Grant an achievement; returns `None` when the user already holds it
    async fn grant_achievement(&self, request: &AchievementCreateDBRequest) -> Result<Option<AchievementDBResponse>>;

    async fn list_achievements(&self, user_id: UserId) -> Result<Vec<AchievementDBResponse>>;
}

#[async_trait::async_trait]
pub trait WordStore: Send + Sync {
    async fn get_word_origin(&self, id: WordOriginId) -> Result<Option<WordOriginDBResponse>>;

    async fn get_word_origin_by_word(&self, word: &str) -> Result<Option<WordOriginDBResponse>>;
}

#[async_trait::async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Insert or replace the analysis for (word, user) as one write.
    ///
    /// When `origin` is given, the word origin is created if absent (its search count is bumped
    /// otherwise) and linked to the analysis.
    async fn upsert_analysis(
        &self,
        request: &AnalysisUpsertDBRequest,
        origin: Option<&WordOriginCreateDBRequest>,
    ) -> Result<AnalysisDBResponse>;

    async fn get_analysis(&self, id: AnalysisId) -> Result<Option<AnalysisDBResponse>>;

    async fn find_analysis(&self, word: &str, user_id: Option<UserId>) -> Result<Option<AnalysisDBResponse>>;

    /// Newest first
    async fn list_analyses(&self, filter: &AnalysisFilter) -> Result<Vec<AnalysisDBResponse>>;

    /// Increment the view counter and stamp `last_viewed`
    async fn record_view(&self, id: AnalysisId) -> Result<AnalysisDBResponse>;
}

#[async_trait::async_trait]
pub trait CorrectionStore: Send + Sync {
    async fn create_correction(&self, request: &CorrectionCreateDBRequest) -> Result<CorrectionDBResponse>;

    async fn get_correction(&self, id: CorrectionId) -> Result<Option<CorrectionDBResponse>>;

    async fn list_corrections(&self, analysis_id: AnalysisId) -> Result<Vec<CorrectionDBResponse>>;

    /// Mark a pending correction approved and write the corrected value to the analysis (and to
    /// its word origin when the field exists there), all in one write.
    ///
    /// Fails with `NotFound` when the correction does not exist, and with a unique violation on
    /// `etymology_corrections` when it was already approved.
    async fn approve_correction(&self, id: CorrectionId, reviewer: UserId) -> Result<CorrectionDBResponse>;
}

#[async_trait::async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn create_bookmark(&self, request: &BookmarkCreateDBRequest) -> Result<BookmarkDBResponse>;

    async fn get_bookmark(&self, id: BookmarkId) -> Result<Option<BookmarkDBResponse>>;

    async fn list_bookmarks(&self, user_id: UserId) -> Result<Vec<BookmarkDBResponse>>;

    async fn update_bookmark_notes(&self, id: BookmarkId, notes: &str) -> Result<BookmarkDBResponse>;

    async fn delete_bookmark(&self, id: BookmarkId) -> Result<bool>;

    async fn is_bookmarked(&self, user_id: UserId, analysis_id: AnalysisId) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait SearchStore: Send + Sync {
    /// Count one lookup of `word`: creates the record with count 1, otherwise increments every
    /// counter by 1.
    async fn record_search(&self, word: &str) -> Result<PopularSearchDBResponse>;

    async fn list_popular(&self, limit: i64) -> Result<Vec<PopularSearchDBResponse>>;

    async fn feature_word(&self, request: &FeaturedWordCreateDBRequest) -> Result<FeaturedWordDBResponse>;

    /// Active featured words whose scheduling window contains `now`, by display order
    async fn list_featured(&self, now: DateTime<Utc>) -> Result<Vec<FeaturedWordDBResponse>>;
}

#[async_trait::async_trait]
pub trait ChallengeStore: Send + Sync {
    async fn create_challenge(&self, request: &ChallengeCreateDBRequest) -> Result<ChallengeDBResponse>;

    async fn get_challenge(&self, id: ChallengeId) -> Result<Option<ChallengeDBResponse>>;

    async fn list_active_challenges(&self, user_id: UserId) -> Result<Vec<ChallengeWithProgress>>;

    /// Record a completion. Fails with a unique violation when the user already completed it.
    async fn complete_challenge(&self, user_id: UserId, challenge_id: ChallengeId, score: i32) -> Result<UserChallengeDBResponse>;

    async fn count_completed_challenges(&self, user_id: UserId) -> Result<i64>;
}

#[async_trait::async_trait]
pub trait UsageStore: Send + Sync {
    async fn log_api_usage(&self, request: &ApiUsageCreateDBRequest) -> Result<()>;
}

/// Everything the application needs from persistence.
#[async_trait::async_trait]
pub trait Store: UserStore + WordStore + AnalysisStore + CorrectionStore + BookmarkStore + SearchStore + ChallengeStore + UsageStore {
    /// Cheap connectivity check for the health endpoint
    async fn ping(&self) -> Result<()>;

    /// Aggregate counts; `since` bounds the "today" API usage counter
    async fn system_counts(&self, since: DateTime<Utc>) -> Result<SystemCounts>;

    /// Name reported by the health endpoint
    fn backend_name(&self) -> &'static str;
}
