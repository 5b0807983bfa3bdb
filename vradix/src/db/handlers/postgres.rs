//! PostgreSQL store implementation.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use tracing::instrument;
use uuid::Uuid;

use super::{AnalysisStore, BookmarkStore, ChallengeStore, CorrectionStore, SearchStore, Store, UsageStore, UserStore, WordStore};
use crate::db::{
    errors::{DbError, Result},
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
use crate::types::{AnalysisId, BookmarkId, ChallengeId, CorrectionId, UserId, WordOriginId, abbrev_uuid};

fn parse_column<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse().map_err(|e: String| DbError::Other(anyhow::anyhow!(e)))
}

// Database entity models

#[derive(Debug, FromRow)]
struct User {
    id: UserId,
    email: String,
    username: String,
    password_hash: String,
    user_type: String,
    is_staff: bool,
    xp: i32,
    level: i32,
    streak_days: i32,
    last_activity: Option<DateTime<Utc>>,
    institution: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<User> for UserDBResponse {
    type Error = DbError;

    fn try_from(user: User) -> Result<Self> {
        Ok(Self {
            id: user.id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            user_type: parse_column(&user.user_type)?,
            is_staff: user.is_staff,
            xp: user.xp,
            level: user.level,
            streak_days: user.streak_days,
            last_activity: user.last_activity,
            institution: user.institution,
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct Achievement {
    id: Uuid,
    user_id: UserId,
    code: String,
    title: String,
    description: String,
    icon: String,
    xp: i32,
    earned_at: DateTime<Utc>,
}

impl From<Achievement> for AchievementDBResponse {
    fn from(a: Achievement) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            code: a.code,
            title: a.title,
            description: a.description,
            icon: a.icon,
            xp: a.xp,
            earned_at: a.earned_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct WordOrigin {
    id: WordOriginId,
    word: String,
    language: String,
    original_form: String,
    transliteration: String,
    meaning: String,
    definition: String,
    prefix: String,
    prefix_meaning: String,
    root: String,
    root_meaning: String,
    suffix: String,
    suffix_meaning: String,
    historical_context: String,
    difficulty_level: i32,
    search_count: i64,
    is_featured: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WordOrigin> for WordOriginDBResponse {
    fn from(w: WordOrigin) -> Self {
        Self {
            id: w.id,
            word: w.word,
            language: w.language,
            original_form: w.original_form,
            transliteration: w.transliteration,
            meaning: w.meaning,
            definition: w.definition,
            prefix: w.prefix,
            prefix_meaning: w.prefix_meaning,
            root: w.root,
            root_meaning: w.root_meaning,
            suffix: w.suffix,
            suffix_meaning: w.suffix_meaning,
            historical_context: w.historical_context,
            difficulty_level: w.difficulty_level,
            search_count: w.search_count,
            is_featured: w.is_featured,
            is_active: w.is_active,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct Analysis {
    id: AnalysisId,
    word: String,
    user_id: Option<UserId>,
    word_origin_id: Option<WordOriginId>,
    status: String,
    raw_response: String,
    processed_data: serde_json::Value,
    original_language: String,
    original_form: String,
    transliteration: String,
    prefix: String,
    prefix_meaning: String,
    root: String,
    root_meaning: String,
    suffix: String,
    suffix_meaning: String,
    etymology_explanation: String,
    historical_context: String,
    modern_usage: String,
    related_words: Json<Vec<String>>,
    model_used: String,
    tokens_used: i32,
    processing_time_ms: i64,
    cost_usd: f64,
    confidence_score: f64,
    is_validated: bool,
    validation_notes: String,
    view_count: i64,
    last_viewed: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<Analysis> for AnalysisDBResponse {
    type Error = DbError;

    fn try_from(a: Analysis) -> Result<Self> {
        Ok(Self {
            id: a.id,
            word: a.word,
            user_id: a.user_id,
            word_origin_id: a.word_origin_id,
            status: parse_column(&a.status)?,
            raw_response: a.raw_response,
            processed_data: a.processed_data,
            original_language: a.original_language,
            original_form: a.original_form,
            transliteration: a.transliteration,
            prefix: a.prefix,
            prefix_meaning: a.prefix_meaning,
            root: a.root,
            root_meaning: a.root_meaning,
            suffix: a.suffix,
            suffix_meaning: a.suffix_meaning,
            etymology_explanation: a.etymology_explanation,
            historical_context: a.historical_context,
            modern_usage: a.modern_usage,
            related_words: a.related_words.0,
            model_used: a.model_used,
            tokens_used: a.tokens_used,
            processing_time_ms: a.processing_time_ms,
            cost_usd: a.cost_usd,
            confidence_score: a.confidence_score,
            is_validated: a.is_validated,
            validation_notes: a.validation_notes,
            view_count: a.view_count,
            last_viewed: a.last_viewed,
            created_at: a.created_at,
            updated_at: a.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct Correction {
    id: CorrectionId,
    analysis_id: AnalysisId,
    user_id: UserId,
    field_name: String,
    original_value: String,
    corrected_value: String,
    explanation: String,
    is_approved: bool,
    reviewed_by: Option<UserId>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<Correction> for CorrectionDBResponse {
    type Error = DbError;

    fn try_from(c: Correction) -> Result<Self> {
        Ok(Self {
            id: c.id,
            analysis_id: c.analysis_id,
            user_id: c.user_id,
            field_name: parse_column(&c.field_name)?,
            original_value: c.original_value,
            corrected_value: c.corrected_value,
            explanation: c.explanation,
            is_approved: c.is_approved,
            reviewed_by: c.reviewed_by,
            reviewed_at: c.reviewed_at,
            created_at: c.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct Bookmark {
    id: BookmarkId,
    user_id: UserId,
    analysis_id: AnalysisId,
    notes: String,
    created_at: DateTime<Utc>,
}

impl From<Bookmark> for BookmarkDBResponse {
    fn from(b: Bookmark) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            analysis_id: b.analysis_id,
            notes: b.notes,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PopularSearch {
    id: Uuid,
    word: String,
    search_count: i64,
    daily_searches: i64,
    weekly_searches: i64,
    monthly_searches: i64,
    difficulty_level: i32,
    categories: Json<Vec<String>>,
    last_searched: DateTime<Utc>,
}

impl From<PopularSearch> for PopularSearchDBResponse {
    fn from(p: PopularSearch) -> Self {
        Self {
            id: p.id,
            word: p.word,
            search_count: p.search_count,
            daily_searches: p.daily_searches,
            weekly_searches: p.weekly_searches,
            monthly_searches: p.monthly_searches,
            difficulty_level: p.difficulty_level,
            categories: p.categories.0,
            last_searched: p.last_searched,
        }
    }
}

#[derive(Debug, FromRow)]
struct FeaturedWord {
    id: Uuid,
    word_origin_id: WordOriginId,
    word: String,
    language: String,
    original_form: String,
    meaning: String,
    display_order: i32,
    custom_title: String,
    custom_description: String,
}

impl From<FeaturedWord> for FeaturedWordDBResponse {
    fn from(f: FeaturedWord) -> Self {
        Self {
            id: f.id,
            word_origin_id: f.word_origin_id,
            word: f.word,
            language: f.language,
            original_form: f.original_form,
            meaning: f.meaning,
            display_order: f.display_order,
            custom_title: f.custom_title,
            custom_description: f.custom_description,
        }
    }
}

#[derive(Debug, FromRow)]
struct Challenge {
    id: ChallengeId,
    title: String,
    description: String,
    challenge_type: String,
    difficulty: String,
    xp_reward: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<Challenge> for ChallengeDBResponse {
    type Error = DbError;

    fn try_from(c: Challenge) -> Result<Self> {
        Ok(Self {
            id: c.id,
            title: c.title,
            description: c.description,
            challenge_type: parse_column(&c.challenge_type)?,
            difficulty: parse_column(&c.difficulty)?,
            xp_reward: c.xp_reward,
            is_active: c.is_active,
            created_at: c.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserChallenge {
    id: Uuid,
    user_id: UserId,
    challenge_id: ChallengeId,
    completed: bool,
    score: i32,
    completed_at: Option<DateTime<Utc>>,
}

impl From<UserChallenge> for UserChallengeDBResponse {
    fn from(u: UserChallenge) -> Self {
        Self {
            id: u.id,
            user_id: u.user_id,
            challenge_id: u.challenge_id,
            completed: u.completed,
            score: u.score,
            completed_at: u.completed_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ChallengeProgressRow {
    #[sqlx(flatten)]
    challenge: Challenge,
    progress_id: Option<Uuid>,
    progress_completed: Option<bool>,
    progress_score: Option<i32>,
    progress_completed_at: Option<DateTime<Utc>>,
}

const ANALYSIS_COLUMNS: &str = "id, word, user_id, word_origin_id, status, raw_response, processed_data, \
     original_language, original_form, transliteration, prefix, prefix_meaning, root, root_meaning, \
     suffix, suffix_meaning, etymology_explanation, historical_context, modern_usage, related_words, \
     model_used, tokens_used, processing_time_ms, cost_usd, confidence_score, is_validated, \
     validation_notes, view_count, last_viewed, created_at, updated_at";

/// PostgreSQL implementation of the [`Store`] trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, username, password_hash, user_type, is_staff, institution)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(request.user_type.as_str())
        .bind(request.is_staff)
        .bind(&request.institution)
        .fetch_one(&self.pool)
        .await?;

        user.try_into()
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserDBResponse>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn add_xp(&self, id: UserId, amount: i32) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET xp = LEAST(GREATEST(xp::BIGINT + $2, 0), 2147483647)::INTEGER, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        user.try_into()
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update_progress(&self, id: UserId, request: &UserProgressUpdateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET level = GREATEST(level, $2), streak_days = $3, last_activity = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.level)
        .bind(request.streak_days)
        .bind(request.last_activity)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        user.try_into()
    }

    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn grant_achievement(&self, request: &AchievementCreateDBRequest) -> Result<Option<AchievementDBResponse>> {
        let achievement = sqlx::query_as::<_, Achievement>(
            r#"
            INSERT INTO achievements (id, user_id, code, title, description, icon, xp)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, code) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.code)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.icon)
        .bind(request.xp)
        .fetch_optional(&self.pool)
        .await?;

        Ok(achievement.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn list_achievements(&self, user_id: UserId) -> Result<Vec<AchievementDBResponse>> {
        let rows = sqlx::query_as::<_, Achievement>("SELECT * FROM achievements WHERE user_id = $1 ORDER BY earned_at")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait::async_trait]
impl WordStore for PgStore {
    #[instrument(skip(self), err)]
    async fn get_word_origin(&self, id: WordOriginId) -> Result<Option<WordOriginDBResponse>> {
        let row = sqlx::query_as::<_, WordOrigin>("SELECT * FROM word_origins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn get_word_origin_by_word(&self, word: &str) -> Result<Option<WordOriginDBResponse>> {
        let row = sqlx::query_as::<_, WordOrigin>("SELECT * FROM word_origins WHERE word = $1")
            .bind(word)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait::async_trait]
impl AnalysisStore for PgStore {
    #[instrument(skip(self, request, origin), fields(word = %request.word, status = %request.status), err)]
    async fn upsert_analysis(
        &self,
        request: &AnalysisUpsertDBRequest,
        origin: Option<&WordOriginCreateDBRequest>,
    ) -> Result<AnalysisDBResponse> {
        let mut tx = self.pool.begin().await?;

        let word_origin_id: Option<WordOriginId> = match origin {
            Some(origin) => Some(
                sqlx::query_scalar(
                    r#"
                    INSERT INTO word_origins (
                        id, word, language, original_form, transliteration, meaning, definition,
                        prefix, prefix_meaning, root, root_meaning, suffix, suffix_meaning,
                        historical_context, search_count
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 1)
                    ON CONFLICT (word) DO UPDATE
                        SET search_count = word_origins.search_count + 1, updated_at = NOW()
                    RETURNING id
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(&origin.word)
                .bind(&origin.language)
                .bind(&origin.original_form)
                .bind(&origin.transliteration)
                .bind(&origin.meaning)
                .bind(&origin.definition)
                .bind(&origin.prefix)
                .bind(&origin.prefix_meaning)
                .bind(&origin.root)
                .bind(&origin.root_meaning)
                .bind(&origin.suffix)
                .bind(&origin.suffix_meaning)
                .bind(&origin.historical_context)
                .fetch_one(&mut *tx)
                .await?,
            ),
            None => None,
        };

        let query = format!(
            r#"
            INSERT INTO etymology_analyses (
                id, word, user_id, word_origin_id, status, raw_response, processed_data,
                original_language, original_form, transliteration, prefix, prefix_meaning,
                root, root_meaning, suffix, suffix_meaning, etymology_explanation,
                historical_context, modern_usage, related_words, model_used, tokens_used,
                processing_time_ms, cost_usd, confidence_score
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22, $23, $24, $25)
            ON CONFLICT (word, user_id) DO UPDATE SET
                word_origin_id = COALESCE(EXCLUDED.word_origin_id, etymology_analyses.word_origin_id),
                status = EXCLUDED.status,
                raw_response = EXCLUDED.raw_response,
                processed_data = EXCLUDED.processed_data,
                original_language = EXCLUDED.original_language,
                original_form = EXCLUDED.original_form,
                transliteration = EXCLUDED.transliteration,
                prefix = EXCLUDED.prefix,
                prefix_meaning = EXCLUDED.prefix_meaning,
                root = EXCLUDED.root,
                root_meaning = EXCLUDED.root_meaning,
                suffix = EXCLUDED.suffix,
                suffix_meaning = EXCLUDED.suffix_meaning,
                etymology_explanation = EXCLUDED.etymology_explanation,
                historical_context = EXCLUDED.historical_context,
                modern_usage = EXCLUDED.modern_usage,
                related_words = EXCLUDED.related_words,
                model_used = EXCLUDED.model_used,
                tokens_used = EXCLUDED.tokens_used,
                processing_time_ms = EXCLUDED.processing_time_ms,
                cost_usd = EXCLUDED.cost_usd,
                confidence_score = EXCLUDED.confidence_score,
                updated_at = NOW()
            RETURNING {ANALYSIS_COLUMNS}
            "#
        );

        let analysis = sqlx::query_as::<_, Analysis>(&query)
            .bind(Uuid::new_v4())
            .bind(&request.word)
            .bind(request.user_id)
            .bind(word_origin_id)
            .bind(request.status.as_str())
            .bind(&request.raw_response)
            .bind(&request.processed_data)
            .bind(&request.original_language)
            .bind(&request.original_form)
            .bind(&request.transliteration)
            .bind(&request.prefix)
            .bind(&request.prefix_meaning)
            .bind(&request.root)
            .bind(&request.root_meaning)
            .bind(&request.suffix)
            .bind(&request.suffix_meaning)
            .bind(&request.etymology_explanation)
            .bind(&request.historical_context)
            .bind(&request.modern_usage)
            .bind(Json(&request.related_words))
            .bind(&request.model_used)
            .bind(request.tokens_used)
            .bind(request.processing_time_ms)
            .bind(request.cost_usd)
            .bind(request.confidence_score)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        analysis.try_into()
    }

    #[instrument(skip(self), fields(analysis_id = %abbrev_uuid(&id)), err)]
    async fn get_analysis(&self, id: AnalysisId) -> Result<Option<AnalysisDBResponse>> {
        let query = format!("SELECT {ANALYSIS_COLUMNS} FROM etymology_analyses WHERE id = $1");
        sqlx::query_as::<_, Analysis>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_analysis(&self, word: &str, user_id: Option<UserId>) -> Result<Option<AnalysisDBResponse>> {
        let query = format!("SELECT {ANALYSIS_COLUMNS} FROM etymology_analyses WHERE word = $1 AND user_id IS NOT DISTINCT FROM $2");
        sqlx::query_as::<_, Analysis>(&query)
            .bind(word)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    async fn list_analyses(&self, filter: &AnalysisFilter) -> Result<Vec<AnalysisDBResponse>> {
        let query = format!(
            "SELECT {ANALYSIS_COLUMNS} FROM etymology_analyses WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC OFFSET $2 LIMIT $3"
        );
        let rows = sqlx::query_as::<_, Analysis>(&query)
            .bind(filter.user_id)
            .bind(filter.skip)
            .bind(filter.limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self), fields(analysis_id = %abbrev_uuid(&id)), err)]
    async fn record_view(&self, id: AnalysisId) -> Result<AnalysisDBResponse> {
        let query = format!(
            "UPDATE etymology_analyses SET view_count = view_count + 1, last_viewed = NOW() \
             WHERE id = $1 RETURNING {ANALYSIS_COLUMNS}"
        );
        sqlx::query_as::<_, Analysis>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?
            .try_into()
    }
}

#[async_trait::async_trait]
impl CorrectionStore for PgStore {
    #[instrument(skip(self, request), fields(field = %request.field_name.column()), err)]
    async fn create_correction(&self, request: &CorrectionCreateDBRequest) -> Result<CorrectionDBResponse> {
        sqlx::query_as::<_, Correction>(
            r#"
            INSERT INTO etymology_corrections (id, analysis_id, user_id, field_name, original_value, corrected_value, explanation)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.analysis_id)
        .bind(request.user_id)
        .bind(request.field_name.column())
        .bind(&request.original_value)
        .bind(&request.corrected_value)
        .bind(&request.explanation)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    #[instrument(skip(self), err)]
    async fn get_correction(&self, id: CorrectionId) -> Result<Option<CorrectionDBResponse>> {
        sqlx::query_as::<_, Correction>("SELECT * FROM etymology_corrections WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_corrections(&self, analysis_id: AnalysisId) -> Result<Vec<CorrectionDBResponse>> {
        let rows = sqlx::query_as::<_, Correction>("SELECT * FROM etymology_corrections WHERE analysis_id = $1 ORDER BY created_at DESC")
            .bind(analysis_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self), fields(correction_id = %abbrev_uuid(&id)), err)]
    async fn approve_correction(&self, id: CorrectionId, reviewer: UserId) -> Result<CorrectionDBResponse> {
        let mut tx = self.pool.begin().await?;

        let correction = sqlx::query_as::<_, Correction>(
            r#"
            UPDATE etymology_corrections
            SET is_approved = TRUE, reviewed_by = $2, reviewed_at = NOW()
            WHERE id = $1 AND is_approved = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reviewer)
        .fetch_optional(&mut *tx)
        .await?;

        let correction: CorrectionDBResponse = match correction {
            Some(row) => row.try_into()?,
            None => {
                let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM etymology_corrections WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
                return Err(if exists {
                    DbError::unique("etymology_corrections", "etymology_corrections_approved")
                } else {
                    DbError::NotFound
                });
            }
        };

        // Column names come from the CorrectableField allow-list, never from user input
        let field = correction.field_name;
        let column = field.column();
        let update_analysis = format!(
            "UPDATE etymology_analyses \
             SET {column} = $2, processed_data = jsonb_set(processed_data, '{{{column}}}', to_jsonb($2::text)), updated_at = NOW() \
             WHERE id = $1 RETURNING word_origin_id"
        );
        let word_origin_id: Option<WordOriginId> = sqlx::query_scalar(&update_analysis)
            .bind(correction.analysis_id)
            .bind(&correction.corrected_value)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        if let (Some(origin_id), Some(column)) = (word_origin_id, field.word_origin_column()) {
            let update_origin = format!("UPDATE word_origins SET {column} = $2, updated_at = NOW() WHERE id = $1");
            sqlx::query(&update_origin)
                .bind(origin_id)
                .bind(&correction.corrected_value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(correction)
    }
}

#[async_trait::async_trait]
impl BookmarkStore for PgStore {
    #[instrument(skip(self, request), err)]
    async fn create_bookmark(&self, request: &BookmarkCreateDBRequest) -> Result<BookmarkDBResponse> {
        let row = sqlx::query_as::<_, Bookmark>(
            "INSERT INTO etymology_bookmarks (id, user_id, analysis_id, notes) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.analysis_id)
        .bind(&request.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn get_bookmark(&self, id: BookmarkId) -> Result<Option<BookmarkDBResponse>> {
        let row = sqlx::query_as::<_, Bookmark>("SELECT * FROM etymology_bookmarks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn list_bookmarks(&self, user_id: UserId) -> Result<Vec<BookmarkDBResponse>> {
        let rows = sqlx::query_as::<_, Bookmark>("SELECT * FROM etymology_bookmarks WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, notes), err)]
    async fn update_bookmark_notes(&self, id: BookmarkId, notes: &str) -> Result<BookmarkDBResponse> {
        let row = sqlx::query_as::<_, Bookmark>("UPDATE etymology_bookmarks SET notes = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(notes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn delete_bookmark(&self, id: BookmarkId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM etymology_bookmarks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn is_bookmarked(&self, user_id: UserId, analysis_id: AnalysisId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM etymology_bookmarks WHERE user_id = $1 AND analysis_id = $2)")
            .bind(user_id)
            .bind(analysis_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait::async_trait]
impl SearchStore for PgStore {
    #[instrument(skip(self), err)]
    async fn record_search(&self, word: &str) -> Result<PopularSearchDBResponse> {
        let row = sqlx::query_as::<_, PopularSearch>(
            r#"
            INSERT INTO popular_searches (id, word, search_count, daily_searches, weekly_searches, monthly_searches)
            VALUES ($1, LOWER($2), 1, 1, 1, 1)
            ON CONFLICT (word) DO UPDATE SET
                search_count = popular_searches.search_count + 1,
                daily_searches = popular_searches.daily_searches + 1,
                weekly_searches = popular_searches.weekly_searches + 1,
                monthly_searches = popular_searches.monthly_searches + 1,
                last_searched = NOW()
            RETURNING id, word, search_count, daily_searches, weekly_searches, monthly_searches,
                      difficulty_level, categories, last_searched
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(word)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn list_popular(&self, limit: i64) -> Result<Vec<PopularSearchDBResponse>> {
        let rows = sqlx::query_as::<_, PopularSearch>(
            r#"
            SELECT id, word, search_count, daily_searches, weekly_searches, monthly_searches,
                   difficulty_level, categories, last_searched
            FROM popular_searches
            ORDER BY search_count DESC, word
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), err)]
    async fn feature_word(&self, request: &FeaturedWordCreateDBRequest) -> Result<FeaturedWordDBResponse> {
        let mut tx = self.pool.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO featured_words (id, word_origin_id, display_order, custom_title, custom_description, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.word_origin_id)
        .bind(request.display_order)
        .bind(&request.custom_title)
        .bind(&request.custom_description)
        .bind(request.start_date)
        .bind(request.end_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE word_origins SET is_featured = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(request.word_origin_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, FeaturedWord>(
            r#"
            SELECT f.id, f.word_origin_id, w.word, w.language, w.original_form, w.meaning,
                   f.display_order, f.custom_title, f.custom_description
            FROM featured_words f
            JOIN word_origins w ON w.id = f.word_origin_id
            WHERE f.id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn list_featured(&self, now: DateTime<Utc>) -> Result<Vec<FeaturedWordDBResponse>> {
        let rows = sqlx::query_as::<_, FeaturedWord>(
            r#"
            SELECT f.id, f.word_origin_id, w.word, w.language, w.original_form, w.meaning,
                   f.display_order, f.custom_title, f.custom_description
            FROM featured_words f
            JOIN word_origins w ON w.id = f.word_origin_id
            WHERE f.is_active
              AND (f.start_date IS NULL OR f.start_date <= $1)
              AND (f.end_date IS NULL OR f.end_date >= $1)
            ORDER BY f.display_order
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait::async_trait]
impl ChallengeStore for PgStore {
    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create_challenge(&self, request: &ChallengeCreateDBRequest) -> Result<ChallengeDBResponse> {
        sqlx::query_as::<_, Challenge>(
            r#"
            INSERT INTO challenges (id, title, description, challenge_type, difficulty, xp_reward)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.challenge_type.as_str())
        .bind(request.difficulty.as_str())
        .bind(request.xp_reward)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    #[instrument(skip(self), err)]
    async fn get_challenge(&self, id: ChallengeId) -> Result<Option<ChallengeDBResponse>> {
        sqlx::query_as::<_, Challenge>("SELECT * FROM challenges WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_active_challenges(&self, user_id: UserId) -> Result<Vec<ChallengeWithProgress>> {
        let rows = sqlx::query_as::<_, ChallengeProgressRow>(
            r#"
            SELECT c.*,
                   uc.id AS progress_id,
                   uc.completed AS progress_completed,
                   uc.score AS progress_score,
                   uc.completed_at AS progress_completed_at
            FROM challenges c
            LEFT JOIN user_challenges uc ON uc.challenge_id = c.id AND uc.user_id = $1
            WHERE c.is_active
            ORDER BY c.created_at, c.title
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<ChallengeWithProgress> {
                let challenge: ChallengeDBResponse = row.challenge.try_into()?;
                let progress = row.progress_id.map(|id| UserChallengeDBResponse {
                    id,
                    user_id,
                    challenge_id: challenge.id,
                    completed: row.progress_completed.unwrap_or(false),
                    score: row.progress_score.unwrap_or(0),
                    completed_at: row.progress_completed_at,
                });
                Ok(ChallengeWithProgress { challenge, progress })
            })
            .collect()
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    async fn complete_challenge(&self, user_id: UserId, challenge_id: ChallengeId, score: i32) -> Result<UserChallengeDBResponse> {
        let row = sqlx::query_as::<_, UserChallenge>(
            r#"
            INSERT INTO user_challenges (id, user_id, challenge_id, completed, score, completed_at)
            VALUES ($1, $2, $3, TRUE, $4, NOW())
            ON CONFLICT (user_id, challenge_id) DO UPDATE
                SET completed = TRUE, score = EXCLUDED.score, completed_at = EXCLUDED.completed_at
                WHERE user_challenges.completed = FALSE
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(challenge_id)
        .bind(score)
        .fetch_optional(&self.pool)
        .await?
        // The conditional upsert returns nothing when the row was already completed
        .ok_or_else(|| DbError::unique("user_challenges", "user_challenges_user_challenge_unique"))?;

        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn count_completed_challenges(&self, user_id: UserId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_challenges WHERE user_id = $1 AND completed")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait::async_trait]
impl UsageStore for PgStore {
    #[instrument(skip(self, request), fields(service = %request.service, endpoint = %request.endpoint), err)]
    async fn log_api_usage(&self, request: &ApiUsageCreateDBRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO api_usage (
                id, service, endpoint, request_data, response_data, tokens_used, cost_usd,
                response_time_ms, success, error_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.service)
        .bind(&request.endpoint)
        .bind(&request.request_data)
        .bind(&request.response_data)
        .bind(request.tokens_used)
        .bind(request.cost_usd)
        .bind(request.response_time_ms)
        .bind(request.success)
        .bind(&request.error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct Counts {
    users: i64,
    word_origins: i64,
    analyses: i64,
    featured_words: i64,
    challenges: i64,
    completed_challenges: i64,
    api_calls_total: i64,
    api_calls_today: i64,
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn system_counts(&self, since: DateTime<Utc>) -> Result<SystemCounts> {
        let counts = sqlx::query_as::<_, Counts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM word_origins) AS word_origins,
                (SELECT COUNT(*) FROM etymology_analyses) AS analyses,
                (SELECT COUNT(*) FROM featured_words WHERE is_active) AS featured_words,
                (SELECT COUNT(*) FROM challenges WHERE is_active) AS challenges,
                (SELECT COUNT(*) FROM user_challenges WHERE completed) AS completed_challenges,
                (SELECT COUNT(*) FROM api_usage) AS api_calls_total,
                (SELECT COUNT(*) FROM api_usage WHERE created_at >= $1) AS api_calls_today
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(SystemCounts {
            users: counts.users,
            word_origins: counts.word_origins,
            analyses: counts.analyses,
            featured_words: counts.featured_words,
            challenges: counts.challenges,
            completed_challenges: counts.completed_challenges,
            api_calls_total: counts.api_calls_total,
            api_calls_today: counts.api_calls_today,
        })
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
