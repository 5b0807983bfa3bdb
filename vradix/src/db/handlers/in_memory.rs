//! In-memory store implementation.
//!
//! All tables live behind a single lock, so multi-table writes (analysis + word origin,
//! correction approval) are atomic. Suitable for tests and single-process deployments; records
//! are lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{AnalysisStore, BookmarkStore, ChallengeStore, CorrectionStore, SearchStore, Store, UsageStore, UserStore, WordStore};
use crate::db::{
    errors::{DbError, Result},
    models::{
        analyses::{AnalysisDBResponse, AnalysisFilter, AnalysisUpsertDBRequest},
        bookmarks::{BookmarkCreateDBRequest, BookmarkDBResponse},
        challenges::{ChallengeCreateDBRequest, ChallengeDBResponse, ChallengeWithProgress, UserChallengeDBResponse},
        corrections::{CorrectableField, CorrectionCreateDBRequest, CorrectionDBResponse},
        searches::{FeaturedWordCreateDBRequest, FeaturedWordDBResponse, PopularSearchDBResponse},
        usage::{ApiUsageCreateDBRequest, ApiUsageDBResponse, SystemCounts},
        users::{AchievementCreateDBRequest, AchievementDBResponse, UserCreateDBRequest, UserDBResponse, UserProgressUpdateDBRequest},
        words::{WordOriginCreateDBRequest, WordOriginDBResponse},
    },
};
use crate::types::{AnalysisId, BookmarkId, ChallengeId, CorrectionId, UserId, WordOriginId};

#[derive(Debug, Clone)]
struct FeaturedRow {
    id: Uuid,
    word_origin_id: WordOriginId,
    display_order: i32,
    is_active: bool,
    custom_title: String,
    custom_description: String,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserDBResponse>,
    achievements: Vec<AchievementDBResponse>,
    word_origins: HashMap<WordOriginId, WordOriginDBResponse>,
    analyses: HashMap<AnalysisId, AnalysisDBResponse>,
    corrections: HashMap<CorrectionId, CorrectionDBResponse>,
    bookmarks: HashMap<BookmarkId, BookmarkDBResponse>,
    searches: HashMap<String, PopularSearchDBResponse>,
    featured: Vec<FeaturedRow>,
    challenges: HashMap<ChallengeId, ChallengeDBResponse>,
    user_challenges: Vec<UserChallengeDBResponse>,
    api_usage: Vec<ApiUsageDBResponse>,
}

impl Tables {
    fn user_mut(&mut self, id: UserId) -> Result<&mut UserDBResponse> {
        self.users.get_mut(&id).ok_or(DbError::NotFound)
    }

    fn featured_response(&self, row: &FeaturedRow) -> Option<FeaturedWordDBResponse> {
        let origin = self.word_origins.get(&row.word_origin_id)?;
        Some(FeaturedWordDBResponse {
            id: row.id,
            word_origin_id: row.word_origin_id,
            word: origin.word.clone(),
            language: origin.language.clone(),
            original_form: origin.original_form.clone(),
            meaning: origin.meaning.clone(),
            display_order: row.display_order,
            custom_title: row.custom_title.clone(),
            custom_description: row.custom_description.clone(),
        })
    }
}

/// In-memory implementation of the [`Store`] trait.
///
/// # Example
/// ```ignore
/// let store = InMemoryStore::new();
/// let user = store.create_user(&request).await?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn set_analysis_field(analysis: &mut AnalysisDBResponse, field: CorrectableField, value: &str) {
    let slot = match field {
        CorrectableField::OriginalLanguage => &mut analysis.original_language,
        CorrectableField::OriginalForm => &mut analysis.original_form,
        CorrectableField::Transliteration => &mut analysis.transliteration,
        CorrectableField::Prefix => &mut analysis.prefix,
        CorrectableField::PrefixMeaning => &mut analysis.prefix_meaning,
        CorrectableField::Root => &mut analysis.root,
        CorrectableField::RootMeaning => &mut analysis.root_meaning,
        CorrectableField::Suffix => &mut analysis.suffix,
        CorrectableField::SuffixMeaning => &mut analysis.suffix_meaning,
        CorrectableField::EtymologyExplanation => &mut analysis.etymology_explanation,
        CorrectableField::HistoricalContext => &mut analysis.historical_context,
        CorrectableField::ModernUsage => &mut analysis.modern_usage,
    };
    *slot = value.to_string();
}

fn set_word_origin_field(origin: &mut WordOriginDBResponse, field: CorrectableField, value: &str) {
    let slot = match field {
        CorrectableField::OriginalLanguage => &mut origin.language,
        CorrectableField::OriginalForm => &mut origin.original_form,
        CorrectableField::Transliteration => &mut origin.transliteration,
        CorrectableField::Prefix => &mut origin.prefix,
        CorrectableField::PrefixMeaning => &mut origin.prefix_meaning,
        CorrectableField::Root => &mut origin.root,
        CorrectableField::RootMeaning => &mut origin.root_meaning,
        CorrectableField::Suffix => &mut origin.suffix,
        CorrectableField::SuffixMeaning => &mut origin.suffix_meaning,
        CorrectableField::HistoricalContext => &mut origin.historical_context,
        CorrectableField::EtymologyExplanation | CorrectableField::ModernUsage => return,
    };
    *slot = value.to_string();
}

#[async_trait::async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();

        if tables.users.values().any(|u| u.email == request.email) {
            return Err(DbError::unique("users", "users_email_unique"));
        }
        if tables.users.values().any(|u| u.username == request.username) {
            return Err(DbError::unique("users", "users_username_unique"));
        }

        let now = Utc::now();
        let user = UserDBResponse {
            id: Uuid::new_v4(),
            email: request.email.clone(),
            username: request.username.clone(),
            password_hash: request.password_hash.clone(),
            user_type: request.user_type,
            is_staff: request.is_staff,
            xp: 0,
            level: 1,
            streak_days: 0,
            last_activity: None,
            institution: request.institution.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        Ok(self.tables.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserDBResponse>> {
        Ok(self.tables.read().users.values().find(|u| u.username == username).cloned())
    }

    async fn add_xp(&self, id: UserId, amount: i32) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        let user = tables.user_mut(id)?;
        user.xp = user.xp.saturating_add(amount).max(0);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_progress(&self, id: UserId, request: &UserProgressUpdateDBRequest) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        let user = tables.user_mut(id)?;
        user.level = user.level.max(request.level);
        user.streak_days = request.streak_days;
        user.last_activity = Some(request.last_activity);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn grant_achievement(&self, request: &AchievementCreateDBRequest) -> Result<Option<AchievementDBResponse>> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&request.user_id) {
            return Err(DbError::missing_reference("achievements", "achievements_user_id_fkey"));
        }
        if tables
            .achievements
            .iter()
            .any(|a| a.user_id == request.user_id && a.code == request.code)
        {
            return Ok(None);
        }

        let achievement = AchievementDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            code: request.code.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            icon: request.icon.clone(),
            xp: request.xp,
            earned_at: Utc::now(),
        };
        tables.achievements.push(achievement.clone());
        Ok(Some(achievement))
    }

    async fn list_achievements(&self, user_id: UserId) -> Result<Vec<AchievementDBResponse>> {
        let tables = self.tables.read();
        let mut achievements: Vec<_> = tables.achievements.iter().filter(|a| a.user_id == user_id).cloned().collect();
        achievements.sort_by_key(|a| a.earned_at);
        Ok(achievements)
    }
}

#[async_trait::async_trait]
impl WordStore for InMemoryStore {
    async fn get_word_origin(&self, id: WordOriginId) -> Result<Option<WordOriginDBResponse>> {
        Ok(self.tables.read().word_origins.get(&id).cloned())
    }

    async fn get_word_origin_by_word(&self, word: &str) -> Result<Option<WordOriginDBResponse>> {
        Ok(self.tables.read().word_origins.values().find(|w| w.word == word).cloned())
    }
}

#[async_trait::async_trait]
impl AnalysisStore for InMemoryStore {
    async fn upsert_analysis(
        &self,
        request: &AnalysisUpsertDBRequest,
        origin: Option<&WordOriginCreateDBRequest>,
    ) -> Result<AnalysisDBResponse> {
        let mut tables = self.tables.write();
        let now = Utc::now();

        if let Some(user_id) = request.user_id
            && !tables.users.contains_key(&user_id)
        {
            return Err(DbError::missing_reference("etymology_analyses", "etymology_analyses_user_id_fkey"));
        }

        let word_origin_id = match origin {
            Some(origin) => {
                let existing = tables.word_origins.values_mut().find(|w| w.word == origin.word);
                let id = match existing {
                    Some(existing) => {
                        existing.search_count += 1;
                        existing.updated_at = now;
                        existing.id
                    }
                    None => {
                        let created = WordOriginDBResponse {
                            id: Uuid::new_v4(),
                            word: origin.word.clone(),
                            language: origin.language.clone(),
                            original_form: origin.original_form.clone(),
                            transliteration: origin.transliteration.clone(),
                            meaning: origin.meaning.clone(),
                            definition: origin.definition.clone(),
                            prefix: origin.prefix.clone(),
                            prefix_meaning: origin.prefix_meaning.clone(),
                            root: origin.root.clone(),
                            root_meaning: origin.root_meaning.clone(),
                            suffix: origin.suffix.clone(),
                            suffix_meaning: origin.suffix_meaning.clone(),
                            historical_context: origin.historical_context.clone(),
                            difficulty_level: 1,
                            search_count: 1,
                            is_featured: false,
                            is_active: true,
                            created_at: now,
                            updated_at: now,
                        };
                        let id = created.id;
                        tables.word_origins.insert(id, created);
                        id
                    }
                };
                Some(id)
            }
            None => None,
        };

        let existing = tables
            .analyses
            .values()
            .find(|a| a.word == request.word && a.user_id == request.user_id)
            .map(|a| (a.id, a.word_origin_id, a.view_count, a.last_viewed, a.created_at, a.is_validated, a.validation_notes.clone()));

        let (id, previous_origin, view_count, last_viewed, created_at, is_validated, validation_notes) =
            existing.unwrap_or((Uuid::new_v4(), None, 0, None, now, false, String::new()));

        let analysis = AnalysisDBResponse {
            id,
            word: request.word.clone(),
            user_id: request.user_id,
            word_origin_id: word_origin_id.or(previous_origin),
            status: request.status,
            raw_response: request.raw_response.clone(),
            processed_data: request.processed_data.clone(),
            original_language: request.original_language.clone(),
            original_form: request.original_form.clone(),
            transliteration: request.transliteration.clone(),
            prefix: request.prefix.clone(),
            prefix_meaning: request.prefix_meaning.clone(),
            root: request.root.clone(),
            root_meaning: request.root_meaning.clone(),
            suffix: request.suffix.clone(),
            suffix_meaning: request.suffix_meaning.clone(),
            etymology_explanation: request.etymology_explanation.clone(),
            historical_context: request.historical_context.clone(),
            modern_usage: request.modern_usage.clone(),
            related_words: request.related_words.clone(),
            model_used: request.model_used.clone(),
            tokens_used: request.tokens_used,
            processing_time_ms: request.processing_time_ms,
            cost_usd: request.cost_usd,
            confidence_score: request.confidence_score,
            is_validated,
            validation_notes,
            view_count,
            last_viewed,
            created_at,
            updated_at: now,
        };
        tables.analyses.insert(id, analysis.clone());
        Ok(analysis)
    }

    async fn get_analysis(&self, id: AnalysisId) -> Result<Option<AnalysisDBResponse>> {
        Ok(self.tables.read().analyses.get(&id).cloned())
    }

    async fn find_analysis(&self, word: &str, user_id: Option<UserId>) -> Result<Option<AnalysisDBResponse>> {
        Ok(self
            .tables
            .read()
            .analyses
            .values()
            .find(|a| a.word == word && a.user_id == user_id)
            .cloned())
    }

    async fn list_analyses(&self, filter: &AnalysisFilter) -> Result<Vec<AnalysisDBResponse>> {
        let tables = self.tables.read();
        let mut analyses: Vec<_> = tables
            .analyses
            .values()
            .filter(|a| a.user_id == Some(filter.user_id))
            .cloned()
            .collect();
        analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(analyses
            .into_iter()
            .skip(filter.skip.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn record_view(&self, id: AnalysisId) -> Result<AnalysisDBResponse> {
        let mut tables = self.tables.write();
        let analysis = tables.analyses.get_mut(&id).ok_or(DbError::NotFound)?;
        analysis.view_count += 1;
        analysis.last_viewed = Some(Utc::now());
        Ok(analysis.clone())
    }
}

#[async_trait::async_trait]
impl CorrectionStore for InMemoryStore {
    async fn create_correction(&self, request: &CorrectionCreateDBRequest) -> Result<CorrectionDBResponse> {
        let mut tables = self.tables.write();
        if !tables.analyses.contains_key(&request.analysis_id) {
            return Err(DbError::missing_reference(
                "etymology_corrections",
                "etymology_corrections_analysis_id_fkey",
            ));
        }

        let correction = CorrectionDBResponse {
            id: Uuid::new_v4(),
            analysis_id: request.analysis_id,
            user_id: request.user_id,
            field_name: request.field_name,
            original_value: request.original_value.clone(),
            corrected_value: request.corrected_value.clone(),
            explanation: request.explanation.clone(),
            is_approved: false,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        };
        tables.corrections.insert(correction.id, correction.clone());
        Ok(correction)
    }

    async fn get_correction(&self, id: CorrectionId) -> Result<Option<CorrectionDBResponse>> {
        Ok(self.tables.read().corrections.get(&id).cloned())
    }

    async fn list_corrections(&self, analysis_id: AnalysisId) -> Result<Vec<CorrectionDBResponse>> {
        let tables = self.tables.read();
        let mut corrections: Vec<_> = tables
            .corrections
            .values()
            .filter(|c| c.analysis_id == analysis_id)
            .cloned()
            .collect();
        corrections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(corrections)
    }

    async fn approve_correction(&self, id: CorrectionId, reviewer: UserId) -> Result<CorrectionDBResponse> {
        let mut tables = self.tables.write();
        let (analysis_id, field, value) = match tables.corrections.get(&id) {
            Some(c) if c.is_approved => return Err(DbError::unique("etymology_corrections", "etymology_corrections_approved")),
            Some(c) => (c.analysis_id, c.field_name, c.corrected_value.clone()),
            None => return Err(DbError::NotFound),
        };

        let now = Utc::now();
        let analysis = tables.analyses.get_mut(&analysis_id).ok_or(DbError::NotFound)?;
        set_analysis_field(analysis, field, &value);
        if let Some(data) = analysis.processed_data.as_object_mut() {
            data.insert(field.column().to_string(), serde_json::Value::String(value.clone()));
        }
        analysis.updated_at = now;
        let origin_id = analysis.word_origin_id;

        if let Some(origin) = origin_id.and_then(|id| tables.word_origins.get_mut(&id)) {
            set_word_origin_field(origin, field, &value);
            origin.updated_at = now;
        }

        let correction = tables.corrections.get_mut(&id).ok_or(DbError::NotFound)?;
        correction.is_approved = true;
        correction.reviewed_by = Some(reviewer);
        correction.reviewed_at = Some(now);
        Ok(correction.clone())
    }
}

#[async_trait::async_trait]
impl BookmarkStore for InMemoryStore {
    async fn create_bookmark(&self, request: &BookmarkCreateDBRequest) -> Result<BookmarkDBResponse> {
        let mut tables = self.tables.write();
        if !tables.analyses.contains_key(&request.analysis_id) {
            return Err(DbError::missing_reference("etymology_bookmarks", "etymology_bookmarks_analysis_id_fkey"));
        }
        if tables
            .bookmarks
            .values()
            .any(|b| b.user_id == request.user_id && b.analysis_id == request.analysis_id)
        {
            return Err(DbError::unique("etymology_bookmarks", "etymology_bookmarks_user_analysis_unique"));
        }

        let bookmark = BookmarkDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            analysis_id: request.analysis_id,
            notes: request.notes.clone(),
            created_at: Utc::now(),
        };
        tables.bookmarks.insert(bookmark.id, bookmark.clone());
        Ok(bookmark)
    }

    async fn get_bookmark(&self, id: BookmarkId) -> Result<Option<BookmarkDBResponse>> {
        Ok(self.tables.read().bookmarks.get(&id).cloned())
    }

    async fn list_bookmarks(&self, user_id: UserId) -> Result<Vec<BookmarkDBResponse>> {
        let tables = self.tables.read();
        let mut bookmarks: Vec<_> = tables.bookmarks.values().filter(|b| b.user_id == user_id).cloned().collect();
        bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookmarks)
    }

    async fn update_bookmark_notes(&self, id: BookmarkId, notes: &str) -> Result<BookmarkDBResponse> {
        let mut tables = self.tables.write();
        let bookmark = tables.bookmarks.get_mut(&id).ok_or(DbError::NotFound)?;
        bookmark.notes = notes.to_string();
        Ok(bookmark.clone())
    }

    async fn delete_bookmark(&self, id: BookmarkId) -> Result<bool> {
        Ok(self.tables.write().bookmarks.remove(&id).is_some())
    }

    async fn is_bookmarked(&self, user_id: UserId, analysis_id: AnalysisId) -> Result<bool> {
        Ok(self
            .tables
            .read()
            .bookmarks
            .values()
            .any(|b| b.user_id == user_id && b.analysis_id == analysis_id))
    }
}

#[async_trait::async_trait]
impl SearchStore for InMemoryStore {
    async fn record_search(&self, word: &str) -> Result<PopularSearchDBResponse> {
        let mut tables = self.tables.write();
        let now = Utc::now();
        let key = word.to_lowercase();

        let entry = tables
            .searches
            .entry(key.clone())
            .and_modify(|s| {
                s.search_count += 1;
                s.daily_searches += 1;
                s.weekly_searches += 1;
                s.monthly_searches += 1;
                s.last_searched = now;
            })
            .or_insert_with(|| PopularSearchDBResponse {
                id: Uuid::new_v4(),
                word: key,
                search_count: 1,
                daily_searches: 1,
                weekly_searches: 1,
                monthly_searches: 1,
                difficulty_level: 1,
                categories: Vec::new(),
                last_searched: now,
            });
        Ok(entry.clone())
    }

    async fn list_popular(&self, limit: i64) -> Result<Vec<PopularSearchDBResponse>> {
        let tables = self.tables.read();
        let mut searches: Vec<_> = tables.searches.values().cloned().collect();
        searches.sort_by(|a, b| b.search_count.cmp(&a.search_count).then_with(|| a.word.cmp(&b.word)));
        searches.truncate(limit.max(0) as usize);
        Ok(searches)
    }

    async fn feature_word(&self, request: &FeaturedWordCreateDBRequest) -> Result<FeaturedWordDBResponse> {
        let mut tables = self.tables.write();
        if tables.featured.iter().any(|f| f.word_origin_id == request.word_origin_id) {
            return Err(DbError::unique("featured_words", "featured_words_word_origin_unique"));
        }
        let origin = tables
            .word_origins
            .get_mut(&request.word_origin_id)
            .ok_or_else(|| DbError::missing_reference("featured_words", "featured_words_word_origin_id_fkey"))?;
        origin.is_featured = true;

        let row = FeaturedRow {
            id: Uuid::new_v4(),
            word_origin_id: request.word_origin_id,
            display_order: request.display_order,
            is_active: true,
            custom_title: request.custom_title.clone(),
            custom_description: request.custom_description.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
        };
        let response = tables.featured_response(&row).ok_or(DbError::NotFound)?;
        tables.featured.push(row);
        Ok(response)
    }

    async fn list_featured(&self, now: DateTime<Utc>) -> Result<Vec<FeaturedWordDBResponse>> {
        let tables = self.tables.read();
        let mut rows: Vec<_> = tables
            .featured
            .iter()
            .filter(|f| f.is_active)
            .filter(|f| f.start_date.is_none_or(|start| start <= now))
            .filter(|f| f.end_date.is_none_or(|end| end >= now))
            .collect();
        rows.sort_by_key(|f| f.display_order);
        Ok(rows.into_iter().filter_map(|row| tables.featured_response(row)).collect())
    }
}

#[async_trait::async_trait]
impl ChallengeStore for InMemoryStore {
    async fn create_challenge(&self, request: &ChallengeCreateDBRequest) -> Result<ChallengeDBResponse> {
        let challenge = ChallengeDBResponse {
            id: Uuid::new_v4(),
            title: request.title.clone(),
            description: request.description.clone(),
            challenge_type: request.challenge_type,
            difficulty: request.difficulty,
            xp_reward: request.xp_reward,
            is_active: true,
            created_at: Utc::now(),
        };
        self.tables.write().challenges.insert(challenge.id, challenge.clone());
        Ok(challenge)
    }

    async fn get_challenge(&self, id: ChallengeId) -> Result<Option<ChallengeDBResponse>> {
        Ok(self.tables.read().challenges.get(&id).cloned())
    }

    async fn list_active_challenges(&self, user_id: UserId) -> Result<Vec<ChallengeWithProgress>> {
        let tables = self.tables.read();
        let mut challenges: Vec<_> = tables.challenges.values().filter(|c| c.is_active).cloned().collect();
        challenges.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.title.cmp(&b.title)));

        Ok(challenges
            .into_iter()
            .map(|challenge| {
                let progress = tables
                    .user_challenges
                    .iter()
                    .find(|uc| uc.user_id == user_id && uc.challenge_id == challenge.id)
                    .cloned();
                ChallengeWithProgress { challenge, progress }
            })
            .collect())
    }

    async fn complete_challenge(&self, user_id: UserId, challenge_id: ChallengeId, score: i32) -> Result<UserChallengeDBResponse> {
        let mut tables = self.tables.write();
        if !tables.challenges.contains_key(&challenge_id) {
            return Err(DbError::missing_reference("user_challenges", "user_challenges_challenge_id_fkey"));
        }
        let now = Utc::now();

        match tables
            .user_challenges
            .iter_mut()
            .find(|uc| uc.user_id == user_id && uc.challenge_id == challenge_id)
        {
            Some(existing) if existing.completed => Err(DbError::unique("user_challenges", "user_challenges_user_challenge_unique")),
            Some(existing) => {
                existing.completed = true;
                existing.score = score;
                existing.completed_at = Some(now);
                Ok(existing.clone())
            }
            None => {
                let record = UserChallengeDBResponse {
                    id: Uuid::new_v4(),
                    user_id,
                    challenge_id,
                    completed: true,
                    score,
                    completed_at: Some(now),
                };
                tables.user_challenges.push(record.clone());
                Ok(record)
            }
        }
    }

    async fn count_completed_challenges(&self, user_id: UserId) -> Result<i64> {
        Ok(self
            .tables
            .read()
            .user_challenges
            .iter()
            .filter(|uc| uc.user_id == user_id && uc.completed)
            .count() as i64)
    }
}

#[async_trait::async_trait]
impl UsageStore for InMemoryStore {
    async fn log_api_usage(&self, request: &ApiUsageCreateDBRequest) -> Result<()> {
        self.tables.write().api_usage.push(ApiUsageDBResponse {
            id: Uuid::new_v4(),
            service: request.service.clone(),
            endpoint: request.endpoint.clone(),
            request_data: request.request_data.clone(),
            response_data: request.response_data.clone(),
            tokens_used: request.tokens_used,
            cost_usd: request.cost_usd,
            response_time_ms: request.response_time_ms,
            success: request.success,
            error_message: request.error_message.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn system_counts(&self, since: DateTime<Utc>) -> Result<SystemCounts> {
        let tables = self.tables.read();
        Ok(SystemCounts {
            users: tables.users.len() as i64,
            word_origins: tables.word_origins.len() as i64,
            analyses: tables.analyses.len() as i64,
            featured_words: tables.featured.iter().filter(|f| f.is_active).count() as i64,
            challenges: tables.challenges.values().filter(|c| c.is_active).count() as i64,
            completed_challenges: tables.user_challenges.iter().filter(|uc| uc.completed).count() as i64,
            api_calls_total: tables.api_usage.len() as i64,
            api_calls_today: tables.api_usage.iter().filter(|u| u.created_at >= since).count() as i64,
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl InMemoryStore {
    /// Every recorded external API call, oldest first
    pub fn api_usage(&self) -> Vec<ApiUsageDBResponse> {
        self.tables.read().api_usage.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::analyses::AnalysisStatus;
    use crate::db::models::challenges::{ChallengeType, Difficulty};
    use crate::db::models::users::UserType;

    fn user_request(email: &str, username: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            user_type: UserType::Student,
            is_staff: false,
            institution: None,
        }
    }

    fn analysis_request(word: &str, user_id: Option<UserId>) -> AnalysisUpsertDBRequest {
        AnalysisUpsertDBRequest {
            word: word.to_string(),
            user_id,
            status: AnalysisStatus::Completed,
            raw_response: "{}".to_string(),
            processed_data: serde_json::json!({}),
            original_language: "Grego".to_string(),
            original_form: "φιλοσοφία".to_string(),
            transliteration: "philosophia".to_string(),
            prefix: "philo".to_string(),
            prefix_meaning: "amor".to_string(),
            root: "sophia".to_string(),
            root_meaning: "sabedoria".to_string(),
            suffix: String::new(),
            suffix_meaning: String::new(),
            etymology_explanation: "Amor à sabedoria".to_string(),
            historical_context: "Grécia antiga".to_string(),
            modern_usage: "Disciplina".to_string(),
            related_words: vec!["filósofo".to_string()],
            model_used: "gemini-pro".to_string(),
            tokens_used: 10,
            processing_time_ms: 5,
            cost_usd: 0.0,
            confidence_score: 0.9,
        }
    }

    fn origin_request(word: &str) -> WordOriginCreateDBRequest {
        WordOriginCreateDBRequest {
            word: word.to_string(),
            language: "Grego".to_string(),
            root: "sophia".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryStore::new();
        store.create_user(&user_request("a@example.com", "a")).await.unwrap();

        let err = store.create_user(&user_request("a@example.com", "b")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_upsert_replaces_per_word_and_user() {
        let store = InMemoryStore::new();
        let user = store.create_user(&user_request("a@example.com", "a")).await.unwrap();

        let first = store.upsert_analysis(&analysis_request("filosofia", Some(user.id)), None).await.unwrap();
        store.record_view(first.id).await.unwrap();

        let mut replacement = analysis_request("filosofia", Some(user.id));
        replacement.confidence_score = 0.4;
        let second = store.upsert_analysis(&replacement, None).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.confidence_score, 0.4);
        assert_eq!(second.view_count, 1);

        let listed = store.list_analyses(&AnalysisFilter::new(user.id, 0, 10)).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_word_origin_created_once() {
        let store = InMemoryStore::new();
        let origin = origin_request("filosofia");

        let a = store.upsert_analysis(&analysis_request("filosofia", None), Some(&origin)).await.unwrap();
        let b = store.upsert_analysis(&analysis_request("filosofia", None), Some(&origin)).await.unwrap();

        assert_eq!(a.word_origin_id, b.word_origin_id);
        let stored = store.get_word_origin_by_word("filosofia").await.unwrap().unwrap();
        assert_eq!(stored.search_count, 2);
    }

    #[tokio::test]
    async fn test_record_search_counts() {
        let store = InMemoryStore::new();

        let first = store.record_search("Filosofia").await.unwrap();
        assert_eq!(first.word, "filosofia");
        assert_eq!(first.search_count, 1);

        let second = store.record_search("filosofia").await.unwrap();
        assert_eq!(second.search_count, 2);
        assert_eq!(second.daily_searches, 2);
        assert_eq!(second.weekly_searches, 2);
        assert_eq!(second.monthly_searches, 2);
    }

    #[tokio::test]
    async fn test_approve_correction_updates_analysis_and_origin() {
        let store = InMemoryStore::new();
        let user = store.create_user(&user_request("a@example.com", "a")).await.unwrap();
        let analysis = store
            .upsert_analysis(&analysis_request("filosofia", Some(user.id)), Some(&origin_request("filosofia")))
            .await
            .unwrap();

        let correction = store
            .create_correction(&CorrectionCreateDBRequest {
                analysis_id: analysis.id,
                user_id: user.id,
                field_name: CorrectableField::Root,
                original_value: analysis.root.clone(),
                corrected_value: "soph".to_string(),
                explanation: String::new(),
            })
            .await
            .unwrap();

        let approved = store.approve_correction(correction.id, user.id).await.unwrap();
        assert!(approved.is_approved);
        assert_eq!(approved.reviewed_by, Some(user.id));

        let updated = store.get_analysis(analysis.id).await.unwrap().unwrap();
        assert_eq!(updated.root, "soph");
        assert_eq!(updated.processed_data["root"], "soph");
        let origin = store.get_word_origin(updated.word_origin_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(origin.root, "soph");

        // second approval is a conflict, not a missing row
        match store.approve_correction(correction.id, user.id).await {
            Err(DbError::UniqueViolation { table, .. }) => assert_eq!(table.as_deref(), Some("etymology_corrections")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            store.approve_correction(uuid::Uuid::new_v4(), user.id).await,
            Err(DbError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_complete_challenge_once() {
        let store = InMemoryStore::new();
        let user = store.create_user(&user_request("a@example.com", "a")).await.unwrap();
        let challenge = store
            .create_challenge(&ChallengeCreateDBRequest {
                title: "Raízes".to_string(),
                description: "desc".to_string(),
                challenge_type: ChallengeType::Etymology,
                difficulty: Difficulty::Easy,
                xp_reward: 10,
            })
            .await
            .unwrap();

        store.complete_challenge(user.id, challenge.id, 80).await.unwrap();
        let again = store.complete_challenge(user.id, challenge.id, 90).await;
        assert!(matches!(again, Err(DbError::UniqueViolation { .. })));
        assert_eq!(store.count_completed_challenges(user.id).await.unwrap(), 1);

        let listed = store.list_active_challenges(user.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].progress.as_ref().map(|p| p.score), Some(80));
    }

    #[tokio::test]
    async fn test_featured_scheduling_window() {
        let store = InMemoryStore::new();
        store
            .upsert_analysis(&analysis_request("filosofia", None), Some(&origin_request("filosofia")))
            .await
            .unwrap();
        store
            .upsert_analysis(&analysis_request("democracia", None), Some(&origin_request("democracia")))
            .await
            .unwrap();
        let now = Utc::now();

        let filosofia = store.get_word_origin_by_word("filosofia").await.unwrap().unwrap();
        let democracia = store.get_word_origin_by_word("democracia").await.unwrap().unwrap();
        store
            .feature_word(&FeaturedWordCreateDBRequest {
                word_origin_id: filosofia.id,
                display_order: 2,
                custom_title: String::new(),
                custom_description: String::new(),
                start_date: None,
                end_date: None,
            })
            .await
            .unwrap();
        store
            .feature_word(&FeaturedWordCreateDBRequest {
                word_origin_id: democracia.id,
                display_order: 1,
                custom_title: String::new(),
                custom_description: String::new(),
                start_date: Some(now + chrono::Duration::days(1)),
                end_date: None,
            })
            .await
            .unwrap();

        let featured = store.list_featured(now).await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].word, "filosofia");

        let later = store.list_featured(now + chrono::Duration::days(2)).await.unwrap();
        assert_eq!(later.iter().map(|f| f.word.as_str()).collect::<Vec<_>>(), vec!["democracia", "filosofia"]);
    }
}
