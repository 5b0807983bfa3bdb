//! Test utilities shared by the unit tests.

use std::sync::{Arc, Once};

use chrono::{DateTime, Utc};

use crate::{
    AppState,
    ai::{
        ImageGenerator, StockPhotoSearch, TextGenerator,
        mock::{MockImageGenerator, MockStockPhotos, MockTextGenerator},
    },
    auth::{
        password::{self, Argon2Params},
        session::{self, TokenType},
    },
    config::{AuthConfig, Config, DatabaseConfig, PasswordConfig, RateLimitConfig},
    db::{
        errors::{DbError, Result},
        handlers::{AnalysisStore, BookmarkStore, ChallengeStore, CorrectionStore, InMemoryStore, SearchStore, Store, UsageStore, UserStore, WordStore},
        models::{
            analyses::{AnalysisDBResponse, AnalysisFilter, AnalysisUpsertDBRequest},
            bookmarks::{BookmarkCreateDBRequest, BookmarkDBResponse},
            challenges::{ChallengeCreateDBRequest, ChallengeDBResponse, ChallengeWithProgress, UserChallengeDBResponse},
            corrections::{CorrectionCreateDBRequest, CorrectionDBResponse},
            searches::{FeaturedWordCreateDBRequest, FeaturedWordDBResponse, PopularSearchDBResponse},
            usage::{ApiUsageCreateDBRequest, SystemCounts},
            users::{AchievementCreateDBRequest, AchievementDBResponse, UserCreateDBRequest, UserDBResponse, UserProgressUpdateDBRequest, UserType},
            words::{WordOriginCreateDBRequest, WordOriginDBResponse},
        },
    },
    rate_limit::RateLimiter,
    types::{AnalysisId, BookmarkId, ChallengeId, CorrectionId, UserId, WordOriginId},
};

pub const TEST_PASSWORD: &str = "password123";

pub fn create_test_config() -> Config {
    Config {
        secret_key: Some("test-secret-key-for-vradix".to_string()),
        database: DatabaseConfig::Memory,
        auth: AuthConfig {
            password: PasswordConfig {
                // Fast hashing for tests
                argon2_memory_kib: 1024,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..PasswordConfig::default()
            },
            ..AuthConfig::default()
        },
        rate_limit: RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        },
        ..Config::default()
    }
}

/// State over an empty in-memory store, with the text provider down and no image providers
pub fn create_test_state() -> AppState {
    create_test_state_with(
        Arc::new(MockTextGenerator::failing("provider unavailable")),
        Arc::new(MockImageGenerator::unconfigured()),
        Arc::new(MockStockPhotos::unconfigured()),
    )
}

pub fn create_test_state_with(
    text_generator: Arc<dyn TextGenerator>,
    image_generator: Arc<dyn ImageGenerator>,
    stock_photos: Arc<dyn StockPhotoSearch>,
) -> AppState {
    create_test_state_with_store(Arc::new(InMemoryStore::new()), text_generator, image_generator, stock_photos)
}

pub fn create_test_state_with_store(
    store: Arc<dyn Store>,
    text_generator: Arc<dyn TextGenerator>,
    image_generator: Arc<dyn ImageGenerator>,
    stock_photos: Arc<dyn StockPhotoSearch>,
) -> AppState {
    let config = create_test_config();
    let rate_limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));

    AppState::builder()
        .store(store)
        .config(config)
        .text_generator(text_generator)
        .image_generator(image_generator)
        .stock_photos(stock_photos)
        .rate_limiter(rate_limiter)
        .build()
}

/// Create a user with password [`TEST_PASSWORD`], returning it with a valid access token
pub async fn create_test_user(state: &AppState, username: &str, is_staff: bool) -> (UserDBResponse, String) {
    let password_hash = password::hash_password(TEST_PASSWORD.to_string(), Argon2Params::from(&state.config.auth.password))
        .await
        .expect("Failed to hash test password");

    let user = state
        .store
        .create_user(&UserCreateDBRequest {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            password_hash,
            user_type: if is_staff { UserType::Teacher } else { UserType::Student },
            is_staff,
            institution: None,
        })
        .await
        .expect("Failed to create test user");

    let token = session::create_token(user.id, &user.username, TokenType::Access, &state.config).expect("Failed to create test token");
    (user, token)
}

pub fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        // Another test binary may have installed it already
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    });
}

/// In-memory store whose connectivity check or usage logging can be made to fail
#[derive(Default)]
pub struct FaultyStore {
    pub inner: InMemoryStore,
    pub fail_ping: bool,
    pub fail_usage_log: bool,
}

impl FaultyStore {
    fn fault(what: &str) -> DbError {
        DbError::Other(anyhow::anyhow!("connection refused during {what}"))
    }
}

#[async_trait::async_trait]
impl UserStore for FaultyStore {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        self.inner.create_user(request).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        self.inner.get_user(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        self.inner.get_user_by_email(email).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserDBResponse>> {
        self.inner.get_user_by_username(username).await
    }

    async fn add_xp(&self, id: UserId, amount: i32) -> Result<UserDBResponse> {
        self.inner.add_xp(id, amount).await
    }

    async fn update_progress(&self, id: UserId, request: &UserProgressUpdateDBRequest) -> Result<UserDBResponse> {
        self.inner.update_progress(id, request).await
    }

    async fn grant_achievement(&self, request: &AchievementCreateDBRequest) -> Result<Option<AchievementDBResponse>> {
        self.inner.grant_achievement(request).await
    }

    async fn list_achievements(&self, user_id: UserId) -> Result<Vec<AchievementDBResponse>> {
        self.inner.list_achievements(user_id).await
    }
}

#[async_trait::async_trait]
impl WordStore for FaultyStore {
    async fn get_word_origin(&self, id: WordOriginId) -> Result<Option<WordOriginDBResponse>> {
        self.inner.get_word_origin(id).await
    }

    async fn get_word_origin_by_word(&self, word: &str) -> Result<Option<WordOriginDBResponse>> {
        self.inner.get_word_origin_by_word(word).await
    }
}

#[async_trait::async_trait]
impl AnalysisStore for FaultyStore {
    async fn upsert_analysis(
        &self,
        request: &AnalysisUpsertDBRequest,
        origin: Option<&WordOriginCreateDBRequest>,
    ) -> Result<AnalysisDBResponse> {
        self.inner.upsert_analysis(request, origin).await
    }

    async fn get_analysis(&self, id: AnalysisId) -> Result<Option<AnalysisDBResponse>> {
        self.inner.get_analysis(id).await
    }

    async fn find_analysis(&self, word: &str, user_id: Option<UserId>) -> Result<Option<AnalysisDBResponse>> {
        self.inner.find_analysis(word, user_id).await
    }

    async fn list_analyses(&self, filter: &AnalysisFilter) -> Result<Vec<AnalysisDBResponse>> {
        self.inner.list_analyses(filter).await
    }

    async fn record_view(&self, id: AnalysisId) -> Result<AnalysisDBResponse> {
        self.inner.record_view(id).await
    }
}

#[async_trait::async_trait]
impl CorrectionStore for FaultyStore {
    async fn create_correction(&self, request: &CorrectionCreateDBRequest) -> Result<CorrectionDBResponse> {
        self.inner.create_correction(request).await
    }

    async fn get_correction(&self, id: CorrectionId) -> Result<Option<CorrectionDBResponse>> {
        self.inner.get_correction(id).await
    }

    async fn list_corrections(&self, analysis_id: AnalysisId) -> Result<Vec<CorrectionDBResponse>> {
        self.inner.list_corrections(analysis_id).await
    }

    async fn approve_correction(&self, id: CorrectionId, reviewer: UserId) -> Result<CorrectionDBResponse> {
        self.inner.approve_correction(id, reviewer).await
    }
}

#[async_trait::async_trait]
impl BookmarkStore for FaultyStore {
    async fn create_bookmark(&self, request: &BookmarkCreateDBRequest) -> Result<BookmarkDBResponse> {
        self.inner.create_bookmark(request).await
    }

    async fn get_bookmark(&self, id: BookmarkId) -> Result<Option<BookmarkDBResponse>> {
        self.inner.get_bookmark(id).await
    }

    async fn list_bookmarks(&self, user_id: UserId) -> Result<Vec<BookmarkDBResponse>> {
        self.inner.list_bookmarks(user_id).await
    }

    async fn update_bookmark_notes(&self, id: BookmarkId, notes: &str) -> Result<BookmarkDBResponse> {
        self.inner.update_bookmark_notes(id, notes).await
    }

    async fn delete_bookmark(&self, id: BookmarkId) -> Result<bool> {
        self.inner.delete_bookmark(id).await
    }

    async fn is_bookmarked(&self, user_id: UserId, analysis_id: AnalysisId) -> Result<bool> {
        self.inner.is_bookmarked(user_id, analysis_id).await
    }
}

#[async_trait::async_trait]
impl SearchStore for FaultyStore {
    async fn record_search(&self, word: &str) -> Result<PopularSearchDBResponse> {
        self.inner.record_search(word).await
    }

    async fn list_popular(&self, limit: i64) -> Result<Vec<PopularSearchDBResponse>> {
        self.inner.list_popular(limit).await
    }

    async fn feature_word(&self, request: &FeaturedWordCreateDBRequest) -> Result<FeaturedWordDBResponse> {
        self.inner.feature_word(request).await
    }

    async fn list_featured(&self, now: DateTime<Utc>) -> Result<Vec<FeaturedWordDBResponse>> {
        self.inner.list_featured(now).await
    }
}

#[async_trait::async_trait]
impl ChallengeStore for FaultyStore {
    async fn create_challenge(&self, request: &ChallengeCreateDBRequest) -> Result<ChallengeDBResponse> {
        self.inner.create_challenge(request).await
    }

    async fn get_challenge(&self, id: ChallengeId) -> Result<Option<ChallengeDBResponse>> {
        self.inner.get_challenge(id).await
    }

    async fn list_active_challenges(&self, user_id: UserId) -> Result<Vec<ChallengeWithProgress>> {
        self.inner.list_active_challenges(user_id).await
    }

    async fn complete_challenge(&self, user_id: UserId, challenge_id: ChallengeId, score: i32) -> Result<UserChallengeDBResponse> {
        self.inner.complete_challenge(user_id, challenge_id, score).await
    }

    async fn count_completed_challenges(&self, user_id: UserId) -> Result<i64> {
        self.inner.count_completed_challenges(user_id).await
    }
}

#[async_trait::async_trait]
impl UsageStore for FaultyStore {
    async fn log_api_usage(&self, request: &ApiUsageCreateDBRequest) -> Result<()> {
        if self.fail_usage_log {
            return Err(Self::fault("usage logging"));
        }
        self.inner.log_api_usage(request).await
    }
}

#[async_trait::async_trait]
impl Store for FaultyStore {
    async fn ping(&self) -> Result<()> {
        if self.fail_ping {
            return Err(Self::fault("ping"));
        }
        self.inner.ping().await
    }

    async fn system_counts(&self, since: DateTime<Utc>) -> Result<SystemCounts> {
        self.inner.system_counts(since).await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
