//! OpenAPI documentation for the HTTP API, served with Scalar at `/api/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{api, db, gamification};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token from `/api/auth/login/` or `/api/auth/register/`:\n\n\
                            ```\nAuthorization: Bearer ACCESS_TOKEN\n```\n\n\
                            Expired access tokens can be renewed at `/api/auth/refresh/`.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Veritas Radix API",
        description = "Etymology analysis with AI-generated morphology and illustrations, plus the learning features built around it."
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::refresh,
        api::handlers::auth::logout,
        api::handlers::etymology::analyze,
        api::handlers::etymology::generate_image,
        api::handlers::etymology::list_featured,
        api::handlers::etymology::feature_word,
        api::handlers::etymology::list_popular,
        api::handlers::etymology::list_analyses,
        api::handlers::etymology::get_analysis,
        api::handlers::corrections::create_correction,
        api::handlers::corrections::list_corrections,
        api::handlers::corrections::approve_correction,
        api::handlers::bookmarks::list_bookmarks,
        api::handlers::bookmarks::create_bookmark,
        api::handlers::bookmarks::get_bookmark,
        api::handlers::bookmarks::update_bookmark,
        api::handlers::bookmarks::delete_bookmark,
        api::handlers::challenges::list_challenges,
        api::handlers::challenges::create_challenge,
        api::handlers::challenges::complete_challenge,
        api::handlers::profile::get_profile,
        api::handlers::system::health,
        api::handlers::system::get_stats,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::AuthResponse,
            api::models::auth::RefreshRequest,
            api::models::auth::RefreshResponse,
            api::models::auth::LogoutResponse,
            api::models::users::UserResponse,
            api::models::etymology::AnalyzeRequest,
            api::models::etymology::AnalyzeResponse,
            api::models::etymology::AnalysisData,
            api::models::etymology::EtymologySection,
            api::models::etymology::MorphologySection,
            api::models::etymology::RelatedWordResponse,
            api::models::etymology::ImageResponse,
            api::models::etymology::GenerateImageRequest,
            api::models::etymology::GenerateImageResponse,
            api::models::etymology::AnalysisResponse,
            api::models::etymology::FeaturedWordSummary,
            api::models::etymology::FeaturedWordsResponse,
            api::models::etymology::FeatureWordRequest,
            api::models::etymology::FeaturedWordResponse,
            api::models::etymology::PopularSearchResponse,
            api::models::corrections::CorrectionCreate,
            api::models::corrections::CorrectionResponse,
            api::models::bookmarks::BookmarkCreate,
            api::models::bookmarks::BookmarkUpdate,
            api::models::bookmarks::BookmarkResponse,
            api::models::challenges::ChallengeCreate,
            api::models::challenges::ChallengeResponse,
            api::models::challenges::CompleteChallengeRequest,
            api::models::challenges::CompleteChallengeResponse,
            api::models::profile::AchievementResponse,
            api::models::profile::ProfileResponse,
            api::models::system::HealthResponse,
            api::models::system::HealthChecks,
            api::models::system::ExternalApiChecks,
            api::models::system::StatsResponse,
            db::models::users::UserType,
            db::models::analyses::AnalysisStatus,
            db::models::corrections::CorrectableField,
            db::models::challenges::ChallengeType,
            db::models::challenges::Difficulty,
            gamification::LevelProgress,
        )
    ),
    tags(
        (name = "authentication", description = "Registration, login and token refresh"),
        (name = "etymology", description = "Word analysis, images, featured and popular words"),
        (name = "corrections", description = "Community corrections to analyses"),
        (name = "bookmarks", description = "Saved analyses"),
        (name = "challenges", description = "Challenges and XP rewards"),
        (name = "profile", description = "Levels, streaks and achievements"),
        (name = "system", description = "Health and statistics"),
    )
)]
pub struct ApiDoc;
