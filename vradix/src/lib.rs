//! # vradix: Veritas Radix etymology backend
//!
//! `vradix` serves the Veritas Radix learning platform: it analyzes the etymology of
//! Portuguese words with a generative text model, attaches an illustration, keeps the results and
//! canonical word origins in PostgreSQL, and tracks learner progress (XP, levels, streaks,
//! achievements and challenges).
//!
//! ## Request Flow
//!
//! An analysis request (`POST /api/etymology/analyze/`) is validated, optionally answered from a
//! previously completed analysis, and otherwise sent to the text provider through
//! [`ai::analysis::AnalysisClient`]. The provider's loosely structured output is repaired into an
//! [`ai::analysis::EtymologyRecord`]; when the provider is down or its output unusable, a
//! placeholder record is stored instead and the request still succeeds. The record is persisted,
//! the word's search counters are bumped, XP is awarded, and an image is resolved through
//! [`ai::images::ImageResolver`] (generated image, then stock photo, then a static table).
//!
//! ## Core Components
//!
//! - [`api`]: axum handlers and request/response models
//! - [`auth`]: JWT access/refresh tokens, Argon2 password hashing, the [`api::models::users::CurrentUser`] extractor
//! - [`db`]: store traits with PostgreSQL and in-memory implementations
//! - [`ai`]: provider clients and the analysis/image pipelines built on them
//! - [`gamification`]: level curve, streaks and achievement awards
//! - [`rate_limit`]: fixed-window per-IP request limiting
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use vradix::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = vradix::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     vradix::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod gamification;
mod openapi;
pub mod rate_limit;
pub mod telemetry;
#[cfg(test)]
pub mod test_utils;
pub mod types;
pub mod validation;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    http::{self, HeaderValue},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use bon::Builder;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;

use crate::{
    ai::{
        ImageGenerator, StockPhotoSearch, TextGenerator,
        analysis::AnalysisClient,
        gemini::GeminiClient,
        images::ImageResolver,
        openai::OpenAiImageClient,
        unsplash::UnsplashClient,
    },
    config::CorsOrigin,
    db::handlers::Store,
    openapi::ApiDoc,
    rate_limit::{RateLimiter, rate_limit_middleware},
};

/// Shared state handed to every handler
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub text_generator: Arc<dyn TextGenerator>,
    pub image_generator: Arc<dyn ImageGenerator>,
    pub stock_photos: Arc<dyn StockPhotoSearch>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn analysis_client(&self) -> AnalysisClient {
        AnalysisClient::new(
            self.text_generator.clone(),
            self.store.clone(),
            self.config.providers.gemini.cost_per_1k_tokens,
        )
    }

    pub fn image_resolver(&self) -> ImageResolver {
        ImageResolver::new(self.image_generator.clone(), self.stock_photos.clone(), self.store.clone())
    }
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.cors;
    let wildcard = cors_config
        .allowed_origins
        .iter()
        .any(|origin| matches!(origin, CorsOrigin::Wildcard));

    // Credentials cannot be combined with a wildcard origin
    let allow_origin = if wildcard {
        if cors_config.allow_credentials {
            warn!("CORS allow_credentials ignored with a wildcard origin");
        }
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH, http::Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials && !wildcard)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: auth, etymology, gamification and system routes, the API
/// docs, and the rate limit, CORS and tracing layers.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{auth, bookmarks, challenges, corrections, etymology, profile, system};

    let auth_routes = Router::new()
        .route("/register/", post(auth::register))
        .route("/login/", post(auth::login))
        .route("/refresh/", post(auth::refresh))
        .route("/logout/", post(auth::logout));

    let etymology_routes = Router::new()
        .route("/analyze/", post(etymology::analyze))
        .route("/generate-image/", post(etymology::generate_image))
        .route("/featured/", get(etymology::list_featured).post(etymology::feature_word))
        .route("/popular/", get(etymology::list_popular))
        .route("/analyses/", get(etymology::list_analyses))
        .route("/analyses/{id}/", get(etymology::get_analysis))
        .route(
            "/analyses/{id}/corrections/",
            get(corrections::list_corrections).post(corrections::create_correction),
        )
        .route("/corrections/{id}/approve/", post(corrections::approve_correction))
        .route("/bookmarks/", get(bookmarks::list_bookmarks).post(bookmarks::create_bookmark))
        .route(
            "/bookmarks/{id}/",
            get(bookmarks::get_bookmark)
                .patch(bookmarks::update_bookmark)
                .delete(bookmarks::delete_bookmark),
        );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/etymology", etymology_routes)
        .route("/challenges/", get(challenges::list_challenges).post(challenges::create_challenge))
        .route("/challenges/{id}/complete/", post(challenges::complete_challenge))
        .route("/profile/", get(profile::get_profile))
        .route("/stats/", get(system::get_stats));

    let mut router = Router::new()
        .route("/health/", get(system::health))
        .nest("/api", api_routes)
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()))
        .with_state(state.clone());

    if state.config.rate_limit.enabled {
        router = router.layer(from_fn_with_state(state.rate_limiter.clone(), rate_limit_middleware));
    }

    let router = router.layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_request(DefaultOnRequest::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(create_cors_layer(&state.config)?),
    );

    Ok(router)
}

/// Connect the store and build the provider clients described by `config`.
pub async fn build_state(config: Config) -> anyhow::Result<AppState> {
    let store = db::setup_store(&config).await?;
    let text_generator = Arc::new(GeminiClient::new(config.providers.gemini.clone())?);
    let image_generator = Arc::new(OpenAiImageClient::new(config.providers.openai.clone())?);
    let stock_photos = Arc::new(UnsplashClient::new(config.providers.unsplash.clone())?);
    let rate_limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));

    Ok(AppState::builder()
        .store(store)
        .config(config)
        .text_generator(text_generator)
        .image_generator(image_generator)
        .stock_photos(stock_photos)
        .rate_limiter(rate_limiter)
        .build())
}

pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting vradix with configuration: {:#?}", config);

        let app_state = build_state(config.clone()).await?;
        let router = build_router(app_state.clone())?;

        Ok(Self {
            router,
            app_state,
            config,
        })
    }

    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "vradix listening on http://{}, store backend: {}",
            bind_addr,
            self.app_state.store.backend_name()
        );

        // Peer addresses feed the rate limiter when no X-Forwarded-For header is present
        axum::serve(listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_state, create_test_user};
    use axum::http::StatusCode;
    use axum_test::TestServer;

    #[test_log::test(tokio::test)]
    async fn test_router_serves_health_and_docs() {
        let state = create_test_state();
        let server = TestServer::new(build_router(state).unwrap()).unwrap();

        server.get("/health/").await.assert_status_ok();
        server.get("/api/docs").await.assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_protected_routes_require_token() {
        let state = create_test_state();
        let (_, token) = create_test_user(&state, "ana", false).await;
        let server = TestServer::new(build_router(state).unwrap()).unwrap();

        server.get("/api/profile/").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/profile/")
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_rate_limit_layer_applies_when_enabled() {
        let mut state = create_test_state();
        state.config.rate_limit.enabled = true;
        state.rate_limiter = Arc::new(RateLimiter::new(1, std::time::Duration::from_secs(60)));
        let server = TestServer::new(build_router(state).unwrap()).unwrap();

        server.get("/health/").await.assert_status_ok();
        server.get("/health/").await.assert_status(StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_cors_layer_accepts_configured_origins() {
        let mut config = crate::test_utils::create_test_config();
        config.auth.cors.allowed_origins = vec![CorsOrigin::Url("https://veritasradix.example".parse().unwrap())];
        assert!(create_cors_layer(&config).is_ok());
    }
}
