use axum::{Json, extract::State, http::StatusCode};
use chrono::{Timelike, Utc};
use tracing::error;

use crate::{
    AppState,
    api::models::{
        system::{ExternalApiChecks, HealthChecks, HealthResponse, StatsResponse},
        users::CurrentUser,
    },
    errors::Error,
};

fn api_status(key: Option<&str>) -> String {
    match key {
        Some(key) if !key.trim().is_empty() => "configured",
        _ => "not_configured",
    }
    .to_string()
}

/// Liveness and dependency check
#[utoipa::path(
    get,
    path = "/health/",
    tag = "system",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.store.ping().await;
    if let Err(e) = &database {
        error!("Health check database ping failed: {e}");
    }

    let providers = &state.config.providers;
    let response = HealthResponse {
        status: if database.is_ok() { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        checks: HealthChecks {
            database: match &database {
                Ok(()) => "healthy".to_string(),
                Err(e) => format!("unhealthy: {e}"),
            },
            database_backend: state.store.backend_name().to_string(),
            cache: "not_applicable".to_string(),
            external_apis: ExternalApiChecks {
                gemini: api_status(providers.gemini.api_key.as_deref()),
                openai: api_status(providers.openai.api_key.as_deref()),
                unsplash: api_status(providers.unsplash.access_key.as_deref()),
            },
        },
    };

    let status = if database.is_ok() { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(response))
}

/// Row counts and API usage
#[utoipa::path(
    get,
    path = "/api/stats/",
    tag = "system",
    responses(
        (status = 200, description = "System statistics", body = StatsResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_stats(State(state): State<AppState>, _user: CurrentUser) -> Result<Json<StatsResponse>, Error> {
    let now = Utc::now();
    let start_of_day = now
        .with_hour(0)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    let counts = state.store.system_counts(start_of_day).await?;
    Ok(Json(StatsResponse::from(counts)))
}
