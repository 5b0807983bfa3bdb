use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::{
    AppState,
    ai::analysis::{EtymologyRecord, clamp_confidence, fallback_record},
    api::models::{
        etymology::{
            AnalysisData, AnalysisResponse, AnalyzeRequest, AnalyzeResponse, EtymologySection, FeatureWordRequest, FeaturedWordResponse,
            FeaturedWordSummary, FeaturedWordsResponse, GenerateImageRequest, GenerateImageResponse, ImageResponse, PopularQuery,
            PopularSearchResponse,
        },
        pagination::Pagination,
        users::CurrentUser,
    },
    db::{
        handlers::{AnalysisStore, BookmarkStore, SearchStore, WordStore},
        models::{
            analyses::{AnalysisDBResponse, AnalysisFilter, AnalysisStatus, AnalysisUpsertDBRequest},
            searches::FeaturedWordCreateDBRequest,
            words::WordOriginCreateDBRequest,
        },
    },
    errors::Error,
    gamification::{ETYMOLOGY_EXPLORER, award_xp},
    types::{AnalysisId, UserId, abbrev_uuid},
    validation::validate_word,
};

/// Provider figures recorded alongside the analysis
struct CallMetrics {
    raw_response: String,
    model: String,
    tokens_used: i32,
    latency_ms: i64,
    cost_usd: f64,
}

fn upsert_request(
    word: &str,
    user_id: UserId,
    status: AnalysisStatus,
    record: &EtymologyRecord,
    metrics: &CallMetrics,
) -> Result<AnalysisUpsertDBRequest, Error> {
    let processed_data = serde_json::to_value(record).map_err(|e| Error::AnalysisFailed {
        message: format!("serialize record: {e}"),
    })?;

    Ok(AnalysisUpsertDBRequest {
        word: word.to_string(),
        user_id: Some(user_id),
        status,
        raw_response: metrics.raw_response.clone(),
        processed_data,
        original_language: record.original_language.clone(),
        original_form: record.original_form.clone(),
        transliteration: record.transliteration.clone(),
        prefix: record.prefix.clone(),
        prefix_meaning: record.prefix_meaning.clone(),
        root: record.root.clone(),
        root_meaning: record.root_meaning.clone(),
        suffix: record.suffix.clone(),
        suffix_meaning: record.suffix_meaning.clone(),
        etymology_explanation: record.etymology_explanation.clone(),
        historical_context: record.historical_context.clone(),
        modern_usage: record.modern_usage.clone(),
        related_words: record.related_words.iter().map(|related| related.word.clone()).collect(),
        model_used: metrics.model.clone(),
        tokens_used: metrics.tokens_used,
        processing_time_ms: metrics.latency_ms,
        cost_usd: metrics.cost_usd,
        confidence_score: record.confidence_score,
    })
}

fn word_origin_request(word: &str, record: &EtymologyRecord) -> WordOriginCreateDBRequest {
    let etymology = EtymologySection::from_record(record);
    WordOriginCreateDBRequest {
        word: word.to_string(),
        language: record.original_language.clone(),
        original_form: etymology.original_form,
        transliteration: record.transliteration.clone(),
        meaning: etymology.meaning,
        definition: etymology.origin,
        prefix: record.prefix.clone(),
        prefix_meaning: record.prefix_meaning.clone(),
        root: record.root.clone(),
        root_meaning: record.root_meaning.clone(),
        suffix: record.suffix.clone(),
        suffix_meaning: record.suffix_meaning.clone(),
        historical_context: record.historical_context.clone(),
    }
}

/// A stored completed analysis, if reuse is enabled and its record can still be read
async fn reusable_analysis(state: &AppState, word: &str, user_id: UserId) -> Result<Option<(AnalysisDBResponse, EtymologyRecord)>, Error> {
    let Some(existing) = state.store.find_analysis(word, Some(user_id)).await? else {
        return Ok(None);
    };
    if existing.status != AnalysisStatus::Completed {
        return Ok(None);
    }

    match serde_json::from_value::<EtymologyRecord>(existing.processed_data.clone()) {
        Ok(record) => Ok(Some((existing, record))),
        Err(e) => {
            warn!(analysis_id = %abbrev_uuid(&existing.id), error = %e, "Stored record unreadable, analyzing again");
            Ok(None)
        }
    }
}

#[instrument(skip(state, request, user), fields(user_id = %abbrev_uuid(&user.id)))]
async fn run_analysis(state: &AppState, user: &CurrentUser, word: String, request: &AnalyzeRequest) -> Result<AnalyzeResponse, Error> {
    let refresh = request.refresh.unwrap_or(false);

    let reused = if state.config.analysis.reuse_completed && !refresh {
        reusable_analysis(state, &word, user.id).await?
    } else {
        None
    };

    let (analysis, record, status) = match reused {
        Some((analysis, record)) => {
            debug!("Serving stored analysis");
            (analysis, record, AnalysisStatus::Cached)
        }
        None => {
            let (mut record, status, metrics) = match state.analysis_client().analyze(&word).await {
                Ok(outcome) => {
                    let status = if outcome.parsed { AnalysisStatus::Completed } else { AnalysisStatus::Failed };
                    let metrics = CallMetrics {
                        raw_response: outcome.raw_text,
                        model: outcome.model,
                        tokens_used: outcome.tokens_used,
                        latency_ms: outcome.latency_ms,
                        cost_usd: outcome.cost_usd,
                    };
                    (outcome.record, status, metrics)
                }
                Err(failure) => {
                    let metrics = CallMetrics {
                        raw_response: String::new(),
                        model: failure.model,
                        tokens_used: 0,
                        latency_ms: failure.latency_ms,
                        cost_usd: 0.0,
                    };
                    (fallback_record(&word), AnalysisStatus::Failed, metrics)
                }
            };
            record.confidence_score = clamp_confidence(record.confidence_score);

            let origin = (status == AnalysisStatus::Completed).then(|| word_origin_request(&word, &record));
            let analysis = state
                .store
                .upsert_analysis(&upsert_request(&word, user.id, status, &record, &metrics)?, origin.as_ref())
                .await?;
            (analysis, record, status)
        }
    };

    state.store.record_search(&word).await?;

    if status == AnalysisStatus::Completed
        && let Err(e) = award_xp(state.store.as_ref(), user.id, state.config.analysis.xp_per_analysis, &[ETYMOLOGY_EXPLORER]).await
    {
        warn!(error = %e, "Failed to award analysis XP");
    }

    let mut data = AnalysisData::from_record(&word, &analysis, &record, status);

    if request.include_images.unwrap_or(state.config.analysis.include_images) {
        let image = state.image_resolver().resolve(&word, Some(&data.etymology.origin)).await;
        data.image = Some(ImageResponse::from(image));
    }

    Ok(AnalyzeResponse {
        success: true,
        data,
        raw_response: analysis.raw_response,
    })
}

/// Analyze the etymology of a word
///
/// Provider failures do not fail the request: the placeholder analysis is stored and returned
/// with status `failed`.
#[utoipa::path(
    post,
    path = "/api/etymology/analyze/",
    request_body = AnalyzeRequest,
    tag = "etymology",
    responses(
        (status = 200, description = "Analysis result", body = AnalyzeResponse),
        (status = 400, description = "Missing or invalid word"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Analysis pipeline failed"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn analyze(State(state): State<AppState>, user: CurrentUser, Json(request): Json<AnalyzeRequest>) -> Result<Json<AnalyzeResponse>, Error> {
    let word = validate_word(request.word.as_deref())?.to_lowercase();

    run_analysis(&state, &user, word, &request).await.map(Json).map_err(|e| match e {
        Error::Database(_) | Error::Other(_) | Error::Internal { .. } => Error::AnalysisFailed { message: e.to_string() },
        other => other,
    })
}

/// Resolve an illustration for a word
#[utoipa::path(
    post,
    path = "/api/etymology/generate-image/",
    request_body = GenerateImageRequest,
    tag = "etymology",
    responses(
        (status = 200, description = "Resolved image", body = GenerateImageResponse),
        (status = 400, description = "Missing or invalid word"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn generate_image(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>, Error> {
    let word = validate_word(request.word.as_deref())?.to_lowercase();
    let etymology = request.etymology.as_deref().map(str::trim).filter(|e| !e.is_empty());

    let image = state.image_resolver().resolve(&word, etymology).await;
    Ok(Json(GenerateImageResponse::from(image)))
}

/// List the currently featured words
#[utoipa::path(
    get,
    path = "/api/etymology/featured/",
    tag = "etymology",
    responses(
        (status = 200, description = "Featured words, or the built-in selection when none are scheduled", body = FeaturedWordsResponse),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_featured(State(state): State<AppState>, _user: CurrentUser) -> Result<Json<FeaturedWordsResponse>, Error> {
    let featured = state.store.list_featured(Utc::now()).await?;

    let featured_words = if featured.is_empty() {
        FeaturedWordSummary::built_in()
    } else {
        featured.into_iter().map(FeaturedWordSummary::from).collect()
    };

    Ok(Json(FeaturedWordsResponse { featured_words }))
}

/// Feature a word that already has a word origin (staff only)
#[utoipa::path(
    post,
    path = "/api/etymology/featured/",
    request_body = FeatureWordRequest,
    tag = "etymology",
    responses(
        (status = 201, description = "Word featured", body = FeaturedWordResponse),
        (status = 403, description = "Staff only"),
        (status = 404, description = "No word origin for this word"),
        (status = 409, description = "Word already featured"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn feature_word(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<FeatureWordRequest>,
) -> Result<(StatusCode, Json<FeaturedWordResponse>), Error> {
    user.require_staff("feature words")?;

    let word = validate_word(Some(request.word.as_str()))?.to_lowercase();
    let origin = state.store.get_word_origin_by_word(&word).await?.ok_or_else(|| Error::NotFound {
        resource: "Word origin".to_string(),
        id: word.clone(),
    })?;

    let featured = state
        .store
        .feature_word(&FeaturedWordCreateDBRequest {
            word_origin_id: origin.id,
            display_order: request.display_order.unwrap_or(0),
            custom_title: request.custom_title.unwrap_or_default(),
            custom_description: request.custom_description.unwrap_or_default(),
            start_date: request.start_date,
            end_date: request.end_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(FeaturedWordResponse::from(featured))))
}

/// Most searched words
#[utoipa::path(
    get,
    path = "/api/etymology/popular/",
    tag = "etymology",
    params(PopularQuery),
    responses(
        (status = 200, description = "Words by search count", body = [PopularSearchResponse]),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_popular(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<PopularSearchResponse>>, Error> {
    let popular = state.store.list_popular(query.limit()).await?;
    Ok(Json(popular.into_iter().map(PopularSearchResponse::from).collect()))
}

/// The caller's analyses, newest first
#[utoipa::path(
    get,
    path = "/api/etymology/analyses/",
    tag = "etymology",
    params(Pagination),
    responses(
        (status = 200, description = "The caller's analyses", body = [AnalysisResponse]),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_analyses(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<AnalysisResponse>>, Error> {
    let filter = AnalysisFilter::new(user.id, pagination.skip(), pagination.limit());
    let analyses = state.store.list_analyses(&filter).await?;
    Ok(Json(analyses.into_iter().map(AnalysisResponse::from).collect()))
}

/// One analysis; counts as a view
#[utoipa::path(
    get,
    path = "/api/etymology/analyses/{id}/",
    tag = "etymology",
    params(("id" = uuid::Uuid, Path, description = "Analysis ID")),
    responses(
        (status = 200, description = "The analysis", body = AnalysisResponse),
        (status = 404, description = "Analysis not found or not the caller's"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_analysis(State(state): State<AppState>, user: CurrentUser, Path(id): Path<AnalysisId>) -> Result<Json<AnalysisResponse>, Error> {
    let not_found = || Error::NotFound {
        resource: "Analysis".to_string(),
        id: id.to_string(),
    };

    let analysis = state.store.get_analysis(id).await?.ok_or_else(not_found)?;
    if !user.can_access(analysis.user_id) {
        return Err(not_found());
    }

    let viewed = state.store.record_view(id).await?;
    let is_bookmarked = state.store.is_bookmarked(user.id, id).await?;

    let mut response = AnalysisResponse::from(viewed);
    response.is_bookmarked = Some(is_bookmarked);
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::{MockImageGenerator, MockStockPhotos, MockTextGenerator};
    use crate::ai::images::ImageSource;
    use crate::db::handlers::UserStore;
    use crate::test_utils::{FaultyStore, create_test_state, create_test_state_with, create_test_state_with_store, create_test_user};
    use axum::routing::{get, post};
    use axum_test::TestServer;
    use serde_json::json;
    use std::sync::Arc;

    const FILOSOFIA: &str = r#"{
        "word": "filosofia",
        "original_language": "Grego",
        "original_form": "φιλοσοφία",
        "prefix": "philo",
        "prefix_meaning": "amor",
        "root": "sophia",
        "root_meaning": "sabedoria",
        "etymology_explanation": "Do grego philosophia, amor à sabedoria.",
        "historical_context": "Grécia Antiga.",
        "modern_usage": "Disciplina acadêmica.",
        "related_words": ["filósofo", {"word": "sofista", "relationship": "cognate"}],
        "confidence_score": 1.7
    }"#;

    fn server(state: AppState) -> TestServer {
        let app = axum::Router::new()
            .route("/analyze/", post(analyze))
            .route("/generate-image/", post(generate_image))
            .route("/featured/", get(list_featured).post(feature_word))
            .route("/popular/", get(list_popular))
            .route("/analyses/", get(list_analyses))
            .route("/analyses/{id}/", get(get_analysis))
            .with_state(state);
        TestServer::new(app).unwrap()
    }

    fn replying_state(text: &str) -> (AppState, Arc<MockTextGenerator>) {
        let generator = Arc::new(MockTextGenerator::replying(text, 400));
        let state = create_test_state_with(
            generator.clone(),
            Arc::new(MockImageGenerator::unconfigured()),
            Arc::new(MockStockPhotos::unconfigured()),
        );
        (state, generator)
    }

    #[test_log::test(tokio::test)]
    async fn test_analyze_with_provider_down_returns_placeholder() {
        let state = create_test_state();
        let (user, token) = create_test_user(&state, "ana", false).await;
        let server = server(state.clone());

        let response = server.post("/analyze/").authorization_bearer(token).json(&json!({"word": "filosofia"})).await;

        response.assert_status_ok();
        let body: AnalyzeResponse = response.json();
        assert!(body.success);
        assert_eq!(body.data.word, "filosofia");
        assert_eq!(body.data.status, AnalysisStatus::Failed);
        assert_eq!(body.data.confidence_score, 0.1);
        assert!(!body.data.etymology.origin.is_empty());
        assert!(body.data.image.is_none());

        // No word origin and no XP for a placeholder
        assert!(state.store.get_word_origin_by_word("filosofia").await.unwrap().is_none());
        assert_eq!(state.store.get_user(user.id).await.unwrap().unwrap().xp, 0);

        let popular = state.store.list_popular(10).await.unwrap();
        assert_eq!(popular[0].word, "filosofia");
        assert_eq!(popular[0].search_count, 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_analyze_survives_usage_log_failure() {
        let store = Arc::new(FaultyStore {
            fail_usage_log: true,
            ..FaultyStore::default()
        });
        let state = create_test_state_with_store(
            store.clone(),
            Arc::new(MockTextGenerator::replying(FILOSOFIA, 400)),
            Arc::new(MockImageGenerator::unconfigured()),
            Arc::new(MockStockPhotos::unconfigured()),
        );
        let (_, token) = create_test_user(&state, "ana", false).await;
        let server = server(state.clone());

        let response = server.post("/analyze/").authorization_bearer(token).json(&json!({"word": "filosofia"})).await;

        response.assert_status_ok();
        let body: AnalyzeResponse = response.json();
        assert_eq!(body.data.status, AnalysisStatus::Completed);
        assert_eq!(body.data.etymology.meaning, "sabedoria");
        assert!(state.store.get_word_origin_by_word("filosofia").await.unwrap().is_some());
        assert!(store.inner.api_usage().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_analyze_completed_persists_and_awards() {
        let (state, generator) = replying_state(FILOSOFIA);
        let (user, token) = create_test_user(&state, "ana", false).await;
        let server = server(state.clone());

        let response = server
            .post("/analyze/")
            .authorization_bearer(token.clone())
            .json(&json!({"word": "Filosofia"}))
            .await;
        response.assert_status_ok();

        let value: serde_json::Value = response.json();
        assert_eq!(value["data"]["status"], "completed");
        assert_eq!(value["data"]["confidenceScore"], 1.0);
        assert_eq!(value["data"]["etymology"]["originalForm"], "φιλοσοφία");
        assert_eq!(value["data"]["morphology"]["explanation"], "philo (amor) + sophia (sabedoria)");
        assert_eq!(value["data"]["relatedWords"][0]["relationship"], "related");
        assert_eq!(value["data"]["relatedWords"][1]["relationship"], "cognate");
        assert_eq!(value["data"]["curiosities"], json!(["Disciplina acadêmica."]));
        assert!(value["rawResponse"].as_str().unwrap().contains("philosophia"));
        let first_id = value["data"]["analysisId"].clone();

        let origin = state.store.get_word_origin_by_word("filosofia").await.unwrap().unwrap();
        assert_eq!(origin.language, "Grego");

        // 10 for the analysis plus the explorer achievement
        let stored_user = state.store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored_user.xp, 210);
        assert_eq!(stored_user.level, 2);

        let response = server.post("/analyze/").authorization_bearer(token).json(&json!({"word": "filosofia"})).await;
        let value: serde_json::Value = response.json();
        assert_eq!(value["data"]["analysisId"], first_id);
        assert_eq!(generator.calls(), 2);

        assert_eq!(state.store.get_user(user.id).await.unwrap().unwrap().xp, 220);
        assert_eq!(state.store.list_popular(10).await.unwrap()[0].search_count, 2);

        let usage = state.store.system_counts(Utc::now() - chrono::Duration::days(1)).await.unwrap();
        assert_eq!(usage.api_calls_total, 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_analyze_rejects_invalid_words_without_calling_provider() {
        let (state, generator) = replying_state(FILOSOFIA);
        let (_, token) = create_test_user(&state, "ana", false).await;
        let server = server(state);

        for body in [json!({}), json!({"word": "  "}), json!({"word": "<script>"}), json!({"word": "abc123"})] {
            let response = server.post("/analyze/").authorization_bearer(token.clone()).json(&body).await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
        assert_eq!(generator.calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_analyze_requires_authentication() {
        let server = server(create_test_state());
        let response = server.post("/analyze/").json(&json!({"word": "filosofia"})).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[test_log::test(tokio::test)]
    async fn test_analyze_with_images_falls_back_to_static() {
        let state = create_test_state();
        let (_, token) = create_test_user(&state, "ana", false).await;
        let server = server(state);

        let response = server
            .post("/analyze/")
            .authorization_bearer(token)
            .json(&json!({"word": "biblioteca", "includeImages": true}))
            .await;
        response.assert_status_ok();

        let body: AnalyzeResponse = response.json();
        let image = body.data.image.unwrap();
        assert_eq!(image.source, ImageSource::Fallback);
        assert!(image.image_url.starts_with("https://"));
    }

    #[test_log::test(tokio::test)]
    async fn test_analyze_reuses_completed_analysis() {
        let (mut state, generator) = replying_state(FILOSOFIA);
        state.config.analysis.reuse_completed = true;
        let (_, token) = create_test_user(&state, "ana", false).await;
        let server = server(state);

        server
            .post("/analyze/")
            .authorization_bearer(token.clone())
            .json(&json!({"word": "filosofia"}))
            .await
            .assert_status_ok();

        let response = server.post("/analyze/").authorization_bearer(token.clone()).json(&json!({"word": "filosofia"})).await;
        let body: AnalyzeResponse = response.json();
        assert_eq!(body.data.status, AnalysisStatus::Cached);
        assert_eq!(body.data.etymology.meaning, "sabedoria");
        assert_eq!(generator.calls(), 1);

        let response = server
            .post("/analyze/")
            .authorization_bearer(token)
            .json(&json!({"word": "filosofia", "refresh": true}))
            .await;
        let body: AnalyzeResponse = response.json();
        assert_eq!(body.data.status, AnalysisStatus::Completed);
        assert_eq!(generator.calls(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_generate_image_uses_generator() {
        let images = Arc::new(MockImageGenerator::with_url("https://images.example.com/filosofia.png"));
        let state = create_test_state_with(
            Arc::new(MockTextGenerator::failing("down")),
            images.clone(),
            Arc::new(MockStockPhotos::unconfigured()),
        );
        let (_, token) = create_test_user(&state, "ana", false).await;
        let server = server(state);

        let response = server
            .post("/generate-image/")
            .authorization_bearer(token.clone())
            .json(&json!({"word": "filosofia", "etymology": "amor à sabedoria"}))
            .await;
        response.assert_status_ok();

        let value: serde_json::Value = response.json();
        assert_eq!(value["success"], true);
        assert_eq!(value["source"], "dalle");
        assert_eq!(value["imageUrl"], "https://images.example.com/filosofia.png");
        assert!(value["prompt"].as_str().unwrap().contains("filosofia"));
        assert_eq!(images.calls(), 1);

        let response = server.post("/generate-image/").authorization_bearer(token).json(&json!({})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[test_log::test(tokio::test)]
    async fn test_featured_words() {
        let (state, _) = replying_state(FILOSOFIA);
        let (_, student) = create_test_user(&state, "ana", false).await;
        let (_, staff) = create_test_user(&state, "prof", true).await;
        let server = server(state);

        let response = server.get("/featured/").authorization_bearer(student.clone()).await;
        let body: FeaturedWordsResponse = response.json();
        let words: Vec<_> = body.featured_words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, ["filosofia", "democracia", "biblioteca"]);

        // No word origin yet
        let response = server
            .post("/featured/")
            .authorization_bearer(staff.clone())
            .json(&json!({"word": "filosofia"}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        server
            .post("/analyze/")
            .authorization_bearer(student.clone())
            .json(&json!({"word": "filosofia"}))
            .await
            .assert_status_ok();

        let response = server
            .post("/featured/")
            .authorization_bearer(student.clone())
            .json(&json!({"word": "filosofia"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .post("/featured/")
            .authorization_bearer(staff.clone())
            .json(&json!({"word": "filosofia", "custom_description": "Palavra da semana"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let featured: FeaturedWordResponse = response.json();
        assert_eq!(featured.word, "filosofia");

        let response = server.post("/featured/").authorization_bearer(staff).json(&json!({"word": "filosofia"})).await;
        response.assert_status(StatusCode::CONFLICT);

        let response = server.get("/featured/").authorization_bearer(student).await;
        let body: FeaturedWordsResponse = response.json();
        assert_eq!(body.featured_words.len(), 1);
        assert_eq!(body.featured_words[0].origin, "Grego");
        assert_eq!(body.featured_words[0].meaning, "Palavra da semana");
    }

    #[test_log::test(tokio::test)]
    async fn test_analyses_listing_and_detail() {
        let state = create_test_state();
        let (_, ana) = create_test_user(&state, "ana", false).await;
        let (_, bia) = create_test_user(&state, "bia", false).await;
        let server = server(state);

        for word in ["filosofia", "democracia"] {
            server
                .post("/analyze/")
                .authorization_bearer(ana.clone())
                .json(&json!({"word": word}))
                .await
                .assert_status_ok();
        }

        let response = server.get("/analyses/").authorization_bearer(ana.clone()).await;
        let analyses: Vec<AnalysisResponse> = response.json();
        assert_eq!(analyses.len(), 2);

        let response = server.get("/analyses/?limit=1").authorization_bearer(ana.clone()).await;
        let page: Vec<AnalysisResponse> = response.json();
        assert_eq!(page.len(), 1);

        let response = server.get("/analyses/").authorization_bearer(bia.clone()).await;
        let empty: Vec<AnalysisResponse> = response.json();
        assert!(empty.is_empty());

        let id = analyses[0].id;
        let response = server.get(&format!("/analyses/{id}/")).authorization_bearer(ana.clone()).await;
        response.assert_status_ok();
        let detail: AnalysisResponse = response.json();
        assert_eq!(detail.view_count, 1);
        assert!(detail.last_viewed.is_some());
        assert_eq!(detail.is_bookmarked, Some(false));

        let response = server.get(&format!("/analyses/{id}/")).authorization_bearer(bia).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(tokio::test)]
    async fn test_popular_words() {
        let state = create_test_state();
        let (_, token) = create_test_user(&state, "ana", false).await;
        let server = server(state);

        for word in ["filosofia", "filosofia", "democracia"] {
            server
                .post("/analyze/")
                .authorization_bearer(token.clone())
                .json(&json!({"word": word}))
                .await
                .assert_status_ok();
        }

        let response = server.get("/popular/?limit=1").authorization_bearer(token).await;
        let popular: Vec<PopularSearchResponse> = response.json();
        assert_eq!(popular.len(), 1);
        assert_eq!(popular[0].word, "filosofia");
        assert_eq!(popular[0].search_count, 2);
    }
}
