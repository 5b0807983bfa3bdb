use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        corrections::{CorrectionCreate, CorrectionResponse},
        users::CurrentUser,
    },
    db::{
        errors::DbError,
        handlers::{AnalysisStore, CorrectionStore},
        models::{
            analyses::AnalysisDBResponse,
            corrections::{CorrectableField, CorrectionCreateDBRequest},
        },
    },
    errors::Error,
    types::{AnalysisId, CorrectionId, abbrev_uuid},
};

/// Current value of `field` on the analysis
fn current_value(analysis: &AnalysisDBResponse, field: CorrectableField) -> &str {
    match field {
        CorrectableField::OriginalLanguage => &analysis.original_language,
        CorrectableField::OriginalForm => &analysis.original_form,
        CorrectableField::Transliteration => &analysis.transliteration,
        CorrectableField::Prefix => &analysis.prefix,
        CorrectableField::PrefixMeaning => &analysis.prefix_meaning,
        CorrectableField::Root => &analysis.root,
        CorrectableField::RootMeaning => &analysis.root_meaning,
        CorrectableField::Suffix => &analysis.suffix,
        CorrectableField::SuffixMeaning => &analysis.suffix_meaning,
        CorrectableField::EtymologyExplanation => &analysis.etymology_explanation,
        CorrectableField::HistoricalContext => &analysis.historical_context,
        CorrectableField::ModernUsage => &analysis.modern_usage,
    }
}

async fn get_analysis_or_404(state: &AppState, id: AnalysisId) -> Result<AnalysisDBResponse, Error> {
    state.store.get_analysis(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Analysis".to_string(),
        id: id.to_string(),
    })
}

/// Propose a correction to one field of an analysis
#[utoipa::path(
    post,
    path = "/api/etymology/analyses/{id}/corrections/",
    request_body = CorrectionCreate,
    tag = "corrections",
    params(("id" = uuid::Uuid, Path, description = "Analysis ID")),
    responses(
        (status = 201, description = "Correction submitted for review", body = CorrectionResponse),
        (status = 400, description = "Missing value or field that cannot be corrected"),
        (status = 404, description = "Analysis not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(analysis_id = %abbrev_uuid(&id)))]
pub async fn create_correction(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<AnalysisId>,
    Json(request): Json<CorrectionCreate>,
) -> Result<(StatusCode, Json<CorrectionResponse>), Error> {
    let (Some(field_name), Some(corrected_value)) = (
        request.field_name.map(|f| f.trim().to_string()).filter(|f| !f.is_empty()),
        request.corrected_value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
    ) else {
        return Err(Error::BadRequest {
            message: "field_name and corrected_value required".to_string(),
        });
    };
    let field = field_name.parse::<CorrectableField>().map_err(|message| Error::BadRequest { message })?;

    let analysis = get_analysis_or_404(&state, id).await?;

    let correction = state
        .store
        .create_correction(&CorrectionCreateDBRequest {
            analysis_id: analysis.id,
            user_id: user.id,
            field_name: field,
            original_value: current_value(&analysis, field).to_string(),
            corrected_value,
            explanation: request.explanation.unwrap_or_default(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CorrectionResponse::from(correction))))
}

/// Corrections proposed for an analysis, newest first
#[utoipa::path(
    get,
    path = "/api/etymology/analyses/{id}/corrections/",
    tag = "corrections",
    params(("id" = uuid::Uuid, Path, description = "Analysis ID")),
    responses(
        (status = 200, description = "Corrections for the analysis", body = [CorrectionResponse]),
        (status = 404, description = "Analysis not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(analysis_id = %abbrev_uuid(&id)))]
pub async fn list_corrections(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<AnalysisId>,
) -> Result<Json<Vec<CorrectionResponse>>, Error> {
    get_analysis_or_404(&state, id).await?;
    let corrections = state.store.list_corrections(id).await?;
    Ok(Json(corrections.into_iter().map(CorrectionResponse::from).collect()))
}

/// Approve a pending correction and apply it (staff only)
#[utoipa::path(
    post,
    path = "/api/etymology/corrections/{id}/approve/",
    tag = "corrections",
    params(("id" = uuid::Uuid, Path, description = "Correction ID")),
    responses(
        (status = 200, description = "Correction approved and applied", body = CorrectionResponse),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Correction not found"),
        (status = 409, description = "Correction already approved"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(correction_id = %abbrev_uuid(&id)))]
pub async fn approve_correction(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CorrectionId>,
) -> Result<Json<CorrectionResponse>, Error> {
    user.require_staff("approve corrections")?;

    // An already-approved row surfaces from the store as a conflict
    let approved = state.store.approve_correction(id, user.id).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "Correction".to_string(),
            id: id.to_string(),
        },
        e => Error::Database(e),
    })?;
    info!(field = approved.field_name.column(), "Correction approved");
    Ok(Json(CorrectionResponse::from(approved)))
}
