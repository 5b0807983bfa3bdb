use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        bookmarks::{BookmarkCreate, BookmarkResponse, BookmarkUpdate},
        users::CurrentUser,
    },
    db::{
        handlers::{AnalysisStore, BookmarkStore},
        models::bookmarks::{BookmarkCreateDBRequest, BookmarkDBResponse},
    },
    errors::Error,
    types::BookmarkId,
};

fn bookmark_not_found(id: BookmarkId) -> Error {
    Error::NotFound {
        resource: "Bookmark".to_string(),
        id: id.to_string(),
    }
}

/// Load a bookmark owned by the caller; other users' bookmarks are reported as missing
async fn owned_bookmark(state: &AppState, user: &CurrentUser, id: BookmarkId) -> Result<BookmarkDBResponse, Error> {
    match state.store.get_bookmark(id).await? {
        Some(bookmark) if bookmark.user_id == user.id => Ok(bookmark),
        _ => Err(bookmark_not_found(id)),
    }
}

async fn with_word(state: &AppState, bookmark: BookmarkDBResponse) -> Result<BookmarkResponse, Error> {
    let word = state.store.get_analysis(bookmark.analysis_id).await?.map(|analysis| analysis.word);
    Ok(BookmarkResponse::new(bookmark, word))
}

/// The caller's bookmarks, newest first
#[utoipa::path(
    get,
    path = "/api/etymology/bookmarks/",
    tag = "bookmarks",
    responses(
        (status = 200, description = "The caller's bookmarks", body = [BookmarkResponse]),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_bookmarks(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<BookmarkResponse>>, Error> {
    let bookmarks = state.store.list_bookmarks(user.id).await?;

    let mut responses = Vec::with_capacity(bookmarks.len());
    for bookmark in bookmarks {
        responses.push(with_word(&state, bookmark).await?);
    }
    Ok(Json(responses))
}

/// Bookmark an analysis
#[utoipa::path(
    post,
    path = "/api/etymology/bookmarks/",
    request_body = BookmarkCreate,
    tag = "bookmarks",
    responses(
        (status = 201, description = "Bookmark created", body = BookmarkResponse),
        (status = 404, description = "Analysis not found"),
        (status = 409, description = "Analysis already bookmarked"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_bookmark(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<BookmarkCreate>,
) -> Result<(StatusCode, Json<BookmarkResponse>), Error> {
    let analysis = match state.store.get_analysis(request.analysis_id).await? {
        Some(analysis) if user.can_access(analysis.user_id) => analysis,
        _ => {
            return Err(Error::NotFound {
                resource: "Analysis".to_string(),
                id: request.analysis_id.to_string(),
            });
        }
    };

    let bookmark = state
        .store
        .create_bookmark(&BookmarkCreateDBRequest {
            user_id: user.id,
            analysis_id: analysis.id,
            notes: request.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(BookmarkResponse::new(bookmark, Some(analysis.word)))))
}

/// One of the caller's bookmarks
#[utoipa::path(
    get,
    path = "/api/etymology/bookmarks/{id}/",
    tag = "bookmarks",
    params(("id" = uuid::Uuid, Path, description = "Bookmark ID")),
    responses(
        (status = 200, description = "The bookmark", body = BookmarkResponse),
        (status = 404, description = "Bookmark not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_bookmark(State(state): State<AppState>, user: CurrentUser, Path(id): Path<BookmarkId>) -> Result<Json<BookmarkResponse>, Error> {
    let bookmark = owned_bookmark(&state, &user, id).await?;
    Ok(Json(with_word(&state, bookmark).await?))
}

/// Replace a bookmark's notes
#[utoipa::path(
    patch,
    path = "/api/etymology/bookmarks/{id}/",
    request_body = BookmarkUpdate,
    tag = "bookmarks",
    params(("id" = uuid::Uuid, Path, description = "Bookmark ID")),
    responses(
        (status = 200, description = "Bookmark updated", body = BookmarkResponse),
        (status = 404, description = "Bookmark not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_bookmark(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BookmarkId>,
    Json(request): Json<BookmarkUpdate>,
) -> Result<Json<BookmarkResponse>, Error> {
    owned_bookmark(&state, &user, id).await?;
    let bookmark = state.store.update_bookmark_notes(id, &request.notes).await?;
    Ok(Json(with_word(&state, bookmark).await?))
}

/// Remove a bookmark
#[utoipa::path(
    delete,
    path = "/api/etymology/bookmarks/{id}/",
    tag = "bookmarks",
    params(("id" = uuid::Uuid, Path, description = "Bookmark ID")),
    responses(
        (status = 204, description = "Bookmark deleted"),
        (status = 404, description = "Bookmark not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_bookmark(State(state): State<AppState>, user: CurrentUser, Path(id): Path<BookmarkId>) -> Result<StatusCode, Error> {
    owned_bookmark(&state, &user, id).await?;
    if !state.store.delete_bookmark(id).await? {
        return Err(bookmark_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
