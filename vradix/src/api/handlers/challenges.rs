use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        challenges::{ChallengeCreate, ChallengeResponse, CompleteChallengeRequest, CompleteChallengeResponse},
        profile::AchievementResponse,
        users::{CurrentUser, UserResponse},
    },
    db::{handlers::ChallengeStore, models::challenges::ChallengeCreateDBRequest},
    errors::Error,
    gamification::{CHALLENGE_BEGINNER, award_xp, level_for_xp},
    types::{ChallengeId, abbrev_uuid},
};

const DEFAULT_XP_REWARD: i32 = 50;
const MAX_XP_REWARD: i32 = 10_000;

/// Active challenges with the caller's progress
#[utoipa::path(
    get,
    path = "/api/challenges/",
    tag = "challenges",
    responses(
        (status = 200, description = "Active challenges", body = [ChallengeResponse]),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_challenges(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<ChallengeResponse>>, Error> {
    let challenges = state.store.list_active_challenges(user.id).await?;
    Ok(Json(challenges.into_iter().map(ChallengeResponse::from).collect()))
}

/// Create a challenge (staff only)
#[utoipa::path(
    post,
    path = "/api/challenges/",
    request_body = ChallengeCreate,
    tag = "challenges",
    responses(
        (status = 201, description = "Challenge created", body = ChallengeResponse),
        (status = 400, description = "Missing title or reward out of range"),
        (status = 403, description = "Staff only"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_challenge(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ChallengeCreate>,
) -> Result<(StatusCode, Json<ChallengeResponse>), Error> {
    user.require_staff("create challenges")?;

    let title = request.title.trim();
    if title.is_empty() {
        return Err(Error::BadRequest {
            message: "Title required".to_string(),
        });
    }
    let xp_reward = request.xp_reward.unwrap_or(DEFAULT_XP_REWARD);
    if !(0..=MAX_XP_REWARD).contains(&xp_reward) {
        return Err(Error::BadRequest {
            message: format!("xp_reward must be between 0 and {MAX_XP_REWARD}"),
        });
    }

    let challenge = state
        .store
        .create_challenge(&ChallengeCreateDBRequest {
            title: title.to_string(),
            description: request.description,
            challenge_type: request.challenge_type,
            difficulty: request.difficulty,
            xp_reward,
        })
        .await?;
    info!(challenge_id = %abbrev_uuid(&challenge.id), "Challenge created");

    Ok((StatusCode::CREATED, Json(ChallengeResponse::from(challenge))))
}

/// Complete a challenge and collect its XP reward
#[utoipa::path(
    post,
    path = "/api/challenges/{id}/complete/",
    request_body = CompleteChallengeRequest,
    tag = "challenges",
    params(("id" = uuid::Uuid, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Challenge completed", body = CompleteChallengeResponse),
        (status = 404, description = "Challenge not found"),
        (status = 409, description = "Challenge already completed"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(challenge_id = %abbrev_uuid(&id)))]
pub async fn complete_challenge(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ChallengeId>,
    request: Option<Json<CompleteChallengeRequest>>,
) -> Result<Json<CompleteChallengeResponse>, Error> {
    let Json(request) = request.unwrap_or_default();

    let challenge = match state.store.get_challenge(id).await? {
        Some(challenge) if challenge.is_active => challenge,
        _ => {
            return Err(Error::NotFound {
                resource: "Challenge".to_string(),
                id: id.to_string(),
            });
        }
    };

    state.store.complete_challenge(user.id, challenge.id, request.score).await?;

    let unlocks = if state.store.count_completed_challenges(user.id).await? == 1 {
        vec![CHALLENGE_BEGINNER]
    } else {
        Vec::new()
    };
    let award = award_xp(state.store.as_ref(), user.id, challenge.xp_reward, &unlocks).await?;

    let xp_awarded = award.achievements.iter().fold(challenge.xp_reward, |total, a| total.saturating_add(a.xp));
    let leveled_up = award.leveled_up();
    Ok(Json(CompleteChallengeResponse {
        xp_awarded,
        leveled_up,
        level_progress: level_for_xp(award.user.xp),
        user: UserResponse::from(award.user),
        achievements_unlocked: award.achievements.into_iter().map(AchievementResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_state, create_test_user};
    use axum::routing::{get, post};
    use axum_test::TestServer;
    use serde_json::json;

    async fn setup() -> (TestServer, String, String) {
        let state = create_test_state();
        let (_, student) = create_test_user(&state, "ana", false).await;
        let (_, staff) = create_test_user(&state, "prof", true).await;

        let app = axum::Router::new()
            .route("/challenges/", get(list_challenges).post(create_challenge))
            .route("/challenges/{id}/complete/", post(complete_challenge))
            .with_state(state);
        (TestServer::new(app).unwrap(), student, staff)
    }

    fn quiz(xp_reward: Option<i32>) -> serde_json::Value {
        json!({
            "title": "Raízes gregas",
            "description": "Identifique a raiz",
            "challenge_type": "quiz",
            "difficulty": "easy",
            "xp_reward": xp_reward
        })
    }

    #[test_log::test(tokio::test)]
    async fn test_create_challenge_requires_staff() {
        let (server, student, staff) = setup().await;

        let response = server.post("/challenges/").authorization_bearer(student).json(&quiz(None)).await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server.post("/challenges/").authorization_bearer(staff.clone()).json(&quiz(None)).await;
        response.assert_status(StatusCode::CREATED);
        let challenge: ChallengeResponse = response.json();
        assert_eq!(challenge.xp_reward, DEFAULT_XP_REWARD);
        assert!(challenge.is_active);

        let response = server.post("/challenges/").authorization_bearer(staff).json(&quiz(Some(-5))).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[test_log::test(tokio::test)]
    async fn test_create_challenge_reward_bounds() {
        let (server, _, staff) = setup().await;

        let response = server
            .post("/challenges/")
            .authorization_bearer(staff.clone())
            .json(&quiz(Some(i32::MAX)))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"error": "xp_reward must be between 0 and 10000"}));

        let response = server
            .post("/challenges/")
            .authorization_bearer(staff)
            .json(&quiz(Some(MAX_XP_REWARD)))
            .await;
        response.assert_status(StatusCode::CREATED);
        let challenge: ChallengeResponse = response.json();
        assert_eq!(challenge.xp_reward, MAX_XP_REWARD);
    }

    #[test_log::test(tokio::test)]
    async fn test_complete_challenge_awards_xp_once() {
        let (server, student, staff) = setup().await;

        let response = server.post("/challenges/").authorization_bearer(staff).json(&quiz(Some(80))).await;
        let challenge: ChallengeResponse = response.json();
        let path = format!("/challenges/{}/complete/", challenge.id);

        let response = server.post(&path).authorization_bearer(student.clone()).json(&json!({"score": 9})).await;
        response.assert_status_ok();
        let body: CompleteChallengeResponse = response.json();
        // 80 for the challenge plus 75 for the first-challenge achievement
        assert_eq!(body.xp_awarded, 155);
        assert_eq!(body.user.xp, 155);
        assert_eq!(body.user.level, 2);
        assert!(body.leveled_up);
        assert_eq!(body.level_progress, level_for_xp(155));
        assert_eq!(body.achievements_unlocked.len(), 1);
        assert_eq!(body.achievements_unlocked[0].code, "challenge_beginner");

        let response = server.post(&path).authorization_bearer(student.clone()).json(&json!({"score": 10})).await;
        response.assert_status(StatusCode::CONFLICT);
        response.assert_json(&json!({"error": "Challenge already completed"}));

        let response = server.get("/challenges/").authorization_bearer(student).await;
        let challenges: Vec<ChallengeResponse> = response.json();
        assert_eq!(challenges.len(), 1);
        assert!(challenges[0].completed);
        assert_eq!(challenges[0].score, Some(9));
    }

    #[test_log::test(tokio::test)]
    async fn test_complete_missing_challenge() {
        let (server, student, _) = setup().await;

        let response = server
            .post(&format!("/challenges/{}/complete/", uuid::Uuid::new_v4()))
            .authorization_bearer(student)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
