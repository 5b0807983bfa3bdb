use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        profile::{AchievementResponse, ProfileResponse},
        users::{CurrentUser, UserResponse},
    },
    db::handlers::{ChallengeStore, UserStore},
    errors::Error,
    gamification::level_for_xp,
};

/// The caller's gamification profile
#[utoipa::path(
    get,
    path = "/api/profile/",
    tag = "profile",
    responses(
        (status = 200, description = "Profile with level progress and achievements", body = ProfileResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(State(state): State<AppState>, current: CurrentUser) -> Result<Json<ProfileResponse>, Error> {
    let user = state.store.get_user(current.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: current.id.to_string(),
    })?;

    let achievements = state.store.list_achievements(user.id).await?;
    let completed_challenges = state.store.count_completed_challenges(user.id).await?;

    Ok(Json(ProfileResponse {
        level_progress: level_for_xp(user.xp),
        streak_days: user.streak_days,
        last_activity: user.last_activity,
        institution: user.institution.clone(),
        achievements: achievements.into_iter().map(AchievementResponse::from).collect(),
        completed_challenges,
        user: UserResponse::from(user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::{ETYMOLOGY_EXPLORER, award_xp};
    use crate::test_utils::{create_test_state, create_test_user};
    use axum::routing::get;
    use axum_test::TestServer;

    #[test_log::test(tokio::test)]
    async fn test_profile_of_new_user() {
        let state = create_test_state();
        let (user, token) = create_test_user(&state, "ana", false).await;
        let app = axum::Router::new().route("/profile/", get(get_profile)).with_state(state);
        let server = TestServer::new(app).unwrap();

        let response = server.get("/profile/").authorization_bearer(token).await;
        response.assert_status_ok();
        let profile: ProfileResponse = response.json();
        assert_eq!(profile.user.id, user.id);
        assert_eq!(profile.level_progress.level, 1);
        assert_eq!(profile.level_progress.xp_to_next, 100);
        assert!(profile.achievements.is_empty());
        assert_eq!(profile.completed_challenges, 0);
        assert_eq!(profile.streak_days, 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_profile_reflects_awards() {
        let state = create_test_state();
        let (user, token) = create_test_user(&state, "ana", false).await;
        award_xp(state.store.as_ref(), user.id, 10, &[ETYMOLOGY_EXPLORER]).await.unwrap();

        let app = axum::Router::new().route("/profile/", get(get_profile)).with_state(state);
        let server = TestServer::new(app).unwrap();

        let profile: ProfileResponse = server.get("/profile/").authorization_bearer(token).await.json();
        assert_eq!(profile.user.xp, 210);
        assert_eq!(profile.level_progress, level_for_xp(210));
        assert_eq!(profile.streak_days, 1);
        assert!(profile.last_activity.is_some());
        assert_eq!(profile.achievements.len(), 1);
        assert_eq!(profile.achievements[0].code, "etymology_explorer");
    }
}
