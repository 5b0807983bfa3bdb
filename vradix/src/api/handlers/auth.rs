use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, LoginRequest, LogoutResponse, RefreshRequest, RefreshResponse, RegisterRequest},
        users::UserResponse,
    },
    auth::{
        password::{self, Argon2Params},
        session::{self, TokenType},
    },
    db::{handlers::UserStore, models::users::UserCreateDBRequest},
    errors::Error,
};

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid credentials".to_string()),
    }
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register/",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Missing fields, invalid password or existing account"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    if !state.config.auth.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    let (Some(email), Some(password), Some(username)) = (
        required(request.email).map(|email| email.to_lowercase()),
        request.password.filter(|p| !p.is_empty()),
        required(request.username),
    ) else {
        return Err(Error::BadRequest {
            message: "Email, password and username required".to_string(),
        });
    };

    password::validate_length(&password, &state.config.auth.password)?;

    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(Error::BadRequest {
            message: "Email already exists".to_string(),
        });
    }
    if state.store.get_user_by_username(&username).await?.is_some() {
        return Err(Error::BadRequest {
            message: "Username already exists".to_string(),
        });
    }

    let password_hash = password::hash_password(password, Argon2Params::from(&state.config.auth.password)).await?;

    let user = state
        .store
        .create_user(&UserCreateDBRequest {
            email,
            username,
            password_hash,
            user_type: request.user_type.unwrap_or_default(),
            is_staff: false,
            institution: required(request.institution),
        })
        .await?;
    info!(user_id = %user.id, "User registered");

    let tokens = session::issue_token_pair(user.id, &user.username, &state.config)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access: tokens.access,
            refresh: tokens.refresh,
            user: UserResponse::from(user),
        }),
    ))
}

/// Log in with email or username and password
#[utoipa::path(
    post,
    path = "/api/auth/login/",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<AuthResponse>, Error> {
    let email = required(request.email);
    let username = required(request.username);
    let Some(password) = request.password.filter(|p| !p.is_empty()) else {
        return Err(Error::BadRequest {
            message: "Email and password required".to_string(),
        });
    };

    let user = match (email, username) {
        (Some(email), _) => state.store.get_user_by_email(&email.to_lowercase()).await?,
        (None, Some(username)) => state.store.get_user_by_username(&username).await?,
        (None, None) => {
            return Err(Error::BadRequest {
                message: "Email and password required".to_string(),
            });
        }
    };
    let user = user.ok_or_else(invalid_credentials)?;

    if !password::verify_password(password, user.password_hash.clone()).await? {
        return Err(invalid_credentials());
    }

    let tokens = session::issue_token_pair(user.id, &user.username, &state.config)?;
    Ok(Json(AuthResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        user: UserResponse::from(user),
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh/",
    request_body = RefreshRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, Json(request): Json<RefreshRequest>) -> Result<Json<RefreshResponse>, Error> {
    let Some(token) = required(request.refresh) else {
        return Err(Error::BadRequest {
            message: "Refresh token required".to_string(),
        });
    };

    let claims = session::verify_token(&token, TokenType::Refresh, &state.config)?;
    let user = state.store.get_user(claims.sub).await?.ok_or(Error::Unauthenticated {
        message: Some("User no longer exists".to_string()),
    })?;

    Ok(Json(RefreshResponse {
        access: session::create_token(user.id, &user.username, TokenType::Access, &state.config)?,
    }))
}

/// Log out. Tokens are stateless, so clients just discard them.
#[utoipa::path(
    post,
    path = "/api/auth/logout/",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = LogoutResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TEST_PASSWORD, create_test_state, create_test_user};
    use axum::routing::post;
    use axum_test::TestServer;
    use serde_json::json;

    fn server(state: AppState) -> TestServer {
        let app = axum::Router::new()
            .route("/register/", post(register))
            .route("/login/", post(login))
            .route("/refresh/", post(refresh))
            .route("/logout/", post(logout))
            .with_state(state);
        TestServer::new(app).unwrap()
    }

    #[test_log::test(tokio::test)]
    async fn test_register_success() {
        let state = create_test_state();
        let server = server(state.clone());

        let response = server
            .post("/register/")
            .json(&json!({
                "email": "Ana@Example.com",
                "password": "password123",
                "username": "ana",
                "user_type": "teacher"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: AuthResponse = response.json();
        assert_eq!(body.user.email, "ana@example.com");
        assert_eq!(body.user.level, 1);
        assert_eq!(body.user.xp, 0);

        let claims = session::verify_token(&body.access, TokenType::Access, &state.config).unwrap();
        assert_eq!(claims.sub, body.user.id);
        assert!(session::verify_token(&body.refresh, TokenType::Refresh, &state.config).is_ok());
    }

    #[test_log::test(tokio::test)]
    async fn test_register_rejects_missing_and_duplicate() {
        let state = create_test_state();
        create_test_user(&state, "ana", false).await;
        let server = server(state);

        let response = server.post("/register/").json(&json!({"email": "x@example.com"})).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post("/register/")
            .json(&json!({"email": "ana@example.com", "password": "password123", "username": "other"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"error": "Email already exists"}));

        let response = server
            .post("/register/")
            .json(&json!({"email": "new@example.com", "password": "password123", "username": "ana"}))
            .await;
        response.assert_json(&json!({"error": "Username already exists"}));

        let response = server
            .post("/register/")
            .json(&json!({"email": "new@example.com", "password": "short", "username": "bia"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[test_log::test(tokio::test)]
    async fn test_register_disabled() {
        let mut state = create_test_state();
        state.config.auth.allow_registration = false;
        let server = server(state);

        let response = server
            .post("/register/")
            .json(&json!({"email": "ana@example.com", "password": "password123", "username": "ana"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[test_log::test(tokio::test)]
    async fn test_login_by_email_or_username() {
        let state = create_test_state();
        let (user, _) = create_test_user(&state, "ana", false).await;
        let server = server(state);

        let response = server
            .post("/login/")
            .json(&json!({"email": "ana@example.com", "password": TEST_PASSWORD}))
            .await;
        response.assert_status_ok();
        let body: AuthResponse = response.json();
        assert_eq!(body.user.id, user.id);

        let response = server.post("/login/").json(&json!({"username": "ana", "password": TEST_PASSWORD})).await;
        response.assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_login_failures() {
        let state = create_test_state();
        create_test_user(&state, "ana", false).await;
        let server = server(state);

        let response = server.post("/login/").json(&json!({"email": "ana@example.com"})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"error": "Email and password required"}));

        let response = server
            .post("/login/")
            .json(&json!({"email": "ana@example.com", "password": "wrong-password"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({"error": "Invalid credentials"}));

        let response = server
            .post("/login/")
            .json(&json!({"email": "nobody@example.com", "password": TEST_PASSWORD}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[test_log::test(tokio::test)]
    async fn test_refresh_issues_access_token() {
        let state = create_test_state();
        let (user, access) = create_test_user(&state, "ana", false).await;
        let refresh_token = session::create_token(user.id, &user.username, TokenType::Refresh, &state.config).unwrap();
        let server = server(state.clone());

        let response = server.post("/refresh/").json(&json!({"refresh": refresh_token})).await;
        response.assert_status_ok();
        let body: RefreshResponse = response.json();
        assert!(session::verify_token(&body.access, TokenType::Access, &state.config).is_ok());

        // An access token is not a refresh token
        let response = server.post("/refresh/").json(&json!({"refresh": access})).await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server.post("/refresh/").json(&json!({"refresh": "garbage"})).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[test_log::test(tokio::test)]
    async fn test_logout() {
        let server = server(create_test_state());
        let response = server.post("/logout/").await;
        response.assert_status_ok();
        let body: LogoutResponse = response.json();
        assert_eq!(body.message, "Logged out successfully");
    }
}
