use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session::{self, TokenType},
    db::handlers::UserStore,
    errors::{Error, Result},
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Extract the bearer token from the Authorization header
/// Returns:
/// - None: No Authorization header present
/// - Some(Ok(token)): Bearer token found
/// - Some(Err(error)): Header present but not a bearer credential
fn bearer_token(parts: &Parts) -> Option<Result<&str>> {
    let header = parts.headers.get(AUTHORIZATION)?;

    let value = match header.to_str() {
        Ok(value) => value,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => Some(Ok(token.trim())),
        _ => Some(Err(Error::Unauthenticated {
            message: Some("Invalid authorization header".to_string()),
        })),
    }
}

#[instrument(skip(parts, state))]
async fn authenticate(parts: &Parts, state: &AppState) -> Option<Result<CurrentUser>> {
    let token = match bearer_token(parts)? {
        Ok(token) => token,
        Err(e) => return Some(Err(e)),
    };

    let claims = match session::verify_token(token, TokenType::Access, &state.config) {
        Ok(claims) => claims,
        Err(e) => {
            trace!("Access token rejected: {:?}", e);
            return Some(Err(e));
        }
    };

    // A deleted account stops authenticating even with an unexpired token
    match state.store.get_user(claims.sub).await {
        Ok(Some(user)) => {
            debug!("Authenticated user: {}", user.id);
            Some(Ok(CurrentUser::from(user)))
        }
        Ok(None) => Some(Err(Error::Unauthenticated {
            message: Some("User no longer exists".to_string()),
        })),
        Err(e) => Some(Err(Error::Database(e))),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        authenticate(parts, state).await.unwrap_or(Err(Error::Unauthenticated { message: None }))
    }
}

/// Endpoints that work for anonymous callers see `None` when no credentials were sent; bad
/// credentials are still rejected.
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        authenticate(parts, state).await.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_state, create_test_user};
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/profile/");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_valid_bearer_token() {
        let state = create_test_state();
        let (user, token) = create_test_user(&state, "ana", false).await;

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let current = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(current.username, "ana");
        assert!(!current.is_staff);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthenticated() {
        let state = create_test_state();
        let mut parts = parts_with_auth(None);

        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { message: None }));

        let optional = <CurrentUser as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(optional.is_none());
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_authenticate() {
        let state = create_test_state();
        let (user, _) = create_test_user(&state, "ana", false).await;
        let refresh = session::create_token(user.id, &user.username, TokenType::Refresh, &state.config).unwrap();

        let mut parts = parts_with_auth(Some(&format!("Bearer {refresh}")));
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_rejected() {
        let state = create_test_state();
        let mut parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));

        let err = <CurrentUser as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }
}
