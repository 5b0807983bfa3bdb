//! JWT access and refresh token creation and verification.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::Config, errors::Error, types::UserId};

/// Which of the two tokens a JWT is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: UserId,           // Subject (user ID)
    pub username: String,      // Username
    pub token_type: TokenType, // Access or refresh
    pub jti: Uuid,             // Token ID
    pub exp: i64,              // Expiration time
    pub iat: i64,              // Issued at
}

impl TokenClaims {
    pub fn new(user_id: UserId, username: &str, token_type: TokenType, config: &Config) -> Self {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => config.auth.access_token_expiry,
            TokenType::Refresh => config.auth.refresh_token_expiry,
        };
        let exp = now + lifetime;

        Self {
            sub: user_id,
            username: username.to_string(),
            token_type,
            jti: Uuid::new_v4(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT tokens: secret_key is required".to_string(),
    })
}

/// Create a signed token of the given type for a user
pub fn create_token(user_id: UserId, username: &str, token_type: TokenType, config: &Config) -> Result<String, Error> {
    let claims = TokenClaims::new(user_id, username, token_type, config);
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify and decode a token, requiring it to be of `expected` type
pub fn verify_token(token: &str, expected: TokenType, config: &Config) -> Result<TokenClaims, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<TokenClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated {
            message: Some("Invalid or expired token".to_string()),
        },

        // Server errors (500) - key issues, internal failures
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    if token_data.claims.token_type != expected {
        return Err(Error::Unauthenticated {
            message: Some("Invalid token type".to_string()),
        });
    }

    Ok(token_data.claims)
}

/// Access and refresh tokens issued together at login and registration
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn issue_token_pair(user_id: UserId, username: &str, config: &Config) -> Result<TokenPair, Error> {
    Ok(TokenPair {
        access: create_token(user_id, username, TokenType::Access, config)?,
        refresh: create_token(user_id, username, TokenType::Refresh, config)?,
    })
}
