//! Verification of the hosted auth provider's bearer tokens.
//!
//! This service never mints credentials. Sign-up, sign-in, and session
//! management all live with the external provider; requests arrive with
//! a signed token whose claims carry the stable external user id plus
//! profile fields. Absence of a token means "anonymous".

use axum::{
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::ErrorResponse;

/// Claims carried by the provider's token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Stable external user id
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid authentication token: {0}")]
    InvalidToken(String),

    #[error("Auth verifier not configured")]
    VerifierUnavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::VerifierUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        };
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.to_string(),
            code: Some("unauthorized".to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(err)).into_response()
    }
}

/// Validates tokens issued by the hosted auth provider
#[derive(Clone)]
pub struct AuthVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthVerifier {
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// The authenticated caller, extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl AuthUser {
    /// Display name with the same fallback chain the storefront uses
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "Customer".to_string())
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

fn verify_from_parts(parts: &Parts) -> Result<AuthUser, AuthError> {
    let verifier = parts
        .extensions
        .get::<Arc<AuthVerifier>>()
        .ok_or(AuthError::VerifierUnavailable)?;

    let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
    let claims = verifier.verify(token)?;

    Ok(AuthUser {
        user_id: claims.sub,
        name: claims.name,
        email: claims.email,
    })
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        verify_from_parts(parts)
    }
}

/// Optional variant for routes that serve both anonymous and signed-in
/// callers. A present-but-invalid token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if bearer_token(parts).is_none() {
            return Ok(MaybeAuthUser(None));
        }
        verify_from_parts(parts).map(|user| MaybeAuthUser(Some(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test_secret_key_for_auth_verification_tests";

    fn token_for(sub: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            name: Some("Test Buyer".to_string()),
            email: Some("buyer@example.com".to_string()),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("failed to encode test token")
    }

    #[test]
    fn verifies_valid_token() {
        let verifier = AuthVerifier::new(SECRET, None);
        let claims = verifier.verify(&token_for("user_123")).unwrap();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.email.as_deref(), Some("buyer@example.com"));
    }

    #[test]
    fn rejects_token_with_wrong_secret() {
        let verifier = AuthVerifier::new("a_completely_different_secret_value", None);
        assert!(verifier.verify(&token_for("user_123")).is_err());
    }

    #[test]
    fn display_name_falls_back_to_email_then_default() {
        let user = AuthUser {
            user_id: "u1".into(),
            name: None,
            email: Some("a@b.c".into()),
        };
        assert_eq!(user.display_name(), "a@b.c");

        let user = AuthUser {
            user_id: "u1".into(),
            name: None,
            email: None,
        };
        assert_eq!(user.display_name(), "Customer");
    }
}
