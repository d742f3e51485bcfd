use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::ConfigError, error::ServiceError, models::Role};

/// Lifetime of a session token.
pub const TOKEN_TTL_HOURS: i64 = 72;

const MISSING_TOKEN: &str = "Missing or invalid token";
const INVALID_TOKEN: &str = "Invalid or expired token";

/// Claims
///
/// The payload signed into every session token. Identity and role travel in the
/// token itself, so verification never touches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub role: Role,
    /// Expiration Time (exp): seconds since the epoch after which the token is rejected.
    pub exp: i64,
    /// Issued At (iat)
    pub iat: i64,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: who is calling and with
/// which role. Produced only by `TokenService::verify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// TokenService
///
/// Issues and verifies HS256 session tokens with the server secret. Built once at
/// startup and shared through the application state.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    /// Creates a service issuing tokens valid for `TOKEN_TTL_HOURS`.
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        Self::with_ttl(secret, Duration::hours(TOKEN_TTL_HOURS))
    }

    /// Same as `new` with a custom lifetime. A negative `ttl` issues tokens that
    /// are already expired.
    pub fn with_ttl(secret: &str, ttl: Duration) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET"));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// issue
    ///
    /// Signs a token carrying `user_id` and `role`, expiring `ttl` from now.
    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::TokenSigning(e.to_string()))
    }

    /// verify
    ///
    /// Accepts only HS256 tokens signed with this secret and not yet expired
    /// (no leeway). Any failure is reported as the same `Unauthenticated` error.
    pub fn verify(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            ServiceError::Unauthenticated(INVALID_TOKEN.to_string())
        })?;

        Ok(AuthUser {
            id: data.claims.user_id,
            role: data.claims.role,
        })
    }
}

/// extract_bearer
///
/// Returns the token from an `Authorization: Bearer <token>` header, or `None`
/// when the header is missing, not UTF-8, or uses another scheme.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument. When the auth middleware has
/// already verified the request, the identity it stored in the request extensions
/// is reused; otherwise the bearer token is verified here.
///
/// Rejection: `ServiceError::Unauthenticated` (401).
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let token = extract_bearer(&parts.headers)
            .ok_or_else(|| ServiceError::Unauthenticated(MISSING_TOKEN.to_string()))?;

        TokenService::from_ref(state).verify(token)
    }
}
