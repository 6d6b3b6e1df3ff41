//! JWT authentication module.
//!
//! Token generation and validation, password hashing, and the [`AuthShop`]
//! extractor that scopes every protected handler to one shop.
//!
//! ```text
//!  POST /api/auth/login ──► verify argon2 hash ──► access + refresh token
//!
//!  GET /api/stock
//!  Authorization: Bearer <access token>
//!        │
//!        ▼
//!  AuthShop extractor ── invalid/expired ──► 401 UNAUTHORIZED
//!        │
//!        ▼
//!  handler(shop: AuthShop)  →  db.stock().list(&shop.shop_id)
//! ```

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (shop_id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

/// JWT token manager.
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    /// Access token lifetime, reported to clients as `expiresIn`.
    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    pub fn generate_access_token(&self, shop_id: &str) -> ApiResult<String> {
        self.generate(shop_id, ACCESS, self.access_lifetime_secs)
    }

    pub fn generate_refresh_token(&self, shop_id: &str) -> ApiResult<String> {
        self.generate(shop_id, REFRESH, self.refresh_lifetime_secs)
    }

    fn generate(&self, shop_id: &str, token_type: &str, lifetime_secs: i64) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            sub: shop_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to generate {} token: {}", token_type, e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let token_data: TokenData<Claims> =
            decode(token, &self.decoding_key, &Validation::default()).map_err(|e| {
                debug!(error = %e, "Token rejected");
                ApiError::unauthorized("Invalid or expired token")
            })?;

        Ok(token_data.claims)
    }

    pub fn validate_access_token(&self, token: &str) -> ApiResult<Claims> {
        self.validate_typed(token, ACCESS)
    }

    pub fn validate_refresh_token(&self, token: &str) -> ApiResult<Claims> {
        self.validate_typed(token, REFRESH)
    }

    fn validate_typed(&self, token: &str, expected: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;

        if claims.token_type != expected {
            return Err(ApiError::unauthorized(format!("Expected {} token", expected)));
        }

        Ok(claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage (argon2id, random salt).
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Extractor
// =============================================================================

/// The shop making the request, taken from a valid access token.
#[derive(Debug, Clone)]
pub struct AuthShop {
    pub shop_id: String,
}

impl FromRequestParts<Arc<AppState>> for AuthShop {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Expected a Bearer token"))?;

        let claims = state.jwt.validate_access_token(token)?;
        Ok(AuthShop { shop_id: claims.sub })
    }
}
