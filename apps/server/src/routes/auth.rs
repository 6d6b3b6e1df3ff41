//! # Auth Routes
//!
//! One account per shop: the owner's email and password.
//!
//! ```text
//!  POST /api/auth/signup   { email, password }  ──► 201 TokenResponse
//!  POST /api/auth/login    { email, password }  ──► 200 TokenResponse
//!  POST /api/auth/refresh  { refreshToken }     ──► 200 TokenResponse
//! ```

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shopkeep_core::validation::{validate_email, validate_password};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub shop_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: &'static str,
}

fn issue_tokens(state: &AppState, shop_id: &str) -> ApiResult<TokenResponse> {
    Ok(TokenResponse {
        shop_id: shop_id.to_string(),
        access_token: state.jwt.generate_access_token(shop_id)?,
        refresh_token: state.jwt.generate_refresh_token(shop_id)?,
        expires_in: state.jwt.access_lifetime_secs(),
        token_type: "Bearer",
    })
}

/// Creates a shop with default settings and logs it in.
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Credentials>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    validate_email(&req.email).map_err(|e| ApiError::validation(e.to_string()))?;
    validate_password(&req.password).map_err(|e| ApiError::validation(e.to_string()))?;

    let password_hash = hash_password(&req.password)?;
    let shop = state
        .db
        .shops()
        .create_with_settings(&req.email, &password_hash)
        .await?;

    info!(shop_id = %shop.id, "Shop signed up");
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, &shop.id)?)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Credentials>,
) -> ApiResult<Json<TokenResponse>> {
    let shop = state.db.shops().get_by_email(&req.email).await?;

    // Same answer for unknown email and wrong password
    let shop = match shop {
        Some(shop) if verify_password(&req.password, &shop.password_hash) => shop,
        _ => {
            warn!("Login failed");
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
    };

    info!(shop_id = %shop.id, "Shop logged in");
    Ok(Json(issue_tokens(&state, &shop.id)?))
}

/// Exchanges a refresh token for a new pair.
async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let claims = state.jwt.validate_refresh_token(&req.refresh_token)?;

    // The shop may have been removed since the token was issued
    if state.db.shops().get(&claims.sub).await.is_err() {
        return Err(ApiError::unauthorized("Shop no longer exists"));
    }

    info!(shop_id = %claims.sub, "Token refreshed");
    Ok(Json(issue_tokens(&state, &claims.sub)?))
}
