//! # Shopkeep Server
//!
//! JSON HTTP API for shop owners: stock, customers, sales with dues,
//! expenses and reports.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Shopkeep API                                    │
//! │                                                                         │
//! │  /health                    (public)                                   │
//! │  /api/auth/{signup,login,refresh}   (public)                           │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  stock         │  │  sales         │  │  reports                   ││
//! │  │                │  │                │  │                            ││
//! │  │ • list/search  │  │ • record sale  │  │ • period report            ││
//! │  │ • add/restock  │  │ • due payment  │  │ • dashboard                ││
//! │  │ • low stock    │  │ • invoice text │  │ • JSON export              ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐            │
//! │  │  customers     │  │  expenses      │  │  settings      │            │
//! │  └────────────────┘  └────────────────┘  └────────────────┘            │
//! │        every protected handler takes an AuthShop (bearer JWT)          │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  shopkeep-db::Database (SQLite pool) ─── shopkeep-core (rules)   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`] for the environment variables.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use shopkeep_db::Database;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use auth::{AuthShop, JwtManager};
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorCode};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let jwt = JwtManager::new(
            &config.jwt_secret,
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );
        AppState { db, jwt, config }
    }
}

/// Builds the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let origin: AllowOrigin = match &state.config.cors_origin {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => value.into(),
            Err(_) => {
                warn!(origin = %origin, "Unparseable CORS origin, allowing any");
                Any.into()
            }
        },
        None => Any.into(),
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
