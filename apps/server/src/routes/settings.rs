//! Shop settings: the invoice header and default GST rate.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use shopkeep_core::{SettingsUpdate, ShopSettings};

use crate::auth::AuthShop;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

async fn get_settings(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
) -> ApiResult<Json<ShopSettings>> {
    Ok(Json(state.db.settings().get(&shop.shop_id).await?))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<Json<ShopSettings>> {
    Ok(Json(state.db.settings().update(&shop.shop_id, &update).await?))
}
