//! # Stock Routes
//!
//! ```text
//!  GET    /api/stock?q=rice     list, or search name/SKU
//!  POST   /api/stock            add a new item, or restock an existing SKU
//!  GET    /api/stock/low        items at or below their reorder level
//!  POST   /api/stock/sku        suggest a SKU from name + category
//!  GET    /api/stock/{id}
//!  PUT    /api/stock/{id}       edit fields / stock-take correction
//!  DELETE /api/stock/{id}
//! ```

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shopkeep_core::sku::generate_sku;
use shopkeep_core::{NewStockItem, StockItem, StockItemUpdate};

use crate::auth::AuthShop;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stock", get(list_stock).post(add_stock))
        .route("/stock/low", get(low_stock))
        .route("/stock/sku", post(suggest_sku))
        .route(
            "/stock/{id}",
            get(get_stock_item).put(update_stock_item).delete(delete_stock_item),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuRequest {
    pub name: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct SkuResponse {
    pub sku: String,
}

async fn list_stock(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Query(query): Query<StockQuery>,
) -> ApiResult<Json<Vec<StockItem>>> {
    let items = match query.q.as_deref() {
        Some(term) => state.db.stock().search(&shop.shop_id, term).await?,
        None => state.db.stock().list(&shop.shop_id).await?,
    };
    Ok(Json(items))
}

async fn add_stock(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Json(new): Json<NewStockItem>,
) -> ApiResult<(StatusCode, Json<StockItem>)> {
    let item = state.db.stock().add_or_restock(&shop.shop_id, &new).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn low_stock(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
) -> ApiResult<Json<Vec<StockItem>>> {
    Ok(Json(state.db.stock().low_stock(&shop.shop_id).await?))
}

async fn suggest_sku(_shop: AuthShop, Json(req): Json<SkuRequest>) -> Json<SkuResponse> {
    Json(SkuResponse {
        sku: generate_sku(&req.name, &req.category),
    })
}

async fn get_stock_item(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Path(id): Path<String>,
) -> ApiResult<Json<StockItem>> {
    Ok(Json(state.db.stock().get(&shop.shop_id, &id).await?))
}

async fn update_stock_item(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Path(id): Path<String>,
    Json(update): Json<StockItemUpdate>,
) -> ApiResult<Json<StockItem>> {
    Ok(Json(state.db.stock().update(&shop.shop_id, &id, &update).await?))
}

async fn delete_stock_item(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.stock().delete(&shop.shop_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_restock_and_search() {
        let app = TestApp::signed_up().await;
        let id = app.add_stock("TEA-250", 8_000, 10_000, 5).await;
        let again = app.add_stock("TEA-250", 8_000, 10_000, 3).await;
        assert_eq!(id, again);

        let (status, body) = app.get(&format!("/api/stock/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stock"], 8);

        app.add_stock("RICE-5KG", 40_000, 52_500, 1).await;
        let (_, body) = app.get("/api/stock?q=rice").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["sku"], "RICE-5KG");

        let (_, body) = app.get("/api/stock/low").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let app = TestApp::signed_up().await;
        let id = app.add_stock("TEA-250", 8_000, 10_000, 5).await;
        app.add_stock("RICE-5KG", 40_000, 52_500, 1).await;

        let (status, body) = app
            .put(&format!("/api/stock/{}", id), json!({ "salePriceCents": 11_000 }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["salePriceCents"], 11_000);

        let (status, body) = app
            .put(&format!("/api/stock/{}", id), json!({ "sku": "RICE-5KG" }))
            .await;
        assert_eq!(status, StatusCode::CONFLICT, "{}", body);

        let (status, _) = app.delete(&format!("/api/stock/{}", id)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = app.get(&format!("/api/stock/{}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_invalid_item_is_rejected() {
        let app = TestApp::signed_up().await;
        let (status, body) = app
            .post(
                "/api/stock",
                json!({
                    "sku": "BAD SKU!",
                    "name": "Tea",
                    "costPriceCents": 100,
                    "salePriceCents": 200,
                    "quantity": 1,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_absurd_prices_are_rejected() {
        let app = TestApp::signed_up().await;
        let (status, body) = app
            .post(
                "/api/stock",
                json!({
                    "sku": "GOLD-1",
                    "name": "Gold",
                    "costPriceCents": 0,
                    "salePriceCents": 5_000_000_000_000_000_000_i64,
                    "quantity": 2,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let id = app.add_stock("TEA-250", 8_000, 10_000, 5).await;
        let (status, _) = app
            .put(
                &format!("/api/stock/{}", id),
                json!({ "salePriceCents": i64::MAX }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, dashboard) = app.get("/api/dashboard").await;
        assert_eq!(dashboard["stockValue"], 50_000);
    }

    #[tokio::test]
    async fn test_suggest_sku() {
        let app = TestApp::signed_up().await;
        let (status, body) = app
            .post("/api/stock/sku", json!({ "name": "Basmati Rice", "category": "Grocery" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        let sku = body["sku"].as_str().unwrap();
        assert!(sku.starts_with("GROBASM"), "{}", sku);
        assert_eq!(sku.len(), 13);
    }
}
