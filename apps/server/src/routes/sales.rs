//! # Sale Routes
//!
//! ```text
//!  GET  /api/sales?limit=50&due=false   newest first, or only sales with dues
//!  POST /api/sales                      record a sale (atomic)
//!  GET  /api/sales/{id}                 sale + lines + due payments
//!  POST /api/sales/{id}/payments        pay off part of the due
//!  GET  /api/sales/{id}/invoice         printable text/plain invoice
//! ```

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use shopkeep_core::invoice::render_invoice;
use shopkeep_core::{NewDuePayment, NewSale, Sale, SaleDetail};
use tracing::debug;

use crate::auth::AuthShop;
use crate::error::ApiResult;
use crate::AppState;

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 500;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sales", get(list_sales).post(record_sale))
        .route("/sales/{id}", get(get_sale))
        .route("/sales/{id}/payments", post(record_payment))
        .route("/sales/{id}/invoice", get(invoice))
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleListQuery {
    pub limit: Option<u32>,
    #[serde(default)]
    pub due: bool,
}

async fn list_sales(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Query(query): Query<SaleListQuery>,
) -> ApiResult<Json<Vec<Sale>>> {
    let sales = if query.due {
        state.db.sales().with_due(&shop.shop_id).await?
    } else {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        state.db.sales().list(&shop.shop_id, limit).await?
    };
    Ok(Json(sales))
}

async fn record_sale(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Json(new): Json<NewSale>,
) -> ApiResult<(StatusCode, Json<SaleDetail>)> {
    let detail = state.db.sales().record_sale(&shop.shop_id, &new).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_sale(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    Ok(Json(state.db.sales().get_detail(&shop.shop_id, &id).await?))
}

async fn record_payment(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Path(id): Path<String>,
    Json(payment): Json<NewDuePayment>,
) -> ApiResult<Json<SaleDetail>> {
    let detail = state
        .db
        .sales()
        .record_payment(&shop.shop_id, &id, &payment)
        .await?;
    Ok(Json(detail))
}

async fn invoice(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let settings = state.db.settings().get(&shop.shop_id).await?;
    let detail = state.db.sales().get_detail(&shop.shop_id, &id).await?;

    let customer = match &detail.sale.customer_id {
        Some(customer_id) => match state.db.customers().get(&shop.shop_id, customer_id).await {
            Ok(customer) => Some(customer),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    debug!(sale_id = %id, "Rendering invoice");
    let text = render_invoice(&settings, &detail, customer.as_ref());
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_record_sale_with_new_customer_and_pay_due() {
        let app = TestApp::signed_up().await;
        let rice = app.add_stock("RICE-5KG", 40_000, 52_500, 10).await;

        let (status, sale) = app
            .post(
                "/api/sales",
                json!({
                    "customer": { "kind": "new", "name": "Ravi", "phone": "91234 56789" },
                    "items": [{ "stockItemId": rice, "quantity": 2 }],
                    "discountCents": 5_000,
                    "amountPaidCents": 50_000,
                    "paymentMode": "upi",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", sale);
        // 105_000 − 5_000 = 100_000, +5% = 105_000
        assert_eq!(sale["sale"]["grandTotalCents"], 105_000);
        assert_eq!(sale["sale"]["dueCents"], 55_000);
        assert_eq!(sale["sale"]["invoiceNumber"], 1);
        assert_eq!(sale["sale"]["paymentMode"], "upi");
        let sale_id = sale["sale"]["id"].as_str().unwrap().to_string();

        let (status, detail) = app
            .post(
                &format!("/api/sales/{}/payments", sale_id),
                json!({ "amountCents": 55_000, "paymentMode": "cash" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["sale"]["dueCents"], 0);
        assert_eq!(detail["payments"].as_array().unwrap().len(), 1);

        let (_, customers) = app.get("/api/customers").await;
        assert_eq!(customers[0]["dueCents"], 0);

        let (_, due) = app.get("/api/sales?due=true").await;
        assert!(due.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_stock_and_overpayment() {
        let app = TestApp::signed_up().await;
        let tea = app.add_stock("TEA-250", 8_000, 10_000, 1).await;

        let (status, body) = app
            .post(
                "/api/sales",
                json!({
                    "customer": { "kind": "new", "name": "Ravi" },
                    "items": [{ "stockItemId": tea, "quantity": 2 }],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");

        let (_, customers) = app.get("/api/customers").await;
        assert!(customers.as_array().unwrap().is_empty());

        let (_, sale) = app
            .post(
                "/api/sales",
                json!({
                    "customer": { "kind": "new", "name": "Ravi" },
                    "items": [{ "stockItemId": tea, "quantity": 1 }],
                    "taxRateBps": 0,
                    "amountPaidCents": 9_000,
                }),
            )
            .await;
        let sale_id = sale["sale"]["id"].as_str().unwrap();

        let (status, body) = app
            .post(
                &format!("/api/sales/{}/payments", sale_id),
                json!({ "amountCents": 1_001 }),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "PAYMENT_ERROR");
    }

    #[tokio::test]
    async fn test_change_is_returned_on_overpayment() {
        let app = TestApp::signed_up().await;
        let tea = app.add_stock("TEA-250", 8_000, 10_000, 5).await;

        let (status, sale) = app
            .post(
                "/api/sales",
                json!({
                    "customer": { "kind": "new", "name": "Meena" },
                    "items": [{ "stockItemId": tea, "quantity": 1 }],
                    "taxRateBps": 0,
                    "amountPaidCents": 20_000,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sale["sale"]["amountPaidCents"], 10_000);
        assert_eq!(sale["sale"]["changeCents"], 10_000);
        assert_eq!(sale["sale"]["dueCents"], 0);
    }

    #[tokio::test]
    async fn test_invoice_text() {
        let app = TestApp::signed_up().await;
        let tea = app.add_stock("TEA-250", 8_000, 10_000, 5).await;
        let (_, sale) = app
            .post(
                "/api/sales",
                json!({
                    "customer": { "kind": "new", "name": "Asha", "address": "12 MG Road" },
                    "items": [{ "stockItemId": tea, "quantity": 1 }],
                }),
            )
            .await;
        let sale_id = sale["sale"]["id"].as_str().unwrap();

        let (status, text) = app.text(&format!("/api/sales/{}/invoice", sale_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("INVOICE #1"));
        assert!(text.contains("Bill To: Asha"));
        assert!(text.contains("12 MG Road"));

        let (status, _) = app.get("/api/sales/00000000-0000-0000-0000-000000000000").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
